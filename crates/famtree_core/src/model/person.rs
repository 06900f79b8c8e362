//! Person domain model.
//!
//! # Responsibility
//! - Define the canonical person record shared by editor, resolver and storage.
//! - Provide typed parent linkage (`ParentRef`) and stable wire names.
//!
//! # Invariants
//! - `id` is unique inside one tree and never reused for another person.
//! - `spouse_id` is symmetric once an editor command completes.
//! - A `ParentRef::Virtual` token never names a stored person.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const PERSON_ID_PREFIX: &str = "p";
const VIRTUAL_PARENT_PREFIX: &str = "v_parent_";
const MULTIPLE_BIRTH_PREFIX: &str = "mb";

/// Stable person identifier.
///
/// Ids are opaque string tokens; ordering between them is plain byte-wise
/// string comparison.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PersonId(String);

impl PersonId {
    /// Wraps an existing id token.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Generates a fresh person id.
    pub fn generate() -> Self {
        Self(generate_token(PERSON_ID_PREFIX))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for PersonId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PersonId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Creates a fresh virtual parent token.
pub fn generate_virtual_parent_token() -> String {
    generate_token(VIRTUAL_PARENT_PREFIX)
}

/// Creates a fresh multiple-birth group token.
pub fn generate_multiple_birth_group_id() -> String {
    generate_token(MULTIPLE_BIRTH_PREFIX)
}

fn generate_token(prefix: &str) -> String {
    format!("{prefix}{}", Uuid::new_v4().simple())
}

/// Biological/visual gender used for node shape selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Gender {
    #[default]
    Male,
    Female,
    Pet,
}

/// Node category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NodeType {
    #[default]
    Person,
    Pet,
}

/// Context-dependent relation tag.
///
/// On a spouse-linked pair it describes the marital relation; on a child it
/// describes how the child relates to its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RelationshipType {
    Spouse,
    Divorce,
    Separation,
    Cohabitant,
    Child,
    AdoptedChild,
    PetChild,
}

impl RelationshipType {
    /// Wire name used by storage and the UI shell.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Spouse => "spouse",
            Self::Divorce => "divorce",
            Self::Separation => "separation",
            Self::Cohabitant => "cohabitant",
            Self::Child => "child",
            Self::AdoptedChild => "adoptedChild",
            Self::PetChild => "petChild",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "spouse" => Some(Self::Spouse),
            "divorce" => Some(Self::Divorce),
            "separation" => Some(Self::Separation),
            "cohabitant" => Some(Self::Cohabitant),
            "child" => Some(Self::Child),
            "adoptedChild" => Some(Self::AdoptedChild),
            "petChild" => Some(Self::PetChild),
            _ => None,
        }
    }
}

impl Gender {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Male => "male",
            Self::Female => "female",
            Self::Pet => "pet",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "male" => Some(Self::Male),
            "female" => Some(Self::Female),
            "pet" => Some(Self::Pet),
            _ => None,
        }
    }
}

impl NodeType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Person => "person",
            Self::Pet => "pet",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "person" => Some(Self::Person),
            "pet" => Some(Self::Pet),
            _ => None,
        }
    }
}

/// Parent linkage of one person.
///
/// `Virtual` holds a synthetic grouping token that has no person record; it
/// lets siblings share an anchor before any real parent exists.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum ParentRef {
    Real(PersonId),
    Virtual(String),
}

impl ParentRef {
    /// Raw token used as grouping key and storage value.
    pub fn key(&self) -> &str {
        match self {
            Self::Real(id) => id.as_str(),
            Self::Virtual(token) => token.as_str(),
        }
    }

    pub fn real_id(&self) -> Option<&PersonId> {
        match self {
            Self::Real(id) => Some(id),
            Self::Virtual(_) => None,
        }
    }

    pub fn is_virtual(&self) -> bool {
        matches!(self, Self::Virtual(_))
    }

    /// Classifies a raw stored token given a predicate telling whether a
    /// person record with that id exists.
    pub fn classify(raw: &str, person_exists: impl Fn(&str) -> bool) -> Self {
        if person_exists(raw) {
            Self::Real(PersonId::new(raw))
        } else {
            Self::Virtual(raw.to_string())
        }
    }
}

impl From<ParentRef> for String {
    fn from(value: ParentRef) -> Self {
        match value {
            ParentRef::Real(id) => id.0,
            ParentRef::Virtual(token) => token,
        }
    }
}

// Wire values carry no type tag; `FamilyTree::from_records` re-classifies them.
impl From<String> for ParentRef {
    fn from(value: String) -> Self {
        Self::Virtual(value)
    }
}

/// Validation failure for person attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersonValidationError {
    /// Name is blank after trim.
    EmptyName,
    /// Id token is blank.
    EmptyId,
}

impl Display for PersonValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyName => write!(f, "name must not be blank"),
            Self::EmptyId => write!(f, "person id must not be blank"),
        }
    }
}

impl Error for PersonValidationError {}

/// Canonical person record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Person {
    pub id: PersonId,
    pub name: String,
    #[serde(default)]
    pub birth_year: Option<String>,
    #[serde(default)]
    pub gender: Gender,
    #[serde(default)]
    pub is_deceased: bool,
    #[serde(default)]
    pub node_type: NodeType,
    /// Node center on the canvas.
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default, rename = "parentId")]
    pub parent: Option<ParentRef>,
    #[serde(default)]
    pub spouse_id: Option<PersonId>,
    #[serde(default)]
    pub relationship_type: Option<RelationshipType>,
    #[serde(default)]
    pub multiple_birth_group_id: Option<String>,
    #[serde(default)]
    pub next_identical_sibling_id: Option<PersonId>,
}

impl Person {
    /// Creates a person with a generated id at the origin.
    pub fn new(name: impl Into<String>, gender: Gender) -> Self {
        Self::with_id(PersonId::generate(), name, gender)
    }

    /// Creates a person with a caller-provided id.
    ///
    /// Used by import paths where identity already exists externally.
    pub fn with_id(id: PersonId, name: impl Into<String>, gender: Gender) -> Self {
        Self {
            id,
            name: name.into(),
            birth_year: None,
            gender,
            is_deceased: false,
            node_type: if gender == Gender::Pet {
                NodeType::Pet
            } else {
                NodeType::Person
            },
            x: 0.0,
            y: 0.0,
            parent: None,
            spouse_id: None,
            relationship_type: None,
            multiple_birth_group_id: None,
            next_identical_sibling_id: None,
        }
    }

    /// Validates record-local invariants.
    pub fn validate(&self) -> Result<(), PersonValidationError> {
        if self.id.as_str().trim().is_empty() {
            return Err(PersonValidationError::EmptyId);
        }
        if self.name.trim().is_empty() {
            return Err(PersonValidationError::EmptyName);
        }
        Ok(())
    }

    pub fn is_pet(&self) -> bool {
        self.node_type == NodeType::Pet
    }

    /// Real parent id, if the parent link points to a stored person.
    pub fn real_parent_id(&self) -> Option<&PersonId> {
        self.parent.as_ref().and_then(ParentRef::real_id)
    }
}
