//! Editor command vocabulary.

use crate::layout::connectors::Point;
use crate::model::person::{Gender, Person, PersonId, RelationshipType};
use crate::model::relationship_line::{LineHandle, LineType};
use serde::Deserialize;

/// How a new person relates to the center person of an `attach`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttachKind {
    Spouse,
    Cohabitant,
    Divorce,
    Separation,
    Parent,
    Child,
    AdoptedChild,
    PetChild,
    Sibling,
    FraternalMultipleBirth,
    IdenticalMultipleBirth,
}

impl AttachKind {
    pub const ALL: [AttachKind; 11] = [
        Self::Spouse,
        Self::Cohabitant,
        Self::Divorce,
        Self::Separation,
        Self::Parent,
        Self::Child,
        Self::AdoptedChild,
        Self::PetChild,
        Self::Sibling,
        Self::FraternalMultipleBirth,
        Self::IdenticalMultipleBirth,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Spouse => "spouse",
            Self::Cohabitant => "cohabitant",
            Self::Divorce => "divorce",
            Self::Separation => "separation",
            Self::Parent => "parent",
            Self::Child => "child",
            Self::AdoptedChild => "adoptedChild",
            Self::PetChild => "petChild",
            Self::Sibling => "sibling",
            Self::FraternalMultipleBirth => "fraternalMultipleBirth",
            Self::IdenticalMultipleBirth => "identicalMultipleBirth",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == value)
    }

    /// Relationship type stamped on both partners of a spouse-family attach.
    pub fn partner_relationship(self) -> Option<RelationshipType> {
        match self {
            Self::Spouse => Some(RelationshipType::Spouse),
            Self::Cohabitant => Some(RelationshipType::Cohabitant),
            Self::Divorce => Some(RelationshipType::Divorce),
            Self::Separation => Some(RelationshipType::Separation),
            _ => None,
        }
    }

    /// Relationship type stamped on a new child.
    pub fn child_relationship(self) -> Option<RelationshipType> {
        match self {
            Self::Child => Some(RelationshipType::Child),
            Self::AdoptedChild => Some(RelationshipType::AdoptedChild),
            Self::PetChild => Some(RelationshipType::PetChild),
            _ => None,
        }
    }
}

/// Attributes for a person about to be created.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPerson {
    /// Caller-provided id; generated when absent.
    #[serde(default)]
    pub id: Option<PersonId>,
    pub name: String,
    #[serde(default)]
    pub birth_year: Option<String>,
    #[serde(default)]
    pub gender: Gender,
    #[serde(default)]
    pub is_deceased: bool,
}

impl NewPerson {
    pub fn new(name: impl Into<String>, gender: Gender) -> Self {
        Self {
            id: None,
            name: name.into(),
            birth_year: None,
            gender,
            is_deceased: false,
        }
    }

    pub fn with_id(mut self, id: impl Into<PersonId>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn born(mut self, year: impl Into<String>) -> Self {
        self.birth_year = Some(year.into());
        self
    }

    pub fn deceased(mut self) -> Self {
        self.is_deceased = true;
        self
    }

    /// Builds the record at the origin with trimmed text fields.
    pub(crate) fn into_person(self) -> Person {
        let id = self.id.unwrap_or_else(PersonId::generate);
        let mut person = Person::with_id(id, self.name.trim(), self.gender);
        person.birth_year = normalize_year(self.birth_year);
        person.is_deceased = self.is_deceased;
        person
    }
}

/// Partial update for an existing person. `None` fields stay unchanged.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PersonPatch {
    pub name: Option<String>,
    /// A blank value clears the birth year.
    pub birth_year: Option<String>,
    pub gender: Option<Gender>,
    pub is_deceased: Option<bool>,
}

pub(crate) fn normalize_year(value: Option<String>) -> Option<String> {
    value
        .map(|year| year.trim().to_string())
        .filter(|year| !year.is_empty())
}

/// One atomic store mutation.
#[derive(Debug, Clone, PartialEq)]
pub enum EditCommand {
    /// Replaces the store with a single-person tree.
    CreateRoot(NewPerson),
    Attach {
        person: NewPerson,
        center: PersonId,
        kind: AttachKind,
    },
    UpdatePerson {
        id: PersonId,
        patch: PersonPatch,
    },
    DeletePerson(PersonId),
    Reposition {
        ids: Vec<PersonId>,
        dx: f64,
        dy: f64,
    },
    AddLine {
        line_type: LineType,
        start: Point,
        end: Point,
    },
    MoveLine {
        id: String,
        handle: LineHandle,
        dx: f64,
        dy: f64,
    },
    SetLineType {
        id: String,
        line_type: LineType,
    },
    DeleteLine(String),
}

impl EditCommand {
    /// Stable event name used in log lines.
    pub fn event_name(&self) -> &'static str {
        match self {
            Self::CreateRoot(_) => "tree_create",
            Self::Attach { .. } => "person_attach",
            Self::UpdatePerson { .. } => "person_update",
            Self::DeletePerson(_) => "person_delete",
            Self::Reposition { .. } => "person_reposition",
            Self::AddLine { .. } => "line_add",
            Self::MoveLine { .. } => "line_move",
            Self::SetLineType { .. } => "line_retype",
            Self::DeleteLine(_) => "line_delete",
        }
    }
}

/// What a successful command produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditOutcome {
    PersonCreated(PersonId),
    LineCreated(String),
    Changed,
    /// Valid command that moved nothing; no history entry is recorded.
    Unchanged,
}
