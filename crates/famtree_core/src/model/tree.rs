//! Whole-tree value type.
//!
//! # Responsibility
//! - Hold the person and relationship-line records of one family tree.
//! - Provide id lookups that return `None` for virtual or missing ids.
//! - Check cross-record invariants (unique ids, spouse symmetry, acyclic
//!   parent chains).
//!
//! # Invariants
//! - Lookups never fail; callers branch on `None`.
//! - `FamilyTree` is a plain value: cloning it yields an independent snapshot.

use crate::model::person::{ParentRef, Person, PersonId};
use crate::model::relationship_line::RelationshipLine;
use log::warn;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Cross-record invariant violation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeIntegrityError {
    /// Two person records share one id.
    DuplicatePersonId(PersonId),
    /// Two relationship lines share one id.
    DuplicateLineId(String),
    /// `a.spouse_id == b` but `b.spouse_id != a`.
    AsymmetricSpouse { person: PersonId, spouse: PersonId },
    /// Person is its own spouse.
    SelfSpouse(PersonId),
    /// Person is its own ancestor.
    ParentCycle(PersonId),
    /// Root id does not name a stored person.
    MissingRoot(PersonId),
}

impl Display for TreeIntegrityError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicatePersonId(id) => write!(f, "duplicate person id: {id}"),
            Self::DuplicateLineId(id) => write!(f, "duplicate relationship line id: {id}"),
            Self::AsymmetricSpouse { person, spouse } => write!(
                f,
                "spouse link is not symmetric: {person} -> {spouse}"
            ),
            Self::SelfSpouse(id) => write!(f, "person is linked as own spouse: {id}"),
            Self::ParentCycle(id) => write!(f, "person is its own ancestor: {id}"),
            Self::MissingRoot(id) => write!(f, "root person not found: {id}"),
        }
    }
}

impl Error for TreeIntegrityError {}

/// People, relationship lines and the undeletable root of one tree.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FamilyTree {
    pub people: Vec<Person>,
    pub lines: Vec<RelationshipLine>,
    pub root_id: Option<PersonId>,
}

impl FamilyTree {
    /// Creates a tree holding only its root person.
    pub fn with_root(root: Person) -> Self {
        let root_id = root.id.clone();
        Self {
            people: vec![root],
            lines: Vec::new(),
            root_id: Some(root_id),
        }
    }

    /// Builds a tree from raw stored records.
    ///
    /// Parent tokens are re-classified against the loaded people, one-sided
    /// spouse links are dropped, and the first stored person becomes the
    /// root. People are only ever appended and the root cannot be deleted,
    /// so saved order keeps the root in front.
    ///
    /// # Errors
    /// - Duplicate ids and parent cycles are rejected.
    pub fn from_records(
        mut people: Vec<Person>,
        lines: Vec<RelationshipLine>,
    ) -> Result<Self, TreeIntegrityError> {
        let known: HashSet<String> = people.iter().map(|p| p.id.as_str().to_string()).collect();
        for person in &mut people {
            if let Some(parent) = person.parent.take() {
                person.parent = Some(ParentRef::classify(parent.key(), |id| known.contains(id)));
            }
        }

        let mut tree = Self {
            people,
            lines,
            root_id: None,
        };
        tree.drop_one_sided_spouse_links();
        tree.root_id = tree.people.first().map(|p| p.id.clone());

        tree.check_unique_ids()?;
        tree.check_acyclic()?;
        Ok(tree)
    }

    pub fn is_empty(&self) -> bool {
        self.people.is_empty()
    }

    pub fn person(&self, id: &PersonId) -> Option<&Person> {
        self.people.iter().find(|p| &p.id == id)
    }

    pub fn person_by_key(&self, key: &str) -> Option<&Person> {
        self.people.iter().find(|p| p.id.as_str() == key)
    }

    pub fn person_mut(&mut self, id: &PersonId) -> Option<&mut Person> {
        self.people.iter_mut().find(|p| &p.id == id)
    }

    pub fn contains(&self, id: &PersonId) -> bool {
        self.person(id).is_some()
    }

    pub fn line(&self, id: &str) -> Option<&RelationshipLine> {
        self.lines.iter().find(|l| l.id == id)
    }

    pub fn line_mut(&mut self, id: &str) -> Option<&mut RelationshipLine> {
        self.lines.iter_mut().find(|l| l.id == id)
    }

    /// Existing spouse record of `person`, if any.
    pub fn spouse_of(&self, person: &Person) -> Option<&Person> {
        person.spouse_id.as_ref().and_then(|id| self.person(id))
    }

    pub fn is_root(&self, id: &PersonId) -> bool {
        self.root_id.as_ref() == Some(id)
    }

    /// Checks every cross-record invariant.
    pub fn check_invariants(&self) -> Result<(), TreeIntegrityError> {
        self.check_unique_ids()?;
        self.check_spouse_symmetry()?;
        self.check_acyclic()?;
        if let Some(root_id) = &self.root_id {
            if !self.contains(root_id) {
                return Err(TreeIntegrityError::MissingRoot(root_id.clone()));
            }
        }
        Ok(())
    }

    fn check_unique_ids(&self) -> Result<(), TreeIntegrityError> {
        let mut seen = HashSet::new();
        for person in &self.people {
            if !seen.insert(person.id.as_str()) {
                return Err(TreeIntegrityError::DuplicatePersonId(person.id.clone()));
            }
        }
        let mut seen_lines = HashSet::new();
        for line in &self.lines {
            if !seen_lines.insert(line.id.as_str()) {
                return Err(TreeIntegrityError::DuplicateLineId(line.id.clone()));
            }
        }
        Ok(())
    }

    fn check_spouse_symmetry(&self) -> Result<(), TreeIntegrityError> {
        for person in &self.people {
            let Some(spouse_id) = &person.spouse_id else {
                continue;
            };
            if spouse_id == &person.id {
                return Err(TreeIntegrityError::SelfSpouse(person.id.clone()));
            }
            let mirrored = self
                .person(spouse_id)
                .and_then(|spouse| spouse.spouse_id.as_ref());
            if mirrored != Some(&person.id) {
                return Err(TreeIntegrityError::AsymmetricSpouse {
                    person: person.id.clone(),
                    spouse: spouse_id.clone(),
                });
            }
        }
        Ok(())
    }

    fn check_acyclic(&self) -> Result<(), TreeIntegrityError> {
        for person in &self.people {
            let mut visited = HashSet::new();
            let mut cursor = person.real_parent_id();
            while let Some(current) = cursor {
                if current == &person.id || !visited.insert(current.as_str()) {
                    return Err(TreeIntegrityError::ParentCycle(person.id.clone()));
                }
                cursor = self.person(current).and_then(Person::real_parent_id);
            }
        }
        Ok(())
    }

    fn drop_one_sided_spouse_links(&mut self) {
        let broken: Vec<PersonId> = self
            .people
            .iter()
            .filter(|person| {
                person.spouse_id.as_ref().is_some_and(|spouse_id| {
                    spouse_id == &person.id
                        || self
                            .person(spouse_id)
                            .and_then(|spouse| spouse.spouse_id.as_ref())
                            != Some(&person.id)
                })
            })
            .map(|person| person.id.clone())
            .collect();

        for id in broken {
            warn!("event=tree_repair module=model status=ok action=drop_spouse_link");
            if let Some(person) = self.person_mut(&id) {
                person.spouse_id = None;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{FamilyTree, TreeIntegrityError};
    use crate::model::person::{Gender, ParentRef, Person, PersonId};

    fn person(id: &str) -> Person {
        Person::with_id(PersonId::new(id), id.to_uppercase(), Gender::Female)
    }

    #[test]
    fn from_records_classifies_parents_and_picks_root() {
        let mut child = person("c");
        child.parent = Some(ParentRef::Virtual("a".to_string()));
        let mut twin = person("d");
        twin.parent = Some(ParentRef::Virtual("v_parent_1".to_string()));
        let tree = FamilyTree::from_records(vec![child, person("a"), twin], Vec::new()).unwrap();

        assert_eq!(
            tree.people[0].parent,
            Some(ParentRef::Real(PersonId::new("a")))
        );
        assert!(tree.people[2].parent.as_ref().unwrap().is_virtual());
        assert_eq!(tree.root_id, Some(PersonId::new("c")));
    }

    #[test]
    fn from_records_drops_one_sided_spouse_links() {
        let mut a = person("a");
        a.spouse_id = Some(PersonId::new("b"));
        let b = person("b");
        let tree = FamilyTree::from_records(vec![a, b], Vec::new()).unwrap();
        assert!(tree.people[0].spouse_id.is_none());
        assert!(tree.check_invariants().is_ok());
    }

    #[test]
    fn parent_cycles_are_rejected() {
        let mut a = person("a");
        a.parent = Some(ParentRef::Real(PersonId::new("b")));
        let mut b = person("b");
        b.parent = Some(ParentRef::Real(PersonId::new("a")));
        let err = FamilyTree::from_records(vec![a, b], Vec::new()).unwrap_err();
        assert!(matches!(err, TreeIntegrityError::ParentCycle(_)));
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let err = FamilyTree::from_records(vec![person("a"), person("a")], Vec::new()).unwrap_err();
        assert_eq!(err, TreeIntegrityError::DuplicatePersonId(PersonId::new("a")));
    }
}
