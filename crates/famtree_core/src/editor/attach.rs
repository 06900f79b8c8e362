//! Relationship attach rules.
//!
//! # Responsibility
//! - Place a new person relative to a center person.
//! - Wire parent, spouse, multiple-birth and identical-twin links for each
//!   attach kind.
//!
//! # Invariants
//! - Operates on a working copy; the store validates the result before commit.
//! - Pairing two people clears any previous partner's back-link first.

use crate::config::LayoutConfig;
use crate::editor::command::AttachKind;
use crate::model::person::{
    generate_multiple_birth_group_id, generate_virtual_parent_token, Gender, NodeType, ParentRef,
    Person, PersonId, RelationshipType,
};
use crate::model::tree::FamilyTree;
use crate::model::validation::ValidationError;
use std::collections::HashSet;

/// Adds `person` to `tree` linked to `center_id` according to `kind`.
pub(crate) fn attach(
    tree: &mut FamilyTree,
    mut person: Person,
    center_id: &PersonId,
    kind: AttachKind,
    config: &LayoutConfig,
) -> Result<PersonId, ValidationError> {
    person.validate()?;
    let center = tree
        .person(center_id)
        .cloned()
        .ok_or_else(|| ValidationError::UnresolvedCenter(center_id.to_string()))?;

    person.x = center.x;
    person.y = center.y;
    if kind == AttachKind::PetChild {
        person.gender = Gender::Pet;
        person.node_type = NodeType::Pet;
    }

    let step = config.horizontal_step();
    match kind {
        AttachKind::Spouse
        | AttachKind::Cohabitant
        | AttachKind::Divorce
        | AttachKind::Separation => {
            let relationship = kind
                .partner_relationship()
                .unwrap_or(RelationshipType::Spouse);
            pair(tree, &center.id, &mut person, relationship);
            person.x = center.x + step;
        }
        AttachKind::Parent => attach_parent(tree, &mut person, &center, config),
        AttachKind::Child | AttachKind::AdoptedChild | AttachKind::PetChild => {
            attach_child(tree, &mut person, &center, kind, config)
        }
        AttachKind::Sibling => {
            person.parent = Some(ensure_parent_token(tree, &center.id));
            person.x = center.x + step;
        }
        AttachKind::FraternalMultipleBirth | AttachKind::IdenticalMultipleBirth => {
            attach_multiple_birth(tree, &mut person, &center, config);
            if kind == AttachKind::IdenticalMultipleBirth {
                let tail = identical_chain_tail(tree, &center.id);
                if let Some(last) = tree.person_mut(&tail) {
                    last.next_identical_sibling_id = Some(person.id.clone());
                }
            }
        }
    }

    let id = person.id.clone();
    tree.people.push(person);
    Ok(id)
}

/// Links `newcomer` and the stored person `existing` as partners.
fn pair(
    tree: &mut FamilyTree,
    existing: &PersonId,
    newcomer: &mut Person,
    relationship: RelationshipType,
) {
    let previous = tree
        .person(existing)
        .and_then(|person| person.spouse_id.clone())
        .filter(|previous| previous != &newcomer.id);
    if let Some(previous) = previous {
        if let Some(former) = tree.person_mut(&previous) {
            former.spouse_id = None;
        }
    }

    if let Some(partner) = tree.person_mut(existing) {
        partner.spouse_id = Some(newcomer.id.clone());
        partner.relationship_type = Some(relationship);
    }
    newcomer.spouse_id = Some(existing.clone());
    newcomer.relationship_type = Some(relationship);
}

fn attach_parent(tree: &mut FamilyTree, person: &mut Person, center: &Person, config: &LayoutConfig) {
    let level = config.level_spacing;
    let existing_parent = center
        .real_parent_id()
        .and_then(|id| tree.person(id))
        .map(|parent| (parent.id.clone(), parent.x, parent.y));

    match (&center.parent, existing_parent) {
        (_, Some((parent_id, parent_x, parent_y))) => {
            pair(tree, &parent_id, person, RelationshipType::Spouse);
            person.x = parent_x + config.horizontal_step();
            person.y = parent_y;
        }
        (Some(token), None) => {
            let token = token.key().to_string();
            let mut min_x = f64::INFINITY;
            let mut max_x = f64::NEG_INFINITY;
            for sibling in tree
                .people
                .iter_mut()
                .filter(|p| p.parent.as_ref().map(ParentRef::key) == Some(token.as_str()))
            {
                sibling.parent = Some(ParentRef::Real(person.id.clone()));
                min_x = min_x.min(sibling.x);
                max_x = max_x.max(sibling.x);
            }
            person.x = if min_x.is_finite() {
                (min_x + max_x) / 2.0
            } else {
                center.x
            };
            person.y = center.y - level;
        }
        (None, None) => {
            if let Some(child) = tree.person_mut(&center.id) {
                child.parent = Some(ParentRef::Real(person.id.clone()));
            }
            person.x = center.x;
            person.y = center.y - level;
        }
    }
}

fn attach_child(
    tree: &FamilyTree,
    person: &mut Person,
    center: &Person,
    kind: AttachKind,
    config: &LayoutConfig,
) {
    person.parent = Some(ParentRef::Real(center.id.clone()));
    person.relationship_type = kind.child_relationship();
    person.y = center.y + config.level_spacing;

    let rightmost_child = tree
        .people
        .iter()
        .filter(|p| is_child_of_couple(tree, p, &center.id))
        .map(|p| p.x)
        .reduce(f64::max);

    person.x = match (rightmost_child, tree.spouse_of(center)) {
        (Some(x), _) => x + config.horizontal_step(),
        (None, Some(spouse)) => (center.x + spouse.x) / 2.0,
        (None, None) => center.x,
    };
}

/// True when `person`'s parent is `center` or `center`'s partner.
fn is_child_of_couple(tree: &FamilyTree, person: &Person, center: &PersonId) -> bool {
    let Some(parent_id) = person.real_parent_id() else {
        return false;
    };
    parent_id == center
        || tree
            .person(parent_id)
            .and_then(|parent| parent.spouse_id.as_ref())
            == Some(center)
}

fn attach_multiple_birth(
    tree: &mut FamilyTree,
    person: &mut Person,
    center: &Person,
    config: &LayoutConfig,
) {
    person.parent = Some(ensure_parent_token(tree, &center.id));

    let group = center
        .multiple_birth_group_id
        .clone()
        .unwrap_or_else(generate_multiple_birth_group_id);
    if let Some(stored) = tree.person_mut(&center.id) {
        stored.multiple_birth_group_id = Some(group.clone());
    }

    let rightmost_member = tree
        .people
        .iter()
        .filter(|p| p.multiple_birth_group_id.as_deref() == Some(group.as_str()))
        .map(|p| p.x)
        .reduce(f64::max)
        .unwrap_or(center.x);

    person.multiple_birth_group_id = Some(group);
    person.x = rightmost_member + config.horizontal_step();
    person.y = center.y;
}

/// Returns the parent link of `center`, synthesizing a virtual one if absent.
fn ensure_parent_token(tree: &mut FamilyTree, center: &PersonId) -> ParentRef {
    let Some(stored) = tree.person_mut(center) else {
        return ParentRef::Virtual(generate_virtual_parent_token());
    };
    stored
        .parent
        .get_or_insert_with(|| ParentRef::Virtual(generate_virtual_parent_token()))
        .clone()
}

/// Last person of the identical chain that starts at `start`.
fn identical_chain_tail(tree: &FamilyTree, start: &PersonId) -> PersonId {
    let mut current = start.clone();
    let mut seen = HashSet::new();
    while seen.insert(current.clone()) {
        match tree
            .person(&current)
            .and_then(|p| p.next_identical_sibling_id.as_ref())
            .filter(|next| tree.contains(next))
        {
            Some(next) => current = next.clone(),
            None => break,
        }
    }
    current
}

#[cfg(test)]
mod tests {
    use super::{attach, identical_chain_tail};
    use crate::config::LayoutConfig;
    use crate::editor::command::AttachKind;
    use crate::model::person::{Gender, ParentRef, Person, PersonId, RelationshipType};
    use crate::model::tree::FamilyTree;
    use crate::model::validation::ValidationError;

    fn person(id: &str) -> Person {
        Person::with_id(PersonId::new(id), id, Gender::Female)
    }

    fn root_tree() -> FamilyTree {
        FamilyTree::with_root(person("root"))
    }

    fn id(value: &str) -> PersonId {
        PersonId::new(value)
    }

    #[test]
    fn spouse_attach_links_both_sides_and_places_right() {
        let mut tree = root_tree();
        let config = LayoutConfig::default();
        attach(&mut tree, person("s"), &id("root"), AttachKind::Divorce, &config).unwrap();

        let root = tree.person(&id("root")).unwrap();
        let spouse = tree.person(&id("s")).unwrap();
        assert_eq!(root.spouse_id, Some(id("s")));
        assert_eq!(spouse.spouse_id, Some(id("root")));
        assert_eq!(root.relationship_type, Some(RelationshipType::Divorce));
        assert_eq!((spouse.x, spouse.y), (110.0, 0.0));
    }

    #[test]
    fn repartnering_clears_previous_partner() {
        let mut tree = root_tree();
        let config = LayoutConfig::default();
        attach(&mut tree, person("a"), &id("root"), AttachKind::Spouse, &config).unwrap();
        attach(&mut tree, person("b"), &id("root"), AttachKind::Spouse, &config).unwrap();

        assert_eq!(tree.person(&id("a")).unwrap().spouse_id, None);
        assert_eq!(tree.person(&id("root")).unwrap().spouse_id, Some(id("b")));
        tree.check_invariants().unwrap();
    }

    #[test]
    fn first_parent_sits_one_level_above() {
        let mut tree = root_tree();
        let config = LayoutConfig::default();
        attach(&mut tree, person("dad"), &id("root"), AttachKind::Parent, &config).unwrap();

        assert_eq!(
            tree.person(&id("root")).unwrap().parent,
            Some(ParentRef::Real(id("dad")))
        );
        let dad = tree.person(&id("dad")).unwrap();
        assert_eq!((dad.x, dad.y), (0.0, -140.0));
    }

    #[test]
    fn second_parent_becomes_spouse_of_first() {
        let mut tree = root_tree();
        let config = LayoutConfig::default();
        attach(&mut tree, person("dad"), &id("root"), AttachKind::Parent, &config).unwrap();
        attach(&mut tree, person("mom"), &id("root"), AttachKind::Parent, &config).unwrap();

        let mom = tree.person(&id("mom")).unwrap();
        assert_eq!(mom.spouse_id, Some(id("dad")));
        assert_eq!((mom.x, mom.y), (110.0, -140.0));
        assert_eq!(
            tree.person(&id("root")).unwrap().parent,
            Some(ParentRef::Real(id("dad")))
        );
    }

    #[test]
    fn children_line_up_right_of_existing_ones() {
        let mut tree = root_tree();
        let config = LayoutConfig::default();
        attach(&mut tree, person("s"), &id("root"), AttachKind::Spouse, &config).unwrap();
        attach(&mut tree, person("c1"), &id("root"), AttachKind::Child, &config).unwrap();
        attach(&mut tree, person("c2"), &id("s"), AttachKind::AdoptedChild, &config).unwrap();

        let c1 = tree.person(&id("c1")).unwrap();
        let c2 = tree.person(&id("c2")).unwrap();
        assert_eq!((c1.x, c1.y), (55.0, 140.0));
        assert_eq!((c2.x, c2.y), (165.0, 140.0));
        assert_eq!(c2.relationship_type, Some(RelationshipType::AdoptedChild));
    }

    #[test]
    fn identical_twins_extend_chain_tail() {
        let mut tree = root_tree();
        let config = LayoutConfig::default();
        attach(&mut tree, person("t2"), &id("root"), AttachKind::IdenticalMultipleBirth, &config)
            .unwrap();
        attach(&mut tree, person("t3"), &id("root"), AttachKind::IdenticalMultipleBirth, &config)
            .unwrap();

        assert_eq!(
            tree.person(&id("root")).unwrap().next_identical_sibling_id,
            Some(id("t2"))
        );
        assert_eq!(
            tree.person(&id("t2")).unwrap().next_identical_sibling_id,
            Some(id("t3"))
        );
        assert_eq!(identical_chain_tail(&tree, &id("root")), id("t3"));
        assert_eq!(tree.person(&id("t3")).unwrap().x, 220.0);
    }

    #[test]
    fn unresolved_center_is_rejected() {
        let mut tree = root_tree();
        let err = attach(
            &mut tree,
            person("x"),
            &id("ghost"),
            AttachKind::Sibling,
            &LayoutConfig::default(),
        )
        .unwrap_err();
        assert_eq!(err, ValidationError::UnresolvedCenter("ghost".to_string()));
        assert_eq!(tree.people.len(), 1);
    }
}
