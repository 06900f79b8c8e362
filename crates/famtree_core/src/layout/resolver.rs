//! Relationship resolver.
//!
//! # Responsibility
//! - Derive spouse pairs, parent anchors, sibling clusters and identical-twin
//!   links from one immutable tree snapshot.
//!
//! # Invariants
//! - Pure function of its input: same snapshot, same output (including order).
//! - Missing ids are treated as absent data, never as errors.
//! - A couple's children share one anchor: the lexicographically smaller id of
//!   the two partners. This is a compatibility rule without further meaning.

use crate::model::person::{ParentRef, Person, PersonId};
use crate::model::tree::FamilyTree;
use std::collections::{HashMap, HashSet};

/// Unordered spouse pair, emitted once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpousePair {
    /// Partner that appears first in the person list.
    pub first: PersonId,
    pub second: PersonId,
}

/// Parent records behind one anchor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnchorParents {
    /// Both partners of a couple exist; `representative` is the anchor.
    Couple {
        representative: PersonId,
        partner: PersonId,
    },
    /// One parent exists and has no existing spouse.
    Single(PersonId),
    /// Anchor has no person record.
    Virtual,
}

/// Children grouped under one anchor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiblingGroup {
    /// Representative parent id or virtual token.
    pub anchor: String,
    pub parents: AnchorParents,
    /// Children sorted by ascending x (stable on ties).
    pub children: Vec<PersonId>,
    /// Multiple-birth clusters ordered by their leftmost member.
    pub clusters: Vec<Vec<PersonId>>,
}

/// Identical-sibling chain link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TwinLink {
    pub from: PersonId,
    pub to: PersonId,
}

/// Derived relationship structure of one snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedTree {
    pub spouse_pairs: Vec<SpousePair>,
    /// Groups in order of their first child's position in the person list.
    pub sibling_groups: Vec<SiblingGroup>,
    pub twin_links: Vec<TwinLink>,
}

impl ResolvedTree {
    pub fn group(&self, anchor: &str) -> Option<&SiblingGroup> {
        self.sibling_groups.iter().find(|group| group.anchor == anchor)
    }
}

/// Resolves the relationship structure of `tree`.
pub fn resolve(tree: &FamilyTree) -> ResolvedTree {
    let index: HashMap<&str, &Person> = tree
        .people
        .iter()
        .map(|person| (person.id.as_str(), person))
        .collect();

    ResolvedTree {
        spouse_pairs: spouse_pairs(tree, &index),
        sibling_groups: sibling_groups(tree, &index),
        twin_links: twin_links(tree, &index),
    }
}

/// Anchor key and parent records for a child's parent link.
fn anchor_for(parent: &ParentRef, index: &HashMap<&str, &Person>) -> (String, AnchorParents) {
    let ParentRef::Real(parent_id) = parent else {
        return (parent.key().to_string(), AnchorParents::Virtual);
    };
    let Some(parent_record) = index.get(parent_id.as_str()) else {
        return (parent_id.as_str().to_string(), AnchorParents::Virtual);
    };

    match parent_record
        .spouse_id
        .as_ref()
        .filter(|spouse_id| index.contains_key(spouse_id.as_str()))
    {
        Some(spouse_id) => {
            let (representative, partner) = if spouse_id < parent_id {
                (spouse_id.clone(), parent_id.clone())
            } else {
                (parent_id.clone(), spouse_id.clone())
            };
            (
                representative.as_str().to_string(),
                AnchorParents::Couple {
                    representative,
                    partner,
                },
            )
        }
        None => (
            parent_id.as_str().to_string(),
            AnchorParents::Single(parent_id.clone()),
        ),
    }
}

fn spouse_pairs(tree: &FamilyTree, index: &HashMap<&str, &Person>) -> Vec<SpousePair> {
    let mut visited: HashSet<&str> = HashSet::new();
    let mut pairs = Vec::new();
    for person in &tree.people {
        let Some(spouse_id) = &person.spouse_id else {
            continue;
        };
        if visited.contains(person.id.as_str()) {
            continue;
        }
        let Some(spouse) = index.get(spouse_id.as_str()) else {
            continue;
        };
        visited.insert(person.id.as_str());
        visited.insert(spouse.id.as_str());
        pairs.push(SpousePair {
            first: person.id.clone(),
            second: spouse.id.clone(),
        });
    }
    pairs
}

fn sibling_groups(tree: &FamilyTree, index: &HashMap<&str, &Person>) -> Vec<SiblingGroup> {
    let mut order: HashMap<String, usize> = HashMap::new();
    let mut buckets: Vec<(String, AnchorParents, Vec<&Person>)> = Vec::new();

    for person in &tree.people {
        let Some(parent) = &person.parent else {
            continue;
        };
        let (anchor, parents) = anchor_for(parent, index);
        match order.get(&anchor) {
            Some(&slot) => buckets[slot].2.push(person),
            None => {
                order.insert(anchor.clone(), buckets.len());
                buckets.push((anchor, parents, vec![person]));
            }
        }
    }

    buckets
        .into_iter()
        .map(|(anchor, parents, mut children)| {
            children.sort_by(|a, b| a.x.total_cmp(&b.x));
            let clusters = cluster_children(&children);
            SiblingGroup {
                anchor,
                parents,
                children: children.iter().map(|child| child.id.clone()).collect(),
                clusters,
            }
        })
        .collect()
}

/// Splits x-sorted siblings into multiple-birth clusters.
fn cluster_children(sorted: &[&Person]) -> Vec<Vec<PersonId>> {
    let mut processed: HashSet<&str> = HashSet::new();
    let mut clusters = Vec::new();
    for sibling in sorted {
        if processed.contains(sibling.id.as_str()) {
            continue;
        }
        match &sibling.multiple_birth_group_id {
            Some(group_id) => {
                let cluster: Vec<PersonId> = sorted
                    .iter()
                    .filter(|other| other.multiple_birth_group_id.as_ref() == Some(group_id))
                    .map(|other| {
                        processed.insert(other.id.as_str());
                        other.id.clone()
                    })
                    .collect();
                clusters.push(cluster);
            }
            None => {
                processed.insert(sibling.id.as_str());
                clusters.push(vec![sibling.id.clone()]);
            }
        }
    }
    clusters
}

fn twin_links(tree: &FamilyTree, index: &HashMap<&str, &Person>) -> Vec<TwinLink> {
    tree.people
        .iter()
        .filter_map(|person| {
            let next_id = person.next_identical_sibling_id.as_ref()?;
            let next = index.get(next_id.as_str())?;
            Some(TwinLink {
                from: person.id.clone(),
                to: next.id.clone(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{resolve, AnchorParents};
    use crate::model::person::{Gender, ParentRef, Person, PersonId};
    use crate::model::tree::FamilyTree;

    fn person(id: &str, x: f64) -> Person {
        let mut person = Person::with_id(PersonId::new(id), id, Gender::Male);
        person.x = x;
        person
    }

    fn child_of(id: &str, x: f64, parent: ParentRef) -> Person {
        let mut child = person(id, x);
        child.parent = Some(parent);
        child
    }

    #[test]
    fn children_of_either_partner_share_the_smaller_anchor() {
        let mut b = person("b", 0.0);
        let mut a = person("a", 110.0);
        a.spouse_id = Some(PersonId::new("b"));
        b.spouse_id = Some(PersonId::new("a"));
        let c1 = child_of("c1", 50.0, ParentRef::Real(PersonId::new("b")));
        let c2 = child_of("c2", 10.0, ParentRef::Real(PersonId::new("a")));
        let tree = FamilyTree::from_records(vec![b, a, c1, c2], Vec::new()).unwrap();

        let resolved = resolve(&tree);
        assert_eq!(resolved.sibling_groups.len(), 1);
        let group = &resolved.sibling_groups[0];
        assert_eq!(group.anchor, "a");
        assert_eq!(
            group.parents,
            AnchorParents::Couple {
                representative: PersonId::new("a"),
                partner: PersonId::new("b"),
            }
        );
        assert_eq!(group.children, vec![PersonId::new("c2"), PersonId::new("c1")]);
        assert_eq!(resolved.spouse_pairs.len(), 1);
        assert_eq!(resolved.spouse_pairs[0].first, PersonId::new("b"));
    }

    #[test]
    fn multiple_birth_members_form_one_cluster_in_x_order() {
        let token = ParentRef::Virtual("v_parent_1".to_string());
        let mut t1 = child_of("t1", 100.0, token.clone());
        let mut t2 = child_of("t2", 210.0, token.clone());
        t1.multiple_birth_group_id = Some("mb1".to_string());
        t2.multiple_birth_group_id = Some("mb1".to_string());
        let solo = child_of("s", 0.0, token.clone());
        let late = child_of("z", 400.0, token);
        let tree = FamilyTree::from_records(vec![t2, late, t1, solo], Vec::new()).unwrap();

        let resolved = resolve(&tree);
        let group = resolved.group("v_parent_1").unwrap();
        assert_eq!(group.parents, AnchorParents::Virtual);
        assert_eq!(
            group.clusters,
            vec![
                vec![PersonId::new("s")],
                vec![PersonId::new("t1"), PersonId::new("t2")],
                vec![PersonId::new("z")],
            ]
        );
    }

    #[test]
    fn twin_links_skip_missing_targets() {
        let mut a = person("a", 0.0);
        a.next_identical_sibling_id = Some(PersonId::new("gone"));
        let mut b = person("b", 0.0);
        b.next_identical_sibling_id = Some(PersonId::new("a"));
        let tree = FamilyTree::from_records(vec![a, b], Vec::new()).unwrap();

        let resolved = resolve(&tree);
        assert_eq!(resolved.twin_links.len(), 1);
        assert_eq!(resolved.twin_links[0].from, PersonId::new("b"));
    }
}
