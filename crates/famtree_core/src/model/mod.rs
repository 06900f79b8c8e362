//! Family-tree domain model.
//!
//! # Responsibility
//! - Define the canonical records shared by editor, layout and storage.
//! - Keep derived geometry out of the data model.
//!
//! # Invariants
//! - Every person is identified by a stable `PersonId` unique within a tree.
//! - Parent links are typed: real person ids and virtual grouping tokens are
//!   distinct variants of `ParentRef`.

pub mod person;
pub mod relationship_line;
pub mod tree;
pub mod validation;
