//! Relationship resolution and connector geometry.
//!
//! # Responsibility
//! - Derive groupings (spouse pairs, parent anchors, clusters, twin links)
//!   from a tree snapshot.
//! - Produce renderer-neutral drawables and node shape descriptors.
//! - Compute export rectangles.
//!
//! # Invariants
//! - Everything here is a pure function of an immutable `FamilyTree`.
//! - Missing ids never raise errors; they produce absent geometry.

pub mod connectors;
pub mod export;
pub mod resolver;
pub mod shape;
