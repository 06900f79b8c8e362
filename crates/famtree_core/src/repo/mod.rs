//! Repository layer for saved family trees.
//!
//! # Responsibility
//! - Define the persistence contract used by services.
//! - Keep SQL details out of editor and service code.
//!
//! # Invariants
//! - Writes validate people before any SQL runs.
//! - Repository APIs return semantic errors (`Validation`, `Integrity`) in
//!   addition to DB transport errors.

pub mod tree_repo;
