//! Flutter-facing bindings for the family-tree engine.

pub mod api;
