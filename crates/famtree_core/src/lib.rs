//! Family-tree relationship and layout engine.
//! This crate is the single source of truth for tree invariants; UI shells
//! only render what it derives.

pub mod config;
pub mod db;
pub mod editor;
pub mod layout;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::{EditorConfig, LayoutConfig};
pub use editor::command::{AttachKind, EditCommand, EditOutcome, NewPerson, PersonPatch};
pub use editor::drag::DragMode;
pub use editor::{EditorError, EditorResult, TreeStore};
pub use layout::connectors::{render_scene, Point, Scene};
pub use layout::export::{export_request, ExportRequest, ImageFormat};
pub use layout::resolver::{resolve, ResolvedTree};
pub use logging::{init_logging, logging_status, LogInitError};
pub use model::person::{Gender, NodeType, ParentRef, Person, PersonId, RelationshipType};
pub use model::relationship_line::{LineArrows, LineHandle, LineTone, LineType, RelationshipLine};
pub use model::tree::{FamilyTree, TreeIntegrityError};
pub use model::validation::ValidationError;
pub use repo::tree_repo::{RepoError, RepoResult, SqliteTreeRepository, TreeRepository};
pub use service::tree_service::{TreeService, TreeServiceError};

/// Minimal health-check API for shell integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
