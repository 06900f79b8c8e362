//! Saved-tree use-case service.
//!
//! # Responsibility
//! - Turn repository calls into the save/load/list/delete use cases.
//! - Produce the user-facing status messages shown by the shell.
//!
//! # Invariants
//! - Empty trees are never saved.
//! - A loaded tree replaces the editing session only after it validated.

use crate::editor::{EditorError, TreeStore};
use crate::model::tree::FamilyTree;
use crate::model::validation::{normalize_tree_name, ValidationError};
use crate::repo::tree_repo::{RepoError, TreeRepository};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Errors from saved-tree service operations.
#[derive(Debug)]
pub enum TreeServiceError {
    Validation(ValidationError),
    /// No tree is stored under the given name.
    TreeNotFound(String),
    /// The loaded tree could not be installed into the editing session.
    Editor(EditorError),
    /// Repository-level failure.
    Repo(RepoError),
}

impl Display for TreeServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::TreeNotFound(name) => write!(f, "family tree not found: {name}"),
            Self::Editor(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for TreeServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::TreeNotFound(_) => None,
            Self::Editor(err) => Some(err),
            Self::Repo(err) => Some(err),
        }
    }
}

impl From<RepoError> for TreeServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::Validation(err) => Self::Validation(err),
            other => Self::Repo(other),
        }
    }
}

impl From<ValidationError> for TreeServiceError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<EditorError> for TreeServiceError {
    fn from(value: EditorError) -> Self {
        Self::Editor(value)
    }
}

/// Saved-tree service facade.
pub struct TreeService<R: TreeRepository> {
    repo: R,
}

impl<R: TreeRepository> TreeService<R> {
    /// Creates service from repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Lists saved tree names in ascending order.
    pub fn list_trees(&self) -> Result<Vec<String>, TreeServiceError> {
        self.repo.list_trees().map_err(Into::into)
    }

    /// Saves `tree` under `name`, replacing any previous content.
    ///
    /// Returns the status message for the shell.
    pub fn save_tree(&self, name: &str, tree: &FamilyTree) -> Result<String, TreeServiceError> {
        let name = normalize_tree_name(name)?;
        if tree.is_empty() {
            return Err(ValidationError::NoRoot.into());
        }

        match self.repo.save_tree(&name, &tree.people, &tree.lines) {
            Ok(()) => {
                info!("event=tree_save module=service status=ok");
                Ok(format!("\"{name}\" saved"))
            }
            Err(err) => {
                warn!("event=tree_save module=service status=error error={err}");
                Err(err.into())
            }
        }
    }

    /// Loads the tree stored under `name`.
    pub fn load_tree(&self, name: &str) -> Result<FamilyTree, TreeServiceError> {
        let name = normalize_tree_name(name)?;
        self.repo
            .load_tree(&name)?
            .ok_or(TreeServiceError::TreeNotFound(name))
    }

    /// Loads `name` into an editing session, resetting its history.
    pub fn open_in(&self, name: &str, store: &mut TreeStore) -> Result<(), TreeServiceError> {
        let tree = self.load_tree(name)?;
        store.replace_tree(tree)?;
        Ok(())
    }

    /// Deletes `name`; the message tells whether anything was removed.
    pub fn delete_tree(&self, name: &str) -> Result<String, TreeServiceError> {
        let name = normalize_tree_name(name)?;
        let removed = self.repo.delete_tree(&name)?;
        info!("event=tree_delete module=service status=ok found={removed}");
        if removed {
            Ok(format!("\"{name}\" deleted"))
        } else {
            Ok(format!("no family tree named \"{name}\" to delete"))
        }
    }
}
