//! Input validation errors shared by editor and storage entry points.

use crate::model::person::PersonValidationError;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Rejected user input. Nothing is mutated when one of these is returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Person name is blank after trim.
    EmptyName,
    /// Caller-provided person id is blank.
    EmptyId,
    /// The center person of an attach does not exist.
    UnresolvedCenter(String),
    /// Tree name is blank after trim.
    EmptyTreeName,
    /// Operation needs a root person but the tree has none.
    NoRoot,
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyName => write!(f, "name must not be blank"),
            Self::EmptyId => write!(f, "person id must not be blank"),
            Self::UnresolvedCenter(id) => write!(f, "center person not found: {id}"),
            Self::EmptyTreeName => write!(f, "tree name must not be blank"),
            Self::NoRoot => write!(f, "tree has no root person"),
        }
    }
}

impl Error for ValidationError {}

impl From<PersonValidationError> for ValidationError {
    fn from(value: PersonValidationError) -> Self {
        match value {
            PersonValidationError::EmptyName => Self::EmptyName,
            PersonValidationError::EmptyId => Self::EmptyId,
        }
    }
}

/// Trims a tree name and rejects blank input.
pub fn normalize_tree_name(raw: &str) -> Result<String, ValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyTreeName);
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::{normalize_tree_name, ValidationError};

    #[test]
    fn tree_names_are_trimmed() {
        assert_eq!(normalize_tree_name("  Kim family ").unwrap(), "Kim family");
        assert_eq!(normalize_tree_name(" \t"), Err(ValidationError::EmptyTreeName));
    }
}
