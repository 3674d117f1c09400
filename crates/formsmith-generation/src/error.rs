//! Error types for document generation

use std::path::PathBuf;

use thiserror::Error;

use crate::rules::FormNumber;

/// Errors that abort a generation run.
///
/// Every variant is fatal for the whole batch. The only recoverable
/// condition, a keyword missing while substituting one document's text, is
/// logged by the substitution engine and never surfaces here.
#[derive(Debug, Error)]
pub enum GenerationError {
    /// Malformed item record
    #[error("Validation error: {0}")]
    Validation(String),

    /// No template mapped for an item type and form number
    #[error("No template mapped for item type {item_type:?} and form {form}")]
    TemplateNotFound {
        /// Item type that was looked up
        item_type: String,
        /// Form number that was looked up
        form: FormNumber,
    },

    /// A keyword required at a critical point resolved to nothing
    #[error("Required keyword {0:?} has no value")]
    MissingKeyword(String),

    /// The batch violates a cross-item invariant
    #[error("Consistency error: {0}")]
    Consistency(String),

    /// Substitution kept finding placeholders after the iteration bound
    #[error("Substitution did not terminate after {iterations} replacements in {origin}")]
    RunawayExpansion {
        /// Number of replacements performed before giving up
        iterations: usize,
        /// Document or region being substituted
        origin: String,
    },

    /// A placeholder carried a format specifier that cannot be applied
    #[error("Invalid format {format:?} for keyword {key:?}: {message}")]
    InvalidFormat {
        /// Placeholder key
        key: String,
        /// Format specifier as written in the template
        format: String,
        /// What was wrong with it
        message: String,
    },

    /// Document store failure
    #[error("Document store error for {path}: {message}")]
    Store {
        /// Path being loaded or saved
        path: PathBuf,
        /// Underlying failure
        message: String,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Host configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] formsmith_config::ConfigError),
}

impl GenerationError {
    /// Whether this error is a lookup failure (template or critical keyword)
    pub fn is_lookup(&self) -> bool {
        matches!(
            self,
            GenerationError::TemplateNotFound { .. } | GenerationError::MissingKeyword(_)
        )
    }
}

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, GenerationError>;
