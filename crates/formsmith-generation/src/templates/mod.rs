//! Placeholder syntax, value formatting and the substitution engine

pub mod engine;
pub mod format;
pub mod syntax;

pub use engine::{SubstitutionEngine, MAX_REPLACEMENTS};
pub use format::{format_value, to_half_width, DEFAULT_DATE_FORMAT, DEFAULT_NUMBER_FORMAT};
pub use syntax::{PlaceholderMatch, PlaceholderSyntax, DEFAULT_QUOTE, DEFAULT_SEPARATOR};
