//! Formsmith Configuration
//!
//! This crate holds the host-owned configuration of a Formsmith run: where the rule
//! tables, templates and outputs live, which input fields the pipeline reads, and the
//! business constants (item type codes, placeholder glyphs) shared with template authors.
//! Configuration is loaded from an optional TOML file plus environment overrides.

pub mod error;
pub mod manager;
pub mod types;

pub use error::{ConfigError, Result};
pub use manager::ConfigManager;
pub use types::{AppConfig, BusinessConfig, PathsConfig, SchemaConfig};
