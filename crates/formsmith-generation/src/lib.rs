#![warn(missing_docs)]

//! Document generation pipeline for formsmith
//!
//! Turns one batch of tabular item input into filled-in documents. Input
//! columns become [`ItemRecord`]s, the [`ConfigResolver`] answers keyword and
//! template queries from four rule tables, the [`SubstitutionEngine`] fills
//! `§key§` placeholders, and the [`GenerationOrchestrator`] decides which
//! documents each form number produces.

pub mod amount_words;
pub mod document;
pub mod error;
pub mod input;
pub mod keywords;
pub mod models;
pub mod orchestration;
pub mod rules;
pub mod templates;

// Re-export public API
pub use amount_words::{amount_in_words, number_to_words};
pub use document::{
    Block, Document, DocumentStore, JsonDocumentStore, MemoryDocumentStore, NoopRenderer,
    Paragraph, RenderError, Renderer, Row, Table, WordDocument, Workbook, Worksheet,
};
pub use error::{GenerationError, Result};
pub use input::{InputTable, RecordBuilder};
pub use keywords::{merge_first_wins, KeywordLayers, KeywordMap, KeywordSource};
pub use models::{split_multi_value, BatchItem, GuarantorRecord, ItemRecord, Value};
pub use orchestration::{
    form_rule, BatchContext, FormPolicy, FormRule, GeneratedDocument, GenerationOrchestrator,
};
pub use rules::{load_rule_tables, ConfigResolver, FormNumber, RuleTables};
pub use templates::{PlaceholderSyntax, SubstitutionEngine, MAX_REPLACEMENTS};
