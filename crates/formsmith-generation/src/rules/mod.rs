//! Rule tables and the configuration resolver

pub mod filename;
pub mod loader;
pub mod resolver;
pub mod tables;

pub use filename::{insert_before_extension, specialize_file_name, DEED_FORMS, NOTE_FORMS};
pub use loader::load_rule_tables;
pub use resolver::{ConfigResolver, SCHEDULE_FORMS};
pub use tables::{
    FormNumber, GlobalKeywordRow, ItemTypeKeywordRow, JurisdictionKeywordRow, RuleTables,
    TemplateMappingRow,
};
