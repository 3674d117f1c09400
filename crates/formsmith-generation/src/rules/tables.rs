//! Rule table rows
//!
//! Four read-only tables drive template selection and keyword overrides. They
//! are loaded once per run and shared by reference afterwards.

use serde::{Deserialize, Serialize};

use crate::models::Value;

/// Identifies one template/document kind
pub type FormNumber = u32;

/// Table (1): item type × form number → template file name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateMappingRow {
    /// Item type
    pub item_type: String,
    /// Form number
    pub form: FormNumber,
    /// Human-readable form name, informational only
    pub form_name: String,
    /// Template file name; `None` marks forms produced elsewhere
    pub template_file: Option<String>,
}

/// Table (2): form number × jurisdiction → keyword override
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JurisdictionKeywordRow {
    /// Form number
    pub form: FormNumber,
    /// Human-readable form name, informational only
    pub form_name: String,
    /// Keyword
    pub key: String,
    /// Two-letter jurisdiction code
    pub jurisdiction: String,
    /// Keyword value
    pub value: Value,
}

/// Table (3): item type × form number → keyword override
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemTypeKeywordRow {
    /// Item type
    pub item_type: String,
    /// Form number
    pub form: FormNumber,
    /// Human-readable form name, informational only
    pub form_name: String,
    /// Keyword
    pub key: String,
    /// Keyword value
    pub value: Value,
}

/// Table (4): global keyword
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlobalKeywordRow {
    /// Keyword
    pub key: String,
    /// Keyword value
    pub value: Value,
}

/// The four rule tables
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleTables {
    /// Table (1)
    pub template_mapping: Vec<TemplateMappingRow>,
    /// Table (2)
    pub by_jurisdiction: Vec<JurisdictionKeywordRow>,
    /// Table (3)
    pub by_item_type: Vec<ItemTypeKeywordRow>,
    /// Table (4)
    pub global: Vec<GlobalKeywordRow>,
}

impl RuleTables {
    /// Create empty tables
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a table (1) row
    pub fn with_template(
        mut self,
        item_type: impl Into<String>,
        form: FormNumber,
        template_file: Option<&str>,
    ) -> Self {
        self.template_mapping.push(TemplateMappingRow {
            item_type: item_type.into(),
            form,
            form_name: String::new(),
            template_file: template_file.map(str::to_string),
        });
        self
    }

    /// Add a table (2) row
    pub fn with_jurisdiction_keyword(
        mut self,
        form: FormNumber,
        jurisdiction: impl Into<String>,
        key: impl Into<String>,
        value: impl Into<Value>,
    ) -> Self {
        self.by_jurisdiction.push(JurisdictionKeywordRow {
            form,
            form_name: String::new(),
            key: key.into(),
            jurisdiction: jurisdiction.into(),
            value: value.into(),
        });
        self
    }

    /// Add a table (3) row
    pub fn with_item_type_keyword(
        mut self,
        item_type: impl Into<String>,
        form: FormNumber,
        key: impl Into<String>,
        value: impl Into<Value>,
    ) -> Self {
        self.by_item_type.push(ItemTypeKeywordRow {
            item_type: item_type.into(),
            form,
            form_name: String::new(),
            key: key.into(),
            value: value.into(),
        });
        self
    }

    /// Add a table (4) row
    pub fn with_global_keyword(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.global.push(GlobalKeywordRow {
            key: key.into(),
            value: value.into(),
        });
        self
    }
}
