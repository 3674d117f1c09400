//! Core configuration types and data structures

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Locations of rule tables, templates and outputs
    pub paths: PathsConfig,
    /// Input field names read by the pipeline
    pub schema: SchemaConfig,
    /// Item type codes and glyphs shared with template authors
    pub business: BusinessConfig,
}

/// Filesystem locations resolved by the host
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PathsConfig {
    /// Directory holding the four rule table CSV files
    pub rules_dir: PathBuf,
    /// Root directory of the document templates
    pub template_root: PathBuf,
    /// Root directory generated documents are written under
    pub output_root: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            rules_dir: PathBuf::from("./workdir/rules"),
            template_root: PathBuf::from("./templates"),
            output_root: PathBuf::from("./workdir/output"),
        }
    }
}

/// Names of the input table fields the pipeline reads.
///
/// Every other input field is carried through untouched and is available to
/// templates as a keyword of the same name.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SchemaConfig {
    pub item_type: String,
    pub contract_date: String,
    pub customer_name: String,
    pub corporate_name: String,
    /// Jurisdiction field; only its first two characters are the code
    pub jurisdiction: String,
    pub spouse_name: String,
    /// Address token used in output file and directory names
    pub property_token: String,
    pub property_name: String,
    pub property_address: String,
    pub total_billing: String,
    pub principal: String,
    pub guarantor_name: String,
    pub guarantor_postal_code: String,
    pub guarantor_address: String,
    /// Flag field controlling whether guarantor addresses are printed
    pub guarantor_address_output: String,
    /// Value of `guarantor_address_output` that suppresses addresses
    pub guarantor_address_suppress_value: String,
    pub ownership_category: String,
    /// Value of `ownership_category` meaning the collateral owner is a separate party
    pub separate_ownership_value: String,
    /// Keyword overridden with a guarantor's postal code on declarations
    pub postal_code: String,
    /// Keyword overridden with a guarantor's address on declarations
    pub customer_address: String,
    pub product_name_master: String,
    pub billing_amount: String,
    pub final_payment_date: String,
    pub principal_in_words: String,
    pub property_number: String,
    /// Identifier fields kept as text even when they look numeric, so codes
    /// and postal codes are never grouped or reformatted
    pub text_fields: Vec<String>,
}

impl Default for SchemaConfig {
    fn default() -> Self {
        Self {
            item_type: "item_type".to_string(),
            contract_date: "contract_date".to_string(),
            customer_name: "customer_name".to_string(),
            corporate_name: "corporate_name".to_string(),
            jurisdiction: "collateral_jurisdiction".to_string(),
            spouse_name: "spouse_name".to_string(),
            property_token: "filename_address".to_string(),
            property_name: "property_name".to_string(),
            property_address: "property_address".to_string(),
            total_billing: "total_billing_yen".to_string(),
            principal: "principal_yen".to_string(),
            guarantor_name: "guarantor_name".to_string(),
            guarantor_postal_code: "guarantor_postal_code".to_string(),
            guarantor_address: "guarantor_address".to_string(),
            guarantor_address_output: "guarantor_address_output".to_string(),
            guarantor_address_suppress_value: "no".to_string(),
            ownership_category: "collateral_owner_category".to_string(),
            separate_ownership_value: "separate".to_string(),
            postal_code: "postal_code".to_string(),
            customer_address: "customer_address".to_string(),
            product_name_master: "product_name_master".to_string(),
            billing_amount: "billing_yen".to_string(),
            final_payment_date: "final_payment_date".to_string(),
            principal_in_words: "principal_in_words".to_string(),
            property_number: "property_number".to_string(),
            text_fields: vec![
                "item_type".to_string(),
                "guarantor_postal_code".to_string(),
                "postal_code".to_string(),
            ],
        }
    }
}

impl SchemaConfig {
    fn named_fields(&self) -> [(&'static str, &str); 25] {
        [
            ("item_type", &self.item_type),
            ("contract_date", &self.contract_date),
            ("customer_name", &self.customer_name),
            ("corporate_name", &self.corporate_name),
            ("jurisdiction", &self.jurisdiction),
            ("spouse_name", &self.spouse_name),
            ("property_token", &self.property_token),
            ("property_name", &self.property_name),
            ("property_address", &self.property_address),
            ("total_billing", &self.total_billing),
            ("principal", &self.principal),
            ("guarantor_name", &self.guarantor_name),
            ("guarantor_postal_code", &self.guarantor_postal_code),
            ("guarantor_address", &self.guarantor_address),
            ("guarantor_address_output", &self.guarantor_address_output),
            (
                "guarantor_address_suppress_value",
                &self.guarantor_address_suppress_value,
            ),
            ("ownership_category", &self.ownership_category),
            ("separate_ownership_value", &self.separate_ownership_value),
            ("postal_code", &self.postal_code),
            ("customer_address", &self.customer_address),
            ("product_name_master", &self.product_name_master),
            ("billing_amount", &self.billing_amount),
            ("final_payment_date", &self.final_payment_date),
            ("principal_in_words", &self.principal_in_words),
            ("property_number", &self.property_number),
        ]
    }

    /// Whether `field` is an identifier field read as text
    pub fn is_text_field(&self, field: &str) -> bool {
        self.text_fields.iter().any(|f| f == field)
    }

    /// Names of schema entries that are blank
    pub fn blank_entries(&self) -> Vec<&'static str> {
        self.named_fields()
            .into_iter()
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(name, _)| name)
            .collect()
    }
}

/// Business constants shared between template authors and the pipeline
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BusinessConfig {
    /// Item type whose bill and deed are produced by the following combined item
    pub placeholder_item_type: String,
    /// Item types merged with an immediately preceding placeholder item
    pub combined_item_types: Vec<String>,
    /// Substring marking special items listed on the property list form
    pub special_item_marker: String,
    /// Item type whose principal is spelled out in words on deeds
    pub amount_in_words_item_type: String,
    /// Jurisdiction in which the principal is spelled out
    pub amount_in_words_jurisdiction: String,
    /// Glyph wrapping a placeholder key
    pub placeholder_quote: char,
    /// Glyph separating a placeholder key from its format specifier
    pub format_separator: char,
    /// Separator of multi-value guarantor fields
    pub guarantor_separator: char,
}

impl Default for BusinessConfig {
    fn default() -> Self {
        Self {
            placeholder_item_type: "70N".to_string(),
            combined_item_types: vec!["2054".to_string(), "9054".to_string()],
            special_item_marker: "Chacot".to_string(),
            amount_in_words_item_type: "Corporate50".to_string(),
            amount_in_words_jurisdiction: "HI".to_string(),
            placeholder_quote: '§',
            format_separator: '‡',
            guarantor_separator: '*',
        }
    }
}

impl BusinessConfig {
    /// Whether `item_type` is one of the combined item types
    pub fn is_combined(&self, item_type: &str) -> bool {
        self.combined_item_types.iter().any(|t| t == item_type)
    }

    /// Whether `item_type` is the placeholder item type
    pub fn is_placeholder(&self, item_type: &str) -> bool {
        self.placeholder_item_type == item_type
    }

    /// Whether `item_type` names a special item
    pub fn is_special(&self, item_type: &str) -> bool {
        !self.special_item_marker.is_empty() && item_type.contains(&self.special_item_marker)
    }
}
