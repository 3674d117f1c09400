//! Keyword and template resolution over the rule tables

use std::collections::BTreeMap;
use std::ops::RangeInclusive;

use tracing::debug;

use crate::error::{GenerationError, Result};
use crate::keywords::{merge_first_wins, KeywordMap};
use crate::models::ItemRecord;
use crate::rules::filename::specialize_file_name;
use crate::rules::tables::{FormNumber, RuleTables};

/// Form numbers reserved for the schedule workbook
pub const SCHEDULE_FORMS: RangeInclusive<FormNumber> = 7..=9;

/// Answers keyword and template queries against the four rule tables.
///
/// Keyword precedence for `(item type, form, jurisdiction)` is: item type
/// table > jurisdiction table > global table. The first table containing a key
/// wins.
#[derive(Debug, Clone)]
pub struct ConfigResolver {
    tables: RuleTables,
}

impl ConfigResolver {
    /// Wrap loaded rule tables
    pub fn new(tables: RuleTables) -> Self {
        Self { tables }
    }

    /// Underlying tables
    pub fn tables(&self) -> &RuleTables {
        &self.tables
    }

    /// Resolve every keyword that applies to an item type, form and jurisdiction
    pub fn resolve_keywords(
        &self,
        item_type: &str,
        form: FormNumber,
        jurisdiction: &str,
    ) -> KeywordMap {
        let by_item_type = self
            .tables
            .by_item_type
            .iter()
            .filter(|row| row.item_type == item_type && row.form == form)
            .map(|row| (&row.key, &row.value));
        let by_jurisdiction = self
            .tables
            .by_jurisdiction
            .iter()
            .filter(|row| row.form == form && row.jurisdiction == jurisdiction)
            .map(|row| (&row.key, &row.value));
        let global = self.tables.global.iter().map(|row| (&row.key, &row.value));

        merge_first_wins(by_item_type.chain(by_jurisdiction).chain(global))
    }

    /// Template file name mapped to an item type and form
    pub fn template_file_name(&self, item_type: &str, form: FormNumber) -> Result<String> {
        self.tables
            .template_mapping
            .iter()
            .find(|row| row.item_type == item_type && row.form == form)
            .and_then(|row| row.template_file.clone())
            .ok_or_else(|| GenerationError::TemplateNotFound {
                item_type: item_type.to_string(),
                form,
            })
    }

    /// Apply the fixed per-form file name rules
    pub fn specialize_file_name(
        &self,
        file_name: &str,
        form: FormNumber,
        jurisdiction: &str,
        has_spouse: bool,
    ) -> String {
        specialize_file_name(file_name, form, jurisdiction, has_spouse)
    }

    /// Template file name for a record, specialised for its jurisdiction and spouse
    pub fn specialized_template_file_name(
        &self,
        record: &ItemRecord,
        form: FormNumber,
    ) -> Result<String> {
        let file_name = self.template_file_name(record.item_type(), form)?;
        let specialized =
            specialize_file_name(&file_name, form, record.jurisdiction(), record.has_spouse());
        debug!("Form {} for {}: {}", form, record.item_type(), specialized);
        Ok(specialized)
    }

    /// Every form with a template for the item type
    pub fn applicable_forms_for(&self, item_type: &str) -> BTreeMap<FormNumber, String> {
        let mut forms = BTreeMap::new();
        for row in &self.tables.template_mapping {
            if row.item_type != item_type {
                continue;
            }
            if let Some(file) = &row.template_file {
                forms.entry(row.form).or_insert_with(|| file.clone());
            }
        }
        forms
    }

    /// Form number of the schedule workbook for an item type
    pub fn schedule_form_for(&self, item_type: &str) -> Result<FormNumber> {
        self.tables
            .template_mapping
            .iter()
            .find(|row| {
                row.item_type == item_type
                    && SCHEDULE_FORMS.contains(&row.form)
                    && row.template_file.is_none()
            })
            .map(|row| row.form)
            .ok_or_else(|| GenerationError::TemplateNotFound {
                item_type: item_type.to_string(),
                form: *SCHEDULE_FORMS.start(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Value;

    fn resolver() -> ConfigResolver {
        ConfigResolver::new(
            RuleTables::new()
                .with_template("70N", 1, Some("bill.docx"))
                .with_template("70N", 8, None)
                .with_template("70N", 13, Some("note.docx"))
                .with_template("2054", 1, Some("bill_2054.docx"))
                .with_item_type_keyword("70N", 1, "X", 1i64)
                .with_jurisdiction_keyword(1, "HI", "X", 2i64)
                .with_jurisdiction_keyword(1, "HI", "Y", 2i64)
                .with_global_keyword("X", 3i64)
                .with_global_keyword("Y", 3i64)
                .with_global_keyword("Z", 3i64),
        )
    }

    #[test]
    fn test_keyword_precedence() {
        let keywords = resolver().resolve_keywords("70N", 1, "HI");
        assert_eq!(keywords.get("X"), Some(&Value::Integer(1)));
        assert_eq!(keywords.get("Y"), Some(&Value::Integer(2)));
        assert_eq!(keywords.get("Z"), Some(&Value::Integer(3)));

        let keywords = resolver().resolve_keywords("70N", 1, "CA");
        assert_eq!(keywords.get("X"), Some(&Value::Integer(1)));
        assert_eq!(keywords.get("Y"), Some(&Value::Integer(3)));
    }

    #[test]
    fn test_template_lookup() {
        let resolver = resolver();
        assert_eq!(resolver.template_file_name("70N", 1).unwrap(), "bill.docx");
        let err = resolver.template_file_name("70N", 2).unwrap_err();
        assert!(matches!(err, GenerationError::TemplateNotFound { form: 2, .. }));
        // A row with no file name is not a template
        assert!(resolver.template_file_name("70N", 8).is_err());
    }

    #[test]
    fn test_applicable_forms_skip_null_file_names() {
        let forms = resolver().applicable_forms_for("70N");
        assert_eq!(forms.keys().copied().collect::<Vec<_>>(), vec![1, 13]);
    }

    #[test]
    fn test_schedule_form() {
        assert_eq!(resolver().schedule_form_for("70N").unwrap(), 8);
        assert!(resolver().schedule_form_for("2054").is_err());
    }
}
