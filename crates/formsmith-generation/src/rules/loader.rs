//! Rule table loading from a directory of CSV files

use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, info};

use crate::error::{GenerationError, Result};
use crate::models::Value;
use crate::rules::tables::{
    FormNumber, GlobalKeywordRow, ItemTypeKeywordRow, JurisdictionKeywordRow, RuleTables,
    TemplateMappingRow,
};

/// File name of table (1)
pub const TEMPLATE_MAPPING_FILE: &str = "template_mapping.csv";
/// File name of table (2)
pub const JURISDICTION_KEYWORDS_FILE: &str = "keywords_by_jurisdiction.csv";
/// File name of table (3)
pub const ITEM_TYPE_KEYWORDS_FILE: &str = "keywords_by_item_type.csv";
/// File name of table (4)
pub const GLOBAL_KEYWORDS_FILE: &str = "keywords_global.csv";

#[derive(Debug, Deserialize)]
struct RawTemplateMapping {
    item_type: String,
    form: String,
    #[serde(default)]
    form_name: String,
    #[serde(default)]
    template_file: String,
}

#[derive(Debug, Deserialize)]
struct RawJurisdictionKeyword {
    form: String,
    #[serde(default)]
    form_name: String,
    key: String,
    jurisdiction: String,
    #[serde(default)]
    value: String,
}

#[derive(Debug, Deserialize)]
struct RawItemTypeKeyword {
    item_type: String,
    form: String,
    #[serde(default)]
    form_name: String,
    key: String,
    #[serde(default)]
    value: String,
}

#[derive(Debug, Deserialize)]
struct RawGlobalKeyword {
    key: String,
    #[serde(default)]
    value: String,
}

/// Load the four rule tables from `dir`
pub fn load_rule_tables(dir: &Path) -> Result<RuleTables> {
    let template_mapping = read_rows::<RawTemplateMapping>(&dir.join(TEMPLATE_MAPPING_FILE))?
        .into_iter()
        .map(|raw| {
            Ok(TemplateMappingRow {
                item_type: raw.item_type.trim().to_string(),
                form: parse_form(&raw.form)?,
                form_name: raw.form_name,
                template_file: non_blank(&raw.template_file),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let by_jurisdiction =
        read_rows::<RawJurisdictionKeyword>(&dir.join(JURISDICTION_KEYWORDS_FILE))?
            .into_iter()
            .map(|raw| {
                Ok(JurisdictionKeywordRow {
                    form: parse_form(&raw.form)?,
                    form_name: raw.form_name,
                    key: raw.key.trim_end().to_string(),
                    jurisdiction: raw.jurisdiction.trim().to_string(),
                    value: keyword_value(&raw.value),
                })
            })
            .collect::<Result<Vec<_>>>()?;

    let by_item_type = read_rows::<RawItemTypeKeyword>(&dir.join(ITEM_TYPE_KEYWORDS_FILE))?
        .into_iter()
        .map(|raw| {
            Ok(ItemTypeKeywordRow {
                item_type: raw.item_type.trim().to_string(),
                form: parse_form(&raw.form)?,
                form_name: raw.form_name,
                key: raw.key.trim_end().to_string(),
                value: keyword_value(&raw.value),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let global = read_rows::<RawGlobalKeyword>(&dir.join(GLOBAL_KEYWORDS_FILE))?
        .into_iter()
        .map(|raw| GlobalKeywordRow {
            key: raw.key.trim_end().to_string(),
            value: keyword_value(&raw.value),
        })
        .collect();

    let tables = RuleTables {
        template_mapping,
        by_jurisdiction,
        by_item_type,
        global,
    };
    info!(
        "Loaded rule tables from {}: {} templates, {} jurisdiction, {} item type, {} global keywords",
        dir.display(),
        tables.template_mapping.len(),
        tables.by_jurisdiction.len(),
        tables.by_item_type.len(),
        tables.global.len()
    );
    Ok(tables)
}

fn read_rows<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::None)
        .from_path(path)?;

    let headers = reader.headers()?.clone();
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        if record.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }
        rows.push(record.deserialize(Some(&headers))?);
    }
    debug!("Read {} rows from {}", rows.len(), path.display());
    Ok(rows)
}

fn parse_form(raw: &str) -> Result<FormNumber> {
    let trimmed = raw.trim();
    trimmed
        .parse::<FormNumber>()
        .ok()
        .or_else(|| {
            trimmed
                .parse::<f64>()
                .ok()
                .filter(|f| f.fract() == 0.0 && *f >= 0.0)
                .map(|f| f as FormNumber)
        })
        .ok_or_else(|| GenerationError::Validation(format!("Invalid form number {:?}", raw)))
}

fn non_blank(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// A keyword row with a blank value is an explicit empty override
fn keyword_value(raw: &str) -> Value {
    Value::parse_cell(raw).unwrap_or_else(|| Value::Text(String::new()))
}
