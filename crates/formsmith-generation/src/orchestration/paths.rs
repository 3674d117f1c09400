//! Output path derivation

use std::path::{Path, PathBuf};

use formsmith_config::SchemaConfig;

use crate::error::{GenerationError, Result};
use crate::models::ItemRecord;
use crate::orchestration::policy::{FormRule, NameTokens};
use crate::rules::insert_before_extension;

/// Contract date as `YYYYMMDD`
pub fn date_token(record: &ItemRecord, schema: &SchemaConfig) -> Result<String> {
    record
        .contract_date()
        .map(|date| date.format("%Y%m%d").to_string())
        .ok_or_else(|| GenerationError::MissingKeyword(schema.contract_date.clone()))
}

fn customer_token(record: &ItemRecord, schema: &SchemaConfig) -> Result<String> {
    record
        .customer_name()
        .map(|name| name.trim().to_string())
        .ok_or_else(|| GenerationError::MissingKeyword(schema.customer_name.clone()))
}

fn property_token(record: &ItemRecord, schema: &SchemaConfig) -> Result<String> {
    record
        .property_token()
        .map(str::to_string)
        .ok_or_else(|| GenerationError::MissingKeyword(schema.property_token.clone()))
}

/// Directory an output of `rule` goes to
pub fn output_dir(
    output_root: &Path,
    record: &ItemRecord,
    rule: &FormRule,
    schema: &SchemaConfig,
) -> Result<PathBuf> {
    let customer_dir = format!(
        "{}_{}",
        date_token(record, schema)?,
        customer_token(record, schema)?
    );
    let mut dir = output_root.join(&customer_dir);
    if !rule.is_customer_level() {
        dir.push(format!("{}_{}", customer_dir, property_token(record, schema)?));
    }
    Ok(dir)
}

/// Name tokens for an output, `guarantor` being the guarantor it is written for
pub fn name_tokens(
    record: &ItemRecord,
    naming: NameTokens,
    guarantor: Option<&str>,
    schema: &SchemaConfig,
) -> Result<Vec<String>> {
    let mut tokens = vec![date_token(record, schema)?, customer_token(record, schema)?];
    match naming {
        NameTokens::Customer => {}
        NameTokens::Guarantor => {
            if let Some(name) = guarantor {
                tokens.push(name.to_string());
            }
        }
        NameTokens::Property => tokens.push(property_token(record, schema)?),
        NameTokens::PropertyAndType => {
            tokens.push(property_token(record, schema)?);
            tokens.push(record.item_type().to_string());
        }
    }
    Ok(tokens)
}

/// Insert `_` + the underscore-joined tokens before the extension
pub fn output_file_name(template_file: &str, tokens: &[String]) -> String {
    insert_before_extension(template_file, &format!("_{}", tokens.join("_")))
}
