//! Data models for the generation pipeline

use std::collections::HashMap;
use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};
use formsmith_config::SchemaConfig;
use serde::{Deserialize, Serialize};

use crate::error::{GenerationError, Result};

const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%Y/%m/%d"];
const DATE_TIME_FORMATS: [&str; 3] = ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y/%m/%d %H:%M:%S"];

/// A single cell or keyword value.
///
/// Blank cells are represented by absence, never by an empty `Text`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Value {
    /// Free text
    Text(String),
    /// Whole number
    Integer(i64),
    /// Fractional number
    Float(f64),
    /// Calendar date
    Date(NaiveDate),
    /// Date with time of day
    DateTime(NaiveDateTime),
}

impl Value {
    /// Parse a raw cell, inferring its type.
    ///
    /// Returns `None` for blank cells. Integral floats normalise to integers and
    /// digit strings with a leading zero (postal codes, account numbers) stay text.
    pub fn parse_cell(raw: &str) -> Option<Value> {
        let trimmed = raw.trim_end();
        if trimmed.is_empty() {
            return None;
        }
        let candidate = trimmed.trim_start();

        for format in DATE_FORMATS {
            if let Ok(date) = NaiveDate::parse_from_str(candidate, format) {
                return Some(Value::Date(date));
            }
        }
        for format in DATE_TIME_FORMATS {
            if let Ok(date_time) = NaiveDateTime::parse_from_str(candidate, format) {
                return Some(Value::DateTime(date_time));
            }
        }
        if looks_numeric(candidate) {
            if let Ok(n) = candidate.parse::<i64>() {
                return Some(Value::Integer(n));
            }
            if let Ok(f) = candidate.parse::<f64>() {
                if f.is_finite() {
                    return Some(Value::Float(f).normalized());
                }
            }
        }
        Some(Value::Text(trimmed.to_string()))
    }

    /// Normalise a value coming from a typed source: text is right-trimmed (and
    /// dropped when empty), integral floats become integers.
    pub fn normalize(value: Value) -> Option<Value> {
        match value {
            Value::Text(text) => {
                let trimmed = text.trim_end();
                if trimmed.is_empty() {
                    None
                } else {
                    Some(Value::Text(trimmed.to_string()))
                }
            }
            other => Some(other.normalized()),
        }
    }

    fn normalized(self) -> Value {
        match self {
            Value::Float(f) if f.fract() == 0.0 && f.abs() < 9.0e15 => Value::Integer(f as i64),
            other => other,
        }
    }

    /// Text content, if this is a text value
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Calendar date of a date or date-time value
    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Value::Date(date) => Some(*date),
            Value::DateTime(date_time) => Some(date_time.date()),
            _ => None,
        }
    }

    /// Numeric content of an integer or float value
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(n) => Some(*n as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Whether the value is a date or date-time
    pub fn is_temporal(&self) -> bool {
        matches!(self, Value::Date(_) | Value::DateTime(_))
    }

    /// Whether the value is an integer or float
    pub fn is_numeric(&self) -> bool {
        matches!(self, Value::Integer(_) | Value::Float(_))
    }
}

fn looks_numeric(s: &str) -> bool {
    let digits = s.strip_prefix('-').unwrap_or(s);
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit() || c == '.') {
        return false;
    }
    let integer_part = digits.split('.').next().unwrap_or("");
    !(integer_part.len() > 1 && integer_part.starts_with('0'))
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Text(text) => f.write_str(text),
            Value::Integer(n) => write!(f, "{}", n),
            Value::Float(x) => write!(f, "{}", x),
            Value::Date(date) => write!(f, "{}", date.format("%Y-%m-%d")),
            Value::DateTime(date_time) => write!(f, "{}", date_time.format("%Y-%m-%d %H:%M:%S")),
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<NaiveDate> for Value {
    fn from(value: NaiveDate) -> Self {
        Value::Date(value)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(value: NaiveDateTime) -> Self {
        Value::DateTime(value)
    }
}

/// A co-signer attached to an item
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuarantorRecord {
    /// Guarantor name
    pub name: String,
    /// Guarantor postal code
    pub postal_code: String,
    /// Guarantor address
    pub address: String,
}

impl GuarantorRecord {
    /// Create a guarantor record
    pub fn new(
        name: impl Into<String>,
        postal_code: impl Into<String>,
        address: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            postal_code: postal_code.into(),
            address: address.into(),
        }
    }
}

/// Split a multi-value guarantor field. An empty string yields no entries.
pub fn split_multi_value(content: &str, separator: char) -> Vec<String> {
    if content.is_empty() {
        return Vec::new();
    }
    content
        .split(separator)
        .map(|item| item.trim().to_string())
        .collect()
}

/// One item of the batch: its fields in input order plus derived guarantors.
///
/// Built once by the [`RecordBuilder`](crate::input::RecordBuilder) and never
/// mutated afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemRecord {
    fields: Vec<(String, Value)>,
    index: HashMap<String, usize>,
    guarantors: Vec<GuarantorRecord>,
    item_type: String,
    contract_date: Option<NaiveDate>,
    customer_name: Option<String>,
    jurisdiction: String,
    is_individual: bool,
    has_spouse: bool,
    property_token: Option<String>,
    ownership_category: Option<String>,
}

impl ItemRecord {
    /// Build a record from its non-blank fields.
    ///
    /// Fails with a validation error when the item type is blank or the
    /// guarantor fields split into lists of different lengths.
    pub fn from_fields(
        fields: Vec<(String, Value)>,
        schema: &SchemaConfig,
        guarantor_separator: char,
    ) -> Result<Self> {
        let index: HashMap<String, usize> = fields
            .iter()
            .enumerate()
            .map(|(i, (name, _))| (name.clone(), i))
            .collect();
        let text = |name: &str| -> Option<String> {
            index
                .get(name)
                .map(|&i| fields[i].1.to_string().trim().to_string())
                .filter(|s| !s.is_empty())
        };

        let item_type = text(&schema.item_type).ok_or_else(|| {
            GenerationError::Validation(format!("Item has no {:?}", schema.item_type))
        })?;
        let contract_date = index
            .get(&schema.contract_date)
            .and_then(|&i| fields[i].1.as_date());
        let individual_name = text(&schema.customer_name);
        let is_individual = individual_name.is_some();
        let customer_name = individual_name.or_else(|| text(&schema.corporate_name));
        let jurisdiction = text(&schema.jurisdiction)
            .map(|j| j.chars().take(2).collect())
            .unwrap_or_default();
        let has_spouse = text(&schema.spouse_name).is_some();
        let property_token = text(&schema.property_token);
        let ownership_category = text(&schema.ownership_category);

        let guarantors = parse_guarantors(&text, schema, guarantor_separator)?;

        Ok(Self {
            fields,
            index,
            guarantors,
            item_type,
            contract_date,
            customer_name,
            jurisdiction,
            is_individual,
            has_spouse,
            property_token,
            ownership_category,
        })
    }

    /// Value of a field, if present
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.index.get(name).map(|&i| &self.fields[i].1)
    }

    /// Fields in input order
    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of non-blank fields
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the record has no fields
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Item type name
    pub fn item_type(&self) -> &str {
        &self.item_type
    }

    /// Contract date, required for every output file name
    pub fn contract_date(&self) -> Option<NaiveDate> {
        self.contract_date
    }

    /// Customer name for individuals, corporate name otherwise
    pub fn customer_name(&self) -> Option<&str> {
        self.customer_name.as_deref()
    }

    /// Two-letter jurisdiction code (empty when not given)
    pub fn jurisdiction(&self) -> &str {
        &self.jurisdiction
    }

    /// Whether the primary party is a natural person
    pub fn is_individual(&self) -> bool {
        self.is_individual
    }

    /// Whether a spouse is recorded for the primary party
    pub fn has_spouse(&self) -> bool {
        self.has_spouse
    }

    /// Address token used in output names
    pub fn property_token(&self) -> Option<&str> {
        self.property_token.as_deref()
    }

    /// Collateral ownership category
    pub fn ownership_category(&self) -> Option<&str> {
        self.ownership_category.as_deref()
    }

    /// Guarantors attached to this item
    pub fn guarantors(&self) -> &[GuarantorRecord] {
        &self.guarantors
    }
}

fn parse_guarantors(
    text: &dyn Fn(&str) -> Option<String>,
    schema: &SchemaConfig,
    separator: char,
) -> Result<Vec<GuarantorRecord>> {
    let names = split_multi_value(&text(&schema.guarantor_name).unwrap_or_default(), separator);

    let suppressed = text(&schema.guarantor_address_output).as_deref()
        == Some(schema.guarantor_address_suppress_value.as_str());
    let (postal_codes, addresses) = if suppressed {
        (vec![String::new(); names.len()], vec![String::new(); names.len()])
    } else {
        (
            split_multi_value(
                &text(&schema.guarantor_postal_code).unwrap_or_default(),
                separator,
            ),
            split_multi_value(&text(&schema.guarantor_address).unwrap_or_default(), separator),
        )
    };

    if postal_codes.len() != names.len() || addresses.len() != names.len() {
        return Err(GenerationError::Validation(format!(
            "Guarantor fields disagree: {} names, {} postal codes, {} addresses",
            names.len(),
            postal_codes.len(),
            addresses.len()
        )));
    }

    Ok(names
        .into_iter()
        .zip(postal_codes)
        .zip(addresses)
        .map(|((name, postal_code), address)| GuarantorRecord {
            name,
            postal_code,
            address,
        })
        .collect())
}

/// An item paired with its precomputed schedule keywords.
///
/// The schedule comes from the external schedule collaborator and is opaque
/// beyond keyword lookup.
#[derive(Debug, Clone)]
pub struct BatchItem {
    /// Item fields
    pub record: ItemRecord,
    /// Keywords computed by the schedule workbook
    pub schedule: HashMap<String, Value>,
}

impl BatchItem {
    /// Pair a record with its schedule keywords
    pub fn new(record: ItemRecord, schedule: HashMap<String, Value>) -> Self {
        Self { record, schedule }
    }

    /// An item without schedule keywords
    pub fn without_schedule(record: ItemRecord) -> Self {
        Self::new(record, HashMap::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> SchemaConfig {
        SchemaConfig::default()
    }

    fn record(fields: &[(&str, Value)]) -> Result<ItemRecord> {
        ItemRecord::from_fields(
            fields
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
            &schema(),
            '*',
        )
    }

    #[test]
    fn test_parse_cell_types() {
        assert_eq!(Value::parse_cell("   "), None);
        assert_eq!(Value::parse_cell("1234"), Some(Value::Integer(1234)));
        assert_eq!(Value::parse_cell("12.50"), Some(Value::Float(12.5)));
        assert_eq!(Value::parse_cell("12.0"), Some(Value::Integer(12)));
        assert_eq!(Value::parse_cell("0123"), Some(Value::Text("0123".into())));
        assert_eq!(
            Value::parse_cell("2024-01-05"),
            Some(Value::Date(NaiveDate::from_ymd_opt(2024, 1, 5).unwrap()))
        );
        assert_eq!(Value::parse_cell("Tokyo  "), Some(Value::Text("Tokyo".into())));
    }

    #[test]
    fn test_split_multi_value() {
        assert!(split_multi_value("", '*').is_empty());
        assert_eq!(split_multi_value("A*B", '*'), vec!["A", "B"]);
        assert_eq!(split_multi_value(" A * B ", '*'), vec!["A", "B"]);
    }

    #[test]
    fn test_typed_accessors() {
        let r = record(&[
            ("item_type", Value::Integer(2054)),
            ("contract_date", NaiveDate::from_ymd_opt(2024, 3, 1).unwrap().into()),
            ("corporate_name", "Acme KK".into()),
            ("collateral_jurisdiction", "HI (Hawaii)".into()),
        ])
        .unwrap();
        assert_eq!(r.item_type(), "2054");
        assert_eq!(r.customer_name(), Some("Acme KK"));
        assert!(!r.is_individual());
        assert_eq!(r.jurisdiction(), "HI");
        assert_eq!(r.contract_date(), NaiveDate::from_ymd_opt(2024, 3, 1));
    }

    #[test]
    fn test_guarantor_lengths_must_match() {
        let err = record(&[
            ("item_type", "70N".into()),
            ("guarantor_name", "A*B".into()),
            ("guarantor_postal_code", "100".into()),
            ("guarantor_address", "X*Y".into()),
        ])
        .unwrap_err();
        assert!(matches!(err, GenerationError::Validation(_)));
    }

    #[test]
    fn test_suppressed_addresses_are_blank() {
        let r = record(&[
            ("item_type", "70N".into()),
            ("guarantor_name", "A*B".into()),
            ("guarantor_address", "only one".into()),
            ("guarantor_address_output", "no".into()),
        ])
        .unwrap();
        assert_eq!(
            r.guarantors(),
            &[GuarantorRecord::new("A", "", ""), GuarantorRecord::new("B", "", "")]
        );
    }
}
