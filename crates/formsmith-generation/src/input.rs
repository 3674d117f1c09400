//! Input table parsing and item record construction
//!
//! The input table lists one field per row: the first column holds field names
//! and every following column holds one item's raw values, in generation order.
//! Blank cells inherit the value of the nearest preceding item that has one.

use std::collections::HashMap;
use std::path::Path;

use formsmith_config::{AppConfig, SchemaConfig};
use tracing::debug;

use crate::error::Result;
use crate::models::{ItemRecord, Value};

/// Raw input: field names and one column of optional values per item
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InputTable {
    field_names: Vec<String>,
    columns: Vec<Vec<Option<Value>>>,
}

impl InputTable {
    /// Create a table from field names and item columns.
    ///
    /// Columns are padded with blanks (or truncated) to the number of fields.
    /// Field names are right-trimmed.
    pub fn new(field_names: Vec<String>, columns: Vec<Vec<Option<Value>>>) -> Self {
        let field_names: Vec<String> = field_names
            .into_iter()
            .map(|name| name.trim_end().to_string())
            .collect();
        let width = field_names.len();
        let columns = columns
            .into_iter()
            .map(|mut column| {
                column.resize(width, None);
                column
            })
            .collect();
        Self {
            field_names,
            columns,
        }
    }

    /// Build a table from text rows, one field per row.
    ///
    /// The first cell of each row is the field name; rows with a blank name are
    /// ignored. Value cells are typed with [`Value::parse_cell`].
    pub fn from_text_rows<R, S>(rows: R) -> Self
    where
        R: IntoIterator,
        R::Item: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut field_names = Vec::new();
        let mut cells_by_field: Vec<Vec<Option<Value>>> = Vec::new();
        for row in rows {
            let mut cells = row.into_iter();
            let name = match cells.next() {
                Some(name) if !name.as_ref().trim().is_empty() => name.as_ref().to_string(),
                _ => continue,
            };
            field_names.push(name);
            cells_by_field.push(cells.map(|c| Value::parse_cell(c.as_ref())).collect());
        }

        let item_count = cells_by_field.iter().map(Vec::len).max().unwrap_or(0);
        let columns = (0..item_count)
            .map(|item| {
                cells_by_field
                    .iter()
                    .map(|cells| cells.get(item).cloned().flatten())
                    .collect()
            })
            .collect();
        Self::new(field_names, columns)
    }

    /// Load a table from a CSV file laid out one field per row
    pub fn load_csv(path: &Path) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_path(path)?;
        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            rows.push(record.iter().map(str::to_string).collect::<Vec<_>>());
        }
        debug!("Loaded {} input fields from {}", rows.len(), path.display());
        Ok(Self::from_text_rows(rows))
    }

    /// Rebuild a fully expanded table from records, using `field_names` as rows
    pub fn from_records(field_names: &[String], records: &[ItemRecord]) -> Self {
        let columns = records
            .iter()
            .map(|record| {
                field_names
                    .iter()
                    .map(|name| record.get(name).cloned())
                    .collect()
            })
            .collect();
        Self::new(field_names.to_vec(), columns)
    }

    /// Field names in row order
    pub fn field_names(&self) -> &[String] {
        &self.field_names
    }

    /// Item columns in generation order
    pub fn columns(&self) -> &[Vec<Option<Value>>] {
        &self.columns
    }
}

/// Turns an [`InputTable`] into item records
pub struct RecordBuilder<'a> {
    schema: &'a SchemaConfig,
    guarantor_separator: char,
}

impl<'a> RecordBuilder<'a> {
    /// Create a builder for the given schema and guarantor separator
    pub fn new(schema: &'a SchemaConfig, guarantor_separator: char) -> Self {
        Self {
            schema,
            guarantor_separator,
        }
    }

    /// Create a builder from the host configuration
    pub fn from_config(config: &'a AppConfig) -> Self {
        Self::new(&config.schema, config.business.guarantor_separator)
    }

    /// Build the ordered item records.
    ///
    /// Fully blank columns and items whose type is blank after inheritance are
    /// dropped and contribute nothing to inheritance. Numeric cells of the
    /// schema's text fields are turned back into text.
    pub fn build(&self, table: &InputTable) -> Result<Vec<ItemRecord>> {
        let mut inherited: HashMap<&str, &Value> = HashMap::new();
        let mut records = Vec::new();

        for (column_index, column) in table.columns().iter().enumerate() {
            if column.iter().all(Option::is_none) {
                debug!("Column {} is empty, skipping", column_index + 1);
                continue;
            }

            let fields: Vec<(String, Value)> = table
                .field_names()
                .iter()
                .zip(column)
                .filter_map(|(name, cell)| {
                    cell.as_ref()
                        .or_else(|| inherited.get(name.as_str()).copied())
                        .map(|value| (name.clone(), self.field_value(name, value)))
                })
                .collect();

            let has_type = fields.iter().any(|(name, value)| {
                name == &self.schema.item_type && !value.to_string().trim().is_empty()
            });
            if !has_type {
                debug!(
                    "Column {} has no {:?}, not an item",
                    column_index + 1,
                    self.schema.item_type
                );
                continue;
            }

            for (name, cell) in table.field_names().iter().zip(column) {
                if let Some(value) = cell {
                    inherited.insert(name.as_str(), value);
                }
            }

            let record = ItemRecord::from_fields(fields, self.schema, self.guarantor_separator)?;
            log_record(column_index + 1, &record);
            records.push(record);
        }

        Ok(records)
    }

    fn field_value(&self, name: &str, value: &Value) -> Value {
        if value.is_numeric() && self.schema.is_text_field(name) {
            Value::Text(value.to_string())
        } else {
            value.clone()
        }
    }
}

fn log_record(column: usize, record: &ItemRecord) {
    debug!("+--- input column {} ({}) ---", column, record.item_type());
    for (key, value) in record.fields() {
        debug!("| {:?} => {:?}", key, value);
    }
    debug!("+{}", "-".repeat(40));
}
