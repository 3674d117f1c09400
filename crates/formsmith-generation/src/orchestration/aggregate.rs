//! Whole-batch aggregate workbooks

use formsmith_config::SchemaConfig;
use tracing::debug;

use crate::document::{Workbook, Worksheet};
use crate::error::{GenerationError, Result};
use crate::models::{ItemRecord, Value};

/// Sheet holding the billing total; the first sheet is used when absent
pub const BILLING_TOTAL_SHEET: &str = "billing_total";

const BILLING_FIRST_ROW: u32 = 3;
const PRINCIPAL_FIRST_ROW: u32 = 2;

fn no_sheet() -> GenerationError {
    GenerationError::Validation("Aggregate template has no worksheet".to_string())
}

/// Fill the billing total sheet.
///
/// A1 receives the customer name. From row 3, one row per billable item gets
/// the property address (A) and total billed amount (B); the template's own
/// rows from row 5 on are pushed down as the list grows, and the row after the
/// last item receives the `SUM` formula in B.
pub fn fill_billing_total(
    book: &mut Workbook,
    customer: &str,
    items: &[&ItemRecord],
    schema: &SchemaConfig,
) -> Result<()> {
    let sheet = book
        .sheet_or_first_mut(BILLING_TOTAL_SHEET)
        .ok_or_else(no_sheet)?;
    sheet.set(1, 1, Some(Value::from(customer)));

    let mut last = BILLING_FIRST_ROW;
    for (row, record) in (BILLING_FIRST_ROW..).zip(items) {
        if row >= BILLING_FIRST_ROW + 2 {
            shift_down(sheet, row, 2);
        }
        let address = record
            .get(&schema.property_address)
            .cloned()
            .ok_or_else(|| GenerationError::MissingKeyword(schema.property_address.clone()))?;
        let total = record
            .get(&schema.total_billing)
            .cloned()
            .ok_or_else(|| GenerationError::MissingKeyword(schema.total_billing.clone()))?;
        sheet.set(row, 1, Some(address));
        sheet.set(row, 2, Some(total));
        last = row;
    }

    sheet.set(
        last + 1,
        2,
        Some(Value::Text(format!("=SUM(B{}:B{})", BILLING_FIRST_ROW, last))),
    );
    Ok(())
}

fn shift_down(sheet: &mut Worksheet, row: u32, columns: u32) {
    for column in 1..=columns {
        let current = sheet.get(row, column).cloned();
        sheet.set(row + 1, column, current);
    }
}

/// Fill the principal total sheet.
///
/// From row 2, one row per item gets a running index (A), the item type (B),
/// the property name (C) and the principal (D). Missing values are left blank.
/// The row after the last item is cleared and receives the `SUM` formula in D.
pub fn fill_principal_total(
    book: &mut Workbook,
    items: &[&ItemRecord],
    schema: &SchemaConfig,
) -> Result<()> {
    let sheet = book.sheets.first_mut().ok_or_else(no_sheet)?;

    let mut last = PRINCIPAL_FIRST_ROW;
    for ((row, index), record) in (PRINCIPAL_FIRST_ROW..).zip(1i64..).zip(items) {
        let field = |key: &str| {
            let value = record.get(key).cloned();
            if value.is_none() {
                debug!("{:?} cannot be filled for item {}", key, index);
            }
            value
        };
        sheet.set(row, 1, Some(Value::Integer(index)));
        sheet.set(row, 2, Some(Value::from(record.item_type())));
        sheet.set(row, 3, field(&schema.property_name));
        sheet.set(row, 4, field(&schema.principal));
        last = row;
    }

    for column in 1..=3 {
        sheet.set(last + 1, column, None);
    }
    sheet.set(
        last + 1,
        4,
        Some(Value::Text(format!("=SUM(D{}:D{})", PRINCIPAL_FIRST_ROW, last))),
    );
    Ok(())
}
