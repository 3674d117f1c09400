//! Batch pre-scan

use formsmith_config::AppConfig;
use tracing::debug;

use crate::error::{GenerationError, Result};
use crate::models::{BatchItem, GuarantorRecord};

/// Facts about the whole batch, computed once before anything is written.
///
/// Building a context also checks every cross-item invariant, so a batch that
/// would fail halfway never produces partial output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchContext {
    special_positions: Vec<usize>,
    billable: Vec<usize>,
    suppressed: Vec<bool>,
    guarantors: Vec<GuarantorRecord>,
}

impl BatchContext {
    /// Scan and validate a batch
    pub fn scan(items: &[BatchItem], config: &AppConfig) -> Result<Self> {
        let schema = &config.schema;
        let business = &config.business;

        let first = items
            .first()
            .ok_or_else(|| GenerationError::Validation("The batch has no items".to_string()))?;

        for (i, item) in items.iter().enumerate() {
            let record = &item.record;
            if record.contract_date().is_none() {
                return Err(GenerationError::MissingKeyword(format!(
                    "{} (item {})",
                    schema.contract_date,
                    i + 1
                )));
            }
            if record.customer_name().is_none() {
                return Err(GenerationError::MissingKeyword(format!(
                    "{} or {} (item {})",
                    schema.customer_name,
                    schema.corporate_name,
                    i + 1
                )));
            }
            if business.is_combined(record.item_type()) {
                let preceded = i
                    .checked_sub(1)
                    .and_then(|p| items.get(p))
                    .map(|prev| business.is_placeholder(prev.record.item_type()))
                    .unwrap_or(false);
                if !preceded {
                    return Err(GenerationError::Consistency(format!(
                        "Item {} of type {} must directly follow an item of type {}",
                        i + 1,
                        record.item_type(),
                        business.placeholder_item_type
                    )));
                }
            }
        }

        let guarantors = first.record.guarantors().to_vec();
        if let Some(i) = items
            .iter()
            .position(|item| item.record.guarantors() != guarantors.as_slice())
        {
            return Err(GenerationError::Consistency(format!(
                "Item {} lists different guarantors than item 1; every item must list the same guarantors",
                i + 1
            )));
        }

        let suppressed: Vec<bool> = items
            .iter()
            .enumerate()
            .map(|(i, item)| {
                business.is_placeholder(item.record.item_type())
                    && items
                        .get(i + 1)
                        .map(|next| business.is_combined(next.record.item_type()))
                        .unwrap_or(false)
            })
            .collect();
        let billable = (0..items.len()).filter(|&i| !suppressed[i]).collect();

        let special_positions = items
            .iter()
            .enumerate()
            .filter(|(_, item)| business.is_special(item.record.item_type()))
            .map(|(i, _)| i)
            .collect();

        let context = Self {
            special_positions,
            billable,
            suppressed,
            guarantors,
        };
        debug!(
            "Batch of {} items: {} billable, special items at {:?}, {} guarantors",
            items.len(),
            context.billable_count(),
            context.special_positions,
            context.guarantors.len()
        );
        Ok(context)
    }

    /// Positions of items whose type carries the special marker
    pub fn special_positions(&self) -> &[usize] {
        &self.special_positions
    }

    /// Position of the special item when the batch holds exactly one
    pub fn single_special_position(&self) -> Option<usize> {
        match self.special_positions.as_slice() {
            [only] => Some(*only),
            _ => None,
        }
    }

    /// Positions of billable items, in order
    pub fn billable_positions(&self) -> &[usize] {
        &self.billable
    }

    /// Number of bills the batch produces
    pub fn billable_count(&self) -> usize {
        self.billable.len()
    }

    /// Whether the item's combined-form output is folded into the next item
    pub fn is_suppressed(&self, position: usize) -> bool {
        self.suppressed.get(position).copied().unwrap_or(false)
    }

    /// Guarantor list shared by every item
    pub fn guarantors(&self) -> &[GuarantorRecord] {
        &self.guarantors
    }
}
