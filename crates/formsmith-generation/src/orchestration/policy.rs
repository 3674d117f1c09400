//! Per-form generation policies
//!
//! Every form number maps to one declarative [`FormRule`]; the orchestrator
//! dispatches on it instead of branching on form numbers.

use formsmith_config::SchemaConfig;

use crate::rules::FormNumber;

/// Forms written directly under the customer directory
pub const CUSTOMER_LEVEL_FORMS: [FormNumber; 5] = [3, 15, 16, 17, 18];

/// Whole-batch aggregate documents
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateKind {
    /// Billed amount per billable item, with a total
    BillingTotal,
    /// Principal per item, with a total
    PrincipalTotal,
}

/// Fields merged from the placeholder item and the combined item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergedFields {
    /// Nothing merged
    None,
    /// Product name and billed amount
    Billing,
    /// Contract date and final payment date
    Dates,
}

impl MergedFields {
    /// Input field names merged for this set
    pub fn keys<'a>(&self, schema: &'a SchemaConfig) -> Vec<&'a str> {
        match self {
            MergedFields::None => Vec::new(),
            MergedFields::Billing => vec![
                schema.product_name_master.as_str(),
                schema.billing_amount.as_str(),
            ],
            MergedFields::Dates => vec![
                schema.contract_date.as_str(),
                schema.final_payment_date.as_str(),
            ],
        }
    }
}

/// How a form is produced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormPolicy {
    /// Produced elsewhere
    Skip,
    /// Once per batch after the item loop
    AggregateOnce(AggregateKind),
    /// Per item, merged with the preceding placeholder item when combined
    CombinedWithNext(MergedFields),
    /// Once per batch, per guarantor of the first item plus the primary party
    PerGuarantor,
    /// Once per batch, per guarantor of the shared guarantor list
    PerGuarantorGlobal,
    /// Plain substitution per item
    DefaultSubstitution,
}

/// Tokens appended to output file names
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameTokens {
    /// Contract date and customer
    Customer,
    /// Contract date, customer and guarantor
    Guarantor,
    /// Contract date, customer and property
    Property,
    /// Contract date, customer, property and item type
    PropertyAndType,
}

/// Order of keyword layers below the overlay
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layering {
    /// Overlay, schedule, record, rules
    RecordFirst,
    /// Overlay, rules, schedule, record
    RulesFirst,
}

/// Template variant tokens inserted before the template extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateVariant {
    /// Template used as mapped
    None,
    /// `single` for at most one guarantor, `multiple` otherwise
    GuarantorCount {
        /// Token for zero or one guarantor
        single: &'static str,
        /// Token for several guarantors
        multiple: &'static str,
    },
    /// Special marker, then the ownership token when ownership is separate
    SpecialOwnership,
    /// Ownership token when ownership is separate
    Ownership,
}

/// When a per-item form is produced at all
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    /// Always
    Always,
    /// Only for separate ownership in the given jurisdiction
    SeparateOwnershipIn(&'static str),
}

/// Everything the orchestrator needs to know about one form
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormRule {
    /// Production policy
    pub policy: FormPolicy,
    /// Output name tokens
    pub naming: NameTokens,
    /// Keyword layer order
    pub layering: Layering,
    /// Template variant selection
    pub variant: TemplateVariant,
    /// Row height of the guarantor address table, if the form has one
    pub guarantor_table: Option<usize>,
    /// Whether the principal is spelled out in words
    pub amount_in_words: bool,
    /// Whether the form lists the properties of preceding items
    pub property_list: bool,
    /// Production condition
    pub gate: Gate,
}

impl FormRule {
    const fn new(policy: FormPolicy, naming: NameTokens, layering: Layering) -> Self {
        Self {
            policy,
            naming,
            layering,
            variant: TemplateVariant::None,
            guarantor_table: None,
            amount_in_words: false,
            property_list: false,
            gate: Gate::Always,
        }
    }

    const fn variant(mut self, variant: TemplateVariant) -> Self {
        self.variant = variant;
        self
    }

    const fn guarantor_table(mut self, row_height: usize) -> Self {
        self.guarantor_table = Some(row_height);
        self
    }

    const fn amount_in_words(mut self) -> Self {
        self.amount_in_words = true;
        self
    }

    const fn property_list(mut self) -> Self {
        self.property_list = true;
        self
    }

    const fn gate(mut self, gate: Gate) -> Self {
        self.gate = gate;
        self
    }

    /// Whether the form is written under the customer directory rather than a
    /// property directory
    pub fn is_customer_level(&self) -> bool {
        matches!(
            self.policy,
            FormPolicy::AggregateOnce(_) | FormPolicy::PerGuarantor | FormPolicy::PerGuarantorGlobal
        )
    }

    /// Whether the form is produced inside the per-item pass
    pub fn is_per_item(&self) -> bool {
        matches!(
            self.policy,
            FormPolicy::CombinedWithNext(_) | FormPolicy::DefaultSubstitution
        )
    }
}

/// The rule for a form number
pub fn form_rule(form: FormNumber) -> FormRule {
    use FormPolicy::*;
    use Layering::*;
    use NameTokens::*;

    match form {
        1 => FormRule::new(CombinedWithNext(MergedFields::Billing), Property, RecordFirst),
        2 => FormRule::new(DefaultSubstitution, Property, RecordFirst)
            .variant(TemplateVariant::GuarantorCount {
                single: "1",
                multiple: "4",
            })
            .guarantor_table(2),
        3 => FormRule::new(PerGuarantor, Guarantor, RecordFirst),
        4 => FormRule::new(DefaultSubstitution, PropertyAndType, RulesFirst)
            .variant(TemplateVariant::GuarantorCount {
                single: "1",
                multiple: "4",
            })
            .guarantor_table(2),
        5 | 6 => FormRule::new(DefaultSubstitution, PropertyAndType, RecordFirst).guarantor_table(3),
        7..=9 => FormRule::new(Skip, PropertyAndType, RecordFirst),
        10 => FormRule::new(DefaultSubstitution, PropertyAndType, RecordFirst),
        11 => FormRule::new(CombinedWithNext(MergedFields::None), Property, RecordFirst)
            .amount_in_words(),
        12 => FormRule::new(CombinedWithNext(MergedFields::Dates), Property, RecordFirst)
            .amount_in_words(),
        13 | 14 => FormRule::new(DefaultSubstitution, PropertyAndType, RulesFirst),
        15 | 16 => FormRule::new(PerGuarantorGlobal, Guarantor, RecordFirst),
        17 => FormRule::new(
            AggregateOnce(AggregateKind::BillingTotal),
            Customer,
            RecordFirst,
        ),
        18 => FormRule::new(
            AggregateOnce(AggregateKind::PrincipalTotal),
            Customer,
            RecordFirst,
        ),
        19 => FormRule::new(DefaultSubstitution, PropertyAndType, RulesFirst)
            .variant(TemplateVariant::SpecialOwnership)
            .guarantor_table(2)
            .property_list(),
        20 | 21 => FormRule::new(DefaultSubstitution, PropertyAndType, RulesFirst)
            .variant(TemplateVariant::Ownership),
        23 => FormRule::new(DefaultSubstitution, PropertyAndType, RulesFirst)
            .gate(Gate::SeparateOwnershipIn("GA")),
        24 | 25 => FormRule::new(DefaultSubstitution, PropertyAndType, RecordFirst)
            .variant(TemplateVariant::SpecialOwnership)
            .guarantor_table(3),
        26 => FormRule::new(DefaultSubstitution, Property, RecordFirst)
            .variant(TemplateVariant::GuarantorCount {
                single: "1_Chacot",
                multiple: "4_Chacot",
            })
            .guarantor_table(2),
        _ => FormRule::new(DefaultSubstitution, PropertyAndType, RulesFirst),
    }
}
