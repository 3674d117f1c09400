//! Batch orchestration: which documents to produce and from which keywords

pub mod aggregate;
pub mod context;
pub mod orchestrator;
pub mod paths;
pub mod policy;

pub use aggregate::{fill_billing_total, fill_principal_total, BILLING_TOTAL_SHEET};
pub use context::BatchContext;
pub use orchestrator::{GeneratedDocument, GenerationOrchestrator};
pub use paths::{date_token, name_tokens, output_dir, output_file_name};
pub use policy::{
    form_rule, AggregateKind, FormPolicy, FormRule, Gate, Layering, MergedFields, NameTokens,
    TemplateVariant, CUSTOMER_LEVEL_FORMS,
};
