//! Generation orchestrator
//!
//! Runs the batch pre-scan, a single forward pass over the items with one
//! item of lookahead, then the whole-batch documents of the first item.

use std::path::{Path, PathBuf};

use formsmith_config::AppConfig;
use tracing::{debug, info, warn};

use crate::amount_words::amount_in_words;
use crate::document::{Document, DocumentStore, Renderer, Workbook};
use crate::error::{GenerationError, Result};
use crate::keywords::{KeywordLayers, KeywordMap, KeywordSource};
use crate::models::{BatchItem, ItemRecord, Value};
use crate::orchestration::aggregate::{fill_billing_total, fill_principal_total};
use crate::orchestration::context::BatchContext;
use crate::orchestration::paths::{name_tokens, output_dir, output_file_name};
use crate::orchestration::policy::{
    form_rule, AggregateKind, FormPolicy, FormRule, Gate, Layering, MergedFields, TemplateVariant,
};
use crate::rules::{insert_before_extension, ConfigResolver, FormNumber};
use crate::templates::SubstitutionEngine;

/// One document written by a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedDocument {
    /// Form number
    pub form: FormNumber,
    /// Position of the item the document is attributed to
    pub position: usize,
    /// Item type of that item
    pub item_type: String,
    /// Position of the item merged into this document, if any
    pub secondary: Option<usize>,
    /// Guarantor the document was written for, if any
    pub guarantor: Option<String>,
    /// Template path
    pub source: PathBuf,
    /// Output path
    pub destination: PathBuf,
    /// Printable artifact, when rendering succeeded
    pub rendered: Option<PathBuf>,
}

/// A filled document waiting to be written
struct Pending {
    generated: GeneratedDocument,
    document: Document,
}

struct Output<'a> {
    form: FormNumber,
    position: usize,
    record: &'a ItemRecord,
    secondary: Option<usize>,
    guarantor: Option<String>,
    source: PathBuf,
    destination: PathBuf,
}

/// Produces every document of a batch
pub struct GenerationOrchestrator<'a, S: DocumentStore, R: Renderer> {
    config: &'a AppConfig,
    resolver: &'a ConfigResolver,
    engine: SubstitutionEngine,
    store: &'a S,
    renderer: &'a R,
}

impl<'a, S: DocumentStore, R: Renderer> GenerationOrchestrator<'a, S, R> {
    /// Create an orchestrator using the host's placeholder syntax
    pub fn new(
        config: &'a AppConfig,
        resolver: &'a ConfigResolver,
        store: &'a S,
        renderer: &'a R,
    ) -> Result<Self> {
        Ok(Self {
            config,
            resolver,
            engine: SubstitutionEngine::from_config(&config.business)?,
            store,
            renderer,
        })
    }

    /// Replace the substitution engine
    pub fn with_engine(mut self, engine: SubstitutionEngine) -> Self {
        self.engine = engine;
        self
    }

    /// Generate every document for the batch.
    ///
    /// All cross-item checks run before any document is filled, and every
    /// document is filled before the first one is written. A failing run
    /// leaves the store untouched.
    pub fn generate(&self, items: &[BatchItem]) -> Result<Vec<GeneratedDocument>> {
        let context = BatchContext::scan(items, self.config)?;
        let mut pending = Vec::new();

        for (position, item) in items.iter().enumerate() {
            let forms = self.resolver.applicable_forms_for(item.record.item_type());
            for form in forms.keys().copied() {
                let rule = form_rule(form);
                if let Some(document) = self.generate_item_form(items, position, form, &rule, &context)? {
                    pending.push(document);
                }
            }
        }

        let first = &items[0];
        let batch_forms = self.resolver.applicable_forms_for(first.record.item_type());
        let batch_rules: Vec<(FormNumber, FormRule)> = batch_forms
            .keys()
            .map(|&form| (form, form_rule(form)))
            .filter(|(_, rule)| rule.is_customer_level())
            .collect();

        for (form, rule) in &batch_rules {
            if let FormPolicy::AggregateOnce(kind) = rule.policy {
                if context.billable_count() < 2 {
                    debug!("Skipping form {}: {} billable items", form, context.billable_count());
                    continue;
                }
                pending.push(self.generate_aggregate(items, *form, rule, kind, &context)?);
            }
        }
        for (form, rule) in &batch_rules {
            match rule.policy {
                FormPolicy::PerGuarantor => {
                    pending.extend(self.generate_declarations(first, *form, rule)?);
                }
                FormPolicy::PerGuarantorGlobal => {
                    pending.extend(self.generate_guaranties(first, *form, rule, &context)?);
                }
                _ => {}
            }
        }

        let generated = self.commit(pending)?;
        info!("Generated {} documents for {} items", generated.len(), items.len());
        Ok(generated)
    }

    /// Write every filled document, then render it
    fn commit(&self, pending: Vec<Pending>) -> Result<Vec<GeneratedDocument>> {
        let mut generated = Vec::with_capacity(pending.len());
        for Pending {
            generated: mut entry,
            document,
        } in pending
        {
            self.store.save(&entry.destination, &document)?;
            info!("{} -> {}", entry.source.display(), entry.destination.display());
            entry.rendered = match self.renderer.render(&entry.destination) {
                Ok(path) => Some(path),
                Err(e) => {
                    warn!("{}", e);
                    None
                }
            };
            generated.push(entry);
        }
        Ok(generated)
    }

    fn layers<'k>(
        layering: Layering,
        overlay: &'k KeywordMap,
        rules: &'k KeywordMap,
        item: &'k BatchItem,
    ) -> KeywordLayers<'k> {
        let layers = KeywordLayers::new().with(overlay);
        match layering {
            Layering::RecordFirst => layers.with(&item.schedule).with(&item.record).with(rules),
            Layering::RulesFirst => layers.with(rules).with(&item.schedule).with(&item.record),
        }
    }

    fn rules_for(&self, record: &ItemRecord, form: FormNumber) -> KeywordMap {
        self.resolver
            .resolve_keywords(record.item_type(), form, record.jurisdiction())
    }

    fn is_separate_ownership(&self, record: &ItemRecord) -> bool {
        record.ownership_category() == Some(self.config.schema.separate_ownership_value.as_str())
    }

    fn variant_file_name(&self, template_file: &str, record: &ItemRecord, rule: &FormRule) -> String {
        match rule.variant {
            TemplateVariant::None => template_file.to_string(),
            TemplateVariant::GuarantorCount { single, multiple } => {
                let token = if record.guarantors().len() <= 1 {
                    single
                } else {
                    multiple
                };
                insert_before_extension(template_file, token)
            }
            TemplateVariant::SpecialOwnership => {
                let name = insert_before_extension(
                    template_file,
                    &self.config.business.special_item_marker,
                );
                self.ownership_variant(&name, record)
            }
            TemplateVariant::Ownership => self.ownership_variant(template_file, record),
        }
    }

    fn ownership_variant(&self, file_name: &str, record: &ItemRecord) -> String {
        if self.is_separate_ownership(record) {
            insert_before_extension(file_name, &self.config.schema.separate_ownership_value)
        } else {
            file_name.to_string()
        }
    }

    fn gate_allows(&self, record: &ItemRecord, gate: Gate) -> bool {
        match gate {
            Gate::Always => true,
            Gate::SeparateOwnershipIn(jurisdiction) => {
                self.is_separate_ownership(record) && record.jurisdiction() == jurisdiction
            }
        }
    }

    fn generate_item_form(
        &self,
        items: &[BatchItem],
        position: usize,
        form: FormNumber,
        rule: &FormRule,
        context: &BatchContext,
    ) -> Result<Option<Pending>> {
        let item = &items[position];
        let record = &item.record;
        let business = &self.config.business;

        let (merged, predecessor) = match rule.policy {
            FormPolicy::CombinedWithNext(merged) => {
                if context.is_suppressed(position) {
                    debug!(
                        "Form {} of item {} is produced with the next item",
                        form,
                        position + 1
                    );
                    return Ok(None);
                }
                let predecessor = if business.is_combined(record.item_type()) {
                    position.checked_sub(1)
                } else {
                    None
                };
                (merged, predecessor)
            }
            FormPolicy::DefaultSubstitution => (MergedFields::None, None),
            _ => return Ok(None),
        };
        if !self.gate_allows(record, rule.gate) {
            debug!("Form {} does not apply to item {}", form, position + 1);
            return Ok(None);
        }

        let template_file = self.resolver.specialized_template_file_name(record, form)?;
        let source = self
            .config
            .paths
            .template_root
            .join(self.variant_file_name(&template_file, record, rule));
        let tokens = name_tokens(record, rule.naming, None, &self.config.schema)?;
        let destination = output_dir(&self.config.paths.output_root, record, rule, &self.config.schema)?
            .join(output_file_name(&template_file, &tokens));

        let mut document = self.store.load(&source)?;
        let rules = self.rules_for(record, form);
        let mut overlay = KeywordMap::new();

        if let Some(previous) = predecessor {
            let prev_item = &items[previous];
            let prev_rules = self.rules_for(&prev_item.record, form);
            let prev_overlay = KeywordMap::new();
            let prev_layers = Self::layers(rule.layering, &prev_overlay, &prev_rules, prev_item);
            let own_overlay = KeywordMap::new();
            let own_layers = Self::layers(rule.layering, &own_overlay, &rules, item);
            for key in merged.keys(&self.config.schema) {
                for (suffix, layers) in [("1", &prev_layers), ("2", &own_layers)] {
                    let value = layers
                        .lookup(key)
                        .cloned()
                        .ok_or_else(|| GenerationError::MissingKeyword(key.to_string()))?;
                    overlay.insert(format!("{}{}", key, suffix), value);
                }
            }
        }

        if rule.amount_in_words {
            self.add_amount_in_words(record, &mut overlay);
        }

        if let Some(row_height) = rule.guarantor_table {
            if let Document::Word(word) = &mut document {
                let placeholder = self
                    .engine
                    .syntax()
                    .placeholder(&self.config.schema.guarantor_address);
                let addresses: Vec<String> =
                    record.guarantors().iter().map(|g| g.address.clone()).collect();
                if !word.fill_repeating_table(&placeholder, &addresses, row_height) {
                    debug!("{} has no guarantor address table", source.display());
                }
            }
        }

        if rule.property_list {
            let filled = self.fill_property_list(&mut document, items, form, &rules, context, &source)?;
            overlay.insert(
                self.config.schema.property_number.clone(),
                Value::Integer(filled as i64 + 1),
            );
        }

        let layers = Self::layers(rule.layering, &overlay, &rules, item);
        self.fill(
            Output {
                form,
                position,
                record,
                secondary: predecessor,
                guarantor: None,
                source,
                destination,
            },
            document,
            &layers,
        )
        .map(Some)
    }

    fn add_amount_in_words(&self, record: &ItemRecord, overlay: &mut KeywordMap) {
        let business = &self.config.business;
        if record.item_type() != business.amount_in_words_item_type
            || record.jurisdiction() != business.amount_in_words_jurisdiction
        {
            return;
        }
        let key = &self.config.schema.principal_in_words;
        if let Some(words) = record.get(key).and_then(amount_in_words) {
            overlay.insert(key.clone(), Value::Text(words));
        }
    }

    /// Fill one copy of the property table per item preceding the special item.
    /// Returns the number of filled copies.
    fn fill_property_list(
        &self,
        document: &mut Document,
        items: &[BatchItem],
        form: FormNumber,
        rules: &KeywordMap,
        context: &BatchContext,
        source: &Path,
    ) -> Result<usize> {
        let Some(word) = document.as_word_mut() else {
            return Ok(0);
        };
        let preceding = match context.single_special_position() {
            Some(special) if special >= 1 => special,
            _ => return Ok(0),
        };
        let placeholder = self
            .engine
            .syntax()
            .placeholder(&self.config.schema.property_number);
        let Some(first_table) = word.find_table(&placeholder) else {
            debug!("{} has no property table", source.display());
            return Ok(0);
        };

        word.duplicate_table(first_table, preceding - 1);
        let origin = source.display().to_string();
        for (k, item) in items.iter().take(preceding).enumerate() {
            let mut overlay = KeywordMap::new();
            overlay.insert(
                self.config.schema.property_number.clone(),
                Value::Integer(k as i64 + 1),
            );
            let layers = Self::layers(Layering::RulesFirst, &overlay, rules, item);
            if let Some(table) = word.table_mut(first_table + k) {
                table.visit_text_mut(&mut |text: &mut String| -> Result<()> {
                    if self.engine.syntax().contains(text) {
                        *text = self.engine.substitute(text, &layers, &origin)?;
                    }
                    Ok(())
                })?;
            }
        }
        debug!("Form {}: listed {} preceding properties", form, preceding);
        Ok(preceding)
    }

    fn generate_aggregate(
        &self,
        items: &[BatchItem],
        form: FormNumber,
        rule: &FormRule,
        kind: AggregateKind,
        context: &BatchContext,
    ) -> Result<Pending> {
        let first = &items[0];
        let record = &first.record;
        let schema = &self.config.schema;

        let template_file = self.resolver.specialized_template_file_name(record, form)?;
        let source = self.config.paths.template_root.join(&template_file);
        let tokens = name_tokens(record, rule.naming, None, schema)?;
        let destination = output_dir(&self.config.paths.output_root, record, rule, schema)?
            .join(output_file_name(&template_file, &tokens));

        let mut document = self.store.load(&source)?;
        let book: &mut Workbook = document.as_sheet_mut().ok_or_else(|| {
            GenerationError::Validation(format!("{} is not a workbook", source.display()))
        })?;
        match kind {
            AggregateKind::BillingTotal => {
                let customer = record
                    .customer_name()
                    .ok_or_else(|| GenerationError::MissingKeyword(schema.customer_name.clone()))?;
                let billable: Vec<&ItemRecord> = context
                    .billable_positions()
                    .iter()
                    .map(|&i| &items[i].record)
                    .collect();
                fill_billing_total(book, customer, &billable, schema)?;
            }
            AggregateKind::PrincipalTotal => {
                let all: Vec<&ItemRecord> = items.iter().map(|item| &item.record).collect();
                fill_principal_total(book, &all, schema)?;
            }
        }

        let overlay = KeywordMap::new();
        let rules = self.rules_for(record, form);
        let layers = Self::layers(rule.layering, &overlay, &rules, first);
        self.fill(
            Output {
                form,
                position: 0,
                record,
                secondary: None,
                guarantor: None,
                source,
                destination,
            },
            document,
            &layers,
        )
    }

    fn generate_declarations(
        &self,
        first: &BatchItem,
        form: FormNumber,
        rule: &FormRule,
    ) -> Result<Vec<Pending>> {
        let record = &first.record;
        let schema = &self.config.schema;
        let mut pending = Vec::new();

        let mut overlays: Vec<(Option<String>, KeywordMap)> = record
            .guarantors()
            .iter()
            .map(|g| {
                let mut overlay = KeywordMap::new();
                overlay.insert(schema.postal_code.clone(), Value::from(g.postal_code.as_str()));
                overlay.insert(schema.customer_address.clone(), Value::from(g.address.as_str()));
                (Some(g.name.clone()), overlay)
            })
            .collect();
        if record.is_individual() {
            overlays.push((None, KeywordMap::new()));
        }
        if overlays.is_empty() {
            return Ok(pending);
        }

        let template_file = self.resolver.specialized_template_file_name(record, form)?;
        let source = self.config.paths.template_root.join(&template_file);
        let dir = output_dir(&self.config.paths.output_root, record, rule, schema)?;
        let rules = self.rules_for(record, form);

        for (guarantor, overlay) in overlays {
            let tokens = name_tokens(record, rule.naming, guarantor.as_deref(), schema)?;
            let document = self.store.load(&source)?;
            let layers = Self::layers(rule.layering, &overlay, &rules, first);
            pending.push(self.fill(
                Output {
                    form,
                    position: 0,
                    record,
                    secondary: None,
                    guarantor,
                    source: source.clone(),
                    destination: dir.join(output_file_name(&template_file, &tokens)),
                },
                document,
                &layers,
            )?);
        }
        Ok(pending)
    }

    fn generate_guaranties(
        &self,
        first: &BatchItem,
        form: FormNumber,
        rule: &FormRule,
        context: &BatchContext,
    ) -> Result<Vec<Pending>> {
        let record = &first.record;
        let schema = &self.config.schema;
        let mut pending = Vec::new();
        if context.guarantors().is_empty() {
            return Ok(pending);
        }

        let template_file = self.resolver.specialized_template_file_name(record, form)?;
        let source = self.config.paths.template_root.join(&template_file);
        let dir = output_dir(&self.config.paths.output_root, record, rule, schema)?;
        let rules = self.rules_for(record, form);

        for guarantor in context.guarantors() {
            let mut overlay = KeywordMap::new();
            overlay.insert(schema.guarantor_name.clone(), Value::from(guarantor.name.as_str()));
            overlay.insert(
                schema.guarantor_address.clone(),
                Value::from(guarantor.address.as_str()),
            );
            let tokens = name_tokens(record, rule.naming, Some(&guarantor.name), schema)?;
            let document = self.store.load(&source)?;
            let layers = Self::layers(rule.layering, &overlay, &rules, first);
            pending.push(self.fill(
                Output {
                    form,
                    position: 0,
                    record,
                    secondary: None,
                    guarantor: Some(guarantor.name.clone()),
                    source: source.clone(),
                    destination: dir.join(output_file_name(&template_file, &tokens)),
                },
                document,
                &layers,
            )?);
        }
        Ok(pending)
    }

    fn fill(
        &self,
        output: Output<'_>,
        mut document: Document,
        keywords: &dyn KeywordSource,
    ) -> Result<Pending> {
        let origin = output.source.display().to_string();
        self.engine
            .substitute_document(&mut document, keywords, &origin)?;
        debug!("Filled {} for {}", origin, output.destination.display());

        Ok(Pending {
            generated: GeneratedDocument {
                form: output.form,
                position: output.position,
                item_type: output.record.item_type().to_string(),
                secondary: output.secondary,
                guarantor: output.guarantor,
                source: output.source,
                destination: output.destination,
                rendered: None,
            },
            document,
        })
    }
}
