//! Integration tests for batch orchestration
//!
//! Each test builds rule tables and templates in memory, runs a whole batch
//! through the orchestrator and inspects what landed in the store.

use std::path::{Path, PathBuf};

use formsmith_config::AppConfig;
use formsmith_generation::document::Worksheet;
use formsmith_generation::{
    Block, BatchItem, ConfigResolver, Document, GeneratedDocument, GenerationError,
    GenerationOrchestrator, InputTable, MemoryDocumentStore, NoopRenderer, RecordBuilder,
    RenderError, Renderer, Row, RuleTables, Table, Value, WordDocument, Workbook,
};

fn config() -> AppConfig {
    let mut config = AppConfig::default();
    config.paths.template_root = PathBuf::from("/templates");
    config.paths.output_root = PathBuf::from("/out");
    config
}

fn batch(rows: Vec<Vec<&str>>, config: &AppConfig) -> Vec<BatchItem> {
    let table = InputTable::from_text_rows(rows);
    RecordBuilder::from_config(config)
        .build(&table)
        .unwrap()
        .into_iter()
        .map(BatchItem::without_schedule)
        .collect()
}

fn word(paragraphs: &[&str]) -> Document {
    WordDocument::new(paragraphs.iter().map(|p| Block::paragraph(*p)).collect()).into()
}

fn text_at(store: &MemoryDocumentStore, path: &str) -> String {
    match store.get(Path::new(path)) {
        Some(Document::Word(document)) => document.text(),
        other => panic!("expected a word document at {}, got {:?}", path, other),
    }
}

fn run(
    tables: RuleTables,
    store: &MemoryDocumentStore,
    items: &[BatchItem],
) -> Result<Vec<GeneratedDocument>, GenerationError> {
    let config = config();
    let resolver = ConfigResolver::new(tables);
    let orchestrator = GenerationOrchestrator::new(&config, &resolver, store, &NoopRenderer)?;
    orchestrator.generate(items)
}

fn placeholder_pair_rows() -> Vec<Vec<&'static str>> {
    vec![
        vec!["item_type", "70N", "2054"],
        vec!["contract_date", "2024-04-01", ""],
        vec!["customer_name", "Sato", ""],
        vec!["collateral_jurisdiction", "HI", ""],
        vec!["filename_address", "Lot1", "Lot2"],
        vec!["product_name_master", "Loan A", "Loan B"],
        vec!["billing_yen", "100", "200"],
    ]
}

#[test]
fn test_combined_bill_is_attributed_to_second_item() {
    let config = config();
    let items = batch(placeholder_pair_rows(), &config);
    let tables = RuleTables::new()
        .with_template("70N", 1, Some("Bill.docx"))
        .with_template("2054", 1, Some("Bill.docx"));
    let store = MemoryDocumentStore::new();
    store.insert(
        "/templates/Bill.docx",
        word(&[
            "Product 1: §product_name_master1§ §billing_yen1§",
            "Product 2: §product_name_master2§ §billing_yen2§",
            "Customer: §customer_name§",
        ]),
    ).unwrap();

    let generated = run(tables, &store, &items).unwrap();

    assert_eq!(generated.len(), 1);
    let bill = &generated[0];
    assert_eq!(bill.form, 1);
    assert_eq!(bill.position, 1);
    assert_eq!(bill.item_type, "2054");
    assert_eq!(bill.secondary, Some(0));
    let destination = "/out/20240401_Sato/20240401_Sato_Lot2/Bill_20240401_Sato_Lot2.docx";
    assert_eq!(bill.destination, PathBuf::from(destination));
    assert_eq!(
        text_at(&store, destination),
        "Product 1: Loan A 100\nProduct 2: Loan B 200\nCustomer: Sato"
    );
}

#[test]
fn test_missing_merged_field_fails() {
    let config = config();
    let mut rows = placeholder_pair_rows();
    rows.retain(|row| row[0] != "product_name_master");
    let items = batch(rows, &config);
    let tables = RuleTables::new().with_template("2054", 1, Some("Bill.docx"));
    let store = MemoryDocumentStore::new();
    store.insert("/templates/Bill.docx", word(&["§billing_yen1§"])).unwrap();

    let err = run(tables, &store, &items).unwrap_err();
    assert!(err.is_lookup());
    assert!(matches!(err, GenerationError::MissingKeyword(key) if key == "product_name_master"));
}

#[test]
fn test_guarantor_mismatch_writes_nothing() {
    let config = config();
    let items = batch(
        vec![
            vec!["item_type", "70N", "70N"],
            vec!["contract_date", "2024-04-01", ""],
            vec!["customer_name", "Sato", ""],
            vec!["filename_address", "Lot1", "Lot2"],
            vec!["guarantor_name", "A", "B"],
            vec!["guarantor_postal_code", "1", "2"],
            vec!["guarantor_address", "X", "Y"],
        ],
        &config,
    );
    let tables = RuleTables::new().with_template("70N", 10, Some("Memo.docx"));
    let store = MemoryDocumentStore::new();
    store.insert("/templates/Memo.docx", word(&["§customer_name§"])).unwrap();

    let err = run(tables, &store, &items).unwrap_err();
    assert!(matches!(err, GenerationError::Consistency(_)));
    assert!(store.paths_under(Path::new("/out")).is_empty());
}

#[test]
fn test_combined_item_without_placeholder_fails() {
    let config = config();
    let items = batch(
        vec![
            vec!["item_type", "2054"],
            vec!["contract_date", "2024-04-01"],
            vec!["customer_name", "Sato"],
            vec!["filename_address", "Lot1"],
        ],
        &config,
    );
    let err = run(RuleTables::new(), &MemoryDocumentStore::new(), &items).unwrap_err();
    assert!(matches!(err, GenerationError::Consistency(_)));
}

#[test]
fn test_missing_contract_date_fails_before_output() {
    let config = config();
    let items = batch(
        vec![
            vec!["item_type", "70N"],
            vec!["customer_name", "Sato"],
            vec!["filename_address", "Lot1"],
        ],
        &config,
    );
    let tables = RuleTables::new().with_template("70N", 10, Some("Memo.docx"));
    let store = MemoryDocumentStore::new();
    store.insert("/templates/Memo.docx", word(&["memo"])).unwrap();

    let err = run(tables, &store, &items).unwrap_err();
    assert!(matches!(err, GenerationError::MissingKeyword(_)));
    assert!(store.paths_under(Path::new("/out")).is_empty());
}

#[test]
fn test_unmapped_item_type_produces_nothing() {
    let config = config();
    let items = batch(
        vec![
            vec!["item_type", "Unknown"],
            vec!["contract_date", "2024-04-01"],
            vec!["customer_name", "Sato"],
        ],
        &config,
    );
    let generated = run(RuleTables::new(), &MemoryDocumentStore::new(), &items).unwrap();
    assert!(generated.is_empty());
}

#[test]
fn test_declarations_and_guaranties_per_guarantor() {
    let config = config();
    let items = batch(
        vec![
            vec!["item_type", "70N"],
            vec!["contract_date", "2024-04-01"],
            vec!["customer_name", "Sato"],
            vec!["filename_address", "Lot1"],
            vec!["postal_code", "999"],
            vec!["customer_address", "Home"],
            vec!["guarantor_name", "A*B"],
            vec!["guarantor_postal_code", "1*2"],
            vec!["guarantor_address", "X*Y"],
        ],
        &config,
    );
    let tables = RuleTables::new()
        .with_template("70N", 3, Some("Declaration.docx"))
        .with_template("70N", 15, Some("Guaranty.docx"));
    let store = MemoryDocumentStore::new();
    store.insert(
        "/templates/Declaration.docx",
        word(&["§postal_code§ §customer_address§"]),
    ).unwrap();
    store.insert(
        "/templates/Guaranty.docx",
        word(&["§guarantor_name§ / §guarantor_address§"]),
    ).unwrap();

    let generated = run(tables, &store, &items).unwrap();

    let declarations: Vec<&GeneratedDocument> =
        generated.iter().filter(|d| d.form == 3).collect();
    assert_eq!(declarations.len(), 3);
    assert_eq!(
        declarations
            .iter()
            .map(|d| d.guarantor.as_deref())
            .collect::<Vec<_>>(),
        vec![Some("A"), Some("B"), None]
    );
    assert_eq!(
        text_at(&store, "/out/20240401_Sato/Declaration_20240401_Sato_A.docx"),
        "1 X"
    );
    assert_eq!(
        text_at(&store, "/out/20240401_Sato/Declaration_20240401_Sato.docx"),
        "999 Home"
    );

    let guaranties: Vec<&GeneratedDocument> = generated.iter().filter(|d| d.form == 15).collect();
    assert_eq!(guaranties.len(), 2);
    assert_eq!(
        text_at(&store, "/out/20240401_Sato/Guaranty_20240401_Sato_B.docx"),
        "B / Y"
    );
}

#[test]
fn test_corporate_customer_gets_no_own_declaration() {
    let config = config();
    let items = batch(
        vec![
            vec!["item_type", "70N"],
            vec!["contract_date", "2024-04-01"],
            vec!["corporate_name", "Acme"],
            vec!["filename_address", "Lot1"],
        ],
        &config,
    );
    let tables = RuleTables::new().with_template("70N", 3, Some("Declaration.docx"));
    let store = MemoryDocumentStore::new();
    store.insert("/templates/Declaration.docx", word(&["declaration"])).unwrap();

    let generated = run(tables, &store, &items).unwrap();
    assert!(generated.is_empty());
}

fn aggregate_tables() -> RuleTables {
    RuleTables::new()
        .with_template("70N", 17, Some("BillingTotal.xlsx"))
        .with_template("70N", 18, Some("PrincipalTotal.xlsx"))
}

fn aggregate_store() -> MemoryDocumentStore {
    let store = MemoryDocumentStore::new();
    store.insert(
        "/templates/BillingTotal.xlsx",
        Workbook::new(vec![Worksheet::new("billing_total").with_cell(2, 1, "Address")]).into(),
    ).unwrap();
    store.insert(
        "/templates/PrincipalTotal.xlsx",
        Workbook::new(vec![Worksheet::new("Sheet1").with_cell(1, 1, "No.")]).into(),
    ).unwrap();
    store
}

#[test]
fn test_aggregates_cover_billable_items() {
    let config = config();
    let items = batch(
        vec![
            vec!["item_type", "70N", "2054", "70N"],
            vec!["contract_date", "2024-04-01", "", ""],
            vec!["customer_name", "Sato", "", ""],
            vec!["filename_address", "Lot1", "Lot2", "Lot3"],
            vec!["property_address", "Addr1", "Addr2", "Addr3"],
            vec!["total_billing_yen", "100", "200", "300"],
            vec!["principal_yen", "1000", "2000", "3000"],
        ],
        &config,
    );
    let store = aggregate_store();

    let generated = run(aggregate_tables(), &store, &items).unwrap();
    assert_eq!(
        generated.iter().map(|d| d.form).collect::<Vec<_>>(),
        vec![17, 18]
    );

    let billing = match store.get(Path::new(
        "/out/20240401_Sato/BillingTotal_20240401_Sato.xlsx",
    )) {
        Some(Document::Sheet(book)) => book,
        other => panic!("expected a workbook, got {:?}", other),
    };
    let sheet = &billing.sheets[0];
    assert_eq!(sheet.get(1, 1), Some(&Value::from("Sato")));
    assert_eq!(sheet.get(3, 1), Some(&Value::from("Addr2")));
    assert_eq!(sheet.get(4, 2), Some(&Value::Integer(300)));
    assert_eq!(sheet.get(5, 2), Some(&Value::from("=SUM(B3:B4)")));

    let principal = match store.get(Path::new(
        "/out/20240401_Sato/PrincipalTotal_20240401_Sato.xlsx",
    )) {
        Some(Document::Sheet(book)) => book,
        other => panic!("expected a workbook, got {:?}", other),
    };
    let sheet = &principal.sheets[0];
    assert_eq!(sheet.get(4, 1), Some(&Value::Integer(3)));
    assert_eq!(sheet.get(4, 4), Some(&Value::Integer(3000)));
    assert_eq!(sheet.get(5, 4), Some(&Value::from("=SUM(D2:D4)")));
}

#[test]
fn test_single_bill_skips_aggregates() {
    let config = config();
    let items = batch(
        vec![
            vec!["item_type", "70N", "2054"],
            vec!["contract_date", "2024-04-01", ""],
            vec!["customer_name", "Sato", ""],
            vec!["filename_address", "Lot1", "Lot2"],
        ],
        &config,
    );
    let store = aggregate_store();

    let generated = run(aggregate_tables(), &store, &items).unwrap();
    assert!(generated.is_empty());
    assert!(store.paths_under(Path::new("/out")).is_empty());
}

#[test]
fn test_late_failure_writes_nothing() {
    let config = config();
    let items = batch(
        vec![
            vec!["item_type", "70N", "70N"],
            vec!["contract_date", "2024-04-01", ""],
            vec!["customer_name", "Sato", ""],
            vec!["filename_address", "Lot1", "Lot2"],
            vec!["total_billing_yen", "100", "200"],
        ],
        &config,
    );
    let tables = aggregate_tables().with_template("70N", 10, Some("Memo.docx"));
    let store = aggregate_store();
    store.insert("/templates/Memo.docx", word(&["§customer_name§"])).unwrap();

    let err = run(tables, &store, &items).unwrap_err();
    assert!(matches!(err, GenerationError::MissingKeyword(ref key) if key == "property_address"));
    assert!(store.paths_under(Path::new("/out")).is_empty());
}

#[test]
fn test_keyword_layering_per_form() {
    let config = config();
    let items = batch(
        vec![
            vec!["item_type", "70N"],
            vec!["contract_date", "2024-04-01"],
            vec!["customer_name", "Sato"],
            vec!["collateral_jurisdiction", "HI"],
            vec!["filename_address", "Lot1"],
            vec!["lender", "Record Bank"],
        ],
        &config,
    );
    let tables = RuleTables::new()
        .with_template("70N", 10, Some("Memo.docx"))
        .with_template("70N", 13, Some("Note.docx"))
        .with_global_keyword("lender", "Rule Bank")
        .with_jurisdiction_keyword(13, "HI", "rate", "5%")
        .with_item_type_keyword("70N", 13, "rate", "4%");
    let store = MemoryDocumentStore::new();
    store.insert("/templates/Memo.docx", word(&["§lender§"])).unwrap();
    store.insert("/templates/Note_HI.docx", word(&["§lender§ §rate§"])).unwrap();

    let generated = run(tables, &store, &items).unwrap();
    assert_eq!(generated.len(), 2);

    let dir = "/out/20240401_Sato/20240401_Sato_Lot1";
    // Record keywords win on form 10, rule keywords on form 13
    assert_eq!(
        text_at(&store, &format!("{}/Memo_20240401_Sato_Lot1_70N.docx", dir)),
        "Record Bank"
    );
    assert_eq!(
        text_at(&store, &format!("{}/Note_HI_20240401_Sato_Lot1_70N.docx", dir)),
        "Rule Bank 4%"
    );
}

#[test]
fn test_guarantor_table_and_count_variant() {
    let config = config();
    let items = batch(
        vec![
            vec!["item_type", "70N"],
            vec!["contract_date", "2024-04-01"],
            vec!["customer_name", "Sato"],
            vec!["filename_address", "Lot1"],
            vec!["guarantor_name", "A"],
            vec!["guarantor_postal_code", "1"],
            vec!["guarantor_address", "X"],
        ],
        &config,
    );
    let tables = RuleTables::new().with_template("70N", 2, Some("Request.docx"));
    let store = MemoryDocumentStore::new();
    let table = Table::new((0..8).map(|_| Row::new(["§guarantor_address§"])).collect());
    store.insert(
        "/templates/Request1.docx",
        WordDocument::new(vec![Block::Table(table), Block::paragraph("§customer_name§")]).into(),
    ).unwrap();

    let generated = run(tables, &store, &items).unwrap();
    assert_eq!(generated.len(), 1);
    assert_eq!(generated[0].source, PathBuf::from("/templates/Request1.docx"));

    let path = "/out/20240401_Sato/20240401_Sato_Lot1/Request_20240401_Sato_Lot1.docx";
    let document = match store.get(Path::new(path)) {
        Some(Document::Word(document)) => document,
        other => panic!("expected a word document, got {:?}", other),
    };
    let table = document.tables().next().unwrap();
    assert_eq!(table.rows.len(), 4);
    assert_eq!(table.rows[0].cells[0].text(), "X");
    assert_eq!(table.rows[1].cells[0].text(), "");
}

#[test]
fn test_amount_in_words_on_deed() {
    let config = config();
    let items = batch(
        vec![
            vec!["item_type", "Corporate50"],
            vec!["contract_date", "2024-04-01"],
            vec!["corporate_name", "Acme"],
            vec!["collateral_jurisdiction", "HI"],
            vec!["filename_address", "Lot1"],
            vec!["principal_in_words", "123456"],
        ],
        &config,
    );
    let tables = RuleTables::new().with_template("Corporate50", 11, Some("Deed(Template).docx"));
    let store = MemoryDocumentStore::new();
    store.insert(
        "/templates/Deed(Template)_HI.docx",
        word(&["§principal_in_words§"]),
    ).unwrap();

    run(tables, &store, &items).unwrap();
    assert_eq!(
        text_at(
            &store,
            "/out/20240401_Acme/20240401_Acme_Lot1/Deed(Template)_HI_20240401_Acme_Lot1.docx"
        ),
        "One Hundred Twenty Three Thousand Four Hundred Fifty Six"
    );
}

#[test]
fn test_property_list_for_special_item() {
    let config = config();
    let items = batch(
        vec![
            vec!["item_type", "70N", "70N", "Chacot70"],
            vec!["contract_date", "2024-04-01", "", ""],
            vec!["customer_name", "Sato", "", ""],
            vec!["collateral_jurisdiction", "HI", "", ""],
            vec!["filename_address", "Lot1", "Lot2", "Lot3"],
            vec!["property_address", "Addr1", "Addr2", "Addr3"],
        ],
        &config,
    );
    let tables = RuleTables::new().with_template("Chacot70", 19, Some("LoanContract.docx"));
    let store = MemoryDocumentStore::new();
    store.insert(
        "/templates/LoanContractChacot.docx",
        WordDocument::new(vec![
            Block::Table(Table::new(vec![Row::new([
                "No. §property_number§: §property_address§",
            ])])),
            Block::paragraph("Own: §property_number§ §property_address§"),
        ])
        .into(),
    ).unwrap();

    let generated = run(tables, &store, &items).unwrap();
    assert_eq!(generated.len(), 1);
    assert_eq!(generated[0].position, 2);

    let path =
        "/out/20240401_Sato/20240401_Sato_Lot3/LoanContract_20240401_Sato_Lot3_Chacot70.docx";
    assert_eq!(
        text_at(&store, path),
        "No. 1: Addr1\nNo. 2: Addr2\nOwn: 3 Addr3"
    );
}

struct FailingRenderer;

impl Renderer for FailingRenderer {
    fn render(&self, path: &Path) -> Result<PathBuf, RenderError> {
        Err(RenderError::Failed {
            path: path.to_path_buf(),
            message: "converter missing".to_string(),
        })
    }
}

#[test]
fn test_render_failure_does_not_abort() {
    let config = config();
    let items = batch(placeholder_pair_rows(), &config);
    let resolver = ConfigResolver::new(RuleTables::new().with_template("2054", 1, Some("Bill.docx")));
    let store = MemoryDocumentStore::new();
    store.insert("/templates/Bill.docx", word(&["§billing_yen2§"])).unwrap();

    let orchestrator =
        GenerationOrchestrator::new(&config, &resolver, &store, &FailingRenderer).unwrap();
    let generated = orchestrator.generate(&items).unwrap();

    assert_eq!(generated.len(), 1);
    assert_eq!(generated[0].rendered, None);
    assert_eq!(store.paths_under(Path::new("/out")).len(), 1);
}

#[test]
fn test_missing_template_aborts() {
    let config = config();
    let items = batch(
        vec![
            vec!["item_type", "70N"],
            vec!["contract_date", "2024-04-01"],
            vec!["customer_name", "Sato"],
            vec!["filename_address", "Lot1"],
        ],
        &config,
    );
    let tables = RuleTables::new()
        .with_template("70N", 10, Some("Memo.docx"))
        .with_template("70N", 13, None);
    let err = run(tables, &MemoryDocumentStore::new(), &items).unwrap_err();
    assert!(matches!(err, GenerationError::Store { .. }));
    assert!(!err.is_lookup());
}
