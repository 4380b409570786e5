//! Integration tests for deriving filtered ontologies.

use ontomap::metadata::{RawColumnRow, RawDatabaseRecord, RawForeignKeyRow, RawTableRow};
use ontomap::model::{Ontology, TableKind};
use ontomap::ontology::{build, filter, CountRange, OntologyFilter};

/// `inventory` has five tables, two of them above 1000 rows; `reporting`
/// has three, one of which references inventory.
fn ontology() -> Ontology {
    let inventory = RawDatabaseRecord::new("inventory", "db1", 3306)
        .with_table(RawTableRow::base_table("products").with_rows(25_000))
        .with_table(RawTableRow::base_table("stock_moves").with_rows(1_200))
        .with_table(RawTableRow::base_table("suppliers").with_rows(80))
        .with_table(RawTableRow::base_table("bins").with_rows(999))
        .with_table(RawTableRow::new("low_stock", "VIEW"))
        .with_column(RawColumnRow::new("products", "id", 1, "int").primary_key(1))
        .with_column(RawColumnRow::new("products", "supplier_id", 2, "int"))
        .with_column(RawColumnRow::new("products", "name", 3, "varchar"))
        .with_column(RawColumnRow::new("stock_moves", "id", 1, "int").primary_key(1))
        .with_column(RawColumnRow::new("stock_moves", "product_id", 2, "int"))
        .with_column(RawColumnRow::new("suppliers", "id", 1, "int").primary_key(1))
        .with_column(RawColumnRow::new("bins", "id", 1, "int").primary_key(1))
        .with_column(RawColumnRow::new("low_stock", "product_id", 1, "int"))
        .with_foreign_key(RawForeignKeyRow::new(
            "products",
            "fk_products_supplier",
            "supplier_id",
            "inventory",
            "suppliers",
            "id",
        ))
        .with_foreign_key(RawForeignKeyRow::new(
            "stock_moves",
            "fk_moves_product",
            "product_id",
            "inventory",
            "products",
            "id",
        ));

    let reporting = RawDatabaseRecord::new("reporting", "db2", 3306)
        .with_table(RawTableRow::base_table("daily_sales").with_rows(5_000))
        .with_table(RawTableRow::base_table("dashboards").with_rows(12))
        .with_table(RawTableRow::base_table("exports"))
        .with_column(RawColumnRow::new("daily_sales", "id", 1, "int").primary_key(1))
        .with_column(RawColumnRow::new("daily_sales", "product_id", 2, "int"))
        .with_column(RawColumnRow::new("dashboards", "id", 1, "int").primary_key(1))
        .with_column(RawColumnRow::new("exports", "id", 1, "int").primary_key(1))
        .with_foreign_key(RawForeignKeyRow::new(
            "daily_sales",
            "fk_sales_product",
            "product_id",
            "inventory",
            "products",
            "id",
        ));

    build(&[inventory, reporting]).unwrap()
}

fn table_names(ontology: &Ontology, database: &str) -> Vec<String> {
    ontology
        .database(database)
        .map(|db| db.tables.iter().map(|t| t.name.clone()).collect())
        .unwrap_or_default()
}

#[test]
fn test_database_and_row_count_filter() {
    let ontology = ontology();
    let criteria = OntologyFilter::new()
        .with_database("inventory")
        .with_row_count(CountRange::at_least(1000));

    let filtered = filter(&ontology, &criteria);

    assert_eq!(filtered.databases.len(), 1);
    assert_eq!(table_names(&filtered, "inventory"), vec!["products", "stock_moves"]);

    // stock_moves -> products survives; the other edges lost an endpoint
    assert_eq!(filtered.relationships.len(), 1);
    assert_eq!(filtered.relationships[0].constraint_name, "fk_moves_product");
    assert!(filtered.dangling_relationships().is_empty());

    assert_eq!(filtered.metadata.database_count, 1);
    assert_eq!(filtered.metadata.table_count, 2);
    assert_eq!(filtered.metadata.relationship_count, 1);
    assert_eq!(filtered.metadata.extraction_date, ontology.metadata.extraction_date);
}

#[test]
fn test_filter_leaves_input_untouched() {
    let ontology = ontology();
    let before = ontology.clone();

    let _ = OntologyFilter::new().with_database("reporting").apply(&ontology);

    assert_eq!(ontology, before);
}

#[test]
fn test_unknown_row_count_counts_as_zero() {
    let ontology = ontology();

    let small = filter(&ontology, &OntologyFilter::new().with_row_count(CountRange::at_most(0)));
    assert_eq!(table_names(&small, "inventory"), vec!["low_stock"]);
    assert_eq!(table_names(&small, "reporting"), vec!["exports"]);

    let any = filter(&ontology, &OntologyFilter::new().with_row_count(CountRange::at_least(1)));
    assert!(!table_names(&any, "reporting").contains(&"exports".to_string()));
}

#[test]
fn test_relationship_participation() {
    let ontology = ontology();

    let connected = filter(&ontology, &OntologyFilter::new().with_relationships(true));
    assert_eq!(
        table_names(&connected, "inventory"),
        vec!["products", "stock_moves", "suppliers"]
    );
    assert_eq!(table_names(&connected, "reporting"), vec!["daily_sales"]);
    assert_eq!(connected.relationships.len(), 3);

    let isolated = filter(&ontology, &OntologyFilter::new().with_relationships(false));
    assert_eq!(table_names(&isolated, "inventory"), vec!["bins", "low_stock"]);
    assert_eq!(table_names(&isolated, "reporting"), vec!["dashboards", "exports"]);
    assert!(isolated.relationships.is_empty());
}

#[test]
fn test_kind_and_column_count() {
    let ontology = ontology();

    let views = filter(&ontology, &OntologyFilter::new().with_table_kind(TableKind::View));
    assert_eq!(views.databases.len(), 1);
    assert_eq!(table_names(&views, "inventory"), vec!["low_stock"]);

    let wide = filter(
        &ontology,
        &OntologyFilter::new().with_column_count(CountRange::at_least(3)),
    );
    assert_eq!(table_names(&wide, "inventory"), vec!["products"]);
    assert!(wide.database("reporting").is_none());
}

#[test]
fn test_empty_filter_keeps_everything() {
    let ontology = ontology();
    let criteria = OntologyFilter::new();

    assert!(criteria.is_empty());
    assert_eq!(filter(&ontology, &criteria), ontology);
}

#[test]
fn test_filter_from_partial_json() {
    let criteria: OntologyFilter = serde_json::from_str(
        r#"{"databases": ["reporting"], "row_count": {"min": 10, "max": 100}}"#,
    )
    .unwrap();

    assert_eq!(
        criteria,
        OntologyFilter::new()
            .with_database("reporting")
            .with_row_count(CountRange::new(Some(10), Some(100)))
    );

    let filtered = criteria.apply(&ontology());
    assert_eq!(table_names(&filtered, "reporting"), vec!["dashboards"]);
}
