//! Integration tests for building an ontology from raw catalog records.

use chrono::{TimeZone, Utc};

use ontomap::metadata::{RawColumnRow, RawDatabaseRecord, RawForeignKeyRow, RawTableRow};
use ontomap::model::{Ontology, TableRef};
use ontomap::ontology::{BuildError, OntologyBuilder, UnresolvedReason};

fn builder() -> OntologyBuilder {
    OntologyBuilder::new().extracted_at(Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap())
}

/// billing.invoices references crm.clients, which references a table
/// that was never extracted.
fn records() -> Vec<RawDatabaseRecord> {
    let billing = RawDatabaseRecord::new("billing", "db1", 3306)
        .with_table(RawTableRow::base_table("invoices").with_rows(900))
        .with_column(RawColumnRow::new("invoices", "id", 1, "bigint").primary_key(1))
        .with_column(RawColumnRow::new("invoices", "client_id", 2, "int").not_null())
        .with_foreign_key(RawForeignKeyRow::new(
            "invoices",
            "fk_invoice_client",
            "client_id",
            "crm",
            "clients",
            "id",
        ));

    let crm = RawDatabaseRecord::new("crm", "db2", 3307)
        .with_table(RawTableRow::base_table("clients").with_rows(50))
        .with_column(RawColumnRow::new("clients", "id", 1, "int").primary_key(1))
        .with_column(RawColumnRow::new("clients", "region_id", 2, "int"))
        .with_column(RawColumnRow::new("clients", "owner_id", 3, "int"))
        .with_foreign_key(RawForeignKeyRow::new(
            "clients",
            "fk_client_region",
            "region_id",
            "crm",
            "regions",
            "id",
        ))
        .with_foreign_key(RawForeignKeyRow::new(
            "clients",
            "fk_client_owner",
            "owner_id",
            "crm",
            "clients",
            "missing_column",
        ));

    vec![billing, crm]
}

fn assert_no_dangling(ontology: &Ontology) {
    for rel in &ontology.relationships {
        assert!(
            ontology
                .table(&rel.source_database, &rel.source_table)
                .is_some_and(|t| t.has_column(&rel.source_column)),
            "dangling source: {:?}",
            rel
        );
        assert!(
            ontology
                .table(&rel.target_database, &rel.target_table)
                .is_some_and(|t| t.has_column(&rel.target_column)),
            "dangling target: {:?}",
            rel
        );
    }
    assert!(ontology.dangling_relationships().is_empty());
}

#[test]
fn test_every_relationship_has_both_endpoints() {
    let ontology = builder().build(&records()).unwrap();

    assert_no_dangling(&ontology);
    assert_eq!(ontology.relationships.len(), 1);
    assert_eq!(
        ontology.relationships[0].source(),
        TableRef::new("billing", "invoices")
    );
    assert_eq!(
        ontology.relationships[0].target(),
        TableRef::new("crm", "clients")
    );
}

#[test]
fn test_unresolvable_foreign_keys_are_reported_not_fatal() {
    let (ontology, report) = builder().build_with_report(&records()).unwrap();

    let reasons: Vec<_> = report
        .unresolved
        .iter()
        .map(|fk| (fk.constraint_name.as_str(), fk.reason))
        .collect();
    assert_eq!(
        reasons,
        vec![
            ("fk_client_owner", UnresolvedReason::UnknownColumn),
            ("fk_client_region", UnresolvedReason::UnknownTable),
        ]
    );
    assert!(!report.is_clean());
    assert_eq!(ontology.metadata.unresolved_foreign_keys, 2);

    // The constraints stay on the table even without a relationship
    let clients = ontology.table("crm", "clients").unwrap();
    assert_eq!(clients.foreign_keys.len(), 2);
}

#[test]
fn test_build_is_deterministic() {
    let first = builder().build(&records()).unwrap();
    let second = builder().build(&records()).unwrap();

    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

#[test]
fn test_metadata_counts() {
    let ontology = builder().build(&records()).unwrap();
    let metadata = &ontology.metadata;

    assert_eq!(metadata.database_count, 2);
    assert_eq!(metadata.table_count, 2);
    assert_eq!(metadata.column_count, 5);
    assert_eq!(metadata.relationship_count, 1);
    assert_eq!(
        metadata.extraction_date,
        Some(Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap())
    );
}

#[test]
fn test_duplicate_database_names_are_rejected() {
    let mut input = records();
    input.push(RawDatabaseRecord::new("crm", "db3", 3306));

    let err = builder().build(&input).unwrap_err();
    assert!(matches!(err, BuildError::DuplicateDatabase { ref name, .. } if name == "crm"));
}

#[test]
fn test_empty_input_builds_empty_ontology() {
    let ontology = builder().build(&[]).unwrap();

    assert!(ontology.databases.is_empty());
    assert!(ontology.relationships.is_empty());
    assert_eq!(ontology.metadata.table_count, 0);
}

#[test]
fn test_snapshot_json_shape() {
    let ontology = builder().build(&records()).unwrap();
    let json = serde_json::to_value(&ontology).unwrap();

    let invoices = &json["databases"][0]["tables"][0];
    assert_eq!(invoices["name"], "invoices");
    assert_eq!(invoices["table_type"], "table");
    assert_eq!(invoices["row_count"], 900);
    assert_eq!(json["relationships"][0]["relationship_type"], "foreign_key");
    assert_eq!(json["metadata"]["relationship_count"], 1);
}
