//! Integration tests for lookups, paths, and cycle detection.

use std::sync::Arc;
use std::thread;

use ontomap::metadata::{RawColumnRow, RawDatabaseRecord, RawForeignKeyRow, RawTableRow};
use ontomap::model::{Ontology, TableRef};
use ontomap::ontology::{build, OntologyIndex, QueryError};

/// warehouse.shipments -> sales.orders -> sales.customers, with a
/// customers <-> accounts cycle and an unrelated audit table.
fn ontology() -> Ontology {
    let sales = RawDatabaseRecord::new("sales", "db1", 3306)
        .with_table(RawTableRow::base_table("orders"))
        .with_table(RawTableRow::base_table("customers"))
        .with_table(RawTableRow::base_table("accounts"))
        .with_column(RawColumnRow::new("orders", "id", 1, "int").primary_key(1))
        .with_column(RawColumnRow::new("orders", "customer_id", 2, "int"))
        .with_column(RawColumnRow::new("customers", "id", 1, "int").primary_key(1))
        .with_column(RawColumnRow::new("customers", "account_id", 2, "int"))
        .with_column(RawColumnRow::new("accounts", "id", 1, "int").primary_key(1))
        .with_column(RawColumnRow::new("accounts", "primary_customer_id", 2, "int"))
        .with_foreign_key(RawForeignKeyRow::new(
            "orders",
            "fk_orders_customer",
            "customer_id",
            "sales",
            "customers",
            "id",
        ))
        .with_foreign_key(RawForeignKeyRow::new(
            "customers",
            "fk_customers_account",
            "account_id",
            "sales",
            "accounts",
            "id",
        ))
        .with_foreign_key(RawForeignKeyRow::new(
            "accounts",
            "fk_accounts_customer",
            "primary_customer_id",
            "sales",
            "customers",
            "id",
        ));

    let warehouse = RawDatabaseRecord::new("warehouse", "db2", 3306)
        .with_table(RawTableRow::base_table("shipments"))
        .with_table(RawTableRow::base_table("audit_log"))
        .with_column(RawColumnRow::new("shipments", "id", 1, "int").primary_key(1))
        .with_column(RawColumnRow::new("shipments", "order_id", 2, "int"))
        .with_column(RawColumnRow::new("audit_log", "id", 1, "bigint").primary_key(1))
        .with_foreign_key(RawForeignKeyRow::new(
            "shipments",
            "fk_shipments_order",
            "order_id",
            "sales",
            "orders",
            "id",
        ));

    build(&[sales, warehouse]).unwrap()
}

#[test]
fn test_lookups() {
    let ontology = ontology();
    let index = OntologyIndex::new(ontology);

    assert_eq!(index.database("sales").unwrap().tables.len(), 3);
    assert_eq!(index.table("warehouse", "shipments").unwrap().name, "shipments");
    assert!(index.contains_table("sales", "orders"));
    assert!(!index.contains_table("sales", "shipments"));

    assert_eq!(
        index.database("hr").unwrap_err(),
        QueryError::DatabaseNotFound("hr".to_string())
    );
    assert_eq!(
        index.table("sales", "invoices").unwrap_err(),
        QueryError::TableNotFound(TableRef::new("sales", "invoices"))
    );
}

#[test]
fn test_edges_by_table() {
    let ontology = ontology();
    let index = OntologyIndex::new(ontology);

    let outgoing = index.outgoing("sales", "orders").unwrap();
    assert_eq!(outgoing.len(), 1);
    assert_eq!(outgoing[0].target(), TableRef::new("sales", "customers"));

    let incoming = index.incoming("sales", "orders").unwrap();
    assert_eq!(incoming.len(), 1);
    assert_eq!(incoming[0].source(), TableRef::new("warehouse", "shipments"));

    assert!(index.outgoing("warehouse", "audit_log").unwrap().is_empty());
    assert!(index.incoming("warehouse", "audit_log").unwrap().is_empty());
}

#[test]
fn test_find_path_across_databases() {
    let ontology = ontology();
    let index = OntologyIndex::new(ontology);

    let steps = index
        .find_path(
            &TableRef::new("warehouse", "shipments"),
            &TableRef::new("sales", "accounts"),
        )
        .unwrap();

    let hops: Vec<String> = steps.iter().map(|s| s.to.to_string()).collect();
    assert_eq!(hops, vec!["sales.orders", "sales.customers", "sales.accounts"]);
    assert!(steps.iter().all(|s| s.forward));
    assert_eq!(steps[0].from, TableRef::new("warehouse", "shipments"));
}

#[test]
fn test_find_path_follows_edges_backward() {
    let ontology = ontology();
    let index = OntologyIndex::new(ontology);

    let steps = index
        .find_path(
            &TableRef::new("sales", "customers"),
            &TableRef::new("warehouse", "shipments"),
        )
        .unwrap();

    assert_eq!(steps.len(), 2);
    assert!(steps.iter().all(|s| !s.forward));
    assert_eq!(steps[1].relationship.constraint_name, "fk_shipments_order");
}

#[test]
fn test_find_path_errors() {
    let ontology = ontology();
    let index = OntologyIndex::new(ontology);
    let audit = TableRef::new("warehouse", "audit_log");
    let orders = TableRef::new("sales", "orders");

    assert_eq!(
        index.find_path(&orders, &audit).unwrap_err(),
        QueryError::NoPathFound {
            from: orders.clone(),
            to: audit.clone(),
        }
    );
    assert!(index.find_path(&orders, &orders).unwrap().is_empty());
    assert!(matches!(
        index.find_path(&orders, &TableRef::new("sales", "nope")),
        Err(QueryError::TableNotFound(_))
    ));
}

#[test]
fn test_cycles() {
    let ontology = ontology();
    let index = OntologyIndex::new(ontology);

    assert_eq!(
        index.cycles(),
        vec![vec![
            TableRef::new("sales", "accounts"),
            TableRef::new("sales", "customers"),
        ]]
    );
}

#[test]
fn test_index_is_built_once_and_shared() {
    let index = Arc::new(OntologyIndex::new(ontology()));
    let shared = index.shared();
    assert!(std::ptr::eq(shared.as_ref(), index.ontology()));

    let workers: Vec<_> = ["orders", "customers", "accounts"]
        .into_iter()
        .map(|table| {
            let index = Arc::clone(&index);
            thread::spawn(move || index.incoming("sales", table).unwrap().len())
        })
        .collect();
    let counts: Vec<usize> = workers.into_iter().map(|w| w.join().unwrap()).collect();

    assert_eq!(counts, vec![1, 2, 1]);
}
