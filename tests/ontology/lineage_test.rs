//! Integration tests for lineage traversal.

use ontomap::metadata::{RawColumnRow, RawDatabaseRecord, RawForeignKeyRow, RawTableRow};
use ontomap::model::{Ontology, TableRef};
use ontomap::ontology::{build, traverse, Direction, OntologyIndex, QueryError};

/// A database of tables with an `id` column each, wired by the given
/// `(from, to)` foreign keys.
fn ontology_with_edges(tables: &[&str], edges: &[(&str, &str)]) -> Ontology {
    let mut record = RawDatabaseRecord::new("app", "localhost", 3306);
    for table in tables {
        record = record
            .with_table(RawTableRow::base_table(*table))
            .with_column(RawColumnRow::new(*table, "id", 1, "int").primary_key(1));
    }
    for (i, (from, to)) in edges.iter().enumerate() {
        let column = format!("{}_id", to);
        record = record
            .with_column(RawColumnRow::new(*from, column.clone(), 2 + i as u32, "int"))
            .with_foreign_key(RawForeignKeyRow::new(
                *from,
                format!("fk_{}_{}", from, to),
                column,
                "app",
                *to,
                "id",
            ));
    }
    build(&[record]).unwrap()
}

fn names(tables: Vec<&TableRef>) -> Vec<String> {
    tables.into_iter().map(|t| t.table.clone()).collect()
}

#[test]
fn test_downstream_chain_respects_depth() {
    let ontology = ontology_with_edges(&["a", "b", "c"], &[("a", "b"), ("b", "c")]);
    let index = OntologyIndex::new(ontology);

    let shallow = traverse(&index, "app", "a", Direction::Downstream, 1).unwrap();
    assert_eq!(names(shallow.tables_at(1)), vec!["b"]);
    assert!(shallow.tables_at(2).is_empty());
    assert_eq!(shallow.len(), 1);

    let deep = traverse(&index, "app", "a", Direction::Downstream, 2).unwrap();
    assert_eq!(names(deep.tables_at(1)), vec!["b"]);
    assert_eq!(names(deep.tables_at(2)), vec!["c"]);
    assert_eq!(deep.upstream().count(), 0);
}

#[test]
fn test_upstream_chain() {
    let ontology = ontology_with_edges(&["a", "b", "c"], &[("a", "b"), ("b", "c")]);
    let index = OntologyIndex::new(ontology);

    let lineage = traverse(&index, "app", "c", Direction::Upstream, 3).unwrap();
    assert_eq!(names(lineage.tables_at(1)), vec!["b"]);
    assert_eq!(names(lineage.tables_at(2)), vec!["a"]);
    assert_eq!(lineage.downstream().count(), 0);
    assert_eq!(lineage.levels.len(), 2);
}

#[test]
fn test_cycle_reports_each_table_once() {
    let ontology = ontology_with_edges(&["a", "b"], &[("a", "b"), ("b", "a")]);
    let index = OntologyIndex::new(ontology);

    let lineage = traverse(&index, "app", "a", Direction::Both, 5).unwrap();

    assert_eq!(lineage.levels.len(), 1);
    assert_eq!(names(lineage.tables_at(1)), vec!["b"]);
    assert!(!lineage.contains(&TableRef::new("app", "a")));
}

#[test]
fn test_self_reference_is_not_a_neighbor() {
    let ontology = ontology_with_edges(&["node"], &[("node", "node")]);
    let index = OntologyIndex::new(ontology);

    let lineage = traverse(&index, "app", "node", Direction::Both, 3).unwrap();
    assert!(lineage.is_empty());
}

#[test]
fn test_isolated_table_has_empty_lineage() {
    let ontology = ontology_with_edges(&["a", "b", "lonely"], &[("a", "b")]);
    let index = OntologyIndex::new(ontology);

    let lineage = traverse(&index, "app", "lonely", Direction::Both, 4).unwrap();
    assert!(lineage.is_empty());
    assert!(lineage.levels.is_empty());
}

#[test]
fn test_both_directions_split_by_flow() {
    // a -> b -> c, traversed from the middle
    let ontology = ontology_with_edges(&["a", "b", "c"], &[("a", "b"), ("b", "c")]);
    let index = OntologyIndex::new(ontology);

    let lineage = traverse(&index, "app", "b", Direction::Both, 2).unwrap();
    let level = lineage.level(1).unwrap();
    assert_eq!(level.downstream, vec![TableRef::new("app", "c")]);
    assert_eq!(level.upstream, vec![TableRef::new("app", "a")]);
    assert!(lineage.level(2).is_none());
}

#[test]
fn test_both_expands_upstream_behind_downstream_tables() {
    // s <-> t, and z references t
    let ontology = ontology_with_edges(&["s", "t", "z"], &[("s", "t"), ("t", "s"), ("z", "t")]);
    let index = OntologyIndex::new(ontology);

    let upstream = traverse(&index, "app", "s", Direction::Upstream, 2).unwrap();
    let both = traverse(&index, "app", "s", Direction::Both, 2).unwrap();

    for table in upstream.upstream() {
        assert!(both.contains(table), "{} missing from both", table);
    }
    let level = both.level(1).unwrap();
    assert_eq!(level.downstream, vec![TableRef::new("app", "t")]);
    assert!(level.upstream.is_empty());
    assert_eq!(both.level(2).unwrap().upstream, vec![TableRef::new("app", "z")]);
    assert_eq!(both.len(), 2);
}

#[test]
fn test_both_mixes_flows_at_every_depth() {
    // a -> hub <- b, hub -> c <- d
    let ontology = ontology_with_edges(
        &["a", "hub", "b", "c", "d"],
        &[("a", "hub"), ("b", "hub"), ("hub", "c"), ("d", "c")],
    );
    let index = OntologyIndex::new(ontology);

    let lineage = traverse(&index, "app", "a", Direction::Both, 3).unwrap();
    assert_eq!(names(lineage.tables_at(1)), vec!["hub"]);
    let second = lineage.level(2).unwrap();
    assert_eq!(names(second.downstream.iter().collect()), vec!["c"]);
    assert_eq!(names(second.upstream.iter().collect()), vec!["b"]);
    assert_eq!(names(lineage.tables_at(3)), vec!["d"]);
}

#[test]
fn test_diamond_reports_shared_table_once() {
    let ontology = ontology_with_edges(
        &["a", "b", "c", "d"],
        &[("a", "b"), ("a", "c"), ("b", "d"), ("c", "d")],
    );
    let index = OntologyIndex::new(ontology);

    let lineage = traverse(&index, "app", "a", Direction::Downstream, 3).unwrap();
    assert_eq!(names(lineage.tables_at(1)), vec!["b", "c"]);
    assert_eq!(names(lineage.tables_at(2)), vec!["d"]);
    assert_eq!(lineage.levels.len(), 2);
    assert_eq!(lineage.len(), 3);
}

#[test]
fn test_table_is_reported_at_its_shortest_depth() {
    let ontology = ontology_with_edges(&["a", "b", "c"], &[("a", "b"), ("a", "c"), ("b", "c")]);
    let index = OntologyIndex::new(ontology);

    let lineage = traverse(&index, "app", "a", Direction::Downstream, 2).unwrap();
    assert_eq!(names(lineage.tables_at(1)), vec!["b", "c"]);
    assert!(lineage.tables_at(2).is_empty());
    assert_eq!(lineage.levels.len(), 1);
}

#[test]
fn test_invalid_requests() {
    let ontology = ontology_with_edges(&["a"], &[]);
    let index = OntologyIndex::new(ontology);

    assert_eq!(
        traverse(&index, "app", "a", Direction::Both, 0).unwrap_err(),
        QueryError::InvalidDepth(0)
    );
    assert_eq!(
        traverse(&index, "app", "missing", Direction::Both, 1).unwrap_err(),
        QueryError::TableNotFound(TableRef::new("app", "missing"))
    );
}

#[test]
fn test_lineage_display() {
    let ontology = ontology_with_edges(
        &["orders", "customers", "regions", "refunds"],
        &[
            ("orders", "customers"),
            ("customers", "regions"),
            ("refunds", "orders"),
        ],
    );
    let index = OntologyIndex::new(ontology);
    let lineage = traverse(&index, "app", "orders", Direction::Both, 2).unwrap();

    insta::assert_snapshot!(lineage.to_string(), @r"
    app.orders (both, max depth 2)
      depth 1
        downstream: app.customers
        upstream: app.refunds
      depth 2
        downstream: app.regions
    ");
}

#[test]
fn test_lineage_serializes_levels() {
    let ontology = ontology_with_edges(&["a", "b"], &[("a", "b")]);
    let index = OntologyIndex::new(ontology);
    let lineage = traverse(&index, "app", "a", Direction::Downstream, 1).unwrap();

    let json = serde_json::to_value(&lineage).unwrap();
    assert_eq!(json["direction"], "downstream");
    assert_eq!(json["levels"][0]["depth"], 1);
    assert_eq!(json["levels"][0]["downstream"][0]["table"], "b");
}
