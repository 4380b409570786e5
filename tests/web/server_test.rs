//! Integration tests for the HTTP API.

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use ontomap::config::LineageSettings;
use ontomap::metadata::{RawColumnRow, RawDatabaseRecord, RawForeignKeyRow, RawTableRow};
use ontomap::ontology::build;
use ontomap::web::{router, AppState};

fn state() -> AppState {
    let shop = RawDatabaseRecord::new("shop", "db1", 3306)
        .with_table(RawTableRow::base_table("orders").with_rows(5000))
        .with_table(RawTableRow::base_table("customers").with_rows(100))
        .with_column(RawColumnRow::new("orders", "id", 1, "int").primary_key(1))
        .with_column(RawColumnRow::new("orders", "customer_id", 2, "int"))
        .with_column(RawColumnRow::new("customers", "id", 1, "int").primary_key(1))
        .with_column(RawColumnRow::new("customers", "account_id", 2, "int"))
        .with_foreign_key(RawForeignKeyRow::new(
            "orders",
            "fk_orders_customer",
            "customer_id",
            "shop",
            "customers",
            "id",
        ))
        .with_foreign_key(RawForeignKeyRow::new(
            "customers",
            "fk_customers_account",
            "account_id",
            "crm",
            "accounts",
            "id",
        ));
    let crm = RawDatabaseRecord::new("crm", "db2", 3306)
        .with_table(RawTableRow::base_table("accounts"))
        .with_column(RawColumnRow::new("accounts", "id", 1, "int").primary_key(1));

    let ontology = build(&[shop, crm]).unwrap();
    let lineage = LineageSettings {
        default_depth: 1,
        max_depth: 3,
    };
    AppState::new(ontology, lineage)
}

fn app() -> Router {
    router(Arc::new(state()))
}

async fn send(request: Request<Body>) -> (StatusCode, Value) {
    let response = app().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

async fn get(uri: &str) -> (StatusCode, Value) {
    send(Request::get(uri).body(Body::empty()).unwrap()).await
}

#[tokio::test]
async fn test_ontology_document() {
    let (status, body) = get("/api/ontology").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["metadata"]["database_count"], 2);
    assert_eq!(body["relationships"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_databases_and_stats() {
    let (status, body) = get("/api/databases").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["name"], "shop");
    assert_eq!(body[0]["table_count"], 2);

    let (_, stats) = get("/api/stats").await;
    assert_eq!(stats["relationship_count"], 2);
    assert_eq!(stats["cross_database_relationships"], 1);
}

#[tokio::test]
async fn test_table_detail() {
    let (status, body) = get("/api/databases/shop/tables/customers").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["database"], "shop");
    assert_eq!(body["name"], "customers");
    assert_eq!(body["outgoing"][0]["target_database"], "crm");
    assert_eq!(body["incoming"][0]["source_table"], "orders");
}

#[tokio::test]
async fn test_unknown_table_is_not_found() {
    let (status, body) = get("/api/databases/shop/tables/invoices").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], true);
    assert_eq!(body["code"], "NOT_FOUND");

    let (status, _) = get("/api/databases/hr").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_search() {
    let (status, body) = get("/api/search?q=ACCOUNT").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["tables"][0]["table"], "accounts");
    assert_eq!(body["columns"][0]["column"], "account_id");
}

#[tokio::test]
async fn test_lineage_uses_configured_depths() {
    // default depth 1 stops before crm.accounts
    let (status, body) = get("/api/lineage/shop/orders?direction=downstream").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["max_depth"], 1);
    assert_eq!(body["levels"].as_array().unwrap().len(), 1);

    // requests above the limit are clamped
    let (_, body) = get("/api/lineage/shop/orders?direction=downstream&depth=50").await;
    assert_eq!(body["max_depth"], 3);
    assert_eq!(body["levels"][1]["downstream"][0]["database"], "crm");

    let (status, body) = get("/api/lineage/shop/orders?depth=0").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_filter() {
    let request = Request::post("/api/filter")
        .header("content-type", "application/json")
        .body(Body::from(
            json!({"databases": ["shop"], "row_count": {"min": 1000}}).to_string(),
        ))
        .unwrap();

    let (status, body) = send(request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["metadata"]["table_count"], 1);
    assert_eq!(body["databases"][0]["tables"][0]["name"], "orders");
    assert_eq!(body["relationships"], json!([]));
}

#[tokio::test]
async fn test_cycles_empty() {
    let (status, body) = get("/api/cycles").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn test_state_serves_repeated_requests_from_one_index() {
    let state = Arc::new(state());
    assert_eq!(state.ontology().databases.len(), 2);
    assert_eq!(state.index.incoming("shop", "customers").unwrap().len(), 1);

    let app = router(Arc::clone(&state));
    for _ in 0..2 {
        let response = app
            .clone()
            .oneshot(
                Request::get("/api/lineage/shop/orders?direction=downstream&depth=2")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
    assert!(std::ptr::eq(state.ontology(), state.index.ontology()));
}
