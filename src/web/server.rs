//! Axum server exposing a loaded ontology as JSON.

use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::config::{LineageSettings, Settings};
use crate::model::{Database, Ontology, Relationship, Table, TableRef};
use crate::ontology::{
    traverse, Direction, Lineage, OntologyFilter, OntologyIndex, OntologyStats, DatabaseStats,
    SearchIndex, SearchResults,
};

use super::error::ApiError;

/// Application state shared across handlers
pub struct AppState {
    pub index: OntologyIndex,
    pub search: SearchIndex,
    pub lineage: LineageSettings,
}

impl AppState {
    /// Index the ontology once for every request to share.
    pub fn new(ontology: Ontology, lineage: LineageSettings) -> Self {
        Self {
            search: SearchIndex::new(&ontology),
            index: OntologyIndex::new(ontology),
            lineage,
        }
    }

    pub fn ontology(&self) -> &Ontology {
        self.index.ontology()
    }
}

/// Build the axum router with all routes
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/ontology", get(get_ontology))
        .route("/api/databases", get(list_databases))
        .route("/api/databases/{database}", get(get_database))
        .route("/api/databases/{database}/tables/{table}", get(get_table))
        .route("/api/relationships", get(list_relationships))
        .route("/api/search", get(search))
        .route("/api/stats", get(stats))
        .route("/api/lineage/{database}/{table}", get(lineage))
        .route("/api/cycles", get(cycles))
        .route("/api/filter", post(filter))
        .layer(cors)
        .with_state(state)
}

/// Start the web server
pub async fn serve(
    settings: &Settings,
    ontology: Ontology,
) -> Result<(), Box<dyn std::error::Error>> {
    let state = Arc::new(AppState::new(ontology, settings.lineage));
    let app = router(state);

    let addr = settings.server.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(address = %addr, "Serving ontology API");

    axum::serve(listener, app).await?;
    Ok(())
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/ontology - The complete ontology document
async fn get_ontology(State(state): State<Arc<AppState>>) -> Json<Ontology> {
    Json(state.ontology().clone())
}

/// GET /api/databases - Per-database summaries
async fn list_databases(State(state): State<Arc<AppState>>) -> Json<Vec<DatabaseStats>> {
    Json(
        state
            .ontology()
            .databases
            .iter()
            .map(DatabaseStats::of)
            .collect(),
    )
}

/// GET /api/databases/{database}
async fn get_database(
    State(state): State<Arc<AppState>>,
    Path(database): Path<String>,
) -> Result<Json<Database>, ApiError> {
    Ok(Json(state.index.database(&database)?.clone()))
}

#[derive(Serialize)]
struct TableDetail {
    database: String,
    #[serde(flatten)]
    table: Table,
    outgoing: Vec<Relationship>,
    incoming: Vec<Relationship>,
}

/// GET /api/databases/{database}/tables/{table} - A table with its edges
async fn get_table(
    State(state): State<Arc<AppState>>,
    Path((database, table)): Path<(String, String)>,
) -> Result<Json<TableDetail>, ApiError> {
    let index = &state.index;
    let found = index.table(&database, &table)?;
    let outgoing = index.outgoing(&database, &table)?;
    let incoming = index.incoming(&database, &table)?;

    Ok(Json(TableDetail {
        database,
        table: found.clone(),
        outgoing: outgoing.into_iter().cloned().collect(),
        incoming: incoming.into_iter().cloned().collect(),
    }))
}

/// GET /api/relationships
async fn list_relationships(State(state): State<Arc<AppState>>) -> Json<Vec<Relationship>> {
    Json(state.ontology().relationships.clone())
}

#[derive(Deserialize)]
struct SearchParams {
    #[serde(default)]
    q: String,
}

/// GET /api/search?q= - Case-insensitive name search
async fn search(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> Json<SearchResults> {
    Json(state.search.search(&params.q))
}

/// GET /api/stats
async fn stats(State(state): State<Arc<AppState>>) -> Json<OntologyStats> {
    Json(OntologyStats::of(state.ontology()))
}

#[derive(Deserialize)]
struct LineageParams {
    #[serde(default)]
    direction: Direction,
    depth: Option<usize>,
}

/// GET /api/lineage/{database}/{table}?direction=&depth=
async fn lineage(
    State(state): State<Arc<AppState>>,
    Path((database, table)): Path<(String, String)>,
    Query(params): Query<LineageParams>,
) -> Result<Json<Lineage>, ApiError> {
    if params.depth == Some(0) {
        return Err(ApiError::BadRequest("depth must be at least 1".to_string()));
    }
    let depth = state.lineage.effective_depth(params.depth);
    Ok(Json(traverse(&state.index, &database, &table, params.direction, depth)?))
}

/// GET /api/cycles - Groups of tables whose foreign keys form a cycle
async fn cycles(State(state): State<Arc<AppState>>) -> Json<Vec<Vec<TableRef>>> {
    Json(state.index.cycles())
}

/// POST /api/filter - Derived ontology matching the posted predicates
async fn filter(
    State(state): State<Arc<AppState>>,
    Json(filter): Json<OntologyFilter>,
) -> Json<Ontology> {
    Json(filter.apply(state.ontology()))
}
