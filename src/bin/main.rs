//! ontomap CLI
//!
//! Usage:
//!   ontomap extract [--source <dir>] [--output <dir>] [--refresh] [--no-cache]
//!   ontomap databases
//!   ontomap stats
//!   ontomap search <query>
//!   ontomap lineage <database> <table> [--direction both] [--depth 2]
//!   ontomap filter [--database <name>]... [--min-rows <n>] [--output <file>]
//!   ontomap path <database.table> <database.table>
//!   ontomap cycles
//!   ontomap cache <stats|clear>
//!   ontomap serve

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};

use ontomap::cache::{CacheResult, MetadataCache};
use ontomap::config::Settings;
use ontomap::metadata::{extract, CachedMetadataSource, Extraction, JsonMetadataSource};
use ontomap::model::{Ontology, TableKind, TableRef};
use ontomap::observability;
use ontomap::ontology::{
    traverse, CountRange, Direction, OntologyBuilder, OntologyFilter, OntologyIndex, OntologyStats,
    SearchIndex,
};
use ontomap::snapshot;

#[derive(Parser)]
#[command(name = "ontomap")]
#[command(about = "Map database schemas and their foreign keys into one ontology")]
#[command(version)]
struct Cli {
    /// Config file (defaults to ONTOMAP_CONFIG, ./ontomap.toml, then the user config dir)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Ontology snapshot to read (defaults to <output.dir>/ontology.json)
    #[arg(long, global = true)]
    snapshot: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract metadata from every configured database and write a snapshot
    Extract {
        /// Directory holding <database>.json catalog dumps
        #[arg(short, long)]
        source: Option<PathBuf>,

        /// Output directory for the snapshot
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Ignore cached metadata and fetch again
        #[arg(long)]
        refresh: bool,

        /// Do not read or write the metadata cache
        #[arg(long)]
        no_cache: bool,
    },

    /// List databases in the snapshot
    Databases,

    /// Show ontology statistics
    Stats,

    /// Search database, table and column names
    Search {
        /// Case-insensitive substring
        query: String,
    },

    /// Show tables related to a table through foreign keys
    Lineage {
        database: String,
        table: String,

        /// Which edges to follow
        #[arg(short, long, value_enum, default_value = "both")]
        direction: DirectionArg,

        /// Maximum number of hops
        #[arg(long)]
        depth: Option<usize>,
    },

    /// Write a filtered copy of the ontology
    Filter {
        /// Keep only these databases (repeatable)
        #[arg(short, long = "database")]
        databases: Vec<String>,

        /// Keep only these table kinds, e.g. "table" or "view" (repeatable)
        #[arg(short, long = "kind")]
        kinds: Vec<String>,

        /// Keep only tables that take part in a relationship
        #[arg(long, conflicts_with = "no_relationships")]
        has_relationships: bool,

        /// Keep only tables without relationships
        #[arg(long)]
        no_relationships: bool,

        #[arg(long)]
        min_rows: Option<u64>,

        #[arg(long)]
        max_rows: Option<u64>,

        #[arg(long)]
        min_columns: Option<u64>,

        #[arg(long)]
        max_columns: Option<u64>,

        /// Output file (prints JSON to stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Find the shortest foreign-key path between two tables
    Path {
        /// Start table as database.table
        from: String,

        /// End table as database.table
        to: String,
    },

    /// List groups of tables whose foreign keys form a cycle
    Cycles,

    /// Inspect or clear the metadata cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },

    /// Serve the snapshot over HTTP
    #[cfg(feature = "server")]
    Serve {
        /// Override the configured bind host
        #[arg(long)]
        host: Option<String>,

        /// Override the configured port
        #[arg(short, long)]
        port: Option<u16>,
    },
}

#[derive(Subcommand)]
enum CacheAction {
    /// Show entry count, size and age
    Stats,
    /// Remove every cached record
    Clear,
}

#[derive(Clone, ValueEnum)]
enum DirectionArg {
    Upstream,
    Downstream,
    Both,
}

impl From<DirectionArg> for Direction {
    fn from(arg: DirectionArg) -> Self {
        match arg {
            DirectionArg::Upstream => Direction::Upstream,
            DirectionArg::Downstream => Direction::Downstream,
            DirectionArg::Both => Direction::Both,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.verbose {
        observability::init_logging_with("ontomap=debug");
    } else {
        observability::init_logging();
    }

    let settings = match load_settings(cli.config.as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            return ExitCode::FAILURE;
        }
    };
    let snapshot_path = cli
        .snapshot
        .clone()
        .unwrap_or_else(|| settings.output.snapshot_path());

    match cli.command {
        Commands::Extract {
            source,
            output,
            refresh,
            no_cache,
        } => cmd_extract(&settings, source, output, refresh, no_cache).await,
        Commands::Databases => with_snapshot(&snapshot_path, |ontology| cmd_databases(&ontology)),
        Commands::Stats => with_snapshot(&snapshot_path, |ontology| cmd_stats(&ontology)),
        Commands::Search { query } => {
            with_snapshot(&snapshot_path, |ontology| cmd_search(&ontology, &query))
        }
        Commands::Lineage {
            database,
            table,
            direction,
            depth,
        } => with_snapshot(&snapshot_path, |ontology| {
            cmd_lineage(&settings, ontology, &database, &table, direction.into(), depth)
        }),
        Commands::Filter {
            databases,
            kinds,
            has_relationships,
            no_relationships,
            min_rows,
            max_rows,
            min_columns,
            max_columns,
            output,
        } => {
            let mut filter = OntologyFilter::new()
                .with_row_count(CountRange::new(min_rows, max_rows))
                .with_column_count(CountRange::new(min_columns, max_columns));
            for database in databases {
                filter = filter.with_database(database);
            }
            for kind in kinds {
                filter = filter.with_table_kind(TableKind::parse(&kind));
            }
            if has_relationships {
                filter = filter.with_relationships(true);
            } else if no_relationships {
                filter = filter.with_relationships(false);
            }
            with_snapshot(&snapshot_path, |ontology| {
                cmd_filter(&ontology, &filter, output.as_deref())
            })
        }
        Commands::Path { from, to } => {
            with_snapshot(&snapshot_path, |ontology| cmd_path(ontology, &from, &to))
        }
        Commands::Cycles => with_snapshot(&snapshot_path, cmd_cycles),
        Commands::Cache { action } => cmd_cache(&settings, action),
        #[cfg(feature = "server")]
        Commands::Serve { host, port } => {
            let mut settings = settings;
            if let Some(host) = host {
                settings.server.host = host;
            }
            if let Some(port) = port {
                settings.server.port = port;
            }
            cmd_serve(&settings, &snapshot_path).await
        }
    }
}

fn load_settings(config: Option<&Path>) -> Result<Settings, ontomap::config::SettingsError> {
    match config {
        Some(path) => Settings::load_from(path),
        None => Settings::load(),
    }
}

/// Load the snapshot and hand it to a command.
fn with_snapshot<F>(path: &Path, command: F) -> ExitCode
where
    F: FnOnce(Ontology) -> ExitCode,
{
    match snapshot::load(path) {
        Ok(ontology) => command(ontology),
        Err(e) => {
            eprintln!("Error loading snapshot: {}", e);
            eprintln!("Run `ontomap extract` first to create one.");
            ExitCode::FAILURE
        }
    }
}

async fn cmd_extract(
    settings: &Settings,
    source: Option<PathBuf>,
    output: Option<PathBuf>,
    refresh: bool,
    no_cache: bool,
) -> ExitCode {
    if settings.databases.is_empty() {
        eprintln!("Error: no databases configured");
        eprintln!("Add [[databases]] entries to ontomap.toml or set DB_<N>_* variables.");
        return ExitCode::FAILURE;
    }

    let dumps = JsonMetadataSource::new(source.unwrap_or_else(|| settings.catalog.dir.clone()));
    let builder = OntologyBuilder::new();

    let cache = if settings.cache.enabled && !no_cache {
        open_extraction_cache(settings)
    } else {
        None
    };

    let result = match cache {
        Some(cache) => {
            let cached = CachedMetadataSource::new(dumps, cache).refresh(refresh);
            extract(&cached, &settings.databases, &builder).await
        }
        None => extract(&dumps, &settings.databases, &builder).await,
    };

    let extraction = match result {
        Ok(extraction) => extraction,
        Err(e) => {
            eprintln!("Error building ontology: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let path = output
        .map(|dir| dir.join(ontomap::config::SNAPSHOT_FILE))
        .unwrap_or_else(|| settings.output.snapshot_path());
    if let Err(e) = snapshot::save(&extraction.ontology, &path) {
        eprintln!("Error writing snapshot: {}", e);
        return ExitCode::FAILURE;
    }

    print_extraction(&extraction);
    println!("Snapshot written to {}", path.display());

    if extraction.ontology.databases.is_empty() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn open_cache(settings: &Settings) -> CacheResult<MetadataCache> {
    match settings.cache_path() {
        Some(path) => MetadataCache::open_at(path),
        None => MetadataCache::open(),
    }
}

fn open_extraction_cache(settings: &Settings) -> Option<MetadataCache> {
    match open_cache(settings) {
        Ok(cache) => Some(cache),
        Err(e) => {
            eprintln!("Warning: metadata cache unavailable ({}), continuing without it", e);
            None
        }
    }
}

fn print_extraction(extraction: &Extraction) {
    let metadata = &extraction.ontology.metadata;
    println!(
        "Extracted {} databases, {} tables, {} columns, {} relationships",
        metadata.database_count,
        metadata.table_count,
        metadata.column_count,
        metadata.relationship_count
    );

    if !extraction.report.unresolved.is_empty() {
        println!(
            "{} foreign keys could not be resolved:",
            extraction.report.unresolved.len()
        );
        for fk in &extraction.report.unresolved {
            println!("  {}", fk);
        }
    }

    for failure in &extraction.failures {
        eprintln!("Failed: {} ({})", failure.database, failure.error);
    }
}

fn cmd_databases(ontology: &Ontology) -> ExitCode {
    if ontology.databases.is_empty() {
        println!("No databases in snapshot");
        return ExitCode::SUCCESS;
    }

    println!(
        "{:<24} {:<28} {:>7} {:>6} {:>8}",
        "DATABASE", "HOST", "TABLES", "VIEWS", "COLUMNS"
    );
    for db in &ontology.databases {
        let stats = ontomap::ontology::DatabaseStats::of(db);
        println!(
            "{:<24} {:<28} {:>7} {:>6} {:>8}",
            stats.name,
            format!("{}:{}", stats.host, stats.port),
            stats.table_count,
            stats.view_count,
            stats.column_count
        );
    }
    ExitCode::SUCCESS
}

fn cmd_stats(ontology: &Ontology) -> ExitCode {
    let stats = OntologyStats::of(ontology);

    println!("Databases:      {}", stats.database_count);
    println!("Tables:         {}", stats.table_count);
    println!("Columns:        {}", stats.column_count);
    println!(
        "Relationships:  {} ({} cross-database)",
        stats.relationship_count, stats.cross_database_relationships
    );
    println!("Unresolved FKs: {}", stats.unresolved_foreign_keys);
    if let Some(date) = ontology.metadata.extraction_date {
        println!("Extracted:      {}", date.to_rfc3339());
    }
    ExitCode::SUCCESS
}

fn cmd_search(ontology: &Ontology, query: &str) -> ExitCode {
    let results = SearchIndex::new(ontology).search(query);

    if results.is_empty() {
        println!("No matches for '{}'", query);
        return ExitCode::SUCCESS;
    }

    if !results.databases.is_empty() {
        println!("Databases:");
        for hit in &results.databases {
            println!("  {} ({})", hit.database, hit.host);
        }
    }
    if !results.tables.is_empty() {
        println!("Tables:");
        for hit in &results.tables {
            println!("  {}.{} [{}]", hit.database, hit.table, hit.kind);
        }
    }
    if !results.columns.is_empty() {
        println!("Columns:");
        for hit in &results.columns {
            println!(
                "  {}.{}.{} {}",
                hit.database, hit.table, hit.column, hit.data_type
            );
        }
    }
    ExitCode::SUCCESS
}

fn cmd_lineage(
    settings: &Settings,
    ontology: Ontology,
    database: &str,
    table: &str,
    direction: Direction,
    depth: Option<usize>,
) -> ExitCode {
    let index = OntologyIndex::new(ontology);
    let depth = match depth {
        Some(0) => 0,
        requested => settings.lineage.effective_depth(requested),
    };

    match traverse(&index, database, table, direction, depth) {
        Ok(lineage) => {
            print!("{}", lineage);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn cmd_filter(ontology: &Ontology, filter: &OntologyFilter, output: Option<&Path>) -> ExitCode {
    let filtered = filter.apply(ontology);

    match output {
        Some(path) => match snapshot::save(&filtered, path) {
            Ok(()) => {
                eprintln!(
                    "Wrote {} databases, {} tables to {}",
                    filtered.metadata.database_count,
                    filtered.metadata.table_count,
                    path.display()
                );
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("Error writing output: {}", e);
                ExitCode::FAILURE
            }
        },
        None => match serde_json::to_string_pretty(&filtered) {
            Ok(json) => {
                println!("{}", json);
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("Error serializing ontology: {}", e);
                ExitCode::FAILURE
            }
        },
    }
}

fn parse_table_ref(qualified: &str) -> Option<TableRef> {
    let (database, table) = qualified.split_once('.')?;
    if database.is_empty() || table.is_empty() {
        return None;
    }
    Some(TableRef::new(database, table))
}

fn cmd_path(ontology: Ontology, from: &str, to: &str) -> ExitCode {
    let (Some(from), Some(to)) = (parse_table_ref(from), parse_table_ref(to)) else {
        eprintln!("Error: tables must be written as database.table");
        return ExitCode::FAILURE;
    };

    let index = OntologyIndex::new(ontology);
    match index.find_path(&from, &to) {
        Ok(steps) if steps.is_empty() => {
            println!("{} is the start table", from);
            ExitCode::SUCCESS
        }
        Ok(steps) => {
            println!("{}", from);
            for step in &steps {
                let arrow = if step.forward { "->" } else { "<-" };
                println!(
                    "  {} {} via {}.{}",
                    arrow, step.to, step.relationship.constraint_name, step.relationship.source_column
                );
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn cmd_cycles(ontology: Ontology) -> ExitCode {
    let cycles = OntologyIndex::new(ontology).cycles();

    if cycles.is_empty() {
        println!("No foreign-key cycles");
        return ExitCode::SUCCESS;
    }

    for (i, group) in cycles.iter().enumerate() {
        let names: Vec<String> = group.iter().map(TableRef::to_string).collect();
        println!("{}. {}", i + 1, names.join(", "));
    }
    ExitCode::SUCCESS
}

fn cmd_cache(settings: &Settings, action: CacheAction) -> ExitCode {
    let cache = match open_cache(settings) {
        Ok(cache) => cache,
        Err(e) => {
            eprintln!("Error opening cache: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match action {
        CacheAction::Stats => match cache.stats() {
            Ok(stats) => {
                println!("Entries: {}", stats.entry_count);
                println!("Size:    {} bytes", stats.total_size_bytes);
                if let (Some(oldest), Some(newest)) = (stats.oldest, stats.newest) {
                    println!("Oldest:  {}", oldest.to_rfc3339());
                    println!("Newest:  {}", newest.to_rfc3339());
                }
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("Error reading cache: {}", e);
                ExitCode::FAILURE
            }
        },
        CacheAction::Clear => match cache.clear_all() {
            Ok(removed) => {
                println!("Removed {} cached records", removed);
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("Error clearing cache: {}", e);
                ExitCode::FAILURE
            }
        },
    }
}

#[cfg(feature = "server")]
async fn cmd_serve(settings: &Settings, snapshot_path: &Path) -> ExitCode {
    let ontology = match snapshot::load(snapshot_path) {
        Ok(ontology) => ontology,
        Err(e) => {
            eprintln!("Error loading snapshot: {}", e);
            return ExitCode::FAILURE;
        }
    };

    println!("Serving on http://{}", settings.server.bind_address());
    match ontomap::web::serve(settings, ontology).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Server error: {}", e);
            ExitCode::FAILURE
        }
    }
}
