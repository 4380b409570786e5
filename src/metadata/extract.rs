//! One extraction pass: fetch every configured database, then build.

use tracing::{info, warn};

use super::source::{MetadataError, MetadataSource};
use crate::config::DatabaseSettings;
use crate::model::Ontology;
use crate::ontology::{BuildReport, BuildResult, OntologyBuilder};

/// A database whose metadata could not be fetched.
#[derive(Debug)]
pub struct ExtractionFailure {
    pub database: String,
    pub error: MetadataError,
}

/// Outcome of an extraction pass.
#[derive(Debug)]
pub struct Extraction {
    pub ontology: Ontology,
    pub report: BuildReport,
    /// Databases left out of the ontology
    pub failures: Vec<ExtractionFailure>,
}

impl Extraction {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Fetch all databases concurrently and build an ontology from the ones
/// that succeeded.
///
/// A database that fails to fetch is logged and skipped; foreign keys into
/// it then resolve as references to an unconfigured database.
pub async fn extract<S>(
    source: &S,
    databases: &[DatabaseSettings],
    builder: &OntologyBuilder,
) -> BuildResult<Extraction>
where
    S: MetadataSource + ?Sized,
{
    info!(databases = databases.len(), "Starting extraction");

    let mut records = Vec::with_capacity(databases.len());
    let mut failures = Vec::new();
    for (settings, result) in databases.iter().zip(source.fetch_all(databases).await) {
        match result {
            Ok(record) => records.push(record),
            Err(error) => {
                warn!(database = %settings.display_name(), error = %error, "Skipping database");
                failures.push(ExtractionFailure {
                    database: settings.name.clone(),
                    error,
                });
            }
        }
    }

    let (ontology, report) = builder.build_with_report(&records)?;

    info!(
        extracted = records.len(),
        failed = failures.len(),
        "Extraction finished"
    );

    Ok(Extraction {
        ontology,
        report,
        failures,
    })
}
