//! HTTP API over a loaded ontology snapshot.
//!
//! Built only with the `server` feature.

#[cfg(feature = "server")]
mod error;
#[cfg(feature = "server")]
mod server;

#[cfg(feature = "server")]
pub use error::{ApiError, ErrorResponse};
#[cfg(feature = "server")]
pub use server::*;
