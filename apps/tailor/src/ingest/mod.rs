//! Ingestion layer — scraped job CSVs and candidate profile JSON.

pub mod job_store;
pub mod profile_store;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("I/O error reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV parse error in {path}: {source}")]
    Csv {
        path: String,
        #[source]
        source: csv::Error,
    },

    #[error("JSON parse error in {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("no job with id '{0}' in the job store")]
    UnknownJob(String),

    #[error("no profile named '{0}' in the profile store")]
    UnknownProfile(String),
}
