use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RosterError {
    #[error("failed to read roster {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed JSON roster: {0}")]
    Json(#[from] serde_json::Error),
    #[error("malformed CSV roster: {0}")]
    Csv(#[from] csv::Error),
    #[error("record '{id}' is missing required field '{field}'")]
    MissingField { id: String, field: &'static str },
    #[error("record '{id}' has invalid {field}: {reason}")]
    InvalidField {
        id: String,
        field: &'static str,
        reason: String,
    },
    #[error("duplicate record id '{0}'")]
    DuplicateId(String),
    #[error("roster contains no records")]
    Empty,
    #[error("no record with id '{0}'")]
    UnknownRecord(String),
}
