//! Error types shared by the loader, the aggregation queries and the exporters.

use thiserror::Error;

/// Everything that can go wrong between fetching the dataset and writing an export.
///
/// Bad numeric text and short rows are not errors: they degrade to zero or to
/// empty strings during parsing. Unknown areas are not errors either; queries
/// return `None` for them.
#[derive(Debug, Error)]
pub enum DashboardError {
    #[error("malformed input: no header line")]
    MalformedInput,

    #[error("failed to load dataset: {message}")]
    LoadFailed { message: String },

    #[error("no co-benefit category selected")]
    EmptySelection,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl DashboardError {
    pub fn load_failed(message: impl Into<String>) -> Self {
        Self::LoadFailed {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, DashboardError>;
