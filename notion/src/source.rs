use crate::types::{FieldValues, Page, TableQuery};
use async_trait::async_trait;

#[derive(thiserror::Error, Debug)]
pub enum SourceError {
    #[error("request failed: {0}")]
    Network(#[from] reqwest::Error),
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("provider returned {status}: {body}")]
    Upstream { status: u16, body: String },
    #[error("could not parse provider response: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("provider reported more pages without a cursor")]
    MissingCursor,
    #[error("record not found: {0}")]
    NotFound(String),
}

/// A table of records that can be queried page by page and written back.
#[async_trait]
pub trait RecordSource: Send + Sync {
    /// Fetches a single page. `cursor` is `None` for the first page.
    async fn query(&self, query: &TableQuery, cursor: Option<&str>) -> Result<Page, SourceError>;

    /// Creates a record in `table_id` and returns its identifier.
    async fn create(&self, table_id: &str, fields: &FieldValues) -> Result<String, SourceError>;

    /// Overwrites the given fields of an existing record.
    async fn update(&self, record_id: &str, fields: &FieldValues) -> Result<(), SourceError>;

    /// Human readable name of the table.
    async fn title(&self, table_id: &str) -> Result<String, SourceError>;
}
