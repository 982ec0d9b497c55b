//! Access to the Notion database that stores the localized strings.
//!
//! The `RecordSource` trait is the seam between the sync logic and the
//! provider: `client::NotionClient` talks to the REST API and
//! `testutils::InMemorySource` (feature `testutils`) keeps records in memory.

pub mod client;
pub mod config;
pub mod metrics_defs;
pub mod pager;
pub mod source;
pub mod types;

#[cfg(any(test, feature = "testutils"))]
pub mod testutils;

pub use pager::TablePager;
pub use source::{RecordSource, SourceError};
pub use types::{Page, Record, SelectFilter, TableQuery};
