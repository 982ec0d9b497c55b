//! In-memory record source for tests.

use crate::source::{RecordSource, SourceError};
use crate::types::{FieldValues, Page, Record, TableQuery};
use async_trait::async_trait;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Keeps records in insertion order and pages through them with numeric
/// cursors. Failures can be injected for the n-th query or write (1-based).
pub struct InMemorySource {
    records: Mutex<Vec<Record>>,
    title: String,
    page_size: usize,
    queries: AtomicUsize,
    writes: AtomicUsize,
    fail_query_on: Option<usize>,
    fail_write_on: Option<usize>,
    omit_cursors: bool,
}

impl InMemorySource {
    pub fn new(records: Vec<Record>) -> Self {
        InMemorySource {
            records: Mutex::new(records),
            title: "Test Table".into(),
            page_size: 100,
            queries: AtomicUsize::new(0),
            writes: AtomicUsize::new(0),
            fail_query_on: None,
            fail_write_on: None,
            omit_cursors: false,
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn with_title<T: Into<String>>(mut self, title: T) -> Self {
        self.title = title.into();
        self
    }

    pub fn fail_query_on(mut self, n: usize) -> Self {
        self.fail_query_on = Some(n);
        self
    }

    pub fn fail_write_on(mut self, n: usize) -> Self {
        self.fail_write_on = Some(n);
        self
    }

    /// Pages still report `has_more` but never carry a continuation cursor.
    pub fn omit_cursors(mut self) -> Self {
        self.omit_cursors = true;
        self
    }

    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }

    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn records(&self) -> Vec<Record> {
        self.records.lock().unwrap().clone()
    }

    pub fn get(&self, id: &str) -> Option<Record> {
        self.records().into_iter().find(|r| r.id == id)
    }

    fn injected_failure() -> SourceError {
        SourceError::Upstream {
            status: 500,
            body: "injected failure".into(),
        }
    }

    fn count_write(&self) -> Result<(), SourceError> {
        let n = self.writes.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_write_on == Some(n) {
            return Err(Self::injected_failure());
        }
        Ok(())
    }
}

fn apply_fields(record: &mut Record, fields: &FieldValues) {
    for (name, value) in fields {
        record.set(name.clone(), Some(value.as_str()));
    }
}

#[async_trait]
impl RecordSource for InMemorySource {
    async fn query(&self, query: &TableQuery, cursor: Option<&str>) -> Result<Page, SourceError> {
        let n = self.queries.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_query_on == Some(n) {
            return Err(Self::injected_failure());
        }

        let start = match cursor {
            Some(c) => c.parse::<usize>().map_err(|_| SourceError::Upstream {
                status: 400,
                body: format!("invalid cursor {c}"),
            })?,
            None => 0,
        };

        let matching: Vec<Record> = self
            .records()
            .into_iter()
            .filter(|r| match &query.filter {
                Some(filter) => r.text(&filter.property) == Some(filter.equals.as_str()),
                None => true,
            })
            .collect();

        let end = (start + self.page_size).min(matching.len());
        let records = matching.get(start..end).map(<[Record]>::to_vec).unwrap_or_default();
        let has_more = end < matching.len();

        Ok(Page {
            records,
            has_more,
            next_cursor: (has_more && !self.omit_cursors).then(|| end.to_string()),
        })
    }

    async fn create(&self, _table_id: &str, fields: &FieldValues) -> Result<String, SourceError> {
        self.count_write()?;

        let mut records = self.records.lock().unwrap();
        let id = format!("created-{}", records.len());
        let mut record = Record::new(id.clone());
        apply_fields(&mut record, fields);
        records.push(record);

        Ok(id)
    }

    async fn update(&self, record_id: &str, fields: &FieldValues) -> Result<(), SourceError> {
        self.count_write()?;

        let mut records = self.records.lock().unwrap();
        let record = records
            .iter_mut()
            .find(|r| r.id == record_id)
            .ok_or_else(|| SourceError::NotFound(record_id.to_string()))?;
        apply_fields(record, fields);

        Ok(())
    }

    async fn title(&self, _table_id: &str) -> Result<String, SourceError> {
        Ok(self.title.clone())
    }
}
