use crate::metrics_defs::{TABLE_PAGES, TABLE_ROWS};
use crate::source::{RecordSource, SourceError};
use crate::types::{Record, TableQuery};
use shared::{counter, histogram};

/// Walks a table page by page, following the provider's continuation cursor.
///
/// Pages are fetched lazily and strictly one at a time: the next request is
/// only issued when the caller asks for the next page. `restart` rewinds the
/// pager to the first page.
pub struct TablePager<'a> {
    source: &'a dyn RecordSource,
    query: TableQuery,
    cursor: Option<String>,
    exhausted: bool,
    pages_fetched: usize,
}

impl<'a> TablePager<'a> {
    pub fn new(source: &'a dyn RecordSource, query: TableQuery) -> Self {
        TablePager {
            source,
            query,
            cursor: None,
            exhausted: false,
            pages_fetched: 0,
        }
    }

    /// Returns the next page of records, or `None` once the table is exhausted.
    ///
    /// A failed request leaves the pager where it was, so the same page can be
    /// requested again.
    pub async fn next_page(&mut self) -> Result<Option<Vec<Record>>, SourceError> {
        if self.exhausted {
            return Ok(None);
        }

        let page = self
            .source
            .query(&self.query, self.cursor.as_deref())
            .await?;
        self.pages_fetched += 1;
        counter!(TABLE_PAGES).increment(1);

        if page.has_more {
            let Some(next_cursor) = page.next_cursor else {
                self.exhausted = true;
                return Err(SourceError::MissingCursor);
            };
            self.cursor = Some(next_cursor);
        } else {
            self.cursor = None;
            self.exhausted = true;
        }

        tracing::debug!(
            table_id = %self.query.table_id,
            page = self.pages_fetched,
            records = page.records.len(),
            has_more = page.has_more,
            "Fetched table page"
        );

        Ok(Some(page.records))
    }

    pub fn restart(&mut self) {
        self.cursor = None;
        self.exhausted = false;
        self.pages_fetched = 0;
    }

    pub fn pages_fetched(&self) -> usize {
        self.pages_fetched
    }

    /// Reads every remaining page. Records already collected are dropped if
    /// any page fails.
    pub async fn read_all(mut self) -> Result<Vec<Record>, SourceError> {
        let mut records = Vec::new();

        while let Some(page) = self.next_page().await? {
            records.extend(page);
        }

        histogram!(TABLE_ROWS).record(records.len() as f64);
        tracing::info!(
            table_id = %self.query.table_id,
            pages = self.pages_fetched,
            records = records.len(),
            "Read table"
        );

        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutils::InMemorySource;
    use crate::types::SelectFilter;

    fn numbered_records(count: usize) -> Vec<Record> {
        (0..count)
            .map(|i| Record::new(format!("r{i}")).with_field("message key", Some(format!("key{i}"))))
            .collect()
    }

    #[tokio::test]
    async fn test_reads_every_page() {
        // 3 full pages reporting has_more, then a final partial page.
        let source = InMemorySource::new(numbered_records(7)).with_page_size(2);
        let records = TablePager::new(&source, TableQuery::new("db"))
            .read_all()
            .await
            .unwrap();

        assert_eq!(source.query_count(), 4);
        let ids: Vec<_> = records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["r0", "r1", "r2", "r3", "r4", "r5", "r6"]);
    }

    #[tokio::test]
    async fn test_empty_table() {
        let source = InMemorySource::new(vec![]);
        let records = TablePager::new(&source, TableQuery::new("db"))
            .read_all()
            .await
            .unwrap();

        assert!(records.is_empty());
        assert_eq!(source.query_count(), 1);
    }

    #[tokio::test]
    async fn test_lazy_and_restartable() {
        let source = InMemorySource::new(numbered_records(3)).with_page_size(2);
        let mut pager = TablePager::new(&source, TableQuery::new("db"));

        let first = pager.next_page().await.unwrap().unwrap();
        assert_eq!(first.len(), 2);
        assert_eq!(source.query_count(), 1);

        let second = pager.next_page().await.unwrap().unwrap();
        assert_eq!(second.len(), 1);
        assert!(pager.next_page().await.unwrap().is_none());
        assert_eq!(source.query_count(), 2);
        assert_eq!(pager.pages_fetched(), 2);

        pager.restart();
        let again = pager.next_page().await.unwrap().unwrap();
        assert_eq!(again[0].id, "r0");
        assert_eq!(source.query_count(), 3);
    }

    #[tokio::test]
    async fn test_page_failure_discards_partial_results() {
        let source = InMemorySource::new(numbered_records(6))
            .with_page_size(2)
            .fail_query_on(2);

        let result = TablePager::new(&source, TableQuery::new("db"))
            .read_all()
            .await;

        assert!(matches!(result, Err(SourceError::Upstream { .. })));
        assert_eq!(source.query_count(), 2);
    }

    #[tokio::test]
    async fn test_more_pages_without_cursor() {
        let source = InMemorySource::new(numbered_records(5))
            .with_page_size(2)
            .omit_cursors();

        let result = TablePager::new(&source, TableQuery::new("db"))
            .read_all()
            .await;
        assert!(matches!(result, Err(SourceError::MissingCursor)));
        assert_eq!(source.query_count(), 1);

        let mut pager = TablePager::new(&source, TableQuery::new("db"));
        assert!(matches!(
            pager.next_page().await,
            Err(SourceError::MissingCursor)
        ));
        assert!(pager.next_page().await.unwrap().is_none());
        assert_eq!(source.query_count(), 2);
    }

    #[tokio::test]
    async fn test_filtered_query() {
        let records = vec![
            Record::new("a").with_field("product", Some("Portal")),
            Record::new("b").with_field("product", Some("App")),
            Record::new("c").with_field("product", Some("Portal")),
        ];
        let source = InMemorySource::new(records).with_page_size(1);
        let query = TableQuery::new("db").with_filter(Some(SelectFilter {
            property: "product".into(),
            equals: "Portal".into(),
        }));

        let records = TablePager::new(&source, query).read_all().await.unwrap();
        let ids: Vec<_> = records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["a", "c"]);
    }
}
