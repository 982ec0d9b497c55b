use indexmap::IndexMap;
use notion::Record;
use std::collections::BTreeMap;

/// A record projected onto the fields one handler cares about.
#[derive(Clone, Debug, PartialEq)]
pub struct IndexedRecord {
    pub id: String,
    pub fields: BTreeMap<String, Option<String>>,
}

impl IndexedRecord {
    pub fn text(&self, field: &str) -> Option<&str> {
        self.fields.get(field).and_then(|v| v.as_deref())
    }
}

/// Records keyed by business key, in table order.
///
/// Records without a business key are left out and counted in `skipped`.
/// When several records share a key the last one wins; it keeps the position
/// of the first occurrence.
#[derive(Debug, Default)]
pub struct RecordIndex {
    entries: IndexMap<String, IndexedRecord>,
    skipped: usize,
    duplicates: usize,
}

impl RecordIndex {
    pub fn build<I>(records: I, business_key_field: &str, value_fields: &[&str]) -> Self
    where
        I: IntoIterator<Item = Record>,
    {
        let mut index = RecordIndex::default();

        for record in records {
            let Some(key) = record.text(business_key_field).map(String::from) else {
                index.skipped += 1;
                continue;
            };

            let fields = value_fields
                .iter()
                .map(|field| (field.to_string(), record.text(field).map(String::from)))
                .collect();
            let entry = IndexedRecord {
                id: record.id,
                fields,
            };

            if let Some(previous) = index.entries.insert(key.clone(), entry) {
                index.duplicates += 1;
                tracing::warn!(
                    key = %key,
                    replaced = %previous.id,
                    "Duplicate business key, keeping the later record"
                );
            }
        }

        index
    }

    pub fn get(&self, key: &str) -> Option<&IndexedRecord> {
        self.entries.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &IndexedRecord)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Records dropped for lacking a business key.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Records that replaced an earlier record with the same key.
    pub fn duplicates(&self) -> usize {
        self.duplicates
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &str = "message key";

    #[test]
    fn test_last_record_wins() {
        let records = vec![
            Record::new("r1")
                .with_field(KEY, Some("hello"))
                .with_field("zh-TW", Some("哈囉")),
            Record::new("r2")
                .with_field(KEY, Some("bye"))
                .with_field("zh-TW", Some("再見")),
            Record::new("r3")
                .with_field(KEY, Some("hello"))
                .with_field("zh-TW", Some("你好")),
        ];

        let index = RecordIndex::build(records, KEY, &["zh-TW"]);

        assert_eq!(index.len(), 2);
        assert_eq!(index.duplicates(), 1);
        let hello = index.get("hello").unwrap();
        assert_eq!(hello.id, "r3");
        assert_eq!(hello.text("zh-TW"), Some("你好"));

        // Position of the first occurrence is kept.
        let keys: Vec<_> = index.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, ["hello", "bye"]);
    }

    #[test]
    fn test_records_without_key_are_skipped() {
        let records = vec![
            Record::new("r1").with_field("zh-TW", Some("孤兒")),
            Record::new("r2").with_field(KEY, Some("   ")),
            Record::new("r3").with_field(KEY, Some("ok")),
        ];

        let index = RecordIndex::build(records, KEY, &["zh-TW"]);

        assert_eq!(index.len(), 1);
        assert_eq!(index.skipped(), 2);
        assert!(index.contains_key("ok"));
        assert_eq!(index.get("ok").unwrap().text("zh-TW"), None);
    }

    #[test]
    fn test_projects_only_requested_fields() {
        let records = vec![Record::new("r1")
            .with_field(KEY, Some("hello"))
            .with_field("zh-TW", Some("你好"))
            .with_field("notes", Some("internal"))];

        let index = RecordIndex::build(records, KEY, &["zh-TW", "en-US"]);
        let entry = index.get("hello").unwrap();

        assert_eq!(entry.fields.len(), 2);
        assert_eq!(entry.fields.get("en-US"), Some(&None));
        assert!(!entry.fields.contains_key("notes"));
    }
}
