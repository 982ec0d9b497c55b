use std::collections::BTreeMap;

/// Field values staged for a create or update. Only the listed fields are written.
pub type FieldValues = BTreeMap<String, String>;

/// One row of the table.
///
/// Text values are normalized on construction: surrounding whitespace is
/// trimmed and empty text is stored as `None`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Record {
    pub id: String,
    pub fields: BTreeMap<String, Option<String>>,
}

impl Record {
    pub fn new<I: Into<String>>(id: I) -> Self {
        Record {
            id: id.into(),
            fields: BTreeMap::new(),
        }
    }

    /// Builder-style helper, mostly used to set up fixtures.
    pub fn with_field<N, V>(mut self, name: N, value: Option<V>) -> Self
    where
        N: Into<String>,
        V: AsRef<str>,
    {
        self.set(name, value.as_ref().map(|v| v.as_ref()));
        self
    }

    pub fn set<N: Into<String>>(&mut self, name: N, value: Option<&str>) {
        self.fields.insert(name.into(), normalize_text(value));
    }

    /// Returns the non-empty text of `field`, if any.
    pub fn text(&self, field: &str) -> Option<&str> {
        self.fields.get(field).and_then(|v| v.as_deref())
    }
}

pub fn normalize_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
}

/// One page of query results.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Page {
    pub records: Vec<Record>,
    pub has_more: bool,
    pub next_cursor: Option<String>,
}

/// Restricts a query to rows whose select property equals a value.
#[derive(Clone, Debug, PartialEq, Eq, serde::Deserialize)]
pub struct SelectFilter {
    pub property: String,
    pub equals: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TableQuery {
    pub table_id: String,
    pub filter: Option<SelectFilter>,
}

impl TableQuery {
    pub fn new<T: Into<String>>(table_id: T) -> Self {
        TableQuery {
            table_id: table_id.into(),
            filter: None,
        }
    }

    pub fn with_filter(mut self, filter: Option<SelectFilter>) -> Self {
        self.filter = filter;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_normalization() {
        let record = Record::new("r1")
            .with_field("message key", Some("  hello "))
            .with_field("zh-TW", Some("   "))
            .with_field::<_, &str>("ja-JP", None);

        assert_eq!(record.text("message key"), Some("hello"));
        assert_eq!(record.text("zh-TW"), None);
        assert_eq!(record.text("ja-JP"), None);
        assert_eq!(record.text("missing"), None);
        assert_eq!(record.fields.len(), 3);
    }
}
