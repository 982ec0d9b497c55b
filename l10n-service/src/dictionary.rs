//! Download of the remote JSON dictionary.
//!
//! The document maps each locale tag to an object of message key to text:
//!
//! ```text
//! { "zh-TW": { "hello": "你好" }, "en-US": { "hello": "Hello" } }
//! ```

use crate::errors::SyncError;
use async_trait::async_trait;
use notion::types::normalize_text;
use serde_json::Value;
use std::collections::BTreeMap;
use url::Url;

/// Message key to translated text for a single locale.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LocaleDictionary {
    pub locale: String,
    pub entries: BTreeMap<String, String>,
}

impl LocaleDictionary {
    /// Keys are trimmed the same way record text is, so they compare equal
    /// to indexed business keys. Blank keys are dropped.
    pub fn new<L: Into<String>>(locale: L, entries: BTreeMap<String, String>) -> Self {
        let entries = entries
            .into_iter()
            .filter_map(|(key, text)| normalize_text(Some(&key)).map(|key| (key, text)))
            .collect();

        LocaleDictionary {
            locale: locale.into(),
            entries,
        }
    }

    /// Extracts `locale` from a full dictionary document. A missing locale
    /// yields an empty dictionary; values that are not strings are ignored.
    pub fn from_document(document: &[u8], locale: &str) -> Result<Self, SyncError> {
        let parsed: Value =
            serde_json::from_slice(document).map_err(|e| SyncError::Parse(e.to_string()))?;

        let entries = match parsed.get(locale) {
            Some(Value::Object(map)) => map
                .iter()
                .filter_map(|(key, value)| value.as_str().map(|text| (key.clone(), text.to_string())))
                .collect(),
            Some(_) => {
                tracing::warn!(locale, "Dictionary locale entry is not an object");
                BTreeMap::new()
            }
            None => BTreeMap::new(),
        };

        Ok(LocaleDictionary::new(locale, entries))
    }

    /// Returns the text for `key` unless it is missing or blank.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .get(key)
            .map(String::as_str)
            .filter(|text| !text.trim().is_empty())
    }

    /// Entries with non-blank text, in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .filter(|(_, v)| !v.trim().is_empty())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
pub trait DictionarySource: Send + Sync {
    async fn fetch(&self, locale: &str) -> Result<LocaleDictionary, SyncError>;
}

/// Fetches the dictionary document with a single GET, no retries.
pub struct HttpDictionary {
    client: reqwest::Client,
    url: Url,
}

impl HttpDictionary {
    pub fn new(url: Url) -> Self {
        HttpDictionary {
            client: reqwest::Client::new(),
            url,
        }
    }
}

#[async_trait]
impl DictionarySource for HttpDictionary {
    async fn fetch(&self, locale: &str) -> Result<LocaleDictionary, SyncError> {
        let network_error = |e: reqwest::Error| SyncError::Network(format!("{}: {e}", self.url));

        let response = self
            .client
            .get(self.url.clone())
            .send()
            .await
            .map_err(network_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(SyncError::Upstream(format!(
                "HTTP error: {status} for URL: {}",
                self.url
            )));
        }

        let body = response.bytes().await.map_err(network_error)?;
        let dictionary = LocaleDictionary::from_document(&body, locale)?;

        tracing::info!(
            url = %self.url,
            locale,
            entries = dictionary.len(),
            "Fetched dictionary"
        );

        Ok(dictionary)
    }
}
