use crate::dictionary::{DictionarySource, LocaleDictionary};
use crate::errors::SyncError;
use crate::translate::Translator;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Mutex;

/// Serves a fixed dictionary document.
pub struct StaticDictionary {
    document: serde_json::Value,
}

impl StaticDictionary {
    pub fn new(document: serde_json::Value) -> Self {
        StaticDictionary { document }
    }

    /// Shorthand for a document holding a single locale.
    pub fn single(locale: &str, entries: &[(&str, &str)]) -> Self {
        let entries: BTreeMap<&str, &str> = entries.iter().copied().collect();
        let mut document = serde_json::Map::new();
        document.insert(locale.to_string(), serde_json::json!(entries));
        Self::new(serde_json::Value::Object(document))
    }
}

#[async_trait]
impl DictionarySource for StaticDictionary {
    async fn fetch(&self, locale: &str) -> Result<LocaleDictionary, SyncError> {
        let bytes = serde_json::to_vec(&self.document).map_err(|e| SyncError::Parse(e.to_string()))?;
        LocaleDictionary::from_document(&bytes, locale)
    }
}

/// Always fails as if the dictionary host were unreachable.
pub struct UnreachableDictionary;

#[async_trait]
impl DictionarySource for UnreachableDictionary {
    async fn fetch(&self, _locale: &str) -> Result<LocaleDictionary, SyncError> {
        Err(SyncError::Network("dictionary host".into()))
    }
}

/// Returns `[<language>] <text>` and records every call.
#[derive(Default)]
pub struct FakeTranslator {
    calls: Mutex<Vec<(String, String)>>,
    fail: bool,
}

impl FakeTranslator {
    pub fn failing() -> Self {
        FakeTranslator {
            fail: true,
            ..Default::default()
        }
    }

    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Translator for FakeTranslator {
    async fn translate(&self, text: &str, target_language: &str) -> Result<String, SyncError> {
        self.calls
            .lock()
            .unwrap()
            .push((text.to_string(), target_language.to_string()));

        if self.fail {
            return Err(SyncError::Upstream("translation quota exceeded".into()));
        }
        Ok(format!("[{target_language}] {text}"))
    }
}
