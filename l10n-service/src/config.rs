use crate::reconcile::Overwrite;
use indexmap::IndexMap;
use notion::SelectFilter;
use notion::config::NotionConfig;
use serde::Deserialize;
use std::collections::HashSet;
use thiserror::Error;
use url::Url;

pub const NOTION_TOKEN_VAR: &str = "NOTION_TOKEN";
pub const NOTION_DATABASE_ID_VAR: &str = "NOTION_DATABASE_ID";
pub const GOOGLE_API_KEY_VAR: &str = "GOOGLE_API_KEY";

#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Port cannot be 0")]
    InvalidPort,

    #[error("Duplicate route: {0}")]
    DuplicateRoute(String),

    #[error("Route path must start with '/': {0}")]
    InvalidPath(String),

    #[error("Route {0} has an empty field name")]
    EmptyField(String),

    #[error("Export route {0} lists no locales")]
    EmptyLocales(String),

    #[error("Translate route {0} lists no targets")]
    EmptyTargets(String),

    #[error("Environment variable {0} is not set")]
    MissingVariable(&'static str),
}

/// HTTP methods supported for route matching
#[derive(Clone, Debug, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl PartialEq<http::Method> for HttpMethod {
    fn eq(&self, other: &http::Method) -> bool {
        let expected = match self {
            HttpMethod::Get => http::Method::GET,
            HttpMethod::Post => http::Method::POST,
            HttpMethod::Put => http::Method::PUT,
            HttpMethod::Delete => http::Method::DELETE,
        };
        expected == *other
    }
}

fn default_business_key() -> String {
    "message key".into()
}

/// Service configuration
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Config {
    /// Main listener for handler requests
    pub listener: Listener,
    /// Admin listener for health and readiness probes
    pub admin_listener: Listener,
    #[serde(default)]
    pub notion: NotionConfig,
    pub dictionary: DictionaryConfig,
    #[serde(default)]
    pub translation: TranslationConfig,
    /// Name of the field holding the message key of each record
    #[serde(default = "default_business_key")]
    pub business_key: String,
    pub routes: Vec<Route>,
}

impl Config {
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.listener.validate()?;
        self.admin_listener.validate()?;

        if self.business_key.trim().is_empty() {
            return Err(ValidationError::EmptyField("business_key".into()));
        }

        let mut seen = HashSet::new();
        for route in &self.routes {
            let path = &route.r#match.path;
            if !path.starts_with('/') {
                return Err(ValidationError::InvalidPath(path.clone()));
            }
            if !seen.insert((path, route.r#match.method.clone())) {
                return Err(ValidationError::DuplicateRoute(path.clone()));
            }
            route.action.validate(path)?;
        }

        Ok(())
    }

    pub fn needs_translator(&self) -> bool {
        self.routes
            .iter()
            .any(|route| matches!(route.action, HandlerAction::Translate(_)))
    }
}

/// Network listener configuration
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Listener {
    pub host: String,
    pub port: u16,
}

impl Listener {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.port == 0 {
            return Err(ValidationError::InvalidPort);
        }
        Ok(())
    }
}

/// Where the remote JSON dictionary is downloaded from
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct DictionaryConfig {
    pub url: Url,
}

fn default_translation_url() -> Url {
    // Static URL, always parses.
    Url::parse("https://translation.googleapis.com/language/translate/v2")
        .expect("valid default URL")
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct TranslationConfig {
    #[serde(default = "default_translation_url")]
    pub url: Url,
    /// Sent as the `Referer` header for API keys restricted to a website.
    pub referer: Option<String>,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        TranslationConfig {
            url: default_translation_url(),
            referer: None,
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Route {
    pub r#match: Match,
    pub action: HandlerAction,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Match {
    /// Exact request path, e.g. "/api/fetch-l10n"
    pub path: String,
    /// Any method matches when unset
    pub method: Option<HttpMethod>,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(tag = "handler", rename_all = "snake_case")]
pub enum HandlerAction {
    /// Copy one locale of the remote dictionary into a table field
    SyncDictionary(DictionarySync),
    /// Machine-translate a source field into empty target fields
    Translate(TranslateSettings),
    /// Download every locale as a zip of JSON documents
    Export(ExportSettings),
}

impl HandlerAction {
    pub fn name(&self) -> &'static str {
        match self {
            HandlerAction::SyncDictionary(_) => "sync_dictionary",
            HandlerAction::Translate(_) => "translate",
            HandlerAction::Export(_) => "export",
        }
    }

    fn validate(&self, path: &str) -> Result<(), ValidationError> {
        let empty_field = || ValidationError::EmptyField(path.to_string());

        match self {
            HandlerAction::SyncDictionary(sync) => {
                if sync.locale.is_empty() || sync.target_field.is_empty() {
                    return Err(empty_field());
                }
            }
            HandlerAction::Translate(settings) => {
                if settings.source_field.is_empty() {
                    return Err(empty_field());
                }
                if settings.targets.is_empty() {
                    return Err(ValidationError::EmptyTargets(path.to_string()));
                }
                if settings
                    .targets
                    .iter()
                    .any(|t| t.field.is_empty() || t.language.is_empty())
                {
                    return Err(empty_field());
                }
            }
            HandlerAction::Export(settings) => {
                if settings.locales.is_empty() {
                    return Err(ValidationError::EmptyLocales(path.to_string()));
                }
                if settings.locales.values().any(String::is_empty) {
                    return Err(empty_field());
                }
            }
        }
        Ok(())
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct DictionarySync {
    /// Locale key in the remote dictionary, e.g. "zh-TW"
    pub locale: String,
    /// Table field receiving the dictionary text
    pub target_field: String,
    #[serde(default)]
    pub overwrite: Overwrite,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct TranslationTarget {
    pub field: String,
    /// Language code understood by the translation API, e.g. "en"
    pub language: String,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct TranslateSettings {
    pub source_field: String,
    pub targets: Vec<TranslationTarget>,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct ExportSettings {
    /// Locale tag to table field, in archive order
    pub locales: IndexMap<String, String>,
    pub filter: Option<SelectFilter>,
}

/// Secrets read from the environment once at startup.
#[derive(Clone)]
pub struct Credentials {
    pub notion_token: String,
    pub table_id: String,
    pub translation_api_key: Option<String>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("table_id", &self.table_id)
            .finish_non_exhaustive()
    }
}

impl Credentials {
    pub fn from_env() -> Result<Self, ValidationError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ValidationError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &'static str| {
            lookup(name)
                .filter(|v| !v.is_empty())
                .ok_or(ValidationError::MissingVariable(name))
        };

        Ok(Credentials {
            notion_token: required(NOTION_TOKEN_VAR)?,
            table_id: required(NOTION_DATABASE_ID_VAR)?,
            translation_api_key: lookup(GOOGLE_API_KEY_VAR).filter(|v| !v.is_empty()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const CONFIG_YAML: &str = r#"
listener:
    host: "0.0.0.0"
    port: 3000
admin_listener:
    host: "127.0.0.1"
    port: 3001
dictionary:
    url: "https://l10n.example.com/all_lang.json"
translation:
    referer: "https://portal.example.com"
routes:
    - match:
        path: /api/fetch-l10n
        method: GET
      action:
        handler: sync_dictionary
        locale: zh-TW
        target_field: zh-TW
    - match:
        path: /api/sync-l10n
      action:
        handler: sync_dictionary
        locale: zh-TW
        target_field: zh-TW
        overwrite: always
    - match:
        path: /api/translate-notion
      action:
        handler: translate
        source_field: l10n-zh-tw
        targets:
          - field: manual-en-US
            language: en
          - field: manual-ja-JP
            language: ja
    - match:
        path: /api/fetch-notion-locale
      action:
        handler: export
        locales:
          zh-TW: l10n-zh-tw
          en-US: manual-en-US
          ja-JP: manual-ja-JP
        filter:
          property: product
          equals: Portal
"#;

    #[test]
    fn test_parse_valid_config() {
        let config: Config = serde_yaml::from_str(CONFIG_YAML).unwrap();
        assert!(config.validate().is_ok());

        assert_eq!(config.listener.port, 3000);
        assert_eq!(config.business_key, "message key");
        assert_eq!(config.notion, NotionConfig::default());
        assert_eq!(
            config.translation.referer.as_deref(),
            Some("https://portal.example.com")
        );
        assert_eq!(config.routes.len(), 4);
        assert_eq!(config.routes[0].r#match.method, Some(HttpMethod::Get));
        assert!(config.needs_translator());

        match &config.routes[0].action {
            HandlerAction::SyncDictionary(sync) => {
                assert_eq!(sync.overwrite, Overwrite::IfEmpty);
            }
            other => panic!("unexpected action {other:?}"),
        }
        match &config.routes[1].action {
            HandlerAction::SyncDictionary(sync) => {
                assert_eq!(sync.overwrite, Overwrite::Always);
            }
            other => panic!("unexpected action {other:?}"),
        }
        match &config.routes[3].action {
            HandlerAction::Export(export) => {
                let locales: Vec<_> = export.locales.keys().map(String::as_str).collect();
                assert_eq!(locales, ["zh-TW", "en-US", "ja-JP"]);
                assert_eq!(export.filter.as_ref().unwrap().equals, "Portal");
            }
            other => panic!("unexpected action {other:?}"),
        }
    }

    #[test]
    fn test_validation_errors() {
        let base_config: Config = serde_yaml::from_str(CONFIG_YAML).unwrap();

        let mut config = base_config.clone();
        config.admin_listener.port = 0;
        assert!(matches!(
            config.validate().unwrap_err(),
            ValidationError::InvalidPort
        ));

        let mut config = base_config.clone();
        config.routes.push(config.routes[2].clone());
        assert!(matches!(
            config.validate().unwrap_err(),
            ValidationError::DuplicateRoute(_)
        ));

        let mut config = base_config.clone();
        config.routes[0].r#match.path = "api".into();
        assert!(matches!(
            config.validate().unwrap_err(),
            ValidationError::InvalidPath(_)
        ));

        let mut config = base_config.clone();
        if let HandlerAction::Translate(settings) = &mut config.routes[2].action {
            settings.targets.clear();
        }
        assert!(matches!(
            config.validate().unwrap_err(),
            ValidationError::EmptyTargets(_)
        ));

        let mut config = base_config;
        if let HandlerAction::Export(settings) = &mut config.routes[3].action {
            settings.locales.clear();
        }
        assert!(matches!(
            config.validate().unwrap_err(),
            ValidationError::EmptyLocales(_)
        ));
    }

    #[test]
    fn test_deserialization_errors() {
        // Unknown handler
        assert!(
            serde_yaml::from_str::<HandlerAction>("handler: delete_everything").is_err()
        );

        // Unknown overwrite policy
        assert!(
            serde_yaml::from_str::<HandlerAction>(
                "{handler: sync_dictionary, locale: zh-TW, target_field: zh-TW, overwrite: sometimes}"
            )
            .is_err()
        );

        // Invalid dictionary URL
        assert!(serde_yaml::from_str::<DictionaryConfig>("url: not-a-url").is_err());
    }

    #[test]
    fn test_credentials() {
        let env = HashMap::from([
            (NOTION_TOKEN_VAR, "secret"),
            (NOTION_DATABASE_ID_VAR, "db-1"),
        ]);
        let credentials =
            Credentials::from_lookup(|name| env.get(name).map(|v| v.to_string())).unwrap();
        assert_eq!(credentials.table_id, "db-1");
        assert_eq!(credentials.translation_api_key, None);
        assert!(!format!("{credentials:?}").contains("secret"));

        let missing = Credentials::from_lookup(|_| None).unwrap_err();
        assert!(matches!(
            missing,
            ValidationError::MissingVariable(NOTION_TOKEN_VAR)
        ));
    }
}
