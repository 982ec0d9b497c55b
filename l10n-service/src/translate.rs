use crate::errors::SyncError;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use url::Url;

#[async_trait]
pub trait Translator: Send + Sync {
    /// Translates `text` into `target_language` (e.g. "en", "ja").
    async fn translate(&self, text: &str, target_language: &str) -> Result<String, SyncError>;
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Translation {
    translated_text: String,
}

#[derive(Deserialize)]
struct TranslationData {
    translations: Vec<Translation>,
}

#[derive(Deserialize)]
struct TranslateResponse {
    data: Option<TranslationData>,
    error: Option<Value>,
}

/// Google Cloud Translation (v2, API key auth).
pub struct GoogleTranslator {
    client: reqwest::Client,
    url: Url,
    api_key: String,
    referer: Option<String>,
}

impl GoogleTranslator {
    pub fn new<K: Into<String>>(url: Url, api_key: K, referer: Option<String>) -> Self {
        GoogleTranslator {
            client: reqwest::Client::new(),
            url,
            api_key: api_key.into(),
            referer,
        }
    }
}

#[async_trait]
impl Translator for GoogleTranslator {
    async fn translate(&self, text: &str, target_language: &str) -> Result<String, SyncError> {
        let mut request = self
            .client
            .post(self.url.clone())
            .query(&[("key", &self.api_key)])
            .json(&json!({
                "q": text,
                "target": target_language,
                "format": "text",
            }));
        if let Some(referer) = &self.referer {
            request = request.header(reqwest::header::REFERER, referer);
        }

        let response = request
            .send()
            .await
            .map_err(|e| SyncError::Network(format!("translation API: {}", e.without_url())))?;
        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| SyncError::Network(format!("translation API: {}", e.without_url())))?;

        // Error payloads are JSON too, so parse before looking at the status.
        let parsed: TranslateResponse = match serde_json::from_slice(&body) {
            Ok(parsed) => parsed,
            Err(_) if !status.is_success() => {
                return Err(SyncError::Upstream(format!(
                    "translation API returned {status}"
                )));
            }
            Err(e) => return Err(SyncError::Parse(e.to_string())),
        };

        if let Some(error) = parsed.error {
            return Err(SyncError::Upstream(format!(
                "translation API error: {error}"
            )));
        }
        if !status.is_success() {
            return Err(SyncError::Upstream(format!(
                "translation API returned {status}"
            )));
        }

        parsed
            .data
            .and_then(|data| data.translations.into_iter().next())
            .map(|translation| translation.translated_text)
            .ok_or_else(|| SyncError::Upstream("translation API returned no translations".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn translator_for(server: &MockServer) -> GoogleTranslator {
        let url = Url::parse(&format!("{}/language/translate/v2", server.uri())).unwrap();
        GoogleTranslator::new(url, "api-key", Some("https://portal.example.com".into()))
    }

    #[tokio::test]
    async fn test_translate_success() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(query_param("key", "api-key"))
            .and(header("referer", "https://portal.example.com"))
            .and(body_json(json!({"q": "你好", "target": "en", "format": "text"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {"translations": [{"translatedText": "Hello"}]}
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let text = translator_for(&mock_server)
            .translate("你好", "en")
            .await
            .unwrap();
        assert_eq!(text, "Hello");
    }

    #[tokio::test]
    async fn test_translate_error_payload() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(403).set_body_json(json!({
                "error": {"code": 403, "message": "Requests from this referer are blocked."}
            })))
            .mount(&mock_server)
            .await;

        let error = translator_for(&mock_server)
            .translate("你好", "ja")
            .await
            .unwrap_err();
        assert_eq!(error.class(), "UpstreamError");
        assert!(error.to_string().contains("referer are blocked"));
    }

    #[tokio::test]
    async fn test_translate_empty_result() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"data": {"translations": []}})),
            )
            .mount(&mock_server)
            .await;

        let error = translator_for(&mock_server)
            .translate("你好", "ja")
            .await
            .unwrap_err();
        assert!(matches!(error, SyncError::Upstream(_)));
    }
}
