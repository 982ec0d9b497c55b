use crate::config::NotionConfig;
use crate::source::{RecordSource, SourceError};
use crate::types::{FieldValues, Page, Record, TableQuery};
use async_trait::async_trait;
use reqwest::{Method, RequestBuilder};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value, json};
use std::collections::HashMap;
use url::Url;

// Notion rejects rich text fragments longer than this.
const MAX_FRAGMENT_CHARS: usize = 2000;

#[derive(Deserialize)]
struct TextContent {
    content: String,
}

#[derive(Deserialize)]
struct RichText {
    plain_text: Option<String>,
    text: Option<TextContent>,
}

impl RichText {
    fn as_str(&self) -> &str {
        match (&self.text, &self.plain_text) {
            (Some(text), _) => &text.content,
            (None, Some(plain)) => plain,
            (None, None) => "",
        }
    }
}

fn join_fragments(fragments: &[RichText]) -> String {
    fragments.iter().map(RichText::as_str).collect()
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum PropertyValue {
    RichText { rich_text: Vec<RichText> },
    Title { title: Vec<RichText> },
    #[serde(other)]
    Unsupported,
}

#[derive(Deserialize)]
struct PageObject {
    id: String,
    #[serde(default)]
    properties: HashMap<String, PropertyValue>,
}

impl From<PageObject> for Record {
    fn from(page: PageObject) -> Self {
        let mut record = Record::new(page.id);
        for (name, value) in page.properties {
            let text = match value {
                PropertyValue::RichText { rich_text } => join_fragments(&rich_text),
                PropertyValue::Title { title } => join_fragments(&title),
                // Only text properties take part in the sync.
                PropertyValue::Unsupported => continue,
            };
            record.set(name, Some(text.as_str()));
        }
        record
    }
}

#[derive(Deserialize)]
struct QueryResponse {
    results: Vec<PageObject>,
    has_more: bool,
    next_cursor: Option<String>,
}

#[derive(Deserialize)]
struct CreatedPage {
    id: String,
}

#[derive(Deserialize)]
struct DatabaseObject {
    #[serde(default)]
    title: Vec<RichText>,
}

/// Splits text into fragments the API accepts.
fn fragments(text: &str) -> Vec<Value> {
    let chars: Vec<char> = text.chars().collect();
    if chars.is_empty() {
        return Vec::new();
    }

    chars
        .chunks(MAX_FRAGMENT_CHARS)
        .map(|chunk| {
            let content: String = chunk.iter().collect();
            json!({ "text": { "content": content } })
        })
        .collect()
}

fn rich_text_properties(fields: &FieldValues) -> Value {
    let properties: Map<String, Value> = fields
        .iter()
        .map(|(name, text)| (name.clone(), json!({ "rich_text": fragments(text) })))
        .collect();

    Value::Object(properties)
}

/// Client for the Notion REST API.
pub struct NotionClient {
    client: reqwest::Client,
    base_url: Url,
    token: String,
    version: String,
}

impl NotionClient {
    pub fn new<T: Into<String>>(config: &NotionConfig, token: T) -> Self {
        let mut base_url = config.base_url.clone();
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        NotionClient {
            client: reqwest::Client::new(),
            base_url,
            token: token.into(),
            version: config.version.clone(),
        }
    }

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, SourceError> {
        let url = self.base_url.join(path)?;
        Ok(self
            .client
            .request(method, url)
            .bearer_auth(&self.token)
            .header("Notion-Version", &self.version))
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, SourceError> {
        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), body = %body, "Notion request failed");
            return Err(SourceError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[async_trait]
impl RecordSource for NotionClient {
    async fn query(&self, query: &TableQuery, cursor: Option<&str>) -> Result<Page, SourceError> {
        let mut body = Map::new();
        if let Some(cursor) = cursor {
            body.insert("start_cursor".into(), json!(cursor));
        }
        if let Some(filter) = &query.filter {
            body.insert(
                "filter".into(),
                json!({
                    "property": filter.property,
                    "select": { "equals": filter.equals },
                }),
            );
        }

        let request = self
            .request(Method::POST, &format!("databases/{}/query", query.table_id))?
            .json(&body);
        let response: QueryResponse = self.send(request).await?;

        Ok(Page {
            records: response.results.into_iter().map(Record::from).collect(),
            has_more: response.has_more,
            next_cursor: response.next_cursor,
        })
    }

    async fn create(&self, table_id: &str, fields: &FieldValues) -> Result<String, SourceError> {
        let body = json!({
            "parent": { "database_id": table_id },
            "properties": rich_text_properties(fields),
        });

        let request = self.request(Method::POST, "pages")?.json(&body);
        let created: CreatedPage = self.send(request).await?;
        Ok(created.id)
    }

    async fn update(&self, record_id: &str, fields: &FieldValues) -> Result<(), SourceError> {
        let body = json!({ "properties": rich_text_properties(fields) });

        let request = self
            .request(Method::PATCH, &format!("pages/{record_id}"))?
            .json(&body);
        // The updated page is echoed back; only the status matters.
        let _: Value = self.send(request).await?;
        Ok(())
    }

    async fn title(&self, table_id: &str) -> Result<String, SourceError> {
        let request = self.request(Method::GET, &format!("databases/{table_id}"))?;
        let database: DatabaseObject = self.send(request).await?;
        Ok(join_fragments(&database.title))
    }
}
