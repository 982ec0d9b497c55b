use serde::Deserialize;
use url::Url;

pub const DEFAULT_API_VERSION: &str = "2022-06-28";

fn default_base_url() -> Url {
    // Static URL, always parses.
    Url::parse("https://api.notion.com/v1/").expect("valid default URL")
}

fn default_version() -> String {
    DEFAULT_API_VERSION.into()
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct NotionConfig {
    #[serde(default = "default_base_url")]
    pub base_url: Url,
    /// Value of the `Notion-Version` header.
    #[serde(default = "default_version")]
    pub version: String,
}

impl Default for NotionConfig {
    fn default() -> Self {
        NotionConfig {
            base_url: default_base_url(),
            version: default_version(),
        }
    }
}
