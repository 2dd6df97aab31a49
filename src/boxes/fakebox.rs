//! Fakebox: news article credibility analysis.

use crate::config::DEFAULT_TEXT_TIMEOUT;
use crate::error::BoxError;
use reqwest::Url;
use serde::{Deserialize, Serialize};

box_client!(
    /// Client for a Fakebox instance.
    Fakebox,
    "fakebox",
    DEFAULT_TEXT_TIMEOUT
);

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Analysis {
    pub title: Title,
    pub content: Content,
    pub domain: Domain,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Title {
    /// One of `impartial`, `bias` or `unsure`.
    pub decision: String,
    pub score: f64,
    pub entities: Vec<Entity>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Content {
    pub decision: String,
    pub score: f64,
    pub entities: Vec<Entity>,
    pub keywords: Vec<Keyword>,
}

/// What Fakebox knows about the site the article came from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Domain {
    pub domain: String,
    pub category: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Entity {
    #[serde(rename = "type")]
    pub kind: String,
    pub text: String,
    pub start: usize,
    pub end: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Keyword {
    pub keyword: String,
}

impl Fakebox {
    /// Analyse an article. `url` is where it was published, when known.
    pub async fn check(
        &self,
        title: &str,
        content: &str,
        url: Option<&Url>,
    ) -> Result<Analysis, BoxError> {
        let mut fields = vec![("title", title), ("content", content)];
        if let Some(url) = url {
            fields.push(("url", url.as_str()));
        }
        let builder = self.client.post(&["fakebox", "check"])?.form(&fields);
        self.client.send_or_default(builder).await
    }
}
