//! Textbox: sentiment, entity and keyword extraction from text.

use crate::config::DEFAULT_TEXT_TIMEOUT;
use crate::error::BoxError;
use serde::{Deserialize, Serialize};

box_client!(
    /// Client for a Textbox instance.
    Textbox,
    "textbox",
    DEFAULT_TEXT_TIMEOUT
);

/// Result of analysing a body of text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Analysis {
    pub sentences: Vec<Sentence>,
    pub keywords: Vec<Keyword>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Sentence {
    pub text: String,
    /// Byte offsets of the sentence in the submitted text.
    pub start: usize,
    pub end: usize,
    /// Sentiment from 0 (negative) to 1 (positive).
    pub sentiment: f64,
    pub entities: Vec<Entity>,
}

/// A named entity such as a person, place or date.
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

impl Textbox {
    /// Analyse `text`.
    pub async fn check(&self, text: &str) -> Result<Analysis, BoxError> {
        let builder = self
            .client
            .post(&["textbox", "check"])?
            .form(&[("text", text)]);
        self.client.send_or_default(builder).await
    }
}
