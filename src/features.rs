//! Typed features used to describe inputs to the learning boxes.
//!
//! Classificationbox examples and Suggestionbox choices are both described by
//! lists of key/value features, where the type tells the box how to
//! interpret the value.

use serde::{Deserialize, Serialize};

/// A single feature, such as `age: 28` or `location: "London"`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feature {
    pub key: String,
    pub value: String,
    #[serde(rename = "type")]
    pub kind: String,
}

impl Feature {
    fn new(kind: &str, key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            kind: kind.to_string(),
        }
    }

    pub fn number(key: impl Into<String>, value: f64) -> Self {
        Self::new("number", key, format!("{value}"))
    }

    /// Text that the box tokenizes. Use [`Feature::keyword`] for values that
    /// must be kept whole.
    pub fn text(key: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new("text", key, text)
    }

    pub fn keyword(key: impl Into<String>, keyword: impl Into<String>) -> Self {
        Self::new("keyword", key, keyword)
    }

    /// Several keywords in one feature.
    pub fn list<I, S>(key: impl Into<String>, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let joined = keywords
            .into_iter()
            .map(|k| k.as_ref().to_string())
            .collect::<Vec<_>>()
            .join(",");
        Self::new("list", key, joined)
    }

    pub fn image_url(key: impl Into<String>, url: impl Into<String>) -> Self {
        Self::new("image_url", key, url)
    }

    pub fn image_base64(key: impl Into<String>, data: impl Into<String>) -> Self {
        Self::new("image_base64", key, data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feature_constructors() {
        let f = Feature::number("age", 20.0);
        assert_eq!((f.key.as_str(), f.value.as_str(), f.kind.as_str()), ("age", "20", "number"));

        let f = Feature::number("ratio", 0.25);
        assert_eq!(f.value, "0.25");

        let f = Feature::text("title", "Machine Box releases new product");
        assert_eq!(f.kind, "text");

        let f = Feature::keyword("city", "New York City");
        assert_eq!(f.kind, "keyword");
        assert_eq!(f.value, "New York City");

        let f = Feature::list("tags", ["red", "green", "blue"]);
        assert_eq!(f.kind, "list");
        assert_eq!(f.value, "red,green,blue");

        let f = Feature::image_url("avatar", "https://example.com/me.jpg");
        assert_eq!(f.kind, "image_url");

        let f = Feature::image_base64("avatar", "aGVsbG8=");
        assert_eq!(f.kind, "image_base64");
    }

    #[test]
    fn test_feature_wire_shape() {
        let json = serde_json::to_value(Feature::keyword("city", "London")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"key": "city", "value": "London", "type": "keyword"})
        );
    }
}
