//! Tagbox: image tagging, with custom tags learned from examples.

use crate::config::DEFAULT_TIMEOUT;
use crate::error::BoxError;
use crate::input::{Input, DEFAULT_FILE_NAME};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWrite;

box_client!(
    /// Client for a Tagbox instance.
    Tagbox,
    "tagbox",
    DEFAULT_TIMEOUT
);

/// A tag applied to an image.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tag {
    pub tag: String,
    pub confidence: f64,
    /// Id of the example that produced a custom tag.
    pub id: String,
}

/// Tags found in an image.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckResponse {
    /// Built-in tags.
    pub tags: Vec<Tag>,
    /// Tags taught with [`Tagbox::teach`].
    pub custom_tags: Vec<Tag>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SimilarResponse {
    similar: Vec<Tag>,
}

impl Tagbox {
    /// Tag an image.
    pub async fn check(&self, input: Input) -> Result<CheckResponse, BoxError> {
        let builder = input.apply(&self.client, self.client.post(&["tagbox", "check"])?, &[])?;
        self.client.send_or_default(builder).await
    }

    /// Find taught images similar to an image.
    pub async fn similar(&self, input: Input) -> Result<Vec<Tag>, BoxError> {
        let builder = input.apply(&self.client, self.client.post(&["tagbox", "similar"])?, &[])?;
        let response: SimilarResponse = self.client.send_or_default(builder).await?;
        Ok(response.similar)
    }

    /// Find taught images similar to the taught image `id`.
    pub async fn similar_id(&self, id: &str) -> Result<Vec<Tag>, BoxError> {
        self.client.require(id, "id")?;
        let builder = self
            .client
            .get(&["tagbox", "similar"])?
            .query(&[("id", id)]);
        let response: SimilarResponse = self.client.send_or_default(builder).await?;
        Ok(response.similar)
    }

    /// Teach Tagbox that an image carries the custom `tag`.
    pub async fn teach(&self, input: Input, id: &str, tag: &str) -> Result<(), BoxError> {
        let input = match input {
            Input::Bytes { data, .. } => {
                Input::file(data, if id.is_empty() { DEFAULT_FILE_NAME } else { id })
            }
            other => other,
        };
        let builder = input.apply(
            &self.client,
            self.client.post(&["tagbox", "teach"])?,
            &[("tag", tag), ("id", id)],
        )?;
        self.client.send_unit(builder).await
    }

    /// Forget the taught image `id`.
    pub async fn remove(&self, id: &str) -> Result<(), BoxError> {
        self.client.require(id, "id")?;
        let builder = self.client.delete(&["tagbox", "teach", id])?;
        self.client.send_unit(builder).await
    }

    /// Change the tag of the taught image `id`.
    pub async fn rename(&self, id: &str, tag: &str) -> Result<(), BoxError> {
        self.client.require(id, "id")?;
        self.client.require(tag, "tag")?;
        let builder = self
            .client
            .patch(&["tagbox", "teach", id])?
            .form(&[("tag", tag)]);
        self.client.send_unit(builder).await
    }

    /// Rename every taught image tagged `old_tag`.
    pub async fn rename_all(&self, old_tag: &str, new_tag: &str) -> Result<(), BoxError> {
        self.client.require(old_tag, "old tag")?;
        self.client.require(new_tag, "new tag")?;
        let builder = self
            .client
            .post(&["tagbox", "rename"])?
            .form(&[("from", old_tag), ("to", new_tag)]);
        self.client.send_unit(builder).await
    }

    pub async fn open_state(&self) -> Result<Vec<u8>, BoxError> {
        let builder = self.client.get(&["tagbox", "state"])?;
        self.client.download(builder).await
    }

    pub async fn open_state_to<W>(&self, writer: &mut W) -> Result<u64, BoxError>
    where
        W: AsyncWrite + Unpin + ?Sized,
    {
        let builder = self.client.get(&["tagbox", "state"])?;
        self.client.download_to(builder, writer).await
    }

    pub async fn post_state(&self, state: impl Into<Vec<u8>>) -> Result<(), BoxError> {
        let builder =
            Input::bytes(state).apply(&self.client, self.client.post(&["tagbox", "state"])?, &[])?;
        self.client.send_unit(builder).await
    }

    pub async fn post_state_url(&self, url: Url) -> Result<(), BoxError> {
        let builder =
            Input::url(url).apply(&self.client, self.client.post(&["tagbox", "state"])?, &[])?;
        self.client.send_unit(builder).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};

    #[test]
    fn test_check() {
        let mut server = Server::new();
        let mock = server
            .mock("POST", "/tagbox/check")
            .match_header(
                "content-type",
                Matcher::Regex("multipart/form-data.*".to_string()),
            )
            .with_status(200)
            .with_body(
                r#"{
                "success": true,
                "tags": [
                    {"tag": "monkey", "confidence": 0.8},
                    {"tag": "animal", "confidence": 0.7}
                ],
                "custom_tags": [
                    {"tag": "cheeky", "confidence": 0.9, "id": "monkey1.jpg"}
                ]
            }"#,
            )
            .create();

        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let tagbox = Tagbox::new(&server.url()).unwrap();
            let response = tagbox
                .check(Input::file(b"png".to_vec(), "monkey.png"))
                .await
                .unwrap();
            assert_eq!(response.tags.len(), 2);
            assert_eq!(response.tags[0].tag, "monkey");
            assert_eq!(response.tags[1].confidence, 0.7);
            assert_eq!(
                response.custom_tags,
                vec![Tag {
                    tag: "cheeky".to_string(),
                    confidence: 0.9,
                    id: "monkey1.jpg".to_string(),
                }]
            );
        });

        mock.assert();
    }

    #[test]
    fn test_check_base64_error() {
        let mut server = Server::new();
        let mock = server
            .mock("POST", "/tagbox/check")
            .match_body(Matcher::UrlEncoded("base64".to_string(), "aGVsbG8=".to_string()))
            .with_status(200)
            .with_body(r#"{"success":false,"error":"something went wrong"}"#)
            .create();

        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let tagbox = Tagbox::new(&server.url()).unwrap();
            let err = tagbox.check(Input::base64("aGVsbG8=")).await.unwrap_err();
            assert_eq!(err.to_string(), "tagbox: something went wrong");
        });

        mock.assert();
    }

    #[test]
    fn test_teach_url() {
        let mut server = Server::new();
        let mock = server
            .mock("POST", "/tagbox/teach")
            .match_body(Matcher::AllOf(vec![
                Matcher::UrlEncoded(
                    "url".to_string(),
                    "https://test.machinebox.io/monkey.jpg".to_string(),
                ),
                Matcher::UrlEncoded("tag".to_string(), "monkey".to_string()),
                Matcher::UrlEncoded("id".to_string(), "monkey1".to_string()),
            ]))
            .with_status(200)
            .with_body(r#"{"success":true}"#)
            .create();

        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let tagbox = Tagbox::new(&server.url()).unwrap();
            let url = Url::parse("https://test.machinebox.io/monkey.jpg").unwrap();
            tagbox.teach(Input::url(url), "monkey1", "monkey").await.unwrap();
        });

        mock.assert();
    }

    #[test]
    fn test_similar() {
        let mut server = Server::new();
        let mock = server
            .mock("POST", "/tagbox/similar")
            .with_status(200)
            .with_body(
                r#"{"success":true,"similar":[{"id":"monkey2.jpg","tag":"monkey","confidence":0.5}]}"#,
            )
            .create();

        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let tagbox = Tagbox::new(&server.url()).unwrap();
            let similar = tagbox.similar(Input::bytes(b"jpeg".to_vec())).await.unwrap();
            assert_eq!(similar.len(), 1);
            assert_eq!(similar[0].id, "monkey2.jpg");
        });

        mock.assert();
    }

    #[test]
    fn test_rename_remove_and_state() {
        let mut server = Server::new();
        let rename = server
            .mock("PATCH", "/tagbox/teach/monkey1")
            .match_body(Matcher::UrlEncoded("tag".to_string(), "ape".to_string()))
            .with_status(200)
            .with_body(r#"{"success":true}"#)
            .create();
        let rename_all = server
            .mock("POST", "/tagbox/rename")
            .match_body(Matcher::AllOf(vec![
                Matcher::UrlEncoded("from".to_string(), "monkey".to_string()),
                Matcher::UrlEncoded("to".to_string(), "ape".to_string()),
            ]))
            .with_status(200)
            .with_body(r#"{"success":true}"#)
            .create();
        let remove = server
            .mock("DELETE", "/tagbox/teach/monkey1")
            .with_status(200)
            .with_body(r#"{"success":false,"error":"not found"}"#)
            .create();
        let state = server
            .mock("GET", "/tagbox/state")
            .with_status(200)
            .with_body("(pretend this is the state file)")
            .create();

        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let tagbox = Tagbox::new(&server.url()).unwrap();
            tagbox.rename("monkey1", "ape").await.unwrap();
            tagbox.rename_all("monkey", "ape").await.unwrap();
            let err = tagbox.remove("monkey1").await.unwrap_err();
            assert_eq!(err.to_string(), "tagbox: not found");
            assert_eq!(
                tagbox.open_state().await.unwrap(),
                b"(pretend this is the state file)"
            );

            let err = tagbox.remove("").await.unwrap_err();
            assert_eq!(err.to_string(), "tagbox: id can not be empty");
        });

        rename.assert();
        rename_all.assert();
        remove.assert();
        state.assert();
    }
}
