//! Objectbox: object detection with custom detectors.

use super::Rect;
use crate::config::DEFAULT_TIMEOUT;
use crate::error::BoxError;
use crate::input::Input;
use reqwest::Url;
use serde::{Deserialize, Serialize};

box_client!(
    /// Client for an Objectbox instance.
    Objectbox,
    "objectbox",
    DEFAULT_TIMEOUT
);

/// Objects found in an image, grouped by detector.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckResponse {
    pub detectors: Vec<Detector>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Detector {
    pub id: String,
    pub name: String,
    pub objects: Vec<Object>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Object {
    pub rect: Rect,
    pub score: f64,
}

impl Objectbox {
    /// Run every detector over an image.
    pub async fn check(&self, input: Input) -> Result<CheckResponse, BoxError> {
        let builder =
            input.apply(&self.client, self.client.post(&["objectbox", "check"])?, &[])?;
        self.client.send_or_default(builder).await
    }

    /// Load detectors from a state file.
    pub async fn post_state(&self, state: impl Into<Vec<u8>>) -> Result<(), BoxError> {
        let builder = Input::bytes(state).apply(
            &self.client,
            self.client.post(&["objectbox", "state"])?,
            &[],
        )?;
        self.client.send_unit(builder).await
    }

    pub async fn post_state_url(&self, url: Url) -> Result<(), BoxError> {
        let builder =
            Input::url(url).apply(&self.client, self.client.post(&["objectbox", "state"])?, &[])?;
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
            .mock("POST", "/objectbox/check")
            .with_status(200)
            .with_body(
                r#"{
                "success": true,
                "detectors": [
                    {
                        "id": "det1",
                        "name": "cats",
                        "objects": [
                            {"rect": {"top": 10, "left": 20, "width": 30, "height": 40}, "score": 0.95}
                        ]
                    }
                ]
            }"#,
            )
            .create();

        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let objectbox = Objectbox::new(&server.url()).unwrap();
            let response = objectbox
                .check(Input::bytes(b"jpeg".to_vec()))
                .await
                .unwrap();
            assert_eq!(response.detectors.len(), 1);
            let detector = &response.detectors[0];
            assert_eq!(detector.name, "cats");
            assert_eq!(
                detector.objects[0],
                Object {
                    rect: Rect {
                        top: 10,
                        left: 20,
                        width: 30,
                        height: 40
                    },
                    score: 0.95,
                }
            );
        });

        mock.assert();
    }

    #[test]
    fn test_post_state_url() {
        let mut server = Server::new();
        let mock = server
            .mock("POST", "/objectbox/state")
            .match_body(Matcher::UrlEncoded(
                "url".to_string(),
                "https://test.machinebox.io/state.objectbox".to_string(),
            ))
            .with_status(200)
            .with_body(r#"{"success":false,"error":"bad state file"}"#)
            .create();

        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let objectbox = Objectbox::new(&server.url()).unwrap();
            let url = Url::parse("https://test.machinebox.io/state.objectbox").unwrap();
            let err = objectbox.post_state_url(url).await.unwrap_err();
            assert_eq!(err.to_string(), "objectbox: bad state file");
        });

        mock.assert();
    }
}
