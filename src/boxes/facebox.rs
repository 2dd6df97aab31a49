//! Facebox: face detection and recognition.

use super::Rect;
use crate::config::DEFAULT_TIMEOUT;
use crate::error::BoxError;
use crate::input::{Input, DEFAULT_FILE_NAME};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWrite;
use tracing::debug;

box_client!(
    /// Client for a Facebox instance.
    ///
    /// ```no_run
    /// # async fn run() -> Result<(), machinebox::BoxError> {
    /// use machinebox::{Facebox, Input};
    ///
    /// let facebox = Facebox::new("http://localhost:8080")?;
    /// let faces = facebox.check(Input::from_path("group.jpg").await?).await?;
    /// for face in faces {
    ///     println!("{} matched={}", face.name, face.matched);
    /// }
    /// # Ok(())
    /// # }
    /// ```
    Facebox,
    "facebox",
    DEFAULT_TIMEOUT
);

/// A face found in an image.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Face {
    pub rect: Rect,
    /// Id of the taught face this face matched, if any.
    pub id: String,
    pub name: String,
    pub matched: bool,
    pub confidence: f64,
    /// Opaque face fingerprint, usable with
    /// [`Facebox::compare_faceprints`] and [`Facebox::check_faceprints`].
    pub faceprint: String,
}

/// A taught face that looks similar to the submitted one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Similar {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FacesResponse {
    faces: Vec<Face>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SimilarResponse {
    similar: Vec<Similar>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ConfidencesResponse {
    confidences: Vec<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FaceprintsResponse {
    faceprints: Vec<Face>,
}

#[derive(Debug, Serialize)]
struct CompareFaceprintsRequest<'a> {
    faceprints: &'a [String],
    target: &'a str,
}

#[derive(Debug, Serialize)]
struct CheckFaceprintsRequest<'a> {
    faceprints: &'a [String],
}

impl Facebox {
    /// Detect and recognize the faces in an image.
    pub async fn check(&self, input: Input) -> Result<Vec<Face>, BoxError> {
        let builder = input.apply(&self.client, self.client.post(&["facebox", "check"])?, &[])?;
        let response: FacesResponse = self.client.send_or_default(builder).await?;
        debug!(faces = response.faces.len(), "Facebox check complete");
        Ok(response.faces)
    }

    /// Find taught faces similar to the face in an image.
    pub async fn similar(&self, input: Input) -> Result<Vec<Similar>, BoxError> {
        let builder =
            input.apply(&self.client, self.client.post(&["facebox", "similar"])?, &[])?;
        let response: SimilarResponse = self.client.send_or_default(builder).await?;
        Ok(response.similar)
    }

    /// Find taught faces similar to the taught face `id`.
    pub async fn similar_id(&self, id: &str) -> Result<Vec<Similar>, BoxError> {
        self.client.require(id, "id")?;
        let builder = self
            .client
            .get(&["facebox", "similar"])?
            .query(&[("id", id)]);
        let response: SimilarResponse = self.client.send_or_default(builder).await?;
        Ok(response.similar)
    }

    /// Teach Facebox the face in an image.
    ///
    /// Uploaded files are named after `id`, which is how Facebox refers to
    /// the example afterwards.
    pub async fn teach(&self, input: Input, id: &str, name: &str) -> Result<(), BoxError> {
        let input = match input {
            Input::Bytes { data, .. } => {
                Input::file(data, if id.is_empty() { DEFAULT_FILE_NAME } else { id })
            }
            other => other,
        };
        let builder = input.apply(
            &self.client,
            self.client.post(&["facebox", "teach"])?,
            &[("name", name), ("id", id)],
        )?;
        self.client.send_unit(builder).await
    }

    /// Forget the taught face `id`.
    pub async fn remove(&self, id: &str) -> Result<(), BoxError> {
        self.client.require(id, "id")?;
        let builder = self.client.delete(&["facebox", "teach", id])?;
        self.client.send_unit(builder).await
    }

    /// Change the name of the taught face `id`.
    pub async fn rename(&self, id: &str, name: &str) -> Result<(), BoxError> {
        self.client.require(id, "id")?;
        self.client.require(name, "name")?;
        let builder = self
            .client
            .patch(&["facebox", "teach", id])?
            .form(&[("name", name)]);
        self.client.send_unit(builder).await
    }

    /// Rename every taught face called `old_name`.
    pub async fn rename_all(&self, old_name: &str, new_name: &str) -> Result<(), BoxError> {
        self.client.require(old_name, "old name")?;
        self.client.require(new_name, "new name")?;
        let builder = self
            .client
            .post(&["facebox", "rename"])?
            .form(&[("from", old_name), ("to", new_name)]);
        self.client.send_unit(builder).await
    }

    /// Compare `target` against each candidate faceprint. The confidences are
    /// returned in candidate order.
    pub async fn compare_faceprints(
        &self,
        target: &str,
        faceprints: &[String],
    ) -> Result<Vec<f64>, BoxError> {
        self.client.require(target, "target")?;
        let request = CompareFaceprintsRequest { faceprints, target };
        let builder = self
            .client
            .json_body(self.client.post(&["facebox", "faceprint", "compare"])?, &request)?;
        let response: ConfidencesResponse = self.client.send_or_default(builder).await?;
        Ok(response.confidences)
    }

    /// Recognize faces from their faceprints alone.
    pub async fn check_faceprints(&self, faceprints: &[String]) -> Result<Vec<Face>, BoxError> {
        if faceprints.is_empty() {
            return Err(self.client.invalid_argument("faceprints can not be empty"));
        }
        let request = CheckFaceprintsRequest { faceprints };
        let builder = self
            .client
            .json_body(self.client.post(&["facebox", "faceprint", "check"])?, &request)?;
        let response: FaceprintsResponse = self.client.send_or_default(builder).await?;
        Ok(response.faceprints)
    }

    /// Download the state file holding everything Facebox has been taught.
    pub async fn open_state(&self) -> Result<Vec<u8>, BoxError> {
        let builder = self.client.get(&["facebox", "state"])?;
        self.client.download(builder).await
    }

    /// Stream the state file into `writer` without buffering it in memory.
    pub async fn open_state_to<W>(&self, writer: &mut W) -> Result<u64, BoxError>
    where
        W: AsyncWrite + Unpin + ?Sized,
    {
        let builder = self.client.get(&["facebox", "state"])?;
        self.client.download_to(builder, writer).await
    }

    /// Replace the box state with a previously downloaded state file.
    pub async fn post_state(&self, state: impl Into<Vec<u8>>) -> Result<(), BoxError> {
        let builder =
            Input::bytes(state).apply(&self.client, self.client.post(&["facebox", "state"])?, &[])?;
        self.client.send_unit(builder).await
    }

    /// Replace the box state with the state file at `url`.
    pub async fn post_state_url(&self, url: Url) -> Result<(), BoxError> {
        let builder =
            Input::url(url).apply(&self.client, self.client.post(&["facebox", "state"])?, &[])?;
        self.client.send_unit(builder).await
    }
}
