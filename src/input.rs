//! Media inputs accepted by the box endpoints.
//!
//! Most check, teach and state endpoints accept the same three shapes: an
//! uploaded file (multipart `file` field), a remote URL (`url` form field)
//! or inline base64 data (`base64` form field).

use crate::client::BoxHttpClient;
use crate::error::BoxError;
use reqwest::multipart::{Form, Part};
use reqwest::{RequestBuilder, Url};
use std::path::Path;
use tracing::debug;

/// File name used for uploads that do not carry one.
pub const DEFAULT_FILE_NAME: &str = "image.dat";

/// Media to submit to a box.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    /// Raw file contents, uploaded as multipart form data.
    Bytes { data: Vec<u8>, file_name: String },
    /// A URL the box downloads itself.
    Url(Url),
    /// Base64 encoded file contents.
    Base64(String),
}

impl Input {
    pub fn bytes(data: impl Into<Vec<u8>>) -> Self {
        Self::file(data, DEFAULT_FILE_NAME)
    }

    /// Raw contents with an explicit file name. The name drives the content
    /// type of the uploaded part.
    pub fn file(data: impl Into<Vec<u8>>, file_name: impl Into<String>) -> Self {
        Input::Bytes {
            data: data.into(),
            file_name: file_name.into(),
        }
    }

    /// Read a local file.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self, BoxError> {
        let path = path.as_ref();
        let data = tokio::fs::read(path).await.map_err(|source| BoxError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| DEFAULT_FILE_NAME.to_string());
        debug!(path = %path.display(), size = data.len(), "Loaded input file");
        Ok(Self::file(data, file_name))
    }

    pub fn url(url: Url) -> Self {
        Input::Url(url)
    }

    pub fn base64(data: impl Into<String>) -> Self {
        Input::Base64(data.into())
    }

    pub fn file_name(&self) -> Option<&str> {
        match self {
            Input::Bytes { file_name, .. } => Some(file_name),
            _ => None,
        }
    }

    /// Attach this input, plus any extra text `fields`, as the request body.
    ///
    /// Files become a `multipart/form-data` body with the contents in the
    /// `file` part. URLs and base64 data become an url-encoded form.
    pub(crate) fn apply(
        self,
        client: &BoxHttpClient,
        builder: RequestBuilder,
        fields: &[(&str, &str)],
    ) -> Result<RequestBuilder, BoxError> {
        match self {
            Input::Bytes { data, file_name } => {
                let mime = mime_guess::from_path(&file_name).first_or_octet_stream();
                let part = Part::bytes(data)
                    .file_name(file_name)
                    .mime_str(mime.essence_str())
                    .map_err(|e| BoxError::request(client.box_name(), e))?;
                let form = fields.iter().fold(Form::new().part("file", part), |form, (k, v)| {
                    form.text(k.to_string(), v.to_string())
                });
                Ok(builder.multipart(form))
            }
            Input::Url(url) => Ok(builder.form(&form_fields("url", url.as_str(), fields))),
            Input::Base64(data) => Ok(builder.form(&form_fields("base64", &data, fields))),
        }
    }
}

impl From<Url> for Input {
    fn from(url: Url) -> Self {
        Input::Url(url)
    }
}

fn form_fields<'a>(
    key: &'a str,
    value: &'a str,
    fields: &[(&'a str, &'a str)],
) -> Vec<(&'a str, &'a str)> {
    let mut pairs = Vec::with_capacity(fields.len() + 1);
    pairs.push((key, value));
    pairs.extend_from_slice(fields);
    pairs
}
