//! HTTP transport shared by every box client.
//!
//! `BoxHttpClient` owns the box name, the base address and the `reqwest`
//! connection pool. Box clients build requests through it and hand them back
//! to [`BoxHttpClient::execute`], which applies the envelope protocol from
//! [`crate::envelope`]. The client holds no mutable state and is cheap to
//! clone; clones share the connection pool.

use crate::config::{ClientOptions, ACCEPT_JSON, CONTENT_TYPE_JSON};
use crate::envelope::{decode_response, trimmed_text};
use crate::error::BoxError;
use crate::status::{Info, InfoProvider};
use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Method, Request, RequestBuilder, Url};
use serde::de::{DeserializeOwned, IgnoredAny};
use serde::Serialize;
use std::sync::Arc;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::{debug, trace};

/// Executes requests against one box and decodes its responses.
#[derive(Debug, Clone)]
pub struct BoxHttpClient {
    box_name: Arc<str>,
    base: Url,
    http: reqwest::Client,
}

impl BoxHttpClient {
    /// Create a client for the box named `box_name` listening at `addr`.
    ///
    /// # Arguments
    ///
    /// * `box_name` - Name used to prefix every error message (e.g. `facebox`)
    /// * `addr` - Absolute base address of the box (e.g. `http://localhost:8080`)
    /// * `options` - Transport options (timeout, user agent)
    pub fn new(box_name: &str, addr: &str, options: &ClientOptions) -> Result<Self, BoxError> {
        let base = parse_base(box_name, addr)?;
        let http = options
            .build_http_client()
            .map_err(|e| BoxError::request(box_name, e))?;
        Ok(Self {
            box_name: Arc::from(box_name),
            base,
            http,
        })
    }

    /// Replace the underlying `reqwest::Client`, e.g. to share a pool between
    /// several boxes or to configure proxies.
    pub fn with_http_client(mut self, http: reqwest::Client) -> Self {
        self.http = http;
        self
    }

    /// Name prefixed to every error from this client.
    pub fn box_name(&self) -> &str {
        &self.box_name
    }

    /// Base address the request paths are joined onto.
    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// The underlying connection pool.
    pub fn http_client(&self) -> &reqwest::Client {
        &self.http
    }

    /// Join `segments` onto the base address. Each segment is percent-encoded,
    /// so ids can be passed verbatim.
    pub fn endpoint(&self, segments: &[&str]) -> Result<Url, BoxError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| self.invalid_address())?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Start a request to `segments` with the JSON `Accept` header set.
    pub fn request(&self, method: Method, segments: &[&str]) -> Result<RequestBuilder, BoxError> {
        let url = self.endpoint(segments)?;
        Ok(self.http.request(method, url).header(ACCEPT, ACCEPT_JSON))
    }

    /// Start a `GET` request to `segments`.
    pub fn get(&self, segments: &[&str]) -> Result<RequestBuilder, BoxError> {
        self.request(Method::GET, segments)
    }

    /// Start a `POST` request to `segments`.
    pub fn post(&self, segments: &[&str]) -> Result<RequestBuilder, BoxError> {
        self.request(Method::POST, segments)
    }

    /// Start a `PATCH` request to `segments`.
    pub fn patch(&self, segments: &[&str]) -> Result<RequestBuilder, BoxError> {
        self.request(Method::PATCH, segments)
    }

    /// Start a `DELETE` request to `segments`.
    pub fn delete(&self, segments: &[&str]) -> Result<RequestBuilder, BoxError> {
        self.request(Method::DELETE, segments)
    }

    /// Attach `body` as a UTF-8 JSON request body.
    pub fn json_body<B: Serialize + ?Sized>(
        &self,
        builder: RequestBuilder,
        body: &B,
    ) -> Result<RequestBuilder, BoxError> {
        let bytes = serde_json::to_vec(body).map_err(|source| BoxError::Encode {
            box_name: self.box_name.to_string(),
            source,
        })?;
        Ok(builder.header(CONTENT_TYPE, CONTENT_TYPE_JSON).body(bytes))
    }

    /// Perform `request` and decode the response envelope into `T`.
    ///
    /// Returns `Ok(None)` when the box answered with an empty body and a
    /// 2xx/3xx status. The response body is always read to the end.
    pub async fn execute<T: DeserializeOwned>(
        &self,
        request: Request,
    ) -> Result<Option<T>, BoxError> {
        debug!(
            box_name = %self.box_name,
            method = %request.method(),
            url = %request.url(),
            "Sending request"
        );
        let response = self
            .http
            .execute(request)
            .await
            .map_err(|e| self.transport(e))?;
        let status = response.status();
        let body = response.bytes().await.map_err(|e| self.transport(e))?;
        debug!(
            box_name = %self.box_name,
            status = status.as_u16(),
            body_len = body.len(),
            "Response received"
        );
        trace!("Response body: {}", String::from_utf8_lossy(&body));
        decode_response(&self.box_name, status, &body)
    }

    /// Build and execute `builder`.
    pub async fn send<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
    ) -> Result<Option<T>, BoxError> {
        let request = builder.build().map_err(|e| self.build_error(e))?;
        self.execute(request).await
    }

    /// Like [`send`](Self::send), but an empty body yields `T::default()`.
    pub async fn send_or_default<T: DeserializeOwned + Default>(
        &self,
        builder: RequestBuilder,
    ) -> Result<T, BoxError> {
        Ok(self.send(builder).await?.unwrap_or_default())
    }

    /// Execute `builder` when only success or failure matters.
    pub async fn send_unit(&self, builder: RequestBuilder) -> Result<(), BoxError> {
        self.send::<IgnoredAny>(builder).await.map(|_| ())
    }

    /// Execute `builder` and return the raw body of a 2xx response.
    ///
    /// Used for binary downloads such as state files. Failures are classified
    /// the same way as envelope responses.
    pub async fn download(&self, builder: RequestBuilder) -> Result<Vec<u8>, BoxError> {
        let mut body = Vec::new();
        self.download_to(builder, &mut body).await?;
        Ok(body)
    }

    /// Like [`download`](Self::download), but streams a 2xx body into
    /// `writer` chunk by chunk and returns the number of bytes written.
    ///
    /// Nothing is written when the box answers with a failure.
    pub async fn download_to<W>(
        &self,
        builder: RequestBuilder,
        writer: &mut W,
    ) -> Result<u64, BoxError>
    where
        W: AsyncWrite + Unpin + ?Sized,
    {
        let request = builder.build().map_err(|e| self.build_error(e))?;
        debug!(box_name = %self.box_name, url = %request.url(), "Downloading");
        let mut response = self
            .http
            .execute(request)
            .await
            .map_err(|e| self.transport(e))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.bytes().await.map_err(|e| self.transport(e))?;
            return match decode_response::<IgnoredAny>(&self.box_name, status, &body) {
                Err(err) => Err(err),
                Ok(_) => Err(BoxError::Http {
                    box_name: self.box_name.to_string(),
                    status: status.as_u16(),
                    body: trimmed_text(&body),
                }),
            };
        }

        let mut written = 0u64;
        while let Some(chunk) = response.chunk().await.map_err(|e| self.transport(e))? {
            writer
                .write_all(&chunk)
                .await
                .map_err(|source| self.write_error(source))?;
            written += chunk.len() as u64;
        }
        writer.flush().await.map_err(|source| self.write_error(source))?;
        debug!(box_name = %self.box_name, bytes = written, "Download complete");
        Ok(written)
    }

    /// Fetch `GET /info`. The info payload is not wrapped in the envelope.
    pub async fn info(&self) -> Result<Info, BoxError> {
        let request = self
            .get(&["info"])?
            .build()
            .map_err(|e| self.build_error(e))?;
        let response = self
            .http
            .execute(request)
            .await
            .map_err(|e| self.transport(e))?;
        let status = response.status();
        if !status.is_success() {
            return Err(BoxError::Status {
                box_name: self.box_name.to_string(),
                status,
            });
        }
        let body = response.bytes().await.map_err(|e| self.transport(e))?;
        serde_json::from_slice(&body).map_err(|source| BoxError::Decode {
            box_name: self.box_name.to_string(),
            context: "decode info",
            source,
        })
    }

    pub(crate) fn invalid_argument(&self, message: &str) -> BoxError {
        BoxError::invalid_argument(&self.box_name, message)
    }

    /// Reject an empty required argument before any request is made.
    pub(crate) fn require(&self, value: &str, name: &str) -> Result<(), BoxError> {
        if value.is_empty() {
            return Err(self.invalid_argument(&format!("{name} can not be empty")));
        }
        Ok(())
    }

    fn write_error(&self, source: std::io::Error) -> BoxError {
        BoxError::Write {
            box_name: self.box_name.to_string(),
            source,
        }
    }

    fn build_error(&self, source: reqwest::Error) -> BoxError {
        BoxError::request(&self.box_name, source)
    }

    fn transport(&self, source: reqwest::Error) -> BoxError {
        BoxError::transport(&self.box_name, source)
    }

    fn invalid_address(&self) -> BoxError {
        BoxError::InvalidAddress {
            box_name: self.box_name.to_string(),
            address: self.base.to_string(),
        }
    }
}

#[async_trait]
impl InfoProvider for BoxHttpClient {
    async fn info(&self) -> Result<Info, BoxError> {
        BoxHttpClient::info(self).await
    }
}

fn parse_base(box_name: &str, addr: &str) -> Result<Url, BoxError> {
    let invalid = || BoxError::InvalidAddress {
        box_name: box_name.to_string(),
        address: addr.to_string(),
    };
    let url = Url::parse(addr).map_err(|_| invalid())?;
    if url.cannot_be_a_base() || !matches!(url.scheme(), "http" | "https") {
        return Err(invalid());
    }
    Ok(url)
}
