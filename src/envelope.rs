//! The `{success, error}` envelope shared by every box response.
//!
//! Decoding is split from the HTTP call so the decision table can be
//! exercised without a server: [`decode_response`] takes the status and raw
//! body of a finished response and either yields the caller's payload or a
//! classified [`BoxError`].

use crate::error::BoxError;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;

/// The envelope fields of a box response, with the payload ignored.
#[derive(Debug, Default, Deserialize)]
pub struct Envelope {
    #[serde(default, alias = "Success")]
    pub success: bool,
    #[serde(default, alias = "Error")]
    pub error: Option<String>,
}

/// Whether the status counts as a successful response for the envelope
/// protocol. Redirect codes are accepted; they only reach us when the
/// transport did not follow them.
pub fn status_in_range(status: StatusCode) -> bool {
    (200..400).contains(&status.as_u16())
}

/// Applies the envelope protocol to a complete response.
///
/// Returns `Ok(None)` for an empty body with an in-range status, which is how
/// delete and patch style endpoints acknowledge a request.
pub fn decode_response<T: DeserializeOwned>(
    box_name: &str,
    status: StatusCode,
    body: &[u8],
) -> Result<Option<T>, BoxError> {
    if body.is_empty() {
        if !status_in_range(status) {
            return Err(BoxError::Status {
                box_name: box_name.to_string(),
                status,
            });
        }
        return Ok(None);
    }

    // A `null` body is an envelope with nothing set.
    let envelope = match serde_json::from_slice::<Option<Envelope>>(body) {
        Ok(envelope) => envelope.unwrap_or_default(),
        Err(source) => {
            if !status_in_range(status) {
                return Err(BoxError::Http {
                    box_name: box_name.to_string(),
                    status: status.as_u16(),
                    body: trimmed_text(body),
                });
            }
            return Err(BoxError::Decode {
                box_name: box_name.to_string(),
                context: "decode common response data",
                source,
            });
        }
    };

    if !envelope.success {
        let message = match envelope.error {
            Some(message) if !message.is_empty() => message,
            _ => format!("{}: {}", status.as_u16(), trimmed_text(body)),
        };
        return Err(BoxError::Service {
            box_name: box_name.to_string(),
            message,
        });
    }

    serde_json::from_slice(body)
        .map(Some)
        .map_err(|source| BoxError::Decode {
            box_name: box_name.to_string(),
            context: "decode response data",
            source,
        })
}

pub(crate) fn trimmed_text(body: &[u8]) -> String {
    String::from_utf8_lossy(body).trim().to_string()
}
