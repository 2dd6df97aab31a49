//! Nudebox: nudity detection.

use crate::config::DEFAULT_TIMEOUT;
use crate::error::BoxError;
use crate::input::Input;
use serde::Deserialize;

box_client!(
    /// Client for a Nudebox instance.
    Nudebox,
    "nudebox",
    DEFAULT_TIMEOUT
);

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CheckResponse {
    nude: f64,
}

impl Nudebox {
    /// Probability, between 0 and 1, that the image contains nudity.
    pub async fn check(&self, input: Input) -> Result<f64, BoxError> {
        let builder = input.apply(&self.client, self.client.post(&["nudebox", "check"])?, &[])?;
        let response: CheckResponse = self.client.send_or_default(builder).await?;
        Ok(response.nude)
    }
}
