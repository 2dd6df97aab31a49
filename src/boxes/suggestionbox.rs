//! Suggestionbox: reinforcement learning over a fixed set of choices.

use crate::config::DEFAULT_TIMEOUT;
use crate::error::BoxError;
use crate::features::Feature;
use crate::input::Input;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWrite;
use tracing::debug;

box_client!(
    /// Client for a Suggestionbox instance.
    Suggestionbox,
    "suggestionbox",
    DEFAULT_TIMEOUT
);

/// A model choosing between [`Choice`]s.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Model {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<ModelOptions>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub choices: Vec<Choice>,
}

impl Model {
    pub fn new(id: impl Into<String>, name: impl Into<String>, choices: Vec<Choice>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            options: None,
            choices,
        }
    }

    pub fn with_options(mut self, options: ModelOptions) -> Self {
        self.options = Some(options);
        self
    }
}

/// One of the options a model selects from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Choice {
    pub id: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub features: Vec<Feature>,
}

impl Choice {
    pub fn new(id: impl Into<String>, features: Vec<Feature>) -> Self {
        Self {
            id: id.into(),
            features,
        }
    }
}

/// Learning behaviour of a model. Zero values are left to the box defaults.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelOptions {
    /// Seconds to wait for a reward before the prediction expires.
    #[serde(skip_serializing_if = "is_zero_u64")]
    pub reward_expiration_seconds: u64,
    /// Fixed exploration ratio.
    #[serde(skip_serializing_if = "is_zero_f64")]
    pub epsilon: f64,
    /// Adaptive exploration.
    #[serde(skip_serializing_if = "is_zero_f64")]
    pub softmax_lambda: f64,
    #[serde(skip_serializing_if = "is_zero_u64")]
    pub ngrams: u64,
    #[serde(skip_serializing_if = "is_zero_u64")]
    pub skipgrams: u64,
}

fn is_zero_u64(value: &u64) -> bool {
    *value == 0
}

fn is_zero_f64(value: &f64) -> bool {
    *value == 0.0
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelStats {
    pub predictions: u64,
    pub rewards: u64,
    pub reward_ratio: f64,
    pub explores: u64,
    pub exploits: u64,
    pub explore_ratio: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictRequest {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub inputs: Vec<Feature>,
}

impl PredictRequest {
    pub fn new(inputs: Vec<Feature>) -> Self {
        Self { inputs }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PredictResponse {
    pub choices: Vec<Prediction>,
}

/// A ranked choice. Send `reward_id` back with [`Suggestionbox::reward`]
/// when the user acts on it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Prediction {
    pub id: String,
    pub reward_id: String,
    pub score: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Reward {
    pub reward_id: String,
    #[serde(default, skip_serializing_if = "is_zero_f64")]
    pub value: f64,
}

impl Reward {
    pub fn new(reward_id: impl Into<String>) -> Self {
        Self {
            reward_id: reward_id.into(),
            value: 0.0,
        }
    }

    pub fn with_value(mut self, value: f64) -> Self {
        self.value = value;
        self
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ModelsResponse {
    #[serde(alias = "Models")]
    models: Vec<Model>,
}

impl Suggestionbox {
    /// Create a model. The returned model carries the id the box assigned.
    pub async fn create_model(&self, model: &Model) -> Result<Model, BoxError> {
        let builder = self
            .client
            .json_body(self.client.post(&["suggestionbox", "models"])?, model)?;
        let created: Model = self.client.send_or_default(builder).await?;
        debug!(model_id = %created.id, "Created model");
        Ok(created)
    }

    pub async fn list_models(&self) -> Result<Vec<Model>, BoxError> {
        let builder = self.client.get(&["suggestionbox", "models"])?;
        let response: ModelsResponse = self.client.send_or_default(builder).await?;
        Ok(response.models)
    }

    pub async fn get_model(&self, model_id: &str) -> Result<Model, BoxError> {
        self.client.require(model_id, "model id")?;
        let builder = self.client.get(&["suggestionbox", "models", model_id])?;
        self.client.send_or_default(builder).await
    }

    pub async fn delete_model(&self, model_id: &str) -> Result<(), BoxError> {
        self.client.require(model_id, "model id")?;
        let builder = self.client.delete(&["suggestionbox", "models", model_id])?;
        self.client.send_unit(builder).await
    }

    pub async fn model_stats(&self, model_id: &str) -> Result<ModelStats, BoxError> {
        self.client.require(model_id, "model id")?;
        let builder = self
            .client
            .get(&["suggestionbox", "models", model_id, "stats"])?;
        self.client.send_or_default(builder).await
    }

    /// Rank the model's choices for the given inputs.
    pub async fn predict(
        &self,
        model_id: &str,
        request: &PredictRequest,
    ) -> Result<PredictResponse, BoxError> {
        self.client.require(model_id, "model id")?;
        let builder = self.client.json_body(
            self.client
                .post(&["suggestionbox", "models", model_id, "predict"])?,
            request,
        )?;
        self.client.send_or_default(builder).await
    }

    /// Reward a prediction.
    pub async fn reward(&self, model_id: &str, reward: &Reward) -> Result<(), BoxError> {
        self.client.require(model_id, "model id")?;
        self.client.require(&reward.reward_id, "reward id")?;
        let builder = self.client.json_body(
            self.client
                .post(&["suggestionbox", "models", model_id, "rewards"])?,
            reward,
        )?;
        self.client.send_unit(builder).await
    }

    pub async fn open_state(&self, model_id: &str) -> Result<Vec<u8>, BoxError> {
        self.client.require(model_id, "model id")?;
        let builder = self.client.get(&["suggestionbox", "state", model_id])?;
        self.client.download(builder).await
    }

    /// Stream the state file of a model into `writer`.
    pub async fn open_state_to<W>(&self, model_id: &str, writer: &mut W) -> Result<u64, BoxError>
    where
        W: AsyncWrite + Unpin + ?Sized,
    {
        self.client.require(model_id, "model id")?;
        let builder = self.client.get(&["suggestionbox", "state", model_id])?;
        self.client.download_to(builder, writer).await
    }

    /// Upload a state file, creating the model it holds.
    pub async fn post_state(&self, state: impl Into<Vec<u8>>) -> Result<Model, BoxError> {
        let builder = Input::bytes(state).apply(
            &self.client,
            self.client.post(&["suggestionbox", "state"])?,
            &[],
        )?;
        self.client.send_or_default(builder).await
    }

    pub async fn post_state_url(&self, url: Url) -> Result<Model, BoxError> {
        let builder = Input::url(url).apply(
            &self.client,
            self.client.post(&["suggestionbox", "state"])?,
            &[],
        )?;
        self.client.send_or_default(builder).await
    }
}
