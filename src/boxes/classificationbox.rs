//! Classificationbox: general purpose classifiers trained from examples.

use crate::config::DEFAULT_TIMEOUT;
use crate::error::BoxError;
use crate::features::Feature;
use crate::input::Input;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWrite;
use tracing::debug;

box_client!(
    /// Client for a Classificationbox instance.
    ///
    /// ```no_run
    /// # async fn run() -> Result<(), machinebox::BoxError> {
    /// use machinebox::boxes::classificationbox::{Example, Model, PredictRequest};
    /// use machinebox::{Classificationbox, Feature};
    ///
    /// let cb = Classificationbox::new("http://localhost:8080")?;
    /// let model = cb
    ///     .create_model(&Model::new("", "sentiment", ["positive", "negative"]))
    ///     .await?;
    /// cb.teach(
    ///     &model.id,
    ///     &Example::new("positive", vec![Feature::text("review", "great product")]),
    /// )
    /// .await?;
    /// let prediction = cb
    ///     .predict(&model.id, &PredictRequest::new(vec![Feature::text("review", "loved it")]))
    ///     .await?;
    /// println!("{:?}", prediction.classes);
    /// # Ok(())
    /// # }
    /// ```
    Classificationbox,
    "classificationbox",
    DEFAULT_TIMEOUT
);

/// A classifier.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Model {
    /// Assigned by the box when created without one.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<ModelOptions>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub classes: Vec<String>,
}

impl Model {
    pub fn new<I, S>(id: impl Into<String>, name: impl Into<String>, classes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            id: id.into(),
            name: name.into(),
            options: None,
            classes: classes.into_iter().map(Into::into).collect(),
        }
    }

    pub fn with_options(mut self, options: ModelOptions) -> Self {
        self.options = Some(options);
        self
    }
}

/// Text analysis settings of a model.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelOptions {
    #[serde(skip_serializing_if = "is_zero")]
    pub ngrams: u32,
    #[serde(skip_serializing_if = "is_zero")]
    pub skipgrams: u32,
}

fn is_zero(value: &u32) -> bool {
    *value == 0
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelStats {
    #[serde(alias = "Predictions")]
    pub predictions: u64,
    #[serde(alias = "Examples")]
    pub examples: u64,
    #[serde(alias = "Classes")]
    pub classes: Vec<ClassStats>,
}

/// Number of examples taught for one class.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassStats {
    #[serde(alias = "Name")]
    pub name: String,
    #[serde(alias = "Examples")]
    pub examples: u64,
}

/// A labelled example used to teach a model.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Example {
    pub class: String,
    pub inputs: Vec<Feature>,
}

impl Example {
    pub fn new(class: impl Into<String>, inputs: Vec<Feature>) -> Self {
        Self {
            class: class.into(),
            inputs,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictRequest {
    /// Maximum number of classes to return. Zero lets the box decide.
    pub limit: u32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub inputs: Vec<Feature>,
}

impl PredictRequest {
    pub fn new(inputs: Vec<Feature>) -> Self {
        Self { limit: 0, inputs }
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }
}

/// Classes ordered from most to least likely.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PredictResponse {
    pub classes: Vec<Class>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Class {
    pub id: String,
    pub score: f64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ModelsResponse {
    #[serde(alias = "Models")]
    models: Vec<Model>,
}

impl Classificationbox {
    /// Create a model. The returned model carries the id the box assigned.
    pub async fn create_model(&self, model: &Model) -> Result<Model, BoxError> {
        let builder = self
            .client
            .json_body(self.client.post(&["classificationbox", "models"])?, model)?;
        let created: Model = self.client.send_or_default(builder).await?;
        debug!(model_id = %created.id, "Created model");
        Ok(created)
    }

    pub async fn list_models(&self) -> Result<Vec<Model>, BoxError> {
        let builder = self.client.get(&["classificationbox", "models"])?;
        let response: ModelsResponse = self.client.send_or_default(builder).await?;
        Ok(response.models)
    }

    pub async fn get_model(&self, model_id: &str) -> Result<Model, BoxError> {
        self.client.require(model_id, "model id")?;
        let builder = self.client.get(&["classificationbox", "models", model_id])?;
        self.client.send_or_default(builder).await
    }

    pub async fn delete_model(&self, model_id: &str) -> Result<(), BoxError> {
        self.client.require(model_id, "model id")?;
        let builder = self
            .client
            .delete(&["classificationbox", "models", model_id])?;
        self.client.send_unit(builder).await
    }

    pub async fn model_stats(&self, model_id: &str) -> Result<ModelStats, BoxError> {
        self.client.require(model_id, "model id")?;
        let builder = self
            .client
            .get(&["classificationbox", "models", model_id, "stats"])?;
        self.client.send_or_default(builder).await
    }

    /// Teach the model one example.
    pub async fn teach(&self, model_id: &str, example: &Example) -> Result<(), BoxError> {
        self.client.require(model_id, "model id")?;
        let builder = self.client.json_body(
            self.client
                .post(&["classificationbox", "models", model_id, "teach"])?,
            example,
        )?;
        self.client.send_unit(builder).await
    }

    pub async fn predict(
        &self,
        model_id: &str,
        request: &PredictRequest,
    ) -> Result<PredictResponse, BoxError> {
        self.client.require(model_id, "model id")?;
        let builder = self.client.json_body(
            self.client
                .post(&["classificationbox", "models", model_id, "predict"])?,
            request,
        )?;
        self.client.send_or_default(builder).await
    }

    /// Download the state file of a model.
    pub async fn open_state(&self, model_id: &str) -> Result<Vec<u8>, BoxError> {
        self.client.require(model_id, "model id")?;
        let builder = self.client.get(&["classificationbox", "state", model_id])?;
        self.client.download(builder).await
    }

    /// Stream the state file of a model into `writer`.
    pub async fn open_state_to<W>(&self, model_id: &str, writer: &mut W) -> Result<u64, BoxError>
    where
        W: AsyncWrite + Unpin + ?Sized,
    {
        self.client.require(model_id, "model id")?;
        let builder = self.client.get(&["classificationbox", "state", model_id])?;
        self.client.download_to(builder, writer).await
    }

    /// Upload a state file, creating the model it holds. With `predict_only`
    /// the model can no longer be taught.
    pub async fn post_state(
        &self,
        state: impl Into<Vec<u8>>,
        predict_only: bool,
    ) -> Result<Model, BoxError> {
        let mut builder = self.client.post(&["classificationbox", "state"])?;
        if predict_only {
            builder = builder.query(&[("predict_only", "true")]);
        }
        let builder = Input::bytes(state).apply(&self.client, builder, &[])?;
        self.client.send_or_default(builder).await
    }

    pub async fn post_state_url(&self, url: Url, predict_only: bool) -> Result<Model, BoxError> {
        let fields: &[(&str, &str)] = if predict_only {
            &[("predict_only", "true")]
        } else {
            &[]
        };
        let builder = Input::url(url).apply(
            &self.client,
            self.client.post(&["classificationbox", "state"])?,
            fields,
        )?;
        self.client.send_or_default(builder).await
    }
}
