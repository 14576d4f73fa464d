use async_trait::async_trait;
use serde_json::{Map, Value};

use super::freepik_like::FreepikLikeClient;

use crate::profile::{Env, ProviderConfig};
use crate::provider::{GenerationProvider, SubmitReply};
use crate::types::{GenerationRequest, MysticModel, ProviderKind, ProviderStatus};
use crate::Result;

pub const DEFAULT_BASE_URL: &str = "https://api.freepik.com/v1/ai/mystic";

/// Freepik Mystic: asynchronous, answers a submit with a task id to poll.
#[derive(Clone, Debug)]
pub struct Mystic {
    client: FreepikLikeClient,
    fallback_model: MysticModel,
}

impl Mystic {
    pub fn new(api_key: impl AsRef<str>) -> Self {
        Self {
            client: FreepikLikeClient::new(api_key.as_ref(), DEFAULT_BASE_URL),
            fallback_model: MysticModel::default(),
        }
    }

    pub fn with_http_client(mut self, http: reqwest::Client) -> Self {
        self.client = self.client.with_http_client(http);
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.client = self.client.with_base_url(base_url);
        self
    }

    /// Mystic model sent for `default` and any selector that is not a Mystic sub-style.
    pub fn with_fallback_model(mut self, model: MysticModel) -> Self {
        self.fallback_model = model;
        self
    }

    pub fn from_config(config: &ProviderConfig, env: &Env) -> Result<Self> {
        Ok(Self {
            client: FreepikLikeClient::from_config(config, env, DEFAULT_BASE_URL)?,
            fallback_model: MysticModel::default(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.client.base_url
    }
}

pub(crate) fn request_body(request: &GenerationRequest, fallback: MysticModel) -> Map<String, Value> {
    let model = request.provider_model.mystic_model(fallback);
    let mut body = Map::<String, Value>::new();
    body.insert("prompt".to_string(), Value::String(request.prompt.clone()));
    body.insert(
        "aspect_ratio".to_string(),
        Value::String(request.aspect_ratio.as_str().to_string()),
    );
    body.insert("model".to_string(), Value::String(model.as_str().to_string()));
    body.insert(
        "realism".to_string(),
        Value::Bool(request.styling.realism.unwrap_or(true)),
    );
    body
}

#[async_trait]
impl GenerationProvider for Mystic {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Mystic
    }

    async fn submit(&self, request: &GenerationRequest) -> Result<SubmitReply> {
        let body = request_body(request, self.fallback_model);
        self.client.post_generate(self.kind().as_str(), body).await
    }

    async fn status(&self, task_id: &str) -> Result<ProviderStatus> {
        self.client.get_status(self.kind().as_str(), task_id).await
    }
}
