use async_trait::async_trait;
use serde_json::{Map, Value};

use super::freepik_like::FreepikLikeClient;

use crate::profile::{Env, ProviderConfig};
use crate::provider::{GenerationProvider, SubmitReply};
use crate::types::{GenerationRequest, ProviderKind, ProviderStatus};
use crate::Result;

pub const DEFAULT_BASE_URL: &str = "https://api.freepik.com/v1/ai/text-to-image/imagen3";

/// Freepik Imagen3, the `classic_fast` model. Usually answers a submit with the image itself.
#[derive(Clone, Debug)]
pub struct Imagen3 {
    client: FreepikLikeClient,
}

impl Imagen3 {
    pub fn new(api_key: impl AsRef<str>) -> Self {
        Self {
            client: FreepikLikeClient::new(api_key.as_ref(), DEFAULT_BASE_URL),
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

    pub fn from_config(config: &ProviderConfig, env: &Env) -> Result<Self> {
        Ok(Self {
            client: FreepikLikeClient::from_config(config, env, DEFAULT_BASE_URL)?,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.client.base_url
    }
}

pub(crate) fn request_body(request: &GenerationRequest) -> Map<String, Value> {
    let style = request.styling.style.unwrap_or_default();
    let mut styling = Map::<String, Value>::new();
    styling.insert("style".to_string(), Value::String(style.as_str().to_string()));

    let mut body = Map::<String, Value>::new();
    body.insert("prompt".to_string(), Value::String(request.prompt.clone()));
    body.insert(
        "aspect_ratio".to_string(),
        Value::String(request.aspect_ratio.as_str().to_string()),
    );
    body.insert(
        "model".to_string(),
        Value::String(request.provider_model.as_str().to_string()),
    );
    body.insert("styling".to_string(), Value::Object(styling));
    body
}

#[async_trait]
impl GenerationProvider for Imagen3 {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Imagen3
    }

    async fn submit(&self, request: &GenerationRequest) -> Result<SubmitReply> {
        self.client
            .post_generate(self.kind().as_str(), request_body(request))
            .await
    }

    async fn status(&self, task_id: &str) -> Result<ProviderStatus> {
        self.client.get_status(self.kind().as_str(), task_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AdgeniusError;
    use crate::types::{ImageStyle, ProviderModel};
    use crate::utils::test_support::{generated_envelope, should_skip_httpmock};
    use httpmock::{Method::POST, MockServer};
    use serde_json::json;

    #[test]
    fn request_body_nests_style_and_drops_realism() {
        let request = GenerationRequest::new("cat")
            .with_model(ProviderModel::ClassicFast)
            .with_realism(true);
        let body = request_body(&request);
        assert_eq!(body.get("styling"), Some(&json!({ "style": "photo" })));
        assert_eq!(body.get("model"), Some(&json!("classic_fast")));
        assert!(!body.contains_key("realism"));
    }

    #[tokio::test]
    async fn submit_returns_generated_image_synchronously() -> Result<()> {
        if should_skip_httpmock() {
            return Ok(());
        }
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/v1/ai/text-to-image/imagen3")
                    .header("x-freepik-api-key", "fp-test")
                    .json_body(json!({
                        "prompt": "cat",
                        "aspect_ratio": "square_1_1",
                        "model": "classic_fast",
                        "styling": { "style": "watercolor" }
                    }));
                then.status(200)
                    .header("content-type", "application/json")
                    .body(generated_envelope("http://img/1.png").to_string());
            })
            .await;

        let provider =
            Imagen3::new("fp-test").with_base_url(server.url("/v1/ai/text-to-image/imagen3"));
        let request = GenerationRequest::new("cat")
            .with_model(ProviderModel::ClassicFast)
            .with_style(ImageStyle::Watercolor);
        let reply = provider.submit(&request).await?;

        mock.assert_async().await;
        assert_eq!(
            reply,
            SubmitReply::Generated {
                result: "http://img/1.png".to_string()
            }
        );
        Ok(())
    }

    #[tokio::test]
    async fn empty_envelope_is_invalid_response() -> Result<()> {
        if should_skip_httpmock() {
            return Ok(());
        }
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/imagen3");
                then.status(200)
                    .header("content-type", "application/json")
                    .body("{\"data\":{}}");
            })
            .await;

        let provider = Imagen3::new("fp-test").with_base_url(server.url("/imagen3"));
        let err = provider
            .submit(&GenerationRequest::new("cat").with_model(ProviderModel::ClassicFast))
            .await
            .unwrap_err();
        assert!(matches!(err, AdgeniusError::InvalidResponse(_)));
        Ok(())
    }
}
