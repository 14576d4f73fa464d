use std::time::Duration;

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::profile::{
    Env, HttpAuth, ProviderAuth, ProviderConfig, build_http_client, resolve_http_auth,
};
use crate::provider::SubmitReply;
use crate::types::ProviderStatus;
use crate::utils::http::send_checked_json;
use crate::{AdgeniusError, Result};

pub(crate) const API_KEY_HEADER: &str = "x-freepik-api-key";
pub(crate) const DEFAULT_KEYS: &[&str] = &["FREEPIK_API_KEY"];
pub(crate) const HTTP_TIMEOUT: Duration = Duration::from_secs(300);

pub(crate) fn default_http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(HTTP_TIMEOUT)
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}

/// `{ "data": { ... } }` envelope shared by submit and status responses.
#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    data: Option<EnvelopeData>,
}

#[derive(Debug, Default, Deserialize)]
struct EnvelopeData {
    #[serde(default)]
    task_id: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    generated: Vec<Value>,
}

impl EnvelopeData {
    fn first_generated(&self) -> Option<String> {
        self.generated.iter().find_map(|item| match item {
            Value::String(uri) if !uri.trim().is_empty() => Some(uri.clone()),
            Value::Object(obj) => obj
                .get("url")
                .and_then(Value::as_str)
                .filter(|uri| !uri.trim().is_empty())
                .map(str::to_string),
            _ => None,
        })
    }
}

#[derive(Clone, Debug)]
pub(crate) struct FreepikLikeClient {
    pub(crate) http: reqwest::Client,
    pub(crate) base_url: String,
    auth: Option<HttpAuth>,
}

impl FreepikLikeClient {
    pub(crate) fn new(api_key: &str, base_url: &str) -> Self {
        let auth = if api_key.trim().is_empty() {
            None
        } else {
            HttpAuth::header_value(API_KEY_HEADER, None, api_key).ok()
        };
        Self {
            http: default_http_client(),
            base_url: base_url.to_string(),
            auth,
        }
    }

    pub(crate) fn with_http_client(mut self, http: reqwest::Client) -> Self {
        self.http = http;
        self
    }

    pub(crate) fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub(crate) fn from_config(
        config: &ProviderConfig,
        env: &Env,
        default_base_url: &str,
    ) -> Result<Self> {
        let auth = config
            .auth
            .clone()
            .unwrap_or(ProviderAuth::ApiKeyEnv { keys: Vec::new() });
        let auth = resolve_http_auth(&auth, env, DEFAULT_KEYS, API_KEY_HEADER)?;

        let base_url = config
            .base_url
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(default_base_url);

        Ok(Self {
            http: build_http_client(config.timeout(), &config.http_headers)?,
            base_url: base_url.to_string(),
            auth: Some(auth),
        })
    }

    fn apply_auth(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let req = req.header(reqwest::header::ACCEPT, "application/json");
        match self.auth.as_ref() {
            Some(auth) => auth.apply(req),
            None => req,
        }
    }

    fn generate_url(&self) -> String {
        self.base_url.trim_end_matches('/').to_string()
    }

    fn task_url(&self, task_id: &str) -> Result<String> {
        let task_id = task_id.trim();
        if task_id.is_empty() || task_id.contains(['/', '?', '#']) {
            return Err(AdgeniusError::Validation(format!(
                "invalid task id {task_id:?}"
            )));
        }
        Ok(format!("{}/{task_id}", self.generate_url()))
    }

    pub(crate) async fn post_generate(
        &self,
        provider: &str,
        body: Map<String, Value>,
    ) -> Result<SubmitReply> {
        let req = self.apply_auth(self.http.post(self.generate_url()).json(&body));
        let envelope = send_checked_json::<Envelope>(req).await?;
        let data = envelope.data.unwrap_or_default();

        if let Some(result) = data.first_generated() {
            return Ok(SubmitReply::Generated { result });
        }
        if let Some(task_id) = data.task_id.filter(|id| !id.trim().is_empty()) {
            return Ok(SubmitReply::Queued { task_id });
        }
        Err(AdgeniusError::InvalidResponse(format!(
            "{provider} response has neither generated images nor a task id"
        )))
    }

    pub(crate) async fn get_status(&self, provider: &str, task_id: &str) -> Result<ProviderStatus> {
        let url = self.task_url(task_id)?;
        let req = self.apply_auth(self.http.get(url));
        let envelope = send_checked_json::<Envelope>(req).await?;
        let data = envelope.data.unwrap_or_default();
        parse_status(provider, task_id, &data)
    }
}

fn parse_status(provider: &str, task_id: &str, data: &EnvelopeData) -> Result<ProviderStatus> {
    let status = data.status.as_deref().map(str::trim).unwrap_or_default();
    if status.eq_ignore_ascii_case("COMPLETED") {
        return data
            .first_generated()
            .map(|result| ProviderStatus::Completed { result })
            .ok_or_else(|| {
                AdgeniusError::InvalidResponse(format!(
                    "{provider} task {task_id} is COMPLETED but has no generated image"
                ))
            });
    }
    if status.eq_ignore_ascii_case("FAILED") {
        return Ok(ProviderStatus::Failed);
    }
    Ok(ProviderStatus::Pending)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data(status: Option<&str>, generated: Vec<Value>) -> EnvelopeData {
        EnvelopeData {
            task_id: None,
            status: status.map(str::to_string),
            generated,
        }
    }

    #[test]
    fn unknown_statuses_count_as_pending() -> Result<()> {
        for status in [None, Some("CREATED"), Some("IN_PROGRESS"), Some("PENDING")] {
            assert_eq!(
                parse_status("mystic", "abc", &data(status, Vec::new()))?,
                ProviderStatus::Pending
            );
        }
        Ok(())
    }

    #[test]
    fn completed_requires_an_artifact() {
        let ok = parse_status(
            "mystic",
            "abc",
            &data(Some("COMPLETED"), vec![Value::String("http://img/2.png".into())]),
        );
        assert_eq!(
            ok.ok(),
            Some(ProviderStatus::Completed {
                result: "http://img/2.png".to_string()
            })
        );

        let missing = parse_status("mystic", "abc", &data(Some("COMPLETED"), Vec::new()));
        assert!(matches!(missing, Err(AdgeniusError::InvalidResponse(_))));
    }

    #[test]
    fn generated_accepts_url_objects() {
        let item = serde_json::json!({ "url": "http://img/3.png" });
        assert_eq!(
            data(None, vec![item]).first_generated().as_deref(),
            Some("http://img/3.png")
        );
    }

    #[test]
    fn task_url_rejects_path_injection() {
        let client = FreepikLikeClient::new("", "http://localhost/v1/ai/mystic/");
        assert_eq!(
            client.task_url("abc").ok().as_deref(),
            Some("http://localhost/v1/ai/mystic/abc")
        );
        assert!(client.task_url("../admin").is_err());
        assert!(client.task_url("  ").is_err());
    }
}
