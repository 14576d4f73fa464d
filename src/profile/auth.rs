use reqwest::header::{HeaderName, HeaderValue};

use crate::{AdgeniusError, Result};

use super::config::ProviderAuth;
use super::env::Env;

#[derive(Clone)]
pub(crate) struct HttpAuth {
    pub(crate) header: HeaderName,
    pub(crate) value: HeaderValue,
}

impl std::fmt::Debug for HttpAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpAuth")
            .field("header", &self.header)
            .field("value", &"<redacted>")
            .finish()
    }
}

impl HttpAuth {
    pub(crate) fn header_value(header: &str, prefix: Option<&str>, token: &str) -> Result<Self> {
        let header = header.trim();
        if header.is_empty() {
            return Err(AdgeniusError::Config(
                "auth header name must be non-empty".to_string(),
            ));
        }

        let header = HeaderName::from_bytes(header.as_bytes()).map_err(|err| {
            AdgeniusError::Config(format!("invalid auth header name {header:?}: {err}"))
        })?;

        let mut out = String::new();
        if let Some(prefix) = prefix {
            out.push_str(prefix);
        }
        out.push_str(token.trim());
        let mut value = HeaderValue::from_str(&out).map_err(|err| {
            AdgeniusError::Config(format!("invalid auth header value for {header:?}: {err}"))
        })?;
        value.set_sensitive(true);

        Ok(Self { header, value })
    }

    pub(crate) fn apply(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        req.header(self.header.clone(), self.value.clone())
    }
}

/// Look up the provider key named by `auth`, or the first of `default_keys` when it names none.
pub fn resolve_api_key(auth: &ProviderAuth, env: &Env, default_keys: &[&str]) -> Result<String> {
    let keys = match auth {
        ProviderAuth::ApiKeyEnv { keys } | ProviderAuth::HttpHeaderEnv { keys, .. } => keys,
    };

    if keys.is_empty() {
        return default_keys
            .iter()
            .find_map(|key| env.get(key))
            .map(|value| value.trim().to_string())
            .ok_or_else(|| {
                AdgeniusError::Config(format!(
                    "missing api key env (tried: {})",
                    default_keys.join(", ")
                ))
            });
    }

    keys.iter()
        .find_map(|key| env.get(key.as_str()))
        .map(|value| value.trim().to_string())
        .ok_or_else(|| {
            AdgeniusError::Config(format!("missing api key env (tried: {})", keys.join(", ")))
        })
}

pub(crate) fn resolve_http_auth(
    auth: &ProviderAuth,
    env: &Env,
    default_keys: &[&str],
    default_header: &str,
) -> Result<HttpAuth> {
    let token = resolve_api_key(auth, env, default_keys)?;
    match auth {
        ProviderAuth::HttpHeaderEnv { header, prefix, .. } => {
            HttpAuth::header_value(header.as_str(), prefix.as_deref(), &token)
        }
        ProviderAuth::ApiKeyEnv { .. } => HttpAuth::header_value(default_header, None, &token),
    }
}
