use std::collections::BTreeMap;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};

use crate::{AdgeniusError, Result};

/// Extra headers from `http_headers` config. Blank names are ignored.
pub(super) fn header_map_from_pairs(headers: &BTreeMap<String, String>) -> Result<HeaderMap> {
    headers
        .iter()
        .map(|(name, value)| (name.trim(), value))
        .filter(|(name, _)| !name.is_empty())
        .map(|(name, value)| {
            let header_name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|err| AdgeniusError::Config(format!("http_headers.{name}: {err}")))?;
            let header_value = HeaderValue::from_str(value)
                .map_err(|err| AdgeniusError::Config(format!("http_headers.{name}: {err}")))?;
            Ok((header_name, header_value))
        })
        .collect()
}

pub(crate) fn build_http_client(
    timeout: Duration,
    headers: &BTreeMap<String, String>,
) -> Result<reqwest::Client> {
    let mut builder = reqwest::Client::builder().timeout(timeout);
    if !headers.is_empty() {
        builder = builder.default_headers(header_map_from_pairs(headers)?);
    }
    builder.build().map_err(AdgeniusError::Http)
}
