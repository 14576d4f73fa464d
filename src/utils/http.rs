use futures_util::StreamExt;
use serde::de::DeserializeOwned;

use crate::{AdgeniusError, Result};

const MAX_ERROR_BODY_BYTES: usize = 64 * 1024;

pub(crate) async fn response_text_truncated(
    response: reqwest::Response,
    max_bytes: usize,
) -> String {
    let max_bytes = max_bytes.max(1);
    let mut out = Vec::<u8>::new();
    let mut truncated = false;

    let mut stream = response.bytes_stream();
    while let Some(next) = stream.next().await {
        let Ok(chunk) = next else {
            break;
        };
        let remaining = max_bytes.saturating_sub(out.len());
        if chunk.len() <= remaining {
            out.extend_from_slice(chunk.as_ref());
        } else {
            out.extend_from_slice(&chunk.as_ref()[..remaining]);
            truncated = true;
            break;
        }
    }

    let mut body = String::from_utf8_lossy(&out).to_string();
    if truncated {
        if !body.is_empty() {
            body.push('\n');
        }
        body.push_str("...(truncated)");
    }
    body
}

/// Send `req`; non-2xx responses become `Api` errors carrying the provider's body.
pub(crate) async fn send_checked(req: reqwest::RequestBuilder) -> Result<reqwest::Response> {
    let response = req.send().await?;
    let status = response.status();
    if !status.is_success() {
        let body = response_text_truncated(response, MAX_ERROR_BODY_BYTES).await;
        return Err(AdgeniusError::Api { status, body });
    }
    Ok(response)
}

/// Like [`send_checked`], but a 2xx body that does not decode as `T` is a provider error,
/// not a transport one.
pub(crate) async fn send_checked_json<T: DeserializeOwned>(
    req: reqwest::RequestBuilder,
) -> Result<T> {
    let response = send_checked(req).await?;
    let bytes = response.bytes().await?;
    serde_json::from_slice::<T>(&bytes).map_err(|err| {
        AdgeniusError::InvalidResponse(format!(
            "{err}: {}",
            String::from_utf8_lossy(&bytes[..bytes.len().min(512)])
        ))
    })
}
