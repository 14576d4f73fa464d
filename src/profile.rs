//! Configuration: TOML app config, dotenv-backed environment, provider auth headers.

mod auth;
mod config;
mod env;
mod http;

pub use auth::resolve_api_key;
pub(crate) use auth::{HttpAuth, resolve_http_auth};
pub use config::{AppConfig, GatewaySettings, ProviderAuth, ProviderConfig};
pub use env::{Env, parse_dotenv};
pub(crate) use http::build_http_client;

#[cfg(test)]
mod tests;
