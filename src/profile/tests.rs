use std::collections::BTreeMap;
use std::io::Write;

use crate::types::{MysticModel, ProviderModel};
use crate::{AdgeniusError, Result};

use super::http::header_map_from_pairs;
use super::*;

fn env_with(key: &str, value: &str) -> Env {
    Env {
        dotenv: BTreeMap::from([(key.to_string(), value.to_string())]),
    }
}

#[test]
fn resolves_api_key_from_default_keys() -> Result<()> {
    let env = env_with("ADGENIUS_TEST_KEY", " fp-test ");
    let auth = ProviderAuth::ApiKeyEnv { keys: Vec::new() };
    let token = resolve_api_key(&auth, &env, &["ADGENIUS_MISSING_KEY", "ADGENIUS_TEST_KEY"])?;
    assert_eq!(token, "fp-test");
    Ok(())
}

#[test]
fn missing_api_key_lists_tried_names() {
    let auth = ProviderAuth::ApiKeyEnv {
        keys: vec!["ADGENIUS_NOT_SET_ANYWHERE".to_string()],
    };
    let err = resolve_api_key(&auth, &Env::default(), &["FREEPIK_API_KEY"]).unwrap_err();
    match err {
        AdgeniusError::Config(message) => assert!(message.contains("ADGENIUS_NOT_SET_ANYWHERE")),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn resolves_custom_header_auth() -> Result<()> {
    let env = env_with("ADGENIUS_TEST_KEY", "fp-test");
    let auth = ProviderAuth::HttpHeaderEnv {
        header: "authorization".to_string(),
        keys: vec!["ADGENIUS_TEST_KEY".to_string()],
        prefix: Some("Bearer ".to_string()),
    };
    let resolved = resolve_http_auth(&auth, &env, &[], "x-freepik-api-key")?;
    assert_eq!(resolved.header.as_str(), "authorization");
    assert_eq!(resolved.value.to_str().unwrap_or_default(), "Bearer fp-test");
    assert!(!format!("{resolved:?}").contains("fp-test"));
    Ok(())
}

#[test]
fn api_key_env_uses_default_header() -> Result<()> {
    let env = env_with("FREEPIK_API_KEY", "fp-test");
    let auth = ProviderAuth::ApiKeyEnv { keys: Vec::new() };
    let resolved = resolve_http_auth(&auth, &env, &["FREEPIK_API_KEY"], "x-freepik-api-key")?;
    assert_eq!(resolved.header.as_str(), "x-freepik-api-key");
    assert!(resolved.value.is_sensitive());
    Ok(())
}

#[test]
fn parses_dotenv_basic() {
    let parsed = parse_dotenv(
        r#"
# comment
export FREEPIK_API_KEY="fp-123"
JWT_SECRET='shh'
EMPTY=
PORT = 5000
"#,
    );
    assert_eq!(parsed.get("FREEPIK_API_KEY").map(String::as_str), Some("fp-123"));
    assert_eq!(parsed.get("JWT_SECRET").map(String::as_str), Some("shh"));
    assert_eq!(parsed.get("PORT").map(String::as_str), Some("5000"));
    assert!(!parsed.contains_key("EMPTY"));
}

#[test]
fn dotenv_quotes_keep_hashes_and_bare_values_drop_comments() {
    let parsed = parse_dotenv(
        "FREEPIK_API_KEY=\"fp-#1 abc\"\nHF_TOKEN=hf-2 # read-only\nMONGO_URI='mongodb://h/db'\nBLANK=\"\"\n",
    );
    assert_eq!(
        parsed.get("FREEPIK_API_KEY").map(String::as_str),
        Some("fp-#1 abc")
    );
    assert_eq!(parsed.get("HF_TOKEN").map(String::as_str), Some("hf-2"));
    assert_eq!(
        parsed.get("MONGO_URI").map(String::as_str),
        Some("mongodb://h/db")
    );
    assert!(!parsed.contains_key("BLANK"));
}

#[test]
fn http_headers_skip_blank_names() -> Result<()> {
    let headers = BTreeMap::from([
        (" ".to_string(), "ignored".to_string()),
        ("x-campaign".to_string(), "spring".to_string()),
    ]);
    let map = header_map_from_pairs(&headers)?;
    assert_eq!(map.len(), 1);
    assert_eq!(map.get("x-campaign").map(|v| v.as_bytes()), Some(&b"spring"[..]));
    Ok(())
}

#[tokio::test]
async fn env_load_reads_explicit_file() -> Result<()> {
    let mut file = tempfile::NamedTempFile::new()?;
    writeln!(file, "FREEPIK_API_KEY=fp-file")?;
    let env = Env::load(Some(file.path())).await?;
    assert_eq!(env.get("FREEPIK_API_KEY").as_deref(), Some("fp-file"));
    Ok(())
}

#[test]
fn http_headers_reject_invalid_name() {
    let headers = BTreeMap::from([("bad header".to_string(), "v".to_string())]);
    let err = header_map_from_pairs(&headers).unwrap_err();
    assert!(matches!(err, AdgeniusError::Config(_)));
}

#[test]
fn app_config_defaults_poll_every_five_seconds() -> Result<()> {
    let config = AppConfig::from_toml_str("")?;
    assert_eq!(config.polling.interval_ms, 5_000);
    assert_eq!(config.polling.max_attempts, 10);
    assert_eq!(config.polling.initial_progress, 10);
    assert_eq!(config.polling.progress_step, 15);
    assert_eq!(config.polling.progress_cap, 95);
    assert_eq!(config.routing.fallback_model, ProviderModel::Default);
    assert_eq!(config.routing.mystic_fallback, MysticModel::Realism);
    assert_eq!(config.gateway.listen, "127.0.0.1:5000");
    assert_eq!(config.gateway.task_ttl(), std::time::Duration::from_secs(3_600));
    assert_eq!(config.gateway.max_tasks, 1_024);
    assert_eq!(config.mystic.timeout(), std::time::Duration::from_secs(300));
    Ok(())
}

#[test]
fn app_config_parses_full_toml() -> Result<()> {
    let config = AppConfig::from_toml_str(
        r#"
[mystic]
base_url = "http://127.0.0.1:9000/mystic"
timeout_secs = 30

[mystic.auth]
type = "http_header_env"
header = "x-freepik-api-key"
keys = ["MYSTIC_KEY"]

[imagen3.http_headers]
x-trace = "campaign"

[polling]
interval_ms = 250
max_attempts = 3

[routing]
fallback_model = "classic_fast"
mystic_fallback = "zen"

[gateway]
listen = "0.0.0.0:8080"
task_ttl_secs = 120
max_tasks = 8
"#,
    )?;
    assert_eq!(
        config.mystic.base_url.as_deref(),
        Some("http://127.0.0.1:9000/mystic")
    );
    assert!(matches!(
        config.mystic.auth,
        Some(ProviderAuth::HttpHeaderEnv { ref header, .. }) if header == "x-freepik-api-key"
    ));
    assert_eq!(
        config.imagen3.http_headers.get("x-trace").map(String::as_str),
        Some("campaign")
    );
    assert_eq!(config.polling.interval_ms, 250);
    assert_eq!(config.polling.max_attempts, 3);
    assert_eq!(config.polling.progress_step, 15);
    assert_eq!(config.routing.fallback_model, ProviderModel::ClassicFast);
    assert_eq!(config.routing.mystic_fallback, MysticModel::Zen);
    assert_eq!(config.gateway.listen, "0.0.0.0:8080");
    assert_eq!(config.gateway.task_ttl_secs, 120);
    assert_eq!(config.gateway.max_tasks, 8);
    Ok(())
}

#[test]
fn app_config_rejects_bad_values() {
    assert!(AppConfig::from_toml_str("[polling]\nmax_attempts = 0\n").is_err());
    assert!(AppConfig::from_toml_str("[mystic]\nbase_url = \"ftp://x\"\n").is_err());
    assert!(AppConfig::from_toml_str("[routing]\nmystic_fallback = \"classic_fast\"\n").is_err());
    assert!(AppConfig::from_toml_str("[gateway]\nmax_tasks = 0\n").is_err());
}

#[tokio::test]
async fn app_config_load_reports_missing_file() {
    let err = AppConfig::load(std::path::Path::new("/definitely/not/here.toml"))
        .await
        .unwrap_err();
    assert!(matches!(err, AdgeniusError::Config(_)));
}
