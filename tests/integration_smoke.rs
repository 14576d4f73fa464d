#![cfg(feature = "integration")]

use adgenius::{AppConfig, Coordinator, Env, GenerationRequest, ProviderModel, Result};
use tokio_util::sync::CancellationToken;

fn env_nonempty(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

#[tokio::test]
async fn imagen3_generate_smoke() -> Result<()> {
    if env_nonempty("FREEPIK_API_KEY").is_none() {
        return Ok(());
    }

    let env = Env::load(None).await?;
    let coordinator = Coordinator::from_config(&AppConfig::default(), &env)?;
    let request = GenerationRequest::new("a red bicycle leaning on a brick wall")
        .with_model(ProviderModel::ClassicFast);

    let result = coordinator
        .generate(&request, &CancellationToken::new(), |_| {})
        .await?;
    assert!(result.starts_with("http"));
    Ok(())
}
