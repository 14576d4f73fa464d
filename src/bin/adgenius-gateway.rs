use std::path::PathBuf;

use adgenius::gateway::{GatewayHttpState, router};
use adgenius::{AppConfig, Coordinator, Env};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = std::env::args().skip(1);
    let mut config_path: Option<PathBuf> = None;
    let mut dotenv_path: Option<PathBuf> = None;
    let mut listen: Option<String> = None;
    let mut json_logs = false;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => {
                config_path = Some(args.next().ok_or("missing value for --config")?.into());
            }
            "--dotenv" => {
                dotenv_path = Some(args.next().ok_or("missing value for --dotenv")?.into());
            }
            "--listen" | "--addr" => {
                listen = Some(args.next().ok_or("missing value for --listen/--addr")?);
            }
            "--json-logs" => {
                json_logs = true;
            }
            other => {
                return Err(format!(
                    "unknown arg {other:?}; usage: adgenius-gateway [--config PATH] [--dotenv PATH] [--listen HOST:PORT] [--json-logs]"
                )
                .into());
            }
        }
    }

    adgenius::logging::init_tracing(json_logs)?;

    let config = match config_path.as_deref() {
        Some(path) => AppConfig::load(path).await?,
        None => AppConfig::default(),
    };
    let env = Env::load(dotenv_path.as_deref()).await?;
    let coordinator = Coordinator::from_config(&config, &env)?;

    let listen = listen.unwrap_or_else(|| config.gateway.listen.clone());
    let listener = tokio::net::TcpListener::bind(&listen).await?;
    tracing::info!(listen = %listen, "adgenius gateway listening");

    let state = GatewayHttpState::new(coordinator)
        .with_task_retention(config.gateway.task_ttl(), config.gateway.max_tasks);
    let app = router(state);
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;
    Ok(())
}
