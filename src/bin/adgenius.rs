use std::path::PathBuf;
use std::process::ExitCode;

use adgenius::{
    AppConfig, AspectRatio, Coordinator, Env, GenerationRequest, GenerationTask, ImageStyle,
    ProviderKind,
};
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;

#[derive(Parser)]
#[command(name = "adgenius")]
#[command(about = "Generate campaign images through Freepik Mystic / Imagen3")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    /// TOML config file (defaults apply when omitted)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Dotenv file holding FREEPIK_API_KEY (default: ./.env if present)
    #[arg(long, global = true)]
    dotenv: Option<PathBuf>,

    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Submit a prompt and wait for the image URI
    Generate {
        #[arg(long)]
        prompt: String,

        /// default, classic_fast, fluid, realism or zen
        #[arg(long)]
        model: Option<String>,

        #[arg(long)]
        aspect_ratio: Option<AspectRatio>,

        #[arg(long)]
        style: Option<ImageStyle>,

        #[arg(long)]
        no_realism: bool,
    },

    /// Run a single status check for an existing task
    Status {
        #[arg(long)]
        task_id: String,

        /// Model the task was submitted with; selects the provider to ask
        #[arg(long)]
        model: Option<String>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Err(err) = adgenius::logging::init_tracing(cli.json_logs) {
        eprintln!("failed to init logging: {err}");
        return ExitCode::FAILURE;
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error [{}]: {err}", err.kind().as_str());
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> adgenius::Result<()> {
    let config = match cli.config.as_deref() {
        Some(path) => AppConfig::load(path).await?,
        None => AppConfig::default(),
    };
    let env = Env::load(cli.dotenv.as_deref()).await?;
    let coordinator = Coordinator::from_config(&config, &env)?;

    match cli.command {
        Command::Generate {
            prompt,
            model,
            aspect_ratio,
            style,
            no_realism,
        } => {
            let model = coordinator.routing().resolve_model(model.as_deref());
            let mut request = GenerationRequest::new(prompt).with_model(model);
            if let Some(aspect_ratio) = aspect_ratio {
                request = request.with_aspect_ratio(aspect_ratio);
            }
            if let Some(style) = style {
                request = request.with_style(style);
            }
            if no_realism {
                request = request.with_realism(false);
            }

            let cancel = CancellationToken::new();
            let on_ctrl_c = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    on_ctrl_c.cancel();
                }
            });

            let result = coordinator
                .generate(&request, &cancel, |task: &GenerationTask| {
                    eprintln!("{} {}%", task.task_id, task.progress);
                })
                .await?;
            println!("{result}");
        }
        Command::Status { task_id, model } => {
            let model = coordinator.routing().resolve_model(model.as_deref());
            let mut task = GenerationTask::new(
                task_id,
                ProviderKind::for_model(model),
                coordinator.poll_policy(),
            );
            let polled = coordinator.poll_status(&mut task).await;
            println!("{}", serde_json::to_string_pretty(&task)?);
            polled?;
        }
    }
    Ok(())
}
