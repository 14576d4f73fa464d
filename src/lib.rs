pub mod coordinator;
mod error;
pub mod logging;
mod profile;
pub mod provider;
pub mod providers;
pub mod task;
pub mod types;
pub mod utils;

#[cfg(feature = "gateway")]
pub mod gateway;

pub use coordinator::{Coordinator, RoutingPolicy};
pub use error::{AdgeniusError, ErrorKind, Result};
pub use profile::{
    AppConfig, Env, GatewaySettings, ProviderAuth, ProviderConfig, parse_dotenv, resolve_api_key,
};
pub use provider::{GenerationProvider, SubmitReply};
pub use providers::{Imagen3, Mystic};
pub use task::{Clock, PollPolicy, TokioClock};
pub use types::{
    AspectRatio, GenerationRequest, GenerationTask, ImageStyle, MysticModel, ProviderKind,
    ProviderModel, ProviderStatus, StylingOptions, SubmitResult, TaskError, TaskState,
};
