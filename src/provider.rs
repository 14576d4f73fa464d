use async_trait::async_trait;

use crate::Result;
use crate::types::{GenerationRequest, ProviderKind, ProviderStatus};

/// How a provider answered a generation submit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitReply {
    Generated { result: String },
    Queued { task_id: String },
}

#[async_trait]
pub trait GenerationProvider: Send + Sync {
    fn kind(&self) -> ProviderKind;

    async fn submit(&self, request: &GenerationRequest) -> Result<SubmitReply>;

    async fn status(&self, task_id: &str) -> Result<ProviderStatus>;
}
