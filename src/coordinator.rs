//! Generation task coordinator: routes a request to exactly one provider, then drives the
//! returned task to a terminal state.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::ErrorKind;
use crate::profile::{AppConfig, Env};
use crate::provider::{GenerationProvider, SubmitReply};
use crate::providers::{Imagen3, Mystic};
use crate::task::{Clock, PollPolicy, TokioClock};
use crate::types::{
    GenerationRequest, GenerationTask, MysticModel, ProviderKind, ProviderModel, SubmitResult,
    TaskState,
};
use crate::{AdgeniusError, Result};

/// What to do with model names the coordinator does not recognize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct RoutingPolicy {
    /// Selector substituted for an unrecognized model name.
    #[serde(default)]
    pub fallback_model: ProviderModel,
    /// Mystic model sent for `default` (and for a `fallback_model` that is not a Mystic style).
    #[serde(default)]
    pub mystic_fallback: MysticModel,
}

impl RoutingPolicy {
    pub fn resolve_model(&self, raw: Option<&str>) -> ProviderModel {
        let Some(raw) = raw.map(str::trim).filter(|raw| !raw.is_empty()) else {
            return ProviderModel::Default;
        };
        match ProviderModel::parse(raw) {
            Some(model) => model,
            None => {
                warn!(
                    model = raw,
                    fallback = %self.fallback_model,
                    "unrecognized provider model; using fallback"
                );
                self.fallback_model
            }
        }
    }
}

#[derive(Clone)]
pub struct Coordinator {
    mystic: Arc<dyn GenerationProvider>,
    imagen3: Arc<dyn GenerationProvider>,
    policy: PollPolicy,
    routing: RoutingPolicy,
}

impl std::fmt::Debug for Coordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Coordinator")
            .field("policy", &self.policy)
            .field("routing", &self.routing)
            .finish_non_exhaustive()
    }
}

impl Coordinator {
    pub fn new(
        mystic: impl GenerationProvider + 'static,
        imagen3: impl GenerationProvider + 'static,
    ) -> Self {
        Self {
            mystic: Arc::new(mystic),
            imagen3: Arc::new(imagen3),
            policy: PollPolicy::default(),
            routing: RoutingPolicy::default(),
        }
    }

    pub fn with_poll_policy(mut self, policy: PollPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_routing(mut self, routing: RoutingPolicy) -> Self {
        self.routing = routing;
        self
    }

    pub fn from_config(config: &AppConfig, env: &Env) -> Result<Self> {
        config.validate()?;
        let mystic = Mystic::from_config(&config.mystic, env)?
            .with_fallback_model(config.routing.mystic_fallback);
        let imagen3 = Imagen3::from_config(&config.imagen3, env)?;
        Ok(Self::new(mystic, imagen3)
            .with_poll_policy(config.polling)
            .with_routing(config.routing))
    }

    pub fn poll_policy(&self) -> &PollPolicy {
        &self.policy
    }

    pub fn routing(&self) -> &RoutingPolicy {
        &self.routing
    }

    fn provider(&self, kind: ProviderKind) -> &dyn GenerationProvider {
        match kind {
            ProviderKind::Mystic => self.mystic.as_ref(),
            ProviderKind::Imagen3 => self.imagen3.as_ref(),
        }
    }

    /// Validate and forward `request` to the provider its model selects.
    pub async fn submit(&self, request: &GenerationRequest) -> Result<SubmitResult> {
        request.validate()?;
        let kind = request.provider();
        debug!(
            provider = %kind,
            model = %request.provider_model,
            aspect_ratio = request.aspect_ratio.as_str(),
            "submitting generation request"
        );

        match self.provider(kind).submit(request).await? {
            SubmitReply::Generated { result } => {
                info!(provider = %kind, "generation completed synchronously");
                Ok(SubmitResult::Completed {
                    result,
                    provider: kind,
                })
            }
            SubmitReply::Queued { task_id } => {
                info!(provider = %kind, task_id = %task_id, "generation queued");
                Ok(SubmitResult::Pending {
                    task: GenerationTask::new(task_id, kind, &self.policy),
                })
            }
        }
    }

    /// One status check. Updates `task` in place and returns the error that made it FAILED
    /// on this tick. Terminal tasks are left untouched and no request is sent.
    pub async fn poll_status(&self, task: &mut GenerationTask) -> Result<()> {
        if task.is_terminal() {
            return Ok(());
        }

        let observation = self
            .provider(task.provider)
            .status(&task.task_id)
            .await;
        match &observation {
            Ok(status) => debug!(task_id = %task.task_id, ?status, "task status"),
            Err(err) => debug!(task_id = %task.task_id, error = %err, "status check failed"),
        }

        if let Some(err) = task.observe(observation, &self.policy) {
            warn!(
                task_id = %task.task_id,
                provider = %task.provider,
                attempts = task.attempts,
                error = %err,
                "generation task failed"
            );
            return Err(err);
        }
        if task.state == TaskState::Completed {
            info!(
                task_id = %task.task_id,
                attempts = task.attempts,
                "generation task completed"
            );
        }
        Ok(())
    }

    /// Poll `task` every `interval` until it is terminal, reporting each snapshot to
    /// `on_progress`. Cancelling `cancel` stops before the next status check.
    pub async fn wait_for_completion<F>(
        &self,
        task: &mut GenerationTask,
        clock: &dyn Clock,
        cancel: &CancellationToken,
        mut on_progress: F,
    ) -> Result<String>
    where
        F: FnMut(&GenerationTask),
    {
        if task.is_terminal() {
            return terminal_outcome(task);
        }

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    debug!(task_id = %task.task_id, "polling cancelled");
                    return Err(AdgeniusError::Cancelled);
                }
                _ = clock.sleep(self.policy.interval()) => {}
            }

            let polled = self.poll_status(task).await;
            on_progress(task);
            polled?;

            if task.is_terminal() {
                return terminal_outcome(task);
            }
        }
    }

    /// Submit and, for asynchronous providers, wait on real timers for the result URI.
    pub async fn generate<F>(
        &self,
        request: &GenerationRequest,
        cancel: &CancellationToken,
        on_progress: F,
    ) -> Result<String>
    where
        F: FnMut(&GenerationTask),
    {
        match self.submit(request).await? {
            SubmitResult::Completed { result, .. } => Ok(result),
            SubmitResult::Pending { mut task } => {
                self.wait_for_completion(&mut task, &TokioClock, cancel, on_progress)
                    .await
            }
        }
    }
}

/// Result of a task that is already terminal. The triggering error is gone by now, so a
/// FAILED snapshot is rebuilt from the kind and message it recorded.
fn terminal_outcome(task: &GenerationTask) -> Result<String> {
    match task.state {
        TaskState::Completed => task.result.clone().ok_or_else(|| {
            AdgeniusError::InvalidResponse(format!(
                "task {} completed without a result",
                task.task_id
            ))
        }),
        TaskState::Failed => Err(match task.error.as_ref() {
            Some(err) if err.kind == ErrorKind::Timeout => AdgeniusError::Timeout {
                task_id: task.task_id.clone(),
                attempts: task.attempts,
            },
            Some(err) => AdgeniusError::Recorded {
                task_id: task.task_id.clone(),
                kind: err.kind,
                message: err.message.clone(),
            },
            None => AdgeniusError::TaskFailed {
                task_id: task.task_id.clone(),
            },
        }),
        TaskState::Pending => Err(AdgeniusError::InvalidResponse(format!(
            "task {} is still pending",
            task.task_id
        ))),
    }
}
