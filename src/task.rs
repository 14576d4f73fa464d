//! Status polling for asynchronous generation tasks.
//!
//! The transition rules live in [`GenerationTask::observe`], a pure function of the previous
//! snapshot and one provider observation. Timers are injected through [`Clock`] so the wait
//! loop in the coordinator can be driven without real sleeps.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::types::{GenerationTask, ProviderKind, ProviderStatus, TaskError, TaskState};
use crate::{AdgeniusError, Result};

const COMPLETED_PROGRESS: u8 = 100;

fn default_interval_ms() -> u64 {
    5_000
}

fn default_max_attempts() -> u32 {
    10
}

fn default_initial_progress() -> u8 {
    10
}

fn default_progress_step() -> u8 {
    15
}

fn default_progress_cap() -> u8 {
    95
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollPolicy {
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_initial_progress")]
    pub initial_progress: u8,
    #[serde(default = "default_progress_step")]
    pub progress_step: u8,
    #[serde(default = "default_progress_cap")]
    pub progress_cap: u8,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            max_attempts: default_max_attempts(),
            initial_progress: default_initial_progress(),
            progress_step: default_progress_step(),
            progress_cap: default_progress_cap(),
        }
    }
}

impl PollPolicy {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_attempts == 0 {
            return Err(AdgeniusError::Config(
                "polling.max_attempts must be at least 1".to_string(),
            ));
        }
        if self.progress_cap >= COMPLETED_PROGRESS {
            return Err(AdgeniusError::Config(format!(
                "polling.progress_cap must be below {COMPLETED_PROGRESS} (got {})",
                self.progress_cap
            )));
        }
        if self.initial_progress > self.progress_cap {
            return Err(AdgeniusError::Config(format!(
                "polling.initial_progress ({}) exceeds progress_cap ({})",
                self.initial_progress, self.progress_cap
            )));
        }
        Ok(())
    }
}

impl GenerationTask {
    pub fn new(task_id: impl Into<String>, provider: ProviderKind, policy: &PollPolicy) -> Self {
        Self {
            task_id: task_id.into(),
            provider,
            state: TaskState::Pending,
            progress: policy.initial_progress,
            result: None,
            attempts: 0,
            error: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    /// Apply one status check. Returns the error that moved the task to FAILED on this
    /// tick; `None` when the task is still pending, just completed, or was already terminal.
    pub fn observe(
        &mut self,
        observation: Result<ProviderStatus>,
        policy: &PollPolicy,
    ) -> Option<AdgeniusError> {
        if self.is_terminal() {
            return None;
        }
        self.attempts = self.attempts.saturating_add(1);

        match observation {
            Ok(ProviderStatus::Completed { result }) => {
                self.state = TaskState::Completed;
                self.progress = COMPLETED_PROGRESS;
                self.result = Some(result);
                None
            }
            Ok(ProviderStatus::Failed) => Some(self.fail(AdgeniusError::TaskFailed {
                task_id: self.task_id.clone(),
            })),
            Ok(ProviderStatus::Pending) => {
                let bumped = self
                    .progress
                    .saturating_add(policy.progress_step)
                    .min(policy.progress_cap);
                self.progress = self.progress.max(bumped);
                if self.attempts >= policy.max_attempts {
                    return Some(self.fail(AdgeniusError::Timeout {
                        task_id: self.task_id.clone(),
                        attempts: self.attempts,
                    }));
                }
                None
            }
            Err(err) => Some(self.fail(err)),
        }
    }

    fn fail(&mut self, err: AdgeniusError) -> AdgeniusError {
        self.state = TaskState::Failed;
        self.error = Some(TaskError::from(&err));
        err
    }
}

/// Source of the delay between status checks.
#[async_trait]
pub trait Clock: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TokioClock;

#[async_trait]
impl Clock for TokioClock {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn pending_task(policy: &PollPolicy) -> GenerationTask {
        GenerationTask::new("abc", ProviderKind::Mystic, policy)
    }

    #[test]
    fn completed_on_first_poll_jumps_to_full_progress() {
        let policy = PollPolicy::default();
        let mut task = pending_task(&policy);
        assert_eq!(task.progress, 10);

        let err = task.observe(
            Ok(ProviderStatus::Completed {
                result: "http://img/2.png".to_string(),
            }),
            &policy,
        );
        assert!(err.is_none());
        assert_eq!(task.state, TaskState::Completed);
        assert_eq!(task.progress, 100);
        assert_eq!(task.result.as_deref(), Some("http://img/2.png"));
        assert_eq!(task.attempts, 1);
    }

    #[test]
    fn pending_progress_is_monotonic_and_capped() {
        let policy = PollPolicy {
            max_attempts: 50,
            ..PollPolicy::default()
        };
        let mut task = pending_task(&policy);
        let mut seen = vec![task.progress];
        for _ in 0..20 {
            assert!(task.observe(Ok(ProviderStatus::Pending), &policy).is_none());
            seen.push(task.progress);
        }
        assert!(seen.windows(2).all(|pair| pair[0] <= pair[1]), "{seen:?}");
        assert_eq!(&seen[..8], &[10, 25, 40, 55, 70, 85, 95, 95]);
        assert!(seen.iter().all(|p| *p <= 95));
        assert_eq!(task.state, TaskState::Pending);
    }

    #[test]
    fn retry_budget_exhaustion_fails_with_timeout() {
        let policy = PollPolicy::default();
        let mut task = pending_task(&policy);
        for _ in 0..9 {
            assert!(task.observe(Ok(ProviderStatus::Pending), &policy).is_none());
        }
        let err = task
            .observe(Ok(ProviderStatus::Pending), &policy)
            .expect("tenth pending poll must time out");
        assert_eq!(err.kind(), ErrorKind::Timeout);
        assert_eq!(task.state, TaskState::Failed);
        assert_eq!(task.attempts, 10);
        assert_eq!(
            task.error.as_ref().map(|e| e.kind),
            Some(ErrorKind::Timeout)
        );
    }

    #[test]
    fn provider_failure_and_transport_errors_are_distinct() {
        let policy = PollPolicy::default();

        let mut reported = pending_task(&policy);
        let err = reported
            .observe(Ok(ProviderStatus::Failed), &policy)
            .expect("failed status is terminal");
        assert!(matches!(err, AdgeniusError::TaskFailed { .. }));
        assert_eq!(reported.state, TaskState::Failed);

        let mut broken = pending_task(&policy);
        let err = broken
            .observe(
                Err(AdgeniusError::InvalidResponse("not json".to_string())),
                &policy,
            )
            .expect("poll error is terminal");
        assert!(matches!(err, AdgeniusError::InvalidResponse(_)));
        assert_eq!(broken.state, TaskState::Failed);
    }

    #[test]
    fn terminal_tasks_ignore_further_observations() {
        let policy = PollPolicy::default();
        let mut task = pending_task(&policy);
        task.observe(Ok(ProviderStatus::Failed), &policy);
        let snapshot = task.clone();

        let err = task.observe(
            Ok(ProviderStatus::Completed {
                result: "http://late.png".to_string(),
            }),
            &policy,
        );
        assert!(err.is_none());
        assert_eq!(task, snapshot);
    }

    #[test]
    fn policy_validation_rejects_degenerate_values() {
        assert!(PollPolicy::default().validate().is_ok());
        let zero = PollPolicy {
            max_attempts: 0,
            ..PollPolicy::default()
        };
        assert!(zero.validate().is_err());
        let cap = PollPolicy {
            progress_cap: 100,
            ..PollPolicy::default()
        };
        assert!(cap.validate().is_err());
        let start = PollPolicy {
            initial_progress: 96,
            ..PollPolicy::default()
        };
        assert!(start.validate().is_err());
    }
}
