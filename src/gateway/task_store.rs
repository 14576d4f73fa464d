use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::types::GenerationTask;

#[derive(Clone, Debug)]
struct TaskEntry {
    task: GenerationTask,
    touched: Instant,
}

/// Task snapshots the UI polls through the gateway. Terminal snapshots stay as tombstones so
/// a repeated check never reaches the provider again; every entry expires `ttl` after its
/// last access, and the least recently touched entry goes first once `max_tasks` is hit.
#[derive(Debug)]
pub(super) struct TaskStore {
    entries: HashMap<String, TaskEntry>,
    ttl: Duration,
    max_tasks: usize,
}

impl TaskStore {
    pub(super) fn new(ttl: Duration, max_tasks: usize) -> Self {
        Self {
            entries: HashMap::new(),
            ttl,
            max_tasks: max_tasks.max(1),
        }
    }

    pub(super) fn get(&mut self, task_id: &str, now: Instant) -> Option<GenerationTask> {
        self.evict_expired(now);
        let entry = self.entries.get_mut(task_id)?;
        entry.touched = now;
        Some(entry.task.clone())
    }

    pub(super) fn insert(&mut self, task: GenerationTask, now: Instant) {
        self.evict_expired(now);
        self.entries.insert(
            task.task_id.clone(),
            TaskEntry {
                task,
                touched: now,
            },
        );
        while self.entries.len() > self.max_tasks {
            let Some(oldest) = self
                .entries
                .iter()
                .min_by_key(|(_, entry)| entry.touched)
                .map(|(task_id, _)| task_id.clone())
            else {
                break;
            };
            self.entries.remove(&oldest);
        }
    }

    pub(super) fn len(&self) -> usize {
        self.entries.len()
    }

    fn evict_expired(&mut self, now: Instant) {
        let ttl = self.ttl;
        self.entries
            .retain(|_, entry| now.saturating_duration_since(entry.touched) < ttl);
    }
}
