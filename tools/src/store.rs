// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! In-memory task storage, partitioned per user.
//!
//! Every operation is keyed by the authenticated `user_id`; one user can
//! never see or touch another user's tasks, whatever parameters the
//! tool call carries.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use uuid::Uuid;

/// One tracked task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: Uuid,
    pub title: String,
    pub done: bool,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Task {
    fn new(title: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            done: false,
            created_at: Utc::now(),
            completed_at: None,
        }
    }
}

/// Per-user task lists behind one lock.
pub struct TaskStore {
    tasks: RwLock<HashMap<String, Vec<Task>>>,
}

impl TaskStore {
    pub fn new() -> Self {
        Self {
            tasks: RwLock::new(HashMap::new()),
        }
    }

    pub async fn create(&self, user_id: &str, title: impl Into<String>) -> Task {
        let task = Task::new(title);
        self.tasks
            .write()
            .await
            .entry(user_id.to_string())
            .or_default()
            .push(task.clone());
        task
    }

    /// The user's tasks in creation order, optionally only the open ones.
    pub async fn list(&self, user_id: &str, open_only: bool) -> Vec<Task> {
        self.tasks
            .read()
            .await
            .get(user_id)
            .map(|tasks| {
                tasks
                    .iter()
                    .filter(|t| !open_only || !t.done)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Mark a task done. Returns the updated task, or `None` when the
    /// user owns no task with that id.
    pub async fn complete(&self, user_id: &str, task_id: Uuid) -> Option<Task> {
        let mut tasks = self.tasks.write().await;
        let task = tasks
            .get_mut(user_id)?
            .iter_mut()
            .find(|t| t.id == task_id)?;
        if !task.done {
            task.done = true;
            task.completed_at = Some(Utc::now());
        }
        Some(task.clone())
    }

    /// Remove a task. Returns whether one was removed.
    pub async fn delete(&self, user_id: &str, task_id: Uuid) -> bool {
        let mut tasks = self.tasks.write().await;
        let Some(list) = tasks.get_mut(user_id) else {
            return false;
        };
        let before = list.len();
        list.retain(|t| t.id != task_id);
        before != list.len()
    }

    pub async fn count(&self, user_id: &str) -> usize {
        self.tasks
            .read()
            .await
            .get(user_id)
            .map_or(0, Vec::len)
    }
}

impl Default for TaskStore {
    fn default() -> Self {
        Self::new()
    }
}
