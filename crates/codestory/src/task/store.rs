//! In-memory task registry.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::project::FileSummary;

use super::model::{StatusReport, Task, TaskPhase, TaskResult, TaskStatus};

// ─── Clock ──────────────────────────────────────────────────────────────────

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to.
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn advance(&self, by: chrono::Duration) {
        let mut now = self.now.lock().unwrap_or_else(|p| p.into_inner());
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(|p| p.into_inner())
    }
}

// ─── Events ─────────────────────────────────────────────────────────────────

/// Emitted on every task mutation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskEvent {
    pub task_id: String,
    pub status: TaskStatus,
    pub phase: TaskPhase,
    pub progress: u8,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl TaskEvent {
    fn from_task(task: &Task, timestamp: DateTime<Utc>) -> Self {
        Self {
            task_id: task.id.clone(),
            status: task.status,
            phase: task.phase,
            progress: task.progress,
            message: task.message.clone(),
            timestamp,
        }
    }
}

// ─── TaskStore ──────────────────────────────────────────────────────────────

/// Registry of live tasks.
///
/// The map lock is held only to look up or insert an entry; each task has
/// its own mutex so status queries never wait on another task's pipeline.
/// Entries older than the TTL are evicted when touched and by
/// [`TaskStore::evict_expired`].
pub struct TaskStore {
    tasks: RwLock<HashMap<String, Arc<Mutex<Task>>>>,
    clock: Arc<dyn Clock>,
    ttl: chrono::Duration,
    events: broadcast::Sender<TaskEvent>,
}

impl TaskStore {
    pub fn new(ttl: chrono::Duration) -> Self {
        Self::with_clock(ttl, Arc::new(SystemClock))
    }

    pub fn with_clock(ttl: chrono::Duration, clock: Arc<dyn Clock>) -> Self {
        let (events, _) = broadcast::channel(256);
        Self {
            tasks: RwLock::new(HashMap::new()),
            clock,
            ttl,
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TaskEvent> {
        self.events.subscribe()
    }

    pub fn ttl(&self) -> chrono::Duration {
        self.ttl
    }

    /// Registers a new processing task and returns its id.
    pub fn create(&self, file_list: Vec<String>) -> String {
        let now = self.clock.now();
        let id = uuid::Uuid::new_v4().to_string();
        let task = Task::new(id.clone(), file_list, now);
        self.emit(&task, now);

        self.write_tasks()
            .insert(id.clone(), Arc::new(Mutex::new(task)));
        log::debug!("Created task {}", id);
        id
    }

    /// Snapshot of a live task. Expired tasks are evicted and reported absent.
    pub fn get(&self, id: &str) -> Option<Task> {
        let entry = self.entry(id)?;
        let task = lock_task(&entry).clone();
        Some(task)
    }

    pub fn status(&self, id: &str) -> StatusReport {
        match self.entry(id) {
            Some(entry) => {
                let task = lock_task(&entry);
                StatusReport::from_task(&task)
            }
            None => StatusReport::not_found(),
        }
    }

    /// Result payload, only for completed tasks.
    pub fn result(&self, id: &str) -> Option<TaskResult> {
        let entry = self.entry(id)?;
        let task = lock_task(&entry);
        match task.status {
            TaskStatus::Completed => task.result.clone(),
            _ => None,
        }
    }

    /// File summaries, only for completed tasks.
    pub fn file_summaries(&self, id: &str) -> Vec<FileSummary> {
        let Some(entry) = self.entry(id) else {
            return Vec::new();
        };
        let task = lock_task(&entry);
        match task.status {
            TaskStatus::Completed => task.file_summaries.clone().unwrap_or_default(),
            _ => Vec::new(),
        }
    }

    pub fn advance(&self, id: &str, phase: TaskPhase, message: &str) -> bool {
        self.mutate(id, |task| task.advance(phase, message))
    }

    pub fn complete(&self, id: &str, result: TaskResult, summaries: Vec<FileSummary>) -> bool {
        self.mutate(id, |task| task.complete(result, summaries))
    }

    pub fn fail(&self, id: &str, error: &str) -> bool {
        self.mutate(id, |task| task.fail(error))
    }

    /// Explicit eviction. Returns whether the task existed.
    pub fn remove(&self, id: &str) -> bool {
        self.write_tasks().remove(id).is_some()
    }

    /// Drops every task past its TTL and returns how many went.
    pub fn evict_expired(&self) -> usize {
        let now = self.clock.now();
        let mut tasks = self.write_tasks();
        let before = tasks.len();
        tasks.retain(|_, entry| !lock_task(entry).is_expired(now, self.ttl));
        let evicted = before - tasks.len();
        if evicted > 0 {
            log::info!("Evicted {} expired tasks", evicted);
        }
        evicted
    }

    pub fn len(&self) -> usize {
        self.read_tasks().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn mutate(&self, id: &str, f: impl FnOnce(&mut Task) -> bool) -> bool {
        let Some(entry) = self.entry(id) else {
            log::warn!("Update for unknown or expired task {}", id);
            return false;
        };
        let mut task = lock_task(&entry);
        let changed = f(&mut *task);
        if changed {
            self.emit(&*task, self.clock.now());
        }
        changed
    }

    fn emit(&self, task: &Task, at: DateTime<Utc>) {
        // No subscribers is fine.
        let _ = self.events.send(TaskEvent::from_task(task, at));
    }

    /// Live entry for `id`, evicting it first if it has expired.
    fn entry(&self, id: &str) -> Option<Arc<Mutex<Task>>> {
        let entry = self.read_tasks().get(id).cloned()?;
        let expired = lock_task(&entry).is_expired(self.clock.now(), self.ttl);
        if expired {
            log::debug!("Task {} expired, evicting", id);
            self.write_tasks().remove(id);
            return None;
        }
        Some(entry)
    }

    fn read_tasks(&self) -> RwLockReadGuard<'_, HashMap<String, Arc<Mutex<Task>>>> {
        match self.tasks.read() {
            Ok(g) => g,
            Err(poisoned) => {
                log::warn!("Task store lock was poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }

    fn write_tasks(&self) -> RwLockWriteGuard<'_, HashMap<String, Arc<Mutex<Task>>>> {
        match self.tasks.write() {
            Ok(g) => g,
            Err(poisoned) => {
                log::warn!("Task store lock was poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }
}

fn lock_task(entry: &Mutex<Task>) -> MutexGuard<'_, Task> {
    match entry.lock() {
        Ok(g) => g,
        Err(poisoned) => {
            log::warn!("Task lock was poisoned, recovering");
            poisoned.into_inner()
        }
    }
}
