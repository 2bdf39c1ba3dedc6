use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::project::{FileSummary, TreeNode};

/// Overall state of a task. `NotFound` is not a state; see [`StatusKind`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Processing,
    Completed,
    Failed,
}

/// Pipeline stage a task has reached.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TaskPhase {
    Queued,
    Unpacking,
    Scanning,
    Extracting,
    Sanitizing,
    Enriching,
    Diagramming,
    Finalizing,
    Completed,
    Failed,
}

impl TaskPhase {
    /// Progress reached on entering this phase. `Failed` keeps whatever the
    /// task had.
    pub fn progress(&self) -> Option<u8> {
        match self {
            TaskPhase::Queued => Some(0),
            TaskPhase::Unpacking => Some(10),
            TaskPhase::Scanning => Some(25),
            TaskPhase::Extracting => Some(40),
            TaskPhase::Sanitizing => Some(50),
            TaskPhase::Enriching => Some(60),
            TaskPhase::Diagramming => Some(80),
            TaskPhase::Finalizing => Some(95),
            TaskPhase::Completed => Some(100),
            TaskPhase::Failed => None,
        }
    }

    pub fn status(&self) -> TaskStatus {
        match self {
            TaskPhase::Completed => TaskStatus::Completed,
            TaskPhase::Failed => TaskStatus::Failed,
            _ => TaskStatus::Processing,
        }
    }
}

impl std::fmt::Display for TaskPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskPhase::Queued => write!(f, "Queued"),
            TaskPhase::Unpacking => write!(f, "Unpacking archive"),
            TaskPhase::Scanning => write!(f, "Scanning project structure"),
            TaskPhase::Extracting => write!(f, "Extracting code structure"),
            TaskPhase::Sanitizing => write!(f, "Sanitizing sensitive data"),
            TaskPhase::Enriching => write!(f, "Summarizing files"),
            TaskPhase::Diagramming => write!(f, "Generating architecture diagram"),
            TaskPhase::Finalizing => write!(f, "Finalizing"),
            TaskPhase::Completed => write!(f, "Completed"),
            TaskPhase::Failed => write!(f, "Failed"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectStats {
    pub total_files: usize,
    pub code_files: usize,
    pub large_files: usize,
}

/// Payload of a completed task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskResult {
    pub tree: TreeNode,
    /// Mermaid `graph TD` source.
    pub diagram: String,
    pub stats: ProjectStats,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub status: TaskStatus,
    pub phase: TaskPhase,
    pub progress: u8,
    pub message: String,
    pub file_list: Vec<String>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<TaskResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_summaries: Option<Vec<FileSummary>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Task {
    pub fn new(id: String, file_list: Vec<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            status: TaskStatus::Processing,
            phase: TaskPhase::Queued,
            progress: 0,
            message: "Upload received, waiting to start".to_string(),
            file_list,
            created_at,
            result: None,
            file_summaries: None,
            error: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.status, TaskStatus::Completed | TaskStatus::Failed)
    }

    /// Moves to a non-terminal phase. Progress never decreases and terminal
    /// tasks are left untouched; returns whether anything changed.
    pub fn advance(&mut self, phase: TaskPhase, message: impl Into<String>) -> bool {
        if self.is_terminal() || phase.status() != TaskStatus::Processing {
            return false;
        }
        self.phase = phase;
        if let Some(progress) = phase.progress() {
            self.progress = self.progress.max(progress);
        }
        self.message = message.into();
        true
    }

    pub fn complete(&mut self, result: TaskResult, summaries: Vec<FileSummary>) -> bool {
        if self.is_terminal() {
            return false;
        }
        self.status = TaskStatus::Completed;
        self.phase = TaskPhase::Completed;
        self.progress = 100;
        self.message = "Analysis complete".to_string();
        self.result = Some(result);
        self.file_summaries = Some(summaries);
        true
    }

    /// Marks the task failed, freezing progress at its current value.
    pub fn fail(&mut self, error: impl Into<String>) -> bool {
        if self.is_terminal() {
            return false;
        }
        let error = error.into();
        self.status = TaskStatus::Failed;
        self.phase = TaskPhase::Failed;
        self.message = format!("Processing failed: {}", error);
        self.error = Some(error);
        true
    }

    /// Expired once strictly older than `ttl`.
    pub fn is_expired(&self, now: DateTime<Utc>, ttl: chrono::Duration) -> bool {
        now - self.created_at > ttl
    }
}

/// Outcome of a status query, including the not-found case.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StatusKind {
    Processing,
    Completed,
    Failed,
    NotFound,
}

impl From<TaskStatus> for StatusKind {
    fn from(status: TaskStatus) -> Self {
        match status {
            TaskStatus::Processing => StatusKind::Processing,
            TaskStatus::Completed => StatusKind::Completed,
            TaskStatus::Failed => StatusKind::Failed,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusReport {
    pub status: StatusKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl StatusReport {
    pub fn not_found() -> Self {
        Self {
            status: StatusKind::NotFound,
            task_id: None,
            progress: None,
            message: None,
        }
    }

    pub fn from_task(task: &Task) -> Self {
        Self {
            status: task.status.into(),
            task_id: Some(task.id.clone()),
            progress: Some(task.progress),
            message: Some(task.message.clone()),
        }
    }
}
