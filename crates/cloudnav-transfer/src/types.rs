//! Transfer data model: task and batch identifiers, task state machine,
//! snapshots, events and local upload sources.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use cloudnav_dav::DavResult;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use uuid::Uuid;

use crate::progress;

// ── Identifiers ──────────────────────────────────────────────────────────────

/// Opaque identity of one upload task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(Uuid);

impl TaskId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Opaque identity of one submitted batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BatchId(Uuid);

impl BatchId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for BatchId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for BatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

// ── State machine ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskState {
    Pending,
    Uploading,
    Completed,
    Error,
    Cancelled,
}

impl TaskState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Error | Self::Cancelled)
    }

    /// Edges of the task graph:
    /// `Pending → Uploading → {Completed, Error}`, `{Pending, Uploading} → Cancelled`.
    pub fn can_transition_to(self, next: TaskState) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Uploading)
                | (Self::Uploading, Self::Uploading)
                | (Self::Uploading, Self::Completed)
                | (Self::Uploading, Self::Error)
                | (Self::Pending, Self::Cancelled)
                | (Self::Uploading, Self::Cancelled)
        )
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Uploading => "uploading",
            Self::Completed => "completed",
            Self::Error => "error",
            Self::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

// ── Tasks ────────────────────────────────────────────────────────────────────

/// Snapshot of one upload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferTask {
    pub id: TaskId,
    pub batch_id: BatchId,
    /// Sanitized name the remote store will show.
    pub file_name: String,
    /// Name as selected by the user.
    pub source_name: String,
    pub destination_path: String,
    pub total_bytes: u64,
    pub bytes_sent: u64,
    pub state: TaskState,
    pub speed_bytes_per_sec: Option<f64>,
    pub eta_seconds: Option<f64>,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub error: Option<String>,
}

impl TransferTask {
    /// 0–100. Zero-byte tasks report 100 once completed.
    pub fn percent(&self) -> f64 {
        if self.total_bytes == 0 {
            return if self.state == TaskState::Completed { 100.0 } else { 0.0 };
        }
        progress::percent(self.bytes_sent, self.total_bytes)
    }

    pub fn remaining_bytes(&self) -> u64 {
        self.total_bytes.saturating_sub(self.bytes_sent)
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }
}

/// What the registry needs to open a task.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTask {
    pub source_name: String,
    pub file_name: String,
    pub destination_path: String,
    pub total_bytes: u64,
}

/// Whether a progress sample or settlement changed the task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressOutcome {
    Applied,
    /// The task was already terminal; nothing changed.
    Ignored,
}

// ── Batches ──────────────────────────────────────────────────────────────────

/// Returned by a submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchHandle {
    pub batch_id: BatchId,
    pub target_directory: String,
    pub task_ids: Vec<TaskId>,
}

/// Aggregate view of a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchSnapshot {
    pub id: BatchId,
    pub target_directory: String,
    pub task_ids: Vec<TaskId>,
    /// Mean of per-task percentages.
    pub percent: f64,
    pub active: usize,
    pub completed: usize,
    pub failed: usize,
    pub cancelled: usize,
}

impl BatchSnapshot {
    pub fn total(&self) -> usize {
        self.task_ids.len()
    }

    pub fn finished(&self) -> usize {
        self.completed + self.failed + self.cancelled
    }

    pub fn is_settled(&self) -> bool {
        self.active == 0
    }
}

// ── Events ───────────────────────────────────────────────────────────────────

/// Registry change notifications.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum TransferEvent {
    TaskQueued { task: TransferTask },
    TaskProgress { task: TransferTask },
    /// Completed, failed or cancelled. A failed task's event carries the
    /// error message for the user.
    TaskSettled { task: TransferTask },
    BatchDismissed { batch_id: BatchId },
}

// ── Sources ──────────────────────────────────────────────────────────────────

/// One local file selected for upload.
#[derive(Debug, Clone, PartialEq)]
pub struct LocalFile {
    pub name: String,
    pub content: Bytes,
}

impl LocalFile {
    pub fn new(name: impl Into<String>, content: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }

    /// Read a file from disk; the name is its last path component.
    pub async fn from_path(path: impl AsRef<Path>) -> DavResult<Self> {
        let path = path.as_ref();
        let content = tokio::fs::read(path).await?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self::new(name, content))
    }

    pub fn size(&self) -> u64 {
        self.content.len() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(total: u64, sent: u64, state: TaskState) -> TransferTask {
        TransferTask {
            id: TaskId::new(),
            batch_id: BatchId::new(),
            file_name: "f".into(),
            source_name: "f".into(),
            destination_path: "/f".into(),
            total_bytes: total,
            bytes_sent: sent,
            state,
            speed_bytes_per_sec: None,
            eta_seconds: None,
            started_at: Utc::now(),
            finished_at: None,
            error: None,
        }
    }

    #[test]
    fn transitions_follow_the_graph() {
        use TaskState::*;
        assert!(Pending.can_transition_to(Uploading));
        assert!(Pending.can_transition_to(Cancelled));
        assert!(!Pending.can_transition_to(Completed));
        assert!(!Pending.can_transition_to(Error));
        assert!(Uploading.can_transition_to(Completed));
        assert!(Uploading.can_transition_to(Error));
        assert!(Uploading.can_transition_to(Cancelled));
        for terminal in [Completed, Error, Cancelled] {
            assert!(terminal.is_terminal());
            for next in [Pending, Uploading, Completed, Error, Cancelled] {
                assert!(!terminal.can_transition_to(next));
            }
        }
    }

    #[test]
    fn percent_handles_zero_byte_tasks() {
        assert_eq!(task(0, 0, TaskState::Pending).percent(), 0.0);
        assert_eq!(task(0, 0, TaskState::Completed).percent(), 100.0);
        assert_eq!(task(200, 50, TaskState::Uploading).percent(), 25.0);
        assert_eq!(task(200, 50, TaskState::Uploading).remaining_bytes(), 150);
    }

    #[test]
    fn ids_are_unique_and_serialize_plain() {
        let a = TaskId::new();
        assert_ne!(a, TaskId::new());
        let json = serde_json::to_string(&a).unwrap();
        assert_eq!(json, format!("\"{}\"", a));
    }

    #[test]
    fn event_is_tagged() {
        let ev = TransferEvent::BatchDismissed { batch_id: BatchId::new() };
        let json = serde_json::to_string(&ev).unwrap();
        assert!(json.contains("\"type\":\"batchDismissed\""));
    }

    #[tokio::test]
    async fn local_file_from_path_reads_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hello world.txt");
        std::fs::write(&path, b"hi there").unwrap();

        let file = LocalFile::from_path(&path).await.unwrap();
        assert_eq!(file.name, "hello world.txt");
        assert_eq!(file.size(), 8);

        let missing = LocalFile::from_path(dir.path().join("nope")).await.unwrap_err();
        assert!(missing.is(cloudnav_dav::DavErrorKind::NotFound));
    }
}
