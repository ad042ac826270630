//! Transfer Task Registry: owns every upload task and batch, enforces the
//! task state machine and publishes changes on a broadcast channel.
//!
//! The task map sits behind an `RwLock`; each task has its own `Mutex`, only
//! touched by that task's progress stream and by `cancel` for that id.

use chrono::Utc;
use cloudnav_dav::{DavError, DavResult};
use log::debug;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use std::time::Instant;
use tokio::sync::broadcast;

use crate::progress;
use crate::types::*;

/// Default capacity of the event channel.
pub const EVENT_CAPACITY: usize = 256;

struct TaskSlot {
    task: TransferTask,
    /// Monotonic start for speed estimates.
    started: Instant,
}

type SharedSlot = Arc<Mutex<TaskSlot>>;

struct BatchRecord {
    target_directory: String,
    task_ids: Vec<TaskId>,
}

#[derive(Default)]
struct Inner {
    tasks: HashMap<TaskId, SharedSlot>,
    order: Vec<TaskId>,
    batches: HashMap<BatchId, BatchRecord>,
    batch_order: Vec<BatchId>,
}

/// Registry of upload tasks and batches.
pub struct TaskRegistry {
    inner: RwLock<Inner>,
    events: broadcast::Sender<TransferEvent>,
}

impl Default for TaskRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::with_event_capacity(EVENT_CAPACITY)
    }

    pub fn with_event_capacity(capacity: usize) -> Self {
        let (events, _) = broadcast::channel(capacity.max(1));
        Self {
            inner: RwLock::new(Inner::default()),
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TransferEvent> {
        self.events.subscribe()
    }

    fn emit(&self, event: TransferEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    fn slot(&self, id: TaskId) -> DavResult<SharedSlot> {
        read(&self.inner)
            .tasks
            .get(&id)
            .cloned()
            .ok_or_else(|| DavError::not_found(format!("transfer {} not found", id)))
    }

    // ── Creation ─────────────────────────────────────────────────────────

    /// Open a batch of Pending tasks sharing `target_directory`.
    pub fn create_batch(&self, target_directory: &str, tasks: Vec<NewTask>) -> BatchHandle {
        let batch_id = BatchId::new();
        let now = Utc::now();
        let started = Instant::now();

        let created: Vec<TransferTask> = tasks
            .into_iter()
            .map(|t| TransferTask {
                id: TaskId::new(),
                batch_id,
                file_name: t.file_name,
                source_name: t.source_name,
                destination_path: t.destination_path,
                total_bytes: t.total_bytes,
                bytes_sent: 0,
                state: TaskState::Pending,
                speed_bytes_per_sec: None,
                eta_seconds: None,
                started_at: now,
                finished_at: None,
                error: None,
            })
            .collect();
        let task_ids: Vec<TaskId> = created.iter().map(|t| t.id).collect();

        {
            let mut inner = write(&self.inner);
            for task in &created {
                let slot = TaskSlot {
                    task: task.clone(),
                    started,
                };
                inner.tasks.insert(task.id, Arc::new(Mutex::new(slot)));
                inner.order.push(task.id);
            }
            inner.batches.insert(
                batch_id,
                BatchRecord {
                    target_directory: target_directory.to_string(),
                    task_ids: task_ids.clone(),
                },
            );
            inner.batch_order.push(batch_id);
        }

        for task in created {
            self.emit(TransferEvent::TaskQueued { task });
        }

        BatchHandle {
            batch_id,
            target_directory: target_directory.to_string(),
            task_ids,
        }
    }

    // ── Mutation ─────────────────────────────────────────────────────────

    /// Apply a cumulative bytes-sent sample. Moves Pending to Uploading;
    /// ignored once the task is terminal.
    pub fn record_progress(&self, id: TaskId, bytes_sent: u64) -> DavResult<ProgressOutcome> {
        let slot = self.slot(id)?;
        let snapshot = {
            let mut guard = lock(&slot);
            let elapsed = guard.started.elapsed().as_secs_f64();
            let task = &mut guard.task;
            if task.is_terminal() {
                return Ok(ProgressOutcome::Ignored);
            }
            transition(task, TaskState::Uploading)?;
            let clamped = bytes_sent.min(task.total_bytes);
            task.bytes_sent = task.bytes_sent.max(clamped);
            task.speed_bytes_per_sec = progress::speed(task.bytes_sent, elapsed);
            task.eta_seconds = progress::eta(task.remaining_bytes(), task.speed_bytes_per_sec);
            task.clone()
        };
        self.emit(TransferEvent::TaskProgress { task: snapshot });
        Ok(ProgressOutcome::Applied)
    }

    /// Transport reported success.
    pub fn complete(&self, id: TaskId) -> DavResult<ProgressOutcome> {
        self.settle(id, TaskState::Completed, None)
    }

    /// Transport reported failure.
    pub fn fail(&self, id: TaskId, message: impl Into<String>) -> DavResult<ProgressOutcome> {
        self.settle(id, TaskState::Error, Some(message.into()))
    }

    fn settle(&self, id: TaskId, state: TaskState, error: Option<String>) -> DavResult<ProgressOutcome> {
        let slot = self.slot(id)?;
        let snapshot = {
            let mut guard = lock(&slot);
            let task = &mut guard.task;
            if task.is_terminal() {
                debug!("transfer {}: ignoring {} after {}", id, state, task.state);
                return Ok(ProgressOutcome::Ignored);
            }
            if task.state == TaskState::Pending {
                transition(task, TaskState::Uploading)?;
            }
            transition(task, state)?;
            if state == TaskState::Completed {
                task.bytes_sent = task.total_bytes;
            }
            task.eta_seconds = None;
            task.error = error;
            task.finished_at = Some(Utc::now());
            task.clone()
        };
        self.emit(TransferEvent::TaskSettled { task: snapshot });
        Ok(ProgressOutcome::Applied)
    }

    /// User abort. Keeps the last observed `bytes_sent`. Fails with
    /// `InvalidState` when the task already settled.
    pub fn cancel(&self, id: TaskId) -> DavResult<TransferTask> {
        let slot = self.slot(id)?;
        let snapshot = {
            let mut guard = lock(&slot);
            let task = &mut guard.task;
            if task.is_terminal() {
                return Err(DavError::invalid_state(format!(
                    "cannot cancel transfer {} in state {}",
                    id, task.state
                )));
            }
            transition(task, TaskState::Cancelled)?;
            task.eta_seconds = None;
            task.finished_at = Some(Utc::now());
            task.clone()
        };
        self.emit(TransferEvent::TaskSettled {
            task: snapshot.clone(),
        });
        Ok(snapshot)
    }

    /// Remove a batch and its tasks. Every task must be terminal.
    pub fn dismiss_batch(&self, batch_id: BatchId) -> DavResult<Vec<TransferTask>> {
        let removed = {
            let mut inner = write(&self.inner);
            let record = inner
                .batches
                .get(&batch_id)
                .ok_or_else(|| DavError::not_found(format!("batch {} not found", batch_id)))?;

            let mut tasks = Vec::with_capacity(record.task_ids.len());
            for id in &record.task_ids {
                if let Some(slot) = inner.tasks.get(id) {
                    tasks.push(lock(slot).task.clone());
                }
            }
            if let Some(active) = tasks.iter().find(|t| !t.is_terminal()) {
                return Err(DavError::invalid_state(format!(
                    "batch {} still has transfer {} {}",
                    batch_id, active.id, active.state
                )));
            }

            for task in &tasks {
                inner.tasks.remove(&task.id);
            }
            inner.order.retain(|id| tasks.iter().all(|t| t.id != *id));
            inner.batches.remove(&batch_id);
            inner.batch_order.retain(|id| *id != batch_id);
            tasks
        };
        self.emit(TransferEvent::BatchDismissed { batch_id });
        Ok(removed)
    }

    // ── Read model ───────────────────────────────────────────────────────

    pub fn task(&self, id: TaskId) -> Option<TransferTask> {
        self.slot(id).ok().map(|slot| lock(&slot).task.clone())
    }

    /// All tasks in creation order.
    pub fn tasks(&self) -> Vec<TransferTask> {
        let inner = read(&self.inner);
        inner
            .order
            .iter()
            .filter_map(|id| inner.tasks.get(id))
            .map(|slot| lock(slot).task.clone())
            .collect()
    }

    pub fn batch(&self, batch_id: BatchId) -> Option<BatchSnapshot> {
        let inner = read(&self.inner);
        let record = inner.batches.get(&batch_id)?;
        let tasks: Vec<TransferTask> = record
            .task_ids
            .iter()
            .filter_map(|id| inner.tasks.get(id))
            .map(|slot| lock(slot).task.clone())
            .collect();
        Some(snapshot_of(batch_id, record, &tasks))
    }

    /// All batches in submission order.
    pub fn batches(&self) -> Vec<BatchSnapshot> {
        let ids: Vec<BatchId> = read(&self.inner).batch_order.clone();
        ids.into_iter().filter_map(|id| self.batch(id)).collect()
    }

    /// Tasks of one batch, in submission order.
    pub fn batch_tasks(&self, batch_id: BatchId) -> DavResult<Vec<TransferTask>> {
        let inner = read(&self.inner);
        let record = inner
            .batches
            .get(&batch_id)
            .ok_or_else(|| DavError::not_found(format!("batch {} not found", batch_id)))?;
        Ok(record
            .task_ids
            .iter()
            .filter_map(|id| inner.tasks.get(id))
            .map(|slot| lock(slot).task.clone())
            .collect())
    }
}

// ── Free-standing helpers ────────────────────────────────────────────────────

/// Mean of per-task percentages; an empty batch is 0.
pub fn aggregate_percent(tasks: &[TransferTask]) -> f64 {
    if tasks.is_empty() {
        return 0.0;
    }
    tasks.iter().map(TransferTask::percent).sum::<f64>() / tasks.len() as f64
}

fn snapshot_of(id: BatchId, record: &BatchRecord, tasks: &[TransferTask]) -> BatchSnapshot {
    let count = |s: TaskState| tasks.iter().filter(|t| t.state == s).count();
    BatchSnapshot {
        id,
        target_directory: record.target_directory.clone(),
        task_ids: record.task_ids.clone(),
        percent: aggregate_percent(tasks),
        active: tasks.iter().filter(|t| !t.is_terminal()).count(),
        completed: count(TaskState::Completed),
        failed: count(TaskState::Error),
        cancelled: count(TaskState::Cancelled),
    }
}

fn transition(task: &mut TransferTask, next: TaskState) -> DavResult<()> {
    if !task.state.can_transition_to(next) {
        return Err(DavError::invalid_state(format!(
            "transfer {}: {} → {} is not allowed",
            task.id, task.state, next
        )));
    }
    task.state = next;
    Ok(())
}

fn read<T>(lock: &RwLock<T>) -> std::sync::RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> std::sync::RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}
