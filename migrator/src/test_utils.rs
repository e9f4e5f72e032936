//! Test doubles for unit tests.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Notify;

use crate::migration::{MigrationCallbacks, MigrationFailure, INIT_MARKER_KEY};
use crate::primitives::native_bridge::{NativeBridgeError, NativeMigrationBridge};
use crate::primitives::scheduler::Scheduler;
use crate::primitives::web_storage::{WebStorage, WebStorageError};

/// One call made against [`InMemoryWebStorage`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageOp {
    Get(String),
    Set(String, String),
    Remove(String),
    Length,
}

#[derive(Default)]
struct StorageFaults {
    stale_reads: u32,
    failing_reads: u32,
    failing_length: bool,
    failing_removes: u32,
    failing_writes: Option<(String, WebStorageError)>,
}

/// In-memory `localStorage` that records every call and can simulate a lagging engine.
#[derive(Default)]
pub struct InMemoryWebStorage {
    entries: Mutex<HashMap<String, String>>,
    ops: Mutex<Vec<StorageOp>>,
    faults: Mutex<StorageFaults>,
}

impl InMemoryWebStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populates `count` application entries.
    pub fn with_entries(self, count: usize) -> Self {
        {
            let mut entries = self.entries.lock().unwrap();
            for i in 0..count {
                entries.insert(format!("app.key.{i}"), format!("value-{i}"));
            }
        }
        self
    }

    /// The first `count` reads of the init marker return `None`, as if the engine had not
    /// caught up with the write yet.
    pub fn with_stale_reads(self, count: u32) -> Self {
        self.faults.lock().unwrap().stale_reads = count;
        self
    }

    /// The first `count` reads of any key fail with `Unavailable`.
    pub fn with_failing_reads(self, count: u32) -> Self {
        self.faults.lock().unwrap().failing_reads = count;
        self
    }

    pub fn with_failing_length(self) -> Self {
        self.faults.lock().unwrap().failing_length = true;
        self
    }

    /// The first `count` removals fail with `Unavailable`.
    pub fn with_failing_removes(self, count: u32) -> Self {
        self.faults.lock().unwrap().failing_removes = count;
        self
    }

    /// Every write fails with `error`.
    pub fn with_failing_writes(self, error: WebStorageError) -> Self {
        self.with_failing_writes_for("", error)
    }

    /// Writes to keys starting with `prefix` fail with `error`.
    pub fn with_failing_writes_for(self, prefix: &str, error: WebStorageError) -> Self {
        self.faults.lock().unwrap().failing_writes = Some((prefix.to_string(), error));
        self
    }

    pub fn ops(&self) -> Vec<StorageOp> {
        self.ops.lock().unwrap().clone()
    }

    pub fn writes(&self) -> Vec<StorageOp> {
        self.ops()
            .into_iter()
            .filter(|op| matches!(op, StorageOp::Set(..) | StorageOp::Remove(_)))
            .collect()
    }

    pub fn count_gets(&self, key: &str) -> usize {
        self.ops()
            .iter()
            .filter(|op| matches!(op, StorageOp::Get(k) if k == key))
            .count()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.lock().unwrap().contains_key(key)
    }

    pub fn value(&self, key: &str) -> Option<String> {
        self.entries.lock().unwrap().get(key).cloned()
    }

    pub fn insert(&self, key: &str, value: &str) {
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
    }

    fn record(&self, op: StorageOp) {
        self.ops.lock().unwrap().push(op);
    }
}

impl WebStorage for InMemoryWebStorage {
    fn get(&self, key: String) -> Result<Option<String>, WebStorageError> {
        self.record(StorageOp::Get(key.clone()));
        let mut faults = self.faults.lock().unwrap();
        if faults.failing_reads > 0 {
            faults.failing_reads -= 1;
            return Err(WebStorageError::Unavailable);
        }
        if key == INIT_MARKER_KEY && faults.stale_reads > 0 {
            faults.stale_reads -= 1;
            return Ok(None);
        }
        Ok(self.entries.lock().unwrap().get(&key).cloned())
    }

    fn set(&self, key: String, value: String) -> Result<(), WebStorageError> {
        self.record(StorageOp::Set(key.clone(), value.clone()));
        if let Some((prefix, error)) = &self.faults.lock().unwrap().failing_writes {
            if key.starts_with(prefix.as_str()) {
                return Err(error.clone());
            }
        }
        self.entries.lock().unwrap().insert(key, value);
        Ok(())
    }

    fn remove(&self, key: String) -> Result<(), WebStorageError> {
        self.record(StorageOp::Remove(key.clone()));
        {
            let mut faults = self.faults.lock().unwrap();
            if faults.failing_removes > 0 {
                faults.failing_removes -= 1;
                return Err(WebStorageError::Unavailable);
            }
        }
        self.entries.lock().unwrap().remove(&key);
        Ok(())
    }

    fn length(&self) -> Result<u64, WebStorageError> {
        self.record(StorageOp::Length);
        if self.faults.lock().unwrap().failing_length {
            return Err(WebStorageError::Unavailable);
        }
        Ok(self.entries.lock().unwrap().len() as u64)
    }
}

/// Scheduler with a virtual clock. `sleep` records the request, advances the clock and yields.
pub struct RecordingScheduler {
    now_millis: Mutex<i64>,
    sleeps: Mutex<Vec<Duration>>,
}

impl RecordingScheduler {
    pub const fn new(start_millis: i64) -> Self {
        Self {
            now_millis: Mutex::new(start_millis),
            sleeps: Mutex::new(Vec::new()),
        }
    }

    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().unwrap().clone()
    }
}

#[async_trait]
impl Scheduler for RecordingScheduler {
    async fn sleep(&self, duration: Duration) {
        self.sleeps.lock().unwrap().push(duration);
        *self.now_millis.lock().unwrap() += i64::try_from(duration.as_millis()).unwrap();
        tokio::task::yield_now().await;
    }

    fn now_millis(&self) -> i64 {
        *self.now_millis.lock().unwrap()
    }
}

/// What the fake native routine answers.
#[derive(Debug, Clone)]
pub enum BridgeBehavior {
    Copy,
    Decline,
    Fail(String),
}

/// Native bridge double that records calls and can hold the call open until released.
pub struct RecordingBridge {
    behavior: BridgeBehavior,
    calls: Mutex<Vec<(String, String)>>,
    log_contexts: Mutex<Vec<Option<String>>>,
    gated: bool,
    entered: Notify,
    release: Notify,
}

impl RecordingBridge {
    pub fn new(behavior: BridgeBehavior) -> Self {
        Self {
            behavior,
            calls: Mutex::new(Vec::new()),
            log_contexts: Mutex::new(Vec::new()),
            gated: false,
            entered: Notify::new(),
            release: Notify::new(),
        }
    }

    /// Holds every call open until [`RecordingBridge::release`] is called.
    pub fn gated(mut self) -> Self {
        self.gated = true;
        self
    }

    pub async fn wait_until_entered(&self) {
        self.entered.notified().await;
    }

    pub fn release(&self) {
        self.release.notify_one();
    }

    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }

    /// Logging context seen by each call.
    pub fn log_contexts(&self) -> Vec<Option<String>> {
        self.log_contexts.lock().unwrap().clone()
    }
}

#[async_trait]
impl NativeMigrationBridge for RecordingBridge {
    async fn exec(&self, plugin: String, action: String) -> Result<bool, NativeBridgeError> {
        self.calls.lock().unwrap().push((plugin, action));
        self.log_contexts
            .lock()
            .unwrap()
            .push(crate::primitives::logger::get_context());
        if self.gated {
            self.entered.notify_one();
            self.release.notified().await;
        }
        match &self.behavior {
            BridgeBehavior::Copy => Ok(true),
            BridgeBehavior::Decline => Ok(false),
            BridgeBehavior::Fail(message) => Err(NativeBridgeError::ActionFailed {
                message: message.clone(),
            }),
        }
    }
}

/// Callback pair that records every delivery.
#[derive(Default)]
pub struct RecordingCallbacks {
    successes: Mutex<Vec<bool>>,
    failures: Mutex<Vec<MigrationFailure>>,
    deliveries: AtomicU32,
}

impl RecordingCallbacks {
    pub fn successes(&self) -> Vec<bool> {
        self.successes.lock().unwrap().clone()
    }

    pub fn failures(&self) -> Vec<MigrationFailure> {
        self.failures.lock().unwrap().clone()
    }

    pub fn deliveries(&self) -> u32 {
        self.deliveries.load(Ordering::SeqCst)
    }
}

impl MigrationCallbacks for RecordingCallbacks {
    fn on_success(&self, migrated: bool) {
        self.deliveries.fetch_add(1, Ordering::SeqCst);
        self.successes.lock().unwrap().push(migrated);
    }

    fn on_error(&self, failure: MigrationFailure) {
        self.deliveries.fetch_add(1, Ordering::SeqCst);
        self.failures.lock().unwrap().push(failure);
    }
}
