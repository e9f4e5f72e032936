use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use local_storage_migrator::migration::{MigrationCallbacks, MigrationFailure, INIT_MARKER_KEY};
use local_storage_migrator::primitives::native_bridge::{NativeBridgeError, NativeMigrationBridge};
use local_storage_migrator::primitives::web_storage::{WebStorage, WebStorageError};

/// A storage call stamped with the (virtual) time since the engine was created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimedOp {
    pub at: Duration,
    pub op: String,
    pub key: String,
}

/// `localStorage` of a web engine that only starts serving its own writes at `ready_after`.
///
/// Before that, reads of the init marker come back empty, like an engine whose storage backend
/// is still attaching to the freshly created web view.
pub struct LaggingEngineStorage {
    created: Instant,
    ready_after: Duration,
    entries: Mutex<HashMap<String, String>>,
    ops: Mutex<Vec<TimedOp>>,
}

#[allow(dead_code)]
impl LaggingEngineStorage {
    pub fn new(ready_after: Duration) -> Self {
        Self {
            created: Instant::now(),
            ready_after,
            entries: Mutex::new(HashMap::new()),
            ops: Mutex::new(Vec::new()),
        }
    }

    pub fn live() -> Self {
        Self::new(Duration::ZERO)
    }

    pub fn never_ready() -> Self {
        Self::new(Duration::MAX)
    }

    pub fn with_entry(self, key: &str, value: &str) -> Self {
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        self
    }

    pub fn ops(&self) -> Vec<TimedOp> {
        self.ops.lock().unwrap().clone()
    }

    pub fn ops_named(&self, op: &str) -> Vec<TimedOp> {
        self.ops().into_iter().filter(|o| o.op == op).collect()
    }

    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<_> = self.entries.lock().unwrap().keys().cloned().collect();
        keys.sort();
        keys
    }

    fn record(&self, op: &str, key: &str) {
        self.ops.lock().unwrap().push(TimedOp {
            at: self.created.elapsed(),
            op: op.to_string(),
            key: key.to_string(),
        });
    }
}

impl WebStorage for LaggingEngineStorage {
    fn get(&self, key: String) -> Result<Option<String>, WebStorageError> {
        self.record("get", &key);
        if key == INIT_MARKER_KEY && self.created.elapsed() < self.ready_after {
            return Ok(None);
        }
        Ok(self.entries.lock().unwrap().get(&key).cloned())
    }

    fn set(&self, key: String, value: String) -> Result<(), WebStorageError> {
        self.record("set", &key);
        self.entries.lock().unwrap().insert(key, value);
        Ok(())
    }

    fn remove(&self, key: String) -> Result<(), WebStorageError> {
        self.record("remove", &key);
        self.entries.lock().unwrap().remove(&key);
        Ok(())
    }

    fn length(&self) -> Result<u64, WebStorageError> {
        self.record("length", "");
        Ok(self.entries.lock().unwrap().len() as u64)
    }
}

/// Native plugin host double.
pub struct PluginHost {
    created: Instant,
    answer: fn() -> Result<bool, NativeBridgeError>,
    calls: Mutex<Vec<(Duration, String, String)>>,
}

#[allow(dead_code)]
impl PluginHost {
    pub fn new(answer: fn() -> Result<bool, NativeBridgeError>) -> Self {
        Self {
            created: Instant::now(),
            answer,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn copying() -> Self {
        Self::new(|| Ok(true))
    }

    pub fn calls(&self) -> Vec<(Duration, String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl NativeMigrationBridge for PluginHost {
    async fn exec(&self, plugin: String, action: String) -> Result<bool, NativeBridgeError> {
        self.calls
            .lock()
            .unwrap()
            .push((self.created.elapsed(), plugin, action));
        (self.answer)()
    }
}

/// Host callbacks recording what was delivered.
#[derive(Default)]
pub struct HostCallbacks {
    pub deliveries: Mutex<Vec<Result<bool, MigrationFailure>>>,
}

impl MigrationCallbacks for HostCallbacks {
    fn on_success(&self, migrated: bool) {
        self.deliveries.lock().unwrap().push(Ok(migrated));
    }

    fn on_error(&self, failure: MigrationFailure) {
        self.deliveries.lock().unwrap().push(Err(failure));
    }
}
