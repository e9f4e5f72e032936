use std::sync::Arc;

use once_cell::sync::Lazy;
use tokio::sync::Mutex;

use crate::migration::delivery::{CallbackDelivery, MigrationCallbacks};
use crate::migration::error::{MigrationError, MigrationResult};
use crate::migration::handshake::ReadinessHandshake;
use crate::migration::state::{MigrationOutcome, MigrationReport};
use crate::migration::{INIT_MARKER_KEY, REFRESH_KEY_PREFIX};
use crate::primitives::config::{current_config, MarkerRetention, MigrationConfig};
use crate::primitives::native_bridge::{
    NativeMigrationBridge, MIGRATION_ACTION, MIGRATION_PLUGIN_ID,
};
use crate::primitives::scheduler::{Scheduler, TokioScheduler};
use crate::primitives::web_storage::WebStorage;
use crate::migrator_export;

/// Process-wide lock so only one migration touches the reserved keys at a time, no matter how
/// many [`MigrationCoordinator`] instances exist.
static MIGRATION_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

const ALREADY_IN_PROGRESS: &str =
    "Migration is already in progress. Please wait for the current migration to complete.";

/// Runs the one-time `localStorage` migration into the current web engine.
///
/// Every call is independent: it carries its own readiness token and attempt counters, and
/// nothing about a call outlives it except what it wrote to storage.
#[derive(uniffi::Object)]
pub struct MigrationCoordinator {
    storage: Arc<dyn WebStorage>,
    bridge: Arc<dyn NativeMigrationBridge>,
    scheduler: Arc<dyn Scheduler>,
    config: MigrationConfig,
}

#[migrator_export]
impl MigrationCoordinator {
    /// Creates a coordinator over the host's storage and native bridge, using the global
    /// [`MigrationConfig`] and real timers.
    #[uniffi::constructor]
    pub fn new(
        storage: Arc<dyn WebStorage>,
        bridge: Arc<dyn NativeMigrationBridge>,
    ) -> Arc<Self> {
        Self::with_dependencies(storage, bridge, Arc::new(TokioScheduler), current_config())
    }

    /// Runs the migration and resolves to its boolean result.
    ///
    /// `true` when the storage already held data or the copy succeeded, `false` when the native
    /// routine declined without an error.
    ///
    /// # Errors
    ///
    /// - `MigrationError::InvalidOperation` if another migration is running in this process
    /// - `MigrationError::Storage` if the storage fails while the migration is being armed
    /// - `MigrationError::StorageInitializationTimeout` if the storage never became ready
    /// - `MigrationError::NativeMigration` if the native copy failed
    pub async fn migrate(&self) -> Result<bool, MigrationError> {
        self.migrate_with_report()
            .await
            .map(|report| report.outcome.succeeded())
    }

    /// Runs the migration and returns the detailed report.
    ///
    /// # Errors
    ///
    /// Same as [`MigrationCoordinator::migrate`].
    pub async fn migrate_with_report(&self) -> Result<MigrationReport, MigrationError> {
        let _guard = MIGRATION_LOCK
            .try_lock()
            .map_err(|_| MigrationError::InvalidOperation(ALREADY_IN_PROGRESS.to_string()))?;

        self.run_migration().await
    }

    /// Runs the migration and reports through `callbacks` instead of a return value.
    ///
    /// Exactly one of `on_success` / `on_error` is invoked, exactly once.
    pub async fn migrate_with_callbacks(&self, callbacks: Arc<dyn MigrationCallbacks>) {
        let delivery = CallbackDelivery::new(callbacks);
        let result = self.migrate().await;
        delivery.deliver(&result);
    }

    /// Removes the init marker so the next call starts from a clean slate.
    ///
    /// **Developer/testing use only.** Application data is left untouched, so with a populated
    /// storage the next call still skips.
    ///
    /// # Errors
    ///
    /// - `MigrationError::InvalidOperation` if a migration is running
    /// - `MigrationError::Storage` if the removal fails
    pub fn reset_markers(&self) -> Result<(), MigrationError> {
        let _guard = MIGRATION_LOCK
            .try_lock()
            .map_err(|_| MigrationError::InvalidOperation(ALREADY_IN_PROGRESS.to_string()))?;

        self.storage.remove(INIT_MARKER_KEY.to_string())?;
        crate::info!("migration_markers.reset key={}", INIT_MARKER_KEY);
        Ok(())
    }
}

impl MigrationCoordinator {
    /// Creates a coordinator with every collaborator injected.
    #[must_use]
    pub fn with_dependencies(
        storage: Arc<dyn WebStorage>,
        bridge: Arc<dyn NativeMigrationBridge>,
        scheduler: Arc<dyn Scheduler>,
        config: MigrationConfig,
    ) -> Arc<Self> {
        Arc::new(Self {
            storage,
            bridge,
            scheduler,
            config,
        })
    }

    /// The config this coordinator runs with.
    #[must_use]
    pub const fn config(&self) -> &MigrationConfig {
        &self.config
    }

    async fn run_migration(&self) -> MigrationResult<MigrationReport> {
        let started_at = self.scheduler.now_millis();

        let entries = self.storage.length().inspect_err(|e| {
            crate::error!("migration.storage_error stage=skip_check error={}", e);
        })?;
        if self.config.skip_threshold.is_met(entries) {
            crate::info!(
                "migration.skipped reason=already_populated entries={} threshold={:?}",
                entries,
                self.config.skip_threshold
            );
            return Ok(self.report(MigrationOutcome::AlreadyMigrated, 0, started_at));
        }

        crate::info!(
            "migration.started entries={} max_attempts={} poll_interval_ms={}",
            entries,
            self.config.max_attempts,
            self.config.poll_interval_ms
        );

        let result = self.run_armed(started_at).await;
        if !matches!(&result, Ok(report) if report.outcome == MigrationOutcome::Migrated) {
            self.discard_init_marker();
        }
        result
    }

    /// Everything after the skip-check. The init marker may be left in storage on any exit.
    async fn run_armed(&self, started_at: i64) -> MigrationResult<MigrationReport> {
        let handshake = ReadinessHandshake::new(
            self.storage.as_ref(),
            self.scheduler.as_ref(),
            &self.config,
        );
        let poll_attempts = handshake.run().await?;

        if self.config.marker_retention == MarkerRetention::RemoveOnReady {
            self.storage
                .remove(INIT_MARKER_KEY.to_string())
                .inspect_err(|e| {
                    crate::error!("migration.storage_error stage=marker_remove error={}", e);
                })?;
        }

        let copied = self
            .bridge
            .exec(MIGRATION_PLUGIN_ID.to_string(), MIGRATION_ACTION.to_string())
            .await
            .inspect_err(|e| {
                crate::error!(
                    "migration.native_failed plugin={} action={} error={}",
                    MIGRATION_PLUGIN_ID,
                    MIGRATION_ACTION,
                    e
                );
            })?;

        if !copied {
            // No error and no data: resolved as `false` without settling
            crate::warn!(
                "migration.native_declined plugin={} action={} poll_attempts={}",
                MIGRATION_PLUGIN_ID,
                MIGRATION_ACTION,
                poll_attempts
            );
            return Ok(self.report(MigrationOutcome::NativeDeclined, poll_attempts, started_at));
        }

        self.settle().await;

        let report = self.report(MigrationOutcome::Migrated, poll_attempts, started_at);
        crate::info!(
            "migration.succeeded poll_attempts={} duration_ms={}",
            report.poll_attempts,
            report.duration_ms
        );
        Ok(report)
    }

    /// Waits the settle delay, then writes and removes a throwaway key so the engine picks up
    /// the copied data. Failures here are logged only; the copy already succeeded.
    async fn settle(&self) {
        self.scheduler.sleep(self.config.settle_delay()).await;

        let refresh_key = format!("{REFRESH_KEY_PREFIX}{}", self.scheduler.now_millis());
        crate::debug!("migration.settle key={}", refresh_key);

        if let Err(e) = self.storage.set(refresh_key.clone(), "true".to_string()) {
            crate::warn!("migration.settle_failed op=set key={} error={}", refresh_key, e);
            return;
        }
        if let Err(e) = self.storage.remove(refresh_key.clone()) {
            crate::warn!(
                "migration.settle_failed op=remove key={} error={}",
                refresh_key,
                e
            );
        }
    }

    /// Best-effort removal of the marker after an attempt that did not migrate, so the next
    /// launch does not count it as data.
    fn discard_init_marker(&self) {
        if let Err(e) = self.storage.remove(INIT_MARKER_KEY.to_string()) {
            crate::warn!("migration.marker_cleanup_failed key={} error={}", INIT_MARKER_KEY, e);
        }
    }

    fn report(
        &self,
        outcome: MigrationOutcome,
        poll_attempts: u32,
        started_at: i64,
    ) -> MigrationReport {
        MigrationReport {
            outcome,
            poll_attempts,
            duration_ms: self.scheduler.now_millis() - started_at,
        }
    }
}
