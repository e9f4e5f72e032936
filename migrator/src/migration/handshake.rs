use crate::migration::error::{MigrationError, MigrationResult};
use crate::migration::state::{AttemptState, HandshakeState, ReadinessToken};
use crate::migration::INIT_MARKER_KEY;
use crate::primitives::config::MigrationConfig;
use crate::primitives::scheduler::Scheduler;
use crate::primitives::web_storage::WebStorage;

/// Proves the web storage is live before anything is migrated into it.
///
/// Writes a fresh [`ReadinessToken`] to [`INIT_MARKER_KEY`] and reads it back once per poll
/// interval. The handshake is ready on the first tick that sees the token, and fails after
/// `max_attempts` ticks without it. The first tick is always one full interval after the write.
pub struct ReadinessHandshake<'a> {
    storage: &'a dyn WebStorage,
    scheduler: &'a dyn Scheduler,
    config: &'a MigrationConfig,
}

impl<'a> ReadinessHandshake<'a> {
    /// Creates a handshake over the given collaborators.
    #[must_use]
    pub const fn new(
        storage: &'a dyn WebStorage,
        scheduler: &'a dyn Scheduler,
        config: &'a MigrationConfig,
    ) -> Self {
        Self {
            storage,
            scheduler,
            config,
        }
    }

    /// Runs the handshake to completion.
    ///
    /// Returns the number of ticks it took to see the marker.
    ///
    /// # Errors
    /// - `MigrationError::Storage` if the marker cannot be written
    /// - `MigrationError::StorageInitializationTimeout` if the marker never reads back
    pub async fn run(&self) -> MigrationResult<u32> {
        let token = ReadinessToken::generate(self.scheduler.now_millis());
        let mut attempt = AttemptState::new(token, self.config);

        crate::debug!("readiness.marker_write token={}", attempt.token());
        self.storage
            .set(INIT_MARKER_KEY.to_string(), attempt.token().to_string())?;
        attempt.armed();

        while let HandshakeState::Polling { .. } = attempt.state() {
            if attempt.attempts_made() > 0 {
                crate::debug!("readiness.waiting attempt={}", attempt.attempts_made());
            }
            self.scheduler.sleep(attempt.poll_interval()).await;

            let readback = self.read_marker(attempt.attempts_made() + 1);
            attempt.tick(readback.as_deref());
        }

        match attempt.state() {
            HandshakeState::Ready { attempts_made } => {
                crate::info!("readiness.ready attempts={}", attempts_made);
                Ok(attempts_made)
            }
            HandshakeState::Failed { attempts_made } => {
                crate::error!(
                    "readiness.failed attempts={} reason=max_attempts_reached",
                    attempts_made
                );
                Err(MigrationError::StorageInitializationTimeout {
                    attempts: attempts_made,
                })
            }
            state => Err(MigrationError::InvalidOperation(format!(
                "readiness handshake stopped in state {state:?}"
            ))),
        }
    }

    /// Reads the marker for one tick. A failing read is the same as a stale one.
    fn read_marker(&self, attempt: u32) -> Option<String> {
        match self.storage.get(INIT_MARKER_KEY.to_string()) {
            Ok(value) => value,
            Err(e) => {
                crate::warn!("readiness.read_failed attempt={} error={}", attempt, e);
                None
            }
        }
    }
}
