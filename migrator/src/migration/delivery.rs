use std::sync::Arc;

use crate::migration::error::{MigrationFailure, MigrationResult};

/// Callback pair for hosts that prefer callbacks over awaiting a result.
///
/// Exactly one of the two methods is called, exactly once, per migration call.
#[uniffi::export(with_foreign)]
pub trait MigrationCallbacks: Send + Sync {
    /// Called with the migration's boolean result.
    fn on_success(&self, migrated: bool);

    /// Called when the migration failed.
    fn on_error(&self, failure: MigrationFailure);
}

/// One-shot handle on a [`MigrationCallbacks`] pair.
///
/// [`CallbackDelivery::deliver`] consumes the handle, so a second delivery for the same call
/// does not compile.
pub(crate) struct CallbackDelivery {
    callbacks: Arc<dyn MigrationCallbacks>,
}

impl CallbackDelivery {
    pub(crate) fn new(callbacks: Arc<dyn MigrationCallbacks>) -> Self {
        Self { callbacks }
    }

    pub(crate) fn deliver(self, result: &MigrationResult<bool>) {
        match result {
            Ok(migrated) => self.callbacks.on_success(*migrated),
            Err(error) => self.callbacks.on_error(MigrationFailure::from(error)),
        }
    }
}
