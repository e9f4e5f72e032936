use crate::primitives::native_bridge::NativeBridgeError;
use crate::primitives::web_storage::WebStorageError;

/// Errors that can end a migration call
#[crate::migrator_error]
pub enum MigrationError {
    /// An invalid operation was attempted, e.g. a second migration while one is running
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// The readiness handshake never read its marker back
    #[error("Storage initialization failed after {attempts} attempts")]
    StorageInitializationTimeout {
        /// Poll ticks that were tried
        attempts: u32,
    },

    /// The native copy reported an error
    #[error(transparent)]
    NativeMigration(#[from] NativeBridgeError),

    /// The storage subsystem failed while the migration was being armed
    #[error(transparent)]
    Storage(#[from] WebStorageError),
}

impl MigrationError {
    /// Stable category for callers that branch on the failure kind.
    #[must_use]
    pub const fn kind(&self) -> MigrationFailureKind {
        match self {
            Self::InvalidOperation(_) => MigrationFailureKind::InvalidOperation,
            Self::StorageInitializationTimeout { .. } => {
                MigrationFailureKind::StorageInitializationTimeout
            }
            Self::NativeMigration(_) => MigrationFailureKind::NativeMigration,
            Self::Storage(_) | Self::Generic { .. } => MigrationFailureKind::Unexpected,
        }
    }
}

/// Failure categories handed to [`MigrationCallbacks`](crate::migration::MigrationCallbacks).
#[derive(Debug, Clone, Copy, PartialEq, Eq, uniffi::Enum)]
pub enum MigrationFailureKind {
    /// A migration was already running.
    InvalidOperation,
    /// Storage never became ready.
    StorageInitializationTimeout,
    /// The native copy failed.
    NativeMigration,
    /// Storage or another unexpected failure while arming the migration.
    Unexpected,
}

/// A failure as delivered to the error callback.
#[derive(Debug, Clone, PartialEq, Eq, uniffi::Record)]
pub struct MigrationFailure {
    /// Failure category
    pub kind: MigrationFailureKind,
    /// The error's message, verbatim
    pub message: String,
}

impl From<&MigrationError> for MigrationFailure {
    fn from(error: &MigrationError) -> Self {
        Self {
            kind: error.kind(),
            message: error.to_string(),
        }
    }
}

/// Result type for migration operations
pub type MigrationResult<T> = std::result::Result<T, MigrationError>;
