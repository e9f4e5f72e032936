use thiserror::Error;

/// Errors surfaced by the host's web storage implementation
#[allow(clippy::module_name_repetitions)]
#[derive(Debug, Clone, PartialEq, Eq, Error, uniffi::Error)]
pub enum WebStorageError {
    /// The storage subsystem cannot be reached yet (e.g. the web view is still loading)
    #[error("web storage is unavailable")]
    Unavailable,
    /// Writing the value would exceed the engine's storage quota
    #[error("web storage quota exceeded")]
    QuotaExceeded,
    /// Failed to write or remove the value
    #[error("failed to update value")]
    UpdateFailure,
    /// An unexpected error occurred in the foreign callback
    #[error("unexpected error in foreign callback: {0}")]
    UnexpectedUniFFICallbackError(String),
}

impl From<uniffi::UnexpectedUniFFICallbackError> for WebStorageError {
    fn from(e: uniffi::UnexpectedUniFFICallbackError) -> Self {
        Self::UnexpectedUniFFICallbackError(e.reason)
    }
}

/// The `localStorage` of the web engine that is the migration target.
///
/// Implemented by the host app, usually by evaluating script in the web view or by talking to the
/// engine's storage API directly. Values are strings, exactly as in `window.localStorage`.
///
/// The migrator only ever writes its own reserved keys (see
/// [`INIT_MARKER_KEY`](crate::migration::INIT_MARKER_KEY) and
/// [`REFRESH_KEY_PREFIX`](crate::migration::REFRESH_KEY_PREFIX)); application data is only ever
/// counted, never read or written.
#[uniffi::export(with_foreign)]
pub trait WebStorage: Send + Sync {
    /// Returns the value stored under `key`, or `None` if there is none.
    ///
    /// # Errors
    /// - `WebStorageError::Unavailable` if the storage cannot be read right now
    fn get(&self, key: String) -> Result<Option<String>, WebStorageError>;

    /// Stores `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    /// - `WebStorageError::QuotaExceeded` if the engine refuses the write
    /// - `WebStorageError::UpdateFailure` for any other write failure
    fn set(&self, key: String, value: String) -> Result<(), WebStorageError>;

    /// Removes `key`. Removing a key that does not exist is not an error.
    ///
    /// # Errors
    /// - `WebStorageError::UpdateFailure` if the removal fails
    fn remove(&self, key: String) -> Result<(), WebStorageError>;

    /// Returns the number of entries currently stored (`localStorage.length`).
    ///
    /// # Errors
    /// - `WebStorageError::Unavailable` if the storage cannot be read right now
    fn length(&self) -> Result<u64, WebStorageError>;
}
