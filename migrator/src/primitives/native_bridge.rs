/// Plugin identifier the native copy routine is registered under.
pub const MIGRATION_PLUGIN_ID: &str = "MigrateLocalStorage";

/// Action identifier of the native copy routine.
pub const MIGRATION_ACTION: &str = "migrate";

/// Bridge to native plugin actions, implemented by the host app.
///
/// The migrator calls exactly one action, [`MIGRATION_ACTION`] on [`MIGRATION_PLUGIN_ID`], which
/// copies the previous engine's `localStorage` database into the current one. How the copy is
/// performed (reading the old SQLite file, injecting script, ...) is up to the host.
///
/// Native implementations should map platform failures to the appropriate
/// [`NativeBridgeError`] variant. The error message is handed to the caller verbatim.
#[uniffi::export(with_foreign)]
#[async_trait::async_trait]
pub trait NativeMigrationBridge: Send + Sync {
    /// Executes `action` on `plugin`.
    ///
    /// # Returns
    /// * `Ok(true)` when the copy completed
    /// * `Ok(false)` when the native side declined without reporting an error
    ///
    /// # Errors
    /// * `NativeBridgeError::PluginNotFound` when no plugin is registered under `plugin`
    /// * `NativeBridgeError::ActionFailed` when the native routine reports a failure
    async fn exec(&self, plugin: String, action: String) -> Result<bool, NativeBridgeError>;
}

/// Errors reported by the native side of the bridge.
#[crate::migrator_error]
pub enum NativeBridgeError {
    /// No plugin is registered under the requested identifier
    #[error("native plugin {plugin} is not registered")]
    PluginNotFound {
        /// The plugin identifier that was requested
        plugin: String,
    },
    /// The native routine ran and failed
    #[error("{message}")]
    ActionFailed {
        /// Failure description from the native side
        message: String,
    },
}

/// Converts unexpected UniFFI callback errors (host exceptions) into `NativeBridgeError`.
///
/// Without this, an exception thrown by the host's bridge would panic Rust code.
impl From<uniffi::UnexpectedUniFFICallbackError> for NativeBridgeError {
    fn from(error: uniffi::UnexpectedUniFFICallbackError) -> Self {
        Self::Generic {
            message: error.reason,
        }
    }
}
