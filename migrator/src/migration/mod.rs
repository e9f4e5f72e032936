//! Local storage migration
//!
//! Moves `localStorage` into a new web engine exactly once, by delegating the copy to a native
//! routine and guarding it with a readiness check.
//!
//! # Overview
//!
//! - [`MigrationCoordinator`]: the entry point, one call runs the whole protocol
//! - [`ReadinessHandshake`]: token write + poll readback proving the storage engine is live
//! - [`AttemptState`]: attempt-scoped counters and the handshake's `tick` transition
//! - [`MigrationCallbacks`]: callback-style result delivery for hosts that do not await
//!
//! A call goes through five stages:
//!
//! 1. **Skip-check**: if the storage already holds entries above the configured
//!    [`SkipThreshold`](crate::primitives::config::SkipThreshold), resolve `true` right away.
//! 2. **Readiness handshake**: write a fresh token to [`INIT_MARKER_KEY`], read it back once per
//!    poll interval, give up after `max_attempts` ticks.
//! 3. **Delegated copy**: call the native `MigrateLocalStorage.migrate` action.
//! 4. **Settle**: wait the settle delay, then write and remove a `__refresh_<millis>` key so the
//!    engine notices its store changed.
//! 5. **Delivery**: exactly one result per call.
//!
//! # Usage
//!
//! ```swift
//! let coordinator = MigrationCoordinator(storage: webViewStorage, bridge: pluginBridge)
//! let migrated = try await coordinator.migrate()
//! ```
//!
//! ```kotlin
//! val coordinator = MigrationCoordinator(webViewStorage, pluginBridge)
//! coordinator.migrateWithCallbacks(object : MigrationCallbacks {
//!     override fun onSuccess(migrated: Boolean) { /* ... */ }
//!     override fun onError(failure: MigrationFailure) { /* ... */ }
//! })
//! ```
//!
//! # Reserved keys
//!
//! The coordinator only ever writes [`INIT_MARKER_KEY`] and keys starting with
//! [`REFRESH_KEY_PREFIX`]. Application data is counted, never read or written.

mod coordinator;
mod delivery;
mod error;
mod handshake;
mod state;

/// Storage key holding the readiness token of the current attempt.
pub const INIT_MARKER_KEY: &str = "__MigrateLocalStorageInit";

/// Prefix of the transient key written and removed after a successful copy.
pub const REFRESH_KEY_PREFIX: &str = "__refresh_";

pub use coordinator::MigrationCoordinator;
pub use delivery::MigrationCallbacks;
pub use error::{
    MigrationError, MigrationFailure, MigrationFailureKind, MigrationResult,
};
pub use handshake::ReadinessHandshake;
pub use state::{
    AttemptState, HandshakeState, MigrationOutcome, MigrationReport, ReadinessToken,
};
