#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    dead_code
)]

//! `local_storage_migrator` coordinates the one-time migration of `localStorage` contents when a
//! hybrid mobile app moves from one embedded web engine to another.
//!
//! The byte copy itself is performed by a native routine. This crate owns the protocol around it:
//! skip-check, readiness handshake, delegated copy, post-copy settle and single result delivery.

pub use migrator_macros::{migrator_error, migrator_export};

/// Low level primitives the coordinator is built on: the foreign storage and native bridge
/// traits, the injectable scheduler, configuration and logging.
pub mod primitives;

/// The migration protocol itself. See [`migration::MigrationCoordinator`].
pub mod migration;

#[cfg(test)]
mod test_utils;

uniffi::setup_scaffolding!("local_storage_migrator");
