/// Process-wide migration configuration.
pub mod config;

/// Logging bridge to the host platform.
pub mod logger;

/// The native side of the copy, reached through the host's plugin bridge.
pub mod native_bridge;

/// Timer and clock injection.
pub mod scheduler;

/// The web engine's key-value storage as seen from Rust.
pub mod web_storage;
