use std::time::Duration;

use crate::primitives::config::MigrationConfig;

const TOKEN_PREFIX: &str = "init-";

/// Value written to the init marker key for one migration attempt.
///
/// Combines the attempt's start time with a random nonce, so a marker left behind by an earlier
/// attempt (even one started in the same millisecond) never matches.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReadinessToken(String);

impl ReadinessToken {
    /// Generates a fresh token for an attempt starting at `now_millis`.
    #[must_use]
    pub fn generate(now_millis: i64) -> Self {
        Self::from_parts(now_millis, rand::random::<u32>())
    }

    /// Builds the token for a known timestamp and nonce.
    #[must_use]
    pub fn from_parts(now_millis: i64, nonce: u32) -> Self {
        Self(format!("{TOKEN_PREFIX}{now_millis}-{nonce:08x}"))
    }

    /// The token as written to storage.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether a storage readback proves our write is visible.
    #[must_use]
    pub fn matches(&self, readback: Option<&str>) -> bool {
        readback == Some(self.as_str())
    }
}

impl std::fmt::Display for ReadinessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Phase of the readiness handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeState {
    /// Nothing written yet.
    Init,
    /// Marker written; waiting for the next tick.
    Polling {
        /// Ticks consumed so far
        attempts_made: u32,
    },
    /// The marker read back equal to the token.
    Ready {
        /// Tick on which the match happened
        attempts_made: u32,
    },
    /// `max_attempts` ticks passed without a match.
    Failed {
        /// Ticks consumed (equal to `max_attempts`)
        attempts_made: u32,
    },
}

/// Attempt-scoped bookkeeping for one readiness handshake.
///
/// Created when the marker is written and dropped when the handshake resolves. Transitions only
/// happen through [`AttemptState::tick`], which keeps the state machine testable without timers.
#[derive(Debug, Clone)]
pub struct AttemptState {
    token: ReadinessToken,
    attempts_made: u32,
    max_attempts: u32,
    poll_interval: Duration,
    state: HandshakeState,
}

impl AttemptState {
    /// Starts tracking an attempt whose marker holds `token`.
    #[must_use]
    pub fn new(token: ReadinessToken, config: &MigrationConfig) -> Self {
        Self {
            token,
            attempts_made: 0,
            max_attempts: config.max_attempts,
            poll_interval: config.poll_interval(),
            state: HandshakeState::Init,
        }
    }

    /// Records that the marker was written. Moves `Init` to `Polling`.
    pub fn armed(&mut self) -> HandshakeState {
        if self.state == HandshakeState::Init {
            self.state = HandshakeState::Polling { attempts_made: 0 };
        }
        self.state
    }

    /// Feeds one poll tick's readback of the marker key and returns the new state.
    ///
    /// Ticks after a terminal state are ignored.
    pub fn tick(&mut self, readback: Option<&str>) -> HandshakeState {
        if !matches!(self.state, HandshakeState::Polling { .. }) {
            return self.state;
        }

        self.attempts_made += 1;
        self.state = if self.token.matches(readback) {
            HandshakeState::Ready {
                attempts_made: self.attempts_made,
            }
        } else if self.attempts_made < self.max_attempts {
            HandshakeState::Polling {
                attempts_made: self.attempts_made,
            }
        } else {
            HandshakeState::Failed {
                attempts_made: self.attempts_made,
            }
        };
        self.state
    }

    /// The token this attempt wrote.
    #[must_use]
    pub const fn token(&self) -> &ReadinessToken {
        &self.token
    }

    /// Ticks consumed so far.
    #[must_use]
    pub const fn attempts_made(&self) -> u32 {
        self.attempts_made
    }

    /// Delay before the next tick.
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Current phase.
    #[must_use]
    pub const fn state(&self) -> HandshakeState {
        self.state
    }
}

/// How a successful migration call ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, uniffi::Enum)]
pub enum MigrationOutcome {
    /// The storage already held data; nothing was done.
    AlreadyMigrated,
    /// The native copy succeeded and storage was settled.
    Migrated,
    /// The native routine returned `false` without an error. Nothing was settled.
    NativeDeclined,
}

impl MigrationOutcome {
    /// The boolean handed to promise-style and callback-style callers.
    #[must_use]
    pub const fn succeeded(self) -> bool {
        match self {
            Self::AlreadyMigrated | Self::Migrated => true,
            Self::NativeDeclined => false,
        }
    }
}

/// Detailed result of one migration call.
#[derive(Debug, Clone, PartialEq, Eq, uniffi::Record)]
pub struct MigrationReport {
    /// How the call ended.
    pub outcome: MigrationOutcome,
    /// Poll ticks used by the readiness handshake (0 when skipped).
    pub poll_attempts: u32,
    /// Wall-clock time spent in the call, in milliseconds.
    pub duration_ms: i64,
}
