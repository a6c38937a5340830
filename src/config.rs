//! Process configuration loaded once at startup.
//!
//! Two independent pieces:
//!
//! - [`SessionConfig`] holds the secret key for the session-cookie codec.
//!   It is constructed once during startup and passed by reference into
//!   every encode/decode call; there is no process-global key.
//! - [`RuntimeConfig`] tunes the coroutine runtime (stack size).
//!
//! ## Environment Variables
//!
//! - `WAYPOST_SECRET` — the signing secret for session cookies.
//! - `WAYPOST_STACK_SIZE` — coroutine stack size in bytes, decimal or
//!   `0x`-prefixed hex (default `0x4000`, 16 KB).

use std::env;
use std::fmt;

/// Secret key configuration for the session-cookie codec.
///
/// Operating without a secret is a configuration error: `encode` and
/// `decode` both refuse to run with an empty key rather than falling back
/// to an unsigned mode.
#[derive(Clone, Default)]
pub struct SessionConfig {
    secret: Vec<u8>,
}

impl SessionConfig {
    /// Create a config with an explicit secret key.
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// Load the secret from `WAYPOST_SECRET`.
    ///
    /// An unset or empty variable yields a config without a secret; cookie
    /// operations against it fail with `SessionError::MissingSecret`.
    pub fn from_env() -> Self {
        let secret = env::var("WAYPOST_SECRET").unwrap_or_default();
        Self {
            secret: secret.into_bytes(),
        }
    }

    /// Raw secret bytes used as the HMAC key.
    #[must_use]
    pub fn secret(&self) -> &[u8] {
        &self.secret
    }

    #[must_use]
    pub fn has_secret(&self) -> bool {
        !self.secret.is_empty()
    }
}

impl fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Never print the key material.
        f.debug_struct("SessionConfig")
            .field("secret_len", &self.secret.len())
            .finish()
    }
}

/// Runtime configuration loaded from environment variables.
#[derive(Debug, Clone, Copy)]
pub struct RuntimeConfig {
    /// Stack size for request coroutines in bytes (default 16 KB).
    pub stack_size: usize,
}

impl RuntimeConfig {
    /// Load configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        let stack_size = match env::var("WAYPOST_STACK_SIZE") {
            Ok(val) => {
                if let Some(hex) = val.strip_prefix("0x") {
                    usize::from_str_radix(hex, 16).unwrap_or(0x4000)
                } else {
                    val.parse().unwrap_or(0x4000)
                }
            }
            Err(_) => 0x4000,
        };
        RuntimeConfig { stack_size }
    }
}
