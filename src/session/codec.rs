use base64::{engine::general_purpose, Engine as _};
use hmac::{Hmac, Mac};
use serde_json::Value;
use sha1::Sha1;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, warn};

use crate::config::SessionConfig;

type HmacSha1 = Hmac<Sha1>;

/// A session mapping: string keys to arbitrary JSON-shaped values.
pub type Session = serde_json::Map<String, Value>;

/// HMAC-SHA1 digest length; fixed by the algorithm, independent of content.
pub const DIGEST_LEN: usize = 20;
/// Little-endian unix timestamp appended to the serialized session.
pub const TIMESTAMP_LEN: usize = 8;

const TRAILER_LEN: usize = DIGEST_LEN + TIMESTAMP_LEN;

/// Errors from the session-cookie codec.
///
/// Integrity failures (signature mismatch) are *not* errors: decode fails
/// closed by returning an empty session so the caller cannot be used as a
/// verification oracle.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// No secret key configured; fatal to any cookie operation.
    #[error("no session secret configured, set one before using cookies")]
    MissingSecret,
    /// The cookie is absent or empty. Expected, treated as "no session".
    #[error("session cookie is absent or empty")]
    NoCookie,
    /// Malformed base64 transport encoding.
    #[error("session cookie is not valid base64: {0}")]
    Decode(#[from] base64::DecodeError),
    /// Decoded buffer too short to carry the timestamp and digest.
    #[error("session cookie too short to carry a signature ({len} bytes)")]
    Truncated { len: usize },
    /// The session map failed to serialize.
    #[error("session failed to serialize: {0}")]
    Serialize(#[source] serde_json::Error),
    /// The payload failed to deserialize *after* the signature verified.
    ///
    /// This indicates local corruption of correctly signed bytes and is a
    /// hard error, unlike every other decode failure.
    #[error("signed session payload failed to deserialize: {0}")]
    Deserialize(#[source] serde_json::Error),
}

/// Result of decoding a cookie: the session values plus the unix timestamp
/// embedded at encode time.
///
/// `issued_at` is `None` when the cookie failed verification and the codec
/// fell back to an empty session. Expiry enforcement is left entirely to
/// the caller.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct DecodedSession {
    pub values: Session,
    pub issued_at: Option<i64>,
}

impl DecodedSession {
    fn empty() -> Self {
        Self::default()
    }
}

fn keyed_mac(config: &SessionConfig) -> Result<HmacSha1, SessionError> {
    if !config.has_secret() {
        return Err(SessionError::MissingSecret);
    }
    // HMAC accepts keys of any length, so this cannot fail for a non-empty
    // secret; map the impossible case to MissingSecret rather than panic.
    HmacSha1::new_from_slice(config.secret()).map_err(|_| SessionError::MissingSecret)
}

fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

/// Encode a session into a tamper-evident cookie value.
///
/// Serializes the map to JSON, appends the current unix timestamp (8-byte
/// little-endian) and an HMAC-SHA1 digest over both, then base64-encodes
/// the whole buffer.
///
/// # Errors
///
/// `MissingSecret` if no secret key is configured, `Serialize` if the map
/// cannot be serialized.
pub fn encode_session(session: &Session, config: &SessionConfig) -> Result<String, SessionError> {
    let mut mac = keyed_mac(config)?;

    let mut buf = serde_json::to_vec(session).map_err(SessionError::Serialize)?;
    buf.extend_from_slice(&unix_now().to_le_bytes());

    mac.update(&buf);
    let digest = mac.finalize().into_bytes();
    buf.extend_from_slice(&digest);

    debug!(
        payload_len = buf.len() - TRAILER_LEN,
        keys = session.len(),
        "session encoded"
    );
    Ok(general_purpose::STANDARD.encode(&buf))
}

/// Decode a cookie value back into a session.
///
/// Verification failures fail closed: a signature mismatch returns an empty
/// [`DecodedSession`], observably identical to an absent cookie apart from
/// a `warn!` log line.
///
/// # Errors
///
/// - `NoCookie` for an empty value,
/// - `MissingSecret` if no secret key is configured,
/// - `Decode` / `Truncated` for a malformed transport encoding,
/// - `Deserialize` when a correctly signed payload is not a JSON object —
///   the one decode failure that is surfaced as a hard error.
pub fn decode_session(value: &str, config: &SessionConfig) -> Result<DecodedSession, SessionError> {
    if value.is_empty() {
        return Err(SessionError::NoCookie);
    }
    let mut mac = keyed_mac(config)?;

    let buf = general_purpose::STANDARD.decode(value)?;
    if buf.len() < TRAILER_LEN {
        return Err(SessionError::Truncated { len: buf.len() });
    }

    let (signed, digest) = buf.split_at(buf.len() - DIGEST_LEN);
    let (payload, ts_bytes) = signed.split_at(signed.len() - TIMESTAMP_LEN);

    mac.update(signed);
    if mac.verify_slice(digest).is_err() {
        warn!("session cookie signature mismatch, treating as absent");
        return Ok(DecodedSession::empty());
    }

    let values: Session = serde_json::from_slice(payload).map_err(SessionError::Deserialize)?;

    let mut ts = [0u8; TIMESTAMP_LEN];
    ts.copy_from_slice(ts_bytes);
    let issued_at = i64::from_le_bytes(ts);

    debug!(keys = values.len(), issued_at, "session decoded");
    Ok(DecodedSession {
        values,
        issued_at: Some(issued_at),
    })
}
