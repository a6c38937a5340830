//! Signed, self-contained session cookies.
//!
//! A session is a JSON-shaped key/value map carried entirely inside a
//! cookie — there is no server-side store, so the cookie must be
//! self-verifying. The wire format is:
//!
//! ```text
//! base64( json(session) ∥ 8-byte LE unix timestamp ∥ HMAC-SHA1 digest )
//! ```
//!
//! The digest covers exactly the bytes preceding it. Decoding recomputes it
//! with the configured secret and compares in constant time; a mismatch
//! yields an *empty* session rather than an error, so a forged cookie is
//! indistinguishable from no cookie at all.
//!
//! The embedded timestamp is deliberately not checked for expiry here — it
//! is surfaced through [`DecodedSession::issued_at`] for callers that want
//! to enforce their own.

mod codec;

pub use codec::{
    decode_session, encode_session, DecodedSession, Session, SessionError, DIGEST_LEN,
    TIMESTAMP_LEN,
};
