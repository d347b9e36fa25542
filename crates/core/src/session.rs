//! Opaque session tokens and dev-login username handling.
//!
//! Tokens are 256 random bits rendered as hex. Only the SHA-256 digest is
//! persisted, so a database leak does not expose live sessions.

use std::sync::LazyLock;

use regex::Regex;

use crate::hashing::{hex_encode, sha256_hex};

/// Default session lifetime.
pub const DEFAULT_SESSION_TTL_DAYS: i64 = 30;

/// Length of a plaintext token (32 bytes as hex).
pub const SESSION_TOKEN_LENGTH: usize = 64;

/// Longest handle accepted for dev accounts.
pub const MAX_DEV_HANDLE_LENGTH: usize = 32;

static DISALLOWED_HANDLE_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9_]+").expect("valid regex"));

/// A freshly issued session token.
pub struct GeneratedSessionToken {
    /// Returned to the client once, never stored.
    pub plaintext: String,
    /// SHA-256 hex digest stored in `sessions.token_hash`.
    pub hash: String,
}

/// Generate a new random session token.
pub fn generate_session_token() -> GeneratedSessionToken {
    let bytes: [u8; 32] = rand::random();
    let plaintext = hex_encode(bytes);
    let hash = hash_session_token(&plaintext);
    GeneratedSessionToken { plaintext, hash }
}

/// Digest used to look a presented token up.
pub fn hash_session_token(token: &str) -> String {
    sha256_hex(token.as_bytes())
}

/// Normalize a dev-login username into a stable handle.
///
/// Lowercases, replaces runs of anything outside `[a-z0-9_]` with `_`, trims
/// leading/trailing underscores and truncates. Returns `None` if nothing
/// usable remains.
pub fn sanitize_dev_handle(username: &str) -> Option<String> {
    let lowered = username.trim().to_lowercase();
    let replaced = DISALLOWED_HANDLE_CHARS.replace_all(&lowered, "_");
    let trimmed = replaced.trim_matches('_');
    let handle: String = trimmed.chars().take(MAX_DEV_HANDLE_LENGTH).collect();
    if handle.is_empty() {
        None
    } else {
        Some(handle)
    }
}
