//! Telegram WebApp `initData` validation.
//!
//! The Mini App passes a form-urlencoded `initData` string. Its `hash` field is
//! `hex(HMAC_SHA256(secret, data_check_string))` where
//! `secret = HMAC_SHA256(key = "WebAppData", msg = bot_token)` and the data-check
//! string is every other `key=value` pair sorted by key and joined by `\n`.

use std::collections::BTreeMap;

use chrono::{Duration, TimeZone, Utc};
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;

use crate::hashing::hex_decode;
use crate::types::Timestamp;

type HmacSha256 = Hmac<Sha256>;

/// Default maximum age of an `initData` payload.
pub const DEFAULT_AUTH_MAX_AGE_SECS: i64 = 24 * 60 * 60;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InitDataError {
    #[error("initData is missing the hash field")]
    MissingHash,

    #[error("initData hash does not match")]
    HashMismatch,

    #[error("initData is missing a valid auth_date")]
    MissingAuthDate,

    #[error("initData has expired")]
    Expired,

    #[error("initData is missing the user field")]
    MissingUser,

    #[error("initData user is malformed: {0}")]
    InvalidUser(String),
}

/// The `user` object embedded in `initData`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TelegramUser {
    pub id: i64,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub language_code: Option<String>,
}

impl TelegramUser {
    /// Best available display name: username, then first + last name, then id.
    pub fn display_name(&self) -> String {
        if let Some(username) = self.username.as_deref().filter(|u| !u.is_empty()) {
            return username.to_string();
        }
        let full = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        if full.is_empty() {
            format!("player_{}", self.id)
        } else {
            full
        }
    }
}

/// Result of a successful validation.
#[derive(Debug, Clone)]
pub struct VerifiedInitData {
    pub user: TelegramUser,
    pub auth_date: Timestamp,
}

/// Validate `init_data` against `bot_token`.
///
/// Rejects payloads whose `auth_date` is older than `max_age` relative to `now`.
pub fn validate_init_data(
    init_data: &str,
    bot_token: &str,
    max_age: Duration,
    now: Timestamp,
) -> Result<VerifiedInitData, InitDataError> {
    let mut fields: BTreeMap<String, String> = url::form_urlencoded::parse(init_data.as_bytes())
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    let hash = fields.remove("hash").ok_or(InitDataError::MissingHash)?;
    let expected = hex_decode(&hash).ok_or(InitDataError::HashMismatch)?;

    let data_check_string = data_check_string(&fields);
    let mut mac = HmacSha256::new_from_slice(&secret_key(bot_token))
        .expect("HMAC accepts any key length");
    mac.update(data_check_string.as_bytes());
    mac.verify_slice(&expected)
        .map_err(|_| InitDataError::HashMismatch)?;

    let auth_date = fields
        .get("auth_date")
        .and_then(|v| v.parse::<i64>().ok())
        .and_then(|secs| Utc.timestamp_opt(secs, 0).single())
        .ok_or(InitDataError::MissingAuthDate)?;
    if now - auth_date > max_age {
        return Err(InitDataError::Expired);
    }

    let raw_user = fields.get("user").ok_or(InitDataError::MissingUser)?;
    let user: TelegramUser = serde_json::from_str(raw_user)
        .map_err(|e| InitDataError::InvalidUser(e.to_string()))?;

    Ok(VerifiedInitData { user, auth_date })
}

fn secret_key(bot_token: &str) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(b"WebAppData").expect("HMAC accepts any key length");
    mac.update(bot_token.as_bytes());
    mac.finalize().into_bytes().to_vec()
}

fn data_check_string(fields: &BTreeMap<String, String>) -> String {
    fields
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Build a signed `initData` string. Used by tests and local tooling that
/// needs to impersonate the Telegram client.
pub fn sign_init_data(pairs: &[(&str, &str)], bot_token: &str) -> String {
    let fields: BTreeMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    let mut mac = HmacSha256::new_from_slice(&secret_key(bot_token))
        .expect("HMAC accepts any key length");
    mac.update(data_check_string(&fields).as_bytes());
    let hash = crate::hashing::hex_encode(mac.finalize().into_bytes());

    let mut serializer = url::form_urlencoded::Serializer::new(String::new());
    for (k, v) in &fields {
        serializer.append_pair(k, v);
    }
    serializer.append_pair("hash", &hash);
    serializer.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    const BOT_TOKEN: &str = "123456:TEST-TOKEN";
    const USER: &str = r#"{"id":777,"first_name":"Luna","username":"luna_dev"}"#;

    fn now() -> Timestamp {
        Utc.timestamp_opt(1_800_000_000, 0).unwrap()
    }

    fn signed(auth_date: i64) -> String {
        let auth = auth_date.to_string();
        sign_init_data(
            &[("auth_date", &auth), ("query_id", "AAE"), ("user", USER)],
            BOT_TOKEN,
        )
    }

    #[test]
    fn accepts_correctly_signed_payload() {
        let data = signed(1_800_000_000 - 60);
        let verified =
            validate_init_data(&data, BOT_TOKEN, Duration::hours(24), now()).unwrap();
        assert_eq!(verified.user.id, 777);
        assert_eq!(verified.user.display_name(), "luna_dev");
    }

    #[test]
    fn rejects_wrong_bot_token() {
        let data = signed(1_800_000_000);
        assert_eq!(
            validate_init_data(&data, "other:token", Duration::hours(24), now()).unwrap_err(),
            InitDataError::HashMismatch
        );
    }

    #[test]
    fn rejects_tampered_field() {
        let data = signed(1_800_000_000).replace("AAE", "AAF");
        assert_eq!(
            validate_init_data(&data, BOT_TOKEN, Duration::hours(24), now()).unwrap_err(),
            InitDataError::HashMismatch
        );
    }

    #[test]
    fn rejects_stale_auth_date() {
        let data = signed(1_800_000_000 - 2 * 24 * 3600);
        assert_eq!(
            validate_init_data(&data, BOT_TOKEN, Duration::hours(24), now()).unwrap_err(),
            InitDataError::Expired
        );
    }

    #[test]
    fn rejects_missing_hash() {
        assert_eq!(
            validate_init_data("auth_date=1&user=%7B%7D", BOT_TOKEN, Duration::hours(1), now())
                .unwrap_err(),
            InitDataError::MissingHash
        );
    }

    #[test]
    fn display_name_falls_back_to_names_then_id() {
        let mut user: TelegramUser = serde_json::from_str(r#"{"id":5,"first_name":"A","last_name":"B"}"#).unwrap();
        assert_eq!(user.display_name(), "A B");
        user.first_name = None;
        user.last_name = None;
        assert_eq!(user.display_name(), "player_5");
    }
}
