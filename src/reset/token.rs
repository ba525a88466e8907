/// Stateless password reset tokens
///
/// A token is `{issued_at_base36}-{hex(hmac)}` where the MAC covers the user's
/// id, email, current password hash and the issue timestamp. Nothing is
/// stored: changing the password hash invalidates every outstanding token for
/// that user, and tokens older than the configured timeout are rejected.
use crate::{
    db::account::User,
    error::{InventoryError, InventoryResult},
};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

type HmacSha256 = Hmac<Sha256>;

const KEY_SALT: &str = "eletro_rapida.reset.ResetTokenGenerator";

/// 2001-01-01T00:00:00Z; keeps the base36 timestamp short
const TOKEN_EPOCH: i64 = 978_307_200;

/// Longest base36 timestamp accepted; 36^12 seconds is far beyond any clock
const MAX_TIMESTAMP_DIGITS: usize = 12;

/// Derives and checks reset tokens
#[derive(Clone)]
pub struct ResetTokenGenerator {
    mac: HmacSha256,
    timeout_secs: i64,
}

impl ResetTokenGenerator {
    /// Create a generator keyed by the server secret
    pub fn new(secret: &str, timeout_secs: i64) -> InventoryResult<Self> {
        let key = Sha256::new()
            .chain_update(KEY_SALT.as_bytes())
            .chain_update(secret.as_bytes())
            .finalize();

        let mac = HmacSha256::new_from_slice(&key)
            .map_err(|e| InventoryError::Internal(format!("Invalid reset token key: {}", e)))?;

        Ok(Self { mac, timeout_secs })
    }

    pub fn timeout_secs(&self) -> i64 {
        self.timeout_secs
    }

    /// Make a token for the user's current state
    pub fn make_token(&self, user: &User) -> String {
        self.make_token_at(user, Utc::now())
    }

    pub fn make_token_at(&self, user: &User, issued_at: DateTime<Utc>) -> String {
        let timestamp = seconds_since_epoch(issued_at).max(0);
        let signature = self.sign(user, timestamp).finalize().into_bytes();

        format!("{}-{}", to_base36(timestamp), hex::encode(signature))
    }

    /// Check a token against the user's current state
    pub fn check_token(&self, user: &User, token: &str) -> bool {
        self.check_token_at(user, token, Utc::now())
    }

    pub fn check_token_at(&self, user: &User, token: &str, now: DateTime<Utc>) -> bool {
        let Some((ts_part, sig_part)) = token.split_once('-') else {
            return false;
        };
        let Some(timestamp) = from_base36(ts_part) else {
            return false;
        };
        let Ok(signature) = hex::decode(sig_part) else {
            return false;
        };

        // Constant-time comparison
        if self.sign(user, timestamp).verify_slice(&signature).is_err() {
            return false;
        }

        seconds_since_epoch(now) - timestamp <= self.timeout_secs
    }

    fn sign(&self, user: &User, timestamp: i64) -> HmacSha256 {
        let mut mac = self.mac.clone();
        let id = user.id.to_string();
        let ts = timestamp.to_string();
        for field in [
            id.as_bytes(),
            user.email.as_bytes(),
            user.password_hash.as_bytes(),
            ts.as_bytes(),
        ] {
            mac.update(&(field.len() as u64).to_be_bytes());
            mac.update(field);
        }
        mac
    }
}

fn seconds_since_epoch(at: DateTime<Utc>) -> i64 {
    at.timestamp() - TOKEN_EPOCH
}

fn to_base36(mut value: i64) -> String {
    const DIGITS: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if value == 0 {
        return "0".to_string();
    }

    let mut out = Vec::new();
    while value > 0 {
        out.push(DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    out.reverse();
    String::from_utf8_lossy(&out).into_owned()
}

fn from_base36(s: &str) -> Option<i64> {
    if s.is_empty()
        || s.len() > MAX_TIMESTAMP_DIGITS
        || !s.bytes().all(|b| b.is_ascii_digit() || b.is_ascii_lowercase())
    {
        return None;
    }
    i64::from_str_radix(s, 36).ok()
}

/// Encode a user id for transport in a URL
pub fn encode_uid(user_id: i64) -> String {
    URL_SAFE_NO_PAD.encode(user_id.to_string())
}

/// Decode a uid produced by [`encode_uid`]. Padded input is accepted.
pub fn decode_uid(uid: &str) -> Option<i64> {
    let bytes = URL_SAFE_NO_PAD.decode(uid.trim_end_matches('=')).ok()?;
    let text = String::from_utf8(bytes).ok()?;
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}
