use hmac::{Hmac, Mac};
use sha1::Sha1;
use thiserror::Error;

use crate::keys::secret_from_base32;

type HmacSha1 = Hmac<Sha1>;

pub const STEP_SECONDS: u64 = 30;
pub const DIGITS: u32 = 6;
/// Accepted drift in steps on either side of the current one.
pub const WINDOW: u64 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TotpError {
    #[error("invalid base32 secret")]
    InvalidSecret,
    #[error("code must be 6 digits")]
    MalformedCode,
}

pub fn time_step(unix_secs: u64) -> u64 {
    unix_secs / STEP_SECONDS
}

/// RFC 4226 HOTP value truncated to `DIGITS` digits.
pub fn hotp(key: &[u8], counter: u64) -> Result<u32, TotpError> {
    let mut mac = HmacSha1::new_from_slice(key).map_err(|_| TotpError::InvalidSecret)?;
    mac.update(&counter.to_be_bytes());
    let digest = mac.finalize().into_bytes();

    let offset = (digest[digest.len() - 1] & 0x0f) as usize;
    let binary = u32::from_be_bytes([
        digest[offset] & 0x7f,
        digest[offset + 1],
        digest[offset + 2],
        digest[offset + 3],
    ]);

    Ok(binary % 10u32.pow(DIGITS))
}

pub fn format_code(value: u32) -> String {
    format!("{:0width$}", value, width = DIGITS as usize)
}

/// Code for the step containing `unix_secs`.
pub fn code_at(secret: &str, unix_secs: u64) -> Result<String, TotpError> {
    let key = secret_from_base32(secret)?;
    Ok(format_code(hotp(&key, time_step(unix_secs))?))
}

/// Check `code` against the steps `t-1, t, t+1` around `unix_secs`.
///
/// Steps at or before `last_used_step` are skipped so an accepted code cannot
/// be replayed. Returns the matching step, or `None` when nothing matched.
pub fn verify(
    secret: &str,
    code: &str,
    unix_secs: u64,
    last_used_step: Option<u64>,
) -> Result<Option<u64>, TotpError> {
    if code.len() != DIGITS as usize || !code.chars().all(|c| c.is_ascii_digit()) {
        return Err(TotpError::MalformedCode);
    }
    let wanted: u32 = code.parse().map_err(|_| TotpError::MalformedCode)?;
    let key = secret_from_base32(secret)?;
    let current = time_step(unix_secs);

    let first = current.saturating_sub(WINDOW);
    for step in first..=current + WINDOW {
        if last_used_step.is_some_and(|used| step <= used) {
            continue;
        }
        if hotp(&key, step)? == wanted {
            return Ok(Some(step));
        }
    }

    Ok(None)
}
