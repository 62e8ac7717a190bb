use data_encoding::BASE32_NOPAD;
use rand::RngCore;

use crate::totp::TotpError;

/// Raw secret size: 160 bits, the HMAC-SHA1 block-aligned size RFC 4226 recommends.
pub const SECRET_BYTES: usize = 20;

/// Generate a random shared secret, base32-encoded without padding (32 chars).
pub fn generate_secret() -> String {
    let mut key = [0u8; SECRET_BYTES];
    rand::rng().fill_bytes(&mut key);
    secret_to_base32(&key)
}

pub fn secret_to_base32(key: &[u8]) -> String {
    BASE32_NOPAD.encode(key)
}

/// Decode a base32 secret. Whitespace, padding and lowercase are accepted since
/// users often retype secrets by hand.
pub fn secret_from_base32(encoded: &str) -> Result<Vec<u8>, TotpError> {
    let normalized: String = encoded
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '=')
        .map(|c| c.to_ascii_uppercase())
        .collect();

    if normalized.is_empty() {
        return Err(TotpError::InvalidSecret);
    }

    BASE32_NOPAD
        .decode(normalized.as_bytes())
        .map_err(|_| TotpError::InvalidSecret)
}
