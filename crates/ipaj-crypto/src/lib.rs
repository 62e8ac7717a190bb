/// IPAJ Crypto Library
///
/// Second-factor support for lawyer accounts: RFC 6238 time-based one-time
/// passwords (HMAC-SHA1, 30 second step, 6 digits) over a base32 shared
/// secret, plus the enrollment QR code handed to authenticator apps.

pub mod keys;
pub mod qr;
pub mod totp;
