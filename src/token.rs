//! Opaque token generation
//!
//! Tokens are the entire credential: 256 bits from the operating system's
//! CSPRNG, hex-encoded. No signature or structure is layered on top, so a
//! token is only ever checked by exact match against the store.

use rand::RngCore;
use rand::rngs::OsRng;

/// Number of random bytes backing a token
pub const TOKEN_BYTES: usize = 32;

/// Length of a hex-encoded token string
pub const TOKEN_LENGTH: usize = 64;

/// Generate a new opaque access token
///
/// Produces [`TOKEN_BYTES`] bytes from a cryptographically secure random
/// source, hex-encoded to a [`TOKEN_LENGTH`]-character lowercase string.
///
/// # Examples
///
/// ```
/// use printworks_tokens::token::generate_token;
///
/// let token = generate_token();
/// assert_eq!(token.len(), 64);
/// assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
/// ```
pub fn generate_token() -> String {
	let mut bytes = [0u8; TOKEN_BYTES];
	OsRng.fill_bytes(&mut bytes);
	bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Cheap shape check applied before any storage lookup
///
/// Anything that is not exactly [`TOKEN_LENGTH`] characters can never have
/// been issued by this service and is rejected without touching the store.
///
/// # Examples
///
/// ```
/// use printworks_tokens::token::{generate_token, is_well_formed};
///
/// assert!(is_well_formed(&generate_token()));
/// assert!(!is_well_formed(""));
/// assert!(!is_well_formed("abc123"));
/// ```
pub fn is_well_formed(token: &str) -> bool {
	token.len() == TOKEN_LENGTH
}
