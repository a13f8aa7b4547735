//! Error types for the token service
//!
//! The externally visible error surface is deliberately narrow: every
//! validation failure collapses to [`TokenError::Denied`], whose display is
//! indistinguishable from a missing resource. Specific failure reasons only
//! exist in the operational log.

use thiserror::Error;

/// Errors raised by [`TokenStore`](crate::store::TokenStore) implementations
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum StoreError {
	/// Underlying storage failure (connection, query, constraint)
	#[error("storage backend error: {0}")]
	Backend(String),
	/// Record could not be serialized or deserialized
	#[error("serialization error: {0}")]
	Serialization(String),
}

/// Errors returned by [`AccessTokenService`](crate::service::AccessTokenService)
///
/// `Denied` is the single outward signal for every validation failure:
/// malformed, unknown, expired, already-used, and wrong-resource tokens all
/// produce the same value so that callers cannot binary-search the token
/// space or confirm resource existence from differentiated responses.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum TokenError {
	/// Uniform validation denial; maps to a 404-equivalent at the HTTP layer
	#[error("resource not found")]
	Denied,
	/// Token issuance failed; callers must degrade gracefully, not abort
	#[error("failed to create access token")]
	Creation,
	/// Issuance was called with an unusable resource identifier
	#[error("invalid resource identifier: {0}")]
	InvalidResource(String),
	/// Storage failure outside the validation path (revocation, cleanup)
	#[error("token storage error: {0}")]
	Storage(#[from] StoreError),
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_denied_displays_as_not_found() {
		assert_eq!(TokenError::Denied.to_string(), "resource not found");
	}

	#[test]
	fn test_creation_display_is_generic() {
		let msg = TokenError::Creation.to_string();
		assert_eq!(msg, "failed to create access token");
		// No storage internals may leak through the creation error
		assert!(!msg.contains("sql"));
	}

	#[test]
	fn test_store_error_converts() {
		let err: TokenError = StoreError::Backend("connection refused".into()).into();
		assert!(matches!(err, TokenError::Storage(_)));
	}
}
