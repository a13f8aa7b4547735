//! Access token lifecycle
//!
//! [`AccessTokenService`] issues, validates, revokes, and sweeps public
//! access tokens. It is constructed with any [`TokenStore`], so the same
//! logic runs against the database in production and the in-memory store in
//! tests.
//!
//! ## Validation and the uniform failure surface
//!
//! Every way a validation can fail — malformed token, unknown token,
//! expired, already used, bound to a different resource type, or a storage
//! error during the check — yields the same [`TokenError::Denied`] value.
//! The specific reason goes to the operational log only. Endpoints built on
//! this service must surface the denial as a plain "not found"; anything
//! more detailed would let a caller probe for valid tokens or confirm that
//! a resource exists.
//!
//! ## Example
//!
//! ```
//! use printworks_tokens::store::InMemoryTokenStore;
//! use printworks_tokens::{AccessTokenService, ResourceType, TokenOptions};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let service = AccessTokenService::new(InMemoryTokenStore::new());
//!
//! let token = service
//!     .create_token(ResourceType::Order, "123", TokenOptions::new())
//!     .await?;
//!
//! let grant = service.validate_token(&token, ResourceType::Order).await?;
//! assert_eq!(grant.resource_id, "123");
//! # Ok(())
//! # }
//! # tokio_test::block_on(example()).unwrap();
//! ```

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::error::TokenError;
use crate::model::{AccessToken, ResourceType, TokenGrant, TokenOptions};
use crate::store::TokenStore;
use crate::token::{generate_token, is_well_formed};

/// Issues and validates public access tokens against an injected store
#[derive(Debug, Clone)]
pub struct AccessTokenService<S: TokenStore> {
	store: S,
}

impl<S: TokenStore> AccessTokenService<S> {
	/// Create a service over the given store
	pub fn new(store: S) -> Self {
		Self { store }
	}

	/// Access the underlying store
	pub fn store(&self) -> &S {
		&self.store
	}

	/// Issue a token bound to one resource
	///
	/// Returns the plaintext token, to be embedded in a URL or email. This
	/// is the only moment the token is available to the caller; it is never
	/// returned again. Storage failures collapse to the generic
	/// [`TokenError::Creation`] so workflow code can degrade gracefully
	/// without seeing storage internals.
	///
	/// # Examples
	///
	/// ```
	/// use printworks_tokens::store::InMemoryTokenStore;
	/// use printworks_tokens::{AccessTokenService, ResourceType, TokenOptions};
	///
	/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
	/// let service = AccessTokenService::new(InMemoryTokenStore::new());
	/// let token = service
	///     .create_token(
	///         ResourceType::Proof,
	///         "P1",
	///         TokenOptions::new().expires_in_hours(72).one_time_use(true),
	///     )
	///     .await?;
	/// assert_eq!(token.len(), 64);
	/// # Ok(())
	/// # }
	/// # tokio_test::block_on(example()).unwrap();
	/// ```
	pub async fn create_token(
		&self,
		resource_type: ResourceType,
		resource_id: &str,
		options: TokenOptions,
	) -> Result<String, TokenError> {
		if resource_id.is_empty() {
			return Err(TokenError::InvalidResource(
				"resource id must not be empty".to_string(),
			));
		}

		let token = generate_token();
		let record = AccessToken {
			token: token.clone(),
			resource_type,
			resource_id: resource_id.to_string(),
			expires_at: options.expires_at_from_now(),
			one_time_use: options.one_time_use,
			used_at: None,
			created_by: options.created_by,
			metadata: options.metadata,
		};

		if let Err(err) = self.store.insert(record).await {
			warn!(
				%resource_type,
				resource_id,
				error = %err,
				"failed to persist access token"
			);
			return Err(TokenError::Creation);
		}

		debug!(%resource_type, resource_id, "issued public access token");
		Ok(token)
	}

	/// Validate a presented token against the expected resource type
	///
	/// On success returns the `(resource_type, resource_id)` binding; the
	/// caller then loads the resource through its normal access path. For
	/// one-time tokens the successful validation atomically consumes the
	/// token: under concurrent validation exactly one caller gets the
	/// grant and every later attempt is denied.
	pub async fn validate_token(
		&self,
		token: &str,
		expected: ResourceType,
	) -> Result<TokenGrant, TokenError> {
		// Shape filter before any storage round trip
		if !is_well_formed(token) {
			warn!(security = true, reason = "malformed", "access token rejected");
			return Err(TokenError::Denied);
		}

		let record = match self.store.get(token).await {
			Ok(Some(record)) => record,
			Ok(None) => {
				warn!(security = true, reason = "not_found", "access token rejected");
				return Err(TokenError::Denied);
			}
			Err(err) => {
				// Storage trouble must look exactly like a bad token
				warn!(
					security = true,
					reason = "storage_error",
					error = %err,
					"access token rejected"
				);
				return Err(TokenError::Denied);
			}
		};

		let now_ms = Utc::now().timestamp_millis();
		if record.is_expired(now_ms) {
			warn!(
				security = true,
				reason = "expired",
				resource_type = %record.resource_type,
				resource_id = %record.resource_id,
				"access token rejected"
			);
			return Err(TokenError::Denied);
		}

		if record.is_consumed() {
			warn!(
				security = true,
				reason = "already_used",
				resource_type = %record.resource_type,
				resource_id = %record.resource_id,
				"access token rejected"
			);
			return Err(TokenError::Denied);
		}

		if record.resource_type != expected {
			warn!(
				security = true,
				reason = "resource_type_mismatch",
				expected = %expected,
				actual = %record.resource_type,
				"access token rejected"
			);
			return Err(TokenError::Denied);
		}

		if record.one_time_use {
			// One atomic conditional write; losing the race is a denial,
			// so only the first consumer ever sees the grant
			match self.store.mark_used(token, now_ms).await {
				Ok(true) => {}
				Ok(false) => {
					warn!(
						security = true,
						reason = "consume_race_lost",
						resource_type = %record.resource_type,
						resource_id = %record.resource_id,
						"access token rejected"
					);
					return Err(TokenError::Denied);
				}
				Err(err) => {
					warn!(
						security = true,
						reason = "storage_error",
						error = %err,
						"access token rejected"
					);
					return Err(TokenError::Denied);
				}
			}
		}

		Ok(TokenGrant {
			resource_type: record.resource_type,
			resource_id: record.resource_id,
		})
	}

	/// Revoke a single token
	///
	/// Hard-deletes the row. Revoking a token that does not exist is not an
	/// error.
	pub async fn revoke_token(&self, token: &str) -> Result<(), TokenError> {
		self.store.delete(token).await?;
		debug!("revoked public access token");
		Ok(())
	}

	/// Revoke every outstanding token for one resource
	///
	/// Called when the underlying resource is deleted or an operator
	/// withdraws access. Returns the number of tokens removed.
	pub async fn revoke_resource_tokens(
		&self,
		resource_type: ResourceType,
		resource_id: &str,
	) -> Result<u64, TokenError> {
		let removed = self
			.store
			.delete_for_resource(resource_type, resource_id)
			.await?;
		info!(%resource_type, resource_id, removed, "revoked resource tokens");
		Ok(removed)
	}

	/// Remove tokens that are both expired and already consumed
	///
	/// Expired-but-never-used tokens are retained: a link that was mailed
	/// out but never opened keeps its audit row. Intended to run on a
	/// schedule; see [`TokenCleanupTask`](crate::cleanup::TokenCleanupTask).
	pub async fn cleanup_expired_tokens(&self) -> Result<u64, TokenError> {
		let now_ms = Utc::now().timestamp_millis();
		let removed = self.store.delete_expired_used(now_ms).await?;
		info!(removed, "cleaned up expired access tokens");
		Ok(removed)
	}
}
