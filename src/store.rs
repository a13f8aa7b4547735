//! Token persistence seam
//!
//! The service never talks to a concrete database client directly; it is
//! constructed with any [`TokenStore`], so tests substitute the in-memory
//! store and production hosts plug in the database backend. The one
//! contract every implementation must honor is that [`TokenStore::mark_used`]
//! is a single conditional write: the `used_at IS NULL` predicate and the
//! update itself happen atomically, never as a read-then-write pair.

use async_trait::async_trait;

use crate::error::StoreError;
use crate::model::{AccessToken, ResourceType};

pub mod memory;

#[cfg(feature = "database")]
pub mod database;

pub use memory::InMemoryTokenStore;

#[cfg(feature = "database")]
pub use database::DatabaseTokenStore;

/// Storage contract for access token records
#[async_trait]
pub trait TokenStore: Send + Sync {
	/// Persist a new token record
	async fn insert(&self, record: AccessToken) -> Result<(), StoreError>;

	/// Fetch a record by exact token match
	async fn get(&self, token: &str) -> Result<Option<AccessToken>, StoreError>;

	/// Consume a one-time token: set `used_at` conditioned on it being unset
	///
	/// Must execute as one atomic conditional write (`WHERE token = ? AND
	/// used_at IS NULL`). Returns `true` iff this call performed the write;
	/// `false` means a concurrent consumer won the race or the token was
	/// already consumed. Retrying an applied update is a no-op, which is
	/// what makes retries after a network timeout safe.
	async fn mark_used(&self, token: &str, used_at_ms: i64) -> Result<bool, StoreError>;

	/// Delete a record by token. Returns the number of rows removed;
	/// deleting a nonexistent token is not an error.
	async fn delete(&self, token: &str) -> Result<u64, StoreError>;

	/// Delete every token bound to one resource
	async fn delete_for_resource(
		&self,
		resource_type: ResourceType,
		resource_id: &str,
	) -> Result<u64, StoreError>;

	/// Delete rows that are both expired and already consumed
	///
	/// Expired-but-unused rows are intentionally retained; see the cleanup
	/// policy note on
	/// [`cleanup_expired_tokens`](crate::service::AccessTokenService::cleanup_expired_tokens).
	async fn delete_expired_used(&self, now_ms: i64) -> Result<u64, StoreError>;
}
