//! In-memory token store
//!
//! Backed by a `tokio::sync::RwLock` over a `HashMap`. The write lock makes
//! the conditional consume in [`InMemoryTokenStore::mark_used`] atomic,
//! giving this store the same first-consumer-wins semantics as the database
//! backend. Records are lost on restart; intended for tests and local
//! development.
//!
//! ## Example
//!
//! ```
//! use printworks_tokens::store::{InMemoryTokenStore, TokenStore};
//! use printworks_tokens::{AccessToken, ResourceType};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = InMemoryTokenStore::new();
//!
//! let record = AccessToken {
//!     token: "a".repeat(64),
//!     resource_type: ResourceType::Order,
//!     resource_id: "123".to_string(),
//!     expires_at: i64::MAX,
//!     one_time_use: false,
//!     used_at: None,
//!     created_by: None,
//!     metadata: None,
//! };
//! store.insert(record).await?;
//!
//! let loaded = store.get(&"a".repeat(64)).await?;
//! assert!(loaded.is_some());
//! # Ok(())
//! # }
//! # tokio_test::block_on(example()).unwrap();
//! ```

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::error::StoreError;
use crate::model::{AccessToken, ResourceType};
use crate::store::TokenStore;

/// In-memory [`TokenStore`] implementation
#[derive(Debug, Clone, Default)]
pub struct InMemoryTokenStore {
	records: Arc<RwLock<HashMap<String, AccessToken>>>,
}

impl InMemoryTokenStore {
	/// Create an empty store
	pub fn new() -> Self {
		Self::default()
	}

	/// Number of records currently held
	pub async fn len(&self) -> usize {
		self.records.read().await.len()
	}

	/// Whether the store holds no records
	pub async fn is_empty(&self) -> bool {
		self.records.read().await.is_empty()
	}

	/// Overwrite a record in place, bypassing the immutability rules
	///
	/// Test-support hook for manufacturing expired or consumed states
	/// without waiting on the wall clock.
	pub async fn put_raw(&self, record: AccessToken) {
		let mut records = self.records.write().await;
		records.insert(record.token.clone(), record);
	}
}

#[async_trait]
impl TokenStore for InMemoryTokenStore {
	async fn insert(&self, record: AccessToken) -> Result<(), StoreError> {
		let mut records = self.records.write().await;
		records.insert(record.token.clone(), record);
		Ok(())
	}

	async fn get(&self, token: &str) -> Result<Option<AccessToken>, StoreError> {
		let records = self.records.read().await;
		Ok(records.get(token).cloned())
	}

	async fn mark_used(&self, token: &str, used_at_ms: i64) -> Result<bool, StoreError> {
		// Check and set under one write lock; this is the in-memory
		// equivalent of `UPDATE ... WHERE used_at IS NULL`
		let mut records = self.records.write().await;
		match records.get_mut(token) {
			Some(record) if record.used_at.is_none() => {
				record.used_at = Some(used_at_ms);
				Ok(true)
			}
			_ => Ok(false),
		}
	}

	async fn delete(&self, token: &str) -> Result<u64, StoreError> {
		let mut records = self.records.write().await;
		Ok(records.remove(token).map_or(0, |_| 1))
	}

	async fn delete_for_resource(
		&self,
		resource_type: ResourceType,
		resource_id: &str,
	) -> Result<u64, StoreError> {
		let mut records = self.records.write().await;
		let before = records.len();
		records.retain(|_, record| {
			!(record.resource_type == resource_type && record.resource_id == resource_id)
		});
		Ok((before - records.len()) as u64)
	}

	async fn delete_expired_used(&self, now_ms: i64) -> Result<u64, StoreError> {
		let mut records = self.records.write().await;
		let before = records.len();
		records.retain(|_, record| !(record.expires_at < now_ms && record.used_at.is_some()));
		Ok((before - records.len()) as u64)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn record(token: &str, expires_at: i64, used_at: Option<i64>) -> AccessToken {
		AccessToken {
			token: token.to_string(),
			resource_type: ResourceType::Proof,
			resource_id: "P1".to_string(),
			expires_at,
			one_time_use: true,
			used_at,
			created_by: None,
			metadata: None,
		}
	}

	#[tokio::test]
	async fn test_insert_and_get() {
		let store = InMemoryTokenStore::new();
		store.insert(record("t1", 100, None)).await.unwrap();

		let loaded = store.get("t1").await.unwrap().unwrap();
		assert_eq!(loaded.resource_id, "P1");
		assert!(store.get("t2").await.unwrap().is_none());
	}

	#[tokio::test]
	async fn test_mark_used_is_single_shot() {
		let store = InMemoryTokenStore::new();
		store.insert(record("t1", 100, None)).await.unwrap();

		assert!(store.mark_used("t1", 50).await.unwrap());
		// Second attempt loses: used_at is already set
		assert!(!store.mark_used("t1", 60).await.unwrap());

		let loaded = store.get("t1").await.unwrap().unwrap();
		assert_eq!(loaded.used_at, Some(50));
	}

	#[tokio::test]
	async fn test_mark_used_missing_token() {
		let store = InMemoryTokenStore::new();
		assert!(!store.mark_used("absent", 1).await.unwrap());
	}

	#[tokio::test]
	async fn test_delete_is_idempotent() {
		let store = InMemoryTokenStore::new();
		store.insert(record("t1", 100, None)).await.unwrap();

		assert_eq!(store.delete("t1").await.unwrap(), 1);
		assert_eq!(store.delete("t1").await.unwrap(), 0);
	}

	#[tokio::test]
	async fn test_delete_for_resource() {
		let store = InMemoryTokenStore::new();
		store.insert(record("t1", 100, None)).await.unwrap();
		store.insert(record("t2", 100, None)).await.unwrap();

		let mut other = record("t3", 100, None);
		other.resource_id = "P2".to_string();
		store.insert(other).await.unwrap();

		let removed = store
			.delete_for_resource(ResourceType::Proof, "P1")
			.await
			.unwrap();
		assert_eq!(removed, 2);
		assert_eq!(store.len().await, 1);
	}

	#[tokio::test]
	async fn test_delete_expired_used_retains_unused() {
		let store = InMemoryTokenStore::new();
		store.insert(record("used-expired", 10, Some(5))).await.unwrap();
		store.insert(record("unused-expired", 10, None)).await.unwrap();
		store.insert(record("used-live", 1_000, Some(5))).await.unwrap();

		let removed = store.delete_expired_used(100).await.unwrap();
		assert_eq!(removed, 1);

		// Expired-but-unused and live rows survive the sweep
		assert!(store.get("unused-expired").await.unwrap().is_some());
		assert!(store.get("used-live").await.unwrap().is_some());
		assert!(store.get("used-expired").await.unwrap().is_none());
	}
}
