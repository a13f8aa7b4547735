//! Link helper policy tests: TTLs, one-time flags, and graceful degradation

use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use url::Url;

use printworks_tokens::links::LinkBuilder;
use printworks_tokens::store::{InMemoryTokenStore, TokenStore};
use printworks_tokens::{AccessToken, AccessTokenService, ResourceType, StoreError};

const HOUR_MS: i64 = 3_600_000;
// Issuance happens a few instants before the assertion reads the clock
const TOLERANCE_MS: i64 = 60_000;

fn builder_with_store(store: InMemoryTokenStore) -> LinkBuilder<InMemoryTokenStore> {
	let service = Arc::new(AccessTokenService::new(store));
	LinkBuilder::new(service, Url::parse("https://shop.example.com").unwrap())
}

async fn stored(store: &InMemoryTokenStore, token: &str) -> AccessToken {
	store.get(token).await.unwrap().unwrap()
}

fn assert_ttl_hours(record: &AccessToken, hours: i64) {
	let expected = Utc::now().timestamp_millis() + hours * HOUR_MS;
	let delta = (record.expires_at - expected).abs();
	assert!(delta < TOLERANCE_MS, "expiry off by {}ms", delta);
}

#[tokio::test]
async fn proof_review_links_are_two_one_time_tokens() {
	let store = InMemoryTokenStore::new();
	let builder = builder_with_store(store.clone());

	let links = builder.proof_review_links("P1").await.unwrap();
	assert_ne!(links.approve.token, links.revise.token);

	for token in [&links.approve.token, &links.revise.token] {
		let record = stored(&store, token).await;
		assert_eq!(record.resource_type, ResourceType::Proof);
		assert_eq!(record.resource_id, "P1");
		assert!(record.one_time_use);
		assert_ttl_hours(&record, 72);
	}
}

#[tokio::test]
async fn order_status_link_is_reusable_seven_days() {
	let store = InMemoryTokenStore::new();
	let builder = builder_with_store(store.clone());

	let link = builder.order_status_link("123").await.unwrap();
	let record = stored(&store, &link.token).await;

	assert!(!record.one_time_use);
	assert_ttl_hours(&record, 7 * 24);
	assert_eq!(record.created_by.as_deref(), Some("order-status-email"));
}

#[tokio::test]
async fn invoice_and_design_links_last_thirty_days() {
	let store = InMemoryTokenStore::new();
	let builder = builder_with_store(store.clone());

	let invoice = builder.invoice_payment_link("I1").await.unwrap();
	let design = builder.design_file_link("D1").await.unwrap();

	for (token, rt) in [
		(&invoice.token, ResourceType::Invoice),
		(&design.token, ResourceType::Design),
	] {
		let record = stored(&store, token).await;
		assert_eq!(record.resource_type, rt);
		assert!(!record.one_time_use);
		assert_ttl_hours(&record, 30 * 24);
	}
}

#[tokio::test]
async fn token_travels_as_query_parameter() {
	let store = InMemoryTokenStore::new();
	let builder = builder_with_store(store);

	let link = builder.invoice_payment_link("I1").await.unwrap();
	let (key, value) = link.url.query_pairs().next().unwrap();
	assert_eq!(key, "token");
	assert_eq!(value, link.token);
}

/// Store that fails every operation, for exercising degradation paths
#[derive(Clone)]
struct BrokenStore;

#[async_trait]
impl TokenStore for BrokenStore {
	async fn insert(&self, _record: AccessToken) -> Result<(), StoreError> {
		Err(StoreError::Backend("write failed".to_string()))
	}

	async fn get(&self, _token: &str) -> Result<Option<AccessToken>, StoreError> {
		Err(StoreError::Backend("read failed".to_string()))
	}

	async fn mark_used(&self, _token: &str, _used_at_ms: i64) -> Result<bool, StoreError> {
		Err(StoreError::Backend("write failed".to_string()))
	}

	async fn delete(&self, _token: &str) -> Result<u64, StoreError> {
		Err(StoreError::Backend("delete failed".to_string()))
	}

	async fn delete_for_resource(
		&self,
		_resource_type: ResourceType,
		_resource_id: &str,
	) -> Result<u64, StoreError> {
		Err(StoreError::Backend("delete failed".to_string()))
	}

	async fn delete_expired_used(&self, _now_ms: i64) -> Result<u64, StoreError> {
		Err(StoreError::Backend("delete failed".to_string()))
	}
}

#[tokio::test]
async fn link_helpers_degrade_to_none_on_storage_failure() {
	let service = Arc::new(AccessTokenService::new(BrokenStore));
	let builder = LinkBuilder::new(service, Url::parse("https://shop.example.com").unwrap());

	assert!(builder.proof_review_links("P1").await.is_none());
	assert!(builder.order_status_link("123").await.is_none());
	assert!(builder.invoice_payment_link("I1").await.is_none());
	assert!(builder.design_file_link("D1").await.is_none());
}

#[tokio::test]
async fn validation_failure_on_broken_store_is_uniform_denial() {
	let service = AccessTokenService::new(BrokenStore);
	let err = service
		.validate_token(&"a".repeat(64), ResourceType::Order)
		.await
		.unwrap_err();
	assert_eq!(err.to_string(), "resource not found");
}
