//! # Printworks Tokens
//!
//! Public access token service for the Printworks storefront.
//!
//! Shareable links in outbound email (proof review, order status, invoice
//! payment, design files) carry an opaque bearer token instead of requiring
//! an account login. This crate issues those tokens, validates them on the
//! public endpoints, revokes them when the underlying resource goes away,
//! and sweeps the table of spent tokens.
//!
//! ## Features
//!
//! - **Resource binding**: a token is scoped to one `(type, id)` pair and
//!   cannot be replayed against another endpoint
//! - **Time-boxed**: absolute expiry computed at issuance
//! - **One-time use**: optional single-shot tokens consumed by an atomic
//!   conditional write, so concurrent validations race safely
//! - **Uniform denial**: every validation failure is externally
//!   indistinguishable from a missing resource, resisting enumeration
//! - **Pluggable storage**: in-memory store for tests, database store
//!   (PostgreSQL/MySQL/SQLite, feature `database`) for production
//! - **Link builders**: per-resource URL helpers with the access policy
//!   for each link kind baked in
//!
//! ## Quick Start
//!
//! ```
//! use printworks_tokens::store::InMemoryTokenStore;
//! use printworks_tokens::{AccessTokenService, ResourceType, TokenOptions};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let service = AccessTokenService::new(InMemoryTokenStore::new());
//!
//! // Mint a one-time proof approval token, valid for 72 hours
//! let token = service
//!     .create_token(
//!         ResourceType::Proof,
//!         "proof-81",
//!         TokenOptions::new().expires_in_hours(72).one_time_use(true),
//!     )
//!     .await?;
//!
//! // The public endpoint validates and consumes it
//! let grant = service.validate_token(&token, ResourceType::Proof).await?;
//! assert_eq!(grant.resource_id, "proof-81");
//!
//! // A second presentation is denied like any unknown token
//! assert!(service.validate_token(&token, ResourceType::Proof).await.is_err());
//! # Ok(())
//! # }
//! # tokio_test::block_on(example()).unwrap();
//! ```

pub mod cleanup;
pub mod error;
pub mod links;
pub mod model;
pub mod service;
pub mod store;
pub mod token;

pub use cleanup::{CleanupConfig, TokenCleanupTask};
pub use error::{StoreError, TokenError};
pub use links::{LinkBuilder, LinkPolicies, LinkPolicy, ProofReviewLinks, ShareLink};
pub use model::{AccessToken, ResourceType, TokenGrant, TokenOptions};
pub use service::AccessTokenService;
pub use token::{TOKEN_BYTES, TOKEN_LENGTH, generate_token};
