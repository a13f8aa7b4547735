//! Share link construction
//!
//! Thin layer over the token service that mints fully-formed URLs for each
//! resource kind, with the access policy for that kind baked in:
//!
//! | link | TTL | one-time |
//! |---|---|---|
//! | proof approve / revise | 72h | yes, one token per action |
//! | order status | 7 days | no |
//! | invoice payment | 30 days | no |
//! | design file | 30 days | no |
//!
//! The proof helper deliberately issues two independent tokens so a single
//! link can never be replayed across the approve and revise actions.
//!
//! Every helper degrades to `None` when issuance fails: a missing share
//! link must never abort the workflow that asked for it (order creation
//! still succeeds even if the status link could not be minted).
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use printworks_tokens::links::LinkBuilder;
//! use printworks_tokens::store::InMemoryTokenStore;
//! use printworks_tokens::AccessTokenService;
//! use url::Url;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let service = Arc::new(AccessTokenService::new(InMemoryTokenStore::new()));
//! let links = LinkBuilder::new(service, Url::parse("https://shop.example.com")?);
//!
//! let link = links.order_status_link("123").await.unwrap();
//! assert!(link.url.as_str().starts_with("https://shop.example.com/orders/123/status?token="));
//! # Ok(())
//! # }
//! # tokio_test::block_on(example()).unwrap();
//! ```

use std::sync::Arc;
use tracing::warn;
use url::Url;

use crate::model::{ResourceType, TokenOptions};
use crate::service::AccessTokenService;
use crate::store::TokenStore;

/// Expiry and use policy for one link kind
#[derive(Debug, Clone, Copy)]
pub struct LinkPolicy {
	/// Hours until the embedded token expires
	pub expires_in_hours: i64,
	/// Whether the embedded token is single-use
	pub one_time_use: bool,
}

/// Per-link-kind policies, overridable at builder construction
#[derive(Debug, Clone, Copy)]
pub struct LinkPolicies {
	/// Proof approve / revise actions
	pub proof_review: LinkPolicy,
	/// Order status page
	pub order_status: LinkPolicy,
	/// Invoice payment page
	pub invoice_payment: LinkPolicy,
	/// Design file access
	pub design_file: LinkPolicy,
}

impl Default for LinkPolicies {
	fn default() -> Self {
		Self {
			proof_review: LinkPolicy {
				expires_in_hours: 72,
				one_time_use: true,
			},
			order_status: LinkPolicy {
				expires_in_hours: 7 * 24,
				one_time_use: false,
			},
			invoice_payment: LinkPolicy {
				expires_in_hours: 30 * 24,
				one_time_use: false,
			},
			design_file: LinkPolicy {
				expires_in_hours: 30 * 24,
				one_time_use: false,
			},
		}
	}
}

/// A minted share link and its embedded token
#[derive(Debug, Clone)]
pub struct ShareLink {
	/// Fully-formed URL carrying the token as the `token` query parameter
	pub url: Url,
	/// The plaintext token, also present in `url`
	pub token: String,
}

/// Both links sent in a proof review email
///
/// The approve and revise tokens are independent one-time credentials.
#[derive(Debug, Clone)]
pub struct ProofReviewLinks {
	/// Link that approves the proof
	pub approve: ShareLink,
	/// Link that requests a revision
	pub revise: ShareLink,
}

/// Builds resource share links over an [`AccessTokenService`]
#[derive(Clone)]
pub struct LinkBuilder<S: TokenStore> {
	service: Arc<AccessTokenService<S>>,
	base_url: Url,
	policies: LinkPolicies,
}

impl<S: TokenStore> LinkBuilder<S> {
	/// Create a builder with the default policies
	pub fn new(service: Arc<AccessTokenService<S>>, base_url: Url) -> Self {
		Self {
			service,
			base_url,
			policies: LinkPolicies::default(),
		}
	}

	/// Create a builder with custom policies
	pub fn with_policies(
		service: Arc<AccessTokenService<S>>,
		base_url: Url,
		policies: LinkPolicies,
	) -> Self {
		Self {
			service,
			base_url,
			policies,
		}
	}

	/// The policies in effect
	pub fn policies(&self) -> &LinkPolicies {
		&self.policies
	}

	fn url_for(&self, segments: &[&str], token: &str) -> Option<Url> {
		let mut url = self.base_url.clone();
		{
			let mut path = url.path_segments_mut().ok()?;
			path.pop_if_empty();
			path.extend(segments);
		}
		url.query_pairs_mut().append_pair("token", token);
		Some(url)
	}

	async fn mint(
		&self,
		resource_type: ResourceType,
		resource_id: &str,
		policy: LinkPolicy,
		created_by: &str,
		segments: &[&str],
	) -> Option<ShareLink> {
		let options = TokenOptions::new()
			.expires_in_hours(policy.expires_in_hours)
			.one_time_use(policy.one_time_use)
			.created_by(created_by);

		let token = match self
			.service
			.create_token(resource_type, resource_id, options)
			.await
		{
			Ok(token) => token,
			Err(err) => {
				warn!(
					%resource_type,
					resource_id,
					error = %err,
					"share link not generated"
				);
				return None;
			}
		};

		let url = self.url_for(segments, &token)?;
		Some(ShareLink { url, token })
	}

	/// Links for a proof review email: approve and revise
	///
	/// Two independent one-time tokens, both expiring per the
	/// `proof_review` policy. Returns `None` if either token could not be
	/// issued, so the email is either complete or not sent at all.
	pub async fn proof_review_links(&self, proof_id: &str) -> Option<ProofReviewLinks> {
		let policy = self.policies.proof_review;
		let approve = self
			.mint(
				ResourceType::Proof,
				proof_id,
				policy,
				"proof-review-email",
				&["proofs", proof_id, "approve"],
			)
			.await?;
		let revise = self
			.mint(
				ResourceType::Proof,
				proof_id,
				policy,
				"proof-review-email",
				&["proofs", proof_id, "revise"],
			)
			.await?;

		Some(ProofReviewLinks { approve, revise })
	}

	/// Reusable link to an order's status page
	pub async fn order_status_link(&self, order_id: &str) -> Option<ShareLink> {
		self.mint(
			ResourceType::Order,
			order_id,
			self.policies.order_status,
			"order-status-email",
			&["orders", order_id, "status"],
		)
		.await
	}

	/// Reusable link to an invoice's payment page
	///
	/// Long-lived and reusable: payment may take multiple attempts.
	pub async fn invoice_payment_link(&self, invoice_id: &str) -> Option<ShareLink> {
		self.mint(
			ResourceType::Invoice,
			invoice_id,
			self.policies.invoice_payment,
			"invoice-email",
			&["invoices", invoice_id, "pay"],
		)
		.await
	}

	/// Reusable link to an uploaded design file
	pub async fn design_file_link(&self, design_id: &str) -> Option<ShareLink> {
		self.mint(
			ResourceType::Design,
			design_id,
			self.policies.design_file,
			"design-share-email",
			&["designs", design_id],
		)
		.await
	}
}
