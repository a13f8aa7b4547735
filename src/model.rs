//! Access token data model
//!
//! An [`AccessToken`] is the sole persistent entity of this crate. Records
//! are immutable once written except for `used_at`, which is set at most
//! once when a one-time token is consumed. Timestamps are Unix milliseconds
//! stored in BIGINT columns for portability across database backends.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind of protected resource a token is bound to
///
/// A token is scoped to exactly one `(ResourceType, resource_id)` pair. The
/// type is checked during validation so a token minted for a proof can never
/// be replayed against the invoice endpoint, even if identifiers collide.
///
/// # Examples
///
/// ```
/// use printworks_tokens::ResourceType;
///
/// assert_eq!(ResourceType::Proof.as_str(), "proof");
/// assert_eq!("invoice".parse::<ResourceType>().unwrap(), ResourceType::Invoice);
/// assert!("widget".parse::<ResourceType>().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceType {
	/// Print proof awaiting customer review
	Proof,
	/// Customer order status page
	Order,
	/// Invoice payment page
	Invoice,
	/// Uploaded design file
	Design,
}

impl ResourceType {
	/// Wire name of the resource type, as stored in the database
	pub fn as_str(&self) -> &'static str {
		match self {
			Self::Proof => "proof",
			Self::Order => "order",
			Self::Invoice => "invoice",
			Self::Design => "design",
		}
	}
}

impl fmt::Display for ResourceType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for ResourceType {
	type Err = UnknownResourceType;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"proof" => Ok(Self::Proof),
			"order" => Ok(Self::Order),
			"invoice" => Ok(Self::Invoice),
			"design" => Ok(Self::Design),
			other => Err(UnknownResourceType(other.to_string())),
		}
	}
}

/// Error returned when parsing an unrecognized resource type name
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown resource type: {0}")]
pub struct UnknownResourceType(pub String);

/// Persistent access token record
///
/// ```sql
/// CREATE TABLE public_access_tokens (
///     token VARCHAR(64) PRIMARY KEY,
///     resource_type VARCHAR(32) NOT NULL,
///     resource_id VARCHAR(255) NOT NULL,
///     expires_at BIGINT NOT NULL,
///     one_time_use BOOLEAN NOT NULL,
///     used_at BIGINT,
///     created_by VARCHAR(255),
///     metadata TEXT
/// );
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessToken {
	/// Opaque 64-character hex token (primary key)
	pub token: String,
	/// Resource kind this token is bound to
	pub resource_type: ResourceType,
	/// Identifier of the protected resource
	pub resource_id: String,
	/// Absolute expiry (Unix timestamp in milliseconds)
	pub expires_at: i64,
	/// Whether the token is invalidated by its first successful validation
	pub one_time_use: bool,
	/// When the token was consumed (one-time tokens only; set exactly once)
	pub used_at: Option<i64>,
	/// Provenance label for auditing
	pub created_by: Option<String>,
	/// Free-form audit payload; never consulted by validation logic
	pub metadata: Option<serde_json::Value>,
}

impl AccessToken {
	/// Whether the token has passed its absolute expiry
	pub fn is_expired(&self, now_ms: i64) -> bool {
		now_ms >= self.expires_at
	}

	/// Whether a one-time token has already been consumed
	pub fn is_consumed(&self) -> bool {
		self.one_time_use && self.used_at.is_some()
	}
}

/// What a successful validation returns to the caller
///
/// Carries only the binding; the caller loads the actual resource through
/// its own normal access path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenGrant {
	/// Resource kind the token was bound to
	pub resource_type: ResourceType,
	/// Identifier of the granted resource
	pub resource_id: String,
}

/// Issuance options for [`create_token`](crate::service::AccessTokenService::create_token)
///
/// # Examples
///
/// ```
/// use printworks_tokens::TokenOptions;
///
/// let options = TokenOptions::new()
///     .expires_in_hours(72)
///     .one_time_use(true)
///     .created_by("proof-approval-email");
/// assert_eq!(options.expires_in_hours, 72);
/// assert!(options.one_time_use);
/// ```
#[derive(Debug, Clone)]
pub struct TokenOptions {
	/// Hours until expiry, relative to issuance time. Negative values are
	/// accepted and produce a token that is already expired.
	pub expires_in_hours: i64,
	/// Invalidate after the first successful validation
	pub one_time_use: bool,
	/// Provenance label for auditing
	pub created_by: Option<String>,
	/// Free-form audit payload
	pub metadata: Option<serde_json::Value>,
}

impl TokenOptions {
	/// Create options with the default policy: 48 hours, reusable
	pub fn new() -> Self {
		Self {
			expires_in_hours: 48,
			one_time_use: false,
			created_by: None,
			metadata: None,
		}
	}

	/// Set the expiry window in hours
	pub fn expires_in_hours(mut self, hours: i64) -> Self {
		self.expires_in_hours = hours;
		self
	}

	/// Set whether the token is single-use
	pub fn one_time_use(mut self, enabled: bool) -> Self {
		self.one_time_use = enabled;
		self
	}

	/// Set the provenance label
	pub fn created_by(mut self, label: impl Into<String>) -> Self {
		self.created_by = Some(label.into());
		self
	}

	/// Attach a free-form audit payload
	pub fn metadata(mut self, metadata: serde_json::Value) -> Self {
		self.metadata = Some(metadata);
		self
	}

	/// Absolute expiry computed from the current clock
	pub(crate) fn expires_at_from_now(&self) -> i64 {
		Utc::now().timestamp_millis() + self.expires_in_hours * 3_600_000
	}
}

impl Default for TokenOptions {
	fn default() -> Self {
		Self::new()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	#[case(ResourceType::Proof, "proof")]
	#[case(ResourceType::Order, "order")]
	#[case(ResourceType::Invoice, "invoice")]
	#[case(ResourceType::Design, "design")]
	fn test_resource_type_wire_names(#[case] rt: ResourceType, #[case] name: &str) {
		assert_eq!(rt.as_str(), name);
		assert_eq!(name.parse::<ResourceType>().unwrap(), rt);
		assert_eq!(rt.to_string(), name);
	}

	#[test]
	fn test_resource_type_serde_wire_names() {
		let json = serde_json::to_string(&ResourceType::Invoice).unwrap();
		assert_eq!(json, "\"invoice\"");
		let parsed: ResourceType = serde_json::from_str("\"design\"").unwrap();
		assert_eq!(parsed, ResourceType::Design);
	}

	#[test]
	fn test_unknown_resource_type() {
		let err = "payment".parse::<ResourceType>().unwrap_err();
		assert_eq!(err, UnknownResourceType("payment".to_string()));
	}

	#[test]
	fn test_options_defaults() {
		let options = TokenOptions::new();
		assert_eq!(options.expires_in_hours, 48);
		assert!(!options.one_time_use);
		assert!(options.created_by.is_none());
		assert!(options.metadata.is_none());
	}

	#[test]
	fn test_expiry_predicate() {
		let record = AccessToken {
			token: "t".repeat(64),
			resource_type: ResourceType::Order,
			resource_id: "123".to_string(),
			expires_at: 10_000,
			one_time_use: false,
			used_at: None,
			created_by: None,
			metadata: None,
		};

		assert!(!record.is_expired(9_999));
		assert!(record.is_expired(10_000)); // expiry instant is already invalid
		assert!(record.is_expired(10_001));
	}

	#[test]
	fn test_consumed_predicate() {
		let mut record = AccessToken {
			token: "t".repeat(64),
			resource_type: ResourceType::Proof,
			resource_id: "P1".to_string(),
			expires_at: i64::MAX,
			one_time_use: true,
			used_at: None,
			created_by: None,
			metadata: None,
		};

		assert!(!record.is_consumed());
		record.used_at = Some(5);
		assert!(record.is_consumed());

		// used_at on a reusable token does not mark it consumed
		record.one_time_use = false;
		assert!(!record.is_consumed());
	}

	#[test]
	fn test_negative_expiry_produces_past_timestamp() {
		let options = TokenOptions::new().expires_in_hours(-1);
		assert!(options.expires_at_from_now() < Utc::now().timestamp_millis());
	}
}
