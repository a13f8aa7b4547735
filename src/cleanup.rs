//! Periodic token cleanup
//!
//! Sweeps rows that are both expired and already consumed. Expired but
//! never-used tokens stay in the table on purpose: they cost one row each
//! and keep the audit trail of links that were mailed out but never opened.
//!
//! The sweep can be driven by an external scheduler calling
//! [`TokenCleanupTask::run_cleanup`], or hosted in-process with
//! [`TokenCleanupTask::run_periodic`].
//!
//! ## Example
//!
//! ```
//! use std::time::Duration;
//! use printworks_tokens::cleanup::TokenCleanupTask;
//! use printworks_tokens::store::InMemoryTokenStore;
//! use printworks_tokens::AccessTokenService;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let service = AccessTokenService::new(InMemoryTokenStore::new());
//! let cleanup = TokenCleanupTask::new(service);
//!
//! let removed = cleanup.run_cleanup().await?;
//! assert_eq!(removed, 0);
//! # Ok(())
//! # }
//! # tokio_test::block_on(example()).unwrap();
//! ```

use std::time::Duration;
use tracing::{info, warn};

use crate::error::TokenError;
use crate::service::AccessTokenService;
use crate::store::TokenStore;

/// Cleanup scheduling configuration
#[derive(Debug, Clone)]
pub struct CleanupConfig {
	/// Interval between sweeps when run in-process
	pub interval: Duration,
}

impl Default for CleanupConfig {
	fn default() -> Self {
		Self {
			interval: Duration::from_secs(3600), // 1 hour
		}
	}
}

/// Periodic sweep over the token table
pub struct TokenCleanupTask<S: TokenStore> {
	service: AccessTokenService<S>,
	config: CleanupConfig,
}

impl<S: TokenStore> TokenCleanupTask<S> {
	/// Create a task with the default configuration
	pub fn new(service: AccessTokenService<S>) -> Self {
		Self {
			service,
			config: CleanupConfig::default(),
		}
	}

	/// Create a task with a custom configuration
	pub fn with_config(service: AccessTokenService<S>, config: CleanupConfig) -> Self {
		Self { service, config }
	}

	/// The configuration in effect
	pub fn config(&self) -> &CleanupConfig {
		&self.config
	}

	/// Run one sweep; returns the number of rows removed
	pub async fn run_cleanup(&self) -> Result<u64, TokenError> {
		self.service.cleanup_expired_tokens().await
	}

	/// Run sweeps forever at the configured interval
	///
	/// A failed sweep is logged and the loop continues; transient storage
	/// trouble must not kill the background task.
	pub async fn run_periodic(&self) {
		let mut ticker = tokio::time::interval(self.config.interval);
		// First tick fires immediately; skip it so startup is not a sweep
		ticker.tick().await;

		loop {
			ticker.tick().await;
			match self.run_cleanup().await {
				Ok(removed) => {
					info!(removed, "token cleanup sweep finished");
				}
				Err(err) => {
					warn!(error = %err, "token cleanup sweep failed");
				}
			}
		}
	}
}
