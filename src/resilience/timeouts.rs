//! Deadline enforcement for provider calls.
//!
//! # Responsibilities
//! - Race every provider call against a fixed deadline
//! - Drop the losing side: the timer on success, the provider future on timeout
//!
//! # Design Decisions
//! - Uses Tokio's timeout facilities
//! - A fired deadline always maps to `WalletError::Timeout`

use std::future::Future;
use std::time::Duration;

use tokio::time::timeout;

use crate::error::{WalletError, WalletResult};

/// Default per-operation deadline.
pub const DEFAULT_OPERATION_TIMEOUT: Duration = Duration::from_millis(10_000);

/// Run `fut` with a deadline, reporting expiry as a timeout of `operation`.
pub async fn with_deadline<T, F>(operation: &str, limit: Duration, fut: F) -> WalletResult<T>
where
    F: Future<Output = WalletResult<T>>,
{
    match timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!(
                operation = operation,
                timeout_ms = limit.as_millis() as u64,
                "Provider call timed out"
            );
            Err(WalletError::timeout(operation))
        }
    }
}
