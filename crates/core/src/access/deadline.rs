//! Per-operation deadlines.
//!
//! A [`Deadline`] is fixed when the request arrives. Running an operation
//! under it races the operation against the deadline instant; on expiry the
//! operation future is dropped, which cancels any in-flight query and rolls
//! back an open unit of work. Nothing is retried.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;

use super::error::StoreError;

#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    at: Instant,
    budget: Duration,
}

impl Deadline {
    /// A deadline `budget` from now.
    pub fn after(budget: Duration) -> Self {
        Self {
            at: Instant::now() + budget,
            budget,
        }
    }

    /// Run `fut` to completion or fail with [`StoreError::Timeout`].
    pub async fn run<T, E, F>(&self, fut: F) -> Result<T, E>
    where
        F: Future<Output = Result<T, E>>,
        E: From<StoreError>,
    {
        match tokio::time::timeout_at(self.at, fut).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(
                    budget_ms = self.budget.as_millis() as u64,
                    "Operation deadline exceeded, aborting"
                );
                Err(StoreError::Timeout(self.budget).into())
            }
        }
    }
}
