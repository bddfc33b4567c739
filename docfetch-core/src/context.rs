//! Caller-supplied deadline and cancellation for fetch operations.
//!
//! A [`FetchContext`] is created by the caller and passed by reference into
//! [`DocumentStoreClient::list_documents`](crate::store::DocumentStoreClient::list_documents).
//! The client never creates one for itself, and cleanup work never runs under it.

use std::{future::Future, time::Duration};
use tokio::time::{Instant, sleep_until};
use tokio_util::sync::CancellationToken;

use crate::error::{FetchError, FetchResult};


/// Deadline and cancellation token owned by the caller of a fetch.
#[derive(Debug, Clone, Default)]
pub struct FetchContext {
    deadline: Option<Instant>,
    cancel: CancellationToken,
}

impl FetchContext {
    /// A context with no deadline that is only cancelled through its token.
    pub fn background() -> Self {
        Self::default()
    }

    /// A context whose deadline is `timeout` from now.
    ///
    /// A timeout too large to represent as an instant (e.g. `Duration::MAX`) means no
    /// deadline.
    pub fn with_timeout(timeout: Duration) -> Self {
        match Instant::now().checked_add(timeout) {
            Some(deadline) => Self::with_deadline(deadline),
            None => Self::background(),
        }
    }

    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            deadline: Some(deadline),
            cancel: CancellationToken::new(),
        }
    }

    /// Replaces the cancellation token, e.g. with a child of an application-wide token.
    pub fn cancelled_by(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// The token that cancels operations running under this context.
    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Checks the context without waiting.
    ///
    /// Cancellation takes precedence over an expired deadline.
    pub fn check(&self) -> FetchResult<()> {
        if self.cancel.is_cancelled() {
            return Err(FetchError::Cancelled);
        }
        if self.deadline.is_some_and(|deadline| deadline <= Instant::now()) {
            return Err(FetchError::DeadlineExceeded);
        }

        Ok(())
    }

    /// Drives `fut` until it completes or the context ends, whichever comes first.
    ///
    /// When the context wins, `fut` is dropped without being polled further.
    pub async fn run<F, T>(&self, fut: F) -> FetchResult<T>
    where
        F: Future<Output = FetchResult<T>>,
    {
        self.check()?;

        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(FetchError::Cancelled),
            _ = wait_for(self.deadline) => Err(FetchError::DeadlineExceeded),
            result = fut => result,
        }
    }
}

async fn wait_for(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending::<()>().await,
    }
}
