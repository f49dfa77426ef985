//! # Block Context
//!
//! A clonable handle over a child cancellation token plus an optional
//! deadline. All clones observe the same state.

use crate::domain::errors::ContextError;
use std::sync::{Arc, OnceLock};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::runtime::Handle;
use tokio::time::{sleep_until, Instant};
use tokio_util::sync::CancellationToken;
use tracing::debug;

#[derive(Debug)]
struct ContextInner {
    block_number: u64,
    token: CancellationToken,
    deadline: Option<Instant>,
    cause: OnceLock<ContextError>,
}

/// Cancellation context shared by every task observed in one block.
#[derive(Debug, Clone)]
pub struct BlockContext {
    inner: Arc<ContextInner>,
}

impl BlockContext {
    /// Derive a context from `parent`.
    ///
    /// With a deadline in the past the context is done on return. Otherwise,
    /// when called inside a Tokio runtime, a timer task cancels the context
    /// at the deadline.
    pub fn new(parent: &CancellationToken, block_number: u64, deadline: Option<Instant>) -> Self {
        let ctx = Self {
            inner: Arc::new(ContextInner {
                block_number,
                token: parent.child_token(),
                deadline,
                cause: OnceLock::new(),
            }),
        };

        if let Some(deadline) = deadline {
            if deadline <= Instant::now() {
                ctx.finish(ContextError::DeadlineExceeded);
            } else if let Ok(handle) = Handle::try_current() {
                handle.spawn(ctx.clone().watch_deadline(deadline));
            }
        }
        ctx
    }

    /// Derive a context whose deadline is an absolute unix timestamp.
    pub fn with_unix_deadline(
        parent: &CancellationToken,
        block_number: u64,
        deadline_unix_seconds: Option<u64>,
    ) -> Self {
        Self::new(parent, block_number, deadline_unix_seconds.map(instant_from_unix))
    }

    pub fn block_number(&self) -> u64 {
        self.inner.block_number
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.inner.deadline
    }

    /// A token cancelled together with this context.
    pub fn child_token(&self) -> CancellationToken {
        self.inner.token.child_token()
    }

    /// Cancel this context and everything derived from it.
    pub fn cancel(&self) {
        self.finish(ContextError::Cancelled);
    }

    /// Why the context ended, or `None` while it is live.
    pub fn err(&self) -> Option<ContextError> {
        if let Some(cause) = self.inner.cause.get() {
            return Some(*cause);
        }
        if self.inner.token.is_cancelled() {
            // cancelled through the parent
            return Some(*self.inner.cause.get_or_init(|| ContextError::Cancelled));
        }
        match self.inner.deadline {
            Some(deadline) if deadline <= Instant::now() => {
                self.finish(ContextError::DeadlineExceeded);
                self.inner.cause.get().copied()
            }
            _ => None,
        }
    }

    pub fn is_done(&self) -> bool {
        self.err().is_some()
    }

    /// Wait until the context is cancelled or its deadline passes.
    pub async fn done(&self) -> ContextError {
        match self.inner.deadline {
            Some(deadline) => {
                tokio::select! {
                    _ = self.inner.token.cancelled() => {}
                    _ = sleep_until(deadline) => self.finish(ContextError::DeadlineExceeded),
                }
            }
            None => self.inner.token.cancelled().await,
        }
        self.err().unwrap_or(ContextError::Cancelled)
    }

    fn finish(&self, cause: ContextError) {
        let _ = self.inner.cause.set(cause);
        self.inner.token.cancel();
    }

    async fn watch_deadline(self, deadline: Instant) {
        tokio::select! {
            _ = self.inner.token.cancelled() => {
                let _ = self.inner.cause.set(ContextError::Cancelled);
            }
            _ = sleep_until(deadline) => {
                self.finish(ContextError::DeadlineExceeded);
                debug!("[tc-02] Block {} context hit its deadline", self.inner.block_number);
            }
        }
    }
}

/// Map an absolute unix deadline onto the Tokio clock.
fn instant_from_unix(deadline_unix_seconds: u64) -> Instant {
    let now_unix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    let remaining = Duration::from_secs(deadline_unix_seconds).saturating_sub(now_unix);
    Instant::now() + remaining
}
