//! Fire listeners and the dispatch boundary.
//!
//! Each entry carries its own listener. When the entry fires, the listener
//! runs on its own task so that an error or panic inside it is contained
//! and logged here rather than reaching the scheduler.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, error, warn};

use crate::error::ListenerError;
use crate::types::FireEvent;

/// Receives the fire notification for one entry.
#[async_trait]
pub trait FireListener: Send + Sync {
    async fn on_fire(&self, event: FireEvent) -> Result<(), ListenerError>;
}

/// Adapts an async closure into a [`FireListener`].
pub struct FnListener<F> {
    f: F,
}

#[async_trait]
impl<F, Fut> FireListener for FnListener<F>
where
    F: Fn(FireEvent) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), ListenerError>> + Send + 'static,
{
    async fn on_fire(&self, event: FireEvent) -> Result<(), ListenerError> {
        (self.f)(event).await
    }
}

/// Wrap a closure as a shareable listener.
pub fn listener_fn<F, Fut>(f: F) -> Arc<dyn FireListener>
where
    F: Fn(FireEvent) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), ListenerError>> + Send + 'static,
{
    Arc::new(FnListener { f })
}

/// What happened when a wake-up reached the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FireOutcome {
    /// The entry was already gone; nothing was invoked.
    Ignored,
    Delivered,
    ListenerFailed,
    ListenerPanicked,
}

impl FireOutcome {
    /// Whether the listener was invoked at all.
    pub fn invoked(&self) -> bool {
        !matches!(self, FireOutcome::Ignored)
    }
}

/// Run `listener` once with `event`, containing any failure.
pub async fn deliver(listener: Arc<dyn FireListener>, event: FireEvent) -> FireOutcome {
    let entry_id = event.entry.id;
    let kind = event.kind;

    let task = tokio::spawn(async move { listener.on_fire(event).await });

    match task.await {
        Ok(Ok(())) => {
            debug!(entry_id = %entry_id, event = %kind, "Fire notification delivered");
            FireOutcome::Delivered
        }
        Ok(Err(e)) => {
            warn!(entry_id = %entry_id, error = %e, "Fire listener failed");
            FireOutcome::ListenerFailed
        }
        Err(e) if e.is_panic() => {
            error!(entry_id = %entry_id, "Fire listener panicked");
            FireOutcome::ListenerPanicked
        }
        Err(e) => {
            warn!(entry_id = %entry_id, error = %e, "Fire listener task was cancelled");
            FireOutcome::ListenerFailed
        }
    }
}
