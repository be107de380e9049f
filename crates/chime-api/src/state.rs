//! Application state shared across all route handlers.
//!
//! AppState holds the scheduler, the command interpreter, and the broadcast
//! channel that carries fire notifications to SSE subscribers.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use chime_core::config::ChimeConfig;
use chime_engine::{
    Clock, CommandInterpreter, FireEvent, FireListener, ListenerError, Scheduler, SystemClock,
    TokioWakeups,
};
use tokio::sync::broadcast;
use tracing::debug;

/// Shared application state.
///
/// All fields are cheap to clone across handler tasks.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<ChimeConfig>,
    /// Timer and alarm scheduler.
    pub scheduler: Scheduler,
    /// Text command interpreter.
    pub interpreter: Arc<CommandInterpreter>,
    /// Broadcast sender for fire notifications.
    pub event_tx: broadcast::Sender<FireEvent>,
    /// Server start time for uptime calculation.
    pub start_time: Instant,
}

impl AppState {
    /// Create a new AppState around an existing scheduler and interpreter.
    pub fn new(config: ChimeConfig, scheduler: Scheduler, interpreter: CommandInterpreter) -> Self {
        let (event_tx, _) = broadcast::channel(config.api.event_buffer.max(1));
        Self {
            config: Arc::new(config),
            scheduler,
            interpreter: Arc::new(interpreter),
            event_tx,
            start_time: Instant::now(),
        }
    }

    /// Build the production wiring: system clock and tokio wake-ups.
    pub fn from_config(config: ChimeConfig) -> Self {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let scheduler = Scheduler::new(
            config.scheduler.clone(),
            Arc::clone(&clock),
            Arc::new(TokioWakeups),
        );
        let interpreter = CommandInterpreter::new(config.interpreter.clone(), clock);
        Self::new(config, scheduler, interpreter)
    }

    /// Listener that forwards an entry's fire notification to subscribers.
    pub fn fire_listener(&self) -> Arc<dyn FireListener> {
        Arc::new(BroadcastListener {
            tx: self.event_tx.clone(),
        })
    }
}

/// Publishes fire notifications on the SSE broadcast channel.
struct BroadcastListener {
    tx: broadcast::Sender<FireEvent>,
}

#[async_trait]
impl FireListener for BroadcastListener {
    async fn on_fire(&self, event: FireEvent) -> Result<(), ListenerError> {
        let entry_id = event.entry.id;
        match self.tx.send(event) {
            Ok(receivers) => {
                debug!(entry_id = %entry_id, receivers, "Broadcast fire notification");
            }
            // No subscribers connected; nothing to deliver to.
            Err(_) => {
                debug!(entry_id = %entry_id, "Fire notification had no subscribers");
            }
        }
        Ok(())
    }
}
