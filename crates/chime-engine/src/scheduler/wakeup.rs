//! One-shot wake-up primitives.
//!
//! The scheduler arms one wake-up per scheduled entry through a
//! [`WakeupSubstrate`]. When the deadline passes, the substrate reports back
//! through a [`WakeupSink`], flagging wake-ups that ran later than the
//! entry's grace window as missed.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chime_core::types::EntryId;
use tokio::task::AbortHandle;
use tokio::time::Instant;

use crate::error::SchedulerError;

/// Arming parameters for one entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WakeupRequest {
    pub id: EntryId,
    /// Time from now until the deadline. Zero for deadlines already passed.
    pub delay: Duration,
    /// Lateness still reported as an on-time fire.
    pub grace: Duration,
}

/// Report delivered when a wake-up goes off.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WakeupEvent {
    Due(EntryId),
    Missed { id: EntryId, late: Duration },
}

/// Receiver of wake-up reports. The scheduler implements this.
#[async_trait]
pub trait WakeupSink: Send + Sync {
    async fn wake(&self, event: WakeupEvent);
}

/// Handle to one armed wake-up.
pub trait ArmedWakeup: Send + Sync {
    /// Stop the wake-up if it has not gone off yet.
    fn disarm(&self);
    /// True until the wake-up has been disarmed or has finished reporting.
    fn is_pending(&self) -> bool;
}

/// Something that can arm one-shot wake-ups.
pub trait WakeupSubstrate: Send + Sync {
    fn arm(
        &self,
        request: WakeupRequest,
        sink: Arc<dyn WakeupSink>,
    ) -> Result<Box<dyn ArmedWakeup>, SchedulerError>;
}

// =============================================================================
// Tokio
// =============================================================================

/// Wake-ups as sleeping tasks on the current tokio runtime.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioWakeups;

struct TokioWakeup {
    handle: AbortHandle,
}

impl ArmedWakeup for TokioWakeup {
    fn disarm(&self) {
        self.handle.abort();
    }

    fn is_pending(&self) -> bool {
        !self.handle.is_finished()
    }
}

impl WakeupSubstrate for TokioWakeups {
    fn arm(
        &self,
        request: WakeupRequest,
        sink: Arc<dyn WakeupSink>,
    ) -> Result<Box<dyn ArmedWakeup>, SchedulerError> {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| SchedulerError::Substrate(e.to_string()))?;
        let deadline = Instant::now()
            .checked_add(request.delay)
            .ok_or_else(|| SchedulerError::InvalidDeadline(format!("{:?} from now", request.delay)))?;
        let WakeupRequest { id, grace, .. } = request;

        // The task stays alive until the sink returns, so the wake-up counts
        // as pending for the whole fire.
        let task = runtime.spawn(async move {
            tokio::time::sleep_until(deadline).await;
            let late = Instant::now().saturating_duration_since(deadline);
            let event = if late <= grace {
                WakeupEvent::Due(id)
            } else {
                WakeupEvent::Missed { id, late }
            };
            sink.wake(event).await;
        });

        Ok(Box::new(TokioWakeup {
            handle: task.abort_handle(),
        }))
    }
}

// =============================================================================
// Manual
// =============================================================================

/// Wake-ups that only go off when triggered by hand.
#[derive(Default)]
pub struct ManualWakeups {
    armed: Mutex<HashMap<EntryId, ManualSlot>>,
    reject: AtomicBool,
}

struct ManualSlot {
    request: WakeupRequest,
    sink: Arc<dyn WakeupSink>,
    pending: Arc<AtomicBool>,
}

struct ManualWakeup {
    pending: Arc<AtomicBool>,
}

impl ArmedWakeup for ManualWakeup {
    fn disarm(&self) {
        self.pending.store(false, Ordering::SeqCst);
    }

    fn is_pending(&self) -> bool {
        self.pending.load(Ordering::SeqCst)
    }
}

impl ManualWakeups {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Make subsequent `arm` calls fail.
    pub fn reject_registrations(&self, reject: bool) {
        self.reject.store(reject, Ordering::SeqCst);
    }

    /// Requests for wake-ups that are still pending.
    pub fn armed(&self) -> Vec<WakeupRequest> {
        self.slots()
            .values()
            .filter(|slot| slot.pending.load(Ordering::SeqCst))
            .map(|slot| slot.request)
            .collect()
    }

    /// Go off on time. Returns false if nothing pending was armed for `id`.
    pub async fn trigger(&self, id: EntryId) -> bool {
        self.fire(id, WakeupEvent::Due(id)).await
    }

    /// Go off late, as a missed wake-up.
    pub async fn trigger_missed(&self, id: EntryId, late: Duration) -> bool {
        self.fire(id, WakeupEvent::Missed { id, late }).await
    }

    /// Drop the wake-up without reporting, as if the substrate lost it.
    pub fn lose(&self, id: EntryId) -> bool {
        match self.slots().remove(&id) {
            Some(slot) => {
                slot.pending.store(false, Ordering::SeqCst);
                true
            }
            None => false,
        }
    }

    async fn fire(&self, id: EntryId, event: WakeupEvent) -> bool {
        let slot = self.slots().remove(&id);
        let Some(slot) = slot else {
            return false;
        };
        if !slot.pending.load(Ordering::SeqCst) {
            return false;
        }
        slot.sink.wake(event).await;
        slot.pending.store(false, Ordering::SeqCst);
        true
    }

    fn slots(&self) -> std::sync::MutexGuard<'_, HashMap<EntryId, ManualSlot>> {
        self.armed.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl WakeupSubstrate for ManualWakeups {
    fn arm(
        &self,
        request: WakeupRequest,
        sink: Arc<dyn WakeupSink>,
    ) -> Result<Box<dyn ArmedWakeup>, SchedulerError> {
        if self.reject.load(Ordering::SeqCst) {
            return Err(SchedulerError::Substrate(
                "manual wake-ups are rejecting registrations".to_string(),
            ));
        }
        let pending = Arc::new(AtomicBool::new(true));
        self.slots().insert(
            request.id,
            ManualSlot {
                request,
                sink,
                pending: Arc::clone(&pending),
            },
        );
        Ok(Box::new(ManualWakeup { pending }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    struct ChannelSink {
        tx: mpsc::UnboundedSender<WakeupEvent>,
    }

    #[async_trait]
    impl WakeupSink for ChannelSink {
        async fn wake(&self, event: WakeupEvent) {
            let _ = self.tx.send(event);
        }
    }

    fn channel_sink() -> (Arc<dyn WakeupSink>, mpsc::UnboundedReceiver<WakeupEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Arc::new(ChannelSink { tx }), rx)
    }

    fn request(delay_secs: u64, grace_secs: u64) -> WakeupRequest {
        WakeupRequest {
            id: EntryId::new(),
            delay: Duration::from_secs(delay_secs),
            grace: Duration::from_secs(grace_secs),
        }
    }

    #[test]
    fn test_tokio_wakeups_require_runtime() {
        let (sink, _rx) = channel_sink();
        let result = TokioWakeups.arm(request(1, 30), sink);
        assert!(matches!(result, Err(SchedulerError::Substrate(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_tokio_wakeup_fires_after_delay() {
        let (sink, mut rx) = channel_sink();
        let req = request(5, 30);
        let wakeup = TokioWakeups.arm(req, sink).unwrap();
        assert!(wakeup.is_pending());

        tokio::time::sleep(Duration::from_secs(4)).await;
        assert!(rx.try_recv().is_err());

        let event = rx.recv().await.unwrap();
        assert_eq!(event, WakeupEvent::Due(req.id));
    }

    #[tokio::test(start_paused = true)]
    async fn test_tokio_wakeup_disarm() {
        let (sink, mut rx) = channel_sink();
        let wakeup = TokioWakeups.arm(request(5, 30), sink).unwrap();
        wakeup.disarm();
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(rx.try_recv().is_err());
        assert!(!wakeup.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn test_tokio_wakeup_zero_delay_is_due() {
        let (sink, mut rx) = channel_sink();
        let req = request(0, 30);
        let _wakeup = TokioWakeups.arm(req, sink).unwrap();
        assert_eq!(rx.recv().await.unwrap(), WakeupEvent::Due(req.id));
    }

    #[tokio::test(start_paused = true)]
    async fn test_tokio_wakeup_past_grace_is_missed() {
        let (sink, mut rx) = channel_sink();
        let req = request(1, 0);
        let _wakeup = TokioWakeups.arm(req, sink).unwrap();

        // Jump past the deadline before the wake-up task gets to run.
        tokio::time::advance(Duration::from_secs(5)).await;

        match rx.recv().await.unwrap() {
            WakeupEvent::Missed { id, late } => {
                assert_eq!(id, req.id);
                assert!(late >= Duration::from_secs(4));
            }
            other => panic!("expected a missed wake-up, got {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_tokio_wakeup_late_within_grace_is_due() {
        let (sink, mut rx) = channel_sink();
        let req = request(1, 10);
        let _wakeup = TokioWakeups.arm(req, sink).unwrap();

        tokio::time::advance(Duration::from_secs(5)).await;

        assert_eq!(rx.recv().await.unwrap(), WakeupEvent::Due(req.id));
    }

    #[tokio::test]
    async fn test_manual_trigger_once() {
        let wakeups = ManualWakeups::new();
        let (sink, mut rx) = channel_sink();
        let req = request(60, 30);
        let wakeup = wakeups.arm(req, sink).unwrap();
        assert_eq!(wakeups.armed(), vec![req]);

        assert!(wakeups.trigger(req.id).await);
        assert_eq!(rx.recv().await.unwrap(), WakeupEvent::Due(req.id));
        assert!(!wakeup.is_pending());
        assert!(!wakeups.trigger(req.id).await);
        assert!(wakeups.armed().is_empty());
    }

    #[tokio::test]
    async fn test_manual_disarmed_does_not_fire() {
        let wakeups = ManualWakeups::new();
        let (sink, mut rx) = channel_sink();
        let req = request(60, 30);
        let wakeup = wakeups.arm(req, sink).unwrap();
        wakeup.disarm();
        assert!(!wakeups.trigger(req.id).await);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_manual_missed_and_lost() {
        let wakeups = ManualWakeups::new();
        let (sink, mut rx) = channel_sink();
        let missed = request(1, 1);
        let lost = request(1, 1);
        wakeups.arm(missed, Arc::clone(&sink)).unwrap();
        let lost_handle = wakeups.arm(lost, sink).unwrap();

        assert!(wakeups.trigger_missed(missed.id, Duration::from_secs(90)).await);
        assert_eq!(
            rx.recv().await.unwrap(),
            WakeupEvent::Missed {
                id: missed.id,
                late: Duration::from_secs(90)
            }
        );

        assert!(wakeups.lose(lost.id));
        assert!(!lost_handle.is_pending());
        assert!(!wakeups.trigger(lost.id).await);
    }

    #[test]
    fn test_manual_reject() {
        let wakeups = ManualWakeups::new();
        wakeups.reject_registrations(true);
        let (sink, _rx) = channel_sink();
        assert!(wakeups.arm(request(1, 1), sink).is_err());
    }
}
