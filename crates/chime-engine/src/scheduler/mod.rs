//! Scheduling engine for timers and alarms.
//!
//! Owns the entry registry and arms one wake-up per scheduled entry. Every
//! entry leaves the registry exactly once: whichever of cancel, fire, sweep,
//! or shutdown removes it under the registry lock performs the terminal
//! transition, and the others see nothing to do.

pub mod state_machine;
pub mod wakeup;

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;

use async_trait::async_trait;
use chime_core::config::SchedulerConfig;
use chime_core::types::{EntryId, EntryKind, EntryState};
use chrono::{DateTime, TimeDelta, Utc};
use tokio::sync::Notify;
use tracing::{debug, info, warn};

use crate::clock::Clock;
use crate::dispatch::{self, FireListener, FireOutcome};
use crate::error::SchedulerError;
use crate::types::{Entry, EntrySnapshot, FireEvent};
use wakeup::{ArmedWakeup, WakeupEvent, WakeupRequest, WakeupSink, WakeupSubstrate};

struct Record {
    entry: Entry,
    listener: Arc<dyn FireListener>,
    wakeup: Box<dyn ArmedWakeup>,
}

#[derive(Default)]
struct Registry {
    records: HashMap<EntryId, Record>,
    closed: bool,
}

struct Inner {
    config: SchedulerConfig,
    clock: Arc<dyn Clock>,
    wakeups: Arc<dyn WakeupSubstrate>,
    registry: Mutex<Registry>,
    shutdown: Notify,
}

impl Drop for Inner {
    fn drop(&mut self) {
        let registry = self.registry.get_mut().unwrap_or_else(|e| e.into_inner());
        if registry.records.is_empty() {
            return;
        }
        let count = registry.records.len();
        for (_, record) in registry.records.drain() {
            record.wakeup.disarm();
        }
        warn!(count, "Scheduler dropped without shutdown, disarmed pending entries");
    }
}

/// Shared handle to the scheduling engine. Cloning is cheap.
#[derive(Clone)]
pub struct Scheduler {
    inner: Arc<Inner>,
}

impl Scheduler {
    pub fn new(
        config: SchedulerConfig,
        clock: Arc<dyn Clock>,
        wakeups: Arc<dyn WakeupSubstrate>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                config,
                clock,
                wakeups,
                registry: Mutex::new(Registry::default()),
                shutdown: Notify::new(),
            }),
        }
    }

    /// Schedule a countdown that fires `duration` from now.
    pub fn create_timer(
        &self,
        duration: Duration,
        name: impl Into<String>,
        listener: Arc<dyn FireListener>,
    ) -> Result<EntryId, SchedulerError> {
        let now = self.inner.clock.now();
        let delta = TimeDelta::from_std(duration)
            .map_err(|e| SchedulerError::InvalidDeadline(e.to_string()))?;
        let target = now
            .checked_add_signed(delta)
            .ok_or_else(|| SchedulerError::InvalidDeadline(format!("{:?} from now", duration)))?;
        let grace = Duration::from_secs(self.inner.config.timer_grace_secs);
        self.register(EntryKind::Timer, name.into(), now, target, Some(duration), grace, listener)
    }

    /// Schedule an alarm for an absolute time.
    pub fn create_alarm(
        &self,
        target_time: DateTime<Utc>,
        name: impl Into<String>,
        listener: Arc<dyn FireListener>,
    ) -> Result<EntryId, SchedulerError> {
        let now = self.inner.clock.now();
        let grace = Duration::from_secs(self.inner.config.alarm_grace_secs);
        self.register(EntryKind::Alarm, name.into(), now, target_time, None, grace, listener)
    }

    #[allow(clippy::too_many_arguments)]
    fn register(
        &self,
        kind: EntryKind,
        name: String,
        now: DateTime<Utc>,
        target_time: DateTime<Utc>,
        duration: Option<Duration>,
        grace: Duration,
        listener: Arc<dyn FireListener>,
    ) -> Result<EntryId, SchedulerError> {
        let id = EntryId::new();
        let delay = (target_time - now).to_std().unwrap_or(Duration::ZERO);

        let mut registry = self.registry();
        if registry.closed {
            return Err(SchedulerError::ShuttingDown);
        }
        let limit = self.inner.config.max_active_entries;
        if registry.records.len() >= limit {
            warn!(kind = %kind, limit, "Rejected entry: registry is full");
            return Err(SchedulerError::CapacityExceeded { limit });
        }

        // Armed under the lock so a zero-delay fire cannot observe the
        // registry before the record is inserted.
        let wakeup = self
            .inner
            .wakeups
            .arm(WakeupRequest { id, delay, grace }, self.sink())?;

        let entry = Entry {
            id,
            name,
            kind,
            created_at: now,
            target_time,
            duration,
            state: EntryState::Scheduled,
        };
        info!(
            entry_id = %id,
            kind = %kind,
            name = %entry.name,
            target_time = %target_time,
            "Entry scheduled"
        );
        registry.records.insert(
            id,
            Record {
                entry,
                listener,
                wakeup,
            },
        );
        Ok(id)
    }

    /// Cancel one entry. Returns false if it was not active.
    pub fn cancel(&self, id: EntryId) -> bool {
        let record = self.registry().records.remove(&id);
        match record {
            Some(record) => {
                self.retire(record, EntryState::Cancelled);
                info!(entry_id = %id, "Entry cancelled");
                true
            }
            None => {
                debug!(entry_id = %id, "Cancel for unknown or finished entry");
                false
            }
        }
    }

    /// Cancel every active entry, returning how many were cancelled.
    pub fn cancel_all(&self) -> usize {
        let drained: Vec<Record> = {
            let mut registry = self.registry();
            registry.records.drain().map(|(_, record)| record).collect()
        };
        let count = drained.len();
        for record in drained {
            self.retire(record, EntryState::Cancelled);
        }
        info!(count, "Cancelled all entries");
        count
    }

    /// Snapshots of the active entries, soonest first.
    ///
    /// Entries whose deadline has passed without a pending wake-up are
    /// dropped first.
    pub fn list_active(&self) -> Vec<EntrySnapshot> {
        self.sweep_stale();
        let now = self.inner.clock.now();
        let mut snapshots: Vec<EntrySnapshot> = self
            .registry()
            .records
            .values()
            .map(|record| record.entry.snapshot(now))
            .collect();
        snapshots.sort_by_key(|s| s.target_time);
        snapshots
    }

    pub fn get(&self, id: EntryId) -> Option<EntrySnapshot> {
        let now = self.inner.clock.now();
        self.registry()
            .records
            .get(&id)
            .map(|record| record.entry.snapshot(now))
    }

    pub fn active_count(&self) -> usize {
        self.registry().records.len()
    }

    /// Drop entries whose deadline passed but whose wake-up is gone.
    /// Returns how many were dropped.
    pub fn sweep_stale(&self) -> usize {
        let now = self.inner.clock.now();
        let stale: Vec<Record> = {
            let mut registry = self.registry();
            let ids: Vec<EntryId> = registry
                .records
                .values()
                .filter(|r| r.entry.target_time <= now && !r.wakeup.is_pending())
                .map(|r| r.entry.id)
                .collect();
            ids.iter()
                .filter_map(|id| registry.records.remove(id))
                .collect()
        };
        let count = stale.len();
        for record in stale {
            warn!(entry_id = %record.entry.id, "Dropped stale entry with no pending wake-up");
            self.retire(record, EntryState::Cancelled);
        }
        if count > 0 {
            debug!(count, "Stale entry sweep");
        }
        count
    }

    /// Fire an entry: notify its listener once and remove it.
    ///
    /// Unknown or already-finished ids are ignored.
    pub async fn on_fire(&self, id: EntryId) -> FireOutcome {
        let record = self.registry().records.remove(&id);
        let Some(Record {
            mut entry,
            listener,
            wakeup,
        }) = record
        else {
            warn!(entry_id = %id, "Wake-up for unknown entry ignored");
            return FireOutcome::Ignored;
        };
        drop(wakeup);

        if let Err(e) = entry.transition(EntryState::Fired) {
            warn!(entry_id = %id, error = %e, "Unexpected entry state on fire");
        }
        let event = FireEvent::new(entry.snapshot(self.inner.clock.now()));
        info!(entry_id = %id, kind = %entry.kind, name = %entry.name, "Entry fired");
        dispatch::deliver(listener, event).await
    }

    /// Fire an entry whose wake-up ran past its grace window.
    pub async fn on_missed(&self, id: EntryId) -> FireOutcome {
        warn!(entry_id = %id, "Wake-up missed its grace window, firing late");
        self.on_fire(id).await
    }

    /// Periodically sweep stale entries until [`Scheduler::shutdown`].
    pub async fn run(&self) {
        let period = Duration::from_secs(self.inner.config.sweep_interval_secs.max(1));
        loop {
            if self.is_shut_down() {
                return;
            }
            tokio::select! {
                _ = tokio::time::sleep(period) => {
                    self.sweep_stale();
                }
                _ = self.inner.shutdown.notified() => return,
            }
        }
    }

    /// Reject new entries, disarm and drop every pending one, and stop the
    /// sweep loop. Returns how many entries were drained.
    pub fn shutdown(&self) -> usize {
        let drained: Vec<Record> = {
            let mut registry = self.registry();
            registry.closed = true;
            registry.records.drain().map(|(_, record)| record).collect()
        };
        let count = drained.len();
        for record in drained {
            self.retire(record, EntryState::Cancelled);
        }
        self.inner.shutdown.notify_one();
        info!(drained = count, "Scheduler shut down");
        count
    }

    pub fn is_shut_down(&self) -> bool {
        self.registry().closed
    }

    fn retire(&self, record: Record, state: EntryState) {
        let Record {
            mut entry, wakeup, ..
        } = record;
        wakeup.disarm();
        if let Err(e) = entry.transition(state) {
            warn!(entry_id = %entry.id, error = %e, "Unexpected entry state on removal");
        }
    }

    fn sink(&self) -> Arc<dyn WakeupSink> {
        Arc::new(EngineSink {
            inner: Arc::downgrade(&self.inner),
        })
    }

    fn registry(&self) -> MutexGuard<'_, Registry> {
        self.inner.registry.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Routes wake-ups back into the scheduler without keeping it alive.
struct EngineSink {
    inner: Weak<Inner>,
}

#[async_trait]
impl WakeupSink for EngineSink {
    async fn wake(&self, event: WakeupEvent) {
        let Some(inner) = self.inner.upgrade() else {
            warn!(?event, "Wake-up after the scheduler was dropped");
            return;
        };
        let scheduler = Scheduler { inner };
        match event {
            WakeupEvent::Due(id) => {
                scheduler.on_fire(id).await;
            }
            WakeupEvent::Missed { id, late } => {
                debug!(entry_id = %id, late_ms = late.as_millis() as u64, "Late wake-up");
                scheduler.on_missed(id).await;
            }
        }
    }
}
