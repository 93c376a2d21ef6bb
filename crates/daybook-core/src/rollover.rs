//! Day rollover
//!
//! Re-runs past-day derivation when the local calendar date changes while a
//! session is open, so yesterday locks (or turns yellow) without a reload.

use chrono::NaiveDate;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::interval;
use tracing::{debug, info};

use crate::store::JournalStore;

/// Default poll interval.
pub const DEFAULT_POLL: Duration = Duration::from_secs(15);

/// Upper bound on the poll interval; a rollover is noticed within this time.
pub const MAX_POLL: Duration = Duration::from_secs(30);

/// Watches the store's clock for a date change.
pub struct DayRolloverWatcher {
    store: JournalStore,
    last_seen: NaiveDate,
    poll: Duration,
}

impl DayRolloverWatcher {
    /// `poll` is clamped to 1s..=30s.
    pub fn new(store: JournalStore, poll: Duration) -> Self {
        let last_seen = store.clock().today();
        Self {
            store,
            last_seen,
            poll: poll.clamp(Duration::from_secs(1), MAX_POLL),
        }
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll
    }

    /// Compare the clock against the last seen date. On a change, derive past
    /// days against the new date and return the number of changed slots.
    pub async fn check(&mut self) -> Option<usize> {
        let today = self.store.clock().today();
        if today == self.last_seen {
            return None;
        }

        let previous = std::mem::replace(&mut self.last_seen, today);
        let changed = self.store.reconcile_past_days(today).await;
        info!(%previous, %today, changed, "Day rolled over");
        Some(changed)
    }

    /// Poll until a message arrives on `shutdown` (or its sender is dropped).
    pub async fn run(mut self, mut shutdown: mpsc::Receiver<()>) {
        debug!(poll_secs = self.poll.as_secs(), "Rollover watcher started");
        let mut tick = interval(self.poll);

        loop {
            tokio::select! {
                _ = tick.tick() => {
                    self.check().await;
                }
                _ = shutdown.recv() => {
                    debug!("Rollover watcher stopping");
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::mock::MockRemote;
    use crate::session::SessionContext;
    use crate::snapshot::MemorySnapshotStore;
    use crate::types::{DayKey, Mood};
    use std::sync::Arc;

    fn date(month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, month, day).unwrap()
    }

    #[test]
    fn test_poll_is_clamped() {
        let store = JournalStore::new(
            SessionContext::anonymous(),
            Arc::new(MockRemote::new()),
            Arc::new(MemorySnapshotStore::new()),
            Arc::new(FixedClock::at_date(date(4, 10))),
        );
        assert_eq!(DayRolloverWatcher::new(store.clone(), Duration::from_secs(300)).poll_interval(), MAX_POLL);
        assert_eq!(
            DayRolloverWatcher::new(store, Duration::ZERO).poll_interval(),
            Duration::from_secs(1)
        );
    }

    #[tokio::test]
    async fn test_rollover_locks_yesterday() {
        let clock = Arc::new(FixedClock::at_date(date(4, 10)));
        let store = JournalStore::new(
            SessionContext::anonymous(),
            Arc::new(MockRemote::new()),
            Arc::new(MemorySnapshotStore::new()),
            clock.clone(),
        );
        store.initialize().await;
        store.set_text(10, "written today").await;

        let mut watcher = DayRolloverWatcher::new(store.clone(), DEFAULT_POLL);
        assert_eq!(watcher.check().await, None);

        clock.set(date(4, 11).and_hms_opt(0, 0, 5).unwrap());
        assert_eq!(watcher.check().await, Some(1));
        assert_eq!(store.entry(DayKey::new(3, 10)).await.unwrap().mood, Mood::Yellow);

        // Same date again: no work
        assert_eq!(watcher.check().await, None);
        assert!(store.is_editable(11).await);
        assert!(!store.is_editable(10).await);
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown() {
        let store = JournalStore::new(
            SessionContext::anonymous(),
            Arc::new(MockRemote::new()),
            Arc::new(MemorySnapshotStore::new()),
            Arc::new(FixedClock::at_date(date(4, 10))),
        );
        let (tx, rx) = mpsc::channel(1);
        let handle = tokio::spawn(DayRolloverWatcher::new(store, DEFAULT_POLL).run(rx));

        tx.send(()).await.unwrap();
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("watcher should stop")
            .unwrap();
    }
}
