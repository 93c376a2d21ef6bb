//! Journal store
//!
//! Owns the client-side view of every day entry for a session:
//! - initial load (local snapshot merged with the remote list, remote wins)
//! - day-state derivation for past days (black/yellow moods)
//! - optimistic mutations on today's slot, synced to the remote in the
//!   background and reconciled with the canonical record it returns
//!
//! Sync responses are applied in arrival order, so when two edits of the same
//! day race, the last response to land wins.

use base64::Engine;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::clock::Clock;
use crate::error::{JournalError, Result};
use crate::remote::{JournalRemote, MediaUpload, RemoteError, RemoveMediaRequest, UploadRequest};
use crate::session::{Credential, SessionContext};
use crate::snapshot::SnapshotStore;
use crate::types::*;

// =============================================================================
// Merge and derivation
// =============================================================================

/// Remote-wins merge: each remote entry replaces the local one at its key.
///
/// Returns the number of entries written.
pub fn merge_remote(local: &mut JournalCache, remote: impl IntoIterator<Item = DayEntry>) -> usize {
    let mut merged = 0;
    for entry in remote {
        debug!(key = %entry.key(), "Merging remote entry");
        local.insert(entry.key(), entry);
        merged += 1;
    }
    merged
}

/// Derive lock/mood state for the past days of `month`.
///
/// For each slot strictly before `today`:
/// - no entry: create an empty `black` entry
/// - content and no mood: `yellow`
/// - no content and not `black`: `black`
///
/// Today and future slots are never touched. Returns the number of changed
/// slots; a second pass with the same inputs changes nothing.
pub fn derive_day_states(
    cache: &mut JournalCache,
    month: u32,
    today: CalendarDay,
    now: DateTime<Utc>,
) -> usize {
    let mut changed = 0;

    for day in 1..=GRID_DAYS {
        if DayStatus::classify(month, day, today) != DayStatus::Past {
            continue;
        }

        let key = DayKey::new(month, day);
        match cache.get_mut(&key) {
            None => {
                let mut entry = DayEntry::empty(key, now);
                entry.mood = Mood::Black;
                cache.insert(key, entry);
                changed += 1;
            }
            Some(entry) if entry.has_content() => {
                if !entry.mood.is_set() {
                    entry.mood = Mood::Yellow;
                    changed += 1;
                }
            }
            Some(entry) => {
                if entry.mood != Mood::Black {
                    entry.mood = Mood::Black;
                    changed += 1;
                }
            }
        }
    }

    changed
}

/// Write the snapshot on the blocking pool. Callers hold the state lock
/// across the await so writes land in cache order.
async fn persist(snapshot: &Arc<dyn SnapshotStore>, cache: &JournalCache) {
    let snapshot = Arc::clone(snapshot);
    let cache = cache.clone();
    match tokio::task::spawn_blocking(move || snapshot.save(&cache)).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => warn!(error = %e, "Failed to persist local snapshot"),
        Err(e) => warn!(error = %e, "Snapshot writer task failed"),
    }
}

// =============================================================================
// Results
// =============================================================================

/// Where the cache came from at start-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadSource {
    /// No credential: local snapshot only
    Local,
    /// Remote list merged over the snapshot
    Remote { merged: usize },
    /// Remote fetch failed: local snapshot only
    LocalFallback,
}

/// Result of a mutation call.
#[derive(Debug)]
pub enum MutationOutcome {
    /// The day was not editable (or there was nothing to change)
    Ignored,
    /// Local state updated; `sync` is set when a remote request was started
    Applied { sync: Option<SyncHandle> },
}

impl MutationOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, MutationOutcome::Applied { .. })
    }

    /// Wait for the remote sync, if one was started.
    pub async fn settle(self) -> Option<SyncOutcome> {
        match self {
            MutationOutcome::Applied { sync: Some(handle) } => Some(handle.wait().await),
            _ => None,
        }
    }
}

/// Result of a background remote sync.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The canonical record replaced the local entry at this key
    Reconciled(DayKey),
    /// The remote call failed; the optimistic local state was kept
    Failed(RemoteError),
}

/// Handle to an in-flight remote sync.
///
/// Dropping the handle does not cancel the sync.
#[derive(Debug)]
pub struct SyncHandle {
    key: DayKey,
    handle: JoinHandle<SyncOutcome>,
}

impl SyncHandle {
    pub fn key(&self) -> DayKey {
        self.key
    }

    pub async fn wait(self) -> SyncOutcome {
        self.handle
            .await
            .unwrap_or_else(|e| SyncOutcome::Failed(RemoteError::Transport(e.to_string())))
    }
}

/// Per-mood entry counts across all months.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MoodCounts {
    pub green: usize,
    pub red: usize,
    pub yellow: usize,
    pub black: usize,
}

impl MoodCounts {
    pub fn get(&self, mood: Mood) -> usize {
        match mood {
            Mood::Green => self.green,
            Mood::Red => self.red,
            Mood::Yellow => self.yellow,
            Mood::Black => self.black,
            Mood::None => 0,
        }
    }
}

/// One grid slot of the displayed month.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DaySlot {
    pub day: u32,
    pub status: DayStatus,
    pub mood: Mood,
    /// Past and black: shown as locked-empty
    pub locked: bool,
    pub editable: bool,
    /// Whether the day can be opened for viewing
    pub openable: bool,
    pub has_content: bool,
}

enum SyncRequest {
    Upload(UploadRequest),
    Remove(RemoveMediaRequest),
}

// =============================================================================
// Store
// =============================================================================

struct StoreState {
    cache: JournalCache,
    displayed_month: u32,
}

/// The authoritative client-side journal for one session.
#[derive(Clone)]
pub struct JournalStore {
    state: Arc<Mutex<StoreState>>,
    session: SessionContext,
    remote: Arc<dyn JournalRemote>,
    snapshot: Arc<dyn SnapshotStore>,
    clock: Arc<dyn Clock>,
}

impl JournalStore {
    /// Create an empty store showing the current month. Call
    /// [`initialize`](Self::initialize) before use.
    pub fn new(
        session: SessionContext,
        remote: Arc<dyn JournalRemote>,
        snapshot: Arc<dyn SnapshotStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let displayed_month = CalendarDay::from(clock.today()).month;
        Self {
            state: Arc::new(Mutex::new(StoreState {
                cache: JournalCache::new(),
                displayed_month,
            })),
            session,
            remote,
            snapshot,
            clock,
        }
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    // ==================== Initialization ====================

    /// Load the cache and run the first derivation pass.
    ///
    /// Without a credential the local snapshot is used. With one, the remote
    /// list is fetched once and merged over the snapshot; on failure the
    /// snapshot is used as-is.
    pub async fn initialize(&self) -> LoadSource {
        let local = self.snapshot.load();

        let source = match self.session.credential() {
            None => {
                self.state.lock().await.cache = local;
                LoadSource::Local
            }
            Some(credential) => match self.remote.fetch_days(credential).await {
                Ok(records) => {
                    let now = self.clock.now();
                    let fallback_month = CalendarDay::from(self.clock.today()).month;
                    let mut cache = local;
                    let merged = merge_remote(
                        &mut cache,
                        records
                            .into_iter()
                            .filter_map(|r| r.into_entry(fallback_month, now)),
                    );

                    let mut state = self.state.lock().await;
                    state.cache = cache;
                    persist(&self.snapshot, &state.cache).await;
                    LoadSource::Remote { merged }
                }
                Err(e) => {
                    warn!(error = %e, "Error loading days, falling back to local entries");
                    self.state.lock().await.cache = local;
                    LoadSource::LocalFallback
                }
            },
        };

        info!(?source, "Journal loaded");
        self.reconcile_past_days(self.clock.today()).await;
        source
    }

    // ==================== Day-state derivation ====================

    /// Run [`derive_day_states`] for the displayed month against `reference`.
    ///
    /// Persists the snapshot when anything changed. Returns the change count.
    pub async fn reconcile_past_days(&self, reference: NaiveDate) -> usize {
        let now = self.clock.now();
        let mut state = self.state.lock().await;
        let month = state.displayed_month;
        let changed = derive_day_states(&mut state.cache, month, CalendarDay::from(reference), now);

        if changed > 0 {
            debug!(month, changed, "Derived past day states");
            persist(&self.snapshot, &state.cache).await;
        }
        changed
    }

    // ==================== Month navigation ====================

    pub async fn displayed_month(&self) -> u32 {
        self.state.lock().await.displayed_month
    }

    /// Display `month` (0-11) and derive its past days.
    pub async fn show_month(&self, month: u32) -> Result<u32> {
        if month >= MONTHS {
            return Err(JournalError::InvalidMonth(month));
        }
        self.state.lock().await.displayed_month = month;
        self.reconcile_past_days(self.clock.today()).await;
        Ok(month)
    }

    pub async fn next_month(&self) -> u32 {
        let month = (self.displayed_month().await + 1) % MONTHS;
        self.show_month(month).await.unwrap_or(month)
    }

    pub async fn previous_month(&self) -> u32 {
        let month = (self.displayed_month().await + MONTHS - 1) % MONTHS;
        self.show_month(month).await.unwrap_or(month)
    }

    // ==================== Reads ====================

    pub async fn entry(&self, key: DayKey) -> Option<DayEntry> {
        self.state.lock().await.cache.get(&key).cloned()
    }

    pub async fn entries(&self) -> JournalCache {
        self.state.lock().await.cache.clone()
    }

    /// Whether `day` of the displayed month accepts mutations.
    pub async fn is_editable(&self, day: u32) -> bool {
        let state = self.state.lock().await;
        self.editable_key(&state, day).is_some()
    }

    /// Whether `day` of the displayed month can be opened: today always,
    /// past days only when an entry exists, future days never.
    pub async fn can_open(&self, day: u32) -> bool {
        let today = CalendarDay::from(self.clock.today());
        let state = self.state.lock().await;
        let key = DayKey::new(state.displayed_month, day);
        match DayStatus::classify(key.month, key.day, today) {
            DayStatus::Today => true,
            DayStatus::Past => state.cache.contains_key(&key),
            DayStatus::Future => false,
        }
    }

    pub async fn mood_counts(&self) -> MoodCounts {
        let state = self.state.lock().await;
        let mut counts = MoodCounts::default();
        for entry in state.cache.values() {
            match entry.mood {
                Mood::Green => counts.green += 1,
                Mood::Red => counts.red += 1,
                Mood::Yellow => counts.yellow += 1,
                Mood::Black => counts.black += 1,
                Mood::None => {}
            }
        }
        counts
    }

    /// The 30 slots of the displayed month, optionally only those with `filter` mood.
    pub async fn month_view(&self, filter: Option<Mood>) -> Vec<DaySlot> {
        let today = CalendarDay::from(self.clock.today());
        let state = self.state.lock().await;
        let month = state.displayed_month;

        (1..=GRID_DAYS)
            .filter_map(|day| {
                let entry = state.cache.get(&DayKey::new(month, day));
                let mood = entry.map(|e| e.mood).unwrap_or_default();
                if filter.is_some_and(|f| f != mood) {
                    return None;
                }

                let status = DayStatus::classify(month, day, today);
                Some(DaySlot {
                    day,
                    status,
                    mood,
                    locked: status == DayStatus::Past && mood == Mood::Black,
                    editable: status == DayStatus::Today,
                    openable: match status {
                        DayStatus::Today => true,
                        DayStatus::Past => entry.is_some(),
                        DayStatus::Future => false,
                    },
                    has_content: entry.is_some_and(DayEntry::has_content),
                })
            })
            .collect()
    }

    // ==================== Mutations ====================

    /// Replace the text of `day`.
    pub async fn set_text(&self, day: u32, text: impl Into<String>) -> MutationOutcome {
        let text = text.into();
        let mut state = self.state.lock().await;
        let Some(key) = self.editable_key(&state, day) else {
            return self.ignored(day);
        };

        let entry = self.edit(&mut state, key, move |entry| entry.text = text).await;
        let request = UploadRequest {
            text: Some(entry.text),
            mood: None,
            month: key.month,
            files: Vec::new(),
        };
        drop(state);

        self.applied(key, SyncRequest::Upload(request))
    }

    /// Set the mood of `day`.
    pub async fn set_mood(&self, day: u32, mood: Mood) -> MutationOutcome {
        let mut state = self.state.lock().await;
        let Some(key) = self.editable_key(&state, day) else {
            return self.ignored(day);
        };

        self.edit(&mut state, key, |entry| entry.mood = mood).await;
        let request = UploadRequest {
            text: None,
            mood: Some(mood),
            month: key.month,
            files: Vec::new(),
        };
        drop(state);

        self.applied(key, SyncRequest::Upload(request))
    }

    /// Attach a file to `day`.
    ///
    /// The local entry gets a `data:` URL preview until the remote returns
    /// the hosted URL. The file is uploaded together with the current text.
    pub async fn attach_media(&self, day: u32, upload: MediaUpload) -> MutationOutcome {
        let mut state = self.state.lock().await;
        let Some(key) = self.editable_key(&state, day) else {
            return self.ignored(day);
        };

        let preview = AttachmentRecord::from_url(data_url(&upload))
            .with_type_hint(upload.content_type.clone());
        let entry = self.edit(&mut state, key, |entry| {
            let mut attachments = entry.attachments.clone();
            attachments.push(preview);
            entry.set_attachments(attachments);
        })
        .await;
        let request = UploadRequest {
            text: Some(entry.text),
            mood: None,
            month: key.month,
            files: vec![upload],
        };
        drop(state);

        self.applied(key, SyncRequest::Upload(request))
    }

    /// Remove the attachment currently resolved for `kind` on `day`.
    ///
    /// Every attachment whose URL equals the resolved URL is removed, along
    /// with any attachment sharing one of their public ids.
    pub async fn remove_media(&self, day: u32, kind: MediaKind) -> MutationOutcome {
        let mut state = self.state.lock().await;
        let Some(key) = self.editable_key(&state, day) else {
            return self.ignored(day);
        };

        let Some(current) = state.cache.get(&key) else {
            return MutationOutcome::Ignored;
        };
        let target = current.resolved.get(kind).to_string();
        if target.is_empty() {
            debug!(%key, %kind, "Nothing resolved to remove");
            return MutationOutcome::Ignored;
        }

        let mut removed_urls = Vec::new();
        let mut remove_public_ids = Vec::new();
        for attachment in current.attachments.iter().filter(|a| a.url == target) {
            removed_urls.push(attachment.url.clone());
            if let Some(id) = &attachment.public_id {
                remove_public_ids.push(id.clone());
            }
        }

        self.edit(&mut state, key, |entry| {
            let remaining = entry
                .attachments
                .iter()
                .filter(|a| {
                    !removed_urls.contains(&a.url)
                        && !a
                            .public_id
                            .as_ref()
                            .is_some_and(|id| remove_public_ids.contains(id))
                })
                .cloned()
                .collect();
            entry.set_attachments(remaining);
        })
        .await;
        drop(state);

        // Local previews never reached the server
        let remove_urls = removed_urls
            .into_iter()
            .filter(|url| !url.starts_with("data:"))
            .collect();
        let request = RemoveMediaRequest {
            month: key.month,
            remove_urls,
            remove_public_ids,
        };
        self.applied(key, SyncRequest::Remove(request))
    }

    // ==================== Internals ====================

    /// Key of `day` if it is today's slot in the displayed month.
    fn editable_key(&self, state: &StoreState, day: u32) -> Option<DayKey> {
        let today = CalendarDay::from(self.clock.today());
        let on_grid = (1..=GRID_DAYS).contains(&day);
        (on_grid && state.displayed_month == today.month && day == today.day)
            .then(|| DayKey::new(today.month, day))
    }

    fn ignored(&self, day: u32) -> MutationOutcome {
        debug!(day, "Ignoring mutation on a read-only day");
        MutationOutcome::Ignored
    }

    /// Apply `edit` to the entry at `key` (created if absent), stamp it,
    /// write it to the cache and persist. Returns the new entry.
    async fn edit(
        &self,
        state: &mut StoreState,
        key: DayKey,
        edit: impl FnOnce(&mut DayEntry),
    ) -> DayEntry {
        let now = self.clock.now();
        let mut entry = state
            .cache
            .get(&key)
            .cloned()
            .unwrap_or_else(|| DayEntry::empty(key, now));
        edit(&mut entry);
        entry.last_updated = now;

        state.cache.insert(key, entry.clone());
        persist(&self.snapshot, &state.cache).await;
        entry
    }

    fn applied(&self, key: DayKey, request: SyncRequest) -> MutationOutcome {
        let sync = self
            .session
            .credential()
            .cloned()
            .map(|credential| self.spawn_sync(credential, key, request));
        MutationOutcome::Applied { sync }
    }

    fn spawn_sync(&self, credential: Credential, key: DayKey, request: SyncRequest) -> SyncHandle {
        let remote = Arc::clone(&self.remote);
        let state = Arc::clone(&self.state);
        let snapshot = Arc::clone(&self.snapshot);
        let clock = Arc::clone(&self.clock);

        let handle = tokio::spawn(async move {
            let result = match request {
                SyncRequest::Upload(body) => remote.upload_day(&credential, key.day, body).await,
                SyncRequest::Remove(body) => remote.remove_media(&credential, key.day, body).await,
            };

            let record = match result {
                Ok(record) => record,
                Err(e) => {
                    warn!(%key, error = %e, "Remote sync failed, keeping local state");
                    return SyncOutcome::Failed(e);
                }
            };

            let Some(entry) = record.into_entry(key.month, clock.now()) else {
                warn!(%key, "Remote returned a record outside the grid");
                return SyncOutcome::Failed(RemoteError::Decode(
                    "canonical record has no valid day".to_string(),
                ));
            };

            let reconciled = entry.key();
            let mut state = state.lock().await;
            merge_remote(&mut state.cache, [entry]);
            persist(&snapshot, &state.cache).await;
            SyncOutcome::Reconciled(reconciled)
        });

        SyncHandle { key, handle }
    }
}

/// `data:` URL carrying the upload, used as the local preview.
fn data_url(upload: &MediaUpload) -> String {
    format!(
        "data:{};base64,{}",
        upload.content_type,
        base64::engine::general_purpose::STANDARD.encode(&upload.bytes)
    )
}
