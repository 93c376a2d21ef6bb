//! Daybook Core - Day Journal Store
//!
//! Client-side core of a day journal: a fixed grid of 12 months by 30 days,
//! one entry per day with text, a mood tag and media attachments.
//!
//! - Media resolution: one representative image/video/audio URL per entry
//! - Local-first store: optimistic mutations, background remote sync,
//!   remote-wins reconciliation
//! - Past-day derivation: empty past days lock (`black`), past days with
//!   content but no mood turn `yellow`
//! - Explicit session context and signup/login flows
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────┐
//! │              JournalStore                │
//! │  cache + displayed month + derivation    │
//! └──────┬──────────────┬─────────────┬──────┘
//!        ▼              ▼             ▼
//! ┌─────────────┐ ┌─────────────┐ ┌────────┐
//! │JournalRemote│ │SnapshotStore│ │ Clock  │
//! │ (HTTP/mock) │ │ (file/mem)  │ │        │
//! └─────────────┘ └─────────────┘ └────────┘
//! ```

pub mod auth;
pub mod clock;
pub mod error;
pub mod remote;
pub mod resolver;
pub mod rollover;
pub mod session;
pub mod snapshot;
pub mod store;
pub mod types;

#[cfg(any(test, feature = "test-support"))]
pub mod mock;

// Re-export main types for convenience
pub use auth::{log_in, sign_up, AuthError, LoginForm, SignupForm};
pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{JournalError, Result};
pub use remote::{
    AuthRemote, AuthRequest, AuthResponse, AuthUser, JournalRemote, MediaUpload, RemoteDayRecord,
    RemoteError, RemoteMedia, RemoveMediaRequest, UploadRequest,
};
pub use rollover::DayRolloverWatcher;
pub use session::{Credential, SessionContext};
pub use snapshot::{FileSnapshotStore, MemorySnapshotStore, SnapshotStore};
pub use store::{
    derive_day_states, merge_remote, DaySlot, JournalStore, LoadSource, MoodCounts,
    MutationOutcome, SyncHandle, SyncOutcome,
};
pub use types::*;
