//! Journal domain types
//!
//! A journal is a fixed grid of 12 months by 30 day slots. Each slot holds at
//! most one [`DayEntry`], keyed by [`DayKey`].

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::resolver;

/// Number of day slots rendered per month, whatever the real month length.
pub const GRID_DAYS: u32 = 30;

/// Number of months in the journal.
pub const MONTHS: u32 = 12;

/// Month names indexed by zero-based month.
pub const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// The client-side cache of all day entries for a session.
pub type JournalCache = BTreeMap<DayKey, DayEntry>;

// =============================================================================
// Media
// =============================================================================

/// Kind of media an attachment carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
    Audio,
    Unknown,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Video => "video",
            MediaKind::Audio => "audio",
            MediaKind::Unknown => "unknown",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MediaKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "image" => Ok(MediaKind::Image),
            "video" => Ok(MediaKind::Video),
            "audio" => Ok(MediaKind::Audio),
            other => Err(format!("unknown media kind: {}", other)),
        }
    }
}

/// One attachment as reported by the backend.
///
/// Identity for removal is the `(url, public_id)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentRecord {
    pub url: String,
    /// Backend-supplied type hint (e.g. "image", "video/mp4", "raw")
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub type_hint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_id: Option<String>,
}

impl AttachmentRecord {
    /// Attachment with no type hint or public id.
    pub fn from_url(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            type_hint: None,
            public_id: None,
        }
    }

    pub fn with_type_hint(mut self, hint: impl Into<String>) -> Self {
        self.type_hint = Some(hint.into());
        self
    }

    pub fn with_public_id(mut self, id: impl Into<String>) -> Self {
        self.public_id = Some(id.into());
        self
    }
}

/// One representative URL per media kind; empty string when unresolved.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedMedia {
    pub image: String,
    pub video: String,
    pub audio: String,
}

impl ResolvedMedia {
    /// Resolved URL for a kind. `Unknown` never has a slot of its own.
    pub fn get(&self, kind: MediaKind) -> &str {
        match kind {
            MediaKind::Image => &self.image,
            MediaKind::Video => &self.video,
            MediaKind::Audio => &self.audio,
            MediaKind::Unknown => "",
        }
    }

    pub fn is_empty(&self) -> bool {
        self.image.is_empty() && self.video.is_empty() && self.audio.is_empty()
    }
}

// =============================================================================
// Mood
// =============================================================================

/// Mood tag of a day.
///
/// `Black` marks a past day without content (auto-locked), `Yellow` a past
/// day with content but no mood picked.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Mood {
    #[default]
    None,
    Green,
    Red,
    Yellow,
    Black,
}

impl Mood {
    /// Moods a user can pick, in palette order.
    pub const PALETTE: [Mood; 4] = [Mood::Green, Mood::Red, Mood::Yellow, Mood::Black];

    /// Lenient parse: anything unrecognised is `None`.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "green" => Mood::Green,
            "red" => Mood::Red,
            "yellow" => Mood::Yellow,
            "black" => Mood::Black,
            _ => Mood::None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Mood::None => "",
            Mood::Green => "green",
            Mood::Red => "red",
            Mood::Yellow => "yellow",
            Mood::Black => "black",
        }
    }

    pub fn is_set(&self) -> bool {
        !matches!(self, Mood::None)
    }
}

impl From<String> for Mood {
    fn from(s: String) -> Self {
        Mood::parse(&s)
    }
}

impl From<Mood> for String {
    fn from(mood: Mood) -> Self {
        mood.as_str().to_string()
    }
}

impl fmt::Display for Mood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Keys and calendar positions
// =============================================================================

/// Cache key of a day slot: zero-based month and 1-based day number.
///
/// Serialized as `"<month>-<dayNumber>"`, the snapshot's map key format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DayKey {
    pub month: u32,
    pub day: u32,
}

impl DayKey {
    pub fn new(month: u32, day: u32) -> Self {
        Self { month, day }
    }
}

impl fmt::Display for DayKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.month, self.day)
    }
}

impl FromStr for DayKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (month, day) = s
            .split_once('-')
            .ok_or_else(|| format!("invalid day key: {}", s))?;
        let month = month
            .parse()
            .map_err(|_| format!("invalid month in day key: {}", s))?;
        let day = day
            .parse()
            .map_err(|_| format!("invalid day in day key: {}", s))?;
        Ok(Self { month, day })
    }
}

impl Serialize for DayKey {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for DayKey {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// A real-world calendar position (month/day only, the year is not tracked).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct CalendarDay {
    pub month: u32,
    pub day: u32,
}

impl From<NaiveDate> for CalendarDay {
    fn from(date: NaiveDate) -> Self {
        Self {
            month: date.month0(),
            day: date.day(),
        }
    }
}

/// Where a slot sits relative to today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DayStatus {
    Past,
    Today,
    Future,
}

impl DayStatus {
    /// Classify `(month, day)` against `today`, lexicographically.
    pub fn classify(month: u32, day: u32, today: CalendarDay) -> Self {
        match (month, day).cmp(&(today.month, today.day)) {
            std::cmp::Ordering::Less => DayStatus::Past,
            std::cmp::Ordering::Equal => DayStatus::Today,
            std::cmp::Ordering::Greater => DayStatus::Future,
        }
    }
}

// =============================================================================
// Day entry
// =============================================================================

/// One calendar day's journal content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayEntry {
    pub month: u32,
    pub day_number: u32,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub mood: Mood,
    /// Attachments in server order
    #[serde(default)]
    pub attachments: Vec<AttachmentRecord>,
    /// Derived from `attachments`; recomputed whenever they change
    #[serde(default)]
    pub resolved: ResolvedMedia,
    pub last_updated: DateTime<Utc>,
}

impl DayEntry {
    /// Empty entry for a slot.
    pub fn empty(key: DayKey, now: DateTime<Utc>) -> Self {
        Self {
            month: key.month,
            day_number: key.day,
            text: String::new(),
            mood: Mood::None,
            attachments: Vec::new(),
            resolved: ResolvedMedia::default(),
            last_updated: now,
        }
    }

    pub fn key(&self) -> DayKey {
        DayKey::new(self.month, self.day_number)
    }

    /// Replace the attachment list and re-derive the resolved URLs.
    pub fn with_attachments(mut self, attachments: Vec<AttachmentRecord>) -> Self {
        self.set_attachments(attachments);
        self
    }

    pub fn set_attachments(&mut self, attachments: Vec<AttachmentRecord>) {
        self.resolved = resolver::resolve(&attachments);
        self.attachments = attachments;
    }

    /// Non-empty trimmed text or any resolved media URL.
    pub fn has_content(&self) -> bool {
        !self.text.trim().is_empty() || !self.resolved.is_empty()
    }
}
