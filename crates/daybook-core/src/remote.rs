//! Remote collaborator traits and wire types
//!
//! The journal backend is reached through [`JournalRemote`] (day entries) and
//! [`AuthRemote`] (signup/login). `daybook-client` provides the HTTP
//! implementation; tests use [`crate::mock::MockRemote`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::session::Credential;
use crate::types::{AttachmentRecord, DayEntry, Mood, MONTHS};

/// Errors reported by a remote collaborator.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RemoteError {
    /// Non-success HTTP status, with the server's error text if any
    #[error("Remote returned {status}: {message}")]
    Status { status: u16, message: String },

    /// Request never completed
    #[error("Transport error: {0}")]
    Transport(String),

    /// Response body could not be understood
    #[error("Decode error: {0}")]
    Decode(String),
}

// =============================================================================
// Day records
// =============================================================================

/// Attachment as sent by the backend; the media host may use `secure_url`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RemoteMedia {
    #[serde(default, deserialize_with = "lenient")]
    pub url: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub secure_url: Option<String>,
    #[serde(rename = "type", default, deserialize_with = "lenient")]
    pub media_type: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub public_id: Option<String>,
}

impl RemoteMedia {
    fn into_attachment(self) -> AttachmentRecord {
        let url = self
            .url
            .filter(|u| !u.is_empty())
            .or(self.secure_url)
            .unwrap_or_default();
        AttachmentRecord {
            url,
            type_hint: self.media_type,
            public_id: self.public_id,
        }
    }
}

/// Canonical day record returned by `GET /days` and the upload endpoints.
///
/// Every field is lenient: a value of the wrong type reads as missing, and
/// `month`/`dayNumber` also accept numeric strings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteDayRecord {
    #[serde(default, deserialize_with = "lenient_number")]
    pub month: Option<u32>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub day_number: Option<u32>,
    #[serde(default, deserialize_with = "lenient")]
    pub text: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub mood: Option<String>,
    #[serde(default, deserialize_with = "lenient_media")]
    pub media: Vec<RemoteMedia>,
    #[serde(default, deserialize_with = "lenient")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient")]
    pub created_at: Option<DateTime<Utc>>,
}

fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

fn lenient_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u32>, D::Error> {
    let number = match Value::deserialize(deserializer)? {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0 && *f >= 0.0).map(|f| f as u64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    Ok(number.and_then(|n| u32::try_from(n).ok()))
}

/// `null` or a non-array reads as no media; unreadable items are skipped.
fn lenient_media<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<RemoteMedia>, D::Error> {
    let Value::Array(items) = Value::deserialize(deserializer)? else {
        return Ok(Vec::new());
    };
    Ok(items
        .into_iter()
        .filter_map(|item| serde_json::from_value(item).ok())
        .collect())
}

impl RemoteDayRecord {
    /// Build a [`DayEntry`], resolving its media.
    ///
    /// A missing month falls back to `fallback_month`. Records with no day
    /// number (or zero) or an out-of-range month are dropped.
    pub fn into_entry(self, fallback_month: u32, now: DateTime<Utc>) -> Option<DayEntry> {
        let month = self.month.unwrap_or(fallback_month);
        let day_number = self.day_number.unwrap_or(0);
        if day_number == 0 || month >= MONTHS {
            debug!(month, day_number, "Dropping remote record outside the grid");
            return None;
        }

        let attachments = self
            .media
            .into_iter()
            .map(RemoteMedia::into_attachment)
            .collect();

        let entry = DayEntry {
            month,
            day_number,
            text: self.text.unwrap_or_default(),
            mood: self.mood.as_deref().map(Mood::parse).unwrap_or_default(),
            attachments: Vec::new(),
            resolved: Default::default(),
            last_updated: self.updated_at.or(self.created_at).unwrap_or(now),
        };
        Some(entry.with_attachments(attachments))
    }
}

// =============================================================================
// Requests
// =============================================================================

/// A file to upload with a day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaUpload {
    pub file_name: String,
    /// MIME type, e.g. `image/png`
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Body of `POST /upload/:dayNumber` (sent as multipart form).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadRequest {
    pub text: Option<String>,
    pub mood: Option<Mood>,
    pub month: u32,
    pub files: Vec<MediaUpload>,
}

/// Body of `PATCH /upload/:dayNumber`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveMediaRequest {
    pub month: u32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub remove_urls: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub remove_public_ids: Vec<String>,
}

/// Body of `POST /signup` and `POST /login`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AuthUser {
    pub username: String,
}

/// Successful signup/login response.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: AuthUser,
}

// =============================================================================
// Traits
// =============================================================================

/// Remote persistence for day entries.
#[async_trait]
pub trait JournalRemote: Send + Sync {
    /// Fetch every day record of the authenticated user.
    async fn fetch_days(&self, credential: &Credential) -> Result<Vec<RemoteDayRecord>, RemoteError>;

    /// Save text/mood and upload files for a day; returns the canonical record.
    async fn upload_day(
        &self,
        credential: &Credential,
        day_number: u32,
        request: UploadRequest,
    ) -> Result<RemoteDayRecord, RemoteError>;

    /// Remove attachments from a day; returns the canonical record.
    async fn remove_media(
        &self,
        credential: &Credential,
        day_number: u32,
        request: RemoveMediaRequest,
    ) -> Result<RemoteDayRecord, RemoteError>;
}

/// Remote account endpoints.
#[async_trait]
pub trait AuthRemote: Send + Sync {
    async fn signup(&self, request: AuthRequest) -> Result<AuthResponse, RemoteError>;

    async fn login(&self, request: AuthRequest) -> Result<AuthResponse, RemoteError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_deserialization() {
        let json = r#"{
            "month": 3,
            "dayNumber": 5,
            "text": "final",
            "mood": "green",
            "media": [
                {"url": "https://cdn/a.jpg", "type": "image", "public_id": "d/a"},
                {"secure_url": "https://cdn/b.mp4"}
            ],
            "updatedAt": "2025-04-05T10:00:00Z",
            "createdAt": "2025-04-05T09:00:00Z"
        }"#;

        let record: RemoteDayRecord = serde_json::from_str(json).unwrap();
        let entry = record.into_entry(0, Utc::now()).unwrap();

        assert_eq!(entry.key().to_string(), "3-5");
        assert_eq!(entry.text, "final");
        assert_eq!(entry.mood, Mood::Green);
        assert_eq!(entry.resolved.image, "https://cdn/a.jpg");
        assert_eq!(entry.resolved.video, "https://cdn/b.mp4");
        assert_eq!(entry.last_updated.to_rfc3339(), "2025-04-05T10:00:00+00:00");
    }

    #[test]
    fn test_record_without_day_is_dropped() {
        let record: RemoteDayRecord = serde_json::from_str(r#"{"month": 1}"#).unwrap();
        assert!(record.into_entry(0, Utc::now()).is_none());

        let record: RemoteDayRecord =
            serde_json::from_str(r#"{"month": 12, "dayNumber": 1}"#).unwrap();
        assert!(record.into_entry(0, Utc::now()).is_none());
    }

    #[test]
    fn test_record_missing_month_uses_fallback() {
        let record: RemoteDayRecord =
            serde_json::from_str(r#"{"dayNumber": 7, "mood": null}"#).unwrap();
        let entry = record.into_entry(9, Utc::now()).unwrap();
        assert_eq!(entry.month, 9);
        assert_eq!(entry.mood, Mood::None);
    }

    #[test]
    fn test_remove_request_omits_empty_lists() {
        let request = RemoveMediaRequest {
            month: 2,
            remove_urls: vec!["a.jpg".to_string()],
            remove_public_ids: vec![],
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json, serde_json::json!({"month": 2, "removeUrls": ["a.jpg"]}));
    }

    #[test]
    fn test_null_media_and_mood_read_as_empty() {
        let records: Vec<RemoteDayRecord> =
            serde_json::from_str(r#"[{"month":3,"dayNumber":5,"mood":null,"media":null}]"#).unwrap();
        let entry = records[0].clone().into_entry(0, Utc::now()).unwrap();

        assert_eq!(entry.key().to_string(), "3-5");
        assert!(entry.attachments.is_empty());
        assert_eq!(entry.mood, Mood::None);
    }

    #[test]
    fn test_numeric_strings_are_accepted() {
        let records: Vec<RemoteDayRecord> =
            serde_json::from_str(r#"[{"month":"3","dayNumber":"5"},{"month":3,"dayNumber":6}]"#)
                .unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].month, Some(3));
        assert_eq!(records[0].day_number, Some(5));
        assert_eq!(records[1].day_number, Some(6));
    }

    #[test]
    fn test_wrong_types_read_as_missing() {
        let record: RemoteDayRecord = serde_json::from_str(
            r#"{"month":"june","dayNumber":7,"text":42,"updatedAt":"yesterday","media":[{"url":1},"junk",{"url":"a.mp3"}]}"#,
        )
        .unwrap();
        let now = Utc::now();
        let entry = record.into_entry(4, now).unwrap();

        // Non-numeric month falls back to the current month
        assert_eq!(entry.month, 4);
        assert_eq!(entry.text, "");
        assert_eq!(entry.last_updated, now);
        assert_eq!(entry.resolved.audio, "a.mp3");
    }

    #[test]
    fn test_empty_url_falls_back_to_secure_url() {
        let record: RemoteDayRecord = serde_json::from_str(
            r#"{"month":3,"dayNumber":5,"media":[{"url":"","secure_url":"https://cdn/a.jpg"}]}"#,
        )
        .unwrap();
        let entry = record.into_entry(0, Utc::now()).unwrap();
        assert_eq!(entry.attachments[0].url, "https://cdn/a.jpg");
        assert_eq!(entry.resolved.image, "https://cdn/a.jpg");
    }
}
