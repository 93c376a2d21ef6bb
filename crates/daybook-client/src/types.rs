//! Client configuration and response envelopes

use daybook_core::RemoteDayRecord;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Connection settings for the journal backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL, e.g. `http://localhost:5000`
    pub base_url: String,
    /// Request timeout in seconds (default: 30)
    pub timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            timeout_secs: 30,
        }
    }
}

/// `GET /days` body. Records are decoded one by one so a bad record
/// cannot fail the whole list.
#[derive(Debug, Deserialize)]
pub(crate) struct DaysResponse {
    #[serde(default)]
    pub list: Option<Vec<serde_json::Value>>,
}

impl DaysResponse {
    pub fn into_records(self) -> Vec<RemoteDayRecord> {
        self.list
            .unwrap_or_default()
            .into_iter()
            .filter_map(|item| match serde_json::from_value(item) {
                Ok(record) => Some(record),
                Err(e) => {
                    warn!(error = %e, "Skipping unreadable day record");
                    None
                }
            })
            .collect()
    }
}

/// Body of both upload endpoints.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct DayEntryResponse {
    #[serde(default)]
    pub day_entry: Option<RemoteDayRecord>,
}

/// Non-2xx body.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub error: Option<String>,
}
