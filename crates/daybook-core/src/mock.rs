//! In-memory remote for testing.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use crate::remote::*;
use crate::session::Credential;
use crate::types::{DayKey, Mood};

/// A call received by [`MockRemote`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedCall {
    FetchDays,
    Upload { day_number: u32, request: UploadRequest },
    Remove { day_number: u32, request: RemoveMediaRequest },
    Signup(AuthRequest),
    Login(AuthRequest),
}

/// Mock backend holding day records in memory.
///
/// Uploads merge into the stored record the way the real backend does and
/// return it; uploaded files get `https://media.test/<name>` URLs.
pub struct MockRemote {
    records: Mutex<BTreeMap<DayKey, RemoteDayRecord>>,
    calls: Mutex<Vec<RecordedCall>>,
    available: AtomicBool,
    delay: Mutex<Option<Duration>>,
    text_delays: Mutex<BTreeMap<String, Duration>>,
    auth_error: Mutex<Option<RemoteError>>,
}

impl MockRemote {
    pub fn new() -> Self {
        Self {
            records: Mutex::new(BTreeMap::new()),
            calls: Mutex::new(Vec::new()),
            available: AtomicBool::new(true),
            delay: Mutex::new(None),
            text_delays: Mutex::new(BTreeMap::new()),
            auth_error: Mutex::new(None),
        }
    }

    /// Seed a record served by `fetch_days`.
    pub fn with_record(self, record: RemoteDayRecord) -> Self {
        if let (Some(month), Some(day)) = (record.month, record.day_number) {
            if let Ok(mut records) = self.records.lock() {
                records.insert(DayKey::new(month, day), record);
            }
        }
        self
    }

    /// Make every call fail with a transport error.
    pub fn with_available(self, available: bool) -> Self {
        self.available.store(available, Ordering::SeqCst);
        self
    }

    /// Delay every day-entry response.
    pub fn with_delay(self, delay: Duration) -> Self {
        if let Ok(mut guard) = self.delay.lock() {
            *guard = Some(delay);
        }
        self
    }

    /// Hold back the response to an upload carrying `text`, on top of any
    /// global delay. Lets tests reorder responses deterministically.
    pub fn with_delay_for_text(self, text: &str, delay: Duration) -> Self {
        if let Ok(mut delays) = self.text_delays.lock() {
            delays.insert(text.to_string(), delay);
        }
        self
    }

    /// Make signup/login fail with `error`.
    pub fn with_auth_error(self, error: RemoteError) -> Self {
        if let Ok(mut guard) = self.auth_error.lock() {
            *guard = Some(error);
        }
        self
    }

    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn record(&self, key: DayKey) -> Option<RemoteDayRecord> {
        self.records.lock().ok().and_then(|r| r.get(&key).cloned())
    }

    fn push(&self, call: RecordedCall) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
    }

    async fn gate(&self) -> Result<(), RemoteError> {
        let delay = self.delay.lock().ok().and_then(|d| *d);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(RemoteError::Transport("mock remote unavailable".to_string()))
        }
    }

    fn auth(&self, request: &AuthRequest) -> Result<AuthResponse, RemoteError> {
        if let Some(error) = self.auth_error.lock().ok().and_then(|e| e.clone()) {
            return Err(error);
        }
        Ok(AuthResponse {
            token: format!("token-{}", request.username),
            user: AuthUser {
                username: request.username.clone(),
            },
        })
    }
}

impl Default for MockRemote {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl JournalRemote for MockRemote {
    async fn fetch_days(&self, _credential: &Credential) -> Result<Vec<RemoteDayRecord>, RemoteError> {
        self.push(RecordedCall::FetchDays);
        self.gate().await?;
        Ok(self
            .records
            .lock()
            .map(|r| r.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn upload_day(
        &self,
        _credential: &Credential,
        day_number: u32,
        request: UploadRequest,
    ) -> Result<RemoteDayRecord, RemoteError> {
        self.push(RecordedCall::Upload {
            day_number,
            request: request.clone(),
        });
        let held = request.text.as_ref().and_then(|text| {
            self.text_delays
                .lock()
                .ok()
                .and_then(|delays| delays.get(text).copied())
        });
        if let Some(held) = held {
            tokio::time::sleep(held).await;
        }
        self.gate().await?;

        let key = DayKey::new(request.month, day_number);
        let mut records = self
            .records
            .lock()
            .map_err(|_| RemoteError::Transport("mock state poisoned".to_string()))?;
        let record = records.entry(key).or_insert_with(|| RemoteDayRecord {
            month: Some(request.month),
            day_number: Some(day_number),
            ..Default::default()
        });

        if let Some(text) = request.text {
            record.text = Some(text);
        }
        if let Some(mood) = request.mood {
            record.mood = Some(Mood::as_str(&mood).to_string());
        }
        for file in request.files {
            record.media.push(RemoteMedia {
                url: Some(format!("https://media.test/{}", file.file_name)),
                secure_url: None,
                media_type: Some(file.content_type),
                public_id: Some(format!("daybook/{}", file.file_name)),
            });
        }
        Ok(record.clone())
    }

    async fn remove_media(
        &self,
        _credential: &Credential,
        day_number: u32,
        request: RemoveMediaRequest,
    ) -> Result<RemoteDayRecord, RemoteError> {
        self.push(RecordedCall::Remove {
            day_number,
            request: request.clone(),
        });
        self.gate().await?;

        let key = DayKey::new(request.month, day_number);
        let mut records = self
            .records
            .lock()
            .map_err(|_| RemoteError::Transport("mock state poisoned".to_string()))?;
        let record = records.get_mut(&key).ok_or(RemoteError::Status {
            status: 404,
            message: "Day not found".to_string(),
        })?;

        record.media.retain(|m| {
            let url_hit = m
                .url
                .as_ref()
                .is_some_and(|u| request.remove_urls.contains(u));
            let id_hit = m
                .public_id
                .as_ref()
                .is_some_and(|id| request.remove_public_ids.contains(id));
            !url_hit && !id_hit
        });
        Ok(record.clone())
    }
}

#[async_trait]
impl AuthRemote for MockRemote {
    async fn signup(&self, request: AuthRequest) -> Result<AuthResponse, RemoteError> {
        self.push(RecordedCall::Signup(request.clone()));
        self.auth(&request)
    }

    async fn login(&self, request: AuthRequest) -> Result<AuthResponse, RemoteError> {
        self.push(RecordedCall::Login(request.clone()));
        self.auth(&request)
    }
}
