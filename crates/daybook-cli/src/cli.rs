//! Journal commands
//!
//! Each command opens the store against the configured backend, runs, and
//! returns the text to print. Mutations target today's slot and wait for the
//! remote reconciliation so it lands in the snapshot before exit.

use anyhow::{anyhow, bail};
use chrono::Datelike;
use clap::Subcommand;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::info;

use daybook_client::DaybookClient;
use daybook_core::{
    log_in, sign_up, DayEntry, DayKey, DayRolloverWatcher, DaySlot, DayStatus,
    FileSnapshotStore, JournalStore, LoadSource, LoginForm, MediaKind, MediaUpload, Mood,
    MutationOutcome, SessionContext, SignupForm, SyncOutcome, SystemClock, MONTH_NAMES,
};

use crate::config::Config;

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Create an account and log in
    Signup {
        #[arg(short, long)]
        username: String,
        #[arg(short, long, env = "DAYBOOK_PASSWORD")]
        password: String,
        /// Password again
        #[arg(short, long)]
        confirm: String,
    },

    /// Log in with an existing account
    Login {
        #[arg(short, long)]
        username: String,
        #[arg(short, long, env = "DAYBOOK_PASSWORD")]
        password: String,
    },

    /// Forget the saved session
    Logout,

    /// Load entries from the backend into the local snapshot
    Sync,

    /// Show the day grid of a month
    Month {
        /// Month number, 1-12 (default: current month)
        #[arg(short, long)]
        month: Option<u32>,
        /// Only show days with this mood
        #[arg(short, long)]
        filter: Option<String>,
    },

    /// Show one day
    Show {
        /// Day of month (default: today)
        #[arg(short, long)]
        day: Option<u32>,
        /// Month number, 1-12 (default: current month)
        #[arg(short, long)]
        month: Option<u32>,
    },

    /// Set today's text
    Write { text: String },

    /// Set today's mood (green, red, yellow, black)
    Mood { mood: String },

    /// Attach a file to today
    Attach { file: PathBuf },

    /// Remove today's image, video or audio
    Remove { kind: MediaKind },

    /// Keep running and lock past days as the date changes
    Watch,
}

/// Shared state for command execution
pub struct Context {
    pub config: Config,
    pub client: Arc<DaybookClient>,
}

impl Context {
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let client = DaybookClient::new(config.server.client_config())?;
        Ok(Self {
            config,
            client: Arc::new(client),
        })
    }

    async fn open_store(&self) -> anyhow::Result<(JournalStore, LoadSource)> {
        let session = SessionContext::load(&self.config.storage.session_path())?;
        let store = JournalStore::new(
            session,
            self.client.clone(),
            Arc::new(FileSnapshotStore::new(self.config.storage.snapshot_path())),
            Arc::new(SystemClock),
        );
        let source = store.initialize().await;
        Ok((store, source))
    }
}

/// Execute a command and return its output
pub async fn execute_command(ctx: &Context, cmd: Commands) -> anyhow::Result<String> {
    match cmd {
        Commands::Signup {
            username,
            password,
            confirm,
        } => {
            let form = SignupForm {
                username,
                password,
                confirm,
            };
            let credential = sign_up(ctx.client.as_ref(), &form).await?;
            SessionContext::authenticated(credential.clone())
                .persist(&ctx.config.storage.session_path())?;
            Ok(format!("Signed up as {}", credential.username))
        }

        Commands::Login { username, password } => {
            let form = LoginForm { username, password };
            let credential = log_in(ctx.client.as_ref(), &form).await?;
            SessionContext::authenticated(credential.clone())
                .persist(&ctx.config.storage.session_path())?;
            Ok(format!("Logged in as {}", credential.username))
        }

        Commands::Logout => {
            SessionContext::clear(&ctx.config.storage.session_path())?;
            Ok("Logged out".to_string())
        }

        Commands::Sync => {
            let (store, source) = ctx.open_store().await?;
            let counts = store.mood_counts().await;
            let summary = match source {
                LoadSource::Local => "Not logged in, using local entries".to_string(),
                LoadSource::Remote { merged } => format!("Merged {} entries from the server", merged),
                LoadSource::LocalFallback => "Server unreachable, using local entries".to_string(),
            };
            Ok(format!(
                "{}\n{} entries: {} green, {} red, {} yellow, {} black",
                summary,
                store.entries().await.len(),
                counts.green,
                counts.red,
                counts.yellow,
                counts.black
            ))
        }

        Commands::Month { month, filter } => {
            let (store, _) = ctx.open_store().await?;
            if let Some(month) = month {
                store.show_month(month_index(month)?).await?;
            }
            let filter = filter.map(|f| parse_mood(&f)).transpose()?;
            let slots = store.month_view(filter).await;
            Ok(render_month(store.displayed_month().await, &slots))
        }

        Commands::Show { day, month } => {
            let (store, _) = ctx.open_store().await?;
            let today = store.clock().today();
            let month = month.map(month_index).transpose()?.unwrap_or(today.month0());
            store.show_month(month).await?;

            let day = day.unwrap_or(today.day());
            if !store.can_open(day).await {
                bail!("{} {} cannot be opened", MONTH_NAMES[month as usize], day);
            }
            match store.entry(DayKey::new(month, day)).await {
                Some(entry) => Ok(render_entry(&entry)),
                None => Ok(format!("{} {}: nothing written yet", MONTH_NAMES[month as usize], day)),
            }
        }

        Commands::Write { text } => {
            let (store, _) = ctx.open_store().await?;
            let day = today_slot(&store);
            let outcome = store.set_text(day, text).await;
            report(outcome).await
        }

        Commands::Mood { mood } => {
            let (store, _) = ctx.open_store().await?;
            let mood = parse_mood(&mood)?;
            let day = today_slot(&store);
            report(store.set_mood(day, mood).await).await
        }

        Commands::Attach { file } => {
            let bytes = tokio::fs::read(&file).await?;
            let upload = MediaUpload {
                file_name: file
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| "upload".to_string()),
                content_type: content_type_for(&file).to_string(),
                bytes,
            };

            let (store, _) = ctx.open_store().await?;
            let day = today_slot(&store);
            report(store.attach_media(day, upload).await).await
        }

        Commands::Remove { kind } => {
            let (store, _) = ctx.open_store().await?;
            let day = today_slot(&store);
            report(store.remove_media(day, kind).await).await
        }

        Commands::Watch => {
            let (store, _) = ctx.open_store().await?;
            let watcher = DayRolloverWatcher::new(store, ctx.config.sync.rollover_poll());
            let (shutdown_tx, shutdown_rx) = mpsc::channel(1);

            info!(poll_secs = watcher.poll_interval().as_secs(), "Watching for day rollover");
            let handle = tokio::spawn(watcher.run(shutdown_rx));

            tokio::signal::ctrl_c().await?;
            let _ = shutdown_tx.send(()).await;
            handle.await?;
            Ok("Stopped".to_string())
        }
    }
}

fn today_slot(store: &JournalStore) -> u32 {
    store.clock().today().day()
}

/// User-facing months are 1-12.
fn month_index(month: u32) -> anyhow::Result<u32> {
    match month {
        1..=12 => Ok(month - 1),
        _ => Err(anyhow!("month must be 1-12, got {}", month)),
    }
}

fn parse_mood(s: &str) -> anyhow::Result<Mood> {
    let mood = Mood::parse(s);
    if !mood.is_set() {
        bail!("unknown mood '{}', expected one of green, red, yellow, black", s);
    }
    Ok(mood)
}

async fn report(outcome: MutationOutcome) -> anyhow::Result<String> {
    match outcome {
        MutationOutcome::Ignored => Ok("Nothing to change".to_string()),
        MutationOutcome::Applied { sync: None } => Ok("Saved locally".to_string()),
        MutationOutcome::Applied { sync: Some(handle) } => match handle.wait().await {
            SyncOutcome::Reconciled(key) => Ok(format!("Saved {}", key)),
            SyncOutcome::Failed(e) => Ok(format!("Saved locally, sync failed: {}", e)),
        },
    }
}

/// Guess a MIME type from the file extension.
pub fn content_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "mp4" => "video/mp4",
        "webm" => "video/webm",
        "mov" => "video/quicktime",
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "ogg" => "audio/ogg",
        "m4a" => "audio/mp4",
        _ => "application/octet-stream",
    }
}

fn slot_marker(slot: &DaySlot) -> &'static str {
    if slot.locked {
        return "#";
    }
    match slot.status {
        DayStatus::Today => "*",
        DayStatus::Future => ".",
        DayStatus::Past if slot.has_content => "+",
        DayStatus::Past => " ",
    }
}

/// One line per slot: marker, day number and mood.
pub fn render_month(month: u32, slots: &[DaySlot]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", MONTH_NAMES[month as usize % MONTH_NAMES.len()]);
    for slot in slots {
        let _ = writeln!(out, "{} {:>2} {}", slot_marker(slot), slot.day, slot.mood);
    }
    out.trim_end().to_string()
}

pub fn render_entry(entry: &DayEntry) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} {}",
        MONTH_NAMES[entry.month as usize % MONTH_NAMES.len()],
        entry.day_number
    );
    if entry.mood.is_set() {
        let _ = writeln!(out, "Mood: {}", entry.mood);
    }
    if !entry.text.is_empty() {
        let _ = writeln!(out, "\n{}\n", entry.text);
    }
    for kind in [MediaKind::Image, MediaKind::Video, MediaKind::Audio] {
        let url = entry.resolved.get(kind);
        if !url.is_empty() {
            let _ = writeln!(out, "{}: {}", kind, url);
        }
    }
    out.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use daybook_core::AttachmentRecord;

    fn slot(day: u32, status: DayStatus, mood: Mood) -> DaySlot {
        DaySlot {
            day,
            status,
            mood,
            locked: status == DayStatus::Past && mood == Mood::Black,
            editable: status == DayStatus::Today,
            openable: status != DayStatus::Future,
            has_content: mood == Mood::Green,
        }
    }

    #[test]
    fn test_month_index_is_one_based() {
        assert_eq!(month_index(1).unwrap(), 0);
        assert_eq!(month_index(12).unwrap(), 11);
        assert!(month_index(0).is_err());
        assert!(month_index(13).is_err());
    }

    #[test]
    fn test_parse_mood_rejects_unknown() {
        assert_eq!(parse_mood("Yellow").unwrap(), Mood::Yellow);
        assert!(parse_mood("purple").is_err());
    }

    #[test]
    fn test_content_type_for() {
        assert_eq!(content_type_for(Path::new("a/b/photo.JPG")), "image/jpeg");
        assert_eq!(content_type_for(Path::new("clip.mov")), "video/quicktime");
        assert_eq!(content_type_for(Path::new("voice.m4a")), "audio/mp4");
        assert_eq!(content_type_for(Path::new("notes")), "application/octet-stream");
    }

    #[test]
    fn test_render_month() {
        let slots = vec![
            slot(1, DayStatus::Past, Mood::Black),
            slot(2, DayStatus::Past, Mood::Green),
            slot(3, DayStatus::Today, Mood::None),
            slot(4, DayStatus::Future, Mood::None),
        ];
        let rendered = render_month(3, &slots);
        let lines: Vec<&str> = rendered.lines().collect();

        assert_eq!(lines[0], "April");
        assert_eq!(lines[1], "#  1 black");
        assert_eq!(lines[2], "+  2 green");
        assert_eq!(lines[3].trim_end(), "*  3");
        assert_eq!(lines[4].trim_end(), ".  4");
    }

    #[test]
    fn test_render_entry_lists_resolved_media() {
        let mut entry = DayEntry::empty(DayKey::new(0, 5), Utc::now()).with_attachments(vec![
            AttachmentRecord::from_url("https://cdn/a.jpg"),
            AttachmentRecord::from_url("https://cdn/b.mp3"),
        ]);
        entry.text = "snow".to_string();
        entry.mood = Mood::Green;

        let rendered = render_entry(&entry);
        assert!(rendered.starts_with("January 5"));
        assert!(rendered.contains("Mood: green"));
        assert!(rendered.contains("snow"));
        assert!(rendered.contains("image: https://cdn/a.jpg"));
        assert!(rendered.contains("audio: https://cdn/b.mp3"));
        assert!(!rendered.contains("video:"));
    }
}
