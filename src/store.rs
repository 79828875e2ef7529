use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::model::Ledger;

#[derive(Debug)]
pub enum StoreError {
    Io(io::Error),
    Corrupt(String),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::Io(e) => write!(f, "ledger I/O error: {e}"),
            StoreError::Corrupt(msg) => write!(f, "ledger document corrupt: {msg}"),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<io::Error> for StoreError {
    fn from(e: io::Error) -> Self {
        StoreError::Io(e)
    }
}

/// Durable home of the ledger document. Every save replaces the whole document.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Read the full ledger. A missing or blank document is an empty ledger;
    /// an unreadable or unparsable one is an error.
    async fn read(&self) -> Result<Ledger, StoreError>;

    /// Replace the document with `ledger`. Readers see either the old or the
    /// new document, never a mix.
    async fn save(&self, ledger: &Ledger) -> Result<(), StoreError>;

    /// Soft read for display paths: any failure degrades to an empty ledger.
    async fn load(&self) -> Ledger {
        match self.read().await {
            Ok(ledger) => ledger,
            Err(e) => {
                warn!("ledger unreadable, treating all rooms as free: {e}");
                metrics::counter!(crate::observability::LEDGER_LOAD_DEGRADED_TOTAL).increment(1);
                Ledger::new()
            }
        }
    }
}

fn parse_document(text: &str) -> Result<Ledger, StoreError> {
    if text.trim().is_empty() {
        return Ok(Ledger::new());
    }
    serde_json::from_str(text).map_err(|e| StoreError::Corrupt(e.to_string()))
}

fn render_document(ledger: &Ledger) -> Result<String, StoreError> {
    serde_json::to_string_pretty(ledger).map_err(|e| StoreError::Corrupt(e.to_string()))
}

// ── JSON file backend ────────────────────────────────────────────

/// Ledger kept as a single pretty-printed JSON file.
///
/// Every write to the file (saves and first-read initialization) runs under
/// `write_lock`, so an initialization can never land on top of a save.
pub struct JsonFileStore {
    path: PathBuf,
    write_lock: tokio::sync::Mutex<()>,
    tmp_seq: AtomicU64,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: tokio::sync::Mutex::new(()),
            tmp_seq: AtomicU64::new(0),
        }
    }

    /// Unique temp sibling: `<name>.<pid>.<seq>.tmp`.
    fn tmp_path(&self) -> PathBuf {
        let seq = self.tmp_seq.fetch_add(1, Ordering::Relaxed);
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(format!(".{}.{seq}.tmp", std::process::id()));
        self.path.with_file_name(name)
    }

    /// Write `contents` to `tmp_path`, fsync, then rename over the document.
    fn replace_file(path: &Path, tmp_path: &Path, contents: &str) -> io::Result<()> {
        let result = Self::write_and_rename(path, tmp_path, contents);
        if result.is_err() {
            let _ = fs::remove_file(tmp_path);
        }
        result
    }

    fn write_and_rename(path: &Path, tmp_path: &Path, contents: &str) -> io::Result<()> {
        {
            let file = File::create(tmp_path)?;
            let mut writer = BufWriter::new(file);
            writer.write_all(contents.as_bytes())?;
            writer.flush()?;
            writer.get_ref().sync_all()?;
        }
        fs::rename(tmp_path, path)
    }

    /// Caller holds `write_lock`.
    async fn replace(&self, contents: String) -> Result<(), StoreError> {
        let path = self.path.clone();
        let tmp_path = self.tmp_path();
        tokio::task::spawn_blocking(move || Self::replace_file(&path, &tmp_path, &contents))
            .await
            .map_err(|e| StoreError::Io(io::Error::other(e)))?
            .map_err(StoreError::Io)
    }

    /// Write `{}` if the document is still missing or blank. The check is
    /// repeated under `write_lock`: a save that won the race is left alone.
    async fn init_if_blank(&self) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        match tokio::fs::read_to_string(&self.path).await {
            Ok(text) if !text.trim().is_empty() => return Ok(()),
            Ok(_) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(StoreError::Io(e)),
        }
        debug!("initializing empty ledger at {}", self.path.display());
        self.replace("{}".to_string()).await
    }
}

#[async_trait]
impl LedgerStore for JsonFileStore {
    async fn read(&self) -> Result<Ledger, StoreError> {
        let text = match tokio::fs::read_to_string(&self.path).await {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => String::new(),
            Err(e) => return Err(StoreError::Io(e)),
        };
        if text.trim().is_empty() {
            self.init_if_blank().await?;
            return Ok(Ledger::new());
        }
        parse_document(&text)
    }

    async fn save(&self, ledger: &Ledger) -> Result<(), StoreError> {
        let contents = render_document(ledger)?;
        let _guard = self.write_lock.lock().await;
        let start = std::time::Instant::now();
        let result = self.replace(contents).await;
        metrics::histogram!(crate::observability::LEDGER_SAVE_DURATION_SECONDS)
            .record(start.elapsed().as_secs_f64());
        result
    }
}

// ── In-memory backend ────────────────────────────────────────────

/// Ledger held as document text in memory. Goes through the same
/// serialization as the file backend.
pub struct InMemoryStore {
    document: Mutex<String>,
    fail_writes: AtomicBool,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::from_document("{}")
    }

    pub fn from_document(text: impl Into<String>) -> Self {
        Self {
            document: Mutex::new(text.into()),
            fail_writes: AtomicBool::new(false),
        }
    }

    /// Current raw document text.
    pub fn document(&self) -> String {
        self.document
            .lock()
            .map(|doc| doc.clone())
            .unwrap_or_default()
    }

    /// Make subsequent saves fail with an I/O error.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl LedgerStore for InMemoryStore {
    async fn read(&self) -> Result<Ledger, StoreError> {
        let doc = self
            .document
            .lock()
            .map_err(|_| StoreError::Io(io::Error::other("ledger document lock poisoned")))?;
        parse_document(&doc)
    }

    async fn save(&self, ledger: &Ledger) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Io(io::Error::other("writes disabled")));
        }
        let contents = render_document(ledger)?;
        let mut doc = self
            .document
            .lock()
            .map_err(|_| StoreError::Io(io::Error::other("ledger document lock poisoned")))?;
        *doc = contents;
        Ok(())
    }
}
