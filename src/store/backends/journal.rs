//! Journal backend implementation.
//!
//! Append-only JSON lines file, one record per line. A torn final line
//! (crash mid-write) is skipped on load; corruption anywhere else fails the
//! load. A failed append is cut back to the last committed record so the
//! file never carries a half-written line in the middle.

use crate::core::{Error, Result};
use crate::store::backend::{BackendType, JournalRecord, OrderStore};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

/// Append handle plus the length of its committed records.
struct JournalFile {
    file: File,
    committed_len: u64,
}

impl JournalFile {
    async fn open(path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await
            .map_err(|e| storage_error(path, "open", e))?;
        let committed_len = file
            .metadata()
            .await
            .map_err(|e| storage_error(path, "stat", e))?
            .len();
        Ok(Self {
            file,
            committed_len,
        })
    }

    /// Drop bytes past the last committed record.
    async fn discard_uncommitted(&mut self, path: &Path) -> Result<()> {
        let len = self
            .file
            .metadata()
            .await
            .map_err(|e| storage_error(path, "stat", e))?
            .len();
        if len == self.committed_len {
            return Ok(());
        }
        if len < self.committed_len {
            return Err(Error::StorageFailure(format!(
                "journal {} shrank from {} to {} bytes",
                path.display(),
                self.committed_len,
                len
            )));
        }

        warn!(
            path = %path.display(),
            dropped_bytes = len - self.committed_len,
            "discarding uncommitted journal bytes"
        );
        self.file
            .set_len(self.committed_len)
            .await
            .map_err(|e| storage_error(path, "truncate", e))
    }

    async fn write_line(&mut self, line: &[u8], sync: bool) -> std::io::Result<()> {
        self.file.write_all(line).await?;
        self.file.flush().await?;
        if sync {
            self.file.sync_data().await?;
        }
        Ok(())
    }
}

/// Append-only file journal.
pub struct JournalStore {
    /// Journal location
    path: PathBuf,
    /// Append handle, serialising writers
    file: Mutex<JournalFile>,
    /// fsync after every append
    sync_writes: bool,
    /// Records written, including those found at open
    records: AtomicU64,
    /// Set when a failed append could not be rolled back
    poisoned: AtomicBool,
}

impl JournalStore {
    /// Open (or create) the journal at `path`.
    pub async fn open(path: impl AsRef<Path>, sync_writes: bool) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| storage_error(&path, "create directory", e))?;
        }

        truncate_torn_tail(&path).await?;
        let file = JournalFile::open(&path).await?;
        let existing = read_records(&path).await?.len() as u64;

        Ok(Self {
            path,
            file: Mutex::new(file),
            sync_writes,
            records: AtomicU64::new(existing),
            poisoned: AtomicBool::new(false),
        })
    }

    /// Journal location.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn compact_path(&self) -> PathBuf {
        let mut name = self.path.clone().into_os_string();
        name.push(".compact");
        PathBuf::from(name)
    }
}

#[async_trait]
impl OrderStore for JournalStore {
    async fn append(&self, record: &JournalRecord) -> Result<()> {
        let mut line = serde_json::to_vec(record)?;
        line.push(b'\n');

        let mut journal = self.file.lock().await;
        if self.poisoned.load(Ordering::SeqCst) {
            return Err(Error::StorageFailure(format!(
                "journal {} disabled after a failed rollback",
                self.path.display()
            )));
        }
        journal.discard_uncommitted(&self.path).await?;

        if let Err(e) = journal.write_line(&line, self.sync_writes).await {
            let committed = journal.committed_len;
            if let Err(rollback) = journal.file.set_len(committed).await {
                self.poisoned.store(true, Ordering::SeqCst);
                error!(
                    path = %self.path.display(),
                    error = %rollback,
                    "journal rollback failed; refusing further appends"
                );
            }
            return Err(storage_error(&self.path, "append", e));
        }

        journal.committed_len += line.len() as u64;
        self.records.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn load(&self) -> Result<Vec<JournalRecord>> {
        let _guard = self.file.lock().await;
        read_records(&self.path).await
    }

    async fn compact(&self, records: &[JournalRecord]) -> Result<()> {
        let mut journal = self.file.lock().await;
        let tmp = self.compact_path();

        let mut content = Vec::new();
        for record in records {
            serde_json::to_writer(&mut content, record)?;
            content.push(b'\n');
        }

        let mut out = File::create(&tmp)
            .await
            .map_err(|e| storage_error(&tmp, "create", e))?;
        out.write_all(&content)
            .await
            .map_err(|e| storage_error(&tmp, "write", e))?;
        out.sync_all()
            .await
            .map_err(|e| storage_error(&tmp, "sync", e))?;
        drop(out);

        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| storage_error(&self.path, "replace", e))?;
        match JournalFile::open(&self.path).await {
            Ok(file) => *journal = file,
            Err(e) => {
                // The old handle points at the replaced file
                self.poisoned.store(true, Ordering::SeqCst);
                return Err(e);
            }
        }

        let before = self.records.swap(records.len() as u64, Ordering::SeqCst);
        self.poisoned.store(false, Ordering::SeqCst);
        info!(
            path = %self.path.display(),
            before,
            after = records.len(),
            "journal compacted"
        );
        Ok(())
    }

    fn backend_type(&self) -> BackendType {
        BackendType::Journal
    }

    async fn health_check(&self) -> Result<bool> {
        if self.poisoned.load(Ordering::SeqCst) {
            return Ok(false);
        }
        Ok(tokio::fs::metadata(&self.path).await.is_ok())
    }

    async fn count(&self) -> Result<u64> {
        Ok(self.records.load(Ordering::SeqCst))
    }
}

fn storage_error(path: &Path, action: &str, err: std::io::Error) -> Error {
    Error::StorageFailure(format!("{} {}: {}", action, path.display(), err))
}

/// Cut an unterminated final line so new appends start on a fresh line.
async fn truncate_torn_tail(path: &Path) -> Result<()> {
    let content = match tokio::fs::read(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(storage_error(path, "read", e)),
    };
    if content.is_empty() || content.ends_with(b"\n") {
        return Ok(());
    }

    let keep = content
        .iter()
        .rposition(|b| *b == b'\n')
        .map_or(0, |i| i + 1);
    warn!(
        path = %path.display(),
        dropped_bytes = content.len() - keep,
        "truncating torn journal tail"
    );

    let file = OpenOptions::new()
        .write(true)
        .open(path)
        .await
        .map_err(|e| storage_error(path, "open", e))?;
    file.set_len(keep as u64)
        .await
        .map_err(|e| storage_error(path, "truncate", e))?;
    Ok(())
}

async fn read_records(path: &Path) -> Result<Vec<JournalRecord>> {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(storage_error(path, "read", e)),
    };

    let lines: Vec<&str> = content.lines().filter(|l| !l.trim().is_empty()).collect();
    let mut records = Vec::with_capacity(lines.len());
    for (index, line) in lines.iter().enumerate() {
        match serde_json::from_str::<JournalRecord>(line) {
            Ok(record) => records.push(record),
            Err(e) if index + 1 == lines.len() => {
                warn!(path = %path.display(), error = %e, "skipping torn journal tail");
            }
            Err(e) => {
                return Err(Error::StorageFailure(format!(
                    "corrupt journal {} at record {}: {}",
                    path.display(),
                    index + 1,
                    e
                )));
            }
        }
    }

    Ok(records)
}
