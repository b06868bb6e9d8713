//! Whole-document JSON cache.
//!
//! Two documents live in the cache directory:
//! - `pending_jobs.json`: a `settings` entry plus one entry per live job,
//!   keyed by job name.
//! - `timer_cache.json`: `{"duration": <minutes>}`, present only while a
//!   session is queued for the standalone timer.
//!
//! A missing document is a normal state and reads back as `None`.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info};

use super::data_dir;
use crate::error::{CacheError, Result};
use crate::jobs::{Job, RESERVED_NAME};
use crate::settings::Settings;

pub const PENDING_FILE: &str = "pending_jobs.json";
pub const HANDOFF_FILE: &str = "timer_cache.json";

/// Contents of the pending-jobs document.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingDocument {
    pub settings: Settings,
    /// Job records in document order.
    pub jobs: Vec<Job>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct HandoffRecord {
    duration: u32,
}

#[derive(Debug, Clone)]
pub struct CacheStore {
    dir: PathBuf,
}

impl CacheStore {
    /// Cache rooted at `dir`. The directory is created on first write.
    pub fn at(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// `<data_dir>/cache`.
    pub fn open_default() -> Result<Self> {
        Ok(Self::at(data_dir()?.join("cache")))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn pending_path(&self) -> PathBuf {
        self.dir.join(PENDING_FILE)
    }

    pub fn handoff_path(&self) -> PathBuf {
        self.dir.join(HANDOFF_FILE)
    }

    fn read(path: &Path) -> Result<Option<Value>> {
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(CacheError::Io {
                    path: path.to_path_buf(),
                    source,
                }
                .into())
            }
        };
        let value = serde_json::from_slice(&bytes).map_err(|source| CacheError::Malformed {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Some(value))
    }

    /// Replace the document at `path` in one step: write a sibling temp
    /// file, then rename it over the target.
    fn write(&self, path: &Path, value: &Value) -> Result<()> {
        let io_err = |source| CacheError::Io {
            path: path.to_path_buf(),
            source,
        };
        fs::create_dir_all(&self.dir).map_err(io_err)?;
        let content = serde_json::to_vec_pretty(value)?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, content).map_err(io_err)?;
        fs::rename(&tmp, path).map_err(io_err)?;
        Ok(())
    }

    /// Overwrite the pending document. Job names are keys, so a later job
    /// with the same name replaces an earlier one.
    pub fn save_pending(&self, jobs: &[&Job], settings: &Settings) -> Result<()> {
        let mut document = Map::new();
        document.insert(RESERVED_NAME.to_string(), serde_json::to_value(settings)?);
        for job in jobs {
            document.insert(job.name().to_string(), serde_json::to_value(job)?);
        }
        let path = self.pending_path();
        self.write(&path, &Value::Object(document))?;
        info!(path = %path.display(), jobs = jobs.len(), "pending document written");
        Ok(())
    }

    pub fn load_pending(&self) -> Result<Option<PendingDocument>> {
        let path = self.pending_path();
        let Some(value) = Self::read(&path)? else {
            debug!(path = %path.display(), "no pending document");
            return Ok(None);
        };
        let malformed = |source| CacheError::Malformed {
            path: path.clone(),
            source,
        };
        let Value::Object(entries) = value else {
            let source = <serde_json::Error as serde::de::Error>::custom("expected a JSON object");
            return Err(malformed(source).into());
        };

        let mut settings = Settings::default();
        let mut jobs = Vec::with_capacity(entries.len());
        for (key, mut record) in entries {
            if key == RESERVED_NAME {
                settings = serde_json::from_value(record).map_err(malformed)?;
                continue;
            }
            if let Value::Object(fields) = &mut record {
                fields.entry("name").or_insert_with(|| Value::String(key.clone()));
            }
            jobs.push(serde_json::from_value(record).map_err(malformed)?);
        }
        Ok(Some(PendingDocument { settings, jobs }))
    }

    /// Queue a session for the standalone timer. Any earlier record is
    /// replaced, so at most one exists.
    pub fn save_timer_handoff(&self, minutes: u32) -> Result<()> {
        let path = self.handoff_path();
        let record = serde_json::to_value(HandoffRecord { duration: minutes })?;
        self.write(&path, &record)?;
        info!(path = %path.display(), minutes, "timer hand-off queued");
        Ok(())
    }

    /// Read the queued duration without consuming it.
    pub fn load_timer_handoff(&self) -> Result<Option<u32>> {
        let path = self.handoff_path();
        let Some(value) = Self::read(&path)? else {
            return Ok(None);
        };
        let record: HandoffRecord =
            serde_json::from_value(value).map_err(|source| CacheError::Malformed {
                path: path.clone(),
                source,
            })?;
        Ok(Some(record.duration))
    }

    /// Remove the hand-off record. Removing a missing record does nothing.
    pub fn delete_timer_handoff(&self) -> Result<()> {
        let path = self.handoff_path();
        match fs::remove_file(&path) {
            Ok(()) => {
                debug!(path = %path.display(), "timer hand-off removed");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(source) => Err(CacheError::Io { path, source }.into()),
        }
    }

    /// Load and delete in one call. This is the only way the timer process
    /// reads the record, so each queued session runs once.
    pub fn take_timer_handoff(&self) -> Result<Option<u32>> {
        let minutes = self.load_timer_handoff()?;
        if minutes.is_some() {
            self.delete_timer_handoff()?;
        }
        Ok(minutes)
    }
}
