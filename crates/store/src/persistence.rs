//! Snapshot persistence for the signal store.
//!
//! The whole store is serialized to a single JSON document after every
//! mutation and loaded wholesale at startup. Writes go to a temp file first
//! and are renamed into place so a crash mid-write never leaves a torn
//! snapshot. A missing or corrupt file loads as an empty store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use signal_relay_core::Signal;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors from snapshot operations.
#[derive(Error, Debug)]
pub enum StoreError {
    /// IO error reading/writing the snapshot file.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// On-disk snapshot document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotFile {
    pub updated_at: DateTime<Utc>,
    pub signals: Vec<Signal>,
}

/// Handles writing and loading the snapshot file.
#[derive(Debug, Clone)]
pub struct SnapshotPersistence {
    path: PathBuf,
}

impl SnapshotPersistence {
    #[must_use]
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    #[must_use]
    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// Writes a full snapshot of `signals` to disk.
    ///
    /// Creates parent directories if they don't exist. The document is
    /// written to `<path>.tmp` and renamed over the target so readers never
    /// observe a partial file.
    pub fn save(&self, signals: &[Signal]) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let snapshot = SnapshotFile {
            updated_at: Utc::now(),
            signals: signals.to_vec(),
        };

        let tmp = self.path.with_extension("tmp");
        let file = File::create(&tmp)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, &snapshot)?;
        writer.flush()?;
        fs::rename(&tmp, &self.path)?;

        debug!(
            path = %self.path.display(),
            count = snapshot.signals.len(),
            "Saved signal snapshot"
        );

        Ok(())
    }

    /// Loads all signals from disk.
    ///
    /// A missing or unreadable file is not an error: the store starts empty
    /// and the next mutation rewrites it.
    #[must_use]
    pub fn load(&self) -> Vec<Signal> {
        if !self.path.exists() {
            info!(
                path = %self.path.display(),
                "No snapshot file found, starting with an empty store"
            );
            return Vec::new();
        }

        match self.load_internal() {
            Ok(snapshot) => {
                info!(
                    path = %self.path.display(),
                    count = snapshot.signals.len(),
                    saved_at = %snapshot.updated_at,
                    "Loaded signal snapshot"
                );
                snapshot.signals
            }
            Err(e) => {
                warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Failed to load snapshot, starting with an empty store"
                );
                Vec::new()
            }
        }
    }

    fn load_internal(&self) -> Result<SnapshotFile, StoreError> {
        let file = File::open(&self.path)?;
        let reader = BufReader::new(file);
        let snapshot: SnapshotFile = serde_json::from_reader(reader)?;
        Ok(snapshot)
    }
}
