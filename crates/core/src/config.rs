use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub store: StoreConfig,
    pub dedup: DedupConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Path of the JSON snapshot file.
    pub snapshot_path: PathBuf,
    /// Closed signals older than this are swept by cleanup.
    pub retention_days: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DedupConfig {
    /// Maximum number of recently seen message keys kept for duplicate drops.
    pub capacity: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            store: StoreConfig {
                snapshot_path: PathBuf::from("data/signals.json"),
                retention_days: 30,
            },
            dedup: DedupConfig { capacity: 100 },
        }
    }
}
