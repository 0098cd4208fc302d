//! Workflow state snapshots.
//!
//! A snapshot is the serialized carried-over state of one workflow plus
//! its run number, written at every handoff and at shutdown, and read
//! back when a workflow is (re)started.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use tw_domain::error::{Error, Result};

/// One persisted workflow execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    /// How many executions this workflow has handed off through.
    pub run: u64,
    /// The carried-over entity state, serialized generically so the store
    /// does not need to know each workflow's state type.
    pub state: serde_json::Value,
}

pub trait SnapshotStore: Send + Sync {
    fn load(&self, workflow_id: &str) -> Result<Option<Snapshot>>;
    fn save(&self, workflow_id: &str, snapshot: &Snapshot) -> Result<()>;
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// In-memory store
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Snapshot store that does not survive a process restart. Used when no
/// state path is configured, and in tests.
#[derive(Default)]
pub struct MemorySnapshotStore {
    snapshots: RwLock<HashMap<String, Snapshot>>,
}

impl SnapshotStore for MemorySnapshotStore {
    fn load(&self, workflow_id: &str) -> Result<Option<Snapshot>> {
        Ok(self.snapshots.read().get(workflow_id).cloned())
    }

    fn save(&self, workflow_id: &str, snapshot: &Snapshot) -> Result<()> {
        self.snapshots
            .write()
            .insert(workflow_id.to_owned(), snapshot.clone());
        Ok(())
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// JSON file store
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Snapshot store backed by one JSON file per workflow under
/// `state_path/workflows/`.
pub struct JsonSnapshotStore {
    dir: PathBuf,
}

impl JsonSnapshotStore {
    pub fn new(state_path: &Path) -> Result<Self> {
        let dir = state_path.join("workflows");
        std::fs::create_dir_all(&dir).map_err(Error::Io)?;
        tracing::info!(path = %dir.display(), "snapshot store ready");
        Ok(Self { dir })
    }

    fn path_for(&self, workflow_id: &str) -> PathBuf {
        self.dir.join(format!("{workflow_id}.json"))
    }
}

impl SnapshotStore for JsonSnapshotStore {
    fn load(&self, workflow_id: &str) -> Result<Option<Snapshot>> {
        let path = self.path_for(workflow_id);
        if !path.exists() {
            return Ok(None);
        }
        let raw = std::fs::read_to_string(&path).map_err(Error::Io)?;
        let snapshot = serde_json::from_str(&raw)?;
        Ok(Some(snapshot))
    }

    fn save(&self, workflow_id: &str, snapshot: &Snapshot) -> Result<()> {
        let path = self.path_for(workflow_id);
        // Write-then-rename so a crash mid-write cannot corrupt the last
        // good snapshot.
        let tmp = path.with_extension("json.tmp");
        let raw = serde_json::to_string_pretty(snapshot)?;
        std::fs::write(&tmp, raw).map_err(Error::Io)?;
        std::fs::rename(&tmp, &path).map_err(Error::Io)?;
        Ok(())
    }
}
