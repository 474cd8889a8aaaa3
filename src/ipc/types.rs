use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::config::Config;
use crate::db::SqliteSnapshots;
use crate::store::{SessionUser, Snapshot, SnapshotStore, Store, StoreError};

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

#[derive(Debug, Error)]
pub enum CommitError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("failed to persist snapshot: {0:#}")]
    Persist(anyhow::Error),
}

pub struct AppState {
    pub config: Config,
    pub workspace: Option<PathBuf>,
    pub snapshots: Option<Box<dyn SnapshotStore>>,
    pub store: Store,
    pub session: Option<SessionUser>,
}

impl AppState {
    /// Starts with an in-memory store; nothing is persisted until a workspace is selected.
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let store = fresh_store(&config)?;
        Ok(Self {
            config,
            workspace: None,
            snapshots: None,
            store,
            session: None,
        })
    }

    pub fn open_workspace(&mut self, path: &Path) -> anyhow::Result<()> {
        let snapshots = SqliteSnapshots::open(path)?;
        let store = match snapshots.load()? {
            Some(snap) if !snap.is_blank() => {
                let (store, report) = Store::from_snapshot(&snap);
                log::info!(
                    "loaded workspace {}: {} users, {} classes, {} words",
                    path.to_string_lossy(),
                    store.users().len(),
                    store.classes().len(),
                    store.words().len()
                );
                if report.dropped_rows > 0
                    || report.rehashed_credentials > 0
                    || !report.corrupt_keys.is_empty()
                {
                    snapshots.save(&store.to_snapshot())?;
                }
                store
            }
            _ => {
                let store = fresh_store(&self.config)?;
                log::info!(
                    "initializing workspace {} ({})",
                    path.to_string_lossy(),
                    if self.config.seed_defaults { "seeded" } else { "empty" }
                );
                snapshots.save(&store.to_snapshot())?;
                store
            }
        };

        self.store = store;
        self.snapshots = Some(Box::new(snapshots));
        self.workspace = Some(path.to_path_buf());
        Ok(())
    }

    /// Runs `op` against a copy of the store and keeps the result only if the op
    /// succeeds and the new snapshot is saved.
    pub fn commit<T>(
        &mut self,
        op: impl FnOnce(&mut Store) -> Result<T, StoreError>,
    ) -> Result<T, CommitError> {
        let mut next = self.store.clone();
        let out = op(&mut next)?;
        self.persist(&next.to_snapshot())
            .map_err(CommitError::Persist)?;
        self.store = next;
        Ok(out)
    }

    /// Swaps in a whole store, e.g. from a backup.
    pub fn replace_store(&mut self, store: Store) -> anyhow::Result<()> {
        self.persist(&store.to_snapshot())?;
        self.store = store;
        Ok(())
    }

    fn persist(&self, snapshot: &Snapshot) -> anyhow::Result<()> {
        match &self.snapshots {
            Some(s) => s.save(snapshot),
            None => Ok(()),
        }
    }
}

fn fresh_store(config: &Config) -> anyhow::Result<Store> {
    if config.seed_defaults {
        Store::seeded(&config.bootstrap_password)
    } else {
        Ok(Store::new())
    }
}
