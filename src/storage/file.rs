//! YAML file persistence gateway
//!
//! Each table lives in its own YAML file inside the data directory. Every
//! operation loads the tables, applies the change through [`Tables`] and
//! writes the affected file back while holding an async lock, so the rules
//! are identical to the in-memory gateway. Change events reach subscribers of
//! this process only.

use super::gateway::{ChangeEvent, ChangeFeed, Filter, PersistenceGateway, Record, Table};
use super::memory::Tables;
use crate::error::{Result, ValetError};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::sync::{Mutex, broadcast};

/// Gateway storing tables as YAML files
#[derive(Debug)]
pub struct FileGateway {
    data_dir: PathBuf,
    lock: Mutex<()>,
    feed: ChangeFeed,
}

impl FileGateway {
    /// Create the data directory and empty table files
    ///
    /// Existing table files are left untouched unless `force` is set.
    pub async fn init(data_dir: impl Into<PathBuf>, force: bool) -> Result<Self> {
        let gateway = Self::at(data_dir.into());
        tokio::fs::create_dir_all(&gateway.data_dir).await?;
        for table in Table::ALL {
            let path = gateway.table_path(table);
            if force || !tokio::fs::try_exists(&path).await? {
                write_rows(&path, &[]).await?;
            }
        }
        tracing::info!("Initialized valet data directory at {}", gateway.data_dir.display());
        Ok(gateway)
    }

    /// Open an initialized data directory
    pub async fn open(data_dir: impl Into<PathBuf>) -> Result<Self> {
        let gateway = Self::at(data_dir.into());
        for table in Table::ALL {
            if !tokio::fs::try_exists(gateway.table_path(table)).await? {
                return Err(ValetError::NotInitialized);
            }
        }
        Ok(gateway)
    }

    fn at(data_dir: PathBuf) -> Self {
        Self {
            data_dir,
            lock: Mutex::new(()),
            feed: ChangeFeed::default(),
        }
    }

    #[must_use]
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn table_path(&self, table: Table) -> PathBuf {
        self.data_dir.join(format!("{}.yaml", table.as_str()))
    }

    async fn load(&self) -> Result<Tables> {
        Ok(Tables {
            tickets: read_rows(&self.table_path(Table::Tickets)).await?,
            car_requests: read_rows(&self.table_path(Table::CarRequests)).await?,
        })
    }

    async fn save(&self, tables: &Tables, table: Table) -> Result<()> {
        write_rows(&self.table_path(table), tables.rows(table)).await
    }
}

async fn read_rows(path: &Path) -> Result<Vec<Record>> {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ValetError::NotInitialized);
        },
        Err(e) => return Err(e.into()),
    };
    if content.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_yaml::from_str(&content).map_err(|e| {
        ValetError::persistence(format!("Failed to parse {}: {e}", path.display()))
    })
}

async fn write_rows(path: &Path, rows: &[Record]) -> Result<()> {
    let content = serde_yaml::to_string(rows)?;
    tokio::fs::write(path, content).await.map_err(|e| {
        ValetError::persistence(format!("Failed to write {}: {e}", path.display()))
    })
}

#[async_trait]
impl PersistenceGateway for FileGateway {
    async fn insert(&self, table: Table, record: Record) -> Result<Record> {
        let _guard = self.lock.lock().await;
        let mut tables = self.load().await?;
        let (stored, event) = tables.insert(table, record)?;
        self.save(&tables, table).await?;
        self.feed.publish([event]);
        Ok(stored)
    }

    async fn select(&self, table: Table, filter: &Filter) -> Result<Vec<Record>> {
        let _guard = self.lock.lock().await;
        Ok(self.load().await?.select(table, filter))
    }

    async fn update(&self, table: Table, filter: &Filter, patch: Record) -> Result<usize> {
        let _guard = self.lock.lock().await;
        let mut tables = self.load().await?;
        let events = tables.update(table, filter, &patch);
        if !events.is_empty() {
            self.save(&tables, table).await?;
        }
        let changed = events.len();
        self.feed.publish(events);
        Ok(changed)
    }

    async fn delete(&self, table: Table, filter: &Filter) -> Result<usize> {
        let _guard = self.lock.lock().await;
        let mut tables = self.load().await?;
        let events = tables.delete(table, filter)?;
        if !events.is_empty() {
            self.save(&tables, table).await?;
        }
        let removed = events.len();
        self.feed.publish(events);
        Ok(removed)
    }

    async fn count(&self, table: Table, filter: &Filter) -> Result<usize> {
        Ok(self.select(table, filter).await?.len())
    }

    fn subscribe(&self, table: Table) -> broadcast::Receiver<ChangeEvent> {
        self.feed.subscribe(table)
    }
}
