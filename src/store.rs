//! Where the stage gets its addresses from.

use crate::table::{AddressMap, RecordSet};
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

/// Read-only source of label to address mappings.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// The address recorded for `label`, if any. Failures to reach the
    /// underlying data look the same as a missing label.
    async fn lookup(&self, label: &str) -> Option<String>;
}

/// When a [`FileStore`] goes back to disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RefreshPolicy {
    /// Read and parse the file on every lookup.
    #[default]
    Always,

    /// Keep the last parsed table until it is older than the interval.
    Interval(Duration),
}

struct Snapshot {
    loaded_at: Instant,
    table: Arc<AddressMap>,
}

/// A JSON record table on disk.
///
/// A table that is missing, unreadable or not valid JSON is treated as an
/// empty table.
pub struct FileStore {
    path: PathBuf,
    refresh: RefreshPolicy,
    snapshot: Mutex<Option<Snapshot>>,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            refresh: RefreshPolicy::default(),
            snapshot: Mutex::new(None),
        }
    }

    pub fn refresh(mut self, refresh: RefreshPolicy) -> Self {
        self.refresh = refresh;
        self
    }

    async fn load(&self) -> AddressMap {
        match RecordSet::load(&self.path).await {
            Ok(set) => set.into_address_map(),
            Err(e) => {
                debug!(error = %e, "using an empty record table");
                AddressMap::new()
            }
        }
    }

    async fn table(&self) -> Arc<AddressMap> {
        let ttl = match self.refresh {
            RefreshPolicy::Always => return Arc::new(self.load().await),
            RefreshPolicy::Interval(ttl) => ttl,
        };

        let mut snapshot = self.snapshot.lock().await;
        if let Some(s) = snapshot.as_ref() {
            if s.loaded_at.elapsed() < ttl {
                return s.table.clone();
            }
        }

        let table = Arc::new(self.load().await);
        *snapshot = Some(Snapshot {
            loaded_at: Instant::now(),
            table: table.clone(),
        });
        table
    }
}

#[async_trait]
impl RecordStore for FileStore {
    async fn lookup(&self, label: &str) -> Option<String> {
        self.table().await.get(label).cloned()
    }
}

/// A fixed table held in memory.
#[derive(Debug, Clone, Default)]
pub struct StaticStore {
    table: AddressMap,
}

impl StaticStore {
    pub fn new(set: RecordSet) -> Self {
        Self {
            table: set.into_address_map(),
        }
    }
}

#[async_trait]
impl RecordStore for StaticStore {
    async fn lookup(&self, label: &str) -> Option<String> {
        self.table.get(label).cloned()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::table::Record;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_table(file: &NamedTempFile, json: &str) {
        std::fs::write(file.path(), json).unwrap();
    }

    #[tokio::test]
    async fn test_always_rereads() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(br#"{"records":[{"name":"host","ipaddress":"10.0.0.1"}]}"#)
            .unwrap();
        file.flush().unwrap();

        let store = FileStore::new(file.path());
        assert_eq!(store.lookup("host").await.as_deref(), Some("10.0.0.1"));

        write_table(
            &file,
            r#"{"records":[{"name":"host","ipaddress":"10.0.0.2"}]}"#,
        );
        assert_eq!(store.lookup("host").await.as_deref(), Some("10.0.0.2"));
    }

    #[tokio::test]
    async fn test_interval_keeps_snapshot() {
        let file = NamedTempFile::new().unwrap();
        write_table(
            &file,
            r#"{"records":[{"name":"host","ipaddress":"10.0.0.1"}]}"#,
        );

        let store =
            FileStore::new(file.path()).refresh(RefreshPolicy::Interval(Duration::from_secs(3600)));
        assert_eq!(store.lookup("host").await.as_deref(), Some("10.0.0.1"));

        write_table(
            &file,
            r#"{"records":[{"name":"host","ipaddress":"10.0.0.2"}]}"#,
        );
        assert_eq!(store.lookup("host").await.as_deref(), Some("10.0.0.1"));
    }

    #[tokio::test]
    async fn test_zero_interval_reloads() {
        let file = NamedTempFile::new().unwrap();
        write_table(
            &file,
            r#"{"records":[{"name":"host","ipaddress":"10.0.0.1"}]}"#,
        );

        let store = FileStore::new(file.path()).refresh(RefreshPolicy::Interval(Duration::ZERO));
        assert_eq!(store.lookup("host").await.as_deref(), Some("10.0.0.1"));

        write_table(
            &file,
            r#"{"records":[{"name":"host","ipaddress":"10.0.0.2"}]}"#,
        );
        assert_eq!(store.lookup("host").await.as_deref(), Some("10.0.0.2"));
    }

    #[tokio::test]
    async fn test_missing_and_malformed_tables_are_empty() {
        let store = FileStore::new("/nonexistent/records.json");
        assert_eq!(store.lookup("host").await, None);

        let file = NamedTempFile::new().unwrap();
        write_table(&file, "not json");
        let store = FileStore::new(file.path());
        assert_eq!(store.lookup("host").await, None);
    }

    #[tokio::test]
    async fn test_static_store() {
        let store = StaticStore::new(
            vec![Record::new("a", "10.0.0.1"), Record::new("a", "10.0.0.9")]
                .into_iter()
                .collect(),
        );
        assert_eq!(store.lookup("a").await.as_deref(), Some("10.0.0.9"));
        assert_eq!(store.lookup("b").await, None);
    }
}
