//! JSON persistence for searches, applications, and log records.
//!
//! Side-effect storage only: the bot appends records for the dashboard to
//! read back; nothing here feeds back into lifecycle decisions. Files live
//! under the configured data directory, one JSON array per record kind.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Errors from the persistence layer.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Filters a search ran with, denormalized for the dashboard.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchFilters {
    pub job_types: Vec<String>,
    pub salary_range: String,
    pub excluded_keywords: Vec<String>,
    pub experience_levels: Vec<String>,
    pub remote_preference: String,
}

/// One completed job search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchRecord {
    pub search_term: String,
    pub location: String,
    pub result_url: String,
    pub filters: SearchFilters,
    pub timestamp: DateTime<Utc>,
}

/// One submitted job application.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationRecord {
    pub job_id: String,
    pub title: String,
    pub status: String,
    pub timestamp: DateTime<Utc>,
}

/// One structured log line persisted for the dashboard.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogRecord {
    pub timestamp: DateTime<Utc>,
    pub level: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

impl LogRecord {
    pub fn new(level: &str, message: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            level: level.to_string(),
            message: message.into(),
            context: None,
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }
}

/// Record kinds the dashboard can clear.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataKind {
    Searches,
    Applications,
    Logs,
    All,
}

impl DataKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "searches" => Some(Self::Searches),
            "applications" => Some(Self::Applications),
            "logs" => Some(Self::Logs),
            "all" => Some(Self::All),
            _ => None,
        }
    }
}

/// File-backed JSON storage rooted at a data directory.
#[derive(Debug, Clone)]
pub struct JsonStorage {
    data_dir: PathBuf,
}

impl JsonStorage {
    /// Opens storage at `data_dir`, creating the directory if needed.
    pub fn new(data_dir: &Path) -> Result<Self, StorageError> {
        fs::create_dir_all(data_dir)?;
        Ok(Self {
            data_dir: data_dir.to_path_buf(),
        })
    }

    fn file(&self, name: &str) -> PathBuf {
        self.data_dir.join(name)
    }

    fn load_vec<T: DeserializeOwned>(&self, name: &str) -> Result<Vec<T>, StorageError> {
        let path = self.file(name);
        if !path.exists() {
            return Ok(Vec::new());
        }
        let content = fs::read_to_string(path)?;
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_str(&content)?)
    }

    fn save_vec<T: Serialize>(&self, name: &str, records: &[T]) -> Result<(), StorageError> {
        let content = serde_json::to_string_pretty(records)?;
        fs::write(self.file(name), content)?;
        Ok(())
    }

    fn append<T: Serialize + DeserializeOwned>(
        &self,
        name: &str,
        record: T,
    ) -> Result<(), StorageError> {
        let mut records: Vec<T> = self.load_vec(name)?;
        records.push(record);
        self.save_vec(name, &records)
    }

    pub fn append_search(&self, record: SearchRecord) -> Result<(), StorageError> {
        self.append("searches.json", record)
    }

    pub fn load_searches(&self) -> Result<Vec<SearchRecord>, StorageError> {
        self.load_vec("searches.json")
    }

    pub fn append_application(&self, record: ApplicationRecord) -> Result<(), StorageError> {
        self.append("applications.json", record)
    }

    pub fn load_applications(&self) -> Result<Vec<ApplicationRecord>, StorageError> {
        self.load_vec("applications.json")
    }

    pub fn append_log(&self, record: LogRecord) -> Result<(), StorageError> {
        self.append("logs.json", record)
    }

    /// Loads up to the last `limit` log records (all when `limit` is 0).
    pub fn load_logs(&self, limit: usize) -> Result<Vec<LogRecord>, StorageError> {
        let logs: Vec<LogRecord> = self.load_vec("logs.json")?;
        if limit == 0 || logs.len() <= limit {
            return Ok(logs);
        }
        Ok(logs[logs.len() - limit..].to_vec())
    }

    /// Deletes the files backing a record kind.
    pub fn clear(&self, kind: DataKind) -> Result<(), StorageError> {
        let names: &[&str] = match kind {
            DataKind::Searches => &["searches.json"],
            DataKind::Applications => &["applications.json"],
            DataKind::Logs => &["logs.json"],
            DataKind::All => &["searches.json", "applications.json", "logs.json"],
        };
        for name in names {
            let path = self.file(name);
            if path.exists() {
                fs::remove_file(path)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_storage() -> (JsonStorage, PathBuf) {
        let dir = std::env::temp_dir().join(format!("seekbot-test-{}", uuid::Uuid::new_v4()));
        let storage = JsonStorage::new(&dir).unwrap();
        (storage, dir)
    }

    #[test]
    fn test_append_and_load_searches() {
        let (storage, dir) = temp_storage();

        storage
            .append_search(SearchRecord {
                search_term: "rust engineer".to_string(),
                location: "Sydney".to_string(),
                result_url: "https://example.test/results".to_string(),
                filters: SearchFilters {
                    job_types: vec!["full-time".to_string()],
                    salary_range: "100000-150000".to_string(),
                    excluded_keywords: Vec::new(),
                    experience_levels: Vec::new(),
                    remote_preference: "hybrid".to_string(),
                },
                timestamp: Utc::now(),
            })
            .unwrap();

        let searches = storage.load_searches().unwrap();
        assert_eq!(searches.len(), 1);
        assert_eq!(searches[0].search_term, "rust engineer");

        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn test_load_logs_respects_limit() {
        let (storage, dir) = temp_storage();

        for i in 0..5 {
            storage
                .append_log(LogRecord::new("info", format!("message {}", i)))
                .unwrap();
        }

        let all = storage.load_logs(0).unwrap();
        assert_eq!(all.len(), 5);

        let last_two = storage.load_logs(2).unwrap();
        assert_eq!(last_two.len(), 2);
        assert_eq!(last_two[0].message, "message 3");
        assert_eq!(last_two[1].message, "message 4");

        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn test_clear_kinds() {
        let (storage, dir) = temp_storage();

        storage
            .append_log(LogRecord::new("info", "hello"))
            .unwrap();
        storage
            .append_application(ApplicationRecord {
                job_id: "123".to_string(),
                title: "Engineer".to_string(),
                status: "submitted".to_string(),
                timestamp: Utc::now(),
            })
            .unwrap();

        storage.clear(DataKind::Logs).unwrap();
        assert!(storage.load_logs(0).unwrap().is_empty());
        assert_eq!(storage.load_applications().unwrap().len(), 1);

        storage.clear(DataKind::All).unwrap();
        assert!(storage.load_applications().unwrap().is_empty());

        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn test_missing_files_load_empty() {
        let (storage, dir) = temp_storage();
        assert!(storage.load_searches().unwrap().is_empty());
        assert!(storage.load_applications().unwrap().is_empty());
        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn test_data_kind_parse() {
        assert_eq!(DataKind::parse("logs"), Some(DataKind::Logs));
        assert_eq!(DataKind::parse("all"), Some(DataKind::All));
        assert_eq!(DataKind::parse("bogus"), None);
    }
}
