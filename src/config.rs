//! Driver configuration
//!
//! Where the database lives and how large a single page of results may be.

use crate::error::{MiniDbError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default (and maximum accepted) page size for `find` / `search`
pub const DEFAULT_MAX_PAGE_SIZE: i64 = 1000;

/// Default busy timeout (ms)
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

fn default_max_page_size() -> i64 {
    DEFAULT_MAX_PAGE_SIZE
}

fn default_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}

/// 驱动配置
///
/// # Example
/// ```
/// use minidb::DriverConfig;
///
/// let config = DriverConfig::from_json(r#"{ "db_file": "people.db", "max_page_size": 200 }"#)?;
/// assert_eq!(config.max_page_size, 200);
/// # Ok::<(), minidb::MiniDbError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriverConfig {
    /// Database file path; `None` opens a private in-memory database
    #[serde(default)]
    pub db_file: Option<PathBuf>,

    /// Upper bound for `limit`; also the limit applied when none is given
    #[serde(default = "default_max_page_size")]
    pub max_page_size: i64,

    /// How long a statement waits on a locked database before failing
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            db_file: None,
            max_page_size: DEFAULT_MAX_PAGE_SIZE,
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
        }
    }
}

impl DriverConfig {
    /// In-memory database (`:memory:`)
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// On-disk database at `path`
    pub fn with_file(path: impl Into<PathBuf>) -> Self {
        Self {
            db_file: Some(path.into()),
            ..Default::default()
        }
    }

    /// 测试用配置: in-memory, short busy timeout
    pub fn for_testing() -> Self {
        Self {
            busy_timeout_ms: 100,
            ..Default::default()
        }
    }

    pub fn with_max_page_size(mut self, max_page_size: i64) -> Self {
        self.max_page_size = max_page_size;
        self
    }

    /// Parse a JSON document; missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self> {
        let config: DriverConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_page_size <= 0 {
            return Err(MiniDbError::InvalidArgument(format!(
                "`max_page_size` must be positive, got {}",
                self.max_page_size
            )));
        }
        Ok(())
    }

    pub fn is_in_memory(&self) -> bool {
        self.db_file.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = DriverConfig::default();
        assert!(config.is_in_memory());
        assert_eq!(config.max_page_size, 1000);
        assert_eq!(config.busy_timeout_ms, 5000);
    }

    #[test]
    fn test_from_json_fills_defaults() {
        let config = DriverConfig::from_json(r#"{ "db_file": "/tmp/x.db" }"#).unwrap();
        assert_eq!(config.db_file, Some(PathBuf::from("/tmp/x.db")));
        assert_eq!(config.max_page_size, DEFAULT_MAX_PAGE_SIZE);
    }

    #[test]
    fn test_from_json_rejects_bad_page_size() {
        let err = DriverConfig::from_json(r#"{ "max_page_size": 0 }"#).unwrap_err();
        assert!(matches!(err, MiniDbError::InvalidArgument(_)));
    }

    #[test]
    fn test_from_json_rejects_malformed() {
        let err = DriverConfig::from_json("{ not json").unwrap_err();
        assert!(matches!(err, MiniDbError::Serialization(_)));
    }
}
