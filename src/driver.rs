//! Driver selection
//!
//! Backends are chosen by name. Only SQLite is built in; every other name is
//! rejected with [`MiniDbError::DriverNotSupported`].

use crate::config::DriverConfig;
use crate::database::{QueryResponse, SqliteDriver};
use crate::error::{ConnectionState, MiniDbError, Result};
use crate::model::{Key, Model, Record, Table};
use crate::sql::FindOptions;
use crate::types::{TableMetadata, Value};
use std::fmt;
use std::str::FromStr;

/// Caller-facing surface shared by every backend
pub trait Driver {
    fn connect(&mut self) -> Result<()>;
    fn close(&mut self) -> Result<()>;
    fn state(&self) -> ConnectionState;

    fn begin(&mut self) -> Result<()>;
    fn commit(&mut self) -> Result<()>;
    fn rollback(&mut self) -> Result<()>;
    fn in_transaction(&self) -> bool;

    fn create_table(&mut self, table: &TableMetadata) -> Result<()>;

    fn add<M: Model>(&mut self, table: &Table<M>, model: &mut M) -> Result<()>;
    fn update<M: Model>(&mut self, table: &Table<M>, model: &mut M) -> Result<()>;
    fn remove<M: Model>(&mut self, table: &Table<M>, key: Key) -> Result<usize>;

    fn find_one<M: Model>(&self, table: &Table<M>, key: Key) -> Result<Option<M>>;
    fn find<M: Model>(&self, table: &Table<M>, opts: &FindOptions) -> Result<Vec<M>>;
    fn count<M: Model>(&self, table: &Table<M>, opts: &FindOptions) -> Result<i64>;
    fn search<M: Model>(&self, table: &Table<M>, opts: &FindOptions) -> Result<QueryResponse<M>>;

    fn query(&self, sql: &str, params: &[Value]) -> Result<Vec<Record>>;
    fn execute(&mut self, sql: &str, params: &[Value]) -> Result<usize>;
}

impl Driver for SqliteDriver {
    fn connect(&mut self) -> Result<()> {
        SqliteDriver::connect(self)
    }

    fn close(&mut self) -> Result<()> {
        SqliteDriver::close(self)
    }

    fn state(&self) -> ConnectionState {
        SqliteDriver::state(self)
    }

    fn begin(&mut self) -> Result<()> {
        SqliteDriver::begin(self)
    }

    fn commit(&mut self) -> Result<()> {
        SqliteDriver::commit(self)
    }

    fn rollback(&mut self) -> Result<()> {
        SqliteDriver::rollback(self)
    }

    fn in_transaction(&self) -> bool {
        SqliteDriver::in_transaction(self)
    }

    fn create_table(&mut self, table: &TableMetadata) -> Result<()> {
        SqliteDriver::create_table(self, table)
    }

    fn add<M: Model>(&mut self, table: &Table<M>, model: &mut M) -> Result<()> {
        SqliteDriver::add(self, table, model)
    }

    fn update<M: Model>(&mut self, table: &Table<M>, model: &mut M) -> Result<()> {
        SqliteDriver::update(self, table, model)
    }

    fn remove<M: Model>(&mut self, table: &Table<M>, key: Key) -> Result<usize> {
        SqliteDriver::remove(self, table, key)
    }

    fn find_one<M: Model>(&self, table: &Table<M>, key: Key) -> Result<Option<M>> {
        SqliteDriver::find_one(self, table, key)
    }

    fn find<M: Model>(&self, table: &Table<M>, opts: &FindOptions) -> Result<Vec<M>> {
        SqliteDriver::find(self, table, opts)
    }

    fn count<M: Model>(&self, table: &Table<M>, opts: &FindOptions) -> Result<i64> {
        SqliteDriver::count(self, table, opts)
    }

    fn search<M: Model>(&self, table: &Table<M>, opts: &FindOptions) -> Result<QueryResponse<M>> {
        SqliteDriver::search(self, table, opts)
    }

    fn query(&self, sql: &str, params: &[Value]) -> Result<Vec<Record>> {
        SqliteDriver::query(self, sql, params)
    }

    fn execute(&mut self, sql: &str, params: &[Value]) -> Result<usize> {
        SqliteDriver::execute(self, sql, params)
    }
}

/// Known backends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverKind {
    Sqlite,
}

impl DriverKind {
    pub fn parse(name: &str) -> Result<Self> {
        match name {
            "sqlite" => Ok(DriverKind::Sqlite),
            other => Err(MiniDbError::DriverNotSupported(other.to_string())),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            DriverKind::Sqlite => "sqlite",
        }
    }
}

impl FromStr for DriverKind {
    type Err = MiniDbError;

    fn from_str(s: &str) -> Result<Self> {
        DriverKind::parse(s)
    }
}

impl fmt::Display for DriverKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Named backend plus its configuration
///
/// # Example
/// ```
/// use minidb::{DriverConfig, Factory};
///
/// let factory = Factory::new("sqlite", DriverConfig::in_memory())?;
/// let mut driver = factory.get_driver()?;
/// driver.connect()?;
/// # Ok::<(), minidb::MiniDbError>(())
/// ```
#[derive(Debug, Clone)]
pub struct Factory {
    kind: DriverKind,
    config: DriverConfig,
}

impl Factory {
    pub fn new(driver: &str, config: DriverConfig) -> Result<Self> {
        Ok(Self {
            kind: DriverKind::parse(driver)?,
            config,
        })
    }

    pub fn kind(&self) -> DriverKind {
        self.kind
    }

    pub fn config(&self) -> &DriverConfig {
        &self.config
    }

    /// A new, not yet connected driver
    pub fn get_driver(&self) -> Result<SqliteDriver> {
        match self.kind {
            DriverKind::Sqlite => SqliteDriver::new(self.config.clone()),
        }
    }

    pub fn database_exists(&self) -> Result<bool> {
        match self.kind {
            DriverKind::Sqlite => {
                let path = self.config.db_file.as_ref().ok_or_else(|| {
                    MiniDbError::InvalidArgument(
                        "sqlite: `db_file` is required to check for a database".to_string(),
                    )
                })?;
                Ok(path.exists())
            }
        }
    }
}

/// Shorthand for `Factory::new(driver, config)?.get_driver()`
pub fn get_driver(driver: &str, config: DriverConfig) -> Result<SqliteDriver> {
    Factory::new(driver, config)?.get_driver()
}

/// Whether the database file named by `config` exists
pub fn database_exists(driver: &str, config: DriverConfig) -> Result<bool> {
    Factory::new(driver, config)?.database_exists()
}
