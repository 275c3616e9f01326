//! Driver Core - SqliteDriver structure and connection lifecycle
//!
//! This module contains:
//! - SqliteDriver struct definition
//! - connect() / close() and the two-state connection machine
//! - Timed statement execution shared by every other operation

use crate::config::DriverConfig;
use crate::error::{ConnectionState, MiniDbError, Result};
use rusqlite::types::Value as SqlValue;
use rusqlite::{params_from_iter, Connection};
use std::time::{Duration, Instant};
use tracing::{debug, error, warn};

/// SQLite-backed driver: one connection, at most one open transaction
///
/// Not thread-safe by design of the engine binding; callers needing
/// concurrency open one driver per thread.
pub struct SqliteDriver {
    pub(crate) config: DriverConfig,

    /// `None` while closed
    pub(crate) conn: Option<Connection>,

    pub(crate) in_transaction: bool,
}

impl SqliteDriver {
    /// Create a closed driver
    pub fn new(config: DriverConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            conn: None,
            in_transaction: false,
        })
    }

    pub fn config(&self) -> &DriverConfig {
        &self.config
    }

    /// Open the connection
    ///
    /// # Example
    /// ```
    /// use minidb::{DriverConfig, SqliteDriver};
    ///
    /// let mut driver = SqliteDriver::new(DriverConfig::in_memory())?;
    /// driver.connect()?;
    /// assert!(driver.is_connected());
    /// assert!(driver.connect().is_err());
    /// driver.close()?;
    /// # Ok::<(), minidb::MiniDbError>(())
    /// ```
    pub fn connect(&mut self) -> Result<()> {
        if self.conn.is_some() {
            return Err(MiniDbError::AlreadyConnected);
        }

        let conn = match self.config.db_file.as_ref() {
            Some(path) => Connection::open(path)?,
            None => Connection::open_in_memory()?,
        };
        conn.busy_timeout(Duration::from_millis(self.config.busy_timeout_ms))?;

        debug!(
            db_file = ?self.config.db_file,
            "connected"
        );
        self.conn = Some(conn);
        self.in_transaction = false;
        Ok(())
    }

    /// Close the connection, rolling back a transaction left open
    pub fn close(&mut self) -> Result<()> {
        self.connection()?;
        if self.in_transaction {
            warn!("closing with an open transaction, rolling back");
            self.rollback()?;
        }

        if let Some(conn) = self.conn.take() {
            if let Err((conn, e)) = conn.close() {
                self.conn = Some(conn);
                return Err(e.into());
            }
        }
        debug!("connection closed");
        Ok(())
    }

    pub fn state(&self) -> ConnectionState {
        if self.conn.is_some() {
            ConnectionState::Open
        } else {
            ConnectionState::Closed
        }
    }

    pub fn is_connected(&self) -> bool {
        self.conn.is_some()
    }

    /// Open connection, or a state error
    pub(crate) fn connection(&self) -> Result<&Connection> {
        self.conn.as_ref().ok_or(MiniDbError::InvalidConnectionState {
            expected: ConnectionState::Open,
            actual: ConnectionState::Closed,
        })
    }

    // ==================== Statement execution ====================

    /// Run `f` against the connection, logging `sql` with its duration and
    /// wrapping an engine failure with the statement text
    fn timed<T, F>(&self, sql: &str, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> rusqlite::Result<T>,
    {
        let conn = self.connection()?;
        let start = Instant::now();
        let result = f(conn);
        let duration_ms = start.elapsed().as_secs_f64() * 1000.0;

        match result {
            Ok(value) => {
                debug!(sql, duration_ms, "statement executed");
                Ok(value)
            }
            Err(source) => {
                error!(sql, duration_ms, error = %source, "statement failed");
                Err(MiniDbError::Engine {
                    sql: sql.to_string(),
                    source,
                })
            }
        }
    }

    /// Execute one parameterized statement, returning the affected-row count
    pub(crate) fn run_execute(&self, sql: &str, params: &[SqlValue]) -> Result<usize> {
        self.timed(sql, |conn| {
            let mut stmt = conn.prepare_cached(sql)?;
            stmt.execute(params_from_iter(params.iter()))
        })
    }

    /// Execute one or more unparameterized statements
    pub(crate) fn run_batch(&self, sql: &str) -> Result<()> {
        self.timed(sql, |conn| conn.execute_batch(sql))
    }

    /// Run a query and map every row; the first mapping error stops the scan
    pub(crate) fn run_query<T, F>(&self, sql: &str, params: &[SqlValue], mut map: F) -> Result<Vec<T>>
    where
        F: FnMut(&rusqlite::Row<'_>) -> Result<T>,
    {
        let mut out = Vec::new();
        let mut mapping_error = None;

        self.timed(sql, |conn| {
            let mut stmt = conn.prepare_cached(sql)?;
            let mut rows = stmt.query(params_from_iter(params.iter()))?;
            while let Some(row) = rows.next()? {
                match map(row) {
                    Ok(value) => out.push(value),
                    Err(e) => {
                        mapping_error = Some(e);
                        break;
                    }
                }
            }
            Ok(())
        })?;

        match mapping_error {
            Some(e) => Err(e),
            None => Ok(out),
        }
    }

    pub(crate) fn last_insert_rowid(&self) -> Result<i64> {
        Ok(self.connection()?.last_insert_rowid())
    }
}

impl Drop for SqliteDriver {
    fn drop(&mut self) {
        if self.in_transaction {
            if let Some(conn) = self.conn.as_ref() {
                warn!("driver dropped with an open transaction, rolling back");
                if let Err(e) = conn.execute_batch("ROLLBACK") {
                    error!(error = %e, "rollback on drop failed");
                }
            }
        }
    }
}

impl std::fmt::Debug for SqliteDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteDriver")
            .field("config", &self.config)
            .field("state", &self.state())
            .field("in_transaction", &self.in_transaction)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_state_machine() {
        let mut driver = SqliteDriver::new(DriverConfig::for_testing()).unwrap();
        assert_eq!(driver.state(), ConnectionState::Closed);

        match driver.close() {
            Err(MiniDbError::InvalidConnectionState { expected, actual }) => {
                assert_eq!(expected, ConnectionState::Open);
                assert_eq!(actual, ConnectionState::Closed);
            }
            other => panic!("unexpected: {:?}", other),
        }

        driver.connect().unwrap();
        assert_eq!(driver.state(), ConnectionState::Open);
        assert!(matches!(driver.connect(), Err(MiniDbError::AlreadyConnected)));

        driver.close().unwrap();
        assert!(!driver.is_connected());

        // reconnect after close is allowed
        driver.connect().unwrap();
        driver.close().unwrap();
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = DriverConfig::in_memory().with_max_page_size(0);
        assert!(SqliteDriver::new(config).is_err());
    }

    #[test]
    fn test_engine_error_carries_sql() {
        let mut driver = SqliteDriver::new(DriverConfig::for_testing()).unwrap();
        driver.connect().unwrap();

        let err = driver.run_execute("INSERT INTO nowhere VALUES (1)", &[]).unwrap_err();
        match err {
            MiniDbError::Engine { sql, .. } => assert_eq!(sql, "INSERT INTO nowhere VALUES (1)"),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_operations_while_closed() {
        let driver = SqliteDriver::new(DriverConfig::for_testing()).unwrap();
        assert!(matches!(
            driver.run_batch("SELECT 1"),
            Err(MiniDbError::InvalidConnectionState { .. })
        ));
    }
}
