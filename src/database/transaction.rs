//! Transaction Operations
//!
//! Manual `BEGIN` / `COMMIT` / `ROLLBACK` on the single connection, plus a
//! scoped helper that never lets an open transaction escape.

use crate::config::DriverConfig;
use crate::database::core::SqliteDriver;
use crate::error::{MiniDbError, Result};
use tracing::{error, warn};

impl SqliteDriver {
    /// Begin a transaction
    ///
    /// # Example
    /// ```ignore
    /// driver.begin()?;
    /// driver.add(&people, &mut person)?;
    /// driver.commit()?;
    /// ```
    pub fn begin(&mut self) -> Result<()> {
        self.connection()?;
        if self.in_transaction {
            return Err(MiniDbError::AlreadyInTransaction);
        }
        self.run_batch("BEGIN")?;
        self.in_transaction = true;
        Ok(())
    }

    pub fn commit(&mut self) -> Result<()> {
        self.connection()?;
        if !self.in_transaction {
            return Err(MiniDbError::NotInTransaction);
        }
        let result = self.run_batch("COMMIT");
        self.sync_transaction_flag()?;
        result
    }

    pub fn rollback(&mut self) -> Result<()> {
        self.connection()?;
        if !self.in_transaction {
            return Err(MiniDbError::NotInTransaction);
        }
        let result = self.run_batch("ROLLBACK");
        self.sync_transaction_flag()?;
        result
    }

    pub fn in_transaction(&self) -> bool {
        self.in_transaction
    }

    /// A failed COMMIT (e.g. busy) leaves the transaction open; trust the engine
    pub(crate) fn sync_transaction_flag(&mut self) -> Result<()> {
        self.in_transaction = !self.connection()?.is_autocommit();
        Ok(())
    }

    /// Run `f` inside a transaction of its own unless one is already open
    pub(crate) fn atomically<T, F>(&mut self, f: F) -> Result<T>
    where
        F: FnOnce(&mut SqliteDriver) -> Result<T>,
    {
        if self.in_transaction {
            return f(self);
        }

        self.begin()?;
        match f(self) {
            Ok(value) => {
                self.commit()?;
                Ok(value)
            }
            Err(e) => {
                if self.in_transaction {
                    if let Err(rollback) = self.rollback() {
                        error!(error = %rollback, "rollback failed");
                    }
                }
                Err(e)
            }
        }
    }

    /// Connect, run `f`, and close
    ///
    /// If `f` fails while a transaction is open, the transaction is rolled
    /// back before the connection is released. The error from `f` wins over
    /// any error from closing.
    ///
    /// # Example
    /// ```
    /// use minidb::{DriverConfig, SqliteDriver};
    ///
    /// let n = SqliteDriver::scoped(DriverConfig::in_memory(), |driver| {
    ///     driver.execute("CREATE TABLE t (a INTEGER)", &[])?;
    ///     driver.execute("INSERT INTO t VALUES (1), (2)", &[])
    /// })?;
    /// assert_eq!(n, 2);
    /// # Ok::<(), minidb::MiniDbError>(())
    /// ```
    pub fn scoped<T, F>(config: DriverConfig, f: F) -> Result<T>
    where
        F: FnOnce(&mut SqliteDriver) -> Result<T>,
    {
        let mut driver = SqliteDriver::new(config)?;
        driver.connect()?;

        let result = f(&mut driver);
        if result.is_err() && driver.in_transaction {
            warn!("scope failed with an open transaction, rolling back");
            if let Err(e) = driver.rollback() {
                error!(error = %e, "rollback on scope exit failed");
            }
        }

        let closed = if driver.is_connected() {
            driver.close()
        } else {
            Ok(())
        };
        let value = result?;
        closed?;
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open() -> SqliteDriver {
        let mut driver = SqliteDriver::new(DriverConfig::for_testing()).unwrap();
        driver.connect().unwrap();
        driver.run_batch("CREATE TABLE t (a INTEGER)").unwrap();
        driver
    }

    fn rows(driver: &SqliteDriver) -> i64 {
        driver
            .run_query("SELECT COUNT(*) FROM t", &[], |row| Ok(row.get::<_, i64>(0)?))
            .unwrap()[0]
    }

    #[test]
    fn test_transaction_state_errors() {
        let mut driver = open();
        assert!(matches!(driver.commit(), Err(MiniDbError::NotInTransaction)));
        assert!(matches!(driver.rollback(), Err(MiniDbError::NotInTransaction)));

        driver.begin().unwrap();
        assert!(matches!(driver.begin(), Err(MiniDbError::AlreadyInTransaction)));
        driver.commit().unwrap();
        assert!(!driver.in_transaction());
    }

    #[test]
    fn test_transaction_on_closed_connection() {
        let mut driver = SqliteDriver::new(DriverConfig::for_testing()).unwrap();
        assert!(matches!(
            driver.begin(),
            Err(MiniDbError::InvalidConnectionState { .. })
        ));
    }

    #[test]
    fn test_rollback_discards() {
        let mut driver = open();
        driver.begin().unwrap();
        driver.run_batch("INSERT INTO t VALUES (1)").unwrap();
        driver.rollback().unwrap();
        assert_eq!(rows(&driver), 0);

        driver.begin().unwrap();
        driver.run_batch("INSERT INTO t VALUES (1)").unwrap();
        driver.commit().unwrap();
        assert_eq!(rows(&driver), 1);
    }

    #[test]
    fn test_atomically_rolls_back_on_error() {
        let mut driver = open();
        let result: Result<()> = driver.atomically(|d| {
            d.run_batch("INSERT INTO t VALUES (1)")?;
            Err(MiniDbError::InvalidQuery("boom".into()))
        });
        assert!(result.is_err());
        assert!(!driver.in_transaction());
        assert_eq!(rows(&driver), 0);
    }

    #[test]
    fn test_close_rolls_back_open_transaction() {
        let dir = tempfile::tempdir().unwrap();
        let config = DriverConfig::with_file(dir.path().join("close.db"));

        let mut driver = SqliteDriver::new(config.clone()).unwrap();
        driver.connect().unwrap();
        driver.run_batch("CREATE TABLE t (a INTEGER)").unwrap();
        driver.begin().unwrap();
        driver.run_batch("INSERT INTO t VALUES (1)").unwrap();
        driver.close().unwrap();
        assert!(!driver.in_transaction());

        let mut reopened = SqliteDriver::new(config).unwrap();
        reopened.connect().unwrap();
        assert_eq!(rows(&reopened), 0);
    }
}
