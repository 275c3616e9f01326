//! Table Management Operations

use crate::database::core::SqliteDriver;
use crate::error::Result;
use crate::sql::create_statements;
use crate::types::TableMetadata;
use rusqlite::types::Value as SqlValue;
use tracing::info;

impl SqliteDriver {
    /// Create a table, plus its full-text table and triggers when any column
    /// is analyzed
    ///
    /// All statements run in one transaction (the caller's, if one is open).
    pub fn create_table(&mut self, table: &TableMetadata) -> Result<()> {
        self.atomically(|driver| {
            for statement in create_statements(table) {
                driver.run_execute(&statement, &[])?;
            }
            Ok(())
        })?;

        info!(
            table = %table.name,
            full_text = table.is_analyzed(),
            "created table"
        );
        Ok(())
    }

    /// Whether a table (or virtual table) named `name` exists
    pub fn table_exists(&self, name: &str) -> Result<bool> {
        let found = self.run_query(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?",
            &[SqlValue::Text(name.to_string())],
            |row| Ok(row.get::<_, i64>(0)?),
        )?;
        Ok(found.first().copied().unwrap_or(0) > 0)
    }
}
