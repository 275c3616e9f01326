/// Model registry: collects table declarations, validates them once, and
/// hands out immutable shared metadata
use crate::database::SqliteDriver;
use crate::error::{MiniDbError, Result};
use crate::model::{Model, Table};
use crate::types::{Column, ColumnType, TableMetadata};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use tracing::{info, warn};

/// Hook run inside the schema-creation transaction, after every table exists
///
/// Receives the built metadata so it can obtain typed table handles.
pub type Initializer = Box<dyn Fn(&mut SqliteDriver, &ModelMetadata) -> Result<()> + Send + Sync>;

/// Declarations waiting to be validated by [`ModelRegistry::build`]
///
/// # Example
/// ```
/// use minidb::{define_model, Column, ModelRegistry};
///
/// define_model! {
///     pub struct Note in "note" {
///         id: i64 => Column::integer().primary_key().autoincrement(),
///         body: String => Column::string().analyzed(),
///     }
/// }
///
/// let metadata = ModelRegistry::new().register::<Note>().build()?;
/// assert!(metadata.collection("note")?.is_analyzed());
/// # Ok::<(), minidb::MiniDbError>(())
/// ```
#[derive(Default)]
pub struct ModelRegistry {
    declarations: Vec<(String, Vec<(String, Column)>)>,
    initializer: Option<Initializer>,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a model type's table
    pub fn register<M: Model>(self) -> Self {
        let columns = M::columns()
            .into_iter()
            .map(|(name, column)| (name.to_string(), column))
            .collect();
        self.register_table(M::TABLE, columns)
    }

    /// Register a table declared at runtime
    pub fn register_table(mut self, name: impl Into<String>, columns: Vec<(String, Column)>) -> Self {
        self.declarations.push((name.into(), columns));
        self
    }

    pub fn with_initializer<F>(mut self, initializer: F) -> Self
    where
        F: Fn(&mut SqliteDriver, &ModelMetadata) -> Result<()> + Send + Sync + 'static,
    {
        self.initializer = Some(Box::new(initializer));
        self
    }

    /// Validate every declaration and freeze the metadata
    ///
    /// Fails on the first invalid table; nothing is partially built.
    pub fn build(self) -> Result<ModelMetadata> {
        let mut seen = HashSet::new();
        let mut tables = Vec::with_capacity(self.declarations.len());

        for (name, columns) in self.declarations {
            if !seen.insert(name.clone()) {
                return Err(schema_error(&name, "table is registered more than once"));
            }
            validate_table(&name, &columns)?;
            tables.push(Arc::new(TableMetadata::new(name, columns)));
        }

        // a shadow table must not shadow a real one
        for table in &tables {
            if let Some(fts) = table.fts_table_name() {
                if seen.contains(&fts) {
                    return Err(schema_error(
                        &table.name,
                        &format!("full-text table `{}` collides with a registered table", fts),
                    ));
                }
            }
        }

        Ok(ModelMetadata {
            tables,
            initializer: self.initializer,
        })
    }
}

impl fmt::Debug for ModelRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelRegistry")
            .field("tables", &self.declarations.iter().map(|(n, _)| n).collect::<Vec<_>>())
            .field("initializer", &self.initializer.is_some())
            .finish()
    }
}

fn schema_error(table: &str, reason: &str) -> MiniDbError {
    MiniDbError::SchemaConfiguration(format!("table `{}`: {}", table, reason))
}

/// SQLite keywords; any of them used bare as a name breaks the generated DDL
const SQL_KEYWORDS: &[&str] = &[
    "ABORT", "ACTION", "ADD", "AFTER", "ALL", "ALTER", "ALWAYS", "ANALYZE", "AND", "AS", "ASC",
    "ATTACH", "AUTOINCREMENT", "BEFORE", "BEGIN", "BETWEEN", "BY", "CASCADE", "CASE", "CAST",
    "CHECK", "COLLATE", "COLUMN", "COMMIT", "CONFLICT", "CONSTRAINT", "CREATE", "CROSS",
    "CURRENT", "CURRENT_DATE", "CURRENT_TIME", "CURRENT_TIMESTAMP", "DATABASE", "DEFAULT",
    "DEFERRABLE", "DEFERRED", "DELETE", "DESC", "DETACH", "DISTINCT", "DO", "DROP", "EACH",
    "ELSE", "END", "ESCAPE", "EXCEPT", "EXCLUDE", "EXCLUSIVE", "EXISTS", "EXPLAIN", "FAIL",
    "FILTER", "FIRST", "FOLLOWING", "FOR", "FOREIGN", "FROM", "FULL", "GENERATED", "GLOB",
    "GROUP", "GROUPS", "HAVING", "IF", "IGNORE", "IMMEDIATE", "IN", "INDEX", "INDEXED",
    "INITIALLY", "INNER", "INSERT", "INSTEAD", "INTERSECT", "INTO", "IS", "ISNULL", "JOIN",
    "KEY", "LAST", "LEFT", "LIKE", "LIMIT", "MATCH", "MATERIALIZED", "NATURAL", "NO", "NOT",
    "NOTHING", "NOTNULL", "NULL", "NULLS", "OF", "OFFSET", "ON", "OR", "ORDER", "OTHERS",
    "OUTER", "OVER", "PARTITION", "PLAN", "PRAGMA", "PRECEDING", "PRIMARY", "QUERY", "RAISE",
    "RANGE", "RECURSIVE", "REFERENCES", "REGEXP", "REINDEX", "RELEASE", "RENAME", "REPLACE",
    "RESTRICT", "RETURNING", "RIGHT", "ROLLBACK", "ROW", "ROWS", "SAVEPOINT", "SELECT", "SET",
    "TABLE", "TEMP", "TEMPORARY", "THEN", "TIES", "TO", "TRANSACTION", "TRIGGER", "UNBOUNDED",
    "UNION", "UNIQUE", "UPDATE", "USING", "VACUUM", "VALUES", "VIEW", "VIRTUAL", "WHEN", "WHERE",
    "WINDOW", "WITH", "WITHOUT",
];

/// Names are interpolated into SQL unquoted, so only plain identifiers that
/// are not keywords are accepted
fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !SQL_KEYWORDS.iter().any(|k| k.eq_ignore_ascii_case(name))
}

fn validate_table(name: &str, columns: &[(String, Column)]) -> Result<()> {
    if !is_identifier(name) {
        return Err(schema_error(name, "table name is not a valid identifier"));
    }
    if columns.is_empty() {
        return Err(schema_error(name, "table declares no columns"));
    }

    let mut column_names = HashSet::new();
    let mut autoincrement = Vec::new();
    let mut key_count = 0;

    for (column_name, column) in columns {
        if !is_identifier(column_name) {
            return Err(schema_error(
                name,
                &format!("column name `{}` is not a valid identifier", column_name),
            ));
        }
        if !column_names.insert(column_name.as_str()) {
            return Err(schema_error(name, &format!("column `{}` is declared twice", column_name)));
        }
        if column.primary_key {
            key_count += 1;
        }
        if column.autoincrement {
            if column.column_type != ColumnType::Integer {
                return Err(schema_error(
                    name,
                    &format!("autoincrement column `{}` must be Integer", column_name),
                ));
            }
            if !column.primary_key {
                return Err(schema_error(
                    name,
                    &format!("autoincrement column `{}` must be the primary key", column_name),
                ));
            }
            autoincrement.push(column_name.as_str());
        }
        if column.analyzed && column.column_type != ColumnType::String {
            return Err(schema_error(
                name,
                &format!("analyzed column `{}` must be String", column_name),
            ));
        }
    }

    if autoincrement.len() > 1 {
        return Err(schema_error(
            name,
            &format!("more than one autoincrement column: {}", autoincrement.join(", ")),
        ));
    }
    if !autoincrement.is_empty() && key_count > 1 {
        return Err(schema_error(
            name,
            "an autoincrement key cannot be part of a composite primary key",
        ));
    }
    if key_count == 0 && columns.iter().any(|(_, c)| c.analyzed) {
        return Err(schema_error(
            name,
            "analyzed columns need a primary key to join the full-text table",
        ));
    }
    Ok(())
}

/// Validated, immutable table metadata for every registered model
pub struct ModelMetadata {
    tables: Vec<Arc<TableMetadata>>,
    initializer: Option<Initializer>,
}

impl ModelMetadata {
    /// Tables in registration order
    pub fn tables(&self) -> impl Iterator<Item = &Arc<TableMetadata>> {
        self.tables.iter()
    }

    pub fn collection(&self, name: &str) -> Result<&Arc<TableMetadata>> {
        self.tables
            .iter()
            .find(|t| t.name == name)
            .ok_or_else(|| MiniDbError::TableNotFound(name.to_string()))
    }

    /// Typed handle for a registered model
    pub fn table<M: Model>(&self) -> Result<Table<M>> {
        Table::new(Arc::clone(self.collection(M::TABLE)?))
    }

    /// Create every table, then run the initializer, in one transaction
    ///
    /// Any failure rolls the whole batch back and is returned unchanged.
    ///
    /// # Example
    /// ```ignore
    /// let mut driver = SqliteDriver::new(DriverConfig::in_memory())?;
    /// driver.connect()?;
    /// metadata.create_db(&mut driver)?;
    /// ```
    pub fn create_db(&self, driver: &mut SqliteDriver) -> Result<()> {
        driver.begin()?;
        match self.create_all(driver) {
            Ok(()) => driver.commit(),
            Err(e) => {
                if driver.in_transaction() {
                    warn!(error = %e, "schema creation failed, rolling back");
                    if let Err(rollback) = driver.rollback() {
                        warn!(error = %rollback, "rollback after failed schema creation failed");
                    }
                }
                Err(e)
            }
        }
    }

    fn create_all(&self, driver: &mut SqliteDriver) -> Result<()> {
        for table in &self.tables {
            driver.create_table(table)?;
        }
        if let Some(initializer) = self.initializer.as_ref() {
            info!("running database initializer");
            initializer(driver, self)?;
        }
        Ok(())
    }
}

impl fmt::Debug for ModelMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelMetadata")
            .field("tables", &self.tables)
            .field("initializer", &self.initializer.is_some())
            .finish()
    }
}
