/// Table metadata and column definitions
use super::Value;
use std::fmt;
use std::sync::Arc;

/// Name prefix of the shadow full-text table
pub const FTS_TABLE_PREFIX: &str = "fts_";

/// Column data type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnType {
    /// Text
    String,
    /// 64-bit integer
    Integer,
    /// Double precision float
    Float,
    /// Raw bytes
    Blob,
    /// Boolean, stored as 0/1
    Bit,
    /// UTC date/time, stored as epoch seconds
    Date,
}

impl ColumnType {
    /// Native SQLite type used in `CREATE TABLE`
    pub fn sql_type(&self) -> &'static str {
        match self {
            ColumnType::String => "TEXT",
            ColumnType::Integer | ColumnType::Bit => "INTEGER",
            ColumnType::Float => "REAL",
            ColumnType::Date => "INTEGER",
            ColumnType::Blob => "BLOB",
        }
    }
}

/// Zero-argument value producer invoked on every add/update
pub type Generator = Arc<dyn Fn() -> Value + Send + Sync>;

/// Column definition
///
/// Columns are `NOT NULL` unless [`Column::nullable`] is called.
#[derive(Clone)]
pub struct Column {
    pub column_type: ColumnType,
    pub nullable: bool,
    pub autoincrement: bool,
    pub primary_key: bool,
    pub generator: Option<Generator>,
    /// Indexed in the shadow full-text table
    pub analyzed: bool,
}

impl Column {
    pub fn new(column_type: ColumnType) -> Self {
        Self {
            column_type,
            nullable: false,
            autoincrement: false,
            primary_key: false,
            generator: None,
            analyzed: false,
        }
    }

    pub fn string() -> Self {
        Self::new(ColumnType::String)
    }

    pub fn integer() -> Self {
        Self::new(ColumnType::Integer)
    }

    pub fn float() -> Self {
        Self::new(ColumnType::Float)
    }

    pub fn blob() -> Self {
        Self::new(ColumnType::Blob)
    }

    pub fn bit() -> Self {
        Self::new(ColumnType::Bit)
    }

    pub fn date() -> Self {
        Self::new(ColumnType::Date)
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn autoincrement(mut self) -> Self {
        self.autoincrement = true;
        self
    }

    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    pub fn analyzed(mut self) -> Self {
        self.analyzed = true;
        self
    }

    pub fn generator<F>(mut self, generator: F) -> Self
    where
        F: Fn() -> Value + Send + Sync + 'static,
    {
        self.generator = Some(Arc::new(generator));
        self
    }
}

impl fmt::Debug for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Column")
            .field("column_type", &self.column_type)
            .field("nullable", &self.nullable)
            .field("autoincrement", &self.autoincrement)
            .field("primary_key", &self.primary_key)
            .field("generator", &self.generator.as_ref().map(|_| "<fn>"))
            .field("analyzed", &self.analyzed)
            .finish()
    }
}

/// Table metadata, built once by the registry and shared read-only
#[derive(Debug, Clone)]
pub struct TableMetadata {
    pub name: String,
    /// Column definitions (declaration order)
    pub columns: Vec<(String, Column)>,
    /// Primary key columns (declaration order)
    pub primary_key: Vec<String>,
}

impl TableMetadata {
    pub fn new(name: String, columns: Vec<(String, Column)>) -> Self {
        let primary_key = columns
            .iter()
            .filter(|(_, c)| c.primary_key)
            .map(|(n, _)| n.clone())
            .collect();

        Self {
            name,
            columns,
            primary_key,
        }
    }

    /// Get column by name
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|(n, _)| n == name).map(|(_, c)| c)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(n, _)| n.as_str())
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn has_composite_key(&self) -> bool {
        self.primary_key.len() > 1
    }

    /// The key column when the table has a single-column autoincrement key
    pub fn autoincrement_key(&self) -> Option<&str> {
        match self.primary_key.as_slice() {
            [key] if self.column(key).map_or(false, |c| c.autoincrement) => Some(key.as_str()),
            _ => None,
        }
    }

    pub fn analyzed_columns(&self) -> impl Iterator<Item = &str> {
        self.columns
            .iter()
            .filter(|(_, c)| c.analyzed)
            .map(|(n, _)| n.as_str())
    }

    pub fn is_analyzed(&self) -> bool {
        self.columns.iter().any(|(_, c)| c.analyzed)
    }

    /// Shadow full-text table name, when any column is analyzed
    pub fn fts_table_name(&self) -> Option<String> {
        self.is_analyzed()
            .then(|| format!("{}{}", FTS_TABLE_PREFIX, self.name))
    }

    /// Columns carried by the shadow table: key columns, then analyzed ones
    pub fn fts_columns(&self) -> Vec<&str> {
        let mut cols: Vec<&str> = self.primary_key.iter().map(|s| s.as_str()).collect();
        for name in self.analyzed_columns() {
            if !cols.contains(&name) {
                cols.push(name);
            }
        }
        cols
    }
}
