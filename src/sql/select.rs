/// `SELECT` / `COUNT` statement assembly for the plain (non full-text) path
use super::criteria::{compile_criteria, Criteria, PartitionKey, SqlFragment};
use super::fulltext;
use super::pagination::Page;
use super::sort::{compile_sort, SortSpec};
use crate::error::Result;
use crate::types::TableMetadata;
use rusqlite::types::Value as SqlValue;

/// Parameters shared by `count`, `find` and `search`
///
/// # Example
/// ```
/// use minidb::{Criteria, FindOptions, SortSpec};
///
/// let opts = FindOptions::new()
///     .criteria(Criteria::new().eq("state", "active"))
///     .sort(SortSpec::new().asc("first_name"))
///     .limit(50);
/// assert_eq!(opts.limit, Some(50));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindOptions {
    pub criteria: Option<Criteria>,
    pub sort: Option<SortSpec>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    pub partition_key: Option<PartitionKey>,
    /// Free-text term; switches to the full-text path
    pub term: Option<String>,
}

impl FindOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn criteria(mut self, criteria: Criteria) -> Self {
        self.criteria = Some(criteria);
        self
    }

    pub fn sort(mut self, sort: SortSpec) -> Self {
        self.sort = Some(sort);
        self
    }

    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: i64) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn partition_key(mut self, partition_key: PartitionKey) -> Self {
        self.partition_key = Some(partition_key);
        self
    }

    pub fn term(mut self, term: impl Into<String>) -> Self {
        self.term = Some(term.into());
        self
    }
}

pub(crate) fn select_columns(table: &TableMetadata, alias: Option<&str>) -> String {
    table
        .column_names()
        .map(|c| super::criteria::qualify(c, alias))
        .collect::<Vec<_>>()
        .join(", ")
}

/// `SELECT COUNT(*)` honoring criteria, partition key and term
pub fn build_count(table: &TableMetadata, opts: &FindOptions) -> Result<SqlFragment> {
    if let Some(term) = opts.term.as_deref() {
        return fulltext::build_count(table, opts, term);
    }

    let mut sql = format!("SELECT COUNT(*) FROM {}", table.name);
    let mut params = Vec::new();
    if let Some(filter) =
        compile_criteria(opts.criteria.as_ref(), opts.partition_key.as_ref(), table, None)?
    {
        sql.push_str(" WHERE ");
        sql.push_str(&filter.sql);
        params = filter.params;
    }
    Ok(SqlFragment { sql, params })
}

/// Paged `SELECT` of every column, in declaration order
pub fn build_find(table: &TableMetadata, opts: &FindOptions, page: Page) -> Result<SqlFragment> {
    if let Some(term) = opts.term.as_deref() {
        return fulltext::build_find(table, opts, term, page);
    }

    let mut sql = format!("SELECT {} FROM {}", select_columns(table, None), table.name);
    let mut params = Vec::new();
    if let Some(filter) =
        compile_criteria(opts.criteria.as_ref(), opts.partition_key.as_ref(), table, None)?
    {
        sql.push_str(" WHERE ");
        sql.push_str(&filter.sql);
        params = filter.params;
    }
    if let Some(sort) = opts.sort.as_ref() {
        sql.push_str(" ORDER BY ");
        sql.push_str(&compile_sort(sort, table, None)?);
    }
    push_page(&mut sql, &mut params, page);
    Ok(SqlFragment { sql, params })
}

/// `SELECT` of one row by exact criteria (no paging)
pub fn build_find_one(table: &TableMetadata, criteria: &Criteria) -> Result<SqlFragment> {
    let mut sql = format!("SELECT {} FROM {}", select_columns(table, None), table.name);
    let mut params = Vec::new();
    if let Some(filter) = compile_criteria(Some(criteria), None, table, None)? {
        sql.push_str(" WHERE ");
        sql.push_str(&filter.sql);
        params = filter.params;
    }
    sql.push_str(" LIMIT 1");
    Ok(SqlFragment { sql, params })
}

pub(crate) fn push_page(sql: &mut String, params: &mut Vec<SqlValue>, page: Page) {
    sql.push_str(" LIMIT ? OFFSET ?");
    params.push(SqlValue::Integer(page.limit));
    params.push(SqlValue::Integer(page.offset));
}
