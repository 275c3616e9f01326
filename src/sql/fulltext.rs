//! Full-text query path
//!
//! The shadow table `fts_<table>` (alias `a`) is joined back to the primary
//! table (alias `b`) on the primary key:
//!
//! ```text
//! SELECT b.* FROM fts_t a INNER JOIN t b ON a.k = b.k [AND <criteria on b>]
//! WHERE [<partition on a> AND] a.fts_t MATCH ?
//! ORDER BY a.rank | <explicit sort on b>
//! ```
//!
//! The match predicate is always present. Partition columns must be carried
//! by the shadow table, which holds its own copy of the key columns.

use super::criteria::{push_criteria, push_partition, qualify, Conjuncts, SqlFragment};
use super::pagination::Page;
use super::select::{push_page, select_columns, FindOptions};
use super::sort::compile_sort;
use crate::error::{MiniDbError, Result};
use crate::types::TableMetadata;
use rusqlite::types::Value as SqlValue;

const FTS_ALIAS: &str = "a";
const TABLE_ALIAS: &str = "b";

/// `FROM ... JOIN ... ON ... WHERE ...` shared by count and find
fn from_clause(table: &TableMetadata, opts: &FindOptions, term: &str) -> Result<SqlFragment> {
    let fts_table = table.fts_table_name().ok_or_else(|| {
        MiniDbError::InvalidQuery(format!(
            "table `{}` has no analyzed columns to search",
            table.name
        ))
    })?;
    if term.trim().is_empty() {
        return Err(MiniDbError::InvalidQuery("`term` cannot be empty".to_string()));
    }

    // ON: key equality, then the caller's criteria against the primary table
    let mut join_on: Vec<String> = table
        .primary_key
        .iter()
        .map(|k| format!("{} = {}", qualify(k, Some(FTS_ALIAS)), qualify(k, Some(TABLE_ALIAS))))
        .collect();
    let mut params: Vec<SqlValue> = Vec::new();
    if let Some(criteria) = opts.criteria.as_ref() {
        let mut c = Conjuncts::new();
        push_criteria(&mut c, criteria, table, Some(TABLE_ALIAS))?;
        if let Some(fragment) = c.into_fragment() {
            join_on.push(fragment.sql);
            params.extend(fragment.params);
        }
    }

    // WHERE: partition key against the shadow table, then the match
    let mut filter = Conjuncts::new();
    if let Some(pk) = opts.partition_key.as_ref() {
        let carried = table.fts_columns();
        if let Some((column, _)) = pk.iter().find(|(c, _)| !carried.contains(c)) {
            return Err(MiniDbError::InvalidQuery(format!(
                "partition column `{}` is not carried by `{}`",
                column, fts_table
            )));
        }
        push_partition(&mut filter, pk, table, Some(FTS_ALIAS))?;
    }
    filter.push(
        format!("{} MATCH ?", qualify(&fts_table, Some(FTS_ALIAS))),
        Some(SqlValue::Text(term.to_string())),
    );
    let (where_parts, where_params) = filter.into_parts();
    params.extend(where_params);

    let sql = format!(
        "FROM {} {} INNER JOIN {} {} ON {} WHERE {}",
        fts_table,
        FTS_ALIAS,
        table.name,
        TABLE_ALIAS,
        join_on.join(" AND "),
        where_parts.join(" AND ")
    );
    Ok(SqlFragment { sql, params })
}

pub fn build_count(table: &TableMetadata, opts: &FindOptions, term: &str) -> Result<SqlFragment> {
    let from = from_clause(table, opts, term)?;
    Ok(SqlFragment {
        sql: format!("SELECT COUNT(*) {}", from.sql),
        params: from.params,
    })
}

/// An explicit sort replaces rank ordering entirely
pub fn build_find(
    table: &TableMetadata,
    opts: &FindOptions,
    term: &str,
    page: Page,
) -> Result<SqlFragment> {
    let from = from_clause(table, opts, term)?;
    let order_by = match opts.sort.as_ref() {
        Some(sort) => compile_sort(sort, table, Some(TABLE_ALIAS))?,
        None => qualify("rank", Some(FTS_ALIAS)),
    };

    let mut sql = format!(
        "SELECT {} {} ORDER BY {}",
        select_columns(table, Some(TABLE_ALIAS)),
        from.sql,
        order_by
    );
    let mut params = from.params;
    push_page(&mut sql, &mut params, page);
    Ok(SqlFragment { sql, params })
}
