//! CRUD Operations
//!
//! Typed add/update/remove/find over registered tables, the combined
//! count+find `search`, and raw statement passthrough.

use crate::database::core::SqliteDriver;
use crate::error::{MiniDbError, Result};
use crate::model::{Key, Model, Record, Table};
use crate::sql::criteria::compile_criteria;
use crate::sql::row_converter::{encode, encode_untyped, row_to_model, row_to_record};
use crate::sql::{build_count, build_find, build_find_one, Criteria, FindOptions, Page};
use crate::types::{TableMetadata, Value};
use rusqlite::types::Value as SqlValue;
use serde::Serialize;

/// One page of a `search`, plus the size of the whole filtered set
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryResponse<M> {
    pub data: Vec<M>,
    /// Rows matching the filter, ignoring paging
    pub total: i64,
    pub offset: i64,
    /// Effective limit
    pub page_size: i64,
}

/// Resolve generators and validate nullability
///
/// Autoincrement columns are skipped, and so are key columns when
/// `skip_keys` is set: an update never regenerates the row's identity. A
/// generator always wins over the caller's value and its result is written
/// back onto the model. Every non-nullable column left null is reported,
/// not just the first.
fn map_row<M: Model>(
    table: &TableMetadata,
    model: &mut M,
    skip_keys: bool,
) -> Result<Vec<(String, SqlValue)>> {
    let mut row = Vec::with_capacity(table.column_count());
    let mut invalid = Vec::new();

    for (name, column) in &table.columns {
        if column.autoincrement || (skip_keys && column.primary_key) {
            continue;
        }

        let value = match column.generator.as_ref() {
            Some(generator) => {
                let value = generator();
                model.set(name, value.clone())?;
                value
            }
            None => model.get(name),
        };

        if value.is_null() && !column.nullable {
            invalid.push(name.clone());
            continue;
        }
        row.push((name.clone(), encode(&value, column.column_type)));
    }

    if !invalid.is_empty() {
        return Err(MiniDbError::DataValidation {
            table: table.name.clone(),
            errors: invalid
                .iter()
                .map(|c| format!("Column `{}` is not nullable", c))
                .collect(),
            columns: invalid,
        });
    }
    Ok(row)
}

/// Equality criteria selecting exactly the row identified by `key`
fn key_criteria(table: &TableMetadata, key: &Key) -> Result<Criteria> {
    if table.primary_key.is_empty() {
        return Err(MiniDbError::InvalidQuery(format!(
            "table `{}` has no primary key",
            table.name
        )));
    }

    match key {
        Key::Single(value) => match table.primary_key.as_slice() {
            [column] => Ok(Criteria::new().eq(column.as_str(), value.clone())),
            columns => Err(MiniDbError::InvalidQuery(format!(
                "table `{}` needs a composite key ({})",
                table.name,
                columns.join(", ")
            ))),
        },
        Key::Composite(parts) => {
            if let Some((column, _)) = parts.iter().find(|(c, _)| !table.primary_key.contains(c)) {
                return Err(MiniDbError::InvalidQuery(format!(
                    "`{}` is not a key column of `{}`",
                    column, table.name
                )));
            }
            let mut criteria = Criteria::new();
            for column in &table.primary_key {
                let value = parts
                    .iter()
                    .find(|(c, _)| c == column)
                    .map(|(_, v)| v.clone())
                    .ok_or_else(|| {
                        MiniDbError::InvalidQuery(format!("key column `{}` is missing", column))
                    })?;
                criteria = criteria.eq(column.as_str(), value);
            }
            Ok(criteria)
        }
    }
}

impl SqliteDriver {
    // ==================== Mutations ====================

    /// Insert a model
    ///
    /// On a single autoincrement key table the generated id is written back
    /// onto `model`.
    ///
    /// # Example
    /// ```ignore
    /// let mut person = Person { first_name: Some("Ada".into()), ..Default::default() };
    /// driver.add(&people, &mut person)?;
    /// assert!(person.id.unwrap() > 0);
    /// ```
    pub fn add<M: Model>(&mut self, table: &Table<M>, model: &mut M) -> Result<()> {
        let row = map_row(table, model, false)?;

        let sql = if row.is_empty() {
            format!("INSERT INTO {} DEFAULT VALUES", table.name)
        } else {
            format!(
                "INSERT INTO {} ({}) VALUES ({})",
                table.name,
                row.iter().map(|(c, _)| c.as_str()).collect::<Vec<_>>().join(", "),
                vec!["?"; row.len()].join(", ")
            )
        };
        let params: Vec<SqlValue> = row.into_iter().map(|(_, v)| v).collect();
        self.run_execute(&sql, &params)?;

        if let Some(key) = table.autoincrement_key() {
            let id = self.last_insert_rowid()?;
            model.set(key, Value::Integer(id))?;
        }
        Ok(())
    }

    /// Update every non-key column of the row identified by the model's key
    ///
    /// Key columns are neither written nor regenerated. Zero affected rows
    /// is [`MiniDbError::UnaffectedRows`].
    pub fn update<M: Model>(&mut self, table: &Table<M>, model: &mut M) -> Result<()> {
        let criteria = key_criteria(table, &Key::of(&*model, table))?;
        let row = map_row(table, model, true)?;
        if row.is_empty() {
            return Err(MiniDbError::InvalidQuery(format!(
                "table `{}` has no non-key columns to update",
                table.name
            )));
        }

        let filter = compile_criteria(Some(&criteria), None, table, None)?.ok_or_else(|| {
            MiniDbError::InvalidQuery("update requires a key filter".to_string())
        })?;
        let sql = format!(
            "UPDATE {} SET {} WHERE {}",
            table.name,
            row.iter()
                .map(|(c, _)| format!("{} = ?", c))
                .collect::<Vec<_>>()
                .join(", "),
            filter.sql
        );
        let mut params: Vec<SqlValue> = row.into_iter().map(|(_, v)| v).collect();
        params.extend(filter.params);

        if self.run_execute(&sql, &params)? == 0 {
            return Err(MiniDbError::UnaffectedRows);
        }
        Ok(())
    }

    /// Delete the row identified by `key`, returning the number removed
    pub fn remove<M: Model>(&mut self, table: &Table<M>, key: impl Into<Key>) -> Result<usize> {
        let criteria = key_criteria(table, &key.into())?;
        let filter = compile_criteria(Some(&criteria), None, table, None)?.ok_or_else(|| {
            MiniDbError::InvalidQuery("remove requires a key filter".to_string())
        })?;
        let sql = format!("DELETE FROM {} WHERE {}", table.name, filter.sql);
        self.run_execute(&sql, &filter.params)
    }

    // ==================== Queries ====================

    pub fn find_one<M: Model>(&self, table: &Table<M>, key: impl Into<Key>) -> Result<Option<M>> {
        let criteria = key_criteria(table, &key.into())?;
        let statement = build_find_one(table, &criteria)?;
        let rows = self.run_query(&statement.sql, &statement.params, |row| {
            row_to_model::<M>(row, table)
        })?;
        Ok(rows.into_iter().next())
    }

    /// One page of models; `opts.term` switches to the full-text path
    pub fn find<M: Model>(&self, table: &Table<M>, opts: &FindOptions) -> Result<Vec<M>> {
        let page = Page::resolve(opts.limit, opts.offset, self.config.max_page_size)?;
        self.find_page(table, opts, page)
    }

    fn find_page<M: Model>(&self, table: &Table<M>, opts: &FindOptions, page: Page) -> Result<Vec<M>> {
        let statement = build_find(table, opts, page)?;
        self.run_query(&statement.sql, &statement.params, |row| {
            row_to_model::<M>(row, table)
        })
    }

    /// Rows matching the filter; paging options are ignored
    pub fn count<M: Model>(&self, table: &Table<M>, opts: &FindOptions) -> Result<i64> {
        let statement = build_count(table, opts)?;
        let counts = self.run_query(&statement.sql, &statement.params, |row| {
            Ok(row.get::<_, i64>(0)?)
        })?;
        Ok(counts.first().copied().unwrap_or(0))
    }

    /// Count and one page with identical filters
    ///
    /// An offset at or past the total yields an empty page, not an error.
    ///
    /// # Example
    /// ```ignore
    /// let opts = FindOptions::new().criteria(Criteria::new().eq("state", "active")).limit(1000);
    /// let page = driver.search(&people, &opts)?;
    /// assert_eq!(page.data.len() as i64, page.total.min(1000));
    /// ```
    pub fn search<M: Model>(&self, table: &Table<M>, opts: &FindOptions) -> Result<QueryResponse<M>> {
        let page = Page::resolve(opts.limit, opts.offset, self.config.max_page_size)?;
        let total = self.count(table, opts)?;
        let data = if page.offset >= total {
            Vec::new()
        } else {
            self.find_page(table, opts, page)?
        };

        Ok(QueryResponse {
            data,
            total,
            offset: page.offset,
            page_size: page.limit,
        })
    }

    // ==================== Raw statements ====================

    /// Run arbitrary SQL returning rows, decoded without column types
    pub fn query(&self, sql: &str, params: &[Value]) -> Result<Vec<Record>> {
        let params: Vec<SqlValue> = params.iter().map(encode_untyped).collect();
        let mut columns: Option<Vec<String>> = None;
        self.run_query(sql, &params, |row| {
            let names = columns.get_or_insert_with(|| {
                row.as_ref()
                    .column_names()
                    .into_iter()
                    .map(String::from)
                    .collect()
            });
            row_to_record(row, names)
        })
    }

    /// Run arbitrary SQL, returning the affected-row count
    ///
    /// Raw `BEGIN`/`COMMIT`/`ROLLBACK` are honored: the transaction flag is
    /// re-read from the engine afterwards.
    pub fn execute(&mut self, sql: &str, params: &[Value]) -> Result<usize> {
        let params: Vec<SqlValue> = params.iter().map(encode_untyped).collect();
        let result = self.run_execute(sql, &params);
        self.sync_transaction_flag()?;
        result
    }
}
