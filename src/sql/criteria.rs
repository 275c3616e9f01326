//! Criteria compiler
//!
//! Turns structured criteria and partition keys into a parameterized
//! `WHERE` fragment. Plain keys compile to equality, keys starting with
//! [`OPERATOR_SIGIL`] dispatch to a comparison [`Operator`] whose argument
//! list is `[column, operand...]`.
//!
//! ```
//! use minidb::{compile_criteria, Column, Criteria, Operator, TableMetadata};
//!
//! let table = TableMetadata::new(
//!     "person".to_string(),
//!     vec![
//!         ("id".to_string(), Column::integer().primary_key()),
//!         ("state".to_string(), Column::string()),
//!     ],
//! );
//! let criteria = Criteria::new().eq("state", "active").op(Operator::Gt, "id", 10);
//! let fragment = compile_criteria(Some(&criteria), None, &table, None)?.unwrap();
//! assert_eq!(fragment.sql, "(state = ? AND id > ?)");
//! assert_eq!(fragment.params.len(), 2);
//! # Ok::<(), minidb::MiniDbError>(())
//! ```

use crate::error::{MiniDbError, Result};
use crate::sql::row_converter::encode;
use crate::types::{TableMetadata, Value};
use rusqlite::types::Value as SqlValue;
use std::fmt;

/// Reserved prefix of operator keys (`$gt`, `$in`, ...)
pub const OPERATOR_SIGIL: char = '$';

/// Comparison operator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Eq,  // =
    Ne,  // <>
    Gt,  // >
    Gte, // >=
    Lt,  // <
    Lte, // <=
    In,  // IN (...)
}

impl Operator {
    /// Look up an operator by name, without the sigil
    pub fn parse(name: &str) -> Result<Self> {
        match name {
            "eq" => Ok(Operator::Eq),
            "ne" => Ok(Operator::Ne),
            "gt" => Ok(Operator::Gt),
            "gte" => Ok(Operator::Gte),
            "lt" => Ok(Operator::Lt),
            "lte" => Ok(Operator::Lte),
            "in" => Ok(Operator::In),
            other => Err(MiniDbError::InvalidQuery(format!(
                "invalid operator: `{}`",
                other
            ))),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Operator::Eq => "eq",
            Operator::Ne => "ne",
            Operator::Gt => "gt",
            Operator::Gte => "gte",
            Operator::Lt => "lt",
            Operator::Lte => "lte",
            Operator::In => "in",
        }
    }

    /// Criteria key for this operator (`$gt`)
    pub fn key(&self) -> String {
        format!("{}{}", OPERATOR_SIGIL, self.name())
    }

    fn symbol(&self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::Ne => "<>",
            Operator::Gt => ">",
            Operator::Gte => ">=",
            Operator::Lt => "<",
            Operator::Lte => "<=",
            Operator::In => "IN",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Right-hand side of a criteria entry
#[derive(Debug, Clone, PartialEq)]
pub enum CriteriaValue {
    Scalar(Value),
    List(Vec<Value>),
}

impl CriteriaValue {
    fn into_args(self) -> Vec<Value> {
        match self {
            CriteriaValue::Scalar(v) => vec![v],
            CriteriaValue::List(vs) => vs,
        }
    }
}

impl From<Value> for CriteriaValue {
    fn from(v: Value) -> Self {
        CriteriaValue::Scalar(v)
    }
}

impl From<Vec<Value>> for CriteriaValue {
    fn from(vs: Vec<Value>) -> Self {
        CriteriaValue::List(vs)
    }
}

/// Ordered criteria mapping; inserting an existing key replaces its value
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Criteria {
    entries: Vec<(String, CriteriaValue)>,
}

impl Criteria {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<CriteriaValue>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    /// `column = value`
    pub fn eq(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(column, CriteriaValue::Scalar(value.into()));
        self
    }

    /// `$op: [column, operand]`
    pub fn op(mut self, op: Operator, column: impl Into<String>, operand: impl Into<Value>) -> Self {
        self.insert(
            op.key(),
            CriteriaValue::List(vec![Value::Text(column.into()), operand.into()]),
        );
        self
    }

    /// `$in: [column, values...]`
    pub fn one_of<V: Into<Value>>(
        mut self,
        column: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        let mut args = vec![Value::Text(column.into())];
        args.extend(values.into_iter().map(Into::into));
        self.insert(Operator::In.key(), CriteriaValue::List(args));
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CriteriaValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Criteria {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        let mut criteria = Criteria::new();
        for (k, v) in iter {
            criteria.insert(k, CriteriaValue::Scalar(v));
        }
        criteria
    }
}

/// Tenant/shard scoping attributes, always ANDed as equality conjuncts
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PartitionKey {
    attributes: Vec<(String, Value)>,
}

impl PartitionKey {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        let column = column.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|(c, _)| *c == column) {
            Some(entry) => entry.1 = value,
            None => self.attributes.push((column, value)),
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.attributes.iter().map(|(c, v)| (c.as_str(), v))
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.attributes.iter().find(|(c, _)| c == column).map(|(_, v)| v)
    }
}

/// SQL text plus its bound parameters, in placeholder order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SqlFragment {
    pub sql: String,
    pub params: Vec<SqlValue>,
}

/// Accumulates conjuncts; rendered as one AND-group
#[derive(Debug, Default)]
pub(crate) struct Conjuncts {
    parts: Vec<String>,
    params: Vec<SqlValue>,
}

impl Conjuncts {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, sql: String, params: impl IntoIterator<Item = SqlValue>) {
        self.parts.push(sql);
        self.params.extend(params);
    }

    /// Parts joined with AND; parenthesized only when there is more than one
    pub(crate) fn into_fragment(self) -> Option<SqlFragment> {
        let sql = match self.parts.len() {
            0 => return None,
            1 => self.parts.into_iter().next().unwrap_or_default(),
            _ => format!("({})", self.parts.join(" AND ")),
        };
        Some(SqlFragment {
            sql,
            params: self.params,
        })
    }

    /// Parts and params without grouping, for callers that join further
    pub(crate) fn into_parts(self) -> (Vec<String>, Vec<SqlValue>) {
        (self.parts, self.params)
    }
}

pub(crate) fn qualify(column: &str, alias: Option<&str>) -> String {
    match alias {
        Some(a) => format!("{}.{}", a, column),
        None => column.to_string(),
    }
}

fn check_column(table: &TableMetadata, column: &str) -> Result<crate::types::ColumnType> {
    table
        .column(column)
        .map(|c| c.column_type)
        .ok_or_else(|| MiniDbError::UnknownColumn {
            table: table.name.clone(),
            column: column.to_string(),
        })
}

fn push_equality(
    out: &mut Conjuncts,
    table: &TableMetadata,
    column: &str,
    value: &Value,
    alias: Option<&str>,
) -> Result<()> {
    let column_type = check_column(table, column)?;
    let target = qualify(column, alias);
    if value.is_null() {
        out.push(format!("{} IS NULL", target), None::<SqlValue>);
    } else {
        out.push(format!("{} = ?", target), Some(encode(value, column_type)));
    }
    Ok(())
}

fn push_operator(
    out: &mut Conjuncts,
    table: &TableMetadata,
    op: Operator,
    args: Vec<Value>,
    alias: Option<&str>,
) -> Result<()> {
    let mut args = args.into_iter();
    let column = match args.next() {
        Some(Value::Text(c)) => c,
        _ => {
            return Err(MiniDbError::InvalidQuery(format!(
                "`{}` expects a column name as its first argument",
                op.key()
            )))
        }
    };
    let column_type = check_column(table, &column)?;
    let operands: Vec<Value> = args.collect();
    let target = qualify(&column, alias);

    match op {
        Operator::In => {
            if operands.is_empty() {
                return Err(MiniDbError::InvalidQuery(format!(
                    "`{}` on `{}` needs at least one value",
                    op.key(),
                    column
                )));
            }
            let placeholders = vec!["?"; operands.len()].join(", ");
            out.push(
                format!("{} IN ({})", target, placeholders),
                operands.iter().map(|v| encode(v, column_type)),
            );
        }
        _ => {
            let operand = match operands.as_slice() {
                [v] => v,
                _ => {
                    return Err(MiniDbError::InvalidQuery(format!(
                        "`{}` on `{}` takes exactly one value, got {}",
                        op.key(),
                        column,
                        operands.len()
                    )))
                }
            };
            match (op, operand.is_null()) {
                (Operator::Eq, true) => out.push(format!("{} IS NULL", target), None::<SqlValue>),
                (Operator::Ne, true) => out.push(format!("{} IS NOT NULL", target), None::<SqlValue>),
                (_, true) => {
                    return Err(MiniDbError::InvalidQuery(format!(
                        "`{}` on `{}` cannot compare against null",
                        op.key(),
                        column
                    )))
                }
                (_, false) => out.push(
                    format!("{} {} ?", target, op.symbol()),
                    Some(encode(operand, column_type)),
                ),
            }
        }
    }
    Ok(())
}

/// Append the criteria conjuncts; empty criteria are rejected
pub(crate) fn push_criteria(
    out: &mut Conjuncts,
    criteria: &Criteria,
    table: &TableMetadata,
    alias: Option<&str>,
) -> Result<()> {
    if criteria.is_empty() {
        return Err(MiniDbError::InvalidQuery("`criteria` cannot be empty".to_string()));
    }

    for (key, value) in criteria.iter() {
        match key.strip_prefix(OPERATOR_SIGIL) {
            Some(name) => {
                let op = Operator::parse(name)?;
                push_operator(out, table, op, value.clone().into_args(), alias)?;
            }
            None => match value {
                CriteriaValue::Scalar(v) => push_equality(out, table, key, v, alias)?,
                CriteriaValue::List(_) => {
                    return Err(MiniDbError::InvalidQuery(format!(
                        "`{}`: list values need an operator such as `{}`",
                        key,
                        Operator::In.key()
                    )))
                }
            },
        }
    }
    Ok(())
}

/// Append one equality conjunct per partition attribute
pub(crate) fn push_partition(
    out: &mut Conjuncts,
    partition_key: &PartitionKey,
    table: &TableMetadata,
    alias: Option<&str>,
) -> Result<()> {
    for (column, value) in partition_key.iter() {
        push_equality(out, table, column, value, alias)?;
    }
    Ok(())
}

/// Compile criteria and partition key into one `WHERE` fragment
///
/// Partition conjuncts come first. Returns `None` when there is nothing to
/// filter on; `Some(empty criteria)` is an error rather than "match all".
pub fn compile_criteria(
    criteria: Option<&Criteria>,
    partition_key: Option<&PartitionKey>,
    table: &TableMetadata,
    alias: Option<&str>,
) -> Result<Option<SqlFragment>> {
    let mut out = Conjuncts::new();
    if let Some(pk) = partition_key {
        push_partition(&mut out, pk, table, alias)?;
    }
    if let Some(c) = criteria {
        push_criteria(&mut out, c, table, alias)?;
    }
    Ok(out.into_fragment())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Column;
    use chrono::{TimeZone, Utc};
    use proptest::prelude::*;

    fn person() -> TableMetadata {
        TableMetadata::new(
            "person".to_string(),
            vec![
                ("id".to_string(), Column::string().primary_key()),
                ("tenant".to_string(), Column::string()),
                ("state".to_string(), Column::string()),
                ("age".to_string(), Column::integer().nullable()),
                ("created_on".to_string(), Column::date()),
            ],
        )
    }

    #[test]
    fn test_single_conjunct_is_bare() {
        let c = Criteria::new().eq("state", "active");
        let f = compile_criteria(Some(&c), None, &person(), None).unwrap().unwrap();
        assert_eq!(f.sql, "state = ?");
        assert_eq!(f.params, vec![SqlValue::Text("active".into())]);
    }

    #[test]
    fn test_multiple_conjuncts_grouped() {
        let c = Criteria::new().eq("state", "active").eq("age", 30);
        let f = compile_criteria(Some(&c), None, &person(), Some("b")).unwrap().unwrap();
        assert_eq!(f.sql, "(b.state = ? AND b.age = ?)");
        assert_eq!(f.params.len(), 2);
    }

    #[test]
    fn test_empty_criteria_rejected() {
        let err = compile_criteria(Some(&Criteria::new()), None, &person(), None).unwrap_err();
        assert!(matches!(err, MiniDbError::InvalidQuery(_)));
    }

    #[test]
    fn test_no_filter() {
        assert_eq!(compile_criteria(None, None, &person(), None).unwrap(), None);
    }

    #[test]
    fn test_partition_key_anded_first() {
        let pk = PartitionKey::new().with("tenant", "acme");
        let c = Criteria::new().eq("state", "active");
        let f = compile_criteria(Some(&c), Some(&pk), &person(), None).unwrap().unwrap();
        assert_eq!(f.sql, "(tenant = ? AND state = ?)");
        assert_eq!(
            f.params,
            vec![SqlValue::Text("acme".into()), SqlValue::Text("active".into())]
        );

        let f = compile_criteria(None, Some(&pk), &person(), None).unwrap().unwrap();
        assert_eq!(f.sql, "tenant = ?");
    }

    #[test]
    fn test_dates_are_encoded_before_binding() {
        let d = Utc.with_ymd_and_hms(2020, 3, 26, 15, 48, 8).unwrap();
        let c = Criteria::new().op(Operator::Gte, "created_on", d);
        let f = compile_criteria(Some(&c), None, &person(), None).unwrap().unwrap();
        assert_eq!(f.sql, "created_on >= ?");
        assert_eq!(f.params, vec![SqlValue::Integer(1_585_237_688)]);
    }

    #[test]
    fn test_operators() {
        let t = person();
        for (op, sql) in [
            (Operator::Eq, "age = ?"),
            (Operator::Ne, "age <> ?"),
            (Operator::Gt, "age > ?"),
            (Operator::Gte, "age >= ?"),
            (Operator::Lt, "age < ?"),
            (Operator::Lte, "age <= ?"),
        ] {
            let c = Criteria::new().op(op, "age", 40);
            let f = compile_criteria(Some(&c), None, &t, None).unwrap().unwrap();
            assert_eq!(f.sql, sql);
            assert_eq!(f.params, vec![SqlValue::Integer(40)]);
        }
    }

    #[test]
    fn test_in_operator() {
        let c = Criteria::new().one_of("state", ["active", "locked"]);
        let f = compile_criteria(Some(&c), None, &person(), None).unwrap().unwrap();
        assert_eq!(f.sql, "state IN (?, ?)");
        assert_eq!(f.params.len(), 2);

        let c = Criteria::new().one_of("state", Vec::<Value>::new());
        assert!(compile_criteria(Some(&c), None, &person(), None).is_err());
    }

    #[test]
    fn test_null_comparisons() {
        let c = Criteria::new().eq("age", Value::Null);
        let f = compile_criteria(Some(&c), None, &person(), None).unwrap().unwrap();
        assert_eq!(f.sql, "age IS NULL");
        assert!(f.params.is_empty());

        let c = Criteria::new().op(Operator::Ne, "age", Value::Null);
        let f = compile_criteria(Some(&c), None, &person(), None).unwrap().unwrap();
        assert_eq!(f.sql, "age IS NOT NULL");

        let c = Criteria::new().op(Operator::Gt, "age", Value::Null);
        assert!(compile_criteria(Some(&c), None, &person(), None).is_err());
    }

    #[test]
    fn test_unknown_operator() {
        let mut c = Criteria::new();
        c.insert("$like", vec![Value::from("state"), Value::from("a%")]);
        let err = compile_criteria(Some(&c), None, &person(), None).unwrap_err();
        assert!(matches!(err, MiniDbError::InvalidQuery(_)));
    }

    #[test]
    fn test_operator_arity() {
        let mut c = Criteria::new();
        c.insert("$gt", vec![Value::from("age"), Value::from(1), Value::from(2)]);
        assert!(compile_criteria(Some(&c), None, &person(), None).is_err());

        let mut c = Criteria::new();
        c.insert("$gt", Value::from(5));
        assert!(compile_criteria(Some(&c), None, &person(), None).is_err());
    }

    #[test]
    fn test_unknown_column() {
        let c = Criteria::new().eq("nope", 1);
        let err = compile_criteria(Some(&c), None, &person(), None).unwrap_err();
        assert!(matches!(err, MiniDbError::UnknownColumn { .. }));

        let pk = PartitionKey::new().with("nope", 1);
        assert!(compile_criteria(None, Some(&pk), &person(), None).is_err());
    }

    #[test]
    fn test_insert_replaces_key() {
        let c = Criteria::new().eq("state", "a").eq("state", "b");
        assert_eq!(c.len(), 1);
        let f = compile_criteria(Some(&c), None, &person(), None).unwrap().unwrap();
        assert_eq!(f.params, vec![SqlValue::Text("b".into())]);
    }

    fn arb_entry() -> impl Strategy<Value = (String, CriteriaValue)> {
        prop_oneof![
            "[a-z]{0,8}".prop_map(|s| ("state".to_string(), CriteriaValue::Scalar(Value::Text(s)))),
            any::<i64>().prop_map(|i| ("age".to_string(), CriteriaValue::Scalar(Value::Integer(i)))),
            Just(("age".to_string(), CriteriaValue::Scalar(Value::Null))),
            (0usize..5, prop::sample::select(vec!["$gt", "$gte", "$lt", "$lte", "$ne", "$eq"]))
                .prop_map(|(n, key)| {
                    (key.to_string(), CriteriaValue::List(vec![Value::from("age"), Value::Integer(n as i64)]))
                }),
            prop::collection::vec("[a-z]{1,4}", 1..6).prop_map(|vals| {
                let mut args = vec![Value::from("tenant")];
                args.extend(vals.into_iter().map(Value::Text));
                ("$in".to_string(), CriteriaValue::List(args))
            }),
        ]
    }

    proptest! {
        #[test]
        fn prop_placeholders_match_params(
            entries in prop::collection::vec(arb_entry(), 1..8),
            tenant in proptest::option::of("[a-z]{1,6}"),
        ) {
            let mut criteria = Criteria::new();
            for (k, v) in entries {
                criteria.insert(k, v);
            }
            let pk = tenant.map(|t| PartitionKey::new().with("tenant", t));
            let fragment = compile_criteria(Some(&criteria), pk.as_ref(), &person(), Some("b"))
                .unwrap()
                .unwrap();
            prop_assert_eq!(fragment.sql.matches('?').count(), fragment.params.len());
        }
    }
}
