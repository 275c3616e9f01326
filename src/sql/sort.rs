/// Sort specification and `ORDER BY` compilation
use super::criteria::qualify;
use crate::error::{MiniDbError, Result};
use crate::types::TableMetadata;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

impl FromStr for SortDirection {
    type Err = MiniDbError;

    /// Only the exact upper-case keywords are accepted
    fn from_str(s: &str) -> Result<Self> {
        match s {
            "ASC" => Ok(SortDirection::Asc),
            "DESC" => Ok(SortDirection::Desc),
            other => Err(MiniDbError::InvalidQuery(format!(
                "invalid sort direction `{}`, expected `ASC` or `DESC`",
                other
            ))),
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// Ordered `(column, direction)` pairs
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SortSpec {
    pairs: Vec<(String, SortDirection)>,
}

impl SortSpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from textual pairs such as `[("first_name", "ASC")]`
    pub fn parse<C: AsRef<str>, D: AsRef<str>>(pairs: &[(C, D)]) -> Result<Self> {
        let pairs = pairs
            .iter()
            .map(|(c, d)| {
                let direction = d.as_ref().parse::<SortDirection>()?;
                Ok((c.as_ref().to_string(), direction))
            })
            .collect::<Result<Vec<(String, SortDirection)>>>()?;
        Ok(Self { pairs })
    }

    pub fn asc(mut self, column: impl Into<String>) -> Self {
        self.pairs.push((column.into(), SortDirection::Asc));
        self
    }

    pub fn desc(mut self, column: impl Into<String>) -> Self {
        self.pairs.push((column.into(), SortDirection::Desc));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, SortDirection)> {
        self.pairs.iter().map(|(c, d)| (c.as_str(), *d))
    }
}

/// Compile to the body of an `ORDER BY` clause, pairs kept in order
pub fn compile_sort(sort: &SortSpec, table: &TableMetadata, alias: Option<&str>) -> Result<String> {
    if sort.is_empty() {
        return Err(MiniDbError::InvalidQuery("`sort` cannot be empty".to_string()));
    }

    let mut parts = Vec::with_capacity(sort.pairs.len());
    for (column, direction) in sort.iter() {
        if !table.has_column(column) {
            return Err(MiniDbError::UnknownColumn {
                table: table.name.clone(),
                column: column.to_string(),
            });
        }
        parts.push(format!("{} {}", qualify(column, alias), direction));
    }
    Ok(parts.join(", "))
}
