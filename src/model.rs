//! Typed models
//!
//! A model is a plain struct whose fields mirror a table's columns. Every
//! field is an `Option`, with `None` standing for "unset/null", so
//! `Default::default()` is the empty record. [`define_model!`] writes both
//! the struct and its [`Model`] impl.

use crate::error::{MiniDbError, Result};
use crate::types::{Column, TableMetadata, Value};
use std::marker::PhantomData;
use std::ops::Deref;
use std::sync::Arc;

/// A record type bound to one table
pub trait Model: Default + Sized {
    /// Table name
    const TABLE: &'static str;

    /// Column declarations in declaration order
    fn columns() -> Vec<(&'static str, Column)>;

    /// Current value of a column (`Value::Null` when unset)
    fn get(&self, column: &str) -> Value;

    /// Assign a column from a decoded value
    fn set(&mut self, column: &str, value: Value) -> Result<()>;
}

/// Typed handle to a registered table
///
/// Obtained from [`crate::ModelMetadata::table`]; borrows nothing, the
/// metadata itself is shared.
pub struct Table<M> {
    metadata: Arc<TableMetadata>,
    _model: PhantomData<fn() -> M>,
}

impl<M: Model> Table<M> {
    pub(crate) fn new(metadata: Arc<TableMetadata>) -> Result<Self> {
        if metadata.name != M::TABLE {
            return Err(MiniDbError::InvalidArgument(format!(
                "table `{}` cannot hold models of table `{}`",
                metadata.name,
                M::TABLE
            )));
        }
        Ok(Self {
            metadata,
            _model: PhantomData,
        })
    }

    pub fn metadata(&self) -> &Arc<TableMetadata> {
        &self.metadata
    }
}

impl<M> Clone for Table<M> {
    fn clone(&self) -> Self {
        Self {
            metadata: Arc::clone(&self.metadata),
            _model: PhantomData,
        }
    }
}

impl<M> Deref for Table<M> {
    type Target = TableMetadata;

    fn deref(&self) -> &TableMetadata {
        &self.metadata
    }
}

impl<M> std::fmt::Debug for Table<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Table").field(&self.metadata.name).finish()
    }
}

/// Primary key value used by `find_one` / `remove`
#[derive(Debug, Clone, PartialEq)]
pub enum Key {
    Single(Value),
    /// One `(column, value)` pair per key column
    Composite(Vec<(String, Value)>),
}

impl Key {
    pub fn composite<K, V>(parts: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        Key::Composite(parts.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }

    /// Key taken from a model's current primary-key attributes
    pub fn of<M: Model>(model: &M, table: &TableMetadata) -> Self {
        match table.primary_key.as_slice() {
            [single] => Key::Single(model.get(single)),
            cols => Key::Composite(cols.iter().map(|c| (c.clone(), model.get(c))).collect()),
        }
    }
}

impl From<Value> for Key {
    fn from(v: Value) -> Self {
        Key::Single(v)
    }
}

impl From<i64> for Key {
    fn from(v: i64) -> Self {
        Key::Single(Value::Integer(v))
    }
}

impl From<&str> for Key {
    fn from(v: &str) -> Self {
        Key::Single(Value::from(v))
    }
}

impl From<String> for Key {
    fn from(v: String) -> Self {
        Key::Single(Value::Text(v))
    }
}

/// Untyped result row of a raw query
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    values: Vec<(String, Value)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, column: impl Into<String>, value: Value) {
        self.values.push((column.into(), value));
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.values.iter().find(|(c, _)| c == column).map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(c, v)| (c.as_str(), v))
    }
}

/// Declare a model struct and its [`Model`] impl
///
/// # Example
/// ```
/// use minidb::{define_model, Column, Model};
///
/// define_model! {
///     /// A person
///     pub struct Person in "person" {
///         id: i64 => Column::integer().primary_key().autoincrement(),
///         name: String => Column::string(),
///         email: String => Column::string().nullable(),
///     }
/// }
///
/// let p = Person { name: Some("Ada".into()), ..Default::default() };
/// assert_eq!(Person::TABLE, "person");
/// assert!(p.id.is_none());
/// ```
#[macro_export]
macro_rules! define_model {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident in $table:literal {
            $( $(#[$fmeta:meta])* $field:ident : $ty:ty => $column:expr ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq)]
        $vis struct $name {
            $( $(#[$fmeta])* pub $field: ::std::option::Option<$ty>, )*
        }

        impl $crate::Model for $name {
            const TABLE: &'static str = $table;

            fn columns() -> ::std::vec::Vec<(&'static str, $crate::Column)> {
                ::std::vec![ $( (stringify!($field), $column) ),* ]
            }

            fn get(&self, column: &str) -> $crate::Value {
                $(
                    if column == stringify!($field) {
                        return $crate::Value::from(self.$field.clone());
                    }
                )*
                $crate::Value::Null
            }

            fn set(&mut self, column: &str, value: $crate::Value) -> $crate::Result<()> {
                $(
                    if column == stringify!($field) {
                        self.$field = <::std::option::Option<$ty> as $crate::FromValue>::from_value(value)?;
                        return Ok(());
                    }
                )*
                let _ = value;
                Err($crate::MiniDbError::UnknownColumn {
                    table: $table.to_string(),
                    column: column.to_string(),
                })
            }
        }
    };
}
