/// minidb SQL layer
///
/// Everything here is pure statement assembly: it turns table metadata and
/// query options into SQL text plus positional parameters. Nothing in this
/// module touches a connection.
///
/// Layout:
/// - criteria: equality/operator filters and partition keys
/// - sort / pagination: `ORDER BY` and `LIMIT ? OFFSET ?`
/// - select / fulltext: count and find statements, plain or joined to the FTS table
/// - ddl: `CREATE TABLE`, FTS virtual table and sync triggers
/// - row_converter: value encoding between models and SQLite

pub mod criteria;
pub mod ddl;
pub mod fulltext;
pub mod pagination;
pub mod row_converter;
pub mod select;
pub mod sort;

pub use criteria::{
    compile_criteria, Criteria, CriteriaValue, Operator, PartitionKey, SqlFragment,
    OPERATOR_SIGIL,
};
pub use ddl::{create_statements, create_table_sql, fts_statements};
pub use pagination::Page;
pub use row_converter::{
    decode, decode_untyped, encode, encode_untyped, row_to_model, row_to_record,
};
pub use select::{build_count, build_find, build_find_one, FindOptions};
pub use sort::{compile_sort, SortDirection, SortSpec};

/// Positional parameter as handed to the engine
pub use rusqlite::types::Value as SqlValue;
