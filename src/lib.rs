//! minidb
//!
//! 基于 SQLite 的轻量级 ORM: declarative table schemas, structured queries
//! compiled to parameterized SQL, and typed models mapped back from rows.
//!
//! ## 核心特性
//! - Typed models via [`define_model!`], validated once by [`ModelRegistry`]
//! - Criteria with operators (`$gt`, `$in`, ...), partition keys, sort and paging
//! - Full-text search through an FTS5 shadow table kept in sync by triggers
//! - Dates stored as epoch seconds (sub-second precision is dropped)
//!
//! ## 架构
//! - 模型层: `types` (column/table metadata, values) + `model` (typed records)
//! - 目录层: `catalog` (registry, schema validation, database initialisation)
//! - SQL 层: `sql` (criteria/sort/pagination compiler, full-text path, DDL, row codec)
//! - 驱动层: `database` (SqliteDriver: connection, transactions, CRUD) + `driver` (factory)
//!
//! # Example
//! ```
//! use minidb::{define_model, Column, Criteria, DriverConfig, FindOptions, ModelRegistry, SqliteDriver};
//!
//! define_model! {
//!     pub struct Person in "person" {
//!         id: i64 => Column::integer().primary_key().autoincrement(),
//!         name: String => Column::string().analyzed(),
//!         state: String => Column::string(),
//!     }
//! }
//!
//! let metadata = ModelRegistry::new().register::<Person>().build()?;
//! let people = metadata.table::<Person>()?;
//!
//! let mut driver = SqliteDriver::new(DriverConfig::in_memory())?;
//! driver.connect()?;
//! metadata.create_db(&mut driver)?;
//!
//! let mut ada = Person { name: Some("Ada Lovelace".into()), state: Some("active".into()), ..Default::default() };
//! driver.add(&people, &mut ada)?;
//!
//! let opts = FindOptions::new().criteria(Criteria::new().eq("state", "active"));
//! assert_eq!(driver.count(&people, &opts)?, 1);
//! assert_eq!(driver.search(&people, &FindOptions::new().term("lovelace"))?.total, 1);
//! # Ok::<(), minidb::MiniDbError>(())
//! ```

pub mod catalog;
pub mod config;
pub mod database;
pub mod driver;
pub mod model;
pub mod sql;
pub mod types;

mod error;

pub use config::DriverConfig;
pub use error::{ConnectionState, MiniDbError, Result};

pub use catalog::{Initializer, ModelMetadata, ModelRegistry};
pub use database::{QueryResponse, SqliteDriver};
pub use driver::{database_exists, get_driver, Driver, DriverKind, Factory};
pub use model::{Key, Model, Record, Table};
pub use sql::{
    compile_criteria, compile_sort, decode, encode, Criteria, CriteriaValue, FindOptions, Operator,
    Page, PartitionKey, SortDirection, SortSpec, SqlFragment, SqlValue,
};
pub use types::{Column, ColumnType, FromValue, Generator, TableMetadata, Value};
