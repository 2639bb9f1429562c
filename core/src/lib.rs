//! flezy：基于 sqlx 的链式查询构建器
//!
//! 通过 [`Connection`] 持有唯一的数据库句柄，通过 [`QueryBuilder`] 链式地累积
//! select / where / order / limit 子句，再以绑定参数的方式执行。

pub mod builder;
pub mod clause;
pub mod config;
pub mod connection;
pub mod database_info;
pub mod error;
pub mod executor;
pub mod query_builder;
pub mod record;
pub mod utils;

pub use builder::{FieldValues, Statement};
pub use clause::{BindValue, Clauses, Operator};
pub use config::{ConnectOptions, SessionOptions};
pub use connection::{Connection, DbDriver};
pub use database_info::DatabaseInfo;
pub use error::{FlezyError, Result};
pub use query_builder::QueryBuilder;
pub use record::{LastResult, Record};
