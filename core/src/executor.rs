//! 语句执行器
//!
//! 泛型实现，支持所有实现了 [`DatabaseInfo`] 的数据库类型。每个值都通过
//! 绑定参数传递，SQL 文本中不会出现调用方提供的值。

use std::future::Future;
use std::time::Duration;

use sqlx::Database;

use crate::builder::Statement;
use crate::clause::BindValue;
use crate::database_info::DatabaseInfo;
use crate::error::{FlezyError, Result};
use crate::record::Record;

/// 日志 target，所有语句级别的事件都使用它
pub const SQL_TARGET: &str = "flezy::sql";

/// 将 `BindValue` 绑定到 sqlx 查询上
#[macro_export]
macro_rules! apply_bind_value {
    ($query:expr, $bind:expr) => {
        match $bind {
            $crate::clause::BindValue::String(s) => {
                $query = $query.bind(s);
            }
            $crate::clause::BindValue::Int64(i) => {
                $query = $query.bind(i);
            }
            $crate::clause::BindValue::Int32(i) => {
                $query = $query.bind(i);
            }
            $crate::clause::BindValue::Float64(f) => {
                $query = $query.bind(f);
            }
            $crate::clause::BindValue::Bool(b) => {
                $query = $query.bind(b);
            }
            $crate::clause::BindValue::Null => {
                $query = $query.bind(Option::<String>::None);
            }
        }
    };
}

fn apply_binds<'q, DB>(
    mut query: sqlx::query::Query<'q, DB, DB::Arguments<'q>>,
    binds: &'q [BindValue],
) -> sqlx::query::Query<'q, DB, DB::Arguments<'q>>
where
    DB: Database + DatabaseInfo,
    for<'a> DB::Arguments<'a>: sqlx::IntoArguments<'a, DB>,
    String: sqlx::Type<DB> + for<'b> sqlx::Encode<'b, DB>,
    i64: sqlx::Type<DB> + for<'b> sqlx::Encode<'b, DB>,
    i32: sqlx::Type<DB> + for<'b> sqlx::Encode<'b, DB>,
    f64: sqlx::Type<DB> + for<'b> sqlx::Encode<'b, DB>,
    bool: sqlx::Type<DB> + for<'b> sqlx::Encode<'b, DB>,
    Option<String>: sqlx::Type<DB> + for<'b> sqlx::Encode<'b, DB>,
{
    for bind in binds {
        crate::apply_bind_value!(query, bind);
    }
    query
}

fn log_failure(stmt: &Statement, err: sqlx::Error) -> FlezyError {
    tracing::warn!(target: SQL_TARGET, sql = %stmt.sql, error = %err, "statement failed");
    FlezyError::Execution(err)
}

/// 执行查询并返回所有行
pub async fn fetch_all<'e, 'c: 'e, DB, E>(executor: E, stmt: &Statement) -> Result<Vec<Record>>
where
    DB: Database + DatabaseInfo,
    for<'a> DB::Arguments<'a>: sqlx::IntoArguments<'a, DB>,
    E: sqlx::Executor<'c, Database = DB> + Send,
    String: sqlx::Type<DB> + for<'b> sqlx::Encode<'b, DB>,
    i64: sqlx::Type<DB> + for<'b> sqlx::Encode<'b, DB>,
    i32: sqlx::Type<DB> + for<'b> sqlx::Encode<'b, DB>,
    f64: sqlx::Type<DB> + for<'b> sqlx::Encode<'b, DB>,
    bool: sqlx::Type<DB> + for<'b> sqlx::Encode<'b, DB>,
    Option<String>: sqlx::Type<DB> + for<'b> sqlx::Encode<'b, DB>,
{
    tracing::debug!(target: SQL_TARGET, sql = %stmt.sql, binds = stmt.binds.len(), "fetch_all");
    let query = apply_binds(sqlx::query::<DB>(&stmt.sql), &stmt.binds);
    let rows = query
        .fetch_all(executor)
        .await
        .map_err(|e| log_failure(stmt, e))?;
    rows.iter().map(DB::row_to_record).collect()
}

/// 执行查询并返回第一行（如果有）
pub async fn fetch_optional<'e, 'c: 'e, DB, E>(
    executor: E,
    stmt: &Statement,
) -> Result<Option<Record>>
where
    DB: Database + DatabaseInfo,
    for<'a> DB::Arguments<'a>: sqlx::IntoArguments<'a, DB>,
    E: sqlx::Executor<'c, Database = DB> + Send,
    String: sqlx::Type<DB> + for<'b> sqlx::Encode<'b, DB>,
    i64: sqlx::Type<DB> + for<'b> sqlx::Encode<'b, DB>,
    i32: sqlx::Type<DB> + for<'b> sqlx::Encode<'b, DB>,
    f64: sqlx::Type<DB> + for<'b> sqlx::Encode<'b, DB>,
    bool: sqlx::Type<DB> + for<'b> sqlx::Encode<'b, DB>,
    Option<String>: sqlx::Type<DB> + for<'b> sqlx::Encode<'b, DB>,
{
    tracing::debug!(target: SQL_TARGET, sql = %stmt.sql, binds = stmt.binds.len(), "fetch_optional");
    let query = apply_binds(sqlx::query::<DB>(&stmt.sql), &stmt.binds);
    let row = query
        .fetch_optional(executor)
        .await
        .map_err(|e| log_failure(stmt, e))?;
    row.as_ref().map(DB::row_to_record).transpose()
}

/// 执行写语句，返回影响的行数
pub async fn execute<'e, 'c: 'e, DB, E>(executor: E, stmt: &Statement) -> Result<u64>
where
    DB: Database + DatabaseInfo,
    for<'a> DB::Arguments<'a>: sqlx::IntoArguments<'a, DB>,
    E: sqlx::Executor<'c, Database = DB> + Send,
    String: sqlx::Type<DB> + for<'b> sqlx::Encode<'b, DB>,
    i64: sqlx::Type<DB> + for<'b> sqlx::Encode<'b, DB>,
    i32: sqlx::Type<DB> + for<'b> sqlx::Encode<'b, DB>,
    f64: sqlx::Type<DB> + for<'b> sqlx::Encode<'b, DB>,
    bool: sqlx::Type<DB> + for<'b> sqlx::Encode<'b, DB>,
    Option<String>: sqlx::Type<DB> + for<'b> sqlx::Encode<'b, DB>,
{
    tracing::debug!(target: SQL_TARGET, sql = %stmt.sql, binds = stmt.binds.len(), "execute");
    let query = apply_binds(sqlx::query::<DB>(&stmt.sql), &stmt.binds);
    let result = query
        .execute(executor)
        .await
        .map_err(|e| log_failure(stmt, e))?;
    Ok(DB::rows_affected(&result))
}

/// 为语句加上可选的超时
pub(crate) async fn with_timeout<T, F>(timeout: Option<Duration>, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match timeout {
        Some(duration) => match tokio::time::timeout(duration, fut).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(target: SQL_TARGET, timeout = ?duration, "statement timed out");
                Err(FlezyError::Timeout(duration))
            }
        },
        None => fut.await,
    }
}
