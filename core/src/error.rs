use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FlezyError {
    #[error("Unsupported database URL: {0}")]
    UnsupportedDatabase(String),
    /// Failed to establish the shared connection
    #[error("Database connection error: {0}")]
    Connection(#[source] sqlx::Error),
    /// A terminal action ran before `table()` was called
    #[error("No database table specified")]
    MissingTable,
    /// Table or column name rejected before rendering SQL
    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),
    #[error("Invalid operator: {0}")]
    InvalidOperator(String),
    /// Invalid field error
    #[error("Invalid field: {0}")]
    InvalidField(String),
    /// Any driver-level failure while executing a statement or decoding its rows
    #[error("Execution error: {0}")]
    Execution(#[from] sqlx::Error),
    #[error("Statement timed out after {0:?}")]
    Timeout(Duration),
    #[error("No connection pool available for driver")]
    NoPoolAvailable,
    #[error("Configuration error: {0}")]
    Config(String),
}

impl FlezyError {
    /// 是否为连接阶段的错误（含不支持的数据库 URL）
    pub fn is_connection(&self) -> bool {
        matches!(
            self,
            FlezyError::Connection(_) | FlezyError::UnsupportedDatabase(_)
        )
    }

    /// 是否在发送 SQL 之前就被拦截（未设置表、非法标识符等）
    pub fn is_rejected_before_execution(&self) -> bool {
        matches!(
            self,
            FlezyError::MissingTable
                | FlezyError::InvalidIdentifier(_)
                | FlezyError::InvalidOperator(_)
                | FlezyError::InvalidField(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, FlezyError>;
