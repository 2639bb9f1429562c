//! 连接配置
//!
//! `ConnectOptions` 描述如何建立唯一的共享连接，`SessionOptions` 描述每条新连接
//! 建立后需要执行的会话语句（严格模式、时区以及自定义初始化语句）。

use std::env;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{FlezyError, Result};

/// MySQL 默认端口
pub const DEFAULT_PORT: u16 = 3306;

/// 会话选项
///
/// 未提供会话选项时使用 [`SessionOptions::strict`]；一旦显式提供，默认值不再生效，
/// 需要严格模式时调用方须自行打开 `strict_mode`。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionOptions {
    /// 在会话 `sql_mode` 上追加 `STRICT_ALL_TABLES`
    pub strict_mode: bool,
    /// 连接字符集，如 `utf8mb4`
    pub charset: Option<String>,
    /// 会话时区，如 `+08:00` 或 `UTC`
    pub timezone: Option<String>,
    /// 额外的初始化语句，按顺序在严格模式与时区之后执行
    pub init_statements: Vec<String>,
}

impl SessionOptions {
    /// 默认会话：严格 SQL 模式
    pub fn strict() -> Self {
        Self {
            strict_mode: true,
            ..Self::default()
        }
    }

    pub fn with_strict_mode(mut self, strict: bool) -> Self {
        self.strict_mode = strict;
        self
    }

    pub fn with_charset(mut self, charset: impl Into<String>) -> Self {
        self.charset = Some(charset.into());
        self
    }

    pub fn with_timezone(mut self, timezone: impl Into<String>) -> Self {
        self.timezone = Some(timezone.into());
        self
    }

    pub fn with_init_statement(mut self, sql: impl Into<String>) -> Self {
        self.init_statements.push(sql.into());
        self
    }

    /// 新连接建立后需要依次执行的语句
    pub fn session_statements(&self) -> Result<Vec<String>> {
        let mut statements = Vec::new();
        if self.strict_mode {
            statements.push(
                "SET SESSION sql_mode = CONCAT(@@SESSION.sql_mode, ',STRICT_ALL_TABLES')"
                    .to_string(),
            );
        }
        if let Some(tz) = &self.timezone {
            if !is_safe_timezone(tz) {
                return Err(FlezyError::Config(format!("invalid timezone '{}'", tz)));
            }
            statements.push(format!("SET time_zone = '{}'", tz));
        }
        statements.extend(self.init_statements.iter().cloned());
        Ok(statements)
    }
}

/// 时区只允许 `+08:00`、`UTC`、`Asia/Shanghai` 这类写法
fn is_safe_timezone(tz: &str) -> bool {
    !tz.is_empty()
        && tz
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | ':' | '/' | '_'))
}

/// 连接参数
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectOptions {
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub username: String,
    #[serde(default, skip_serializing)]
    pub password: String,
    pub database: String,
    #[serde(default)]
    pub options: Option<SessionOptions>,
    /// 获取连接的超时时间（秒），未设置时使用 sqlx 的默认值
    #[serde(default)]
    pub connect_timeout_secs: Option<u64>,
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

impl Default for ConnectOptions {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: DEFAULT_PORT,
            username: String::new(),
            password: String::new(),
            database: String::new(),
            options: None,
            connect_timeout_secs: None,
        }
    }
}

impl ConnectOptions {
    pub fn new(
        host: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
        database: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            username: username.into(),
            password: password.into(),
            database: database.into(),
            ..Self::default()
        }
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn session_options(mut self, options: SessionOptions) -> Self {
        self.options = Some(options);
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout_secs = Some(timeout.as_secs());
        self
    }

    /// 实际生效的会话选项：未显式提供时强制使用严格模式
    pub fn session(&self) -> SessionOptions {
        self.options.clone().unwrap_or_else(SessionOptions::strict)
    }

    pub(crate) fn acquire_timeout(&self) -> Option<Duration> {
        self.connect_timeout_secs.map(Duration::from_secs)
    }

    /// 从环境变量读取连接参数
    ///
    /// * `FLEZY_DB_HOST`（默认 `localhost`）
    /// * `FLEZY_DB_PORT`（默认 `3306`）
    /// * `FLEZY_DB_USER`（必填）
    /// * `FLEZY_DB_PASSWORD`（默认为空）
    /// * `FLEZY_DB_NAME`（必填）
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let required = |key: &str| {
            lookup(key)
                .filter(|v| !v.is_empty())
                .ok_or_else(|| FlezyError::Config(format!("{} is not set", key)))
        };

        let port = match lookup("FLEZY_DB_PORT") {
            Some(raw) => raw
                .parse::<u16>()
                .map_err(|_| FlezyError::Config(format!("FLEZY_DB_PORT '{}' is not a port", raw)))?,
            None => DEFAULT_PORT,
        };

        Ok(Self {
            host: lookup("FLEZY_DB_HOST").unwrap_or_else(|| "localhost".to_string()),
            port,
            username: required("FLEZY_DB_USER")?,
            password: lookup("FLEZY_DB_PASSWORD").unwrap_or_default(),
            database: required("FLEZY_DB_NAME")?,
            options: None,
            connect_timeout_secs: None,
        })
    }

    /// 转换为 sqlx 的 MySQL 连接选项
    #[cfg(feature = "mysql")]
    pub fn to_mysql_options(&self) -> sqlx::mysql::MySqlConnectOptions {
        let mut opts = sqlx::mysql::MySqlConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.username)
            .database(&self.database);
        if !self.password.is_empty() {
            opts = opts.password(&self.password);
        }
        if let Some(charset) = self.options.as_ref().and_then(|o| o.charset.as_deref()) {
            opts = opts.charset(charset);
        }
        opts
    }
}
