//! 共享连接
//!
//! `Connection` 持有唯一的数据库句柄，内部是只有一条连接的 sqlx 连接池，
//! 多个持有者并发访问时由连接池串行化。克隆 `Connection` 只复制引用计数。

#[cfg(feature = "mysql")]
use std::str::FromStr;
use std::sync::Arc;

#[cfg(any(feature = "mysql", feature = "sqlite"))]
use sqlx::pool::PoolOptions;
#[cfg(any(feature = "mysql", feature = "sqlite"))]
use sqlx::Pool;

#[cfg(feature = "mysql")]
use crate::config::{ConnectOptions, SessionOptions};
use crate::builder::Statement;
use crate::error::{FlezyError, Result};
use crate::executor;
use crate::query_builder::QueryBuilder;
use crate::record::Record;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DbDriver {
    MySql,
    Sqlite,
}

impl DbDriver {
    pub fn from_url(url: &str) -> Result<Self> {
        if url.starts_with("mysql://") || url.starts_with("mariadb://") {
            Ok(DbDriver::MySql)
        } else if url.starts_with("sqlite://") || url.starts_with("sqlite:") {
            Ok(DbDriver::Sqlite)
        } else {
            Err(FlezyError::UnsupportedDatabase(url.to_string()))
        }
    }

    /// 占位符，MySQL 与 SQLite 都是位置无关的 `?`
    pub fn placeholder(&self) -> &'static str {
        "?"
    }
}

/// 只有一条常驻连接的连接池：建立后不因空闲或存活时间被回收
///
/// SQLite 内存数据库的数据只存在于这条连接上。
#[cfg(any(feature = "mysql", feature = "sqlite"))]
fn single_connection<DB: sqlx::Database>(options: PoolOptions<DB>) -> PoolOptions<DB> {
    options
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
}

#[derive(Debug, Clone)]
pub struct Connection {
    driver: DbDriver,
    #[cfg(feature = "mysql")]
    mysql: Option<Arc<Pool<sqlx::MySql>>>,
    #[cfg(feature = "sqlite")]
    sqlite: Option<Arc<Pool<sqlx::Sqlite>>>,
}

impl Connection {
    /// 使用连接参数建立 MySQL 连接
    ///
    /// 未提供会话选项时强制开启严格 SQL 模式。
    #[cfg(feature = "mysql")]
    pub async fn connect(options: ConnectOptions) -> Result<Self> {
        let session = options.session();
        let mut pool_options = sqlx::mysql::MySqlPoolOptions::new();
        if let Some(timeout) = options.acquire_timeout() {
            pool_options = pool_options.acquire_timeout(timeout);
        }
        let conn = Self::connect_mysql(pool_options, options.to_mysql_options(), &session).await?;
        tracing::info!(
            target: "flezy::connection",
            host = %options.host,
            port = options.port,
            database = %options.database,
            "connected"
        );
        Ok(conn)
    }

    /// 从数据库 URL 连接，根据 scheme 推断驱动
    ///
    /// * `mysql://` / `mariadb://`：使用默认会话（严格模式）
    /// * `sqlite:` / `sqlite://`：例如 `sqlite::memory:`
    pub async fn connect_url(url: &str) -> Result<Self> {
        let driver = DbDriver::from_url(url)?;

        let conn = match driver {
            #[cfg(feature = "mysql")]
            DbDriver::MySql => {
                let opts = sqlx::mysql::MySqlConnectOptions::from_str(url)
                    .map_err(FlezyError::Connection)?;
                Self::connect_mysql(
                    sqlx::mysql::MySqlPoolOptions::new(),
                    opts,
                    &SessionOptions::strict(),
                )
                .await?
            }
            #[cfg(feature = "sqlite")]
            DbDriver::Sqlite => {
                let pool = single_connection(sqlx::sqlite::SqlitePoolOptions::new())
                    .connect(url)
                    .await
                    .map_err(FlezyError::Connection)?;
                Self::from_sqlite_pool(pool)
            }
            #[allow(unreachable_patterns)]
            _ => {
                return Err(FlezyError::UnsupportedDatabase(format!(
                    "driver {:?} is not enabled, url: {}",
                    driver, url
                )))
            }
        };

        tracing::info!(target: "flezy::connection", driver = ?driver, "connected");
        Ok(conn)
    }

    #[cfg(feature = "mysql")]
    async fn connect_mysql(
        pool_options: sqlx::mysql::MySqlPoolOptions,
        connect_options: sqlx::mysql::MySqlConnectOptions,
        session: &SessionOptions,
    ) -> Result<Self> {
        let statements = Arc::new(session.session_statements()?);
        let pool = single_connection(pool_options)
            .after_connect(move |conn, _meta| {
                let statements = Arc::clone(&statements);
                Box::pin(async move {
                    for sql in statements.iter() {
                        sqlx::query(sql.as_str()).execute(&mut *conn).await?;
                    }
                    Ok(())
                })
            })
            .connect_with(connect_options)
            .await
            .map_err(FlezyError::Connection)?;
        Ok(Self::from_mysql_pool(pool))
    }

    /// 复用已有的 MySQL 连接池
    #[cfg(feature = "mysql")]
    pub fn from_mysql_pool(pool: Pool<sqlx::MySql>) -> Self {
        Self {
            driver: DbDriver::MySql,
            mysql: Some(Arc::new(pool)),
            #[cfg(feature = "sqlite")]
            sqlite: None,
        }
    }

    /// 复用已有的 SQLite 连接池
    #[cfg(feature = "sqlite")]
    pub fn from_sqlite_pool(pool: Pool<sqlx::Sqlite>) -> Self {
        Self {
            driver: DbDriver::Sqlite,
            #[cfg(feature = "mysql")]
            mysql: None,
            sqlite: Some(Arc::new(pool)),
        }
    }

    pub fn driver(&self) -> DbDriver {
        self.driver
    }

    #[cfg(feature = "mysql")]
    pub fn mysql_pool(&self) -> Option<&Pool<sqlx::MySql>> {
        self.mysql.as_deref()
    }

    #[cfg(feature = "sqlite")]
    pub fn sqlite_pool(&self) -> Option<&Pool<sqlx::Sqlite>> {
        self.sqlite.as_deref()
    }

    /// 以指定表创建一个新的查询构建器
    pub fn table(&self, name: &str) -> QueryBuilder {
        let mut builder = QueryBuilder::new(self.clone());
        builder.table(name);
        builder
    }

    /// 关闭连接，之后的语句都会失败
    pub async fn close(&self) {
        #[cfg(feature = "mysql")]
        if let Some(pool) = &self.mysql {
            pool.close().await;
        }
        #[cfg(feature = "sqlite")]
        if let Some(pool) = &self.sqlite {
            pool.close().await;
        }
    }

    pub fn is_closed(&self) -> bool {
        match self.driver {
            #[cfg(feature = "mysql")]
            DbDriver::MySql => self.mysql.as_ref().map_or(true, |p| p.is_closed()),
            #[cfg(feature = "sqlite")]
            DbDriver::Sqlite => self.sqlite.as_ref().map_or(true, |p| p.is_closed()),
            #[allow(unreachable_patterns)]
            _ => true,
        }
    }

    pub(crate) async fn fetch_all(&self, stmt: &Statement) -> Result<Vec<Record>> {
        match self.driver {
            #[cfg(feature = "mysql")]
            DbDriver::MySql => {
                let pool = self.mysql.as_deref().ok_or(FlezyError::NoPoolAvailable)?;
                executor::fetch_all::<sqlx::MySql, _>(pool, stmt).await
            }
            #[cfg(feature = "sqlite")]
            DbDriver::Sqlite => {
                let pool = self.sqlite.as_deref().ok_or(FlezyError::NoPoolAvailable)?;
                executor::fetch_all::<sqlx::Sqlite, _>(pool, stmt).await
            }
            #[allow(unreachable_patterns)]
            _ => Err(FlezyError::NoPoolAvailable),
        }
    }

    pub(crate) async fn fetch_optional(&self, stmt: &Statement) -> Result<Option<Record>> {
        match self.driver {
            #[cfg(feature = "mysql")]
            DbDriver::MySql => {
                let pool = self.mysql.as_deref().ok_or(FlezyError::NoPoolAvailable)?;
                executor::fetch_optional::<sqlx::MySql, _>(pool, stmt).await
            }
            #[cfg(feature = "sqlite")]
            DbDriver::Sqlite => {
                let pool = self.sqlite.as_deref().ok_or(FlezyError::NoPoolAvailable)?;
                executor::fetch_optional::<sqlx::Sqlite, _>(pool, stmt).await
            }
            #[allow(unreachable_patterns)]
            _ => Err(FlezyError::NoPoolAvailable),
        }
    }

    pub(crate) async fn execute(&self, stmt: &Statement) -> Result<u64> {
        match self.driver {
            #[cfg(feature = "mysql")]
            DbDriver::MySql => {
                let pool = self.mysql.as_deref().ok_or(FlezyError::NoPoolAvailable)?;
                executor::execute::<sqlx::MySql, _>(pool, stmt).await
            }
            #[cfg(feature = "sqlite")]
            DbDriver::Sqlite => {
                let pool = self.sqlite.as_deref().ok_or(FlezyError::NoPoolAvailable)?;
                executor::execute::<sqlx::Sqlite, _>(pool, stmt).await
            }
            #[allow(unreachable_patterns)]
            _ => Err(FlezyError::NoPoolAvailable),
        }
    }
}
