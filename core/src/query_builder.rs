//! 链式查询构建器
//!
//! 每个 `QueryBuilder` 只维护一个表和一组子句。链式方法只修改对应的子句并返回
//! `&mut Self`，终结方法（`all`、`get`、`find`、`count`、`create`、`update`、
//! `destroy`）编译语句、绑定参数并在共享连接上执行。
//!
//! ```rust,ignore
//! let conn = Connection::connect_url("sqlite::memory:").await?;
//! let mut users = conn.table("users");
//! let rows = users
//!     .select("username, phone")
//!     .where_("phone", "0000")
//!     .order_by_desc("id")
//!     .limit(5)
//!     .all()
//!     .await?;
//! ```
//!
//! 子句在终结调用之后仍然保留，直到被覆盖、调用 [`QueryBuilder::reset`]
//! 或通过 [`QueryBuilder::table`] 重新选择表。

use std::time::Duration;

use crate::builder::{DeleteBuilder, FieldValues, InsertBuilder, Statement, UpdateBuilder};
use crate::clause::{count_alias, BindValue, Clauses, Operator};
use crate::connection::Connection;
use crate::error::Result;
use crate::executor::with_timeout;
use crate::record::{read_count, LastResult, Record};

/// 默认主键列
pub const DEFAULT_PRIMARY_KEY: &str = "id";

#[derive(Debug, Clone)]
pub struct QueryBuilder {
    conn: Connection,
    table: Option<String>,
    primary_key: String,
    clauses: Clauses,
    timeout: Option<Duration>,
    last_result: Option<LastResult>,
}

impl QueryBuilder {
    /// 创建一个未选择表的构建器
    pub fn new(conn: Connection) -> Self {
        Self {
            conn,
            table: None,
            primary_key: DEFAULT_PRIMARY_KEY.to_string(),
            clauses: Clauses::new(),
            timeout: None,
            last_result: None,
        }
    }

    /// 替换当前使用的连接
    pub fn use_connection(&mut self, conn: Connection) -> &mut Self {
        self.conn = conn;
        self
    }

    /// 当前使用的连接
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// 选择表，并清空所有子句；空白表名视为未选择
    pub fn table(&mut self, name: &str) -> &mut Self {
        let name = name.trim();
        self.table = (!name.is_empty()).then(|| name.to_string());
        self.clauses.clear();
        self
    }

    /// 逗号分隔的字段列表，默认 `*`
    pub fn select(&mut self, fields: &str) -> &mut Self {
        self.clauses.set_select(fields);
        self
    }

    /// `field = ?`，覆盖之前的条件
    pub fn where_(&mut self, field: &str, value: impl Into<BindValue>) -> &mut Self {
        self.clauses.set_filter(field, Operator::Eq, value.into());
        self
    }

    /// `field {op} ?`，覆盖之前的条件
    pub fn where_op(&mut self, field: &str, op: Operator, value: impl Into<BindValue>) -> &mut Self {
        self.clauses.set_filter(field, op, value.into());
        self
    }

    /// `field LIKE '%value%'`，覆盖之前的条件
    pub fn where_like(&mut self, field: &str, value: &str) -> &mut Self {
        self.clauses.set_like(field, value);
        self
    }

    pub fn order_by(&mut self, field: &str) -> &mut Self {
        self.clauses.set_order(field, true);
        self
    }

    pub fn order_by_desc(&mut self, field: &str) -> &mut Self {
        self.clauses.set_order(field, false);
        self
    }

    pub fn limit(&mut self, n: u64) -> &mut Self {
        self.clauses.set_limit(n);
        self
    }

    /// 指定 `find`、`update`、`destroy` 使用的主键列
    pub fn primary_key(&mut self, column: &str) -> &mut Self {
        self.primary_key = column.trim().to_string();
        self
    }

    /// 为之后的每条语句设置超时
    pub fn timeout(&mut self, duration: Duration) -> &mut Self {
        self.timeout = Some(duration);
        self
    }

    /// 清空子句（保留表、主键和超时）
    pub fn reset(&mut self) -> &mut Self {
        self.clauses.clear();
        self
    }

    pub fn clauses(&self) -> &Clauses {
        &self.clauses
    }

    pub fn table_name(&self) -> Option<&str> {
        self.table.as_deref()
    }

    /// 最近一次终结操作的结果
    pub fn last_result(&self) -> Option<&LastResult> {
        self.last_result.as_ref()
    }

    /// 渲染当前的 SELECT 语句而不执行
    pub fn to_sql(&self) -> Result<Statement> {
        self.clauses
            .into_sql(self.conn.driver(), self.table.as_deref())
    }

    // ========== 查询 ==========

    /// 返回所有匹配的行
    pub async fn all(&mut self) -> Result<Vec<Record>> {
        let stmt = self.to_sql()?;
        let rows = with_timeout(self.timeout, self.conn.fetch_all(&stmt)).await?;
        self.last_result = Some(LastResult::Rows(rows.clone()));
        Ok(rows)
    }

    /// 返回第一条匹配的行
    pub async fn get(&mut self) -> Result<Option<Record>> {
        let stmt = self.to_sql()?;
        self.fetch_one(stmt).await
    }

    /// 按主键查询，忽略当前的过滤条件
    pub async fn find(&mut self, id: impl Into<BindValue>) -> Result<Option<Record>> {
        let stmt = self.clauses.into_find_sql(
            self.conn.driver(),
            self.table.as_deref(),
            &self.primary_key,
            &id.into(),
        )?;
        self.fetch_one(stmt).await
    }

    /// 返回包含 `{table}_count` 列的记录，忽略 `select`
    ///
    /// 语句没有返回行时（例如 `limit(0)`）得到空记录。
    pub async fn count(&mut self) -> Result<Record> {
        let stmt = self
            .clauses
            .into_count_sql(self.conn.driver(), self.table.as_deref())?;
        Ok(self.fetch_one(stmt).await?.unwrap_or_default())
    }

    /// 与 [`count`](Self::count) 相同，但直接返回数值
    pub async fn count_value(&mut self) -> Result<u64> {
        let record = self.count().await?;
        let alias = self.table.as_deref().map(count_alias).unwrap_or_default();
        Ok(read_count(&record, &alias))
    }

    async fn fetch_one(&mut self, stmt: Statement) -> Result<Option<Record>> {
        let row = with_timeout(self.timeout, self.conn.fetch_optional(&stmt)).await?;
        self.last_result = Some(LastResult::Row(row.clone()));
        Ok(row)
    }

    // ========== 写操作 ==========

    /// 插入一行，字段按映射顺序绑定
    pub async fn create<I, K, V>(&mut self, data: I) -> Result<bool>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<BindValue>,
    {
        let values: FieldValues = data.into_iter().collect();
        let stmt = InsertBuilder::from_values(values)
            .into_statement(self.conn.driver(), self.table.as_deref())?;
        self.write(stmt).await
    }

    /// 按主键更新指定字段
    pub async fn update<I, K, V>(&mut self, id: impl Into<BindValue>, data: I) -> Result<bool>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<BindValue>,
    {
        let values: FieldValues = data.into_iter().collect();
        let stmt = UpdateBuilder::new(id)
            .primary_key(&self.primary_key)
            .values(values)
            .into_statement(self.conn.driver(), self.table.as_deref())?;
        self.write(stmt).await
    }

    /// 按主键删除一行
    pub async fn destroy(&mut self, id: impl Into<BindValue>) -> Result<bool> {
        let stmt = DeleteBuilder::new(id)
            .primary_key(&self.primary_key)
            .into_statement(self.conn.driver(), self.table.as_deref())?;
        self.write(stmt).await
    }

    async fn write(&mut self, stmt: Statement) -> Result<bool> {
        let affected = with_timeout(self.timeout, self.conn.execute(&stmt)).await?;
        self.last_result = Some(LastResult::Affected(affected));
        Ok(affected > 0)
    }
}
