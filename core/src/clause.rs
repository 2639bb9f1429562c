//! 子句累加器与 SELECT 语句编译
//!
//! `Clauses` 保存一次查询的可变意图（字段列表、过滤条件、排序、行数限制），
//! 每个字段相互独立，后写覆盖先写。渲染是纯函数：同一份子句状态总是得到同一条 SQL。

use std::fmt;
use std::str::FromStr;

use crate::builder::Statement;
use crate::connection::DbDriver;
use crate::error::{FlezyError, Result};
use crate::utils::{escape_identifier, quote_field, quote_select_list, quote_table, require_table};

/// 绑定值，用于安全地传递参数
#[derive(Debug, Clone, PartialEq)]
pub enum BindValue {
    String(String),
    Int64(i64),
    Int32(i32),
    Float64(f64),
    Bool(bool),
    Null,
}

/// SQL 比较操作符
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Operator {
    /// 等于: =
    #[default]
    Eq,
    /// 不等于: !=
    Ne,
    /// 大于: >
    Gt,
    /// 大于等于: >=
    Ge,
    /// 小于: <
    Lt,
    /// 小于等于: <=
    Le,
    /// LIKE 匹配
    Like,
    /// NOT LIKE 匹配
    NotLike,
}

impl Operator {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::Ne => "!=",
            Operator::Gt => ">",
            Operator::Ge => ">=",
            Operator::Lt => "<",
            Operator::Le => "<=",
            Operator::Like => "LIKE",
            Operator::NotLike => "NOT LIKE",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

impl FromStr for Operator {
    type Err = FlezyError;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.split_whitespace().collect::<Vec<_>>().join(" ");
        match normalized.to_ascii_uppercase().as_str() {
            "=" | "==" => Ok(Operator::Eq),
            "!=" | "<>" => Ok(Operator::Ne),
            ">" => Ok(Operator::Gt),
            ">=" => Ok(Operator::Ge),
            "<" => Ok(Operator::Lt),
            "<=" => Ok(Operator::Le),
            "LIKE" => Ok(Operator::Like),
            "NOT LIKE" => Ok(Operator::NotLike),
            _ => Err(FlezyError::InvalidOperator(s.to_string())),
        }
    }
}

/// 单个过滤条件：`field op ?`
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub field: String,
    pub op: Operator,
    pub value: BindValue,
}

/// 排序子句
#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub field: String,
    pub ascending: bool,
}

/// SELECT 系列语句的渲染方式
#[derive(Debug, Clone, Copy)]
enum SelectKind<'a> {
    Rows,
    Count,
    Find { pk: &'a str, id: &'a BindValue },
}

/// 查询子句的累积状态
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Clauses {
    select: Option<String>,
    filter: Option<Filter>,
    order: Option<Order>,
    limit: Option<u64>,
}

impl Clauses {
    pub fn new() -> Self {
        Self::default()
    }

    /// 设置查询字段（逗号分隔），未设置时为 `*`
    pub fn set_select(&mut self, fields: impl Into<String>) {
        self.select = Some(fields.into());
    }

    /// 设置唯一的过滤条件，覆盖之前的条件
    pub fn set_filter(&mut self, field: impl Into<String>, op: Operator, value: BindValue) {
        self.filter = Some(Filter {
            field: field.into(),
            op,
            value,
        });
    }

    /// 设置 LIKE 子串匹配（`%value%`）
    pub fn set_like(&mut self, field: impl Into<String>, value: &str) {
        self.set_filter(
            field,
            Operator::Like,
            BindValue::String(format!("%{}%", value)),
        );
    }

    pub fn set_order(&mut self, field: impl Into<String>, ascending: bool) {
        self.order = Some(Order {
            field: field.into(),
            ascending,
        });
    }

    pub fn set_limit(&mut self, n: u64) {
        self.limit = Some(n);
    }

    /// 清空所有子句，恢复默认值
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn select(&self) -> Option<&str> {
        self.select.as_deref()
    }

    pub fn filter(&self) -> Option<&Filter> {
        self.filter.as_ref()
    }

    pub fn order(&self) -> Option<&Order> {
        self.order.as_ref()
    }

    pub fn limit(&self) -> Option<u64> {
        self.limit
    }

    /// 渲染普通查询：`SELECT {select} FROM {table} {where} {order} {limit}`
    pub fn into_sql(&self, driver: DbDriver, table: Option<&str>) -> Result<Statement> {
        self.render(driver, table, SelectKind::Rows)
    }

    /// 渲染计数查询，忽略 `select`，保留其余子句
    pub fn into_count_sql(&self, driver: DbDriver, table: Option<&str>) -> Result<Statement> {
        self.render(driver, table, SelectKind::Count)
    }

    /// 渲染主键查询，忽略已有的过滤条件，保留其余子句
    pub fn into_find_sql(
        &self,
        driver: DbDriver,
        table: Option<&str>,
        pk: &str,
        id: &BindValue,
    ) -> Result<Statement> {
        self.render(driver, table, SelectKind::Find { pk, id })
    }

    fn render(&self, driver: DbDriver, table: Option<&str>, kind: SelectKind<'_>) -> Result<Statement> {
        let table = require_table(table)?;
        let escaped_table = quote_table(driver, table)?;

        let columns = match kind {
            SelectKind::Count => format!(
                "COUNT(*) AS {}",
                escape_identifier(driver, &count_alias(table))
            ),
            _ => match &self.select {
                Some(fields) => quote_select_list(driver, fields)?,
                None => "*".to_string(),
            },
        };

        let mut parts = vec![format!("SELECT {} FROM {}", columns, escaped_table)];
        let mut binds = Vec::new();

        match kind {
            SelectKind::Find { pk, id } => {
                parts.push(format!(
                    "WHERE {} = {}",
                    quote_field(driver, pk)?,
                    driver.placeholder()
                ));
                binds.push(id.clone());
            }
            _ => {
                if let Some(filter) = &self.filter {
                    parts.push(format!(
                        "WHERE {} {} {}",
                        quote_field(driver, &filter.field)?,
                        filter.op,
                        driver.placeholder()
                    ));
                    binds.push(filter.value.clone());
                }
            }
        }

        if let Some(order) = &self.order {
            parts.push(format!(
                "ORDER BY {} {}",
                quote_field(driver, &order.field)?,
                if order.ascending { "ASC" } else { "DESC" }
            ));
        }

        if let Some(limit) = self.limit {
            parts.push(format!("LIMIT {}", limit));
        }

        Ok(Statement::new(parts.join(" "), binds))
    }
}

/// 计数列的别名：`{table}_count`，带 schema 的表名只取最后一段
pub fn count_alias(table: &str) -> String {
    let name = table.rsplit('.').next().unwrap_or(table);
    format!("{}_count", name)
}

impl From<String> for BindValue {
    fn from(s: String) -> Self {
        BindValue::String(s)
    }
}

impl From<&str> for BindValue {
    fn from(s: &str) -> Self {
        BindValue::String(s.to_string())
    }
}

impl From<&String> for BindValue {
    fn from(s: &String) -> Self {
        BindValue::String(s.clone())
    }
}

impl From<i64> for BindValue {
    fn from(i: i64) -> Self {
        BindValue::Int64(i)
    }
}

impl From<i32> for BindValue {
    fn from(i: i32) -> Self {
        BindValue::Int32(i)
    }
}

impl From<u32> for BindValue {
    fn from(i: u32) -> Self {
        BindValue::Int64(i64::from(i))
    }
}

impl From<f64> for BindValue {
    fn from(f: f64) -> Self {
        BindValue::Float64(f)
    }
}

impl From<f32> for BindValue {
    fn from(f: f32) -> Self {
        BindValue::Float64(f64::from(f))
    }
}

impl From<bool> for BindValue {
    fn from(b: bool) -> Self {
        BindValue::Bool(b)
    }
}

impl<T: Into<BindValue>> From<Option<T>> for BindValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(BindValue::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn users() -> Option<&'static str> {
        Some("users")
    }

    // ========== 基本查询测试 ==========
    #[test]
    fn test_default_select_all() {
        let stmt = Clauses::new().into_sql(DbDriver::MySql, users()).unwrap();
        assert_eq!(stmt.sql, "SELECT * FROM `users`");
        assert!(stmt.binds.is_empty());
    }

    #[test]
    fn test_select_fields() {
        let mut clauses = Clauses::new();
        clauses.set_select("id, username, phone");
        let stmt = clauses.into_sql(DbDriver::MySql, users()).unwrap();
        assert_eq!(stmt.sql, "SELECT `id`, `username`, `phone` FROM `users`");
    }

    #[test]
    fn test_missing_table() {
        let err = Clauses::new().into_sql(DbDriver::MySql, None).unwrap_err();
        assert!(matches!(err, FlezyError::MissingTable));
        let err = Clauses::new().into_count_sql(DbDriver::Sqlite, None).unwrap_err();
        assert!(matches!(err, FlezyError::MissingTable));
        let err = Clauses::new()
            .into_find_sql(DbDriver::MySql, None, "id", &BindValue::Int64(1))
            .unwrap_err();
        assert!(matches!(err, FlezyError::MissingTable));
        let err = Clauses::new().into_sql(DbDriver::MySql, Some("")).unwrap_err();
        assert!(matches!(err, FlezyError::MissingTable));
    }

    // ========== WHERE 条件测试 ==========
    #[test]
    fn test_where_default_eq() {
        let mut clauses = Clauses::new();
        clauses.set_filter("username", Operator::Eq, "user1".into());
        let stmt = clauses.into_sql(DbDriver::MySql, users()).unwrap();
        assert_eq!(stmt.sql, "SELECT * FROM `users` WHERE `username` = ?");
        assert_eq!(stmt.binds, vec![BindValue::String("user1".to_string())]);
    }

    #[test]
    fn test_where_with_operator() {
        let mut clauses = Clauses::new();
        clauses.set_filter("age", Operator::Ge, 18.into());
        let stmt = clauses.into_sql(DbDriver::Sqlite, users()).unwrap();
        assert_eq!(stmt.sql, "SELECT * FROM \"users\" WHERE \"age\" >= ?");
        assert_eq!(stmt.binds, vec![BindValue::Int32(18)]);
    }

    #[test]
    fn test_second_where_replaces_first() {
        let mut clauses = Clauses::new();
        clauses.set_filter("username", Operator::Eq, "user1".into());
        clauses.set_filter("phone", Operator::Ne, "123456".into());
        let stmt = clauses.into_sql(DbDriver::MySql, users()).unwrap();
        assert_eq!(stmt.sql, "SELECT * FROM `users` WHERE `phone` != ?");
        assert_eq!(stmt.binds, vec![BindValue::String("123456".to_string())]);
    }

    #[test]
    fn test_where_like_wraps_value() {
        let mut clauses = Clauses::new();
        clauses.set_like("phone", "12345");
        let stmt = clauses.into_sql(DbDriver::MySql, users()).unwrap();
        assert_eq!(stmt.sql, "SELECT * FROM `users` WHERE `phone` LIKE ?");
        assert_eq!(stmt.binds, vec![BindValue::String("%12345%".to_string())]);
    }

    #[test]
    fn test_where_value_is_never_interpolated() {
        let mut clauses = Clauses::new();
        clauses.set_filter("username", Operator::Eq, "x' OR '1'='1".into());
        let stmt = clauses.into_sql(DbDriver::MySql, users()).unwrap();
        assert!(!stmt.sql.contains("OR"));
        assert_eq!(stmt.binds.len(), 1);
    }

    #[test]
    fn test_invalid_where_field() {
        let mut clauses = Clauses::new();
        clauses.set_filter("1=1 OR id", Operator::Eq, 1.into());
        let err = clauses.into_sql(DbDriver::MySql, users()).unwrap_err();
        assert!(matches!(err, FlezyError::InvalidIdentifier(_)));
    }

    // ========== ORDER BY / LIMIT 测试 ==========
    #[test]
    fn test_order_by_last_direction_wins() {
        let mut clauses = Clauses::new();
        clauses.set_order("id", true);
        clauses.set_order("id", false);
        let stmt = clauses.into_sql(DbDriver::MySql, users()).unwrap();
        assert_eq!(stmt.sql, "SELECT * FROM `users` ORDER BY `id` DESC");
    }

    #[test]
    fn test_order_by_asc() {
        let mut clauses = Clauses::new();
        clauses.set_order("created_at", true);
        let stmt = clauses.into_sql(DbDriver::Sqlite, users()).unwrap();
        assert_eq!(stmt.sql, "SELECT * FROM \"users\" ORDER BY \"created_at\" ASC");
    }

    #[test]
    fn test_limit() {
        let mut clauses = Clauses::new();
        clauses.set_limit(2);
        let stmt = clauses.into_sql(DbDriver::MySql, users()).unwrap();
        assert_eq!(stmt.sql, "SELECT * FROM `users` LIMIT 2");

        clauses.set_limit(0);
        let stmt = clauses.into_sql(DbDriver::MySql, users()).unwrap();
        assert_eq!(stmt.sql, "SELECT * FROM `users` LIMIT 0");
    }

    #[test]
    fn test_full_clause_order() {
        let mut clauses = Clauses::new();
        clauses.set_limit(5);
        clauses.set_order("id", false);
        clauses.set_filter("phone", Operator::Eq, "1234".into());
        clauses.set_select("username, phone");
        let stmt = clauses.into_sql(DbDriver::MySql, users()).unwrap();
        assert_eq!(
            stmt.sql,
            "SELECT `username`, `phone` FROM `users` WHERE `phone` = ? ORDER BY `id` DESC LIMIT 5"
        );
    }

    // ========== COUNT / FIND 测试 ==========
    #[test]
    fn test_count_ignores_select() {
        let mut clauses = Clauses::new();
        clauses.set_select("id, username");
        clauses.set_filter("is_del", Operator::Eq, 0.into());
        let stmt = clauses.into_count_sql(DbDriver::MySql, users()).unwrap();
        assert_eq!(
            stmt.sql,
            "SELECT COUNT(*) AS `users_count` FROM `users` WHERE `is_del` = ?"
        );
        // 渲染不会修改已保存的子句
        assert_eq!(clauses.select(), Some("id, username"));
    }

    #[test]
    fn test_count_alias_with_schema() {
        assert_eq!(count_alias("shop.orders"), "orders_count");
        assert_eq!(count_alias("users"), "users_count");
    }

    #[test]
    fn test_find_ignores_where() {
        let mut clauses = Clauses::new();
        clauses.set_select("username, phone");
        clauses.set_filter("username", Operator::Eq, "user1".into());
        let stmt = clauses
            .into_find_sql(DbDriver::MySql, users(), "id", &BindValue::Int64(3))
            .unwrap();
        assert_eq!(
            stmt.sql,
            "SELECT `username`, `phone` FROM `users` WHERE `id` = ?"
        );
        assert_eq!(stmt.binds, vec![BindValue::Int64(3)]);
        assert!(clauses.filter().is_some());
    }

    #[test]
    fn test_find_custom_primary_key() {
        let stmt = Clauses::new()
            .into_find_sql(DbDriver::Sqlite, users(), "user_id", &BindValue::Int64(7))
            .unwrap();
        assert_eq!(stmt.sql, "SELECT * FROM \"users\" WHERE \"user_id\" = ?");
    }

    #[test]
    fn test_clear() {
        let mut clauses = Clauses::new();
        clauses.set_select("id");
        clauses.set_limit(1);
        clauses.clear();
        assert_eq!(clauses, Clauses::default());
    }

    // ========== Operator 测试 ==========
    #[test]
    fn test_operator_from_str() {
        assert_eq!("=".parse::<Operator>().unwrap(), Operator::Eq);
        assert_eq!("<>".parse::<Operator>().unwrap(), Operator::Ne);
        assert_eq!(">=".parse::<Operator>().unwrap(), Operator::Ge);
        assert_eq!("like".parse::<Operator>().unwrap(), Operator::Like);
        assert_eq!("not   like".parse::<Operator>().unwrap(), Operator::NotLike);
        assert!(matches!(
            "; DROP".parse::<Operator>().unwrap_err(),
            FlezyError::InvalidOperator(_)
        ));
    }

    #[test]
    fn test_operator_default_is_eq() {
        assert_eq!(Operator::default(), Operator::Eq);
        assert_eq!(Operator::NotLike.to_string(), "NOT LIKE");
    }

    // ========== BindValue 转换测试 ==========
    #[test]
    fn test_bind_value_conversions() {
        assert_eq!(BindValue::from("a"), BindValue::String("a".to_string()));
        assert_eq!(BindValue::from(1i64), BindValue::Int64(1));
        assert_eq!(BindValue::from(7u32), BindValue::Int64(7));
        assert_eq!(BindValue::from(true), BindValue::Bool(true));
        assert_eq!(BindValue::from(None::<i32>), BindValue::Null);
        assert_eq!(BindValue::from(Some("x")), BindValue::String("x".to_string()));
    }
}
