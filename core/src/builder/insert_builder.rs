//! Insert Builder - 按字段映射生成 INSERT 语句

use super::{FieldValues, Statement};
use crate::clause::BindValue;
use crate::connection::DbDriver;
use crate::error::{FlezyError, Result};
use crate::utils::{quote_field, quote_table, require_table};

/// Insert Builder
///
/// 每个字段对应一个占位符，绑定值顺序与字段映射的顺序一致
#[derive(Debug, Clone, Default)]
pub struct InsertBuilder {
    values: FieldValues,
}

impl InsertBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// 从已有的字段映射创建
    pub fn from_values(values: FieldValues) -> Self {
        Self { values }
    }

    /// 追加一个字段（可链式调用多次）
    pub fn value(mut self, field: &str, value: impl Into<BindValue>) -> Self {
        self.values.set(field, value);
        self
    }

    /// 渲染 `INSERT INTO {table} ({columns}) VALUES ({placeholders})`
    pub fn into_statement(&self, driver: DbDriver, table: Option<&str>) -> Result<Statement> {
        let table = require_table(table)?;
        let escaped_table = quote_table(driver, table)?;

        if self.values.is_empty() {
            return Err(FlezyError::InvalidField("No fields to insert".to_string()));
        }

        let mut field_names = Vec::with_capacity(self.values.len());
        let mut placeholders = Vec::with_capacity(self.values.len());
        let mut binds = Vec::with_capacity(self.values.len());

        for (field, value) in self.values.iter() {
            field_names.push(quote_field(driver, field)?);
            placeholders.push(driver.placeholder());
            binds.push(value.clone());
        }

        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            escaped_table,
            field_names.join(", "),
            placeholders.join(", ")
        );
        Ok(Statement::new(sql, binds))
    }
}
