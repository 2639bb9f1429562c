//! Update Builder - 按主键更新指定字段

use super::{FieldValues, Statement};
use crate::clause::BindValue;
use crate::connection::DbDriver;
use crate::error::{FlezyError, Result};
use crate::utils::{quote_field, quote_table, require_table};

/// Update Builder
///
/// 生成 `UPDATE {table} SET {c1} = ?, ... WHERE {pk} = ?`，
/// 绑定值为字段值（映射顺序）加上最后的主键
#[derive(Debug, Clone)]
pub struct UpdateBuilder {
    pk: String,
    id: BindValue,
    values: FieldValues,
}

impl UpdateBuilder {
    /// 创建 UpdateBuilder，主键列默认为 `id`
    pub fn new(id: impl Into<BindValue>) -> Self {
        Self {
            pk: "id".to_string(),
            id: id.into(),
            values: FieldValues::new(),
        }
    }

    /// 指定主键列
    pub fn primary_key(mut self, pk: &str) -> Self {
        self.pk = pk.to_string();
        self
    }

    /// 指定要更新的字段（可链式调用多次）
    pub fn set(mut self, field: &str, value: impl Into<BindValue>) -> Self {
        self.values.set(field, value);
        self
    }

    /// 使用已有的字段映射
    pub fn values(mut self, values: FieldValues) -> Self {
        self.values = values;
        self
    }

    pub fn into_statement(&self, driver: DbDriver, table: Option<&str>) -> Result<Statement> {
        let table = require_table(table)?;
        let escaped_table = quote_table(driver, table)?;
        let escaped_pk = quote_field(driver, &self.pk)?;

        if self.values.is_empty() {
            return Err(FlezyError::InvalidField("No fields to update".to_string()));
        }

        // 构建 SET 子句
        let mut set_parts = Vec::with_capacity(self.values.len());
        let mut binds = Vec::with_capacity(self.values.len() + 1);
        for (field, value) in self.values.iter() {
            set_parts.push(format!(
                "{} = {}",
                quote_field(driver, field)?,
                driver.placeholder()
            ));
            binds.push(value.clone());
        }

        let sql = format!(
            "UPDATE {} SET {} WHERE {} = {}",
            escaped_table,
            set_parts.join(", "),
            escaped_pk,
            driver.placeholder()
        );
        binds.push(self.id.clone());
        Ok(Statement::new(sql, binds))
    }
}
