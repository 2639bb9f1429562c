//! Delete Builder - 按主键删除单行

use super::Statement;
use crate::clause::BindValue;
use crate::connection::DbDriver;
use crate::error::Result;
use crate::utils::{quote_field, quote_table, require_table};

/// Delete Builder
///
/// 只支持按主键删除，不提供无条件删除整表
#[derive(Debug, Clone)]
pub struct DeleteBuilder {
    pk: String,
    id: BindValue,
}

impl DeleteBuilder {
    /// 创建 DeleteBuilder，主键列默认为 `id`
    pub fn new(id: impl Into<BindValue>) -> Self {
        Self {
            pk: "id".to_string(),
            id: id.into(),
        }
    }

    pub fn primary_key(mut self, pk: &str) -> Self {
        self.pk = pk.to_string();
        self
    }

    /// 渲染 `DELETE FROM {table} WHERE {pk} = ?`
    pub fn into_statement(&self, driver: DbDriver, table: Option<&str>) -> Result<Statement> {
        let table = require_table(table)?;
        let sql = format!(
            "DELETE FROM {} WHERE {} = {}",
            quote_table(driver, table)?,
            quote_field(driver, &self.pk)?,
            driver.placeholder()
        );
        Ok(Statement::new(sql, vec![self.id.clone()]))
    }
}
