//! 工具函数模块：标识符校验与转义

use crate::connection::DbDriver;
use crate::error::{FlezyError, Result};

/// MySQL 单个标识符的最大长度
const MAX_IDENTIFIER_LEN: usize = 64;

/// 验证单段标识符是否安全（仅允许 ASCII 字母、数字和下划线）
pub fn is_safe_identifier(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= MAX_IDENTIFIER_LEN
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// 验证表名是否安全，允许 `schema.table` 形式
pub fn is_safe_table_name(name: &str) -> bool {
    name.split('.').all(is_safe_identifier)
}

/// 验证字段名是否安全，允许 `table.column` 形式
pub fn is_safe_field_name(name: &str) -> bool {
    name.split('.').all(is_safe_identifier)
}

/// 转义 SQL 标识符，点号分隔的每一段单独加引号
pub fn escape_identifier(driver: DbDriver, name: &str) -> String {
    name.split('.')
        .map(|part| match driver {
            DbDriver::MySql => format!("`{}`", part),
            DbDriver::Sqlite => format!("\"{}\"", part),
        })
        .collect::<Vec<_>>()
        .join(".")
}

/// 取出已选择的表名，未选择或为空白时返回 `MissingTable`
pub fn require_table(table: Option<&str>) -> Result<&str> {
    match table.map(str::trim) {
        Some(name) if !name.is_empty() => Ok(name),
        _ => Err(FlezyError::MissingTable),
    }
}

/// 校验表名并返回转义后的结果
pub fn quote_table(driver: DbDriver, name: &str) -> Result<String> {
    if !is_safe_table_name(name) {
        return Err(FlezyError::InvalidIdentifier(format!(
            "table name '{}'",
            name
        )));
    }
    Ok(escape_identifier(driver, name))
}

/// 校验字段名并返回转义后的结果
pub fn quote_field(driver: DbDriver, name: &str) -> Result<String> {
    let name = name.trim();
    if !is_safe_field_name(name) {
        return Err(FlezyError::InvalidIdentifier(format!(
            "field name '{}'",
            name
        )));
    }
    Ok(escape_identifier(driver, name))
}

/// 解析 `select()` 传入的逗号分隔字段列表
///
/// `*` 与 `table.*` 原样保留，其余字段逐个校验并转义。
pub fn quote_select_list(driver: DbDriver, fields: &str) -> Result<String> {
    let mut quoted = Vec::new();
    for field in fields.split(',') {
        let field = field.trim();
        if field == "*" {
            quoted.push("*".to_string());
        } else if let Some(table) = field.strip_suffix(".*") {
            quoted.push(format!("{}.*", quote_table(driver, table)?));
        } else {
            quoted.push(quote_field(driver, field)?);
        }
    }
    Ok(quoted.join(", "))
}
