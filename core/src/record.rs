//! 查询结果的结构化表示

use serde::Serialize;
use serde_json::Value;

/// 单行记录：列名 → 值，保持列的原始顺序
pub type Record = serde_json::Map<String, Value>;

/// 最近一次终结操作的结果
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum LastResult {
    /// `all()` 返回的多行
    Rows(Vec<Record>),
    /// `get()` / `find()` / `count()` 返回的单行
    Row(Option<Record>),
    /// 写操作影响的行数
    Affected(u64),
}

/// 从计数记录中读取 `{alias}` 列，兼容整数与数字字符串
pub(crate) fn read_count(record: &Record, alias: &str) -> u64 {
    match record.get(alias) {
        Some(Value::Number(n)) => n
            .as_u64()
            .or_else(|| n.as_i64().map(|v| v.max(0) as u64))
            .unwrap_or(0),
        Some(Value::String(s)) => s.parse().unwrap_or(0),
        _ => 0,
    }
}
