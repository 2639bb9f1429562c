//! 命令行参数中的 `FIELD=VALUE` 解析

use anyhow::{bail, Result};
use flezy::BindValue;

/// 把字面量转换为绑定值：`null`、`true`/`false`、整数、浮点数，其余按字符串处理
///
/// 需要字符串形式的数字时用引号包起来，例如 `phone='0000'`。
pub fn parse_value(raw: &str) -> BindValue {
    if let Some(quoted) = strip_quotes(raw) {
        return BindValue::String(quoted.to_string());
    }
    match raw {
        "null" | "NULL" => BindValue::Null,
        "true" => BindValue::Bool(true),
        "false" => BindValue::Bool(false),
        _ => {
            if let Ok(i) = raw.parse::<i64>() {
                BindValue::Int64(i)
            } else if let Ok(f) = raw.parse::<f64>() {
                if f.is_finite() {
                    BindValue::Float64(f)
                } else {
                    BindValue::String(raw.to_string())
                }
            } else {
                BindValue::String(raw.to_string())
            }
        }
    }
}

fn strip_quotes(raw: &str) -> Option<&str> {
    if raw.len() < 2 {
        return None;
    }
    ['\'', '"']
        .iter()
        .find_map(|q| raw.strip_prefix(*q).and_then(|s| s.strip_suffix(*q)))
}

/// 解析 `FIELD=VALUE`
pub fn parse_assignment(raw: &str) -> Result<(String, BindValue)> {
    let Some((field, value)) = raw.split_once('=') else {
        bail!("expected FIELD=VALUE, got '{}'", raw);
    };
    let field = field.trim();
    if field.is_empty() {
        bail!("empty field name in '{}'", raw);
    }
    Ok((field.to_string(), parse_value(value)))
}

/// 解析 `FIELD=VALUE`，值始终按字符串处理（用于 LIKE）
pub fn parse_text_assignment(raw: &str) -> Result<(String, String)> {
    let (field, value) = parse_assignment(raw)?;
    let text = match value {
        BindValue::String(s) => s,
        _ => raw
            .split_once('=')
            .map(|(_, v)| v.to_string())
            .unwrap_or_default(),
    };
    Ok((field, text))
}
