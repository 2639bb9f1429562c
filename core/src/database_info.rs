//! 数据库信息抽象层
//!
//! 提供统一的接口来访问不同数据库的特性：影响行数，
//! 以及把驱动返回的行解码为 [`Record`]。

use crate::error::Result;
use crate::record::Record;
use sqlx::Database;

/// 数据库信息 trait
///
/// 每个数据库类型（`sqlx::MySql`, `sqlx::Sqlite`）都需要实现此 trait，
/// 执行器只依赖这里的方法，因此可以对不同数据库使用同一套泛型实现。
pub trait DatabaseInfo: Database {
    /// 从执行结果中读取影响的行数
    fn rows_affected(result: &Self::QueryResult) -> u64;

    /// 把一行解码为列名到 JSON 值的映射
    fn row_to_record(row: &Self::Row) -> Result<Record>;
}

// ========== MySQL 实现 ==========

#[cfg(feature = "mysql")]
mod mysql {
    use super::DatabaseInfo;
    use crate::error::Result;
    use crate::record::Record;
    use bigdecimal::BigDecimal;
    use serde_json::Value;
    use sqlx::mysql::{MySqlQueryResult, MySqlRow};
    use sqlx::{Column, Row, TypeInfo, ValueRef};

    impl DatabaseInfo for sqlx::MySql {
        fn rows_affected(result: &MySqlQueryResult) -> u64 {
            result.rows_affected()
        }

        fn row_to_record(row: &MySqlRow) -> Result<Record> {
            let mut record = Record::new();
            for (index, column) in row.columns().iter().enumerate() {
                let raw = row.try_get_raw(index)?;
                let value = if raw.is_null() {
                    Value::Null
                } else {
                    let type_name = raw.type_info().name().to_string();
                    decode_column(row, index, &type_name)?
                };
                record.insert(column.name().to_string(), value);
            }
            Ok(record)
        }
    }

    fn decode_column(row: &MySqlRow, index: usize, type_name: &str) -> Result<Value> {
        let value = match type_name {
            "BOOLEAN" => Value::Bool(row.try_get_unchecked::<bool, _>(index)?),
            "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "BIGINT" | "YEAR" => {
                Value::from(row.try_get_unchecked::<i64, _>(index)?)
            }
            "BIT" => Value::from(row.try_get_unchecked::<u64, _>(index)?),
            t if t.ends_with("UNSIGNED") => Value::from(row.try_get_unchecked::<u64, _>(index)?),
            "FLOAT" => float_value(f64::from(row.try_get_unchecked::<f32, _>(index)?)),
            "DOUBLE" => float_value(row.try_get_unchecked::<f64, _>(index)?),
            "DECIMAL" => Value::String(row.try_get_unchecked::<BigDecimal, _>(index)?.to_string()),
            "DATE" => Value::String(
                row.try_get_unchecked::<chrono::NaiveDate, _>(index)?
                    .to_string(),
            ),
            "TIME" => Value::String(
                row.try_get_unchecked::<chrono::NaiveTime, _>(index)?
                    .to_string(),
            ),
            "DATETIME" | "TIMESTAMP" => Value::String(
                row.try_get_unchecked::<chrono::NaiveDateTime, _>(index)?
                    .to_string(),
            ),
            "JSON" => row.try_get_unchecked::<Value, _>(index)?,
            "BLOB" | "TINYBLOB" | "MEDIUMBLOB" | "LONGBLOB" | "BINARY" | "VARBINARY"
            | "GEOMETRY" => {
                let bytes = row.try_get_unchecked::<Vec<u8>, _>(index)?;
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            }
            // VARCHAR / CHAR / TEXT / ENUM / SET
            _ => Value::String(row.try_get_unchecked::<String, _>(index)?),
        };
        Ok(value)
    }

    fn float_value(f: f64) -> Value {
        serde_json::Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or(Value::Null)
    }
}

// ========== SQLite 实现 ==========

#[cfg(feature = "sqlite")]
mod sqlite {
    use super::DatabaseInfo;
    use crate::error::Result;
    use crate::record::Record;
    use serde_json::Value;
    use sqlx::sqlite::{SqliteQueryResult, SqliteRow};
    use sqlx::{Column, Row, TypeInfo, ValueRef};

    impl DatabaseInfo for sqlx::Sqlite {
        fn rows_affected(result: &SqliteQueryResult) -> u64 {
            result.rows_affected()
        }

        fn row_to_record(row: &SqliteRow) -> Result<Record> {
            let mut record = Record::new();
            for (index, column) in row.columns().iter().enumerate() {
                let raw = row.try_get_raw(index)?;
                let value = if raw.is_null() {
                    Value::Null
                } else {
                    // SQLite 是动态类型，这里拿到的是值本身的存储类型
                    let type_name = raw.type_info().name().to_ascii_uppercase();
                    decode_column(row, index, &type_name)?
                };
                record.insert(column.name().to_string(), value);
            }
            Ok(record)
        }
    }

    fn decode_column(row: &SqliteRow, index: usize, type_name: &str) -> Result<Value> {
        let value = match type_name {
            "NULL" => Value::Null,
            "BOOLEAN" => Value::Bool(row.try_get_unchecked::<bool, _>(index)?),
            "INTEGER" | "INT" | "INT4" | "INT8" | "BIGINT" => {
                Value::from(row.try_get_unchecked::<i64, _>(index)?)
            }
            "REAL" | "FLOAT" | "DOUBLE" | "NUMERIC" => {
                let f = row.try_get_unchecked::<f64, _>(index)?;
                serde_json::Number::from_f64(f)
                    .map(Value::Number)
                    .unwrap_or(Value::Null)
            }
            "BLOB" => {
                let bytes = row.try_get_unchecked::<Vec<u8>, _>(index)?;
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            }
            // TEXT / DATE / DATETIME / TIME
            _ => Value::String(row.try_get_unchecked::<String, _>(index)?),
        };
        Ok(value)
    }
}
