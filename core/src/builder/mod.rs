//! 写操作 Builder 模块
//!
//! 提供 InsertBuilder、UpdateBuilder 和 DeleteBuilder，把数据映射渲染成带绑定参数的语句

pub mod delete_builder;
pub mod insert_builder;
pub mod update_builder;

pub use delete_builder::DeleteBuilder;
pub use insert_builder::InsertBuilder;
pub use update_builder::UpdateBuilder;

use crate::clause::BindValue;

/// 编译后的语句：SQL 文本与按顺序排列的绑定值
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub binds: Vec<BindValue>,
}

impl Statement {
    pub fn new(sql: impl Into<String>, binds: Vec<BindValue>) -> Self {
        Self {
            sql: sql.into(),
            binds,
        }
    }
}

/// 按插入顺序保存的字段映射，重复的字段保留首次出现的位置、使用最后一次的值
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldValues {
    entries: Vec<(String, BindValue)>,
}

impl FieldValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, field: impl Into<String>, value: impl Into<BindValue>) {
        let field = field.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(name, _)| *name == field) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((field, value)),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &BindValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<K, V> FromIterator<(K, V)> for FieldValues
where
    K: Into<String>,
    V: Into<BindValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut values = FieldValues::new();
        for (field, value) in iter {
            values.set(field, value);
        }
        values
    }
}
