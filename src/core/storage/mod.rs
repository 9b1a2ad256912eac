pub mod file;
pub mod memory;

use crate::core::error::StoreError;
use crate::core::schema::TableSchema;
use crate::core::types::Table;

/// 整表读写的持久化后端
pub trait Storage: Send + Sync {
    /// 读取整张表；不存在时返回 schema 的空表
    fn load(&self, schema: &TableSchema) -> Result<Table, StoreError>;

    /// 用整张表覆盖已有内容
    fn save(&self, table: &Table) -> Result<(), StoreError>;

    /// 用于日志的描述
    fn describe(&self) -> String;
}
