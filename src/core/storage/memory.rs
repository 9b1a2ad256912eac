use std::sync::Mutex;

use super::Storage;
use crate::core::error::StoreError;
use crate::core::schema::TableSchema;
use crate::core::types::Table;

/// 内存存储，不落盘
pub struct MemoryStorage {
    table: Mutex<Option<Table>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        MemoryStorage {
            table: Mutex::new(None),
        }
    }

    /// 预置一张表
    pub fn with_table(table: Table) -> Self {
        MemoryStorage {
            table: Mutex::new(Some(table)),
        }
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl Storage for MemoryStorage {
    fn load(&self, schema: &TableSchema) -> Result<Table, StoreError> {
        let guard = self.table.lock().unwrap_or_else(|e| e.into_inner());
        match guard.as_ref() {
            Some(table) => Ok(table.clone()),
            None => schema.empty_table(),
        }
    }

    fn save(&self, table: &Table) -> Result<(), StoreError> {
        let mut guard = self.table.lock().unwrap_or_else(|e| e.into_inner());
        *guard = Some(table.clone());
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}
