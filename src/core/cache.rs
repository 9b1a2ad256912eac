use std::sync::Mutex;

use log::{debug, warn};

use crate::core::error::StoreError;
use crate::core::schema::TableSchema;
use crate::core::store::{RecordStore, TableOp, TabularStore};
use crate::core::types::Table;

/// 带内存缓存的存储：读操作直接用缓存，修改成功写盘后才替换缓存
pub struct CachedStore {
    inner: TabularStore,
    cache: Mutex<Option<Table>>,
}

impl CachedStore {
    pub fn new(inner: TabularStore) -> Self {
        CachedStore {
            inner,
            cache: Mutex::new(None),
        }
    }

    /// 丢弃缓存，下次读取时重新加载文件
    pub fn invalidate(&self) {
        let mut cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
        *cache = None;
    }

    pub fn is_cached(&self) -> bool {
        self.cache
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .is_some()
    }
}

impl RecordStore for CachedStore {
    fn schema(&self) -> &TableSchema {
        self.inner.schema()
    }

    fn load(&self) -> Result<Table, StoreError> {
        let mut cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(table) = cache.as_ref() {
            return Ok(table.clone());
        }
        let table = self.inner.load()?;
        debug!("缓存 {} 条记录", table.len());
        *cache = Some(table.clone());
        Ok(table)
    }

    fn save(&self, table: &Table) -> Result<(), StoreError> {
        let mut cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
        match self.inner.save(table) {
            Ok(()) => {
                *cache = Some(table.clone());
                Ok(())
            }
            Err(e) => {
                warn!("写入 {} 失败，缓存已失效", self.inner.describe());
                *cache = None;
                Err(e)
            }
        }
    }

    fn mutate(&self, op: TableOp<'_>) -> Result<(), StoreError> {
        let mut cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
        let mut table = match cache.as_ref() {
            Some(table) => table.clone(),
            None => self.inner.load()?,
        };
        // 在副本上修改，失败时缓存保持原样
        if !op(&mut table)? {
            return Ok(());
        }
        match self.inner.save(&table) {
            Ok(()) => {
                *cache = Some(table);
                Ok(())
            }
            Err(e) => {
                warn!("写入 {} 失败，缓存已失效", self.inner.describe());
                *cache = None;
                Err(e)
            }
        }
    }
}
