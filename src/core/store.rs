use std::path::PathBuf;
use std::sync::RwLock;

use crate::core::error::StoreError;
use crate::core::query::{Page, Query};
use crate::core::schema::TableSchema;
use crate::core::storage::{file::CsvFileStorage, memory::MemoryStorage, Storage};
use crate::core::types::{Fields, Record, Table, Value};

/// 主键不存在时的处理方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingKey {
    /// 静默跳过，不写文件
    Ignore,
    /// 返回 NotFound
    Reject,
}

/// 一次修改的结果
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation<T> {
    Applied(T),
    /// MissingKey::Ignore 下主键不存在
    Skipped,
}

/// 一次整表修改：返回 true 表示表被改动，需要写回
pub type TableOp<'a> = Box<dyn FnOnce(&mut Table) -> Result<bool, StoreError> + 'a>;

/// 记录存储的统一接口。每次调用都是 读整表 -> 操作 -> (写整表)
pub trait RecordStore: Send + Sync {
    fn schema(&self) -> &TableSchema;

    fn load(&self) -> Result<Table, StoreError>;

    fn save(&self, table: &Table) -> Result<(), StoreError>;

    /// 在写锁内加载、修改并保存整表
    fn mutate(&self, op: TableOp<'_>) -> Result<(), StoreError>;

    fn parse_key(&self, raw: &str) -> Result<Value, StoreError> {
        let schema = self.schema();
        schema
            .column_for(&schema.key)
            .kind
            .decode(raw)
            .map_err(|e| StoreError::Validation(format!("主键 {}: {}", schema.key, e)))
    }

    fn query(&self, query: &Query) -> Result<Page, StoreError> {
        self.load()?.query(query)
    }

    fn get(&self, key: &Value) -> Result<Record, StoreError> {
        self.load()?.get_by_key(key)
    }

    /// 插入一条记录，返回带主键的完整记录
    fn insert(&self, fields: Fields) -> Result<Record, StoreError> {
        self.schema().check_required(&fields)?;
        let mut inserted = None;
        self.mutate(Box::new(|table: &mut Table| {
            let key = table.insert(fields)?;
            inserted = Some(table.get_by_key(&key)?);
            Ok(true)
        }))?;
        inserted.ok_or_else(|| StoreError::Validation("插入没有生效".to_string()))
    }

    fn update(
        &self,
        key: &Value,
        fields: Fields,
        missing: MissingKey,
    ) -> Result<Mutation<Record>, StoreError> {
        update_with(self, key, missing, |_| fields)
    }

    /// 同 `update`，但忽略表中没有的字段
    fn update_known(
        &self,
        key: &Value,
        fields: Fields,
        missing: MissingKey,
    ) -> Result<Mutation<Record>, StoreError> {
        update_with(self, key, missing, |table| table.known_fields(fields))
    }

    /// 删除主键相等的所有记录
    fn delete(&self, key: &Value, missing: MissingKey) -> Result<Mutation<usize>, StoreError> {
        let mut outcome = Mutation::Skipped;
        self.mutate(Box::new(|table: &mut Table| {
            let removed = table.delete_by_key(key);
            if removed > 0 {
                outcome = Mutation::Applied(removed);
                Ok(true)
            } else if missing == MissingKey::Ignore {
                Ok(false)
            } else {
                Err(StoreError::not_found(&table.key_column().name, key))
            }
        }))?;
        Ok(outcome)
    }

    /// 按行号更新，行号越界返回 NotFound
    fn update_at(&self, index: usize, fields: Fields) -> Result<Record, StoreError> {
        let mut updated = None;
        self.mutate(Box::new(|table: &mut Table| {
            updated = Some(table.update_at(index, fields)?);
            Ok(true)
        }))?;
        updated.ok_or_else(|| StoreError::not_found("#row", index))
    }

    fn delete_at(&self, index: usize) -> Result<Record, StoreError> {
        let mut removed = None;
        self.mutate(Box::new(|table: &mut Table| {
            removed = Some(table.delete_at(index)?);
            Ok(true)
        }))?;
        removed.ok_or_else(|| StoreError::not_found("#row", index))
    }
}

// 字段在写锁内、拿到当前表之后才确定
fn update_with<S, F>(
    store: &S,
    key: &Value,
    missing: MissingKey,
    fields: F,
) -> Result<Mutation<Record>, StoreError>
where
    S: RecordStore + ?Sized,
    F: FnOnce(&Table) -> Fields,
{
    let mut outcome = Mutation::Skipped;
    store.mutate(Box::new(|table: &mut Table| {
        let fields = fields(table);
        match table.update_by_key(key, fields) {
            Ok(record) => {
                outcome = Mutation::Applied(record);
                Ok(true)
            }
            Err(StoreError::NotFound { .. }) if missing == MissingKey::Ignore => Ok(false),
            Err(e) => Err(e),
        }
    }))?;
    Ok(outcome)
}

/// 整文件表存储：不缓存，每次调用都重新读取文件
pub struct TabularStore {
    storage: Box<dyn Storage>,
    schema: TableSchema,
    // 读操作可以并行，写操作独占
    lock: RwLock<()>,
}

impl TabularStore {
    pub fn new(storage: Box<dyn Storage>, schema: TableSchema) -> Self {
        TabularStore {
            storage,
            schema,
            lock: RwLock::new(()),
        }
    }

    pub fn open(path: impl Into<PathBuf>, schema: TableSchema) -> Self {
        Self::new(Box::new(CsvFileStorage::new(path)), schema)
    }

    pub fn in_memory(schema: TableSchema) -> Self {
        Self::new(Box::new(MemoryStorage::new()), schema)
    }

    pub fn describe(&self) -> String {
        self.storage.describe()
    }
}

impl RecordStore for TabularStore {
    fn schema(&self) -> &TableSchema {
        &self.schema
    }

    fn load(&self) -> Result<Table, StoreError> {
        let _guard = self.lock.read().unwrap_or_else(|e| e.into_inner());
        self.storage.load(&self.schema)
    }

    fn save(&self, table: &Table) -> Result<(), StoreError> {
        let _guard = self.lock.write().unwrap_or_else(|e| e.into_inner());
        self.storage.save(table)
    }

    fn mutate(&self, op: TableOp<'_>) -> Result<(), StoreError> {
        let _guard = self.lock.write().unwrap_or_else(|e| e.into_inner());
        let mut table = self.storage.load(&self.schema)?;
        if op(&mut table)? {
            self.storage.save(&table)?;
        }
        Ok(())
    }
}
