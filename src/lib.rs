pub mod cli;
pub mod core;
pub mod web;

pub use crate::core::error::StoreError;
pub use crate::core::query::{Page, Query, SortSpec};
pub use crate::core::schema::TableSchema;
pub use crate::core::store::{MissingKey, Mutation, RecordStore, TabularStore};
pub use crate::core::types::{Column, ColumnKind, Fields, KeyPolicy, Record, Table, Value};

/// 初始化日志，默认级别 info，可用 RUST_LOG 覆盖
pub fn init_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .try_init();
}
