pub mod cache;
pub mod error;
pub mod query;
pub mod schema;
pub mod stock_file;
pub mod storage;
pub mod store;
pub mod types;
