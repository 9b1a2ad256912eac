use crate::core::types::Value;
use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO错误: {0}")]
    Io(#[from] io::Error),

    #[error("解析错误: {0}")]
    Parse(String),

    #[error("校验错误: {0}")]
    Validation(String),

    #[error("记录不存在: {column} = {key}")]
    NotFound { column: String, key: String },

    #[error("主键重复: {column} = {key}")]
    DuplicateKey { column: String, key: Value },
}

impl StoreError {
    pub(crate) fn not_found(column: &str, key: impl ToString) -> Self {
        StoreError::NotFound {
            column: column.to_string(),
            key: key.to_string(),
        }
    }

    // 获取详细的错误信息
    pub fn detailed_message(&self) -> String {
        self.to_string()
    }

    // 获取简略的错误信息
    pub fn brief_message(&self) -> String {
        match self {
            StoreError::Io(_) => "Error: IO error".to_string(),
            StoreError::Parse(_) => "Error: Malformed table file".to_string(),
            StoreError::Validation(_) => "Error: Invalid input".to_string(),
            StoreError::NotFound { .. } => "Error: Record not found".to_string(),
            StoreError::DuplicateKey { .. } => "Error: Duplicate key".to_string(),
        }
    }

    /// 映射为 HTTP 状态码
    pub fn status_code(&self) -> u16 {
        match self {
            StoreError::NotFound { .. } => 404,
            StoreError::Validation(_) => 400,
            StoreError::DuplicateKey { .. } => 409,
            StoreError::Parse(_) | StoreError::Io(_) => 500,
        }
    }
}

impl From<csv::Error> for StoreError {
    fn from(err: csv::Error) -> Self {
        let message = err.to_string();
        match err.into_kind() {
            csv::ErrorKind::Io(e) => StoreError::Io(e),
            _ => StoreError::Parse(message),
        }
    }
}
