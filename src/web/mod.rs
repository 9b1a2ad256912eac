//! HTTP 层：把请求一对一映射到存储操作。
//!
//! - `people`：服务端渲染的 HTML 界面（列表/搜索/排序/分页、新增、编辑、删除）
//! - `stocks`：股票 JSON API

pub mod people;
pub mod stocks;

use std::io;
use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use log::{error, info};
use serde_json::json;

use crate::core::error::StoreError;
use crate::core::store::RecordStore;

/// 路由共享的状态
pub struct AppState {
    pub store: Arc<dyn RecordStore>,
    pub page_size: usize,
}

impl AppState {
    pub fn new(store: Arc<dyn RecordStore>, page_size: usize) -> Arc<Self> {
        Arc::new(AppState {
            store,
            page_size: page_size.max(1),
        })
    }
}

/// JSON 错误响应：`{ "error": "..." }`
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        ApiError {
            status,
            message: message.into(),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        let status =
            StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            // 详细信息里有文件路径，只写日志
            error!("{}", err.detailed_message());
            ApiError::new(status, err.brief_message())
        } else {
            ApiError::new(status, err.detailed_message())
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

/// 在阻塞线程池里执行存储操作：整表读写和锁等待都是同步的
pub(crate) async fn with_store<T, F>(state: &AppState, op: F) -> Result<T, StoreError>
where
    T: Send + 'static,
    F: FnOnce(&dyn RecordStore) -> Result<T, StoreError> + Send + 'static,
{
    let store = Arc::clone(&state.store);
    tokio::task::spawn_blocking(move || op(store.as_ref()))
        .await
        .map_err(|e| StoreError::Io(io::Error::new(io::ErrorKind::Other, e)))?
}

/// 在给定地址上启动服务，例如 `"127.0.0.1:5000"`
pub async fn serve(app: Router, addr: &str) -> Result<(), std::io::Error> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await
}
