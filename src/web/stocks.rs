//! 股票 JSON API。
//!
//! 主键不存在时更新和删除都返回 404（`MissingKey::Reject`）。
//!
//! - `GET /stocks` — 列表，可选 `search`、`sort_by`、`sort_order`、`page`、`per_page`
//! - `GET /stock/:code` — 单条记录
//! - `POST /stock` — 新增，必须提供所有列
//! - `PUT /stock/:code` — 部分更新，忽略未知字段
//! - `DELETE /stock/:code` — 删除

use std::sync::Arc;

use axum::extract::{Path, Query as QueryParams, State};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Map};

use super::{with_store, ApiError, AppState};
use crate::core::error::StoreError;
use crate::core::query::Query;
use crate::core::store::{MissingKey, Mutation};
use crate::core::types::{Fields, Record, Value};

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    #[serde(default)]
    pub search: String,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
    pub page: Option<usize>,
    pub per_page: Option<usize>,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/stocks", get(list_stocks))
        .route("/stock", axum::routing::post(create_stock))
        .route(
            "/stock/:code",
            get(get_stock).put(update_stock).delete(delete_stock),
        )
        .with_state(state)
}

/// NotFound 统一成 "Stock not found"
fn stock_error(err: StoreError) -> ApiError {
    match err {
        StoreError::NotFound { .. } => ApiError::new(StatusCode::NOT_FOUND, "Stock not found"),
        other => ApiError::from(other),
    }
}

fn json_to_value(name: &str, value: serde_json::Value) -> Result<Value, ApiError> {
    match value {
        serde_json::Value::Null => Ok(Value::Empty),
        serde_json::Value::Bool(b) => Ok(Value::Text(b.to_string())),
        serde_json::Value::Number(n) => match n.as_i64() {
            Some(i) => Ok(Value::Int(i)),
            None => n.as_f64().map(Value::Float).ok_or_else(|| {
                ApiError::new(StatusCode::BAD_REQUEST, format!("{}: 数值超出范围", name))
            }),
        },
        serde_json::Value::String(s) => Ok(Value::Text(s)),
        _ => Err(ApiError::new(
            StatusCode::BAD_REQUEST,
            format!("{}: 只接受标量值", name),
        )),
    }
}

fn json_fields(body: Map<String, serde_json::Value>) -> Result<Fields, ApiError> {
    body.into_iter()
        .map(|(name, value)| {
            let value = json_to_value(&name, value)?;
            Ok((name, value))
        })
        .collect()
}

async fn list_stocks(
    State(state): State<Arc<AppState>>,
    QueryParams(params): QueryParams<ListParams>,
) -> Result<impl IntoResponse, ApiError> {
    // 不带 page 时返回全部
    let mut query = match params.page {
        Some(page) => Query::new(page, params.per_page.unwrap_or(state.page_size)),
        None => Query::all(),
    }
    .filter(params.search);
    if let Some(sort_by) = params.sort_by {
        let ascending = params.sort_order.as_deref().unwrap_or("asc") == "asc";
        query = query.sort_by(sort_by, ascending);
    }

    let page = with_store(&state, move |store| store.query(&query))
        .await
        .map_err(stock_error)?;
    let mut headers = HeaderMap::new();
    headers.insert("x-total-count", HeaderValue::from(page.total));
    Ok((headers, Json(page.records)))
}

async fn get_stock(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
) -> Result<Json<Record>, ApiError> {
    with_store(&state, move |store| {
        let key = store.parse_key(&code)?;
        store.get(&key)
    })
    .await
    .map(Json)
    .map_err(stock_error)
}

async fn create_stock(
    State(state): State<Arc<AppState>>,
    Json(body): Json<Map<String, serde_json::Value>>,
) -> Result<impl IntoResponse, ApiError> {
    let fields = json_fields(body)?;
    if state.store.schema().check_required(&fields).is_err() {
        return Err(ApiError::new(StatusCode::BAD_REQUEST, "Missing data"));
    }
    let record = with_store(&state, move |store| store.insert(fields))
        .await
        .map_err(stock_error)?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// 请求里不是列名的字段直接忽略
async fn update_stock(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
    Json(body): Json<Map<String, serde_json::Value>>,
) -> Result<Json<Record>, ApiError> {
    let fields = json_fields(body)?;
    let outcome = with_store(&state, move |store| {
        let key = store.parse_key(&code)?;
        match store.update_known(&key, fields, MissingKey::Reject)? {
            Mutation::Applied(record) => Ok(record),
            Mutation::Skipped => Err(StoreError::not_found(&store.schema().key, &key)),
        }
    })
    .await;
    outcome.map(Json).map_err(stock_error)
}

async fn delete_stock(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    with_store(&state, move |store| {
        let key = store.parse_key(&code)?;
        store.delete(&key, MissingKey::Reject)
    })
    .await
    .map_err(stock_error)?;
    Ok(Json(json!({ "message": "Stock deleted" })))
}
