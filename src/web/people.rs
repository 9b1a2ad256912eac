//! 通用记录表的 HTML 界面。
//!
//! 主键不存在时编辑和删除都静默跳过（`MissingKey::Ignore`），然后重定向回列表。

use std::sync::Arc;

use axum::extract::{Form, Path, Query as QueryParams, State};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::Router;
use serde::Deserialize;

use super::{with_store, ApiError, AppState};
use crate::core::error::StoreError;
use crate::core::query::{Page, Query};
use crate::core::store::MissingKey;
use crate::core::types::{Fields, Value};

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    #[serde(default)]
    pub search: String,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
    // 非数字的页码按第 1 页处理
    pub page: Option<String>,
}

struct ListView {
    search: String,
    sort_by: String,
    ascending: bool,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/add", post(add))
        .route("/edit/:id", post(edit))
        .route("/delete/:id", get(delete))
        .with_state(state)
}

async fn index(
    State(state): State<Arc<AppState>>,
    QueryParams(params): QueryParams<ListParams>,
) -> Response {
    let view = ListView {
        search: params.search,
        sort_by: params
            .sort_by
            .unwrap_or_else(|| state.store.schema().key.clone()),
        ascending: params.sort_order.as_deref().unwrap_or("asc") == "asc",
    };
    let page = params
        .page
        .as_deref()
        .and_then(|p| p.trim().parse::<usize>().ok())
        .unwrap_or(1)
        .max(1);

    let query = Query::new(page, state.page_size)
        .filter(view.search.clone())
        .sort_by(view.sort_by.clone(), view.ascending);

    let result = with_store(&state, move |store| {
        let table = store.load()?;
        let page = table.query(&query)?;
        Ok((table.column_names(), table.key_column().name.clone(), page))
    })
    .await;
    match result {
        Ok((columns, key, page)) => Html(render_index(&columns, &key, &page, &view)).into_response(),
        Err(e) => error_page(e),
    }
}

async fn add(State(state): State<Arc<AppState>>, Form(form): Form<Vec<(String, String)>>) -> Response {
    let result = with_store(&state, move |store| store.insert(form_fields(form))).await;
    redirect_or_error(result)
}

async fn edit(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Form(form): Form<Vec<(String, String)>>,
) -> Response {
    let result = with_store(&state, move |store| {
        let key = store.parse_key(&id)?;
        store.update(&key, form_fields(form), MissingKey::Ignore)
    })
    .await;
    redirect_or_error(result)
}

async fn delete(State(state): State<Arc<AppState>>, Path(id): Path<String>) -> Response {
    let result = with_store(&state, move |store| {
        let key = store.parse_key(&id)?;
        store.delete(&key, MissingKey::Ignore)
    })
    .await;
    redirect_or_error(result)
}

fn redirect_or_error<T>(result: Result<T, StoreError>) -> Response {
    match result {
        Ok(_) => Redirect::to("/").into_response(),
        Err(e) => error_page(e),
    }
}

fn form_fields(form: Vec<(String, String)>) -> Fields {
    form.into_iter()
        .map(|(name, value)| (name, Value::Text(value)))
        .collect()
}

fn error_page(err: StoreError) -> Response {
    let err = ApiError::from(err);
    let body = format!(
        "<!DOCTYPE html>\n<html><body><h1>{}</h1><p>{}</p><a href=\"/\">Back</a></body></html>\n",
        err.status,
        escape(&err.message)
    );
    (err.status, Html(body)).into_response()
}

fn render_index(columns: &[String], key: &str, page: &Page, view: &ListView) -> String {
    let mut html = String::from(
        "<!DOCTYPE html>\n<html>\n<head><meta charset=\"utf-8\"><title>Records</title></head>\n<body>\n",
    );

    html.push_str(&format!(
        "<form method=\"get\" action=\"/\"><input type=\"text\" name=\"search\" value=\"{}\"> \
         <button type=\"submit\">Search</button></form>\n",
        escape(&view.search)
    ));

    // 点击当前排序列时切换方向
    html.push_str("<table>\n<tr>");
    for column in columns {
        let order = if *column == view.sort_by && view.ascending {
            "desc"
        } else {
            "asc"
        };
        html.push_str(&format!(
            "<th><a href=\"{}\">{}</a></th>",
            escape(&list_url(&view.search, column, order, 1)),
            escape(column)
        ));
    }
    html.push_str("<th></th></tr>\n");

    for record in &page.records {
        let id = record.get(key).map(|v| v.to_string()).unwrap_or_default();
        html.push_str("<tr>");
        for value in record.values() {
            html.push_str(&format!("<td>{}</td>", escape(&value.to_string())));
        }
        html.push_str(&format!(
            "<td><form method=\"post\" action=\"/edit/{}\">",
            encode_component(&id)
        ));
        for (name, value) in record.iter().filter(|(name, _)| *name != key) {
            html.push_str(&format!(
                "<input type=\"text\" name=\"{}\" value=\"{}\">",
                escape(&name.to_lowercase()),
                escape(&value.to_string())
            ));
        }
        html.push_str(&format!(
            "<button type=\"submit\">Save</button></form> <a href=\"/delete/{}\">Delete</a></td></tr>\n",
            encode_component(&id)
        ));
    }
    html.push_str("</table>\n");

    let order = if view.ascending { "asc" } else { "desc" };
    let page_count = page.page_count().max(1);
    html.push_str(&format!(
        "<p>Page {} of {} ({} records)</p>\n",
        page.page, page_count, page.total
    ));
    if page.page > 1 {
        html.push_str(&format!(
            "<a href=\"{}\">Previous</a>\n",
            escape(&list_url(&view.search, &view.sort_by, order, page.page - 1))
        ));
    }
    if page.page < page_count {
        html.push_str(&format!(
            "<a href=\"{}\">Next</a>\n",
            escape(&list_url(&view.search, &view.sort_by, order, page.page + 1))
        ));
    }

    html.push_str("<form method=\"post\" action=\"/add\">");
    for column in columns.iter().filter(|c| *c != key) {
        html.push_str(&format!(
            "<input type=\"text\" name=\"{}\" placeholder=\"{}\">",
            escape(&column.to_lowercase()),
            escape(column)
        ));
    }
    html.push_str("<button type=\"submit\">Add</button></form>\n</body>\n</html>\n");
    html
}

fn list_url(search: &str, sort_by: &str, order: &str, page: usize) -> String {
    format!(
        "/?search={}&sort_by={}&sort_order={}&page={}",
        encode_component(search),
        encode_component(sort_by),
        order,
        page
    )
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

// URL 组件的百分号编码，只保留 unreserved 字符
fn encode_component(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for b in text.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => out.push(b as char),
            _ => out.push_str(&format!("%{:02X}", b)),
        }
    }
    out
}
