use std::cmp::Ordering;

use crate::core::error::StoreError;
use crate::core::types::{Record, Table, Value};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortSpec {
    pub column: String,
    pub ascending: bool,
}

/// 列表查询：过滤 -> 排序 -> 分页
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    /// 忽略大小写的子串，匹配任意一列；空串匹配全部
    pub filter: String,
    pub sort: Option<SortSpec>,
    /// 从 1 开始
    pub page: usize,
    pub page_size: usize,
}

#[derive(Debug, Clone)]
pub struct Page {
    pub records: Vec<Record>,
    /// 过滤之后、分页之前的条数
    pub total: usize,
    pub page: usize,
    pub page_size: usize,
}

impl Default for Query {
    fn default() -> Self {
        Query {
            filter: String::new(),
            sort: None,
            page: 1,
            page_size: 5,
        }
    }
}

impl Query {
    pub fn new(page: usize, page_size: usize) -> Self {
        Query {
            page,
            page_size,
            ..Query::default()
        }
    }

    pub fn filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = filter.into();
        self
    }

    pub fn sort_by(mut self, column: impl Into<String>, ascending: bool) -> Self {
        self.sort = Some(SortSpec {
            column: column.into(),
            ascending,
        });
        self
    }

    /// 不分页：一页装下全部结果
    pub fn all() -> Self {
        Query::new(1, usize::MAX)
    }
}

impl Page {
    pub fn page_count(&self) -> usize {
        if self.total == 0 {
            0
        } else {
            (self.total - 1) / self.page_size + 1
        }
    }
}

fn row_matches(row: &[Value], needle: &str) -> bool {
    row.iter()
        .any(|value| value.to_string().to_lowercase().contains(needle))
}

impl Table {
    pub fn query(&self, query: &Query) -> Result<Page, StoreError> {
        if query.page == 0 || query.page_size == 0 {
            return Err(StoreError::Validation("page 和 page_size 必须大于 0".to_string()));
        }

        let needle = query.filter.to_lowercase();
        let mut rows: Vec<&Vec<Value>> = self
            .rows()
            .iter()
            .filter(|row| needle.is_empty() || row_matches(row, &needle))
            .collect();

        // 未知列不排序
        if let Some(sort) = &query.sort {
            if let Some(index) = self.column_index(&sort.column) {
                rows.sort_by(|a, b| {
                    let (a, b) = (&a[index], &b[index]);
                    match (a.is_empty(), b.is_empty()) {
                        (true, true) => Ordering::Equal,
                        (true, false) => Ordering::Greater,
                        (false, true) => Ordering::Less,
                        _ if sort.ascending => a.sort_cmp(b),
                        _ => b.sort_cmp(a),
                    }
                });
            }
        }

        let total = rows.len();
        let offset = (query.page - 1).saturating_mul(query.page_size);
        let records = rows
            .into_iter()
            .skip(offset)
            .take(query.page_size)
            .map(|row| self.record_from_row(row))
            .collect();

        Ok(Page {
            records,
            total,
            page: query.page,
            page_size: query.page_size,
        })
    }
}
