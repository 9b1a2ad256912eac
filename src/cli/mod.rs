mod formatter;

pub use formatter::TableFormatter;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use axum::Router;
use clap::{Parser, Subcommand, ValueEnum};
use log::info;

use crate::core::cache::CachedStore;
use crate::core::query::Query;
use crate::core::schema::TableSchema;
use crate::core::stock_file::{read_stock_file, StockQuote};
use crate::core::store::{MissingKey, Mutation, RecordStore, TabularStore};
use crate::core::types::{Fields, Value};
use crate::web::{self, AppState};

/// 应用配置：people 是通用表 + HTML 界面，stocks 是股票表 + JSON API
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum AppKind {
    People,
    Stocks,
}

impl AppKind {
    pub fn schema(&self) -> TableSchema {
        match self {
            AppKind::People => TableSchema::people(),
            AppKind::Stocks => TableSchema::stocks(),
        }
    }

    pub fn default_file(&self) -> PathBuf {
        match self {
            AppKind::People => PathBuf::from("data.csv"),
            AppKind::Stocks => PathBuf::from("stock_data.csv"),
        }
    }

    pub fn router(&self, state: Arc<AppState>) -> Router {
        match self {
            AppKind::People => web::people::router(state),
            AppKind::Stocks => web::stocks::router(state),
        }
    }
}

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[arg(long, value_enum, default_value_t = AppKind::People, global = true)]
    pub app: AppKind,

    /// 表文件路径，默认 people 为 data.csv，stocks 为 stock_data.csv
    #[arg(short, long, env = "TABULAR_FILE", global = true)]
    pub file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// 启动 HTTP 服务
    Serve {
        #[arg(long, env = "TABULAR_ADDR", default_value = "127.0.0.1:5000")]
        addr: String,
        #[arg(long, default_value_t = 5)]
        page_size: usize,
        /// 在内存中缓存整表，修改时刷新
        #[arg(long)]
        cache: bool,
    },
    /// 列出记录
    List {
        #[arg(long, default_value = "")]
        search: String,
        #[arg(long)]
        sort_by: Option<String>,
        #[arg(long)]
        desc: bool,
        #[arg(long, default_value_t = 1)]
        page: usize,
        #[arg(long, default_value_t = 5)]
        page_size: usize,
    },
    /// 新增记录，字段写成 NAME=VALUE
    Add {
        #[arg(value_parser = parse_field, required = true)]
        fields: Vec<(String, String)>,
    },
    /// 更新记录
    Update {
        /// 主键值；带 --row 时为从 0 开始的行号
        target: String,
        #[arg(value_parser = parse_field, required = true)]
        fields: Vec<(String, String)>,
        #[arg(long)]
        row: bool,
        /// 主键不存在时报错而不是跳过
        #[arg(long)]
        strict: bool,
    },
    /// 删除记录
    Delete {
        target: String,
        #[arg(long)]
        row: bool,
        #[arg(long)]
        strict: bool,
    },
    /// 打印股票 CSV 文件
    Stocks {
        #[arg(default_value = "stock.csv")]
        path: PathBuf,
    },
}

fn parse_field(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((name, value)) if !name.trim().is_empty() => {
            Ok((name.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("字段格式应为 NAME=VALUE: {}", raw)),
    }
}

fn text_fields(fields: Vec<(String, String)>) -> Fields {
    fields
        .into_iter()
        .map(|(name, value)| (name, Value::Text(value)))
        .collect()
}

fn missing_policy(strict: bool) -> MissingKey {
    if strict {
        MissingKey::Reject
    } else {
        MissingKey::Ignore
    }
}

fn parse_row(target: &str) -> Result<usize> {
    target
        .parse::<usize>()
        .with_context(|| format!("行号必须是非负整数: {}", target))
}

pub fn print_quotes(quotes: &[StockQuote]) {
    for quote in quotes {
        println!("{}", quote);
    }
    for quote in quotes {
        println!("{}", quote.plain());
    }
}

impl Cli {
    fn open_store(&self) -> TabularStore {
        let path = self
            .file
            .clone()
            .unwrap_or_else(|| self.app.default_file());
        TabularStore::open(path, self.app.schema())
    }

    pub async fn run(self) -> Result<()> {
        let store = self.open_store();
        let location = store.describe();

        match self.command {
            Command::Serve {
                addr,
                page_size,
                cache,
            } => {
                let store: Arc<dyn RecordStore> = if cache {
                    Arc::new(CachedStore::new(store))
                } else {
                    Arc::new(store)
                };
                info!("{:?} 表文件: {}", self.app, location);
                let app = self.app.router(AppState::new(store, page_size));
                web::serve(app, &addr)
                    .await
                    .with_context(|| format!("无法在 {} 上启动服务", addr))?;
            }
            Command::List {
                search,
                sort_by,
                desc,
                page,
                page_size,
            } => {
                let mut query = Query::new(page, page_size).filter(search);
                if let Some(column) = sort_by {
                    query = query.sort_by(column, !desc);
                }
                let table = store.load().with_context(|| format!("无法读取 {}", location))?;
                let result = table.query(&query)?;
                let rows: Vec<Vec<String>> = result
                    .records
                    .iter()
                    .map(|r| r.values().map(|v| v.to_string()).collect())
                    .collect();
                print!("{}", TableFormatter::format_table(&table.column_names(), &rows));
                println!(
                    "第 {}/{} 页，共 {} 条",
                    result.page,
                    result.page_count().max(1),
                    result.total
                );
            }
            Command::Add { fields } => {
                let record = store.insert(text_fields(fields))?;
                let key = record.get(&store.schema().key).cloned().unwrap_or(Value::Empty);
                println!("已新增 {} = {}", store.schema().key, key);
            }
            Command::Update {
                target,
                fields,
                row,
                strict,
            } => {
                if row {
                    store.update_at(parse_row(&target)?, text_fields(fields))?;
                    println!("已更新第 {} 行", target);
                } else {
                    let key = store.parse_key(&target)?;
                    match store.update(&key, text_fields(fields), missing_policy(strict))? {
                        Mutation::Applied(_) => println!("已更新 {}", target),
                        Mutation::Skipped => println!("{} 不存在，未修改", target),
                    }
                }
            }
            Command::Delete {
                target,
                row,
                strict,
            } => {
                if row {
                    store.delete_at(parse_row(&target)?)?;
                    println!("已删除第 {} 行", target);
                } else {
                    let key = store.parse_key(&target)?;
                    match store.delete(&key, missing_policy(strict))? {
                        Mutation::Applied(n) => println!("已删除 {} 条记录", n),
                        Mutation::Skipped => println!("{} 不存在，未修改", target),
                    }
                }
            }
            Command::Stocks { path } => {
                if !path.is_file() {
                    bail!("找不到文件 {}", path.display());
                }
                let quotes = read_stock_file(&path)
                    .with_context(|| format!("无法解析 {}", path.display()))?;
                print_quotes(&quotes);
            }
        }

        Ok(())
    }
}
