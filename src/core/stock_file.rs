use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::core::error::StoreError;

/// stock.csv 中的一行。字段保持原文，不做数值转换
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockQuote {
    pub code: String,
    pub name: String,
    pub price: String,
    pub market_cap: String,
    pub per: String,
}

impl fmt::Display for StockQuote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "종목코드:{}, 종목명:{}, 현재가:{}, 시가총액:{}, PER:{}",
            self.code, self.name, self.price, self.market_cap, self.per
        )
    }
}

impl StockQuote {
    /// 以空格分隔的简短形式
    pub fn plain(&self) -> String {
        format!(
            "{} {} {} {} {}",
            self.code, self.name, self.price, self.market_cap, self.per
        )
    }
}

/// 解析逗号分隔的股票数据，第一行是表头
pub fn parse_stocks<R: Read>(reader: R) -> Result<Vec<StockQuote>, StoreError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut quotes = Vec::new();
    for record in reader.records() {
        let record = record?;
        // 跳过空行
        if record.iter().all(|field| field.is_empty()) {
            continue;
        }
        if record.len() < 5 {
            // csv 会跳过空行，行号以文件位置为准
            let line = record.position().map_or(0, |p| p.line());
            return Err(StoreError::Parse(format!(
                "第 {} 行只有 {} 个字段，至少需要 5 个",
                line,
                record.len()
            )));
        }
        quotes.push(StockQuote {
            code: record[0].to_string(),
            name: record[1].to_string(),
            price: record[2].to_string(),
            market_cap: record[3].to_string(),
            per: record[4].to_string(),
        });
    }
    Ok(quotes)
}

pub fn read_stock_file(path: impl AsRef<Path>) -> Result<Vec<StockQuote>, StoreError> {
    let file = File::open(path.as_ref())?;
    parse_stocks(file)
}
