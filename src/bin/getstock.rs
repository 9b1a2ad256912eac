use std::process::ExitCode;

use anyhow::{Context, Result};
use tabular_store::cli::print_quotes;
use tabular_store::core::stock_file::read_stock_file;

const STOCK_FILE: &str = "stock.csv";

fn run() -> Result<()> {
    let quotes =
        read_stock_file(STOCK_FILE).with_context(|| format!("无法读取 {}", STOCK_FILE))?;
    print_quotes(&quotes);
    Ok(())
}

fn main() -> ExitCode {
    tabular_store::init_logging();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("错误: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
