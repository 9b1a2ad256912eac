use std::process::ExitCode;

use clap::Parser;
use tabular_store::cli::Cli;

#[tokio::main]
async fn main() -> ExitCode {
    tabular_store::init_logging();

    let cli = Cli::parse();
    match cli.run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("错误: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
