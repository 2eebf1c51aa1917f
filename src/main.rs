//! # ptool CLI

use clap::Parser;

use crate::cli::Commands;

mod cli;

#[derive(Parser)]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() {
    ptool::init().await;

    let cli = Cli::parse();
    match &cli.command {
        Commands::Analyze(cmd) => {
            cmd.exec().await;
        }
        Commands::Dashboard(cmd) => {
            cmd.exec().await;
        }
        Commands::Llm(cmd) => {
            cmd.exec().await;
        }
        Commands::Picks(cmd) => {
            cmd.exec().await;
        }
        Commands::Quote(cmd) => {
            cmd.exec().await;
        }
        Commands::Stocks(cmd) => {
            cmd.exec().await;
        }
    }
}
