use clap::Subcommand;
use colored::Colorize;
use ptool::{VecOptions, api};

#[derive(Subcommand)]
pub enum QuoteCommand {
    #[command(about = "Configure the Alpha Vantage endpoint and api key")]
    Config(Box<QuoteConfigCommand>),
}

#[derive(clap::Args)]
pub struct QuoteConfigCommand {
    #[arg(
        short = 'O',
        long = "option",
        help = "Quote provider's option, e.g. -O api_key:xxx -O base_url:https://www.alphavantage.co/query"
    )]
    options: Vec<String>,
}

impl QuoteCommand {
    pub async fn exec(&self) {
        match self {
            QuoteCommand::Config(cmd) => {
                cmd.exec().await;
            }
        }
    }
}

impl QuoteConfigCommand {
    pub async fn exec(&self) {
        let options_map = VecOptions(&self.options).into_map();

        if let Err(err) = api::quote_config(&options_map).await {
            println!("{}", err.to_string().red());
        } else {
            println!("Quote provider has been configured");
        }
    }
}
