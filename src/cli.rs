use clap::Subcommand;

mod analyze;
mod dashboard;
mod llm;
mod picks;
mod quote;
mod stocks;

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Analyze a stock through all stages and get an AI recommendation")]
    #[clap(visible_aliases = &["a"])]
    Analyze(Box<analyze::AnalyzeCommand>),

    #[command(about = "Display market statistics and top picks")]
    Dashboard(Box<dashboard::DashboardCommand>),

    #[command(subcommand, about = "Configure or test the LLM provider")]
    Llm(Box<llm::LlmCommand>),

    #[command(about = "Display top picks by P-Tool score")]
    Picks(Box<picks::PicksCommand>),

    #[command(subcommand, about = "Configure the live quote provider")]
    Quote(Box<quote::QuoteCommand>),

    #[command(about = "Display all analyzable stocks")]
    Stocks(Box<stocks::StocksCommand>),
}
