use colored::Colorize;
use ptool::api;

use crate::cli::picks;

#[derive(clap::Args)]
pub struct DashboardCommand;

impl DashboardCommand {
    pub async fn exec(&self) {
        let stats = api::dashboard_stats();
        println!("Stocks Analyzed: {}", stats.stocks_analyzed.to_string().cyan().bold());
        println!("Buy Signals: {}", stats.buy_signals.to_string().green().bold());
        println!("Avg P-Tool Score: {}", stats.avg_ptool_score.to_string().cyan().bold());
        println!("Red Flags: {}", stats.red_flags.to_string().red().bold());

        match api::top_picks(&api::TopPickFilter::default()) {
            Ok(top_picks) => picks::print_picks(&top_picks),
            Err(err) => println!("{}", err.to_string().red()),
        }
    }
}
