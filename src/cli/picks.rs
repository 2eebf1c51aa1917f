use colored::Colorize;
use ptool::{api, api::*};
use strum::IntoEnumIterator;
use tabled::settings::{Color, object::Columns};

#[derive(clap::Args)]
pub struct PicksCommand {
    #[arg(
        short = 'm',
        long = "min-score",
        help = "Minimum P-Tool score between 70 and 100, the default value is 85"
    )]
    min_score: Option<f64>,

    #[arg(
        short = 'r',
        long = "recommendation",
        help = "Recommendation label, e.g. -r \"STRONG BUY\""
    )]
    recommendation: Option<String>,

    #[arg(short = 's', long = "sector", help = "Sector, e.g. -s Banking")]
    sector: Option<String>,
}

impl PicksCommand {
    pub async fn exec(&self) {
        let recommendation = match &self.recommendation {
            Some(label) => match label.trim().parse::<Recommendation>() {
                Ok(recommendation) => Some(recommendation),
                Err(_) => {
                    println!(
                        "Invalid recommendation '{}', available values: {}",
                        label.yellow(),
                        Recommendation::iter()
                            .map(|r| r.to_string())
                            .collect::<Vec<_>>()
                            .join("/")
                    );
                    return;
                }
            },
            None => None,
        };

        let filter = TopPickFilter {
            min_score: self.min_score.unwrap_or(api::TOP_PICK_SCORE_DEFAULT),
            sector: self.sector.clone(),
            recommendation,
        };

        match api::top_picks(&filter) {
            Ok(picks) if picks.is_empty() => {
                println!(
                    "No pick matches, sectors: {}",
                    api::sectors().join("/").green()
                );
            }
            Ok(picks) => print_picks(&picks),
            Err(err) => println!("{}", err.to_string().red()),
        }
    }
}

pub fn print_picks(picks: &[TopPick]) {
    let mut table_data: Vec<Vec<String>> = vec![vec![
        "Symbol".to_string(),
        "Name".to_string(),
        "Sector".to_string(),
        "Price".to_string(),
        "P-Tool Score".to_string(),
        "Recommendation".to_string(),
    ]];

    for pick in picks {
        table_data.push(vec![
            pick.stock.symbol.to_string(),
            pick.stock.name.to_string(),
            pick.stock.sector.to_string(),
            format!("{:.2}", pick.stock.current_price),
            pick.ptool_score.to_string(),
            pick.recommendation.to_string(),
        ]);
    }

    let mut table = tabled::builder::Builder::from_iter(&table_data).build();
    table.modify(Columns::first(), Color::FG_GREEN);
    println!("{table}");
}
