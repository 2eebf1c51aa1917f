use ptool::api;
use tabled::settings::{Color, object::Columns};

#[derive(clap::Args)]
pub struct StocksCommand;

impl StocksCommand {
    pub async fn exec(&self) {
        let mut table_data: Vec<Vec<String>> = vec![vec![
            "Symbol".to_string(),
            "Name".to_string(),
            "Sector".to_string(),
            "Price".to_string(),
            "Market Cap".to_string(),
        ]];

        for stock in api::stocks() {
            table_data.push(vec![
                stock.symbol,
                stock.name,
                stock.sector,
                format!("{:.2}", stock.current_price),
                format!("{:.0}", stock.market_cap),
            ]);
        }

        let mut table = tabled::builder::Builder::from_iter(&table_data).build();
        table.modify(Columns::first(), Color::FG_GREEN);
        println!("{table}");
    }
}
