use std::time::Duration;

use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use ptool::{api, api::*, error::PtoolError};
use strum::IntoEnumIterator;
use tabled::settings::{Color, Width, measurement::Percent, object::Columns, peaker::Priority};
use tokio::io::{AsyncBufReadExt, BufReader};

#[derive(clap::Args)]
pub struct AnalyzeCommand {
    #[arg(
        short = 'd',
        long = "delay",
        help = "Delay of each progress-only stage in milliseconds, the default value is 300"
    )]
    delay: Option<u64>,

    #[arg(short = 'j', long = "json", help = "Print the report as JSON")]
    json: bool,

    #[arg(help = "Symbol to analyze, e.g. TCS.NS, symbols are read from stdin when omitted")]
    symbol: Option<String>,
}

impl AnalyzeCommand {
    pub async fn exec(&self) {
        let mut options = AnalyzeOptions::default();
        if let Some(delay) = self.delay {
            options.stage_delay = Duration::from_millis(delay);
        }

        match &self.symbol {
            Some(symbol) if self.json => exec_json(symbol, &options).await,
            Some(symbol) => exec_once(symbol, &options).await,
            None => exec_interactive(&options).await,
        }
    }
}

async fn exec_json(symbol: &str, options: &AnalyzeOptions) {
    match api::analyze(symbol, options).await {
        Ok(report) => match serde_json::to_string_pretty(&report) {
            Ok(json) => println!("{json}"),
            Err(err) => println!("{}", err.to_string().red()),
        },
        Err(err) => {
            println!("{}", err.to_string().red());
            print_hint(&err);
        }
    }
}

async fn exec_once(symbol: &str, options: &AnalyzeOptions) {
    let mut session = match api::analysis_session(options) {
        Ok(session) => session,
        Err(err) => {
            println!("{}", err.to_string().red());
            print_hint(&err);
            return;
        }
    };

    session.start(symbol);
    let bar = progress_bar(symbol);
    while let Some(event) = session.next().await {
        if render_event(&bar, &event) {
            break;
        }
    }
}

/// Each line read from stdin starts a new request, superseding the one in flight
async fn exec_interactive(options: &AnalyzeOptions) {
    let mut session = match api::analysis_session(options) {
        Ok(session) => session,
        Err(err) => {
            println!("{}", err.to_string().red());
            print_hint(&err);
            return;
        }
    };

    println!(
        "Enter symbols to analyze, e.g. {}, a new symbol replaces the running analysis",
        "TCS.NS".green()
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    let mut bar: Option<ProgressBar> = None;

    while stdin_open || session.is_running() {
        tokio::select! {
            line = lines.next_line(), if stdin_open => {
                match line {
                    Ok(Some(line)) => {
                        let symbol = line.trim();
                        if symbol.is_empty() {
                            continue;
                        }

                        if let Some(superseded) = bar.take() {
                            superseded.abandon_with_message("superseded".bright_black().to_string());
                        }

                        session.start(symbol);
                        bar = Some(progress_bar(symbol));
                    }
                    _ => {
                        stdin_open = false;
                    }
                }
            }
            Some(event) = session.next(), if session.is_running() => {
                if let Some(current) = &bar {
                    if render_event(current, &event) {
                        bar = None;
                    }
                }
            }
            else => break,
        }
    }
}

fn progress_bar(symbol: &str) -> ProgressBar {
    let bar = ProgressBar::new(Stage::iter().count() as u64);
    if let Ok(style) = ProgressStyle::with_template(
        "{prefix} [{bar:24.cyan/blue}] {pos}/{len} {msg} [{elapsed}]",
    ) {
        bar.set_style(style.progress_chars("=> "));
    }
    bar.set_prefix(format!("[{}]", symbol.trim().to_uppercase().cyan()));
    bar.enable_steady_tick(Duration::from_millis(100));

    bar
}

/// Returns true once the request has finished
fn render_event(bar: &ProgressBar, event: &AnalysisEvent) -> bool {
    match event {
        AnalysisEvent::StageStarted(stage) => {
            bar.set_message(stage.to_string());
            false
        }
        AnalysisEvent::StageCompleted(_) => {
            bar.inc(1);
            false
        }
        AnalysisEvent::DataReady(_) => false,
        AnalysisEvent::Completed(report) => {
            bar.finish_with_message("done".green().to_string());
            print_report(report);
            true
        }
        AnalysisEvent::Failed(err) => {
            bar.abandon_with_message(err.to_string().red().to_string());
            print_hint(err);
            true
        }
    }
}

fn print_report(report: &AnalysisReport) {
    let AnalysisReport {
        analysis,
        recommendation,
        ..
    } = report;
    let stock = &analysis.stock;

    let overview = vec![
        vec!["Stock".to_string(), format!("{} ({})", stock.name, stock.symbol)],
        vec!["Sector".to_string(), stock.sector.to_string()],
        vec!["Price".to_string(), format!("{:.2}", stock.current_price)],
        vec!["Market Cap".to_string(), format!("{:.0}", stock.market_cap)],
        vec![
            "P-Tool Score".to_string(),
            format!("{} ({})", analysis.p_tool.score, analysis.p_tool.rating),
        ],
    ];
    print_table(&overview, Color::FG_GREEN);

    let fundamental = &analysis.fundamental;
    let technical = &analysis.technical;
    let forensic = &analysis.forensic;
    let sentiment = &analysis.sentiment;
    let peer = &analysis.peer;
    let macro_data = &analysis.macro_data;
    let stages = vec![
        vec![
            Stage::Fundamental.to_string(),
            format!(
                "Revenue growth {:.2}%, profit margin {:.2}%, ROE {:.2}%, D/E {:.2}, {}",
                fundamental.revenue_growth,
                fundamental.profit_margin,
                fundamental.roe,
                fundamental.debt_equity,
                fundamental.is_sustainable
            ),
        ],
        vec![
            Stage::Technical.to_string(),
            format!(
                "RSI {}, MACD {}, {} trend, {}",
                technical.rsi, technical.macd_signal, technical.trend, technical.technical_signal
            ),
        ],
        vec![
            Stage::Forensic.to_string(),
            format!(
                "{} risk, {} red flag(s): {}",
                forensic.risk_level,
                forensic.red_flags_count,
                forensic.issues_list.join(", ")
            ),
        ],
        vec![
            Stage::Sentiment.to_string(),
            format!(
                "{}, {} news, {} fraud alert(s)",
                sentiment.sentiment, sentiment.news_count, sentiment.fraud_alerts
            ),
        ],
        vec![
            Stage::Peer.to_string(),
            format!(
                "Growth vs peers {:+}%, valuation premium {}%, growth {}",
                peer.peer_growth_diff, peer.valuation_premium, peer.growth_real
            ),
        ],
        vec![
            Stage::Macro.to_string(),
            format!(
                "{} outlook, GDP {}, inflation {}, PMI {}, market {} / {} volatility, sector {} ({})",
                macro_data.macro_outlook,
                macro_data.economic_indicators.gdp_growth.value,
                macro_data.economic_indicators.inflation_rate.value,
                macro_data.economic_indicators.manufacturing_pmi.value,
                macro_data.market_conditions.trend,
                macro_data.market_conditions.volatility,
                macro_data.sector_outlook.outlook,
                macro_data.sector_outlook.drivers.join(", ")
            ),
        ],
    ];
    print_table(&stages, Color::FG_CYAN);

    let verdict = recommendation.recommendation.to_string();
    let verdict = match recommendation.recommendation {
        Recommendation::StrongBuy | Recommendation::Buy => verdict.green().bold(),
        Recommendation::Hold => verdict.yellow().bold(),
        Recommendation::Sell | Recommendation::Reject => verdict.red().bold(),
    };
    let ai = vec![
        vec![Stage::AiRecommendation.to_string(), verdict.to_string()],
        vec![
            "Confidence".to_string(),
            format!("{}%", recommendation.confidence_score),
        ],
        vec!["Target".to_string(), recommendation.target_price.to_string()],
        vec!["Stop Loss".to_string(), recommendation.stop_loss.to_string()],
        vec![
            "Horizon".to_string(),
            recommendation.investment_horizon.to_string(),
        ],
        vec![
            "Position Size".to_string(),
            recommendation.position_size.to_string(),
        ],
        vec![
            "Reasoning".to_string(),
            recommendation.key_reasoning.join("\n"),
        ],
        vec!["Strengths".to_string(), recommendation.strengths.join("\n")],
        vec!["Risks".to_string(), recommendation.risks.join("\n")],
    ];
    print_table(&ai, Color::FG_YELLOW);
}

fn print_table(table_data: &[Vec<String>], first_column: Color) {
    let mut table = tabled::builder::Builder::from_iter(table_data).build();
    table.modify(Columns::first(), first_column);
    table.with((
        Width::wrap(Percent(80)).priority(Priority::max(true)),
        Width::increase(Percent(30)).priority(Priority::min(true)),
    ));
    println!("{table}");
}

fn print_hint(err: &PtoolError) {
    match err {
        PtoolError::AuthenticationFailed(_) => {
            println!(
                "[I] Run `{}` to configure the LLM provider",
                "ptool llm config".green()
            );
        }
        PtoolError::ProfileNotFound(_) => {
            println!(
                "[I] Run `{}` to get the analyzable stock list",
                "ptool stocks".green()
            );
        }
        _ if err.is_retryable() => {
            println!("[I] This is probably temporary, try again later");
        }
        _ => {}
    }
}
