use std::{collections::HashMap, path::PathBuf, sync::LazyLock};

use log::{debug, warn};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    APP_DATA_DIR,
    error::{PtoolError, PtoolResult},
    financial::{OverviewFields, QuoteFields, QuoteSource, api_symbol},
};

static BASE_URL_DEFAULT: &str = "https://www.alphavantage.co/query";
static API_KEY_DEFAULT: &str = "demo";
static API_KEY_ENV: &str = "ALPHA_VANTAGE_API_KEY";

static QUOTE_CONFIG_PATH: LazyLock<PathBuf> = LazyLock::new(|| APP_DATA_DIR.join("quote.toml"));

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    pub base_url: String,
    pub api_key: String,
}

#[derive(Clone, Debug)]
pub struct AlphaVantageClient {
    client: Client,
    base_url: String,
    api_key: String,
}

/// Stored config, with the api key overridden by `ALPHA_VANTAGE_API_KEY` when set
pub fn load_config() -> PtoolResult<Config> {
    let mut cfg: Config = confy::load_path(&*QUOTE_CONFIG_PATH)?;

    if let Ok(api_key) = std::env::var(API_KEY_ENV) {
        if !api_key.trim().is_empty() {
            cfg.api_key = api_key.trim().to_string();
        }
    }

    Ok(cfg)
}

pub async fn config(options: &HashMap<String, String>) -> PtoolResult<()> {
    let mut cfg: Config = confy::load_path(&*QUOTE_CONFIG_PATH).unwrap_or_default();

    if let Some(base_url) = options.get("base_url") {
        cfg.base_url = base_url.trim().to_string();
    }

    if let Some(api_key) = options.get("api_key") {
        cfg.api_key = api_key.trim().to_string();
    }

    if cfg.base_url.is_empty() {
        return Err(PtoolError::Required(
            "OPTION_REQUIRED",
            "Required option 'base_url' is missing".to_string(),
        ));
    }

    if cfg.api_key.is_empty() {
        return Err(PtoolError::Required(
            "OPTION_REQUIRED",
            "Required option 'api_key' is missing".to_string(),
        ));
    }

    confy::store_path(&*QUOTE_CONFIG_PATH, &cfg)?;

    Ok(())
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: BASE_URL_DEFAULT.to_string(),
            api_key: API_KEY_DEFAULT.to_string(),
        }
    }
}

impl AlphaVantageClient {
    pub fn new(cfg: &Config) -> Self {
        Self {
            client: Client::new(),
            base_url: cfg.base_url.clone(),
            api_key: cfg.api_key.clone(),
        }
    }

    pub fn from_config() -> PtoolResult<Self> {
        Ok(Self::new(&load_config()?))
    }

    async fn call(&self, function: &str, symbol: &str) -> PtoolResult<Value> {
        debug!("[Alpha Vantage] {function} '{symbol}'");

        let params = [
            ("function", function),
            ("symbol", symbol),
            ("apikey", self.api_key.as_str()),
        ];

        let response = self
            .client
            .get(&self.base_url)
            .query(&params)
            .send()
            .await
            .map_err(|err| PtoolError::ApiUnavailable(format!("Failed to fetch {function}: {err}")))?;

        if !response.status().is_success() {
            return Err(PtoolError::ApiUnavailable(format!(
                "Failed to fetch {function}: HTTP {}",
                response.status()
            )));
        }

        let data: Value = response.json().await.map_err(|err| {
            PtoolError::ApiUnavailable(format!("Invalid {function} response: {err}"))
        })?;

        if let Some(message) = data.get("Error Message") {
            return Err(PtoolError::ProviderError(
                message.as_str().unwrap_or_default().to_string(),
            ));
        }

        for key in ["Note", "Information"] {
            if let Some(note) = data.get(key) {
                let note = note.as_str().unwrap_or_default().to_string();
                warn!("[Alpha Vantage] {key}: {note}");
                return Err(PtoolError::RateLimited(note));
            }
        }

        Ok(data)
    }
}

impl QuoteSource for AlphaVantageClient {
    async fn fetch_overview_and_quote(
        &self,
        symbol: &str,
    ) -> PtoolResult<(OverviewFields, QuoteFields)> {
        let symbol = api_symbol(symbol);

        let (overview, quote) =
            tokio::try_join!(self.call("OVERVIEW", &symbol), self.call("GLOBAL_QUOTE", &symbol))?;

        Ok((
            OverviewFields::from_json(&overview),
            QuoteFields::from_json(&quote),
        ))
    }
}
