//! # ptool lib

use std::{collections::HashMap, path::PathBuf, sync::LazyLock, time::Duration};

use directories::ProjectDirs;
use rayon::iter::*;

pub mod api;
pub mod error;
pub mod utils;

/// Options that each item is String in <key>:<value> format
pub struct VecOptions<'a>(pub &'a [String]);

pub async fn init() {
    env_logger::Builder::new()
        .parse_filters(std::env::var("LOG").as_deref().unwrap_or("off"))
        .init();
}

static APP_DATA_DIR: LazyLock<PathBuf> =
    LazyLock::new(|| match ProjectDirs::from("", "", env!("CARGO_PKG_NAME")) {
        Some(proj_dirs) => proj_dirs.data_dir().to_path_buf(),
        None => std::env::current_dir()
            .expect("Unable to get current directory!")
            .join("data"),
    });

static CHANNEL_BUFFER_DEFAULT: usize = 64;
static LLM_CHAT_TEMPERATURE_DEFAULT: f64 = 0.2;
static STAGE_DELAY_DEFAULT: Duration = Duration::from_millis(300);

mod analysis;
mod data;
mod financial;
mod llm;
mod recommend;

impl VecOptions<'_> {
    pub fn get(&self, name: &str) -> Option<String> {
        let prefix = format!("{}:", name.to_lowercase());

        self.0
            .par_iter()
            .find_any(|s| s.to_lowercase().starts_with(&prefix))
            .and_then(|option_text| option_text.split_once(':'))
            .map(|(_, value)| value.trim().to_string())
    }

    pub fn into_map(self) -> HashMap<String, String> {
        self.0
            .iter()
            .filter_map(|option_text| option_text.split_once(':'))
            .map(|(key, value)| (key.trim().to_lowercase(), value.trim().to_string()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec_options() {
        let raw = vec![
            "api_key: sk-xxx".to_string(),
            "Base_URL:https://api.openai.com/v1".to_string(),
            "broken".to_string(),
        ];

        let options = VecOptions(&raw);
        assert_eq!(options.get("API_KEY"), Some("sk-xxx".to_string()));
        assert_eq!(options.get("model"), None);

        let map = VecOptions(&raw).into_map();
        assert_eq!(map.len(), 2);
        assert_eq!(
            map.get("base_url").map(String::as_str),
            Some("https://api.openai.com/v1")
        );
    }
}
