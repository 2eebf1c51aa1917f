use std::{collections::HashMap, path::PathBuf, str::FromStr, sync::LazyLock};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::mpsc::Receiver;

use crate::{
    APP_DATA_DIR, LLM_CHAT_TEMPERATURE_DEFAULT,
    error::{PtoolError, PtoolResult},
    llm::provider::{ChatProvider, gemini::GeminiProvider, open_ai::OpenAiProvider},
};

#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumIter,
    strum::EnumString,
)]
#[strum(ascii_case_insensitive)]
pub enum Protocol {
    #[default]
    OpenAI,
    Gemini,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    pub protocol: Protocol,
    pub base_url: String,
    pub api_key: String,
    pub model: String,
}

#[derive(Debug)]
pub enum ChatCompletionEvent {
    Content(String),
    ReasoningContent(String),
    Error(PtoolError),
}

#[derive(Clone, Debug)]
pub struct ChatCompletionOptions {
    pub temperature: f64,
    pub response_schema: Option<ResponseSchema>,
}

pub struct ChatCompletionStream {
    receiver: Receiver<ChatCompletionEvent>,
}

#[derive(Clone, Debug)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
    pub reasoning: Option<String>,
}

/// JSON schema the model output is constrained to
#[derive(Clone, Debug)]
pub struct ResponseSchema {
    pub name: String,
    pub schema: Value,
}

#[derive(strum::Display, strum::EnumString, Copy, Clone, Debug, PartialEq)]
#[strum(ascii_case_insensitive)]
pub enum Role {
    Bot,
    User,
    System,
}

pub fn load_config() -> PtoolResult<Config> {
    Ok(confy::load_path(&*CHAT_CONFIG_PATH)?)
}

pub async fn chat_completion(
    cfg: &Config,
    messages: &[ChatMessage],
    options: &ChatCompletionOptions,
) -> PtoolResult<ChatMessage> {
    check_credentials(cfg)?;

    match cfg.protocol {
        Protocol::OpenAI => {
            OpenAiProvider::new(&cfg.base_url, &cfg.api_key, &cfg.model)
                .chat_completion(messages, options)
                .await
        }
        Protocol::Gemini => {
            GeminiProvider::new(&cfg.base_url, &cfg.api_key, &cfg.model)
                .chat_completion(messages, options)
                .await
        }
    }
}

pub async fn chat_completion_stream(
    cfg: &Config,
    messages: &[ChatMessage],
    options: &ChatCompletionOptions,
) -> PtoolResult<ChatCompletionStream> {
    check_credentials(cfg)?;

    match cfg.protocol {
        Protocol::OpenAI => {
            OpenAiProvider::new(&cfg.base_url, &cfg.api_key, &cfg.model)
                .chat_completion_stream(messages, options)
                .await
        }
        Protocol::Gemini => {
            GeminiProvider::new(&cfg.base_url, &cfg.api_key, &cfg.model)
                .chat_completion_stream(messages, options)
                .await
        }
    }
}

pub async fn config_chat(protocol: &str, options: &HashMap<String, String>) -> PtoolResult<()> {
    let mut cfg: Config = confy::load_path(&*CHAT_CONFIG_PATH).unwrap_or_default();

    let protocol = Protocol::from_str(protocol)?;
    if cfg.protocol != protocol || cfg.base_url.is_empty() {
        cfg.base_url = protocol.default_base_url().to_string();
    }
    cfg.protocol = protocol;

    if let Some(base_url) = options.get("base_url") {
        cfg.base_url = base_url.trim().to_string();
    }

    if let Some(api_key) = options.get("api_key") {
        cfg.api_key = api_key.trim().to_string();
    }

    if let Some(model) = options.get("model") {
        cfg.model = model.trim().to_string();
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

    if cfg.model.is_empty() {
        return Err(PtoolError::Required(
            "OPTION_REQUIRED",
            "Required option 'model' is missing".to_string(),
        ));
    }

    confy::store_path(&*CHAT_CONFIG_PATH, &cfg)?;

    Ok(())
}

mod provider;

static CHAT_CONFIG_PATH: LazyLock<PathBuf> = LazyLock::new(|| APP_DATA_DIR.join("llm-chat.toml"));

fn check_credentials(cfg: &Config) -> PtoolResult<()> {
    if cfg.api_key.trim().is_empty() {
        return Err(PtoolError::AuthenticationFailed(
            "LLM api_key is not configured".to_string(),
        ));
    }

    Ok(())
}

impl Protocol {
    pub fn default_base_url(&self) -> &'static str {
        match self {
            Protocol::OpenAI => "https://api.openai.com/v1",
            Protocol::Gemini => "https://generativelanguage.googleapis.com/v1beta",
        }
    }
}

impl Default for ChatCompletionOptions {
    fn default() -> Self {
        Self {
            temperature: LLM_CHAT_TEMPERATURE_DEFAULT,
            response_schema: None,
        }
    }
}

impl ChatCompletionOptions {
    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_response_schema(mut self, name: &str, schema: Value) -> Self {
        self.response_schema = Some(ResponseSchema {
            name: name.to_string(),
            schema,
        });
        self
    }
}

impl ChatCompletionStream {
    pub fn new(receiver: Receiver<ChatCompletionEvent>) -> Self {
        Self { receiver }
    }

    pub fn close(&mut self) {
        self.receiver.close()
    }

    pub async fn next(&mut self) -> Option<ChatCompletionEvent> {
        self.receiver.recv().await
    }
}

impl ChatMessage {
    pub fn new(role: Role, content: &str) -> Self {
        Self {
            role,
            content: content.to_string(),
            reasoning: None,
        }
    }
}
