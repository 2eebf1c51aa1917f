use colored::Colorize;
use ptool::{VecOptions, api};

#[derive(clap::Args)]
pub struct LlmConfigCommand {
    #[arg(
        short = 'O',
        long = "option",
        help = "LLM provider's option, e.g. -O api_key:sk-xxx -O model:gpt-4o-mini -O base_url:https://api.openai.com/v1"
    )]
    options: Vec<String>,

    #[arg(
        short = 'p',
        long = "protocol",
        help = "LLM provider's protocol, openai or gemini, the default value is openai"
    )]
    protocol: Option<String>,
}

impl LlmConfigCommand {
    pub async fn exec(&self) {
        let protocol = self
            .protocol
            .as_deref()
            .unwrap_or(api::LLM_SUPPORTED_PROTOCOLS[0]);
        if !api::LLM_SUPPORTED_PROTOCOLS.contains(&protocol.to_lowercase().as_str()) {
            println!(
                "Invalid protocol '{}', available values: {}",
                protocol.yellow(),
                api::LLM_SUPPORTED_PROTOCOLS.join("/")
            );

            return;
        }

        let options_map = VecOptions(&self.options).into_map();

        if let Err(err) = api::llm_config(protocol, &options_map).await {
            println!("{}", err.to_string().red());
        } else {
            println!("LLM with protocol '{protocol}' has been configured");
        }
    }
}
