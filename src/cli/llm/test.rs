use std::io::{Write, stdout};

use colored::Colorize;
use ptool::{VecOptions, api, api::*};

#[derive(clap::Args)]
pub struct LlmTestCommand {
    #[arg(
        short = 'L',
        long = "llm-option",
        help = "Additional option passed to LLM, e.g. -L temperature:0.2"
    )]
    llm_options: Vec<String>,

    #[arg(short = 's', long = "system", help = "System prompt")]
    system: Option<String>,

    prompt: String,
}

impl LlmTestCommand {
    pub async fn exec(&self) {
        let mut chat_completion_options = ChatCompletionOptions::default();
        let llm_options = VecOptions(&self.llm_options);
        if let Some(temperature_str) = llm_options.get("temperature") {
            if let Ok(temperature) = temperature_str.parse() {
                chat_completion_options = chat_completion_options.with_temperature(temperature);
            }
        }

        let result = api::llm_chat_completion_stream(
            &self.prompt,
            self.system.as_deref(),
            &chat_completion_options,
        )
        .await;

        match result {
            Ok(mut stream) => {
                let mut has_content = false;
                let mut has_reasoning_content = false;

                while let Some(event) = stream.next().await {
                    match event {
                        ChatCompletionEvent::Content(delta) => {
                            if !has_content && has_reasoning_content {
                                print!("\n\n");
                            }

                            has_content = true;
                            print!("{delta}");
                            let _ = stdout().flush();
                        }
                        ChatCompletionEvent::ReasoningContent(delta) => {
                            has_reasoning_content = true;
                            print!("{}", delta.bright_black());
                            let _ = stdout().flush();
                        }
                        ChatCompletionEvent::Error(err) => {
                            println!("{}", err.to_string().red());
                            break;
                        }
                    }
                }

                println!();
            }
            Err(err) => {
                println!("{}", err.to_string().red());
            }
        }
    }
}
