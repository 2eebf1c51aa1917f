use log::debug;
use serde_json::{Value, json};
use tokio::sync::mpsc;

use crate::{
    error::*,
    llm::{ChatCompletionEvent, ChatCompletionStream, provider::*},
    utils::net::join_url,
};

pub struct GeminiProvider {
    base_url: String,
    api_key: String,
    model: String,
}

impl GeminiProvider {
    pub fn new(base_url: &str, api_key: &str, model: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
        }
    }

    fn request_body(&self, messages: &[ChatMessage], options: &ChatCompletionOptions) -> Value {
        let system_text = messages
            .iter()
            .filter(|m| m.role == Role::System)
            .map(|m| m.content.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");

        let contents = messages
            .iter()
            .filter(|m| m.role != Role::System)
            .map(|m| {
                json!({
                    "role": if m.role == Role::Bot { "model" } else { "user" },
                    "parts": [{ "text": m.content }],
                })
            })
            .collect::<Vec<_>>();

        let mut generation_config = json!({ "temperature": options.temperature });
        if let Some(response_schema) = &options.response_schema {
            generation_config["responseMimeType"] = json!("application/json");
            generation_config["responseJsonSchema"] = response_schema.schema.clone();
        }

        let mut body = json!({
            "contents": contents,
            "generationConfig": generation_config,
        });
        if !system_text.is_empty() {
            body["systemInstruction"] = json!({ "parts": [{ "text": system_text }] });
        }

        body
    }
}

impl ChatProvider for GeminiProvider {
    async fn chat_completion(
        &self,
        messages: &[ChatMessage],
        options: &ChatCompletionOptions,
    ) -> PtoolResult<ChatMessage> {
        let request_url = join_url(
            &self.base_url,
            &format!("/models/{}:generateContent", self.model),
        )?;
        debug!("[Gemini] POST {request_url}");

        let client = reqwest::Client::builder().build()?;

        let response = client
            .post(request_url)
            .header("x-goog-api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(&self.request_body(messages, options))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(status_error(response).await);
        }

        let json: Value = response.json().await?;

        let parts = json["candidates"][0]["content"]["parts"]
            .as_array()
            .ok_or(PtoolError::Invalid(
                "GEMINI_NO_CANDIDATE",
                format!(
                    "Gemini returned no candidate content (finish reason: {})",
                    json["candidates"][0]["finishReason"]
                        .as_str()
                        .or(json["promptFeedback"]["blockReason"].as_str())
                        .unwrap_or("unknown")
                ),
            ))?;

        let mut content = String::new();
        let mut reasoning_content = String::new();
        for part in parts {
            if let Some(text) = part["text"].as_str() {
                if part["thought"].as_bool().unwrap_or(false) {
                    reasoning_content.push_str(text);
                } else {
                    content.push_str(text);
                }
            }
        }

        Ok(ChatMessage {
            role: Role::Bot,
            content,
            reasoning: if reasoning_content.is_empty() {
                None
            } else {
                Some(reasoning_content)
            },
        })
    }

    async fn chat_completion_stream(
        &self,
        messages: &[ChatMessage],
        options: &ChatCompletionOptions,
    ) -> PtoolResult<ChatCompletionStream> {
        let message = self.chat_completion(messages, options).await?;

        let (sender, receiver) = mpsc::channel(2);
        if let Some(reasoning) = message.reasoning {
            let _ = sender
                .send(ChatCompletionEvent::ReasoningContent(reasoning))
                .await;
        }
        let _ = sender
            .send(ChatCompletionEvent::Content(message.content))
            .await;

        Ok(ChatCompletionStream::new(receiver))
    }
}
