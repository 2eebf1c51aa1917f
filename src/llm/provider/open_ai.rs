use futures::StreamExt;
use log::debug;
use serde::Serialize;
use serde_json::{Value, json};
use tokio::sync::mpsc;

use crate::{
    CHANNEL_BUFFER_DEFAULT,
    error::*,
    llm::{ChatCompletionEvent, ChatCompletionStream, provider::*},
    utils::net::join_url,
};

pub struct OpenAiProvider {
    base_url: String,
    api_key: String,
    model: String,
}

impl OpenAiProvider {
    pub fn new(base_url: &str, api_key: &str, model: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
        }
    }
}

impl ChatProvider for OpenAiProvider {
    async fn chat_completion(
        &self,
        messages: &[ChatMessage],
        options: &ChatCompletionOptions,
    ) -> PtoolResult<ChatMessage> {
        let mut content = String::new();
        let mut reasoning_content = String::new();

        let mut stream = self.chat_completion_stream(messages, options).await?;
        while let Some(event) = stream.next().await {
            match event {
                ChatCompletionEvent::Content(delta) => {
                    content.push_str(&delta);
                }
                ChatCompletionEvent::ReasoningContent(delta) => {
                    reasoning_content.push_str(&delta);
                }
                ChatCompletionEvent::Error(err) => {
                    return Err(err);
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
        let request_url = join_url(&self.base_url, "/chat/completions")?;

        let messages_json_value = messages
            .iter()
            .map(chat_message_to_json_value)
            .collect::<Vec<_>>();

        let mut request_body = json!({
            "model": self.model,
            "messages": messages_json_value,
            "temperature": options.temperature,
            "stream": true,
        });

        if let Some(response_schema) = &options.response_schema {
            request_body["response_format"] = json!({
                "type": "json_schema",
                "json_schema": {
                    "name": response_schema.name,
                    "strict": true,
                    "schema": response_schema.schema,
                },
            });
        }
        debug!("[OpenAI] POST {request_url} model '{}'", self.model);

        let client = reqwest::Client::builder().build()?;

        let response = client
            .post(request_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request_body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(status_error(response).await);
        }

        let (sender, receiver) = mpsc::channel(CHANNEL_BUFFER_DEFAULT);

        tokio::spawn(async move {
            let mut stream = response.bytes_stream();
            let mut buffer: Vec<u8> = vec![];

            'chunks: while let Some(chunk) = stream.next().await {
                match chunk {
                    Ok(chunk) => {
                        buffer.extend_from_slice(&chunk);

                        // Chunks may end inside an event or a multibyte char, only decode complete lines
                        while let Some(line_end) = buffer.iter().position(|b| *b == b'\n') {
                            let line_bytes: Vec<u8> = buffer.drain(..=line_end).collect();
                            let line = String::from_utf8_lossy(&line_bytes);

                            let Some(data) = line.trim().strip_prefix("data:") else {
                                continue;
                            };

                            let data = data.trim();
                            if data == "[DONE]" {
                                break 'chunks;
                            }

                            match serde_json::from_str::<Value>(data) {
                                Ok(json) => {
                                    if let Some(delta_content) =
                                        json["choices"][0]["delta"]["content"].as_str()
                                    {
                                        let _ = sender
                                            .send(ChatCompletionEvent::Content(
                                                delta_content.to_string(),
                                            ))
                                            .await;
                                    } else if let Some(delta_reasoning_content) =
                                        json["choices"][0]["delta"]["reasoning_content"].as_str()
                                    {
                                        let _ = sender
                                            .send(ChatCompletionEvent::ReasoningContent(
                                                delta_reasoning_content.to_string(),
                                            ))
                                            .await;
                                    }
                                }
                                Err(err) => {
                                    let _ = sender.send(ChatCompletionEvent::Error(err.into())).await;
                                }
                            }
                        }
                    }
                    Err(err) => {
                        let _ = sender.send(ChatCompletionEvent::Error(err.into())).await;
                    }
                }
            }
        });

        Ok(ChatCompletionStream::new(receiver))
    }
}

#[derive(strum::Display)]
enum OpenAiRole {
    #[strum(serialize = "user")]
    User,

    #[strum(serialize = "assistant")]
    Assistant,

    #[strum(serialize = "system")]
    System,
}

impl From<Role> for OpenAiRole {
    fn from(val: Role) -> Self {
        match val {
            Role::User => OpenAiRole::User,
            Role::Bot => OpenAiRole::Assistant,
            Role::System => OpenAiRole::System,
        }
    }
}

impl Serialize for OpenAiRole {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

fn chat_message_to_json_value(chat_message: &ChatMessage) -> Value {
    json!({
        "role": OpenAiRole::from(chat_message.role),
        "content": chat_message.content
    })
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::{
        io::{AsyncReadExt, AsyncWriteExt},
        net::TcpListener,
    };
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{body_partial_json, header, method, path},
    };

    use super::*;

    /// Answer one request with a chunked SSE body, split into two chunks at `split_at`
    async fn serve_split_body(listener: TcpListener, body: &'static str, split_at: usize) {
        let (mut socket, _) = listener.accept().await.unwrap();

        let mut request: Vec<u8> = vec![];
        let mut buf = [0u8; 4096];
        loop {
            let n = socket.read(&mut buf).await.unwrap();
            request.extend_from_slice(&buf[..n]);

            if let Some(header_end) = request.windows(4).position(|w| w == b"\r\n\r\n") {
                let headers = String::from_utf8_lossy(&request[..header_end]).to_lowercase();
                let content_length = headers
                    .lines()
                    .find_map(|l| l.strip_prefix("content-length:"))
                    .and_then(|v| v.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                if request.len() >= header_end + 4 + content_length {
                    break;
                }
            }

            if n == 0 {
                break;
            }
        }

        socket
            .write_all(
                b"HTTP/1.1 200 OK\r\nContent-Type: text/event-stream\r\nTransfer-Encoding: chunked\r\n\r\n",
            )
            .await
            .unwrap();

        let body = body.as_bytes();
        for part in [&body[..split_at], &body[split_at..]] {
            socket
                .write_all(format!("{:x}\r\n", part.len()).as_bytes())
                .await
                .unwrap();
            socket.write_all(part).await.unwrap();
            socket.write_all(b"\r\n").await.unwrap();
            socket.flush().await.unwrap();
            tokio::time::sleep(Duration::from_millis(50)).await;
        }

        socket.write_all(b"0\r\n\r\n").await.unwrap();
        socket.flush().await.unwrap();
    }

    #[tokio::test]
    async fn test_multibyte_char_split_across_chunks() {
        let body = "data: {\"choices\":[{\"delta\":{\"content\":\"₹4250\"}}]}\n\ndata: [DONE]\n\n";
        let split_at = body.find('₹').unwrap() + 1;

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        let server = tokio::spawn(serve_split_body(listener, body, split_at));

        let provider = OpenAiProvider::new(&base_url, "sk-test", "gpt-4o-mini");
        let message = provider
            .chat_completion(
                &[ChatMessage::new(Role::User, "target price?")],
                &ChatCompletionOptions::default(),
            )
            .await
            .unwrap();
        assert_eq!(message.content, "₹4250");

        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_chat_completion() {
        let server = MockServer::start().await;

        let sse = concat!(
            "data: {\"choices\":[{\"delta\":{\"content\":\"{\\\"foo\\\":\"}}]}\n\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\" \\\"bar\\\"}\"}}]}\n\n",
            "data: [DONE]\n\n",
        );

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("Authorization", "Bearer sk-test"))
            .and(body_partial_json(json!({
                "model": "gpt-4o-mini",
                "response_format": { "type": "json_schema" },
            })))
            .respond_with(ResponseTemplate::new(200).set_body_raw(sse, "text/event-stream"))
            .mount(&server)
            .await;

        let provider = OpenAiProvider::new(&format!("{}/v1", server.uri()), "sk-test", "gpt-4o-mini");
        let options = ChatCompletionOptions::default()
            .with_response_schema("test", json!({ "type": "object" }));

        let message = provider
            .chat_completion(&[ChatMessage::new(Role::User, "hi")], &options)
            .await
            .unwrap();
        assert_eq!(message.role, Role::Bot);
        assert_eq!(message.content, "{\"foo\": \"bar\"}");
    }

    #[tokio::test]
    async fn test_unauthorized() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("Incorrect API key provided"))
            .mount(&server)
            .await;

        let provider = OpenAiProvider::new(&server.uri(), "sk-bad", "gpt-4o-mini");
        let result = provider
            .chat_completion(
                &[ChatMessage::new(Role::User, "hi")],
                &ChatCompletionOptions::default(),
            )
            .await;
        assert!(matches!(result, Err(PtoolError::AuthenticationFailed(_))));
    }

    #[tokio::test]
    async fn test_server_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let provider = OpenAiProvider::new(&server.uri(), "sk-test", "gpt-4o-mini");
        let result = provider
            .chat_completion(
                &[ChatMessage::new(Role::User, "hi")],
                &ChatCompletionOptions::default(),
            )
            .await;
        assert!(matches!(result, Err(PtoolError::HttpStatusError(_))));
    }
}
