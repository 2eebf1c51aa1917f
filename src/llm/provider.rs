use reqwest::{Response, StatusCode};

use crate::{
    error::{PtoolError, PtoolResult},
    llm::{ChatCompletionOptions, ChatCompletionStream, ChatMessage, Role},
};

pub mod gemini;
pub mod open_ai;

pub trait ChatProvider {
    fn chat_completion(
        &self,
        messages: &[ChatMessage],
        options: &ChatCompletionOptions,
    ) -> impl std::future::Future<Output = PtoolResult<ChatMessage>> + Send;

    fn chat_completion_stream(
        &self,
        messages: &[ChatMessage],
        options: &ChatCompletionOptions,
    ) -> impl std::future::Future<Output = PtoolResult<ChatCompletionStream>> + Send;
}

/// Error for a non-2xx provider response, rejected credentials become `AuthenticationFailed`
async fn status_error(response: Response) -> PtoolError {
    let status = response.status();
    let body = response.text().await.ok().unwrap_or_default();

    if status == StatusCode::UNAUTHORIZED
        || status == StatusCode::FORBIDDEN
        || body.contains("API key not valid")
        || body.contains("API_KEY_INVALID")
        || body.contains("invalid_api_key")
    {
        PtoolError::AuthenticationFailed(format!(
            "The provided API key is invalid, please check your configuration ({status})"
        ))
    } else {
        PtoolError::HttpStatusError(format!("{status} {body}"))
    }
}
