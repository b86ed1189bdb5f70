//! OpenAI chat completions.

mod client;
mod dto;

pub use client::OpenAIProvider;
pub use dto::{
    ChatChoice, ChatCompletionRequest, ChatCompletionRequestBuilder, ChatCompletionResponse,
    ChatMessage,
};
