//! Google Gemini and AI Studio over the `generativelanguage` REST API.
//!
//! Both provider names share one client; they differ in the API key they
//! read and in the safety settings sent with each request.

mod client;
mod dto;

pub use client::GeminiProvider;
pub use dto::{
    Candidate, Content, CountTokensResponse, GenerateContentRequest,
    GenerateContentRequestBuilder, GenerateContentResponse, GenerationConfig, Part,
    PromptFeedback, SafetySetting,
};
