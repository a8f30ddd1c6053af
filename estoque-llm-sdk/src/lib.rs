//! # Estoque LLM SDK
//!
//! A small, provider-agnostic LLM client layer. The only provider wired in is
//! OpenAI's Chat Completions API, which is what the inventory assistant talks to.
//!
//! ## Example
//!
//! ```rust,no_run
//! use estoque_llm_sdk::client::LlmClient;
//! use estoque_llm_sdk::openai::OpenAIClient;
//! use estoque_llm_sdk::types::{CompletionRequest, Message};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = OpenAIClient::new("your-api-key")?.with_model("gpt-4o-mini");
//!     let request = CompletionRequest::new(client.model_name(), vec![Message::user("Olá!")]);
//!     let response = client.complete(request).await?;
//!     println!("Response: {}", response.text());
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod error;
pub mod models;
pub mod openai;
pub mod providers;
pub mod types;

pub use client::LlmClient;
pub use error::LlmError;
pub use models::ChatModel;
