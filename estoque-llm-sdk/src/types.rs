use serde::{Deserialize, Serialize};

/// Role of a message in a conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// User message
    User,
    /// Assistant message
    Assistant,
    /// System message
    System,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
            Role::System => write!(f, "system"),
        }
    }
}

/// Content block for messages
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ContentBlock {
    /// Text content
    Text { text: String },
}

/// A message in a conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Role of the message sender
    pub role: Role,
    /// Content of the message
    pub content: Vec<ContentBlock>,
}

impl Message {
    /// Create a new text message
    pub fn text<S: Into<String>>(role: Role, text: S) -> Self {
        Self {
            role,
            content: vec![ContentBlock::Text { text: text.into() }],
        }
    }

    /// Create a user message with text content
    pub fn user<S: Into<String>>(text: S) -> Self {
        Self::text(Role::User, text)
    }

    /// Create an assistant message with text content
    pub fn assistant<S: Into<String>>(text: S) -> Self {
        Self::text(Role::Assistant, text)
    }

    /// Create a system message with text content
    pub fn system<S: Into<String>>(text: S) -> Self {
        Self::text(Role::System, text)
    }

    /// Concatenated text of all content blocks
    pub fn text_content(&self) -> String {
        join_text(&self.content)
    }
}

/// Token usage information
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    /// Number of tokens in the input prompt
    pub input_tokens: u32,
    /// Number of tokens in the output completion
    pub output_tokens: u32,
}

/// Generic completion request (provider-agnostic)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionRequest {
    /// Messages for the conversation
    pub messages: Vec<Message>,
    /// Maximum tokens to generate
    pub max_tokens: u32,
    /// Model to use (provider-specific)
    pub model: String,
    /// Optional system message
    pub system: Option<String>,
    /// Temperature for randomness (0.0 to 1.0)
    pub temperature: Option<f32>,
    /// Top-p sampling parameter
    pub top_p: Option<f32>,
    /// Stop sequences
    pub stop_sequences: Option<Vec<String>>,
}

impl CompletionRequest {
    /// Request with the given model and messages and default sampling settings
    pub fn new(model: impl Into<String>, messages: Vec<Message>) -> Self {
        Self {
            messages,
            max_tokens: 2048,
            model: model.into(),
            system: None,
            temperature: None,
            top_p: None,
            stop_sequences: None,
        }
    }
}

/// Generic completion response (provider-agnostic)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionResponse {
    /// Generated content
    pub content: Vec<ContentBlock>,
    /// Role of the response
    pub role: Role,
    /// Token usage information
    pub usage: Usage,
    /// Stop reason
    pub stop_reason: Option<String>,
}

impl CompletionResponse {
    /// Concatenated text of the generated content
    pub fn text(&self) -> String {
        join_text(&self.content)
    }
}

fn join_text(content: &[ContentBlock]) -> String {
    content
        .iter()
        .map(|block| match block {
            ContentBlock::Text { text } => text.as_str(),
        })
        .collect::<Vec<_>>()
        .join("\n")
}
