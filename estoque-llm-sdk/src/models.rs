//! Model constants for the OpenAI models offered in the model picker.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// OpenAI model constants
pub mod openai {
    /// GPT-4o - Flagship multimodal model
    pub const GPT_4O_ID: &str = "gpt-4o";
    pub const GPT_4O_NAME: &str = "GPT-4o";

    /// GPT-4o Mini - Smaller, faster version of GPT-4o
    pub const GPT_4O_MINI_ID: &str = "gpt-4o-mini";
    pub const GPT_4O_MINI_NAME: &str = "GPT-4o Mini";

    /// GPT-4 Turbo - Enhanced GPT-4 model
    pub const GPT_4_TURBO_ID: &str = "gpt-4-turbo";
    pub const GPT_4_TURBO_NAME: &str = "GPT-4 Turbo";

    /// GPT-4 - Original GPT-4 model
    pub const GPT_4_ID: &str = "gpt-4";
    pub const GPT_4_NAME: &str = "GPT-4";
}

/// The models a user can pick for a query.
///
/// Order matches the picklist; the first entry is the default selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ChatModel {
    #[default]
    #[serde(rename = "gpt-4")]
    Gpt4,
    #[serde(rename = "gpt-4-turbo")]
    Gpt4Turbo,
    #[serde(rename = "gpt-4o-mini")]
    Gpt4oMini,
    #[serde(rename = "gpt-4o")]
    Gpt4o,
}

impl ChatModel {
    pub const ALL: [ChatModel; 4] = [
        ChatModel::Gpt4,
        ChatModel::Gpt4Turbo,
        ChatModel::Gpt4oMini,
        ChatModel::Gpt4o,
    ];

    /// Model identifier sent to the API
    pub fn id(&self) -> &'static str {
        match self {
            ChatModel::Gpt4 => openai::GPT_4_ID,
            ChatModel::Gpt4Turbo => openai::GPT_4_TURBO_ID,
            ChatModel::Gpt4oMini => openai::GPT_4O_MINI_ID,
            ChatModel::Gpt4o => openai::GPT_4O_ID,
        }
    }

    /// Human-readable name
    pub fn display_name(&self) -> &'static str {
        match self {
            ChatModel::Gpt4 => openai::GPT_4_NAME,
            ChatModel::Gpt4Turbo => openai::GPT_4_TURBO_NAME,
            ChatModel::Gpt4oMini => openai::GPT_4O_MINI_NAME,
            ChatModel::Gpt4o => openai::GPT_4O_NAME,
        }
    }
}

impl fmt::Display for ChatModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for ChatModel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ChatModel::ALL
            .into_iter()
            .find(|model| model.id() == s.trim())
            .ok_or_else(|| {
                let valid: Vec<&str> = ChatModel::ALL.iter().map(|m| m.id()).collect();
                format!("Unknown model: {}. Valid models: {}", s, valid.join(", "))
            })
    }
}
