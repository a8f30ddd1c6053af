use crate::selector::{DatabaseMode, SelectedDatabase, READY_MESSAGE};
use estoque_llm_sdk::ChatModel;
use serde::{Deserialize, Serialize};

pub const EMPTY_QUESTION_WARNING: &str = "Por favor, faça uma pergunta";

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    #[serde(default)]
    pub mode: DatabaseMode,
    pub database: Option<String>,
    pub staged: Option<String>,
    pub model: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct QueryForm {
    #[serde(default)]
    pub mode: DatabaseMode,
    pub database: Option<String>,
    pub staged: Option<String>,
    pub model: Option<String>,
    #[serde(default)]
    pub question: String,
}

#[derive(Debug, Deserialize)]
pub struct UploadQuery {
    pub filename: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
}

/// Outcome of resolving the database for a request
#[derive(Debug, Default)]
pub struct Selection {
    pub databases: Vec<String>,
    pub selected: Option<SelectedDatabase>,
    pub warning: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DatabaseOption {
    pub name: String,
    pub selected: bool,
}

#[derive(Debug, Serialize)]
pub struct ModelOption {
    pub id: String,
    pub selected: bool,
}

/// Values rendered into the page template
#[derive(Debug, Serialize)]
pub struct PageContext {
    pub mode: String,
    pub is_upload: bool,
    pub databases: Vec<DatabaseOption>,
    pub database: Option<String>,
    pub staged: Option<String>,
    pub models: Vec<ModelOption>,
    pub model: String,
    pub success: Option<String>,
    pub warning: Option<String>,
    pub ready: bool,
    pub ready_message: String,
    pub question: String,
    /// Answer rendered from markdown; raw HTML already escaped
    pub answer_html: Option<String>,
    pub stopped_early: bool,
    pub error: Option<String>,
}

impl PageContext {
    pub fn new(mode: DatabaseMode, model: ChatModel, selection: &Selection) -> Self {
        let selected_name = selection.selected.as_ref().map(|s| s.name.clone());

        let databases = selection
            .databases
            .iter()
            .map(|name| DatabaseOption {
                name: name.clone(),
                selected: Some(name) == selected_name.as_ref(),
            })
            .collect();

        let models = ChatModel::ALL
            .iter()
            .map(|candidate| ModelOption {
                id: candidate.id().to_string(),
                selected: *candidate == model,
            })
            .collect();

        let is_upload = mode == DatabaseMode::Upload;

        Self {
            mode: if is_upload { "upload" } else { "existing" }.to_string(),
            is_upload,
            databases,
            database: if is_upload { None } else { selected_name.clone() },
            staged: if is_upload { selected_name } else { None },
            models,
            model: model.id().to_string(),
            success: selection.selected.as_ref().map(|s| s.banner.clone()),
            warning: selection.warning.clone(),
            ready: selection.selected.is_some(),
            ready_message: READY_MESSAGE.to_string(),
            question: String::new(),
            answer_html: None,
            stopped_early: false,
            error: None,
        }
    }
}

/// Parse the model picked on the page, falling back to the default
pub fn parse_model(model: Option<&str>) -> ChatModel {
    match model.filter(|m| !m.is_empty()) {
        Some(id) => id.parse().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Falling back to the default model");
            ChatModel::default()
        }),
        None => ChatModel::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_model() {
        assert_eq!(parse_model(Some("gpt-4o")), ChatModel::Gpt4o);
        assert_eq!(parse_model(Some("gpt-4o-mini")), ChatModel::Gpt4oMini);
        assert_eq!(parse_model(Some("llama")), ChatModel::Gpt4);
        assert_eq!(parse_model(None), ChatModel::Gpt4);
    }

    #[test]
    fn test_context_without_database() {
        let selection = Selection {
            warning: Some("Nenhum arquivo .db foi encontrado na pasta.".to_string()),
            ..Default::default()
        };
        let context = PageContext::new(DatabaseMode::Existing, ChatModel::Gpt4o, &selection);

        assert!(!context.ready);
        assert_eq!(context.mode, "existing");
        assert!(context.models.iter().any(|m| m.id == "gpt-4o" && m.selected));
        assert_eq!(context.models.iter().filter(|m| m.selected).count(), 1);
    }
}
