#![allow(dead_code)]

use actix_web::{test, web, App};
use estoque_agents::ReasoningPolicy;
use estoque_llm_sdk::client::LlmClient;
use estoque_llm_sdk::error::LlmError;
use estoque_llm_sdk::types::{CompletionRequest, CompletionResponse, ContentBlock, Role, Usage};
use estoque_llm_sdk::ChatModel;
use estoque_web::config::AppConfig;
use estoque_web::gateway::ClientFactory;
use estoque_web::AppState;
use rusqlite::Connection;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

pub struct TestApp<S> {
    pub workdir: TempDir,
    pub factory: Arc<RecordingClientFactory>,
    pub mock_llm_client: Arc<MockLlmClient>,
    pub app: S,
}

pub struct MockLlmClient {
    pub responses: Arc<Mutex<Vec<CompletionResponse>>>,
    pub requests: Arc<Mutex<Vec<CompletionRequest>>>,
}

impl MockLlmClient {
    pub fn new() -> Self {
        MockLlmClient {
            responses: Arc::new(Mutex::new(Vec::new())),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn push_text(&self, text: &str) {
        self.responses
            .lock()
            .unwrap()
            .push(create_completion_response_with_text(text));
    }

    pub fn get_call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn prompt(&self, index: usize) -> String {
        self.requests.lock().unwrap()[index].messages[0].text_content()
    }
}

impl Default for MockLlmClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl LlmClient for MockLlmClient {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        self.requests.lock().unwrap().push(request);

        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            Ok(create_completion_response_with_text(
                " I now know the final answer\nFinal Answer: Sem dados.",
            ))
        } else {
            Ok(responses.remove(0))
        }
    }

    fn provider_name(&self) -> &str {
        "mock"
    }

    fn model_name(&self) -> &str {
        "mock-model"
    }
}

/// Hands out the shared mock client and records which model was requested
pub struct RecordingClientFactory {
    pub client: Arc<MockLlmClient>,
    pub models: Mutex<Vec<String>>,
}

impl RecordingClientFactory {
    pub fn new(client: Arc<MockLlmClient>) -> Self {
        Self {
            client,
            models: Mutex::new(Vec::new()),
        }
    }

    pub fn requested_models(&self) -> Vec<String> {
        self.models.lock().unwrap().clone()
    }
}

impl ClientFactory for RecordingClientFactory {
    fn create(&self, model: ChatModel) -> Result<Arc<dyn LlmClient>, LlmError> {
        self.models.lock().unwrap().push(model.id().to_string());
        Ok(self.client.clone())
    }
}

pub fn create_completion_response_with_text(text: &str) -> CompletionResponse {
    CompletionResponse {
        content: vec![ContentBlock::Text {
            text: text.to_string(),
        }],
        role: Role::Assistant,
        usage: Usage {
            input_tokens: 10,
            output_tokens: 20,
        },
        stop_reason: Some("stop".to_string()),
    }
}

/// Write an inventory database with a `products(name, price)` table at `path`
pub fn create_inventory_db(path: &Path) -> anyhow::Result<()> {
    let conn = Connection::open(path)?;

    conn.execute(
        "CREATE TABLE products (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            price REAL NOT NULL
        )",
        [],
    )?;

    for (name, price) in [("Produto X", 49.9), ("Produto Y", 12.5), ("Caneta", 2.5)] {
        conn.execute(
            "INSERT INTO products (name, price) VALUES (?1, ?2)",
            rusqlite::params![name, price],
        )?;
    }

    Ok(())
}

pub fn test_config(workdir: &Path) -> AppConfig {
    let mut config = AppConfig::default();
    config.storage.working_dir = workdir.to_path_buf();
    config.agent.max_iterations = 5;
    config.agent.verbose = false;
    config
}

pub async fn init_app(
    config: &AppConfig,
    factory: Arc<dyn ClientFactory>,
) -> anyhow::Result<
    impl actix_web::dev::Service<
        actix_http::Request,
        Response = actix_web::dev::ServiceResponse,
        Error = actix_web::Error,
    >,
> {
    let policy = Arc::new(ReasoningPolicy::builtin()?);
    let state = web::Data::new(AppState::new(config, factory, policy)?);

    Ok(test::init_service(
        App::new()
            .app_data(state)
            .app_data(web::PayloadConfig::new(config.server.max_upload_bytes()))
            .configure(estoque_web::configure),
    )
    .await)
}

pub async fn setup_test_app() -> anyhow::Result<
    TestApp<
        impl actix_web::dev::Service<
            actix_http::Request,
            Response = actix_web::dev::ServiceResponse,
            Error = actix_web::Error,
        >,
    >,
> {
    let workdir = TempDir::new()?;
    let mock_llm_client = Arc::new(MockLlmClient::new());
    let factory = Arc::new(RecordingClientFactory::new(mock_llm_client.clone()));

    let config = test_config(workdir.path());
    let app = init_app(&config, factory.clone()).await?;

    Ok(TestApp {
        workdir,
        factory,
        mock_llm_client,
        app,
    })
}
