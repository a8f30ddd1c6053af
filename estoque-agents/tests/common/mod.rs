#![allow(dead_code)]

use estoque_llm_sdk::client::LlmClient;
use estoque_llm_sdk::error::LlmError;
use estoque_llm_sdk::types::{CompletionRequest, CompletionResponse, ContentBlock, Role, Usage};
use rusqlite::Connection;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::NamedTempFile;

/// Scripted model: answers with queued responses in order and records every request
pub struct MockLlmClient {
    pub responses: Arc<Mutex<Vec<Result<CompletionResponse, LlmError>>>>,
    pub requests: Arc<Mutex<Vec<CompletionRequest>>>,
    pub delay: Option<Duration>,
    /// Index of the first request the delay applies to
    pub delay_from: usize,
}

impl MockLlmClient {
    pub fn new() -> Self {
        MockLlmClient {
            responses: Arc::new(Mutex::new(Vec::new())),
            requests: Arc::new(Mutex::new(Vec::new())),
            delay: None,
            delay_from: 0,
        }
    }

    pub fn with_texts(texts: &[&str]) -> Self {
        let client = Self::new();
        for text in texts {
            client.push_text(text);
        }
        client
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Delay only the requests from the `from`-th one (zero-based) onward
    pub fn with_delay_from(mut self, from: usize, delay: Duration) -> Self {
        self.delay = Some(delay);
        self.delay_from = from;
        self
    }

    pub fn push_text(&self, text: &str) {
        self.responses
            .lock()
            .unwrap()
            .push(Ok(create_completion_response_with_text(text)));
    }

    pub fn push_error(&self, error: LlmError) {
        self.responses.lock().unwrap().push(Err(error));
    }

    pub fn get_call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn request(&self, index: usize) -> CompletionRequest {
        self.requests.lock().unwrap()[index].clone()
    }

    pub fn prompt(&self, index: usize) -> String {
        self.request(index).messages[0].text_content()
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
        let index = {
            let mut requests = self.requests.lock().unwrap();
            requests.push(request);
            requests.len() - 1
        };

        if let Some(delay) = self.delay.filter(|_| index >= self.delay_from) {
            tokio::time::sleep(delay).await;
        }

        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            Ok(create_completion_response_with_text(
                " I keep thinking\nAction: sql_db_list_tables\nAction Input: ",
            ))
        } else {
            responses.remove(0)
        }
    }

    fn provider_name(&self) -> &str {
        "mock"
    }

    fn model_name(&self) -> &str {
        "mock-model"
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

/// Inventory database with a `products(name, price)` table
pub fn setup_inventory_db() -> anyhow::Result<NamedTempFile> {
    let temp_file = NamedTempFile::new()?;
    let conn = Connection::open(temp_file.path())?;

    conn.execute(
        "CREATE TABLE products (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            price REAL NOT NULL
        )",
        [],
    )?;

    let products = vec![
        ("Produto X", 49.9),
        ("Produto Y", 12.5),
        ("Caneta", 2.5),
        ("Caderno", 15.9),
        ("Mochila", 120.0),
        ("Estojo", 25.0),
        ("Régua", 3.0),
    ];

    for (name, price) in products {
        conn.execute(
            "INSERT INTO products (name, price) VALUES (?1, ?2)",
            rusqlite::params![name, price],
        )?;
    }

    Ok(temp_file)
}
