mod common;

use common::{setup_inventory_db, MockLlmClient};
use estoque_agents::executor::EARLY_STOP_OUTPUT;
use estoque_agents::types::{QueryState, QueryTracker};
use estoque_agents::{
    format_inventory_prompt, AgentExecutor, ExecutorError, ReactAgent, ReasoningPolicy, SqlToolkit,
};
use estoque_llm_sdk::client::LlmClient;
use estoque_llm_sdk::LlmError;
use estoque_tools::SqlDatabase;
use std::sync::Arc;
use std::time::Duration;
use tempfile::NamedTempFile;

fn build_executor(client: &Arc<MockLlmClient>, db: &NamedTempFile) -> AgentExecutor {
    let database = SqlDatabase::from_path(db.path()).unwrap();
    let llm: Arc<dyn LlmClient> = client.clone();
    let toolkit = Arc::new(SqlToolkit::new(database, llm.clone(), 5));
    let policy = Arc::new(ReasoningPolicy::builtin().unwrap());
    let agent = Arc::new(ReactAgent::new(llm, toolkit.tools(), policy));
    AgentExecutor::new(agent, toolkit)
}

#[tokio::test]
async fn test_price_question_is_answered() -> anyhow::Result<()> {
    let db = setup_inventory_db()?;
    let client = Arc::new(MockLlmClient::with_texts(&[
        " Preciso ver as tabelas.\nAction: sql_db_list_tables\nAction Input: ",
        " Vou ver o esquema.\nAction: sql_db_schema\nAction Input: products",
        " Agora a consulta.\nAction: sql_db_query\nAction Input: SELECT price FROM products WHERE name = 'Produto X'",
        " I now know the final answer\nFinal Answer: O **Produto X** custa R$ 49,90.",
    ]));
    let executor = build_executor(&client, &db);

    let input = format_inventory_prompt("Qual o preço do produto X?")?;
    let outcome = executor.invoke(&input).await?;

    assert_eq!(outcome.output, "O **Produto X** custa R$ 49,90.");
    assert!(!outcome.stopped_early);
    assert_eq!(outcome.steps.len(), 3);

    assert_eq!(outcome.steps[0].action.tool, "sql_db_list_tables");
    assert_eq!(outcome.steps[0].observation, "products");

    let schema = &outcome.steps[1].observation;
    assert!(schema.contains("CREATE TABLE products"));
    assert!(schema.contains("5 rows from products table:"));
    assert!(!schema.contains("Estojo"));

    assert!(outcome.steps[2].observation.contains("49.9"));

    assert_eq!(client.get_call_count(), 4);
    let first = client.request(0);
    assert_eq!(first.stop_sequences, Some(vec!["\nObservation".to_string()]));
    assert_eq!(first.model, "mock-model");

    let first_prompt = client.prompt(0);
    assert!(first_prompt.contains("Qual o preço do produto X?"));
    assert!(first_prompt
        .contains("[sql_db_query, sql_db_schema, sql_db_list_tables, sql_db_query_checker]"));
    assert!(first_prompt.ends_with("Thought:"));

    let second_prompt = client.prompt(1);
    assert!(second_prompt.contains("Action Input: \nObservation: products\nThought: "));

    Ok(())
}

#[tokio::test]
async fn test_malformed_output_is_recovered() -> anyhow::Result<()> {
    let db = setup_inventory_db()?;
    let client = Arc::new(MockLlmClient::with_texts(&[
        " Acho que já sei a resposta.",
        "Action: sql_db_query\nAction Input: SELECT 1\nFinal Answer: 1",
        " I now know the final answer\nFinal Answer: Temos 7 produtos.",
    ]));
    let executor = build_executor(&client, &db);

    let outcome = executor.invoke("Quantos produtos temos?").await?;

    assert_eq!(outcome.output, "Temos 7 produtos.");
    assert_eq!(outcome.steps.len(), 2);
    assert_eq!(outcome.steps[0].action.tool, "_Exception");
    assert_eq!(
        outcome.steps[0].observation,
        "Invalid Format: Missing 'Action:' after 'Thought:'"
    );
    assert_eq!(outcome.steps[1].observation, "Invalid or incomplete response");

    assert!(client
        .prompt(2)
        .contains("Final Answer: 1\nObservation: Invalid or incomplete response\nThought: "));

    Ok(())
}

#[tokio::test]
async fn test_parse_errors_fail_when_not_handled() -> anyhow::Result<()> {
    let db = setup_inventory_db()?;
    let client = Arc::new(MockLlmClient::with_texts(&["no format at all"]));
    let executor = build_executor(&client, &db).with_handle_parsing_errors(false);

    let result = executor.invoke("Quantos produtos temos?").await;

    assert!(matches!(result, Err(ExecutorError::OutputParse(_))));
    Ok(())
}

#[tokio::test]
async fn test_iteration_limit_stops_the_run() -> anyhow::Result<()> {
    let db = setup_inventory_db()?;
    let client = Arc::new(MockLlmClient::new());
    let executor = build_executor(&client, &db).with_max_iterations(3);

    let outcome = executor.invoke("Quantos produtos temos?").await?;

    assert_eq!(outcome.output, EARLY_STOP_OUTPUT);
    assert_eq!(
        outcome.output,
        "Agent stopped due to iteration limit or time limit."
    );
    assert!(outcome.stopped_early);
    assert_eq!(outcome.steps.len(), 3);
    assert_eq!(client.get_call_count(), 3);

    Ok(())
}

#[tokio::test]
async fn test_time_limit_stops_the_run() -> anyhow::Result<()> {
    let db = setup_inventory_db()?;
    let client = Arc::new(MockLlmClient::new().with_delay(Duration::from_millis(200)));
    let executor = build_executor(&client, &db)
        .with_max_execution_time(Some(Duration::from_millis(50)));

    let outcome = executor.invoke("Quantos produtos temos?").await?;

    assert!(outcome.stopped_early);
    assert_eq!(outcome.output, EARLY_STOP_OUTPUT);
    assert!(outcome.steps.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_time_limit_covers_query_checker_calls() -> anyhow::Result<()> {
    let db = setup_inventory_db()?;
    let client = Arc::new(
        MockLlmClient::with_texts(&[
            " Vou revisar a consulta.\nAction: sql_db_query_checker\nAction Input: SELECT * FROM products",
            "SELECT * FROM products",
        ])
        .with_delay_from(1, Duration::from_secs(2)),
    );
    let executor = build_executor(&client, &db)
        .with_max_execution_time(Some(Duration::from_millis(100)));

    let start = std::time::Instant::now();
    let outcome = executor.invoke("Quantos produtos temos?").await?;

    assert!(start.elapsed() < Duration::from_secs(1));
    assert!(outcome.stopped_early);
    assert_eq!(outcome.output, EARLY_STOP_OUTPUT);
    assert_eq!(client.get_call_count(), 2);

    Ok(())
}

#[tokio::test]
async fn test_unknown_tool_becomes_observation() -> anyhow::Result<()> {
    let db = setup_inventory_db()?;
    let client = Arc::new(MockLlmClient::with_texts(&[
        " Vou usar python.\nAction: python_repl\nAction Input: print(1)",
        " I now know the final answer\nFinal Answer: ok",
    ]));
    let executor = build_executor(&client, &db);

    let outcome = executor.invoke("Quantos produtos temos?").await?;

    assert_eq!(
        outcome.steps[0].observation,
        "python_repl is not a valid tool, try one of [sql_db_query, sql_db_schema, sql_db_list_tables, sql_db_query_checker]."
    );
    assert_eq!(outcome.output, "ok");

    Ok(())
}

#[tokio::test]
async fn test_rejected_query_becomes_error_observation() -> anyhow::Result<()> {
    let db = setup_inventory_db()?;
    let client = Arc::new(MockLlmClient::with_texts(&[
        " Vou apagar.\nAction: sql_db_query\nAction Input: DELETE FROM products",
        " Action: sql_db_query\nAction Input: SELECT * FROM missing_table",
        " I now know the final answer\nFinal Answer: Não é possível.",
    ]));
    let executor = build_executor(&client, &db);

    let outcome = executor.invoke("Apague tudo").await?;

    assert!(outcome.steps[0].observation.starts_with("Error: "));
    assert!(outcome.steps[1].observation.starts_with("Error: "));
    assert!(outcome.steps[1].observation.contains("missing_table"));

    let conn = rusqlite::Connection::open(db.path())?;
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM products", [], |row| row.get(0))?;
    assert_eq!(count, 7);

    Ok(())
}

#[tokio::test]
async fn test_query_checker_uses_the_model() -> anyhow::Result<()> {
    let db = setup_inventory_db()?;
    let client = Arc::new(MockLlmClient::with_texts(&[
        " Vou checar.\nAction: sql_db_query_checker\nAction Input: SELECT nome FROM products",
        "```sql\nSELECT name FROM products\n```",
        " I now know the final answer\nFinal Answer: ok",
    ]));
    let executor = build_executor(&client, &db);

    let outcome = executor.invoke("Liste os produtos").await?;

    assert_eq!(outcome.steps[0].observation, "SELECT name FROM products");
    let checker_request = client.request(1);
    assert_eq!(checker_request.temperature, Some(0.0));
    assert!(client.prompt(1).starts_with("SELECT nome FROM products\nDouble check"));

    Ok(())
}

#[tokio::test]
async fn test_llm_errors_propagate() -> anyhow::Result<()> {
    let db = setup_inventory_db()?;
    let client = Arc::new(MockLlmClient::new());
    client.push_error(LlmError::authentication("Invalid API key"));
    let executor = build_executor(&client, &db);

    let mut tracker = QueryTracker::new();
    tracker.transition(QueryState::PromptFormatted);
    let result = executor.invoke_tracked("Quantos produtos temos?", &mut tracker).await;

    match result {
        Err(e @ ExecutorError::Llm(LlmError::Authentication { .. })) => assert!(!e.is_transient()),
        other => panic!("Expected authentication error, got {:?}", other),
    }
    assert_eq!(tracker.state(), QueryState::Failed);

    Ok(())
}

#[tokio::test]
async fn test_tracked_run_ends_answered() -> anyhow::Result<()> {
    let db = setup_inventory_db()?;
    let client = Arc::new(MockLlmClient::with_texts(&[
        " Action: sql_db_list_tables\nAction Input: ",
        " I now know the final answer\nFinal Answer: products",
    ]));
    let executor = build_executor(&client, &db);

    let mut tracker = QueryTracker::new();
    tracker.transition(QueryState::PromptFormatted);
    executor.invoke_tracked("Quais tabelas?", &mut tracker).await?;

    assert_eq!(tracker.state(), QueryState::Answered);
    assert!(tracker
        .history()
        .contains(&QueryState::AgentRunning(estoque_agents::types::AgentPhase::Act)));

    Ok(())
}
