//! SQL query executor with read-only validation.
//!
//! Queries are parsed into an AST with `sqlparser` and only single `SELECT`
//! statements (including subqueries, joins and set operations) or `PRAGMA`
//! introspection statements are accepted. A final keyword scan rejects
//! data-modifying keywords that appear as whole words outside string literals.

use regex::Regex;
use rusqlite::types::ValueRef;
use rusqlite::Connection;
use serde_json::Value;
use sqlparser::ast::{Expr, SetExpr, Statement, TableFactor};
use sqlparser::dialect::SQLiteDialect;
use sqlparser::parser::Parser;
use std::sync::OnceLock;
use std::time::{Duration, Instant};

use crate::tool_error::ToolError;

const DANGEROUS_KEYWORDS: [&str; 11] = [
    "DROP", "DELETE", "UPDATE", "INSERT", "CREATE", "ALTER", "TRUNCATE", "EXEC", "EXECUTE",
    "MERGE", "CALL",
];

#[derive(Debug, Clone)]
pub struct QueryResult {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
    pub row_count: usize,
    pub truncated: bool,
    pub execution_time_ms: u64,
}

pub struct SqlExecutor {
    conn: Connection,
    max_rows: usize,
}

impl SqlExecutor {
    pub fn new(db_path: &str, max_rows: usize, timeout_ms: u64) -> Result<Self, ToolError> {
        let conn = Connection::open(db_path)?;
        conn.busy_timeout(Duration::from_millis(timeout_ms))?;

        Ok(Self { conn, max_rows })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn execute(&self, query: &str, limit: Option<usize>) -> Result<QueryResult, ToolError> {
        let start_time = Instant::now();

        validate_query(query)?;

        let effective_limit = limit.unwrap_or(self.max_rows).min(self.max_rows);

        let is_pragma = query.trim().to_uppercase().starts_with("PRAGMA");
        let final_query = if is_pragma {
            query.trim().trim_end_matches(';').to_string()
        } else {
            // One extra row tells us whether the result was cut
            apply_limit(query, effective_limit + 1)
        };

        let mut stmt = self.conn.prepare(&final_query)?;
        let column_names: Vec<String> = stmt
            .column_names()
            .iter()
            .map(|&name| name.to_string())
            .collect();
        let column_count = column_names.len();

        let mut rows = stmt.query([])?;
        let mut result_rows = Vec::new();
        let mut truncated = false;

        while let Some(row) = rows.next()? {
            if result_rows.len() >= effective_limit {
                truncated = true;
                break;
            }
            let mut values = Vec::with_capacity(column_count);
            for i in 0..column_count {
                values.push(value_to_json(row.get_ref(i)?));
            }
            result_rows.push(values);
        }

        let execution_time_ms = start_time.elapsed().as_millis() as u64;

        Ok(QueryResult {
            columns: column_names,
            row_count: result_rows.len(),
            rows: result_rows,
            truncated,
            execution_time_ms,
        })
    }
}

pub(crate) fn value_to_json(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::Number(serde_json::Number::from(i)),
        ValueRef::Real(f) => serde_json::Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        ValueRef::Text(s) => Value::String(String::from_utf8_lossy(s).to_string()),
        ValueRef::Blob(_) => Value::String("<BLOB>".to_string()),
    }
}

pub fn validate_query(query: &str) -> Result<(), ToolError> {
    let trimmed = query.trim();
    if trimmed.is_empty() {
        return Err(ToolError::InvalidInput("Empty SQL statement".to_string()));
    }

    if trimmed.to_uppercase().starts_with("PRAGMA") {
        return validate_pragma(trimmed);
    }

    let statements = Parser::parse_sql(&SQLiteDialect {}, trimmed)
        .map_err(|e| ToolError::InvalidInput(format!("Failed to parse SQL: {}", e)))?;

    match statements.as_slice() {
        [] => return Err(ToolError::InvalidInput("Empty SQL statement".to_string())),
        [Statement::Query(query)] => validate_query_body(&query.body)?,
        [_] => {
            return Err(ToolError::InvalidInput(
                "Only SELECT queries and PRAGMA statements are allowed".to_string(),
            ))
        }
        _ => {
            return Err(ToolError::InvalidInput(
                "Multiple SQL statements are not allowed".to_string(),
            ))
        }
    }

    check_keywords(trimmed)
}

fn validate_pragma(query: &str) -> Result<(), ToolError> {
    // PRAGMA x = y writes database settings
    if query.contains('=') {
        return Err(ToolError::InvalidInput(
            "PRAGMA assignments are not allowed".to_string(),
        ));
    }
    if query.trim_end_matches(';').contains(';') {
        return Err(ToolError::InvalidInput(
            "Multiple SQL statements are not allowed".to_string(),
        ));
    }
    check_keywords(query)
}

fn check_keywords(query: &str) -> Result<(), ToolError> {
    let without_literals = string_literal_pattern().replace_all(query, "''");
    let upper = without_literals.to_uppercase();

    for keyword in DANGEROUS_KEYWORDS {
        let found = upper
            .split(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .any(|word| word == keyword);
        if found {
            return Err(ToolError::InvalidInput(format!(
                "Use of '{}' is not allowed in queries",
                keyword
            )));
        }
    }

    Ok(())
}

fn string_literal_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"'(?:[^']|'')*'").expect("valid literal pattern"))
}

fn validate_query_body(set_expr: &SetExpr) -> Result<(), ToolError> {
    match set_expr {
        SetExpr::Select(select) => {
            for table_with_joins in &select.from {
                validate_table_factor(&table_with_joins.relation)?;
                for join in &table_with_joins.joins {
                    validate_table_factor(&join.relation)?;
                }
            }

            if let Some(where_clause) = &select.selection {
                validate_expr(where_clause)?;
            }
        }
        SetExpr::Query(query) => validate_query_body(&query.body)?,
        SetExpr::SetOperation { left, right, .. } => {
            validate_query_body(left)?;
            validate_query_body(right)?;
        }
        SetExpr::Values(_) => {}
        _ => {
            return Err(ToolError::InvalidInput(
                "Only SELECT queries and PRAGMA statements are allowed".to_string(),
            ))
        }
    }
    Ok(())
}

fn validate_table_factor(table_factor: &TableFactor) -> Result<(), ToolError> {
    match table_factor {
        TableFactor::Derived { subquery, .. } => validate_query_body(&subquery.body)?,
        TableFactor::NestedJoin {
            table_with_joins, ..
        } => {
            validate_table_factor(&table_with_joins.relation)?;
            for join in &table_with_joins.joins {
                validate_table_factor(&join.relation)?;
            }
        }
        _ => {}
    }
    Ok(())
}

fn validate_expr(expr: &Expr) -> Result<(), ToolError> {
    match expr {
        Expr::Subquery(subquery) => validate_query_body(&subquery.body)?,
        Expr::InSubquery { subquery, .. } => validate_query_body(&subquery.body)?,
        Expr::Exists { subquery, .. } => validate_query_body(&subquery.body)?,
        Expr::BinaryOp { left, right, .. } => {
            validate_expr(left)?;
            validate_expr(right)?;
        }
        Expr::UnaryOp { expr, .. } | Expr::Nested(expr) => validate_expr(expr)?,
        _ => {}
    }
    Ok(())
}

fn apply_limit(query: &str, limit: usize) -> String {
    let query_trimmed = query.trim().trim_end_matches(';').trim_end();
    let query_upper = query_trimmed.to_uppercase();

    static LIMIT_PATTERN: OnceLock<Regex> = OnceLock::new();
    let limit_pattern = LIMIT_PATTERN
        .get_or_init(|| Regex::new(r"\bLIMIT\s+\d+(\s*(,|OFFSET)\s*\d+)?\s*$").expect("valid limit pattern"));

    if limit_pattern.is_match(&query_upper) {
        tracing::debug!("Query already has LIMIT clause, not adding another");
        query_trimmed.to_string()
    } else {
        tracing::debug!(limit, "Adding LIMIT to query");
        format!("{} LIMIT {}", query_trimmed, limit)
    }
}
