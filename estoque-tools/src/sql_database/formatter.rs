//! Result formatting for the agent's observations.
//!
//! Results are rendered as an aligned text table with a short header, which the
//! model reads far more reliably than raw JSON.
//!
//! ```text
//! Query executed successfully. Returned 2 rows.
//!
//! name    | price
//! --------+------
//! Caneta  | 2.5
//! Caderno | 15.9
//! ```

use serde_json::Value;

use super::executor::QueryResult;

const MAX_CELL_CHARS: usize = 50;

pub fn format_query_result(result: &QueryResult) -> String {
    if result.row_count == 0 {
        return "Query executed successfully but returned no rows.".to_string();
    }

    let mut output = format!(
        "Query executed successfully. Returned {} rows",
        result.row_count
    );
    if result.truncated {
        output.push_str(" (more rows available, refine the query or raise the limit)");
    }
    output.push_str(".\n\n");

    output.push_str(&format_table(&result.columns, &result.rows));
    output
}

/// Aligned `col | col` table of every fetched row
pub fn format_table(columns: &[String], rows: &[Vec<Value>]) -> String {
    if columns.is_empty() {
        return String::new();
    }

    let shown: Vec<Vec<String>> = rows
        .iter()
        .map(|row| row.iter().map(format_cell_value).collect())
        .collect();

    let mut col_widths: Vec<usize> = columns.iter().map(|c| c.chars().count()).collect();
    for row in &shown {
        for (i, cell) in row.iter().enumerate() {
            if let Some(width) = col_widths.get_mut(i) {
                *width = (*width).max(cell.chars().count());
            }
        }
    }

    let mut output = String::new();

    let header: Vec<String> = columns
        .iter()
        .enumerate()
        .map(|(i, col)| pad(col, col_widths[i]))
        .collect();
    output.push_str(header.join(" | ").trim_end());
    output.push('\n');

    let separator: Vec<String> = col_widths.iter().map(|&width| "-".repeat(width)).collect();
    output.push_str(&separator.join("-+-"));
    output.push('\n');

    for row in &shown {
        let formatted_row: Vec<String> = row
            .iter()
            .enumerate()
            .map(|(i, cell)| pad(cell, col_widths.get(i).copied().unwrap_or(0)))
            .collect();
        output.push_str(formatted_row.join(" | ").trim_end());
        output.push('\n');
    }

    output
}

fn pad(text: &str, width: usize) -> String {
    let len = text.chars().count();
    format!("{}{}", text, " ".repeat(width.saturating_sub(len)))
}

fn format_cell_value(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::String(s) => {
            if s.chars().count() > MAX_CELL_CHARS {
                let cut: String = s.chars().take(MAX_CELL_CHARS - 3).collect();
                format!("{}...", cut)
            } else {
                s.clone()
            }
        }
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_cell_value() {
        assert_eq!(format_cell_value(&Value::Null), "NULL");
        assert_eq!(format_cell_value(&Value::String("test".to_string())), "test");
        assert_eq!(
            format_cell_value(&Value::String("a".repeat(60))),
            format!("{}...", "a".repeat(47))
        );
        assert_eq!(format_cell_value(&Value::String("ç".repeat(60))).chars().count(), 50);
        assert_eq!(
            format_cell_value(&Value::Number(serde_json::Number::from(42))),
            "42"
        );
    }

    #[test]
    fn test_format_query_result() {
        let result = QueryResult {
            columns: vec!["name".to_string(), "price".to_string()],
            rows: vec![
                vec![Value::String("Caneta".to_string()), serde_json::json!(2.5)],
                vec![Value::String("Caderno".to_string()), serde_json::json!(15.9)],
            ],
            row_count: 2,
            truncated: false,
            execution_time_ms: 3,
        };

        let formatted = format_query_result(&result);

        assert!(formatted.starts_with("Query executed successfully. Returned 2 rows.\n"));
        assert!(formatted.contains("name    | price"));
        assert!(formatted.contains("Caderno | 15.9"));
        assert!(!formatted.contains("more rows available"));
    }

    #[test]
    fn test_format_shows_every_fetched_row() {
        let rows: Vec<Vec<Value>> = (1..=45)
            .map(|i| vec![Value::String(format!("Produto {}", i)), serde_json::json!(i)])
            .collect();
        let result = QueryResult {
            columns: vec!["name".to_string(), "price".to_string()],
            rows,
            row_count: 45,
            truncated: false,
            execution_time_ms: 2,
        };

        let formatted = format_query_result(&result);

        assert!(formatted.contains("Returned 45 rows."));
        assert!(formatted.contains("Produto 21 "));
        assert!(formatted.contains("Produto 45 | 45"));
        assert!(!formatted.contains("more rows"));
        assert_eq!(formatted.lines().count(), 2 + 2 + 45);
    }

    #[test]
    fn test_format_truncated_result() {
        let result = QueryResult {
            columns: vec!["id".to_string()],
            rows: vec![vec![serde_json::json!(1)]],
            row_count: 1,
            truncated: true,
            execution_time_ms: 1,
        };

        assert!(format_query_result(&result).contains("more rows available"));
    }

    #[test]
    fn test_format_empty_query_result() {
        let result = QueryResult {
            columns: vec!["id".to_string()],
            rows: vec![],
            row_count: 0,
            truncated: false,
            execution_time_ms: 5,
        };

        assert_eq!(
            format_query_result(&result),
            "Query executed successfully but returned no rows."
        );
    }
}
