//! SQLite database handle and the read-only operations the agent's tools run
//! against it.
//!
//! A [`SqlDatabase`] only remembers where the file lives. Every operation opens
//! a fresh connection with a busy timeout and closes it when done, so a handle
//! can be created per request and shared freely.
//!
//! # Operations
//!
//! - [`SqlDatabase::table_names`] - user tables, sorted by name
//! - [`SqlDatabase::table_info`] - `CREATE` statements plus sample rows
//! - [`SqlDatabase::run`] - validated `SELECT`/`PRAGMA` execution
//!
//! The file itself is not validated when the handle is created: a corrupt or
//! non-SQLite file is reported by the engine on first use.

use rusqlite::Connection;
use std::path::{Path, PathBuf};

use crate::tool_error::ToolError;

pub mod executor;
pub mod formatter;

pub use executor::{QueryResult, SqlExecutor};

const SQLITE_URI_PREFIX: &str = "sqlite:///";
const DEFAULT_LIMIT: usize = 100;
const MAX_LIMIT: usize = 1000;
const TIMEOUT_MS: u64 = 5000;
const DEFAULT_SAMPLE_ROWS: usize = 3;

#[derive(Debug, Clone)]
pub struct SqlDatabase {
    path: PathBuf,
    sample_rows_in_table_info: usize,
}

impl SqlDatabase {
    /// Handle for an existing SQLite file
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ToolError> {
        let path = path.as_ref();
        validate_db_path(path)?;

        Ok(Self {
            path: path.to_path_buf(),
            sample_rows_in_table_info: DEFAULT_SAMPLE_ROWS,
        })
    }

    /// Handle from a `sqlite:///<path>` URI
    pub fn from_uri(uri: &str) -> Result<Self, ToolError> {
        let path = uri.strip_prefix(SQLITE_URI_PREFIX).ok_or_else(|| {
            ToolError::InvalidInput(format!(
                "Unsupported database URI: {}. Expected {}<path>",
                uri, SQLITE_URI_PREFIX
            ))
        })?;
        Self::from_path(path)
    }

    /// Number of sample rows appended to each table description
    pub fn with_sample_rows(mut self, sample_rows: usize) -> Self {
        self.sample_rows_in_table_info = sample_rows;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn uri(&self) -> String {
        format!("{}{}", SQLITE_URI_PREFIX, self.path.display())
    }

    fn executor(&self) -> Result<SqlExecutor, ToolError> {
        SqlExecutor::new(&self.path.to_string_lossy(), MAX_LIMIT, TIMEOUT_MS)
            .map_err(|e| ToolError::ExecutionError(format!("Failed to open database: {}", e)))
    }

    pub fn table_names(&self) -> Result<Vec<String>, ToolError> {
        let executor = self.executor()?;
        let mut stmt = executor.connection().prepare(
            "SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
        )?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(names)
    }

    /// Schema and sample rows for the given tables.
    ///
    /// Unknown table names are rejected as a whole so the caller can correct
    /// them before retrying.
    pub fn table_info(&self, tables: &[String]) -> Result<String, ToolError> {
        let all_tables = self.table_names()?;

        let requested: Vec<&String> = if tables.is_empty() {
            all_tables.iter().collect()
        } else {
            tables.iter().collect()
        };

        let missing: Vec<&str> = requested
            .iter()
            .filter(|name| !all_tables.contains(name))
            .map(|name| name.as_str())
            .collect();
        if !missing.is_empty() {
            return Err(ToolError::InvalidInput(format!(
                "table_names {{{}}} not found in database",
                missing.join(", ")
            )));
        }

        let executor = self.executor()?;
        let conn = executor.connection();

        let mut sections = Vec::with_capacity(requested.len());
        for table in requested {
            let create_sql: String = conn.query_row(
                "SELECT sql FROM sqlite_master WHERE type='table' AND name = ?1",
                [table],
                |row| row.get(0),
            )?;

            let mut section = create_sql.trim().to_string();
            if self.sample_rows_in_table_info > 0 {
                section.push_str("\n\n");
                section.push_str(&sample_rows(conn, table, self.sample_rows_in_table_info)?);
            }
            sections.push(section);
        }

        Ok(sections.join("\n\n"))
    }

    /// Run a read-only query, returning at most `limit` rows (default 100, max 1000)
    pub fn run(&self, query: &str, limit: Option<usize>) -> Result<QueryResult, ToolError> {
        let limit = limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT);
        let executor = self.executor()?;
        executor.execute(query, Some(limit))
    }
}

fn sample_rows(conn: &Connection, table: &str, count: usize) -> Result<String, ToolError> {
    let query = format!("SELECT * FROM {} LIMIT {}", quote_identifier(table), count);
    let mut stmt = conn.prepare(&query)?;
    let columns: Vec<String> = stmt.column_names().iter().map(|c| c.to_string()).collect();
    let column_count = columns.len();

    let mut rows = stmt.query([])?;
    let mut lines = vec![columns.join("\t")];
    let mut fetched = 0;
    while let Some(row) = rows.next()? {
        let mut cells = Vec::with_capacity(column_count);
        for i in 0..column_count {
            let cell = match executor::value_to_json(row.get_ref(i)?) {
                serde_json::Value::String(s) => s,
                serde_json::Value::Null => "None".to_string(),
                other => other.to_string(),
            };
            cells.push(cell);
        }
        lines.push(cells.join("\t"));
        fetched += 1;
    }

    Ok(format!(
        "/*\n{} rows from {} table:\n{}\n*/",
        fetched,
        table,
        lines.join("\n")
    ))
}

fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn validate_db_path(path: &Path) -> Result<(), ToolError> {
    if path.as_os_str().is_empty() {
        return Err(ToolError::InvalidPath(
            "Database path cannot be empty".to_string(),
        ));
    }

    if !path.exists() {
        return Err(ToolError::InvalidPath(format!(
            "Database file not found: {}",
            path.display()
        )));
    }

    if !path.is_file() {
        return Err(ToolError::InvalidPath(format!(
            "Path is not a file: {}",
            path.display()
        )));
    }

    Ok(())
}
