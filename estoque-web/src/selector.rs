//! Resolves the database the agent will query: an existing `.db` file in the
//! working directory or an upload staged under the uploads directory.
//!
//! The uploads directory is shared by every session and not locked, so two
//! uploads with the same file name overwrite each other.

use crate::config::StorageConfig;
use estoque_tools::{SqlDatabase, ToolError};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

pub const READY_MESSAGE: &str = "✅ Banco de dados pronto para uso com o agente.";

#[derive(Debug, Error)]
pub enum SelectorError {
    #[error("Nenhum arquivo .db foi encontrado na pasta.")]
    NoDatabasesFound,

    #[error("Banco de dados não encontrado: {0}")]
    UnknownDatabase(String),

    #[error("Nome de arquivo inválido: {0}")]
    InvalidFileName(String),

    #[error("O arquivo precisa ter a extensão .db: {0}")]
    NotADatabaseFile(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Tool(#[from] ToolError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseMode {
    #[default]
    Existing,
    Upload,
}

/// A resolved database together with the banner announcing it
#[derive(Debug, Clone)]
pub struct SelectedDatabase {
    pub handle: SqlDatabase,
    pub name: String,
    pub banner: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StagedUpload {
    pub filename: String,
    pub path: String,
    pub size: usize,
}

#[derive(Debug, Clone)]
pub struct DatabaseSelector {
    working_dir: PathBuf,
    uploads_dir: PathBuf,
}

impl DatabaseSelector {
    pub fn new(storage: &StorageConfig) -> Self {
        Self {
            working_dir: storage.working_dir.clone(),
            uploads_dir: storage.uploads_path(),
        }
    }

    /// Regular files in the working directory whose name ends in `.db`, sorted
    pub fn list_local_databases(&self) -> Result<Vec<String>, SelectorError> {
        let mut names = Vec::new();
        for entry in std::fs::read_dir(&self.working_dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                if name.ends_with(".db") {
                    names.push(name.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }

    /// Open a listed database, or the first one when `name` is `None`
    pub fn select_existing(&self, name: Option<&str>) -> Result<SelectedDatabase, SelectorError> {
        let available = self.list_local_databases()?;

        let chosen = match name.filter(|n| !n.is_empty()) {
            Some(requested) => available
                .iter()
                .find(|candidate| candidate.as_str() == requested)
                .ok_or_else(|| SelectorError::UnknownDatabase(requested.to_string()))?,
            None => available.first().ok_or(SelectorError::NoDatabasesFound)?,
        };

        let handle = SqlDatabase::from_path(self.working_dir.join(chosen))?;
        tracing::info!(database = %chosen, uri = %handle.uri(), "Selected existing database");

        Ok(SelectedDatabase {
            handle,
            name: chosen.clone(),
            banner: format!("Banco de dados `{}` carregado com sucesso.", chosen),
        })
    }

    /// Write an uploaded file to the uploads directory, replacing any file of the same name
    pub async fn stage_upload(&self, filename: &str, bytes: &[u8]) -> Result<StagedUpload, SelectorError> {
        let name = sanitize_file_name(filename)?;

        tokio::fs::create_dir_all(&self.uploads_dir).await?;
        let path = self.uploads_dir.join(&name);
        tokio::fs::write(&path, bytes).await?;

        tracing::info!(filename = %name, path = %path.display(), size = bytes.len(), "Staged uploaded database");

        Ok(StagedUpload {
            filename: name,
            path: path.display().to_string(),
            size: bytes.len(),
        })
    }

    /// Open a previously staged upload
    pub fn open_staged(&self, filename: &str) -> Result<SelectedDatabase, SelectorError> {
        let name = sanitize_file_name(filename)?;
        let path = self.uploads_dir.join(&name);
        if !path.is_file() {
            return Err(SelectorError::UnknownDatabase(name));
        }

        let handle = SqlDatabase::from_path(&path)?;
        Ok(SelectedDatabase {
            handle,
            banner: format!("Arquivo `{}` carregado com sucesso.", name),
            name,
        })
    }
}

/// Reduce an uploaded name to its final path component and require a `.db` extension
pub fn sanitize_file_name(filename: &str) -> Result<String, SelectorError> {
    let name = filename
        .rsplit(|c: char| c == '/' || c == '\\')
        .next()
        .unwrap_or_default()
        .trim();

    if name.is_empty() || name == "." || name == ".." {
        return Err(SelectorError::InvalidFileName(filename.to_string()));
    }

    if !name.to_lowercase().ends_with(".db") {
        return Err(SelectorError::NotADatabaseFile(name.to_string()));
    }

    Ok(name.to_string())
}
