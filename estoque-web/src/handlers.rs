pub mod health;
pub mod page;
pub mod query;
pub mod upload;

use crate::error::AppError;
use crate::models::{PageContext, Selection};
use crate::selector::{DatabaseMode, DatabaseSelector, SelectorError};
use crate::state::{AppState, INDEX_TEMPLATE};
use actix_web::http::StatusCode;
use actix_web::HttpResponse;

/// Resolve the database for the current mode. Problems the user can fix are
/// reported as a page warning; I/O failures become errors.
pub(crate) fn resolve_selection(
    selector: &DatabaseSelector,
    mode: DatabaseMode,
    database: Option<&str>,
    staged: Option<&str>,
) -> Result<Selection, AppError> {
    let mut selection = Selection::default();

    let resolved = match mode {
        DatabaseMode::Existing => {
            selection.databases = selector.list_local_databases()?;
            if selection.databases.is_empty() {
                Some(Err(SelectorError::NoDatabasesFound))
            } else {
                Some(selector.select_existing(database))
            }
        }
        DatabaseMode::Upload => staged
            .filter(|name| !name.is_empty())
            .map(|name| selector.open_staged(name)),
    };

    match resolved {
        Some(Ok(selected)) => selection.selected = Some(selected),
        Some(Err(SelectorError::Io(e))) => return Err(e.into()),
        Some(Err(e)) => {
            tracing::warn!(error = %e, ?mode, "Database not available");
            selection.warning = Some(e.to_string());
        }
        None => {}
    }

    Ok(selection)
}

pub(crate) fn render_page(
    state: &AppState,
    context: &PageContext,
    status: StatusCode,
) -> Result<HttpResponse, AppError> {
    let html = state.templates.render(INDEX_TEMPLATE, context)?;
    Ok(HttpResponse::build(status)
        .content_type("text/html; charset=utf-8")
        .body(html))
}
