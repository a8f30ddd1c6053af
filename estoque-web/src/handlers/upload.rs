use crate::error::AppError;
use crate::models::UploadQuery;
use crate::state::AppState;
use actix_web::{post, web, HttpResponse};
use tracing::info;

/// Stage the raw request body as `temp_uploads/<filename>`
#[post("/upload")]
pub async fn upload_database(
    query: web::Query<UploadQuery>,
    body: web::Bytes,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    info!(filename = %query.filename, size = body.len(), "Receiving database upload");

    if body.is_empty() {
        return Err(AppError::InvalidRequest("Uploaded file is empty".to_string()));
    }

    let staged = state.selector.stage_upload(&query.filename, &body).await?;
    Ok(HttpResponse::Ok().json(staged))
}
