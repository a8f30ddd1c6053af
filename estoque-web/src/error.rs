use crate::selector::SelectorError;
use actix_web::{HttpResponse, ResponseError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Render error: {0}")]
    Render(#[from] handlebars::RenderError),
}

#[derive(Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        let error_response = ErrorResponse {
            error: self.error_type(),
            message: self.to_string(),
        };

        match self {
            AppError::NotFound(_) => HttpResponse::NotFound().json(error_response),
            AppError::InvalidRequest(_) => HttpResponse::BadRequest().json(error_response),
            AppError::Io(_) | AppError::Render(_) => {
                HttpResponse::InternalServerError().json(error_response)
            }
        }
    }
}

impl AppError {
    fn error_type(&self) -> String {
        match self {
            AppError::Io(_) => "io_error".to_string(),
            AppError::NotFound(_) => "not_found".to_string(),
            AppError::InvalidRequest(_) => "invalid_request".to_string(),
            AppError::Render(_) => "template_error".to_string(),
        }
    }
}

impl From<SelectorError> for AppError {
    fn from(error: SelectorError) -> Self {
        match error {
            SelectorError::Io(e) => AppError::Io(e),
            SelectorError::NoDatabasesFound | SelectorError::UnknownDatabase(_) => {
                AppError::NotFound(error.to_string())
            }
            SelectorError::InvalidFileName(_)
            | SelectorError::NotADatabaseFile(_)
            | SelectorError::Tool(_) => AppError::InvalidRequest(error.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;

    #[test]
    fn test_selector_errors_map_to_status() {
        let bad_name = AppError::from(SelectorError::NotADatabaseFile("shop.csv".to_string()));
        assert_eq!(bad_name.error_response().status(), StatusCode::BAD_REQUEST);

        let io = AppError::from(SelectorError::Io(std::io::Error::other("disk full")));
        assert_eq!(io.error_response().status(), StatusCode::INTERNAL_SERVER_ERROR);

        let missing = AppError::from(SelectorError::UnknownDatabase("x.db".to_string()));
        assert_eq!(missing.error_response().status(), StatusCode::NOT_FOUND);
    }
}
