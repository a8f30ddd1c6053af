use super::{render_page, resolve_selection};
use crate::error::AppError;
use crate::models::{parse_model, PageContext, PageQuery};
use crate::state::AppState;
use actix_web::http::StatusCode;
use actix_web::{get, web, HttpResponse};

#[get("/")]
pub async fn index(
    query: web::Query<PageQuery>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let query = query.into_inner();
    let model = parse_model(query.model.as_deref());

    let selection = resolve_selection(
        &state.selector,
        query.mode,
        query.database.as_deref(),
        query.staged.as_deref(),
    )?;

    let context = PageContext::new(query.mode, model, &selection);
    render_page(&state, &context, StatusCode::OK)
}
