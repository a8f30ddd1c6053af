use super::{render_page, resolve_selection};
use crate::error::AppError;
use crate::markdown::render_markdown;
use crate::models::{parse_model, PageContext, QueryForm, EMPTY_QUESTION_WARNING};
use crate::state::AppState;
use actix_web::http::StatusCode;
use actix_web::{post, web, HttpResponse};
use tracing::{error, info};

#[post("/query")]
pub async fn submit_query(
    form: web::Form<QueryForm>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let form = form.into_inner();
    let model = parse_model(form.model.as_deref());

    let selection = resolve_selection(
        &state.selector,
        form.mode,
        form.database.as_deref(),
        form.staged.as_deref(),
    )?;

    let mut context = PageContext::new(form.mode, model, &selection);
    context.question = form.question.clone();

    let Some(selected) = selection.selected else {
        return render_page(&state, &context, StatusCode::OK);
    };

    if form.question.trim().is_empty() {
        context.warning = Some(EMPTY_QUESTION_WARNING.to_string());
        return render_page(&state, &context, StatusCode::OK);
    }

    info!(
        database = %selected.name,
        model = model.id(),
        question = %form.question,
        "Answering inventory question"
    );

    match state
        .gateway
        .answer(&selected.handle, model, &form.question)
        .await
    {
        Ok(outcome) => {
            context.answer_html = Some(render_markdown(&outcome.output));
            context.stopped_early = outcome.stopped_early;
            render_page(&state, &context, StatusCode::OK)
        }
        Err(e) => {
            error!(error = %e, database = %selected.name, "Failed to answer question");
            context.error = Some(e.to_string());
            let status =
                StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            render_page(&state, &context, status)
        }
    }
}
