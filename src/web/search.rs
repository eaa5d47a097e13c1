use crate::db;
use crate::error::AppError;
use crate::forms::SearchQuery;
use crate::state::SharedState;
use crate::web::session::CurrentAccount;
use crate::web::surveys::SurveyCard;
use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/search", get(search_surveys))
        .with_state(state)
}

/// Case-insensitive substring match on survey titles; no pagination.
async fn search_surveys(
    CurrentAccount(_account): CurrentAccount,
    State(state): State<SharedState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<SurveyCard>>, AppError> {
    let surveys = db::search_surveys_by_title(&state.pool, &query.keyword).await?;
    Ok(Json(surveys.into_iter().map(SurveyCard::from).collect()))
}
