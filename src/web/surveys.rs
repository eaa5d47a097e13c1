use crate::db::{self, Account, Survey};
use crate::domain::models::Question;
use crate::domain::results::{aggregate, QuestionTally};
use crate::error::AppError;
use crate::forms::{self, EditSurveyForm, SurveyForm, TakeSurveyForm};
use crate::state::SharedState;
use crate::web::session::CurrentAccount;
use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Survey summary for dashboards, search results, and listings.
#[derive(Serialize)]
pub struct SurveyCard {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub question_count: usize,
    pub end_date: DateTime<Utc>,
    pub is_active: bool,
    pub author_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl From<Survey> for SurveyCard {
    fn from(survey: Survey) -> SurveyCard {
        SurveyCard {
            id: survey.id,
            title: survey.title,
            description: survey.description,
            question_count: survey.questions.0.len(),
            end_date: survey.end_date,
            is_active: survey.is_active,
            author_id: survey.author_id,
            created_at: survey.created_at,
        }
    }
}

#[derive(Serialize)]
pub struct SurveyDetail {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub questions: Vec<Question>,
    pub end_date: DateTime<Utc>,
    pub is_active: bool,
    pub author_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl From<Survey> for SurveyDetail {
    fn from(survey: Survey) -> SurveyDetail {
        SurveyDetail {
            id: survey.id,
            title: survey.title,
            description: survey.description,
            questions: survey.questions.0,
            end_date: survey.end_date,
            is_active: survey.is_active,
            author_id: survey.author_id,
            created_at: survey.created_at,
        }
    }
}

#[derive(Serialize)]
pub struct SurveyResultsView {
    pub survey: SurveyDetail,
    pub results: Vec<QuestionTally>,
    pub response_count: usize,
}

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/new", get(new_survey_page).post(create_survey))
        .route("/:id", get(view_survey))
        .route("/:id/edit", get(edit_survey_page).post(edit_survey))
        .route("/:id/delete", get(delete_survey))
        .route("/:id/take", get(take_survey_page).post(take_survey))
        .route("/:id/results", get(view_results))
        .route("/:id/analytics", get(view_analytics))
        .with_state(state)
}

async fn load_survey(state: &SharedState, id: Uuid) -> Result<Survey, AppError> {
    db::find_survey_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::NotFound)
}

fn ensure_owner_or_admin(account: &Account, survey: &Survey) -> Result<(), AppError> {
    if survey.author_id != account.id && !account.is_admin() {
        return Err(AppError::Forbidden);
    }
    Ok(())
}

// ========== Authoring ==========

async fn new_survey_page(CurrentAccount(_account): CurrentAccount) -> Json<serde_json::Value> {
    Json(serde_json::json!({ "question_types": ["text", "rating", "choice"] }))
}

async fn create_survey(
    CurrentAccount(account): CurrentAccount,
    State(state): State<SharedState>,
    Json(form): Json<SurveyForm>,
) -> Result<Json<SurveyDetail>, AppError> {
    let draft = form.validate(Utc::now())?;

    let survey = db::insert_survey(
        &state.pool,
        account.id,
        &draft.title,
        &draft.description,
        &draft.questions,
        draft.end_date,
    )
    .await?;

    tracing::info!("survey {} created by {}", survey.id, account.id);
    Ok(Json(survey.into()))
}

async fn edit_survey_page(
    CurrentAccount(account): CurrentAccount,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SurveyDetail>, AppError> {
    let survey = load_survey(&state, id).await?;
    ensure_owner_or_admin(&account, &survey)?;
    Ok(Json(survey.into()))
}

async fn edit_survey(
    CurrentAccount(account): CurrentAccount,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(form): Json<EditSurveyForm>,
) -> Result<Json<SurveyDetail>, AppError> {
    let survey = load_survey(&state, id).await?;
    ensure_owner_or_admin(&account, &survey)?;

    let draft = form.validate(Utc::now())?;
    db::update_survey(
        &state.pool,
        survey.id,
        &draft.title,
        &draft.description,
        &draft.questions,
        draft.end_date,
    )
    .await?;

    let updated = load_survey(&state, id).await?;
    Ok(Json(updated.into()))
}

async fn delete_survey(
    CurrentAccount(account): CurrentAccount,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    let survey = load_survey(&state, id).await?;
    ensure_owner_or_admin(&account, &survey)?;

    let mut tx = state.pool.begin().await?;
    db::delete_survey_with_responses(&mut tx, survey.id).await?;
    tx.commit().await?;

    tracing::info!("survey {} deleted by {}", survey.id, account.id);
    Ok(Json(serde_json::json!({ "redirect": "/" })))
}

// ========== Participation ==========

async fn check_can_take(
    state: &SharedState,
    account: &Account,
    survey: &Survey,
) -> Result<(), AppError> {
    if !survey.is_open(Utc::now()) {
        return Err(AppError::Unavailable);
    }
    if db::response_exists(&state.pool, survey.id, account.id).await? {
        return Err(AppError::AlreadyResponded);
    }
    Ok(())
}

async fn take_survey_page(
    CurrentAccount(account): CurrentAccount,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SurveyDetail>, AppError> {
    let survey = load_survey(&state, id).await?;
    check_can_take(&state, &account, &survey).await?;
    Ok(Json(survey.into()))
}

async fn take_survey(
    CurrentAccount(account): CurrentAccount,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(form): Json<TakeSurveyForm>,
) -> Result<Json<serde_json::Value>, AppError> {
    let survey = load_survey(&state, id).await?;
    check_can_take(&state, &account, &survey).await?;

    let answers = forms::extract_answers(&survey.questions.0, &form.answers)?;

    // The (survey_id, account_id) unique constraint closes the race between
    // the pre-check above and this insert.
    match db::insert_response(&state.pool, survey.id, account.id, &answers).await {
        Ok(_) => {}
        Err(e) if db::is_unique_violation(&e) => return Err(AppError::AlreadyResponded),
        Err(e) => return Err(e.into()),
    }

    tracing::info!("response recorded for survey {} by {}", survey.id, account.id);
    Ok(Json(serde_json::json!({
        "redirect": format!("/survey/{}/results", survey.id)
    })))
}

// ========== Results & analytics ==========

async fn view_survey(
    CurrentAccount(_account): CurrentAccount,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SurveyResultsView>, AppError> {
    let survey = load_survey(&state, id).await?;
    let responses = db::list_responses_for_survey(&state.pool, survey.id).await?;

    let answer_sets: Vec<_> = responses.iter().map(|r| r.answers.0.clone()).collect();
    let results = aggregate(&survey.questions.0, &answer_sets);

    Ok(Json(SurveyResultsView {
        survey: survey.into(),
        results,
        response_count: responses.len(),
    }))
}

async fn view_results(
    CurrentAccount(account): CurrentAccount,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    let survey = load_survey(&state, id).await?;
    ensure_owner_or_admin(&account, &survey)?;

    let responses = db::list_responses_for_survey(&state.pool, survey.id).await?;
    Ok(Json(serde_json::json!({
        "survey": SurveyDetail::from(survey),
        "responses": responses,
    })))
}

async fn view_analytics(
    CurrentAccount(account): CurrentAccount,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SurveyResultsView>, AppError> {
    let survey = load_survey(&state, id).await?;
    ensure_owner_or_admin(&account, &survey)?;

    let responses = db::list_responses_for_survey(&state.pool, survey.id).await?;
    let answer_sets: Vec<_> = responses.iter().map(|r| r.answers.0.clone()).collect();
    let results = aggregate(&survey.questions.0, &answer_sets);

    Ok(Json(SurveyResultsView {
        survey: survey.into(),
        results,
        response_count: responses.len(),
    }))
}
