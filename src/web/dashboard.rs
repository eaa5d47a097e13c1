use crate::db::{self, Account, SurveyResponse};
use crate::domain::models::AccountRole;
use crate::error::AppError;
use crate::state::SharedState;
use crate::web::session::{self, CurrentAccount};
use crate::web::surveys::SurveyCard;
use axum::{
    extract::State,
    http::HeaderMap,
    response::{IntoResponse, Redirect, Response},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Account view stripped of the credential hash.
#[derive(Serialize)]
pub struct AccountView {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub role: AccountRole,
    pub created_at: DateTime<Utc>,
}

impl From<Account> for AccountView {
    fn from(account: Account) -> AccountView {
        AccountView {
            id: account.id,
            username: account.username,
            email: account.email,
            role: account.role,
            created_at: account.created_at,
        }
    }
}

#[derive(Serialize)]
pub struct AdminOverview {
    pub surveys: Vec<SurveyCard>,
    pub accounts: Vec<AccountView>,
}

#[derive(Serialize)]
pub struct AdminDashboard {
    pub my_surveys: Vec<SurveyCard>,
    pub all_surveys: Vec<SurveyCard>,
    pub accounts: Vec<AccountView>,
}

#[derive(Serialize)]
pub struct UserDashboard {
    pub my_surveys: Vec<SurveyCard>,
    pub available_surveys: Vec<SurveyCard>,
    pub my_responses: Vec<SurveyResponse>,
}

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/", get(landing))
        .route("/admin", get(admin_overview))
        .route("/admin/dashboard", get(admin_dashboard))
        .route("/user/dashboard", get(user_dashboard))
        .with_state(state)
}

/// Role-based landing: authenticated visitors go to their dashboard,
/// everyone else gets the public landing view-model.
async fn landing(State(state): State<SharedState>, headers: HeaderMap) -> Response {
    match session::resolve_account(&state, &headers).await {
        Some(account) if account.is_admin() => Redirect::to("/admin/dashboard").into_response(),
        Some(_) => Redirect::to("/user/dashboard").into_response(),
        None => Json(serde_json::json!({ "page": "landing" })).into_response(),
    }
}

async fn admin_overview(
    CurrentAccount(account): CurrentAccount,
    State(state): State<SharedState>,
) -> Result<Json<AdminOverview>, AppError> {
    if !account.is_admin() {
        return Err(AppError::Forbidden);
    }

    let surveys = db::list_all_surveys(&state.pool).await?;
    let accounts = db::list_accounts(&state.pool).await?;

    Ok(Json(AdminOverview {
        surveys: surveys.into_iter().map(SurveyCard::from).collect(),
        accounts: accounts.into_iter().map(AccountView::from).collect(),
    }))
}

async fn admin_dashboard(
    CurrentAccount(account): CurrentAccount,
    State(state): State<SharedState>,
) -> Result<Json<AdminDashboard>, AppError> {
    if !account.is_admin() {
        return Err(AppError::Forbidden);
    }

    let my_surveys = db::list_surveys_by_author(&state.pool, account.id).await?;
    let all_surveys = db::list_all_surveys(&state.pool).await?;
    let accounts = db::list_accounts(&state.pool).await?;

    Ok(Json(AdminDashboard {
        my_surveys: my_surveys.into_iter().map(SurveyCard::from).collect(),
        all_surveys: all_surveys.into_iter().map(SurveyCard::from).collect(),
        accounts: accounts.into_iter().map(AccountView::from).collect(),
    }))
}

async fn user_dashboard(
    CurrentAccount(account): CurrentAccount,
    State(state): State<SharedState>,
) -> Result<Response, AppError> {
    if account.is_admin() {
        return Ok(Redirect::to("/admin/dashboard").into_response());
    }

    let my_surveys = db::list_surveys_by_author(&state.pool, account.id).await?;
    let available_surveys =
        db::list_available_surveys(&state.pool, account.id, Utc::now()).await?;
    let my_responses = db::list_responses_by_account(&state.pool, account.id).await?;

    Ok(Json(UserDashboard {
        my_surveys: my_surveys.into_iter().map(SurveyCard::from).collect(),
        available_surveys: available_surveys.into_iter().map(SurveyCard::from).collect(),
        my_responses,
    })
    .into_response())
}
