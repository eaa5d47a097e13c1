use crate::credentials;
use crate::db;
use crate::error::AppError;
use crate::forms::ProfileForm;
use crate::state::SharedState;
use crate::web::session::CurrentAccount;
use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

#[derive(Serialize)]
pub struct ProfileView {
    pub username: String,
    pub email: String,
    pub surveys_created: i64,
    pub surveys_participated: i64,
}

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/profile", get(view_profile).post(update_profile))
        .with_state(state)
}

async fn profile_view(
    state: &SharedState,
    account: &db::Account,
) -> Result<ProfileView, AppError> {
    let surveys_created = db::count_surveys_by_author(&state.pool, account.id).await?;
    let surveys_participated = db::count_responses_by_account(&state.pool, account.id).await?;
    Ok(ProfileView {
        username: account.username.clone(),
        email: account.email.clone(),
        surveys_created,
        surveys_participated,
    })
}

async fn view_profile(
    CurrentAccount(account): CurrentAccount,
    State(state): State<SharedState>,
) -> Result<Json<ProfileView>, AppError> {
    Ok(Json(profile_view(&state, &account).await?))
}

async fn update_profile(
    CurrentAccount(account): CurrentAccount,
    State(state): State<SharedState>,
    Json(form): Json<ProfileForm>,
) -> Result<Json<ProfileView>, AppError> {
    let update = form.validate()?;

    if !credentials::verify_password(&update.current_password, &account.password_hash) {
        return Err(AppError::InvalidCredentials);
    }

    let new_hash = match &update.new_password {
        Some(password) => Some(credentials::hash_password(password)?),
        None => None,
    };

    db::update_account_profile(&state.pool, account.id, &update.email, new_hash.as_deref())
        .await?;

    let refreshed = db::find_account_by_id(&state.pool, account.id)
        .await?
        .ok_or(AppError::NotFound)?;

    tracing::info!("profile updated for account {}", account.id);
    Ok(Json(profile_view(&state, &refreshed).await?))
}
