use crate::credentials;
use crate::db;
use crate::domain::models::AccountRole;
use crate::error::AppError;
use crate::forms::{LoginForm, RegisterForm};
use crate::state::SharedState;
use crate::web::session::{self, CurrentAccount};
use axum::{
    extract::State,
    http::{header, HeaderMap},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Serialize;
use uuid::Uuid;

#[derive(Serialize)]
pub struct AuthView {
    pub account_id: Uuid,
    pub username: String,
    pub role: AccountRole,
    pub redirect: &'static str,
}

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/register", get(register_page).post(register))
        .route("/login", get(login_page).post(login))
        .route("/logout", get(logout))
        .with_state(state)
}

fn dashboard_path(role: AccountRole) -> &'static str {
    match role {
        AccountRole::Admin => "/admin/dashboard",
        AccountRole::Respondent => "/user/dashboard",
    }
}

fn session_headers(account_id: Uuid, role: AccountRole, key: &[u8]) -> Result<HeaderMap, AppError> {
    let token = session::sign_session(account_id, role, key)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("session signing failed: {e}")))?;
    let mut headers = HeaderMap::new();
    headers.insert(
        header::SET_COOKIE,
        session::session_cookie(&token)
            .parse()
            .map_err(|_| AppError::Internal(anyhow::anyhow!("invalid session cookie")))?,
    );
    Ok(headers)
}

async fn register_page() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "roles": ["admin", "respondent"] }))
}

async fn register(
    State(state): State<SharedState>,
    Json(form): Json<RegisterForm>,
) -> Result<impl IntoResponse, AppError> {
    let registration = form.validate()?;

    if db::find_account_by_email(&state.pool, &registration.email)
        .await?
        .is_some()
    {
        return Err(AppError::DuplicateEmail);
    }

    let hash = credentials::hash_password(&registration.password)?;
    let account = match db::insert_account(
        &state.pool,
        &registration.username,
        &registration.email,
        &hash,
        registration.role,
    )
    .await
    {
        Ok(account) => account,
        // The unique constraint is the authoritative guard; the pre-check
        // above only gives the friendly path.
        Err(e) if db::is_unique_violation(&e) => return Err(AppError::DuplicateEmail),
        Err(e) => return Err(e.into()),
    };

    tracing::info!("account {} registered as {}", account.id, account.role.as_str());

    let headers = session_headers(account.id, account.role, &state.session_key)?;
    let view = AuthView {
        account_id: account.id,
        username: account.username,
        role: account.role,
        redirect: dashboard_path(account.role),
    };
    Ok((headers, Json(view)))
}

async fn login_page() -> Json<serde_json::Value> {
    Json(serde_json::json!({}))
}

async fn login(
    State(state): State<SharedState>,
    Json(form): Json<LoginForm>,
) -> Result<impl IntoResponse, AppError> {
    let (email, password) = form.validate()?;

    let account = db::find_account_by_email(&state.pool, &email)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

    if !credentials::verify_password(&password, &account.password_hash) {
        tracing::warn!("failed login attempt for {email}");
        return Err(AppError::InvalidCredentials);
    }

    let headers = session_headers(account.id, account.role, &state.session_key)?;
    let view = AuthView {
        account_id: account.id,
        username: account.username,
        role: account.role,
        redirect: dashboard_path(account.role),
    };
    Ok((headers, Json(view)))
}

async fn logout(CurrentAccount(_account): CurrentAccount) -> impl IntoResponse {
    let mut headers = HeaderMap::new();
    if let Ok(value) = session::clear_session_cookie().parse() {
        headers.insert(header::SET_COOKIE, value);
    }
    (headers, Json(serde_json::json!({ "redirect": "/" })))
}
