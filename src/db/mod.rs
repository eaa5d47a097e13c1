pub mod seed;

use crate::domain::models::{AccountRole, AnswerValue, Question};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::{FromRow, PgConnection, PgPool};
use std::collections::BTreeMap;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Account {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: AccountRole,
    pub created_at: DateTime<Utc>,
}

impl Account {
    pub fn is_admin(&self) -> bool {
        self.role == AccountRole::Admin
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Survey {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub questions: Json<Vec<Question>>,
    pub end_date: DateTime<Utc>,
    pub is_active: bool,
    pub author_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl Survey {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.end_date
    }

    /// Open for submissions: active and not past its end date.
    pub fn is_open(&self, now: DateTime<Utc>) -> bool {
        self.is_active && !self.is_expired(now)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SurveyResponse {
    pub id: Uuid,
    pub survey_id: Uuid,
    pub account_id: Uuid,
    pub answers: Json<BTreeMap<String, AnswerValue>>,
    pub submitted_at: DateTime<Utc>,
}

/// Unique-constraint conflicts are surfaced as domain errors by the handlers
/// (duplicate email on registration, duplicate response on submission).
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

// ========== Accounts ==========

const ACCOUNT_COLUMNS: &str = "id, username, email, password_hash, role, created_at";

pub async fn insert_account(
    pool: &PgPool,
    username: &str,
    email: &str,
    password_hash: &str,
    role: AccountRole,
) -> Result<Account, sqlx::Error> {
    sqlx::query_as::<_, Account>(
        r#"
        INSERT INTO accounts (id, username, email, password_hash, role)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id, username, email, password_hash, role, created_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(username)
    .bind(email)
    .bind(password_hash)
    .bind(role)
    .fetch_one(pool)
    .await
}

pub async fn find_account_by_email(
    pool: &PgPool,
    email: &str,
) -> Result<Option<Account>, sqlx::Error> {
    sqlx::query_as::<_, Account>(&format!(
        "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE email = $1"
    ))
    .bind(email)
    .fetch_optional(pool)
    .await
}

pub async fn find_account_by_id(
    pool: &PgPool,
    id: Uuid,
) -> Result<Option<Account>, sqlx::Error> {
    sqlx::query_as::<_, Account>(&format!(
        "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub async fn list_accounts(pool: &PgPool) -> Result<Vec<Account>, sqlx::Error> {
    sqlx::query_as::<_, Account>(&format!(
        "SELECT {ACCOUNT_COLUMNS} FROM accounts ORDER BY created_at ASC"
    ))
    .fetch_all(pool)
    .await
}

/// Overwrite the email and, when supplied, the credential hash.
pub async fn update_account_profile(
    pool: &PgPool,
    id: Uuid,
    email: &str,
    password_hash: Option<&str>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE accounts
        SET email = $2,
            password_hash = COALESCE($3, password_hash)
        WHERE id = $1
        "#,
    )
    .bind(id)
    .bind(email)
    .bind(password_hash)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn count_surveys_by_author(pool: &PgPool, author_id: Uuid) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM surveys WHERE author_id = $1")
        .bind(author_id)
        .fetch_one(pool)
        .await
}

pub async fn count_responses_by_account(
    pool: &PgPool,
    account_id: Uuid,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM responses WHERE account_id = $1")
        .bind(account_id)
        .fetch_one(pool)
        .await
}

// ========== Surveys ==========

const SURVEY_COLUMNS: &str =
    "id, title, description, questions, end_date, is_active, author_id, created_at";

pub async fn insert_survey(
    pool: &PgPool,
    author_id: Uuid,
    title: &str,
    description: &str,
    questions: &[Question],
    end_date: DateTime<Utc>,
) -> Result<Survey, sqlx::Error> {
    sqlx::query_as::<_, Survey>(
        r#"
        INSERT INTO surveys (id, title, description, questions, end_date, is_active, author_id)
        VALUES ($1, $2, $3, $4, $5, TRUE, $6)
        RETURNING id, title, description, questions, end_date, is_active, author_id, created_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(title)
    .bind(description)
    .bind(Json(questions))
    .bind(end_date)
    .bind(author_id)
    .fetch_one(pool)
    .await
}

pub async fn update_survey(
    pool: &PgPool,
    id: Uuid,
    title: &str,
    description: &str,
    questions: &[Question],
    end_date: DateTime<Utc>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE surveys
        SET title = $2,
            description = $3,
            questions = $4,
            end_date = $5
        WHERE id = $1
        "#,
    )
    .bind(id)
    .bind(title)
    .bind(description)
    .bind(Json(questions))
    .bind(end_date)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn find_survey_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Survey>, sqlx::Error> {
    sqlx::query_as::<_, Survey>(&format!(
        "SELECT {SURVEY_COLUMNS} FROM surveys WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub async fn list_all_surveys(pool: &PgPool) -> Result<Vec<Survey>, sqlx::Error> {
    sqlx::query_as::<_, Survey>(&format!(
        "SELECT {SURVEY_COLUMNS} FROM surveys ORDER BY created_at DESC"
    ))
    .fetch_all(pool)
    .await
}

pub async fn list_surveys_by_author(
    pool: &PgPool,
    author_id: Uuid,
) -> Result<Vec<Survey>, sqlx::Error> {
    sqlx::query_as::<_, Survey>(&format!(
        "SELECT {SURVEY_COLUMNS} FROM surveys WHERE author_id = $1 ORDER BY created_at DESC"
    ))
    .bind(author_id)
    .fetch_all(pool)
    .await
}

/// Surveys the account can still take: active, unexpired, not self-authored.
pub async fn list_available_surveys(
    pool: &PgPool,
    account_id: Uuid,
    now: DateTime<Utc>,
) -> Result<Vec<Survey>, sqlx::Error> {
    sqlx::query_as::<_, Survey>(&format!(
        r#"
        SELECT {SURVEY_COLUMNS}
        FROM surveys
        WHERE is_active = TRUE
          AND end_date > $2
          AND author_id != $1
        ORDER BY created_at DESC
        "#
    ))
    .bind(account_id)
    .bind(now)
    .fetch_all(pool)
    .await
}

pub async fn search_surveys_by_title(
    pool: &PgPool,
    keyword: &str,
) -> Result<Vec<Survey>, sqlx::Error> {
    sqlx::query_as::<_, Survey>(&format!(
        "SELECT {SURVEY_COLUMNS} FROM surveys WHERE title ILIKE $1 ORDER BY created_at DESC"
    ))
    .bind(format!("%{keyword}%"))
    .fetch_all(pool)
    .await
}

/// Remove a survey and its responses. Responses go first; the caller owns the
/// transaction so the pair commits or rolls back together.
pub async fn delete_survey_with_responses(
    conn: &mut PgConnection,
    survey_id: Uuid,
) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM responses WHERE survey_id = $1")
        .bind(survey_id)
        .execute(&mut *conn)
        .await?;
    sqlx::query("DELETE FROM surveys WHERE id = $1")
        .bind(survey_id)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

// ========== Responses ==========

pub async fn insert_response(
    pool: &PgPool,
    survey_id: Uuid,
    account_id: Uuid,
    answers: &BTreeMap<String, AnswerValue>,
) -> Result<SurveyResponse, sqlx::Error> {
    sqlx::query_as::<_, SurveyResponse>(
        r#"
        INSERT INTO responses (id, survey_id, account_id, answers)
        VALUES ($1, $2, $3, $4)
        RETURNING id, survey_id, account_id, answers, submitted_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(survey_id)
    .bind(account_id)
    .bind(Json(answers))
    .fetch_one(pool)
    .await
}

pub async fn response_exists(
    pool: &PgPool,
    survey_id: Uuid,
    account_id: Uuid,
) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM responses WHERE survey_id = $1 AND account_id = $2)",
    )
    .bind(survey_id)
    .bind(account_id)
    .fetch_one(pool)
    .await
}

pub async fn list_responses_for_survey(
    pool: &PgPool,
    survey_id: Uuid,
) -> Result<Vec<SurveyResponse>, sqlx::Error> {
    sqlx::query_as::<_, SurveyResponse>(
        r#"
        SELECT id, survey_id, account_id, answers, submitted_at
        FROM responses
        WHERE survey_id = $1
        ORDER BY submitted_at ASC
        "#,
    )
    .bind(survey_id)
    .fetch_all(pool)
    .await
}

pub async fn list_responses_by_account(
    pool: &PgPool,
    account_id: Uuid,
) -> Result<Vec<SurveyResponse>, sqlx::Error> {
    sqlx::query_as::<_, SurveyResponse>(
        r#"
        SELECT id, survey_id, account_id, answers, submitted_at
        FROM responses
        WHERE account_id = $1
        ORDER BY submitted_at DESC
        "#,
    )
    .bind(account_id)
    .fetch_all(pool)
    .await
}
