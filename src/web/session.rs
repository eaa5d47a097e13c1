use crate::db::{self, Account};
use crate::domain::models::AccountRole;
use crate::state::SharedState;
use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{request::Parts, HeaderMap, StatusCode},
};
use base64::{engine::general_purpose, Engine as _};
use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

const SESSION_TTL_HOURS: i64 = 24;

#[derive(Debug, Clone)]
pub struct SessionClaims {
    pub account_id: Uuid,
    pub role: AccountRole,
    pub exp: i64,
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("invalid token format")]
    Invalid,
    #[error("signature mismatch")]
    Signature,
    #[error("expired")]
    Expired,
    #[error("bad role")]
    Role,
}

pub fn sign_session(account_id: Uuid, role: AccountRole, key: &[u8]) -> Result<String, SessionError> {
    let exp = Utc::now() + Duration::hours(SESSION_TTL_HOURS);
    sign_with_expiry(account_id, role, exp.timestamp(), key)
}

fn sign_with_expiry(
    account_id: Uuid,
    role: AccountRole,
    exp: i64,
    key: &[u8],
) -> Result<String, SessionError> {
    let payload = format!("{}|{}|{}", account_id, role.as_str(), exp);
    let mut mac = HmacSha256::new_from_slice(key).map_err(|_| SessionError::Invalid)?;
    mac.update(payload.as_bytes());
    let sig = mac.finalize().into_bytes();
    Ok(format!(
        "{}.{}",
        general_purpose::STANDARD.encode(payload.as_bytes()),
        general_purpose::STANDARD.encode(sig)
    ))
}

pub fn verify_session(token: &str, key: &[u8]) -> Result<SessionClaims, SessionError> {
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 2 {
        return Err(SessionError::Invalid);
    }
    let payload_bytes = general_purpose::STANDARD
        .decode(parts[0])
        .map_err(|_| SessionError::Invalid)?;
    let sig_bytes = general_purpose::STANDARD
        .decode(parts[1])
        .map_err(|_| SessionError::Invalid)?;

    let mut mac = HmacSha256::new_from_slice(key).map_err(|_| SessionError::Invalid)?;
    mac.update(&payload_bytes);
    mac.verify_slice(&sig_bytes)
        .map_err(|_| SessionError::Signature)?;

    let payload = String::from_utf8(payload_bytes).map_err(|_| SessionError::Invalid)?;
    let pieces: Vec<&str> = payload.split('|').collect();
    if pieces.len() != 3 {
        return Err(SessionError::Invalid);
    }
    let account_id = Uuid::parse_str(pieces[0]).map_err(|_| SessionError::Invalid)?;
    let role = AccountRole::parse(pieces[1]).ok_or(SessionError::Role)?;
    let exp: i64 = pieces[2].parse().map_err(|_| SessionError::Invalid)?;
    if Utc::now().timestamp() > exp {
        return Err(SessionError::Expired);
    }
    Ok(SessionClaims {
        account_id,
        role,
        exp,
    })
}

pub fn extract_token(headers: &HeaderMap) -> Option<String> {
    if let Some(auth) = headers.get(axum::http::header::AUTHORIZATION) {
        if let Ok(val) = auth.to_str() {
            if let Some(bearer) = val.strip_prefix("Bearer ") {
                return Some(bearer.trim().to_string());
            }
        }
    }
    if let Some(cookie) = headers.get(axum::http::header::COOKIE) {
        if let Ok(val) = cookie.to_str() {
            for pair in val.split(';') {
                let trimmed = pair.trim();
                if let Some(rest) = trimmed.strip_prefix("session=") {
                    return Some(rest.to_string());
                }
            }
        }
    }
    None
}

pub fn session_cookie(token: &str) -> String {
    format!("session={token}; HttpOnly; SameSite=Lax; Path=/")
}

pub fn clear_session_cookie() -> String {
    "session=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0".to_string()
}

/// Resolve the acting account from request headers, if any valid session is
/// attached. Used by routes that behave differently for anonymous visitors.
pub async fn resolve_account(state: &SharedState, headers: &HeaderMap) -> Option<Account> {
    let token = extract_token(headers)?;
    let claims = verify_session(&token, &state.session_key).ok()?;
    db::find_account_by_id(&state.pool, claims.account_id)
        .await
        .ok()
        .flatten()
}

/// Extractor for authenticated routes: validates the session token and loads
/// the acting account, which handlers receive explicitly.
pub struct CurrentAccount(pub Account);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentAccount
where
    S: Send + Sync,
    SharedState: FromRef<S>,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let shared_state = SharedState::from_ref(state);

        let token = extract_token(&parts.headers).ok_or(StatusCode::UNAUTHORIZED)?;

        let claims = verify_session(&token, &shared_state.session_key).map_err(|e| {
            tracing::warn!("session verification failed: {e}");
            StatusCode::UNAUTHORIZED
        })?;

        let account = db::find_account_by_id(&shared_state.pool, claims.account_id)
            .await
            .map_err(|e| {
                tracing::error!("account lookup failed for session: {e}");
                StatusCode::INTERNAL_SERVER_ERROR
            })?
            .ok_or(StatusCode::UNAUTHORIZED)?;

        Ok(CurrentAccount(account))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &[u8] = b"test-secret-key";

    #[test]
    fn sign_verify_round_trip() {
        let id = Uuid::new_v4();
        let token = sign_session(id, AccountRole::Respondent, KEY).unwrap();
        let claims = verify_session(&token, KEY).unwrap();
        assert_eq!(claims.account_id, id);
        assert_eq!(claims.role, AccountRole::Respondent);
    }

    #[test]
    fn tampered_token_is_rejected() {
        let token = sign_session(Uuid::new_v4(), AccountRole::Admin, KEY).unwrap();
        let forged_payload =
            general_purpose::STANDARD.encode(format!("{}|admin|{}", Uuid::new_v4(), i64::MAX));
        let sig = token.split('.').nth(1).unwrap();
        let forged = format!("{forged_payload}.{sig}");
        assert!(matches!(
            verify_session(&forged, KEY),
            Err(SessionError::Signature)
        ));
    }

    #[test]
    fn wrong_key_is_rejected() {
        let token = sign_session(Uuid::new_v4(), AccountRole::Admin, KEY).unwrap();
        assert!(matches!(
            verify_session(&token, b"other-key"),
            Err(SessionError::Signature)
        ));
    }

    #[test]
    fn expired_token_is_rejected() {
        let exp = (Utc::now() - Duration::hours(1)).timestamp();
        let token = sign_with_expiry(Uuid::new_v4(), AccountRole::Respondent, exp, KEY).unwrap();
        assert!(matches!(
            verify_session(&token, KEY),
            Err(SessionError::Expired)
        ));
    }

    #[test]
    fn token_extraction_prefers_bearer_then_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(
            axum::http::header::COOKIE,
            "theme=dark; session=cookie-token".parse().unwrap(),
        );
        assert_eq!(extract_token(&headers), Some("cookie-token".to_string()));

        headers.insert(
            axum::http::header::AUTHORIZATION,
            "Bearer header-token".parse().unwrap(),
        );
        assert_eq!(extract_token(&headers), Some("header-token".to_string()));
    }
}
