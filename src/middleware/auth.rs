//! Authentication middleware.
//!
//! Resolves the session token (cookie or bearer header), verifies it, and
//! confirms the account still exists and is active before attaching a typed
//! [`Identity`] to the request. This is the single gate that blocks
//! suspended and unverified accounts from every authorized operation.

use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::extract::cookie::CookieJar;
use serde_json::json;
use uuid::Uuid;

use crate::{
    error::get_db_conn,
    models::{UserRole, UserStatus},
    repositories::users::UserRepository,
    AppState,
};

/// Name of the http-only session cookie.
pub const SESSION_COOKIE: &str = "access_token";

/// Request-scoped identity of the authenticated caller, passed explicitly to
/// authorization checks instead of living in any process-wide state.
#[derive(Debug, Clone)]
pub struct Identity {
    pub user_id: Uuid,
    pub email: String,
    pub role: UserRole,
}

pub async fn auth_middleware(
    State(state): State<AppState>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Result<Response, Response> {
    let token = token_from_request(&jar, &req)
        .ok_or_else(|| unauthorized("Missing session token", "MISSING_TOKEN"))?;

    let claims = state
        .jwt_config
        .verify_access_token(&token)
        .map_err(|_| unauthorized("Invalid or expired token", "INVALID_TOKEN"))?;

    let user_id = Uuid::parse_str(&claims.sub)
        .map_err(|_| unauthorized("Invalid token subject", "INVALID_TOKEN"))?;

    let mut conn = get_db_conn(&state.db_pool).map_err(|e| e.into_response())?;

    let user = UserRepository::find_by_id(&mut conn, user_id)
        .map_err(|_| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": "Database error", "code": "DB_ERROR"})),
            )
                .into_response()
        })?
        .ok_or_else(|| unauthorized("User no longer exists", "USER_NOT_FOUND"))?;

    if user.status != UserStatus::Active {
        return Err(unauthorized(
            "User account is not active",
            "ACCOUNT_NOT_ACTIVE",
        ));
    }

    req.extensions_mut().insert(Identity {
        user_id: user.id,
        email: user.email,
        role: user.role,
    });

    Ok(next.run(req).await)
}

fn token_from_request(jar: &CookieJar, req: &Request) -> Option<String> {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        return Some(cookie.value().to_string());
    }

    req.headers()
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(|token| token.to_string())
}

fn unauthorized(error: &str, code: &str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({"error": error, "code": code})),
    )
        .into_response()
}
