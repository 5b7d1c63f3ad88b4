//! Authentication handlers.
//!
//! Auth endpoints wrap their outcome in a `{success, data, error, message}`
//! envelope in addition to the HTTP status code; the session token travels
//! only in the http-only `access_token` cookie.

use axum::{extract::State, http::StatusCode, Extension, Json};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::{NaiveDateTime, Utc};
use diesel::r2d2::{ConnectionManager, PooledConnection};
use diesel::PgConnection;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    auth::password::PasswordService,
    middleware::auth::{Identity, SESSION_COOKIE},
    models::{NewUser, User, UserChanges, UserRole, UserStatus},
    repositories::users::UserRepository,
    AppState,
};

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[validate(email(message = "Invalid email format"))]
    #[schema(example = "user@example.com")]
    pub email: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    #[schema(example = "securepassword123", min_length = 8)]
    pub password: String,
    #[schema(example = "John")]
    pub first_name: Option<String>,
    #[schema(example = "Doe")]
    pub last_name: Option<String>,
    #[schema(example = "+998901234567")]
    pub phone: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email format"))]
    #[schema(example = "user@example.com")]
    pub email: String,
    #[schema(example = "securepassword123")]
    pub password: String,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    #[schema(example = "John")]
    pub first_name: Option<String>,
    #[schema(example = "Doe")]
    pub last_name: Option<String>,
    #[schema(example = "+998901234567")]
    pub phone: Option<String>,
}

/// Outward-facing user representation; the password hash never appears here.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: Uuid,
    #[schema(example = "user@example.com")]
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub role: UserRole,
    pub status: UserStatus,
    pub email_verified: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            phone: user.phone,
            role: user.role,
            status: user.status,
            email_verified: user.email_verified,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AuthData {
    pub user: UserResponse,
}

/// Uniform auth envelope; callers check both the status code and `success`.
#[derive(Debug, Serialize, ToSchema)]
pub struct AuthEnvelope {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<AuthData>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(example = "Invalid credentials")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(example = "Login failed")]
    pub message: Option<String>,
}

impl AuthEnvelope {
    pub fn with_user(user: UserResponse, message: Option<&str>) -> Self {
        Self {
            success: true,
            data: Some(AuthData { user }),
            error: None,
            message: message.map(|m| m.to_string()),
        }
    }

    pub fn message_only(message: &str) -> Self {
        Self {
            success: true,
            data: None,
            error: None,
            message: Some(message.to_string()),
        }
    }

    pub fn failure(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
            message: Some(message.into()),
        }
    }
}

type AuthFailure = (StatusCode, Json<AuthEnvelope>);

fn envelope_err(
    status: StatusCode,
    error: impl Into<String>,
    message: impl Into<String>,
) -> AuthFailure {
    (status, Json(AuthEnvelope::failure(error, message)))
}

fn get_conn(
    state: &AppState,
) -> Result<PooledConnection<ConnectionManager<PgConnection>>, AuthFailure> {
    state.db_pool.get().map_err(|e| {
        error!(error = %e, "Database connection error");
        envelope_err(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Database connection error",
            "Request failed",
        )
    })
}

/// Builds the http-only session cookie whose max-age mirrors the token
/// lifetime.
pub fn session_cookie(token: String, max_age_secs: i64, secure: bool) -> Cookie<'static> {
    let mut cookie = Cookie::new(SESSION_COOKIE, token);
    cookie.set_http_only(true);
    cookie.set_same_site(SameSite::Lax);
    cookie.set_secure(secure);
    cookie.set_path("/");
    cookie.set_max_age(time::Duration::seconds(max_age_secs));
    cookie
}

#[utoipa::path(
    post,
    path = "/auth/register",
    tag = "Authentication",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered", body = AuthEnvelope),
        (status = 400, description = "Validation error", body = AuthEnvelope),
        (status = 409, description = "Email already registered", body = AuthEnvelope),
        (status = 500, description = "Internal server error", body = AuthEnvelope)
    )
)]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthEnvelope>), AuthFailure> {
    if let Err(e) = payload.validate() {
        return Err(envelope_err(
            StatusCode::BAD_REQUEST,
            format!("Validation error: {}", e),
            "Registration failed",
        ));
    }

    if let Err(e) = state.password_policy.validate(&payload.password) {
        return Err(envelope_err(
            StatusCode::BAD_REQUEST,
            e.to_string(),
            "Registration failed",
        ));
    }

    let password_hash =
        PasswordService::hash_password_with_cost(&payload.password, state.password_hash_cost)
            .map_err(|e| {
                error!(error = %e, "Password hashing failed");
                envelope_err(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to process password",
                    "Registration failed",
                )
            })?;

    let email = payload.email.to_lowercase();
    let mut conn = get_conn(&state)?;

    let existing = UserRepository::find_by_email(&mut conn, &email).map_err(|e| {
        error!(error = %e, "Database error looking up email");
        envelope_err(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Database error",
            "Registration failed",
        )
    })?;

    if existing.is_some() {
        return Err(envelope_err(
            StatusCode::CONFLICT,
            "User with this email already exists",
            "Registration failed",
        ));
    }

    let new_user = NewUser {
        email,
        password_hash,
        first_name: payload.first_name,
        last_name: payload.last_name,
        phone: payload.phone,
    };

    let user = UserRepository::insert(&mut conn, &new_user).map_err(|e| {
        // A concurrent registration can still hit the unique constraint.
        warn!(error = %e, email = %new_user.email, "Failed to register user");
        envelope_err(
            StatusCode::CONFLICT,
            "User with this email already exists",
            "Registration failed",
        )
    })?;

    info!(user_id = %user.id, email = %user.email, "User registered");

    Ok((
        StatusCode::CREATED,
        Json(AuthEnvelope::with_user(
            user.into(),
            Some("User registered successfully"),
        )),
    ))
}

#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "Authentication",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful, session cookie set", body = AuthEnvelope),
        (status = 400, description = "Validation error", body = AuthEnvelope),
        (status = 401, description = "Invalid credentials or inactive account", body = AuthEnvelope),
        (status = 500, description = "Internal server error", body = AuthEnvelope)
    )
)]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(payload): Json<LoginRequest>,
) -> Result<(CookieJar, Json<AuthEnvelope>), AuthFailure> {
    if let Err(e) = payload.validate() {
        return Err(envelope_err(
            StatusCode::BAD_REQUEST,
            format!("Validation error: {}", e),
            "Login failed",
        ));
    }

    let mut conn = get_conn(&state)?;

    // Unknown email and wrong password yield the same generic error so that
    // accounts cannot be enumerated.
    let user = UserRepository::find_by_email(&mut conn, &payload.email.to_lowercase())
        .map_err(|e| {
            error!(error = %e, "Database error during login");
            envelope_err(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Database error",
                "Login failed",
            )
        })?
        .ok_or_else(|| {
            warn!(email = %payload.email, "Login attempt for non-existent user");
            envelope_err(
                StatusCode::UNAUTHORIZED,
                "Invalid credentials",
                "Login failed",
            )
        })?;

    if user.status != UserStatus::Active {
        warn!(user_id = %user.id, status = %user.status, "Login attempt for inactive account");
        return Err(envelope_err(
            StatusCode::UNAUTHORIZED,
            "User account is not active",
            "Login failed",
        ));
    }

    let is_valid =
        PasswordService::verify_password(&payload.password, &user.password_hash).map_err(|e| {
            error!(error = %e, "Password verification error");
            envelope_err(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Password verification error",
                "Login failed",
            )
        })?;

    if !is_valid {
        warn!(user_id = %user.id, "Failed login attempt - invalid password");
        return Err(envelope_err(
            StatusCode::UNAUTHORIZED,
            "Invalid credentials",
            "Login failed",
        ));
    }

    let token = state
        .jwt_config
        .generate_access_token(user.id, &user.email, user.role)
        .map_err(|e| {
            error!(error = %e, "Token generation failed");
            envelope_err(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Token generation failed",
                "Login failed",
            )
        })?;

    let jar = jar.add(session_cookie(
        token,
        state.jwt_config.access_token_expiry,
        state.cookie_secure,
    ));

    info!(user_id = %user.id, email = %user.email, "User logged in");

    Ok((
        jar,
        Json(AuthEnvelope::with_user(
            user.into(),
            Some("Login successful"),
        )),
    ))
}

#[utoipa::path(
    post,
    path = "/auth/logout",
    tag = "Authentication",
    responses(
        (status = 200, description = "Session cookie cleared", body = AuthEnvelope),
        (status = 401, description = "Unauthorized", body = AuthEnvelope)
    ),
    security(("cookie_auth" = []))
)]
pub async fn logout(jar: CookieJar) -> (CookieJar, Json<AuthEnvelope>) {
    let jar = jar.remove(Cookie::build(SESSION_COOKIE).path("/"));
    info!("User logged out");
    (jar, Json(AuthEnvelope::message_only("Logout successful")))
}

#[utoipa::path(
    get,
    path = "/auth/me",
    tag = "Authentication",
    responses(
        (status = 200, description = "Current user", body = AuthEnvelope),
        (status = 401, description = "Unauthorized", body = AuthEnvelope),
        (status = 404, description = "User no longer exists", body = AuthEnvelope)
    ),
    security(("cookie_auth" = []))
)]
pub async fn get_current_user(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<AuthEnvelope>, AuthFailure> {
    let mut conn = get_conn(&state)?;

    let user = UserRepository::find_by_id(&mut conn, identity.user_id)
        .map_err(|e| {
            error!(error = %e, "Database error loading current user");
            envelope_err(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Database error",
                "Request failed",
            )
        })?
        .ok_or_else(|| {
            envelope_err(StatusCode::NOT_FOUND, "User not found", "Request failed")
        })?;

    Ok(Json(AuthEnvelope::with_user(user.into(), None)))
}

#[utoipa::path(
    patch,
    path = "/auth/profile",
    tag = "Authentication",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Profile updated", body = AuthEnvelope),
        (status = 401, description = "Unauthorized", body = AuthEnvelope),
        (status = 404, description = "User not found", body = AuthEnvelope),
        (status = 500, description = "Internal server error", body = AuthEnvelope)
    ),
    security(("cookie_auth" = []))
)]
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<Json<AuthEnvelope>, AuthFailure> {
    let mut conn = get_conn(&state)?;

    let changes = UserChanges {
        first_name: payload.first_name,
        last_name: payload.last_name,
        phone: payload.phone,
        updated_at: Utc::now().naive_utc(),
    };

    let user = UserRepository::update_profile(&mut conn, identity.user_id, &changes)
        .map_err(|e| {
            error!(error = %e, "Database error updating profile");
            envelope_err(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Database error",
                "Profile update failed",
            )
        })?
        .ok_or_else(|| {
            envelope_err(
                StatusCode::NOT_FOUND,
                "User not found",
                "Profile update failed",
            )
        })?;

    info!(user_id = %user.id, "Profile updated");

    Ok(Json(AuthEnvelope::with_user(
        user.into(),
        Some("Profile updated successfully"),
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_user() -> User {
        let now = Utc::now().naive_utc();
        User {
            id: Uuid::new_v4(),
            email: "user@example.com".to_string(),
            password_hash: "$argon2id$v=19$secret".to_string(),
            first_name: Some("John".to_string()),
            last_name: None,
            phone: None,
            role: UserRole::User,
            status: UserStatus::Active,
            email_verified: false,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_user_response_never_exposes_password_hash() {
        let response = UserResponse::from(test_user());
        let json = serde_json::to_string(&response).unwrap();
        assert!(!json.contains("password"));
        assert!(!json.contains("argon2"));
    }

    #[test]
    fn test_user_response_wire_format() {
        let response = UserResponse::from(test_user());
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["firstName"], "John");
        assert_eq!(json["role"], "USER");
        assert_eq!(json["status"], "ACTIVE");
        assert_eq!(json["emailVerified"], false);
    }

    #[test]
    fn test_envelope_success_shape() {
        let envelope = AuthEnvelope::with_user(test_user().into(), Some("Login successful"));
        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(json["success"], true);
        assert!(json["data"]["user"]["email"].is_string());
        assert!(json.get("error").is_none());
    }

    #[test]
    fn test_envelope_failure_shape() {
        let envelope = AuthEnvelope::failure("Invalid credentials", "Login failed");
        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["error"], "Invalid credentials");
        assert_eq!(json["message"], "Login failed");
        assert!(json.get("data").is_none());
    }

    #[test]
    fn test_session_cookie_attributes() {
        let cookie = session_cookie("token-value".to_string(), 900, false);
        assert_eq!(cookie.name(), SESSION_COOKIE);
        assert_eq!(cookie.value(), "token-value");
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        assert_eq!(cookie.secure(), Some(false));
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.max_age(), Some(time::Duration::seconds(900)));
    }

    #[test]
    fn test_session_cookie_secure_in_production() {
        let cookie = session_cookie("token-value".to_string(), 3600, true);
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.max_age(), Some(time::Duration::seconds(3600)));
    }
}
