//! Per-route authorization checks.
//!
//! Handlers call these explicitly with the request's [`Identity`]; there is
//! no implicit guard layer beyond the authentication middleware.

use axum::{http::StatusCode, Json};
use diesel::PgConnection;

use crate::error::ApiError;
use crate::middleware::auth::Identity;
use crate::models::UserRole;
use crate::repositories::listings::ListingRepository;

/// Allows the request only when the identity's role is in the permitted set.
pub fn require_role(
    identity: &Identity,
    allowed: &[UserRole],
) -> Result<(), (StatusCode, Json<ApiError>)> {
    if allowed.contains(&identity.role) {
        Ok(())
    } else {
        let roles = allowed
            .iter()
            .map(|r| r.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        Err(ApiError::forbidden(
            format!("User does not have required role. Required: {}", roles),
            "ROLE_REQUIRED",
        ))
    }
}

/// Allows admins unconditionally; otherwise the listing must exist and be
/// owned by the caller.
pub fn ensure_listing_owner(
    conn: &mut PgConnection,
    listing_id: uuid::Uuid,
    identity: &Identity,
) -> Result<(), (StatusCode, Json<ApiError>)> {
    if identity.role == UserRole::Admin {
        return Ok(());
    }

    let owner_id = ListingRepository::owner_of(conn, listing_id)
        .map_err(|_| ApiError::db_error())?
        .ok_or_else(|| ApiError::not_found("Listing not found", "LISTING_NOT_FOUND"))?;

    if owner_id != identity.user_id {
        return Err(ApiError::forbidden(
            "You do not have permission to modify this listing",
            "NOT_LISTING_OWNER",
        ));
    }

    Ok(())
}
