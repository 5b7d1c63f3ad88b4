//! Favorites handlers.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Serialize;
use tracing::{error, info};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    error::{get_db_conn, ApiError, ApiResult},
    handlers::listings::{into_detail, ListingDetail},
    middleware::auth::Identity,
    models::Favorite,
    pagination::{PaginationMeta, PaginationParams},
    repositories::{favorites::FavoriteRepository, listings::ListingRepository},
    AppState,
};

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteItem {
    pub id: Uuid,
    pub created_at: chrono::NaiveDateTime,
    pub listing: ListingDetail,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct FavoritesPage {
    pub data: Vec<FavoriteItem>,
    pub pagination: PaginationMeta,
}

#[utoipa::path(
    post,
    path = "/listings/{id}/favorites",
    tag = "Favorites",
    params(("id" = Uuid, Path, description = "Listing ID")),
    responses(
        (status = 201, description = "Listing added to favorites", body = Favorite),
        (status = 401, description = "Unauthorized", body = crate::error::ApiError),
        (status = 404, description = "Listing not found", body = crate::error::ApiError),
        (status = 409, description = "Already in favorites", body = crate::error::ApiError),
        (status = 500, description = "Internal server error", body = crate::error::ApiError)
    ),
    security(("cookie_auth" = []))
)]
pub async fn add_favorite(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(listing_id): Path<Uuid>,
) -> ApiResult<(StatusCode, Json<Favorite>)> {
    let mut conn = get_db_conn(&state.db_pool)?;

    let exists = ListingRepository::exists(&mut conn, listing_id)
        .map_err(|_| ApiError::db_error())?;
    if !exists {
        return Err(ApiError::not_found("Listing not found", "LISTING_NOT_FOUND"));
    }

    let favorite =
        FavoriteRepository::add(&mut conn, identity.user_id, listing_id).map_err(|e| {
            if matches!(
                e,
                diesel::result::Error::DatabaseError(
                    diesel::result::DatabaseErrorKind::UniqueViolation,
                    _
                )
            ) {
                ApiError::conflict("Listing already in favorites", "ALREADY_FAVORITED")
            } else {
                error!(listing_id = %listing_id, error = %e, "Failed to add favorite");
                ApiError::db_error()
            }
        })?;

    info!(listing_id = %listing_id, user_id = %identity.user_id, "Added favorite");

    Ok((StatusCode::CREATED, Json(favorite)))
}

#[utoipa::path(
    delete,
    path = "/listings/{id}/favorites",
    tag = "Favorites",
    params(("id" = Uuid, Path, description = "Listing ID")),
    responses(
        (status = 204, description = "Listing removed from favorites"),
        (status = 401, description = "Unauthorized", body = crate::error::ApiError),
        (status = 404, description = "Listing not in favorites", body = crate::error::ApiError),
        (status = 500, description = "Internal server error", body = crate::error::ApiError)
    ),
    security(("cookie_auth" = []))
)]
pub async fn remove_favorite(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(listing_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let mut conn = get_db_conn(&state.db_pool)?;

    let removed =
        FavoriteRepository::remove(&mut conn, identity.user_id, listing_id).map_err(|e| {
            error!(listing_id = %listing_id, error = %e, "Failed to remove favorite");
            ApiError::db_error()
        })?;

    if !removed {
        return Err(ApiError::not_found(
            "Listing not in favorites",
            "FAVORITE_NOT_FOUND",
        ));
    }

    info!(listing_id = %listing_id, user_id = %identity.user_id, "Removed favorite");

    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/favorites",
    tag = "Favorites",
    params(PaginationParams),
    responses(
        (status = 200, description = "The caller's favorites, newest first", body = FavoritesPage),
        (status = 401, description = "Unauthorized", body = crate::error::ApiError),
        (status = 500, description = "Internal server error", body = crate::error::ApiError)
    ),
    security(("cookie_auth" = []))
)]
pub async fn list_favorites(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Query(pagination): Query<PaginationParams>,
) -> ApiResult<Json<FavoritesPage>> {
    let mut conn = get_db_conn(&state.db_pool)?;

    let (items, total) =
        FavoriteRepository::page_for_user(&mut conn, identity.user_id, &pagination)
            .map_err(|_| ApiError::db_error())?;

    let (favorites, listings): (Vec<Favorite>, Vec<_>) = items.into_iter().unzip();

    let records =
        ListingRepository::with_relations(&mut conn, listings).map_err(|_| ApiError::db_error())?;

    let data = favorites
        .into_iter()
        .zip(records)
        .map(|(favorite, record)| {
            Ok(FavoriteItem {
                id: favorite.id,
                created_at: favorite.created_at,
                listing: into_detail(record)?,
            })
        })
        .collect::<ApiResult<Vec<_>>>()?;

    Ok(Json(FavoritesPage {
        data,
        pagination: pagination.into_metadata(total),
    }))
}
