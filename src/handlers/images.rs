//! Listing image handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use tracing::{error, info};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::{get_db_conn, ApiError, ApiResult},
    middleware::auth::Identity,
    models::{ListingImage, NewListingImage},
    repositories::{images::ImageRepository, listings::ListingRepository},
    AppState,
};

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadImageRequest {
    #[validate(url(message = "Invalid image URL"))]
    #[schema(example = "https://cdn.example.com/listings/1/main.jpg")]
    pub url: String,
    #[validate(url(message = "Invalid thumbnail URL"))]
    pub thumbnail_url: Option<String>,
    #[schema(example = "Main entrance view")]
    pub caption: Option<String>,
    /// Display order (0 = first).
    #[validate(range(min = 0))]
    #[serde(default)]
    #[schema(example = 0)]
    pub order: i32,
}

// Any authenticated user may attach an image to an existing listing; only
// the existence of the listing is checked here.
#[utoipa::path(
    post,
    path = "/listings/{id}/images",
    tag = "Listings",
    params(("id" = Uuid, Path, description = "Listing ID")),
    request_body = UploadImageRequest,
    responses(
        (status = 201, description = "Image attached", body = ListingImage),
        (status = 400, description = "Validation error", body = crate::error::ApiError),
        (status = 401, description = "Unauthorized", body = crate::error::ApiError),
        (status = 404, description = "Listing not found", body = crate::error::ApiError),
        (status = 500, description = "Internal server error", body = crate::error::ApiError)
    ),
    security(("cookie_auth" = []))
)]
pub async fn upload_image(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(listing_id): Path<Uuid>,
    Json(payload): Json<UploadImageRequest>,
) -> ApiResult<(StatusCode, Json<ListingImage>)> {
    if let Err(e) = payload.validate() {
        return Err(ApiError::bad_request(
            format!("Validation error: {}", e),
            "VALIDATION_ERROR",
        ));
    }

    let mut conn = get_db_conn(&state.db_pool)?;

    let exists = ListingRepository::exists(&mut conn, listing_id)
        .map_err(|_| ApiError::db_error())?;
    if !exists {
        return Err(ApiError::not_found("Listing not found", "LISTING_NOT_FOUND"));
    }

    let new_image = NewListingImage {
        listing_id,
        url: payload.url,
        thumbnail_url: payload.thumbnail_url,
        caption: payload.caption,
        order: payload.order,
    };

    let image = ImageRepository::insert(&mut conn, &new_image).map_err(|e| {
        error!(listing_id = %listing_id, error = %e, "Failed to attach image");
        ApiError::db_error()
    })?;

    info!(image_id = %image.id, listing_id = %listing_id, user_id = %identity.user_id, "Attached image");

    Ok((StatusCode::CREATED, Json(image)))
}

#[utoipa::path(
    delete,
    path = "/listings/images/{image_id}",
    tag = "Listings",
    params(("image_id" = Uuid, Path, description = "Image ID")),
    responses(
        (status = 204, description = "Image deleted"),
        (status = 401, description = "Unauthorized", body = crate::error::ApiError),
        (status = 403, description = "Not the listing owner", body = crate::error::ApiError),
        (status = 404, description = "Image not found", body = crate::error::ApiError),
        (status = 500, description = "Internal server error", body = crate::error::ApiError)
    ),
    security(("cookie_auth" = []))
)]
pub async fn delete_image(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(image_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let mut conn = get_db_conn(&state.db_pool)?;

    let (image, owner_id) = ImageRepository::find_with_owner(&mut conn, image_id)
        .map_err(|_| ApiError::db_error())?
        .ok_or_else(|| ApiError::not_found("Image not found", "IMAGE_NOT_FOUND"))?;

    if owner_id != identity.user_id {
        return Err(ApiError::forbidden(
            "You do not have permission to delete this image",
            "NOT_LISTING_OWNER",
        ));
    }

    ImageRepository::delete(&mut conn, image.id).map_err(|e| {
        error!(image_id = %image_id, error = %e, "Failed to delete image");
        ApiError::db_error()
    })?;

    info!(image_id = %image_id, user_id = %identity.user_id, "Deleted image");

    Ok(StatusCode::NO_CONTENT)
}
