//! Listing handlers: CRUD, the public feed, and status transitions.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::{get_db_conn, ApiError, ApiResult},
    guards,
    middleware::auth::Identity,
    models::{
        DealType, ListingChanges, ListingImage, ListingStatus, LocalizedText, NewListing,
        PropertyType, SortBy, SortOrder, UserRole,
    },
    pagination::{default_limit, default_page, PaginationMeta, PaginationParams},
    repositories::listings::{ListingFilter, ListingRecord, ListingRepository},
    AppState,
};

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateListingRequest {
    pub property_type: PropertyType,
    pub deal_type: DealType,
    pub title: LocalizedText,
    pub description: LocalizedText,
    #[validate(length(min = 1, message = "City is required"))]
    #[schema(example = "Tashkent")]
    pub city: String,
    #[schema(example = "Yunusabad")]
    pub district: Option<String>,
    #[schema(example = "123 Main Street, Building 5")]
    pub address: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    #[validate(range(min = 0.0, message = "Price must be non-negative"))]
    #[schema(example = 150000)]
    pub price: f64,
    #[schema(example = "USD")]
    pub currency: Option<String>,
    #[validate(range(min = 0.0))]
    pub area: Option<f64>,
    #[validate(range(min = 0))]
    pub rooms: Option<i32>,
    #[validate(range(min = 0))]
    pub bedrooms: Option<i32>,
    #[validate(range(min = 0))]
    pub bathrooms: Option<i32>,
    #[validate(range(min = 0))]
    pub floor: Option<i32>,
    #[validate(range(min = 0))]
    pub total_floors: Option<i32>,
    #[schema(value_type = Object)]
    pub features: Option<serde_json::Map<String, serde_json::Value>>,
}

impl CreateListingRequest {
    /// Status is forced to DRAFT regardless of anything in the payload;
    /// localized text and features are serialized for storage.
    pub fn into_new_listing(self, owner_id: Uuid) -> Result<NewListing, serde_json::Error> {
        Ok(NewListing {
            owner_id,
            property_type: self.property_type,
            deal_type: self.deal_type,
            status: ListingStatus::Draft,
            title: serde_json::to_string(&self.title)?,
            description: serde_json::to_string(&self.description)?,
            city: self.city,
            district: self.district,
            address: self.address,
            latitude: self.latitude,
            longitude: self.longitude,
            price: self.price,
            currency: self.currency.unwrap_or_else(|| "UZS".to_string()),
            area: self.area,
            rooms: self.rooms,
            bedrooms: self.bedrooms,
            bathrooms: self.bathrooms,
            floor: self.floor,
            total_floors: self.total_floors,
            features: self
                .features
                .map(|f| serde_json::to_string(&f))
                .transpose()?,
        })
    }
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateListingRequest {
    pub property_type: Option<PropertyType>,
    pub deal_type: Option<DealType>,
    pub title: Option<LocalizedText>,
    pub description: Option<LocalizedText>,
    pub city: Option<String>,
    pub district: Option<String>,
    pub address: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    #[validate(range(min = 0.0, message = "Price must be non-negative"))]
    pub price: Option<f64>,
    pub currency: Option<String>,
    #[validate(range(min = 0.0))]
    pub area: Option<f64>,
    #[validate(range(min = 0))]
    pub rooms: Option<i32>,
    #[validate(range(min = 0))]
    pub bedrooms: Option<i32>,
    #[validate(range(min = 0))]
    pub bathrooms: Option<i32>,
    #[validate(range(min = 0))]
    pub floor: Option<i32>,
    #[validate(range(min = 0))]
    pub total_floors: Option<i32>,
    #[schema(value_type = Object)]
    pub features: Option<serde_json::Map<String, serde_json::Value>>,
}

impl UpdateListingRequest {
    pub fn into_changes(self, now: NaiveDateTime) -> Result<ListingChanges, serde_json::Error> {
        Ok(ListingChanges {
            property_type: self.property_type,
            deal_type: self.deal_type,
            title: self.title.map(|t| serde_json::to_string(&t)).transpose()?,
            description: self
                .description
                .map(|d| serde_json::to_string(&d))
                .transpose()?,
            city: self.city,
            district: self.district,
            address: self.address,
            latitude: self.latitude,
            longitude: self.longitude,
            price: self.price,
            currency: self.currency,
            area: self.area,
            rooms: self.rooms,
            bedrooms: self.bedrooms,
            bathrooms: self.bathrooms,
            floor: self.floor,
            total_floors: self.total_floors,
            features: self
                .features
                .map(|f| serde_json::to_string(&f))
                .transpose()?,
            updated_at: now,
        })
    }
}

#[derive(Debug, Deserialize, Validate, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ListingQuery {
    /// Page number (1-indexed). Defaults to 1.
    #[param(minimum = 1, default = 1)]
    #[serde(default = "default_page")]
    pub page: i64,
    /// Number of items per page. Defaults to 20, max 100.
    #[param(minimum = 1, maximum = 100, default = 20)]
    #[serde(default = "default_limit")]
    pub limit: i64,
    pub property_type: Option<PropertyType>,
    pub deal_type: Option<DealType>,
    /// Defaults to ACTIVE; other statuses must be requested explicitly.
    pub status: Option<ListingStatus>,
    pub city: Option<String>,
    pub district: Option<String>,
    pub owner_id: Option<Uuid>,
    #[validate(range(min = 0.0))]
    pub min_price: Option<f64>,
    #[validate(range(min = 0.0))]
    pub max_price: Option<f64>,
    #[validate(range(min = 0))]
    pub min_rooms: Option<i32>,
    #[validate(range(min = 0))]
    pub max_rooms: Option<i32>,
    #[validate(range(min = 0.0))]
    pub min_area: Option<f64>,
    #[validate(range(min = 0.0))]
    pub max_area: Option<f64>,
    #[serde(default)]
    pub sort_by: SortBy,
    #[serde(default)]
    pub sort_order: SortOrder,
}

impl ListingQuery {
    pub fn pagination(&self) -> PaginationParams {
        PaginationParams::new(self.page, self.limit)
    }

    pub fn filter(&self) -> ListingFilter {
        ListingFilter {
            status: self.status,
            property_type: self.property_type,
            deal_type: self.deal_type,
            city: self.city.clone(),
            district: self.district.clone(),
            owner_id: self.owner_id,
            min_price: self.min_price,
            max_price: self.max_price,
            min_rooms: self.min_rooms,
            max_rooms: self.max_rooms,
            min_area: self.min_area,
            max_area: self.max_area,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateStatusRequest {
    #[schema(example = "ACTIVE")]
    pub status: ListingStatus,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ListingOwner {
    pub id: Uuid,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub role: UserRole,
}

/// Full listing representation; serialized text columns are parsed back
/// before leaving the API boundary.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ListingDetail {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub property_type: PropertyType,
    pub deal_type: DealType,
    pub status: ListingStatus,
    pub title: LocalizedText,
    pub description: LocalizedText,
    pub city: String,
    pub district: Option<String>,
    pub address: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub price: f64,
    pub currency: String,
    pub area: Option<f64>,
    pub rooms: Option<i32>,
    pub bedrooms: Option<i32>,
    pub bathrooms: Option<i32>,
    pub floor: Option<i32>,
    pub total_floors: Option<i32>,
    #[schema(value_type = Object)]
    pub features: Option<serde_json::Value>,
    pub view_count: i32,
    pub favorite_count: i32,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    pub published_at: Option<NaiveDateTime>,
    pub images: Vec<ListingImage>,
    pub owner: ListingOwner,
}

impl ListingDetail {
    pub fn from_record(record: ListingRecord) -> Result<Self, serde_json::Error> {
        let ListingRecord {
            listing,
            owner,
            images,
        } = record;

        let title: LocalizedText = serde_json::from_str(&listing.title)?;
        let description: LocalizedText = serde_json::from_str(&listing.description)?;
        let features: Option<serde_json::Value> = listing
            .features
            .as_deref()
            .map(serde_json::from_str)
            .transpose()?;

        Ok(Self {
            id: listing.id,
            owner_id: listing.owner_id,
            property_type: listing.property_type,
            deal_type: listing.deal_type,
            status: listing.status,
            title,
            description,
            city: listing.city,
            district: listing.district,
            address: listing.address,
            latitude: listing.latitude,
            longitude: listing.longitude,
            price: listing.price,
            currency: listing.currency,
            area: listing.area,
            rooms: listing.rooms,
            bedrooms: listing.bedrooms,
            bathrooms: listing.bathrooms,
            floor: listing.floor,
            total_floors: listing.total_floors,
            features,
            view_count: listing.view_count,
            favorite_count: listing.favorite_count,
            created_at: listing.created_at,
            updated_at: listing.updated_at,
            published_at: listing.published_at,
            images,
            owner: ListingOwner {
                id: owner.id,
                email: owner.email,
                first_name: owner.first_name,
                last_name: owner.last_name,
                phone: owner.phone,
                role: owner.role,
            },
        })
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ListingsPage {
    pub data: Vec<ListingDetail>,
    pub pagination: PaginationMeta,
}

pub(crate) fn into_detail(record: ListingRecord) -> ApiResult<ListingDetail> {
    let listing_id = record.listing.id;
    ListingDetail::from_record(record).map_err(|e| {
        error!(listing_id = %listing_id, error = %e, "Stored listing payload failed to parse");
        ApiError::internal("Listing payload corrupted", "LISTING_DECODE_ERROR")
    })
}

#[utoipa::path(
    post,
    path = "/listings",
    tag = "Listings",
    request_body = CreateListingRequest,
    responses(
        (status = 201, description = "Listing created with status DRAFT", body = ListingDetail),
        (status = 400, description = "Validation error", body = crate::error::ApiError),
        (status = 401, description = "Unauthorized", body = crate::error::ApiError),
        (status = 500, description = "Internal server error", body = crate::error::ApiError)
    ),
    security(("cookie_auth" = []))
)]
pub async fn create_listing(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(payload): Json<CreateListingRequest>,
) -> ApiResult<(StatusCode, Json<ListingDetail>)> {
    if let Err(e) = payload.validate() {
        return Err(ApiError::bad_request(
            format!("Validation error: {}", e),
            "VALIDATION_ERROR",
        ));
    }

    let new_listing = payload.into_new_listing(identity.user_id).map_err(|e| {
        error!(error = %e, "Failed to serialize listing payload");
        ApiError::internal("Failed to serialize listing", "LISTING_ENCODE_ERROR")
    })?;

    let mut conn = get_db_conn(&state.db_pool)?;

    let listing = ListingRepository::insert(&mut conn, &new_listing).map_err(|e| {
        error!(error = %e, owner_id = %identity.user_id, "Failed to create listing");
        ApiError::db_error()
    })?;

    info!(listing_id = %listing.id, owner_id = %identity.user_id, "Created listing");

    let record =
        ListingRepository::record(&mut conn, listing).map_err(|_| ApiError::db_error())?;

    Ok((StatusCode::CREATED, Json(into_detail(record)?)))
}

#[utoipa::path(
    get,
    path = "/listings",
    tag = "Listings",
    params(ListingQuery),
    responses(
        (status = 200, description = "Filtered, paginated listings", body = ListingsPage),
        (status = 400, description = "Invalid query", body = crate::error::ApiError),
        (status = 500, description = "Internal server error", body = crate::error::ApiError)
    )
)]
pub async fn list_listings(
    State(state): State<AppState>,
    Query(query): Query<ListingQuery>,
) -> ApiResult<Json<ListingsPage>> {
    if let Err(e) = query.validate() {
        return Err(ApiError::bad_request(
            format!("Validation error: {}", e),
            "VALIDATION_ERROR",
        ));
    }

    let pagination = query.pagination();
    let filter = query.filter();

    let mut conn = get_db_conn(&state.db_pool)?;

    let (items, total) = ListingRepository::page(
        &mut conn,
        &filter,
        query.sort_by,
        query.sort_order,
        &pagination,
    )
    .map_err(|_| ApiError::db_error())?;

    let records =
        ListingRepository::with_relations(&mut conn, items).map_err(|_| ApiError::db_error())?;

    let data = records
        .into_iter()
        .map(into_detail)
        .collect::<ApiResult<Vec<_>>>()?;

    Ok(Json(ListingsPage {
        data,
        pagination: pagination.into_metadata(total),
    }))
}

#[utoipa::path(
    get,
    path = "/listings/{id}",
    tag = "Listings",
    params(("id" = Uuid, Path, description = "Listing ID")),
    responses(
        (status = 200, description = "The listing", body = ListingDetail),
        (status = 404, description = "Listing not found", body = crate::error::ApiError),
        (status = 500, description = "Internal server error", body = crate::error::ApiError)
    )
)]
pub async fn get_listing(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ListingDetail>> {
    let mut conn = get_db_conn(&state.db_pool)?;

    let listing = ListingRepository::find_by_id(&mut conn, id)
        .map_err(|_| ApiError::db_error())?
        .ok_or_else(|| ApiError::not_found("Listing not found", "LISTING_NOT_FOUND"))?;

    // Best effort: the read never waits on, or fails because of, the view
    // counter.
    let pool = state.db_pool.clone();
    tokio::task::spawn_blocking(move || {
        let result = pool
            .get()
            .map_err(|e| e.to_string())
            .and_then(|mut conn| {
                ListingRepository::increment_view_count(&mut conn, id).map_err(|e| e.to_string())
            });
        if let Err(e) = result {
            warn!(listing_id = %id, error = %e, "Failed to increment view count");
        }
    });

    let record =
        ListingRepository::record(&mut conn, listing).map_err(|_| ApiError::db_error())?;

    Ok(Json(into_detail(record)?))
}

#[utoipa::path(
    patch,
    path = "/listings/{id}",
    tag = "Listings",
    params(("id" = Uuid, Path, description = "Listing ID")),
    request_body = UpdateListingRequest,
    responses(
        (status = 200, description = "Listing updated", body = ListingDetail),
        (status = 400, description = "Validation error", body = crate::error::ApiError),
        (status = 401, description = "Unauthorized", body = crate::error::ApiError),
        (status = 403, description = "Not the owner", body = crate::error::ApiError),
        (status = 404, description = "Listing not found", body = crate::error::ApiError),
        (status = 500, description = "Internal server error", body = crate::error::ApiError)
    ),
    security(("cookie_auth" = []))
)]
pub async fn update_listing(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateListingRequest>,
) -> ApiResult<Json<ListingDetail>> {
    if let Err(e) = payload.validate() {
        return Err(ApiError::bad_request(
            format!("Validation error: {}", e),
            "VALIDATION_ERROR",
        ));
    }

    let mut conn = get_db_conn(&state.db_pool)?;

    guards::ensure_listing_owner(&mut conn, id, &identity)?;

    let changes = payload.into_changes(Utc::now().naive_utc()).map_err(|e| {
        error!(error = %e, "Failed to serialize listing payload");
        ApiError::internal("Failed to serialize listing", "LISTING_ENCODE_ERROR")
    })?;

    let listing = ListingRepository::update(&mut conn, id, &changes).map_err(|e| {
        if matches!(e, diesel::result::Error::NotFound) {
            ApiError::not_found("Listing not found", "LISTING_NOT_FOUND")
        } else {
            error!(listing_id = %id, error = %e, "Failed to update listing");
            ApiError::db_error()
        }
    })?;

    info!(listing_id = %id, user_id = %identity.user_id, "Updated listing");

    let record =
        ListingRepository::record(&mut conn, listing).map_err(|_| ApiError::db_error())?;

    Ok(Json(into_detail(record)?))
}

#[utoipa::path(
    delete,
    path = "/listings/{id}",
    tag = "Listings",
    params(("id" = Uuid, Path, description = "Listing ID")),
    responses(
        (status = 204, description = "Listing deleted"),
        (status = 401, description = "Unauthorized", body = crate::error::ApiError),
        (status = 403, description = "Not the owner", body = crate::error::ApiError),
        (status = 404, description = "Listing not found", body = crate::error::ApiError),
        (status = 500, description = "Internal server error", body = crate::error::ApiError)
    ),
    security(("cookie_auth" = []))
)]
pub async fn delete_listing(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let mut conn = get_db_conn(&state.db_pool)?;

    guards::ensure_listing_owner(&mut conn, id, &identity)?;

    let deleted = ListingRepository::delete(&mut conn, id).map_err(|e| {
        error!(listing_id = %id, error = %e, "Failed to delete listing");
        ApiError::db_error()
    })?;

    if deleted == 0 {
        return Err(ApiError::not_found("Listing not found", "LISTING_NOT_FOUND"));
    }

    info!(listing_id = %id, user_id = %identity.user_id, "Deleted listing");

    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    patch,
    path = "/listings/{id}/status",
    tag = "Listings",
    params(("id" = Uuid, Path, description = "Listing ID")),
    request_body = UpdateStatusRequest,
    responses(
        (status = 200, description = "Status updated", body = ListingDetail),
        (status = 401, description = "Unauthorized", body = crate::error::ApiError),
        (status = 403, description = "Admin only", body = crate::error::ApiError),
        (status = 404, description = "Listing not found", body = crate::error::ApiError),
        (status = 500, description = "Internal server error", body = crate::error::ApiError)
    ),
    security(("cookie_auth" = []))
)]
pub async fn update_listing_status(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateStatusRequest>,
) -> ApiResult<Json<ListingDetail>> {
    guards::require_role(&identity, &[UserRole::Admin])?;

    let mut conn = get_db_conn(&state.db_pool)?;

    let listing = ListingRepository::set_status(&mut conn, id, payload.status)
        .map_err(|e| {
            error!(listing_id = %id, error = %e, "Failed to update listing status");
            ApiError::db_error()
        })?
        .ok_or_else(|| ApiError::not_found("Listing not found", "LISTING_NOT_FOUND"))?;

    info!(listing_id = %id, status = %payload.status, "Updated listing status");

    let record =
        ListingRepository::record(&mut conn, listing).map_err(|_| ApiError::db_error())?;

    Ok(Json(into_detail(record)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_forces_draft_status() {
        // A status field in the payload is ignored entirely.
        let payload: CreateListingRequest = serde_json::from_value(serde_json::json!({
            "propertyType": "APARTMENT",
            "dealType": "SALE",
            "status": "ACTIVE",
            "title": {"en": "Nice flat"},
            "description": {"en": "Very nice"},
            "city": "Tashkent",
            "price": 150000
        }))
        .unwrap();

        let new_listing = payload.into_new_listing(Uuid::new_v4()).unwrap();
        assert_eq!(new_listing.status, ListingStatus::Draft);
    }

    #[test]
    fn test_create_defaults_currency() {
        let payload: CreateListingRequest = serde_json::from_value(serde_json::json!({
            "propertyType": "HOUSE",
            "dealType": "RENT",
            "title": {"ru": "Дом"},
            "description": {"ru": "Большой дом"},
            "city": "Samarkand",
            "price": 1200
        }))
        .unwrap();

        let new_listing = payload.into_new_listing(Uuid::new_v4()).unwrap();
        assert_eq!(new_listing.currency, "UZS");
    }

    #[test]
    fn test_create_serializes_localized_text() {
        let payload: CreateListingRequest = serde_json::from_value(serde_json::json!({
            "propertyType": "APARTMENT",
            "dealType": "SALE",
            "title": {"en": "Flat", "ru": "Квартира"},
            "description": {"en": "Nice"},
            "city": "Tashkent",
            "price": 100000,
            "features": {"hasParking": true, "floorHeating": false}
        }))
        .unwrap();

        let new_listing = payload.into_new_listing(Uuid::new_v4()).unwrap();

        let title: LocalizedText = serde_json::from_str(&new_listing.title).unwrap();
        assert_eq!(title.en.as_deref(), Some("Flat"));
        assert_eq!(title.ru.as_deref(), Some("Квартира"));

        let features: serde_json::Value =
            serde_json::from_str(new_listing.features.as_deref().unwrap()).unwrap();
        assert_eq!(features["hasParking"], true);
    }

    #[test]
    fn test_update_skips_absent_fields() {
        let payload: UpdateListingRequest =
            serde_json::from_value(serde_json::json!({"price": 99000.0})).unwrap();
        let changes = payload.into_changes(Utc::now().naive_utc()).unwrap();

        assert_eq!(changes.price, Some(99000.0));
        assert!(changes.title.is_none());
        assert!(changes.city.is_none());
        assert!(changes.features.is_none());
    }

    #[test]
    fn test_negative_price_rejected() {
        let payload: CreateListingRequest = serde_json::from_value(serde_json::json!({
            "propertyType": "APARTMENT",
            "dealType": "SALE",
            "title": {"en": "Flat"},
            "description": {"en": "Nice"},
            "city": "Tashkent",
            "price": -5.0
        }))
        .unwrap();

        assert!(payload.validate().is_err());
    }

    #[test]
    fn test_query_defaults() {
        let query: ListingQuery = serde_json::from_value(serde_json::json!({})).unwrap();
        assert_eq!(query.page, 1);
        assert_eq!(query.limit, 20);
        assert_eq!(query.sort_by, SortBy::CreatedAt);
        assert_eq!(query.sort_order, SortOrder::Desc);
        assert!(query.status.is_none());
    }
}
