//! OpenAPI documentation configuration.
//!
//! Generates the OpenAPI specification with `utoipa` and serves it via
//! Swagger UI.

use axum::Router;
use utoipa::{
    openapi::security::{ApiKey, ApiKeyValue, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::middleware::auth::SESSION_COOKIE;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Domus API",
        version = "1.0.0",
        description = "Real-estate listings marketplace.\n\n\
        ## Features\n\
        - Email/password authentication with an http-only session cookie\n\
        - Listings with localized titles and descriptions (ru/uz/en)\n\
        - Filtered, paginated public feed\n\
        - Image attachments and favorites\n\
        - Admin-moderated listing lifecycle\n\n\
        ## Authentication\n\
        Login sets the `access_token` cookie; browser clients need nothing\n\
        else. Non-browser clients may instead send\n\
        `Authorization: Bearer <token>`.",
        contact(
            name = "Domus API Support"
        ),
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    ),
    servers(
        (url = "/", description = "Current server")
    ),
    tags(
        (name = "Health", description = "Health check endpoints"),
        (name = "Authentication", description = "Registration, login, and profile"),
        (name = "Listings", description = "Listing CRUD, feed, and images"),
        (name = "Favorites", description = "Per-user favorite listings")
    ),
    paths(
        crate::handlers::health::health_check_simple,
        crate::handlers::health::health_check,
        crate::handlers::health::ready_check,
        crate::handlers::health::live_check,

        crate::handlers::auth::register,
        crate::handlers::auth::login,
        crate::handlers::auth::logout,
        crate::handlers::auth::get_current_user,
        crate::handlers::auth::update_profile,

        crate::handlers::listings::create_listing,
        crate::handlers::listings::list_listings,
        crate::handlers::listings::get_listing,
        crate::handlers::listings::update_listing,
        crate::handlers::listings::delete_listing,
        crate::handlers::listings::update_listing_status,

        crate::handlers::images::upload_image,
        crate::handlers::images::delete_image,

        crate::handlers::favorites::add_favorite,
        crate::handlers::favorites::remove_favorite,
        crate::handlers::favorites::list_favorites,
    ),
    components(
        schemas(
            crate::error::ApiError,
            crate::pagination::PaginationMeta,

            crate::models::UserRole,
            crate::models::UserStatus,
            crate::models::PropertyType,
            crate::models::DealType,
            crate::models::ListingStatus,
            crate::models::SortBy,
            crate::models::SortOrder,
            crate::models::LocalizedText,
            crate::models::ListingImage,
            crate::models::Favorite,

            crate::handlers::auth::RegisterRequest,
            crate::handlers::auth::LoginRequest,
            crate::handlers::auth::UpdateProfileRequest,
            crate::handlers::auth::UserResponse,
            crate::handlers::auth::AuthData,
            crate::handlers::auth::AuthEnvelope,

            crate::handlers::listings::CreateListingRequest,
            crate::handlers::listings::UpdateListingRequest,
            crate::handlers::listings::UpdateStatusRequest,
            crate::handlers::listings::ListingOwner,
            crate::handlers::listings::ListingDetail,
            crate::handlers::listings::ListingsPage,

            crate::handlers::images::UploadImageRequest,

            crate::handlers::favorites::FavoriteItem,
            crate::handlers::favorites::FavoritesPage,

            crate::handlers::health::HealthResponse,
            crate::handlers::health::ReadinessResponse,
            crate::handlers::health::ReadinessChecks,
            crate::handlers::health::ComponentStatus,
        )
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "cookie_auth",
                SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                    SESSION_COOKIE,
                    "Http-only session cookie set by /auth/login. Non-browser \
                     clients may send `Authorization: Bearer <token>` instead.",
                ))),
            );
        }

        openapi.security = Some(vec![]);
    }
}

pub fn swagger_router() -> Router {
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDoc::openapi())
        .into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_spec_generation() {
        let spec = ApiDoc::openapi();
        assert_eq!(spec.info.title, "Domus API");
        assert_eq!(spec.info.version, "1.0.0");
    }

    #[test]
    fn test_openapi_has_security_scheme() {
        let spec = ApiDoc::openapi();
        assert!(spec.components.is_some());
        let components = spec.components.unwrap();
        assert!(components.security_schemes.contains_key("cookie_auth"));
    }

    #[test]
    fn test_openapi_has_tags() {
        let spec = ApiDoc::openapi();
        assert!(spec.tags.is_some());
        let tags = spec.tags.unwrap();
        assert!(tags.iter().any(|t| t.name == "Authentication"));
        assert!(tags.iter().any(|t| t.name == "Listings"));
        assert!(tags.iter().any(|t| t.name == "Favorites"));
    }
}
