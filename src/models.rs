use chrono::NaiveDateTime;
use diesel::prelude::*;
use diesel::{AsExpression, FromSqlRow};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Maps a string-backed database column to a Rust enum. The database stores
/// enum values as plain strings; validation happens at the application layer.
macro_rules! db_enum {
    ($name:ident { $($variant:ident => $value:literal),+ $(,)? }) => {
        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $value,)+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($value => Ok(Self::$variant),)+
                    other => Err(format!(
                        concat!("unknown ", stringify!($name), " value: {}"),
                        other
                    )),
                }
            }
        }

        impl diesel::serialize::ToSql<diesel::sql_types::Text, diesel::pg::Pg> for $name {
            fn to_sql<'b>(
                &'b self,
                out: &mut diesel::serialize::Output<'b, '_, diesel::pg::Pg>,
            ) -> diesel::serialize::Result {
                use std::io::Write;
                out.write_all(self.as_str().as_bytes())?;
                Ok(diesel::serialize::IsNull::No)
            }
        }

        impl diesel::deserialize::FromSql<diesel::sql_types::Text, diesel::pg::Pg> for $name {
            fn from_sql(bytes: diesel::pg::PgValue<'_>) -> diesel::deserialize::Result<Self> {
                let s = std::str::from_utf8(bytes.as_bytes())?;
                s.parse::<$name>().map_err(Into::into)
            }
        }
    };
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, AsExpression, FromSqlRow,
)]
#[diesel(sql_type = diesel::sql_types::Text)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    User,
    Agent,
    Admin,
}

db_enum!(UserRole {
    User => "USER",
    Agent => "AGENT",
    Admin => "ADMIN",
});

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, AsExpression, FromSqlRow,
)]
#[diesel(sql_type = diesel::sql_types::Text)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserStatus {
    Active,
    Suspended,
    PendingVerification,
}

db_enum!(UserStatus {
    Active => "ACTIVE",
    Suspended => "SUSPENDED",
    PendingVerification => "PENDING_VERIFICATION",
});

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, AsExpression, FromSqlRow,
)]
#[diesel(sql_type = diesel::sql_types::Text)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PropertyType {
    Apartment,
    House,
    Townhouse,
    Commercial,
    Land,
    Garage,
}

db_enum!(PropertyType {
    Apartment => "APARTMENT",
    House => "HOUSE",
    Townhouse => "TOWNHOUSE",
    Commercial => "COMMERCIAL",
    Land => "LAND",
    Garage => "GARAGE",
});

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, AsExpression, FromSqlRow,
)]
#[diesel(sql_type = diesel::sql_types::Text)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DealType {
    Sale,
    Rent,
    DailyRent,
}

db_enum!(DealType {
    Sale => "SALE",
    Rent => "RENT",
    DailyRent => "DAILY_RENT",
});

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, AsExpression, FromSqlRow,
)]
#[diesel(sql_type = diesel::sql_types::Text)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ListingStatus {
    Draft,
    Pending,
    Active,
    Sold,
    Rented,
    Archived,
    Rejected,
}

db_enum!(ListingStatus {
    Draft => "DRAFT",
    Pending => "PENDING",
    Active => "ACTIVE",
    Sold => "SOLD",
    Rented => "RENTED",
    Archived => "ARCHIVED",
    Rejected => "REJECTED",
});

/// Fields a listing page can be ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub enum SortBy {
    CreatedAt,
    Price,
    Area,
    ViewCount,
    PublishedAt,
}

impl Default for SortBy {
    fn default() -> Self {
        Self::CreatedAt
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

impl Default for SortOrder {
    fn default() -> Self {
        Self::Desc
    }
}

/// Multi-language text block. Every language is optional; absent languages
/// are omitted from the serialized form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct LocalizedText {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(example = "Красивая квартира в центре города")]
    pub ru: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(example = "Shahar markazidagi chiroyli kvartira")]
    pub uz: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(example = "Beautiful apartment in the city center")]
    pub en: Option<String>,
}

// The password hash must never leave the store boundary, so User
// deliberately does not implement Serialize; handlers expose UserResponse.
#[derive(Debug, Queryable, Selectable, Clone)]
#[diesel(table_name = crate::schema::users)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub role: UserRole,
    pub status: UserStatus,
    pub email_verified: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = crate::schema::users)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, AsChangeset)]
#[diesel(table_name = crate::schema::users)]
pub struct UserChanges {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub updated_at: NaiveDateTime,
}

/// Listing row as stored. `title`, `description` and `features` hold
/// serialized JSON text; reads must parse them back before leaving the API
/// boundary (see `handlers::listings::ListingDetail`).
#[derive(Debug, Queryable, Selectable, Clone)]
#[diesel(table_name = crate::schema::listings)]
pub struct Listing {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub property_type: PropertyType,
    pub deal_type: DealType,
    pub status: ListingStatus,
    pub title: String,
    pub description: String,
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
    pub features: Option<String>,
    pub view_count: i32,
    pub favorite_count: i32,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    pub published_at: Option<NaiveDateTime>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = crate::schema::listings)]
pub struct NewListing {
    pub owner_id: Uuid,
    pub property_type: PropertyType,
    pub deal_type: DealType,
    pub status: ListingStatus,
    pub title: String,
    pub description: String,
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
    pub features: Option<String>,
}

/// Partial listing update. `None` fields are left untouched; `updated_at` is
/// always bumped.
#[derive(Debug, AsChangeset)]
#[diesel(table_name = crate::schema::listings)]
pub struct ListingChanges {
    pub property_type: Option<PropertyType>,
    pub deal_type: Option<DealType>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub city: Option<String>,
    pub district: Option<String>,
    pub address: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub price: Option<f64>,
    pub currency: Option<String>,
    pub area: Option<f64>,
    pub rooms: Option<i32>,
    pub bedrooms: Option<i32>,
    pub bathrooms: Option<i32>,
    pub floor: Option<i32>,
    pub total_floors: Option<i32>,
    pub features: Option<String>,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Queryable, Selectable, Serialize, Clone, ToSchema)]
#[diesel(table_name = crate::schema::listing_images)]
#[serde(rename_all = "camelCase")]
pub struct ListingImage {
    pub id: Uuid,
    pub listing_id: Uuid,
    #[schema(example = "https://cdn.example.com/listings/1/main.jpg")]
    pub url: String,
    pub thumbnail_url: Option<String>,
    #[schema(example = "Main entrance view")]
    pub caption: Option<String>,
    #[schema(example = 0)]
    pub order: i32,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = crate::schema::listing_images)]
pub struct NewListingImage {
    pub listing_id: Uuid,
    pub url: String,
    pub thumbnail_url: Option<String>,
    pub caption: Option<String>,
    pub order: i32,
}

#[derive(Debug, Queryable, Selectable, Serialize, Clone, ToSchema)]
#[diesel(table_name = crate::schema::favorites)]
#[serde(rename_all = "camelCase")]
pub struct Favorite {
    pub id: Uuid,
    pub user_id: Uuid,
    pub listing_id: Uuid,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = crate::schema::favorites)]
pub struct NewFavorite {
    pub user_id: Uuid,
    pub listing_id: Uuid,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enum_wire_format() {
        assert_eq!(
            serde_json::to_string(&DealType::DailyRent).unwrap(),
            "\"DAILY_RENT\""
        );
        assert_eq!(
            serde_json::to_string(&UserStatus::PendingVerification).unwrap(),
            "\"PENDING_VERIFICATION\""
        );
        assert_eq!(
            serde_json::from_str::<PropertyType>("\"TOWNHOUSE\"").unwrap(),
            PropertyType::Townhouse
        );
        assert_eq!(
            serde_json::from_str::<ListingStatus>("\"REJECTED\"").unwrap(),
            ListingStatus::Rejected
        );
    }

    #[test]
    fn test_enum_db_format_round_trip() {
        for status in [
            ListingStatus::Draft,
            ListingStatus::Pending,
            ListingStatus::Active,
            ListingStatus::Sold,
            ListingStatus::Rented,
            ListingStatus::Archived,
            ListingStatus::Rejected,
        ] {
            assert_eq!(status.as_str().parse::<ListingStatus>().unwrap(), status);
        }
    }

    #[test]
    fn test_unknown_enum_value_rejected() {
        assert!("INACTIVE".parse::<ListingStatus>().is_err());
        assert!("SUPERADMIN".parse::<UserRole>().is_err());
        assert!(serde_json::from_str::<DealType>("\"LEASE\"").is_err());
    }

    #[test]
    fn test_sort_defaults() {
        assert_eq!(SortBy::default(), SortBy::CreatedAt);
        assert_eq!(SortOrder::default(), SortOrder::Desc);
        assert_eq!(
            serde_json::from_str::<SortBy>("\"viewCount\"").unwrap(),
            SortBy::ViewCount
        );
        assert_eq!(
            serde_json::from_str::<SortOrder>("\"asc\"").unwrap(),
            SortOrder::Asc
        );
    }

    #[test]
    fn test_localized_text_omits_absent_languages() {
        let text = LocalizedText {
            ru: Some("Квартира".to_string()),
            uz: None,
            en: Some("Apartment".to_string()),
        };

        let json = serde_json::to_string(&text).unwrap();
        assert!(json.contains("\"ru\""));
        assert!(json.contains("\"en\""));
        assert!(!json.contains("\"uz\""));

        let parsed: LocalizedText = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, text);
    }
}
