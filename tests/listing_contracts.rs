//! Serialization contracts: stored text columns must come back to clients as
//! structured values, never as raw serialized strings.

use chrono::Utc;
use uuid::Uuid;

use domus::handlers::listings::{CreateListingRequest, ListingDetail};
use domus::models::{
    DealType, Listing, ListingImage, ListingStatus, LocalizedText, PropertyType, User, UserRole,
    UserStatus,
};
use domus::repositories::listings::ListingRecord;

fn owner() -> User {
    let now = Utc::now().naive_utc();
    User {
        id: Uuid::new_v4(),
        email: "owner@example.com".to_string(),
        password_hash: "$argon2id$v=19$secret".to_string(),
        first_name: Some("Alisher".to_string()),
        last_name: Some("Usmanov".to_string()),
        phone: Some("+998901234567".to_string()),
        role: UserRole::Agent,
        status: UserStatus::Active,
        email_verified: true,
        created_at: now,
        updated_at: now,
    }
}

fn stored_listing(owner_id: Uuid, title: &LocalizedText, features: Option<&str>) -> Listing {
    let now = Utc::now().naive_utc();
    Listing {
        id: Uuid::new_v4(),
        owner_id,
        property_type: PropertyType::Apartment,
        deal_type: DealType::Sale,
        status: ListingStatus::Active,
        title: serde_json::to_string(title).unwrap(),
        description: serde_json::to_string(title).unwrap(),
        city: "Tashkent".to_string(),
        district: None,
        address: None,
        latitude: Some(41.2995),
        longitude: Some(69.2401),
        price: 150000.0,
        currency: "USD".to_string(),
        area: Some(85.5),
        rooms: Some(3),
        bedrooms: Some(2),
        bathrooms: Some(1),
        floor: Some(5),
        total_floors: Some(9),
        features: features.map(|f| f.to_string()),
        view_count: 7,
        favorite_count: 2,
        created_at: now,
        updated_at: now,
        published_at: Some(now),
    }
}

#[test]
fn stored_text_columns_come_back_structured() {
    let owner = owner();
    let title = LocalizedText {
        ru: Some("Квартира".to_string()),
        uz: None,
        en: Some("Apartment".to_string()),
    };
    let listing = stored_listing(owner.id, &title, Some(r#"{"hasParking":true}"#));

    let detail = ListingDetail::from_record(ListingRecord {
        listing,
        owner,
        images: vec![],
    })
    .unwrap();

    assert_eq!(detail.title, title);
    assert_eq!(detail.features.as_ref().unwrap()["hasParking"], true);

    let json = serde_json::to_value(&detail).unwrap();
    assert!(json["title"].is_object());
    assert_eq!(json["title"]["en"], "Apartment");
    assert!(json["features"].is_object());
}

#[test]
fn localized_round_trip_is_identity() {
    // What a client writes on create must come back identical on read.
    let payload: CreateListingRequest = serde_json::from_value(serde_json::json!({
        "propertyType": "APARTMENT",
        "dealType": "SALE",
        "title": {"ru": "Квартира", "en": "Apartment"},
        "description": {"uz": "Kvartira"},
        "city": "Tashkent",
        "price": 150000,
        "features": {"hasParking": true, "floors": 2}
    }))
    .unwrap();

    let original_title = payload.title.clone();
    let original_description = payload.description.clone();

    let new_listing = payload.into_new_listing(Uuid::new_v4()).unwrap();

    let read_title: LocalizedText = serde_json::from_str(&new_listing.title).unwrap();
    let read_description: LocalizedText = serde_json::from_str(&new_listing.description).unwrap();
    let read_features: serde_json::Value =
        serde_json::from_str(new_listing.features.as_deref().unwrap()).unwrap();

    assert_eq!(read_title, original_title);
    assert_eq!(read_description, original_description);
    assert_eq!(read_features["hasParking"], true);
    assert_eq!(read_features["floors"], 2);
}

#[test]
fn corrupted_stored_text_is_an_error_not_a_passthrough() {
    let owner = owner();
    let mut listing = stored_listing(owner.id, &LocalizedText::default(), None);
    listing.title = "not valid json".to_string();

    let result = ListingDetail::from_record(ListingRecord {
        listing,
        owner,
        images: vec![],
    });

    assert!(result.is_err());
}

#[test]
fn detail_response_never_contains_the_owner_password_hash() {
    let owner = owner();
    let listing = stored_listing(owner.id, &LocalizedText::default(), None);

    let detail = ListingDetail::from_record(ListingRecord {
        listing,
        owner,
        images: vec![ListingImage {
            id: Uuid::new_v4(),
            listing_id: Uuid::new_v4(),
            url: "https://cdn.example.com/1.jpg".to_string(),
            thumbnail_url: None,
            caption: None,
            order: 0,
            created_at: Utc::now().naive_utc(),
        }],
    })
    .unwrap();

    let json = serde_json::to_string(&detail).unwrap();
    assert!(!json.contains("password"));
    assert!(!json.contains("argon2"));
    assert!(json.contains("\"images\""));
}
