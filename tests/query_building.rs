//! Verifies the listing feed query construction without a live database.

use diesel::pg::Pg;
use uuid::Uuid;

use domus::models::{DealType, ListingStatus, PropertyType, SortBy, SortOrder};
use domus::pagination::PaginationParams;
use domus::repositories::listings::{ListingFilter, ListingRepository};

fn sql(filter: &ListingFilter) -> String {
    diesel::debug_query::<Pg, _>(&ListingRepository::filtered(filter)).to_string()
}

fn page_sql(
    filter: &ListingFilter,
    sort_by: SortBy,
    sort_order: SortOrder,
    pagination: &PaginationParams,
) -> String {
    diesel::debug_query::<Pg, _>(&ListingRepository::page_query(
        filter, sort_by, sort_order, pagination,
    ))
    .to_string()
}

#[test]
fn default_filter_targets_active_listings() {
    let sql = sql(&ListingFilter::default());
    assert!(sql.contains("\"listings\".\"status\" = $1"));
    assert!(sql.contains("Active"));
}

#[test]
fn explicit_status_overrides_the_default() {
    let filter = ListingFilter {
        status: Some(ListingStatus::Draft),
        ..Default::default()
    };
    let sql = sql(&filter);
    assert!(sql.contains("\"listings\".\"status\" = $1"));
    assert!(sql.contains("Draft"));
    assert!(!sql.contains("Active"));
}

#[test]
fn exact_match_filters_are_conjunctive() {
    let owner_id = Uuid::new_v4();
    let filter = ListingFilter {
        property_type: Some(PropertyType::Apartment),
        deal_type: Some(DealType::Sale),
        city: Some("Tashkent".to_string()),
        district: Some("Yunusabad".to_string()),
        owner_id: Some(owner_id),
        ..Default::default()
    };

    let sql = sql(&filter);
    assert!(sql.contains("\"listings\".\"property_type\" ="));
    assert!(sql.contains("\"listings\".\"deal_type\" ="));
    assert!(sql.contains("\"listings\".\"city\" ="));
    assert!(sql.contains("\"listings\".\"district\" ="));
    assert!(sql.contains("\"listings\".\"owner_id\" ="));
    assert!(sql.contains("Tashkent"));
}

#[test]
fn range_filters_apply_only_given_bounds() {
    let filter = ListingFilter {
        min_price: Some(50000.0),
        max_area: Some(120.0),
        ..Default::default()
    };

    let sql = sql(&filter);
    assert!(sql.contains("\"listings\".\"price\" >="));
    assert!(!sql.contains("\"listings\".\"price\" <="));
    assert!(sql.contains("\"listings\".\"area\" <="));
    assert!(!sql.contains("\"listings\".\"area\" >="));
    assert!(!sql.contains("\"listings\".\"rooms\""));
}

#[test]
fn both_bounds_make_an_inclusive_range() {
    let filter = ListingFilter {
        min_rooms: Some(2),
        max_rooms: Some(4),
        ..Default::default()
    };

    let sql = sql(&filter);
    assert!(sql.contains("\"listings\".\"rooms\" >="));
    assert!(sql.contains("\"listings\".\"rooms\" <="));
}

#[test]
fn unfiltered_fields_do_not_constrain_the_query() {
    let sql = sql(&ListingFilter::default());
    assert!(!sql.contains("\"listings\".\"price\" >="));
    assert!(!sql.contains("\"listings\".\"city\" ="));
    assert!(!sql.contains("\"listings\".\"owner_id\""));
}

#[test]
fn default_sort_is_newest_first() {
    let sql = page_sql(
        &ListingFilter::default(),
        SortBy::default(),
        SortOrder::default(),
        &PaginationParams::default(),
    );
    assert!(sql.contains("ORDER BY \"listings\".\"created_at\" DESC"));
}

#[test]
fn sort_field_and_direction_are_applied() {
    let sql = page_sql(
        &ListingFilter::default(),
        SortBy::Price,
        SortOrder::Asc,
        &PaginationParams::default(),
    );
    assert!(sql.contains("ORDER BY \"listings\".\"price\" ASC"));

    let sql = page_sql(
        &ListingFilter::default(),
        SortBy::ViewCount,
        SortOrder::Desc,
        &PaginationParams::default(),
    );
    assert!(sql.contains("ORDER BY \"listings\".\"view_count\" DESC"));
}

#[test]
fn pagination_is_applied_as_limit_and_offset() {
    let sql = page_sql(
        &ListingFilter::default(),
        SortBy::default(),
        SortOrder::default(),
        &PaginationParams::new(3, 10),
    );
    assert!(sql.contains("LIMIT"));
    assert!(sql.contains("OFFSET"));
    // page 3 with limit 10 skips 20 rows
    assert!(sql.contains("20"));
}

#[test]
fn oversized_limit_is_clamped() {
    let sql = page_sql(
        &ListingFilter::default(),
        SortBy::default(),
        SortOrder::default(),
        &PaginationParams::new(1, 10_000),
    );
    assert!(sql.contains("100"));
    assert!(!sql.contains("10000"));
}
