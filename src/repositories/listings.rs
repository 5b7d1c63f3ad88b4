//! Listing persistence: CRUD, the filtered feed query, and the
//! publication-timestamp rules.

use std::collections::HashMap;

use chrono::NaiveDateTime;
use diesel::pg::Pg;
use diesel::prelude::*;
use uuid::Uuid;

use crate::models::{
    DealType, Listing, ListingChanges, ListingImage, ListingStatus, NewListing, PropertyType,
    SortBy, SortOrder, User,
};
use crate::pagination::PaginationParams;
use crate::schema::{listing_images, listings, users};

/// Conjunctive filter over the listing feed. Absent fields do not constrain
/// the query; an absent status falls back to the public-feed default ACTIVE.
#[derive(Debug, Clone, Default)]
pub struct ListingFilter {
    pub status: Option<ListingStatus>,
    pub property_type: Option<PropertyType>,
    pub deal_type: Option<DealType>,
    pub city: Option<String>,
    pub district: Option<String>,
    pub owner_id: Option<Uuid>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub min_rooms: Option<i32>,
    pub max_rooms: Option<i32>,
    pub min_area: Option<f64>,
    pub max_area: Option<f64>,
}

/// A listing together with its images (in display order) and owner record.
#[derive(Debug, Clone)]
pub struct ListingRecord {
    pub listing: Listing,
    pub owner: User,
    pub images: Vec<ListingImage>,
}

pub struct ListingRepository;

impl ListingRepository {
    pub fn insert(conn: &mut PgConnection, new_listing: &NewListing) -> QueryResult<Listing> {
        diesel::insert_into(listings::table)
            .values(new_listing)
            .get_result(conn)
    }

    pub fn find_by_id(conn: &mut PgConnection, id: Uuid) -> QueryResult<Option<Listing>> {
        listings::table.find(id).first(conn).optional()
    }

    pub fn exists(conn: &mut PgConnection, id: Uuid) -> QueryResult<bool> {
        use diesel::dsl::{exists, select};
        select(exists(listings::table.find(id))).get_result(conn)
    }

    pub fn owner_of(conn: &mut PgConnection, id: Uuid) -> QueryResult<Option<Uuid>> {
        listings::table
            .find(id)
            .select(listings::owner_id)
            .first(conn)
            .optional()
    }

    /// Builds the conjunctive filter query.
    pub fn filtered(filter: &ListingFilter) -> listings::BoxedQuery<'static, Pg> {
        let mut query = listings::table.into_boxed();

        query = query.filter(listings::status.eq(filter.status.unwrap_or(ListingStatus::Active)));

        if let Some(property_type) = filter.property_type {
            query = query.filter(listings::property_type.eq(property_type));
        }
        if let Some(deal_type) = filter.deal_type {
            query = query.filter(listings::deal_type.eq(deal_type));
        }
        if let Some(city) = &filter.city {
            query = query.filter(listings::city.eq(city.clone()));
        }
        if let Some(district) = &filter.district {
            query = query.filter(listings::district.eq(district.clone()));
        }
        if let Some(owner_id) = filter.owner_id {
            query = query.filter(listings::owner_id.eq(owner_id));
        }
        if let Some(min_price) = filter.min_price {
            query = query.filter(listings::price.ge(min_price));
        }
        if let Some(max_price) = filter.max_price {
            query = query.filter(listings::price.le(max_price));
        }
        if let Some(min_rooms) = filter.min_rooms {
            query = query.filter(listings::rooms.ge(min_rooms));
        }
        if let Some(max_rooms) = filter.max_rooms {
            query = query.filter(listings::rooms.le(max_rooms));
        }
        if let Some(min_area) = filter.min_area {
            query = query.filter(listings::area.ge(min_area));
        }
        if let Some(max_area) = filter.max_area {
            query = query.filter(listings::area.le(max_area));
        }

        query
    }

    /// The filtered query with ordering and pagination applied.
    pub fn page_query(
        filter: &ListingFilter,
        sort_by: SortBy,
        sort_order: SortOrder,
        pagination: &PaginationParams,
    ) -> listings::BoxedQuery<'static, Pg> {
        let query = Self::filtered(filter);

        let query = match (sort_by, sort_order) {
            (SortBy::CreatedAt, SortOrder::Asc) => query.order(listings::created_at.asc()),
            (SortBy::CreatedAt, SortOrder::Desc) => query.order(listings::created_at.desc()),
            (SortBy::Price, SortOrder::Asc) => query.order(listings::price.asc()),
            (SortBy::Price, SortOrder::Desc) => query.order(listings::price.desc()),
            (SortBy::Area, SortOrder::Asc) => query.order(listings::area.asc()),
            (SortBy::Area, SortOrder::Desc) => query.order(listings::area.desc()),
            (SortBy::ViewCount, SortOrder::Asc) => query.order(listings::view_count.asc()),
            (SortBy::ViewCount, SortOrder::Desc) => query.order(listings::view_count.desc()),
            (SortBy::PublishedAt, SortOrder::Asc) => query.order(listings::published_at.asc()),
            (SortBy::PublishedAt, SortOrder::Desc) => query.order(listings::published_at.desc()),
        };

        let (limit, offset) = pagination.limit_offset();
        query.limit(limit).offset(offset)
    }

    pub fn page(
        conn: &mut PgConnection,
        filter: &ListingFilter,
        sort_by: SortBy,
        sort_order: SortOrder,
        pagination: &PaginationParams,
    ) -> QueryResult<(Vec<Listing>, i64)> {
        let total: i64 = Self::filtered(filter).count().get_result(conn)?;
        let items = Self::page_query(filter, sort_by, sort_order, pagination).load(conn)?;
        Ok((items, total))
    }

    /// Attaches images (display order) and owner records to a page of
    /// listings.
    pub fn with_relations(
        conn: &mut PgConnection,
        page: Vec<Listing>,
    ) -> QueryResult<Vec<ListingRecord>> {
        let listing_ids: Vec<Uuid> = page.iter().map(|l| l.id).collect();
        let owner_ids: Vec<Uuid> = page.iter().map(|l| l.owner_id).collect();

        let mut images_by_listing: HashMap<Uuid, Vec<ListingImage>> = HashMap::new();
        let images: Vec<ListingImage> = listing_images::table
            .filter(listing_images::listing_id.eq_any(&listing_ids))
            .order((listing_images::order.asc(), listing_images::created_at.asc()))
            .load(conn)?;
        for image in images {
            images_by_listing
                .entry(image.listing_id)
                .or_default()
                .push(image);
        }

        let owners: HashMap<Uuid, User> = users::table
            .filter(users::id.eq_any(&owner_ids))
            .load::<User>(conn)?
            .into_iter()
            .map(|user| (user.id, user))
            .collect();

        page.into_iter()
            .map(|listing| {
                let owner = owners
                    .get(&listing.owner_id)
                    .cloned()
                    .ok_or(diesel::result::Error::NotFound)?;
                let images = images_by_listing.remove(&listing.id).unwrap_or_default();
                Ok(ListingRecord {
                    listing,
                    owner,
                    images,
                })
            })
            .collect()
    }

    /// Single-listing convenience over [`Self::with_relations`].
    pub fn record(conn: &mut PgConnection, listing: Listing) -> QueryResult<ListingRecord> {
        let mut records = Self::with_relations(conn, vec![listing])?;
        records.pop().ok_or(diesel::result::Error::NotFound)
    }

    pub fn update(
        conn: &mut PgConnection,
        id: Uuid,
        changes: &ListingChanges,
    ) -> QueryResult<Listing> {
        diesel::update(listings::table.find(id))
            .set(changes)
            .get_result(conn)
    }

    pub fn delete(conn: &mut PgConnection, id: Uuid) -> QueryResult<usize> {
        diesel::delete(listings::table.find(id)).execute(conn)
    }

    /// Applies a status transition. Any valid status value is accepted; the
    /// publication timestamp follows [`published_at_after`].
    pub fn set_status(
        conn: &mut PgConnection,
        id: Uuid,
        status: ListingStatus,
    ) -> QueryResult<Option<Listing>> {
        let Some(current) = Self::find_by_id(conn, id)? else {
            return Ok(None);
        };

        let now = chrono::Utc::now().naive_utc();
        let published_at = published_at_after(status, current.published_at, now);

        let updated = diesel::update(listings::table.find(id))
            .set((
                listings::status.eq(status),
                listings::published_at.eq(published_at),
                listings::updated_at.eq(now),
            ))
            .get_result(conn)?;

        Ok(Some(updated))
    }

    pub fn increment_view_count(conn: &mut PgConnection, id: Uuid) -> QueryResult<usize> {
        diesel::update(listings::table.find(id))
            .set(listings::view_count.eq(listings::view_count + 1))
            .execute(conn)
    }
}

/// The first transition into ACTIVE stamps the publication time; it is never
/// overwritten or cleared afterwards.
pub fn published_at_after(
    status: ListingStatus,
    current: Option<NaiveDateTime>,
    now: NaiveDateTime,
) -> Option<NaiveDateTime> {
    match (status, current) {
        (ListingStatus::Active, None) => Some(now),
        (_, current) => current,
    }
}
