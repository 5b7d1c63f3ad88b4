//! Favorite persistence. The listing's favorite_count is adjusted in the
//! same transaction as the favorite row.

use diesel::prelude::*;
use uuid::Uuid;

use crate::models::{Favorite, Listing, NewFavorite};
use crate::pagination::PaginationParams;
use crate::schema::{favorites, listings};

pub struct FavoriteRepository;

impl FavoriteRepository {
    /// Fails with a unique-violation database error when the listing is
    /// already in the user's favorites.
    pub fn add(conn: &mut PgConnection, user_id: Uuid, listing_id: Uuid) -> QueryResult<Favorite> {
        conn.transaction(|conn| {
            let favorite: Favorite = diesel::insert_into(favorites::table)
                .values(&NewFavorite {
                    user_id,
                    listing_id,
                })
                .get_result(conn)?;

            diesel::update(listings::table.find(listing_id))
                .set(listings::favorite_count.eq(listings::favorite_count + 1))
                .execute(conn)?;

            Ok(favorite)
        })
    }

    /// Returns false when the listing was not in the user's favorites.
    pub fn remove(conn: &mut PgConnection, user_id: Uuid, listing_id: Uuid) -> QueryResult<bool> {
        conn.transaction(|conn| {
            let deleted = diesel::delete(
                favorites::table
                    .filter(favorites::user_id.eq(user_id))
                    .filter(favorites::listing_id.eq(listing_id)),
            )
            .execute(conn)?;

            if deleted == 0 {
                return Ok(false);
            }

            diesel::update(listings::table.find(listing_id))
                .set(listings::favorite_count.eq(listings::favorite_count - 1))
                .execute(conn)?;

            Ok(true)
        })
    }

    pub fn page_for_user(
        conn: &mut PgConnection,
        user_id: Uuid,
        pagination: &PaginationParams,
    ) -> QueryResult<(Vec<(Favorite, Listing)>, i64)> {
        let total: i64 = favorites::table
            .filter(favorites::user_id.eq(user_id))
            .count()
            .get_result(conn)?;

        let (limit, offset) = pagination.limit_offset();

        let items = favorites::table
            .inner_join(listings::table)
            .filter(favorites::user_id.eq(user_id))
            .order(favorites::created_at.desc())
            .limit(limit)
            .offset(offset)
            .select((Favorite::as_select(), Listing::as_select()))
            .load(conn)?;

        Ok((items, total))
    }
}
