//! Listing image persistence.

use diesel::prelude::*;
use uuid::Uuid;

use crate::models::{ListingImage, NewListingImage};
use crate::schema::{listing_images, listings};

pub struct ImageRepository;

impl ImageRepository {
    pub fn insert(conn: &mut PgConnection, new_image: &NewListingImage) -> QueryResult<ListingImage> {
        diesel::insert_into(listing_images::table)
            .values(new_image)
            .get_result(conn)
    }

    /// Loads an image together with its parent listing's owner id, for
    /// ownership checks.
    pub fn find_with_owner(
        conn: &mut PgConnection,
        image_id: Uuid,
    ) -> QueryResult<Option<(ListingImage, Uuid)>> {
        listing_images::table
            .inner_join(listings::table)
            .filter(listing_images::id.eq(image_id))
            .select((ListingImage::as_select(), listings::owner_id))
            .first(conn)
            .optional()
    }

    pub fn delete(conn: &mut PgConnection, image_id: Uuid) -> QueryResult<usize> {
        diesel::delete(listing_images::table.find(image_id)).execute(conn)
    }
}
