//! User persistence.

use diesel::prelude::*;
use uuid::Uuid;

use crate::models::{NewUser, User, UserChanges};
use crate::schema::users;

pub struct UserRepository;

impl UserRepository {
    pub fn insert(conn: &mut PgConnection, new_user: &NewUser) -> QueryResult<User> {
        diesel::insert_into(users::table)
            .values(new_user)
            .get_result(conn)
    }

    pub fn find_by_id(conn: &mut PgConnection, id: Uuid) -> QueryResult<Option<User>> {
        users::table.find(id).first(conn).optional()
    }

    pub fn find_by_email(conn: &mut PgConnection, email: &str) -> QueryResult<Option<User>> {
        users::table
            .filter(users::email.eq(email))
            .first(conn)
            .optional()
    }

    /// Merges only the provided fields; `None` leaves a field untouched.
    pub fn update_profile(
        conn: &mut PgConnection,
        id: Uuid,
        changes: &UserChanges,
    ) -> QueryResult<Option<User>> {
        diesel::update(users::table.find(id))
            .set(changes)
            .get_result(conn)
            .optional()
    }
}
