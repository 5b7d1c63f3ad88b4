//! One repository per entity. Repositories own every query against the
//! store; handlers never touch the schema DSL directly.

pub mod favorites;
pub mod images;
pub mod listings;
pub mod users;
