//! SQLite persistence backend

mod permissions;
mod schema;

pub use permissions::SqlitePermissionStore;
pub use schema::{SCHEMA_VERSION, check_version, init_schema};
