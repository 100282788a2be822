pub mod activities;
pub mod agents;
pub mod engine;
pub mod health;
pub mod stats;

use crate::api::errors::{unavailable, ApiError};
use crate::db::Database;

pub(crate) fn storage(db: &Option<Database>) -> Result<&Database, ApiError> {
    db.as_ref().ok_or_else(|| unavailable("Storage not initialized"))
}
