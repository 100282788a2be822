pub mod activities;
pub mod connection;
pub mod schema;

pub use activities::ActivityQuery;
pub use connection::Database;
