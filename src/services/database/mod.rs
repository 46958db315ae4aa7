// Database service module
// SQLite connection and schema for the response cache

mod connection;
mod schema;

pub use connection::Database;
