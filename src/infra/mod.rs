pub mod envelope;
pub mod import;
pub mod sqlite;
