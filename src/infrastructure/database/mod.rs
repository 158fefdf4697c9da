mod sqlite;

pub use sqlite::SqliteDatabaseReader;
