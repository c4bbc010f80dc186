pub mod sqlite_source;

pub use sqlite_source::SqliteBoatService;
