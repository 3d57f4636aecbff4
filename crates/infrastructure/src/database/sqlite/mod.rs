pub mod sqlite_bundle_repository;
pub mod sqlite_profile_repository;

pub use sqlite_bundle_repository::SqliteBundleRepository;
pub use sqlite_profile_repository::SqliteProfileRepository;
