pub mod connection;
pub mod fixtures;
pub mod repositories;

pub use connection::{connect_lazy_with_settings, connect_with_settings, DbPool};
pub use repositories::{
    InMemoryMartRepository, MartRepository, MartStatus, PgMartRepository, RepositoryError,
};
