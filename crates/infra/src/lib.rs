//! Infrastructure layer: storage backends, identity directory, configuration.

pub mod config;
pub mod store;
pub mod users;

pub use config::{AppConfig, ConfigError, StoreKind};
pub use store::{InMemorySkuStore, RemoteSkuStore, SkuStore, SqliteSkuStore, StoreError};
pub use users::{InMemoryUserDirectory, SqliteUserDirectory, UserDirectory};
