/// Schema creation, connection setup and the lazily opened store handle
pub mod database;

/// Store settings from `canteen.toml` and environment variables
pub mod settings;

pub use database::{StoreHandle, create_connection, create_tables, drop_tables};
pub use settings::StoreSettings;
