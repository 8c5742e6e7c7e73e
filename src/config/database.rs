//! Schema Initializer for the offline canteen store.
//!
//! Tables are generated from the entity definitions with
//! `Schema::create_table_from_entity`, guarded by `IF NOT EXISTS` so that opening an
//! existing store is a no-op. There is no migration versioning: a changed entity
//! requires [`drop_tables`] followed by a fresh sync-down.

use crate::config::settings::StoreSettings;
use crate::entities::{
    Item, ItemPricing, Menu, MenuConfiguration, MenuItem, Order, OrderItem, Walkin, WalkinItem,
};
use crate::errors::{Error, Result};
use sea_orm::sea_query::Table;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, EntityTrait, Schema};
use tokio::sync::OnceCell;
use tracing::{debug, info, instrument};

/// Connects to the store at `database_url` without touching the schema.
///
/// # Errors
/// Returns [`Error::Database`] if the connection cannot be established.
pub async fn create_connection(database_url: &str) -> Result<DatabaseConnection> {
    Database::connect(database_url).await.map_err(Into::into)
}

/// Connects to the store and ensures every table exists.
///
/// # Errors
/// Returns [`Error::Database`] on connection failure and [`Error::Schema`] if any
/// table cannot be created. No partial-schema recovery is attempted.
#[instrument]
pub async fn open(database_url: &str) -> Result<DatabaseConnection> {
    let db = create_connection(database_url).await?;
    info!("Store connection opened. Ensuring tables are created...");
    create_tables(&db).await?;
    Ok(db)
}

async fn create_table<E: EntityTrait>(
    db: &DatabaseConnection,
    schema: &Schema,
    entity: E,
) -> Result<()> {
    let builder = db.get_database_backend();
    let mut statement = schema.create_table_from_entity(entity);
    statement.if_not_exists();

    db.execute(builder.build(&statement))
        .await
        .map_err(|e| Error::Schema {
            table: entity.table_name().to_string(),
            message: e.to_string(),
        })?;
    debug!("Ensured table {}", entity.table_name());
    Ok(())
}

async fn drop_table<E: EntityTrait>(db: &DatabaseConnection, entity: E) -> Result<()> {
    let builder = db.get_database_backend();
    let statement = Table::drop().table(entity).if_exists().to_owned();

    db.execute(builder.build(&statement))
        .await
        .map_err(|e| Error::Schema {
            table: entity.table_name().to_string(),
            message: e.to_string(),
        })?;
    Ok(())
}

/// Creates all store tables that do not exist yet, parents before children.
///
/// `items` and `item_pricing` are included because the menu writer and the read
/// projections depend on them.
#[instrument(skip(db))]
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let schema = Schema::new(db.get_database_backend());

    create_table(db, &schema, MenuConfiguration).await?;
    create_table(db, &schema, Menu).await?;
    create_table(db, &schema, Item).await?;
    create_table(db, &schema, ItemPricing).await?;
    create_table(db, &schema, MenuItem).await?;
    create_table(db, &schema, Order).await?;
    create_table(db, &schema, OrderItem).await?;
    create_table(db, &schema, Walkin).await?;
    create_table(db, &schema, WalkinItem).await?;

    info!("Store tables ensured.");
    Ok(())
}

/// Drops every store table, children first. Used to reset the offline cache.
#[instrument(skip(db))]
pub async fn drop_tables(db: &DatabaseConnection) -> Result<()> {
    drop_table(db, WalkinItem).await?;
    drop_table(db, Walkin).await?;
    drop_table(db, OrderItem).await?;
    drop_table(db, Order).await?;
    drop_table(db, MenuItem).await?;
    drop_table(db, ItemPricing).await?;
    drop_table(db, Item).await?;
    drop_table(db, Menu).await?;
    drop_table(db, MenuConfiguration).await?;

    info!("Store tables dropped.");
    Ok(())
}

/// Process-wide handle to the offline store.
///
/// Owned by the application root and passed by reference to whatever needs the
/// store. The connection is opened and the schema ensured on the first call to
/// [`StoreHandle::connection`]; later calls reuse it.
#[derive(Debug)]
pub struct StoreHandle {
    settings: StoreSettings,
    connection: OnceCell<DatabaseConnection>,
}

impl StoreHandle {
    /// Creates an unopened handle.
    #[must_use]
    pub fn new(settings: StoreSettings) -> Self {
        Self {
            settings,
            connection: OnceCell::new(),
        }
    }

    /// Settings the handle was built with.
    #[must_use]
    pub const fn settings(&self) -> &StoreSettings {
        &self.settings
    }

    /// Whether the store has been opened yet.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.connection.initialized()
    }

    /// Returns the connection, opening the store on first use.
    ///
    /// # Errors
    /// Propagates the failure of the first [`open`]; a later call retries.
    pub async fn connection(&self) -> Result<&DatabaseConnection> {
        self.connection
            .get_or_try_init(|| open(&self.settings.database_url))
            .await
    }

    /// Closes the connection if it was ever opened.
    ///
    /// # Errors
    /// Returns [`Error::Database`] if the pool fails to shut down cleanly.
    pub async fn close(self) -> Result<()> {
        if let Some(db) = self.connection.into_inner() {
            db.close().await?;
        }
        Ok(())
    }
}
