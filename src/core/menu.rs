//! Menu business logic - Menus and the complete-menu sync-down writer.
//!
//! [`save_complete_menu`] persists a whole remote menu response (configuration, menu,
//! items, pricing and menu items) as one unit of work. Parents are written before
//! the rows that reference them, and any failing step rolls back the entire
//! aggregate.

use crate::{
    core::{
        catalog::{NewItem, NewItemPricing, NewMenuConfiguration},
        menu_item::{self, NewMenuItem},
        repository::{self, now_unix, set_if_some},
    },
    entities::{Menu, menu},
    errors::{Error, Result},
};
use sea_orm::{DatabaseTransaction, QueryOrder, Set, TransactionTrait, prelude::*};
use serde::Deserialize;
use tracing::{debug, info, instrument};

/// A menu as created locally or received from the remote service
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMenu {
    /// Remote identifier
    pub id: i64,
    /// Display name
    pub name: String,
    /// Optional free text
    pub description: Option<String>,
    /// Opening time (Unix seconds)
    pub start_time: i64,
    /// Closing time (Unix seconds)
    pub end_time: i64,
    /// Defaults to `"active"`
    pub status: Option<String>,
    /// Meal slot this menu instantiates
    pub menu_configuration_id: Option<i64>,
    /// Creator on the remote side
    pub created_by_id: Option<i64>,
    /// Last editor on the remote side
    pub updated_by_id: Option<i64>,
    /// Defaults to now
    pub created_at: Option<i64>,
    /// Defaults to now
    pub updated_at: Option<i64>,
}

impl NewMenu {
    fn into_active_model(self, now: i64) -> Result<menu::ActiveModel> {
        if self.name.trim().is_empty() {
            return Err(Error::Validation {
                field: "name",
                message: format!("menu {} has an empty name", self.id),
            });
        }

        Ok(menu::ActiveModel {
            id: Set(self.id),
            name: Set(self.name),
            description: Set(self.description),
            start_time: Set(self.start_time),
            end_time: Set(self.end_time),
            status: Set(self.status.unwrap_or_else(|| "active".to_string())),
            menu_configuration_id: Set(self.menu_configuration_id),
            created_by_id: Set(self.created_by_id),
            updated_by_id: Set(self.updated_by_id),
            created_at: Set(self.created_at.unwrap_or(now)),
            updated_at: Set(self.updated_at.unwrap_or(now)),
        })
    }
}

/// Fields of a menu that may change; `None` leaves a column untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MenuPatch {
    /// New display name
    pub name: Option<String>,
    /// New description; `Some(None)` clears it
    pub description: Option<Option<String>>,
    /// New start (Unix seconds)
    pub start_time: Option<i64>,
    /// New end (Unix seconds)
    pub end_time: Option<i64>,
    /// New status
    pub status: Option<String>,
    /// New meal slot; `Some(None)` detaches the menu
    pub menu_configuration_id: Option<Option<i64>>,
    /// Staff member making the change
    pub updated_by_id: Option<Option<i64>>,
}

impl MenuPatch {
    fn into_active_model(self, now: i64) -> menu::ActiveModel {
        menu::ActiveModel {
            name: set_if_some(self.name),
            description: set_if_some(self.description),
            start_time: set_if_some(self.start_time),
            end_time: set_if_some(self.end_time),
            status: set_if_some(self.status),
            menu_configuration_id: set_if_some(self.menu_configuration_id),
            updated_by_id: set_if_some(self.updated_by_id),
            updated_at: Set(now),
            ..Default::default()
        }
    }
}

/// Optional filters for [`list_menus`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MenuFilter {
    /// Only menus of this meal slot
    pub menu_configuration_id: Option<i64>,
}

/// Creates a menu and returns its id.
pub async fn create_menu(db: &DatabaseConnection, new_menu: NewMenu) -> Result<i64> {
    let row = new_menu.into_active_model(now_unix())?;
    let created = repository::insert(db, row).await?;
    Ok(created.id)
}

/// Finds a menu by id.
pub async fn get_menu_by_id(db: &DatabaseConnection, id: i64) -> Result<Option<menu::Model>> {
    repository::find_by_id::<Menu, _>(db, id).await
}

/// Lists menus in start-time order.
pub async fn list_menus(db: &DatabaseConnection, filter: MenuFilter) -> Result<Vec<menu::Model>> {
    let mut query = Menu::find();
    if let Some(configuration_id) = filter.menu_configuration_id {
        query = query.filter(menu::Column::MenuConfigurationId.eq(configuration_id));
    }

    query
        .order_by_asc(menu::Column::StartTime)
        .order_by_asc(menu::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Applies `patch` to a menu, always refreshing `updated_at`.
pub async fn update_menu(db: &DatabaseConnection, id: i64, patch: MenuPatch) -> Result<()> {
    if let Some(name) = &patch.name
        && name.trim().is_empty()
    {
        return Err(Error::Validation {
            field: "name",
            message: format!("menu {id} cannot be renamed to an empty name"),
        });
    }
    repository::apply_patch(db, id, patch.into_active_model(now_unix())).await
}

/// Deletes a menu together with its menu items.
///
/// Menus own their menu items but the store declares no cascade, so the items are
/// removed explicitly in the same unit of work.
#[instrument(skip(db))]
pub async fn delete_menu(db: &DatabaseConnection, id: i64) -> Result<()> {
    let txn = db.begin().await?;
    menu_item::delete_menu_items_by_menu_id(&txn, id).await?;
    repository::delete_by_id::<Menu, _>(&txn, id).await?;
    txn.commit().await?;
    Ok(())
}

/// Inserts or replaces many menus in one unit of work.
pub async fn bulk_upsert_menus(db: &DatabaseConnection, menus: Vec<NewMenu>) -> Result<usize> {
    let now = now_unix();
    let rows = menus
        .into_iter()
        .map(|menu| menu.into_active_model(now))
        .collect::<Result<Vec<_>>>()?;
    repository::bulk_upsert(db, rows).await
}

/// Price attached to an item inside a remote menu response
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingAggregate {
    /// Remote pricing id
    pub id: i64,
    /// Unit price
    pub price: f64,
    /// Currency code; the configured default applies when absent
    pub currency: Option<String>,
}

/// Catalog item nested in a remote menu response, with its optional price
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemAggregate {
    /// Item columns
    #[serde(flatten)]
    pub item: NewItem,
    /// Current price, if the remote service sent one
    pub pricing: Option<PricingAggregate>,
}

/// Menu item nested in a remote menu response, with its item
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuItemAggregate {
    /// Association columns
    #[serde(flatten)]
    pub menu_item: NewMenuItem,
    /// The offered item
    pub item: ItemAggregate,
}

/// A complete remote menu response
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuAggregate {
    /// Menu columns
    #[serde(flatten)]
    pub menu: NewMenu,
    /// The meal slot the menu belongs to
    pub menu_configuration: NewMenuConfiguration,
    /// Offered items
    #[serde(default)]
    pub menu_items: Vec<MenuItemAggregate>,
}

/// Persists a complete menu aggregate in one unit of work and returns the menu id.
///
/// Order of writes: configuration, menu, then per menu item its item, pricing
/// and association. Upserts make the call idempotent: saving the same aggregate
/// twice leaves the same rows as saving it once. A menu without an explicit
/// configuration id takes the nested configuration's id.
///
/// # Errors
/// Returns [`Error::AggregateWrite`] wrapping the failing step; nothing from the
/// aggregate is persisted in that case.
#[instrument(skip(db, aggregate), fields(menu_id = aggregate.menu.id))]
pub async fn save_complete_menu(
    db: &DatabaseConnection,
    aggregate: MenuAggregate,
    default_currency: &str,
) -> Result<i64> {
    let menu_id = aggregate.menu.id;
    let item_count = aggregate.menu_items.len();

    let txn = db
        .begin()
        .await
        .map_err(|e| Error::from(e).in_aggregate("menu", Some(menu_id)))?;
    write_menu_aggregate(&txn, aggregate, default_currency)
        .await
        .map_err(|e| e.in_aggregate("menu", Some(menu_id)))?;
    txn.commit()
        .await
        .map_err(|e| Error::from(e).in_aggregate("menu", Some(menu_id)))?;

    info!("Saved menu {} with {} menu items", menu_id, item_count);
    Ok(menu_id)
}

async fn write_menu_aggregate(
    txn: &DatabaseTransaction,
    aggregate: MenuAggregate,
    default_currency: &str,
) -> Result<()> {
    let now = now_unix();
    let MenuAggregate {
        mut menu,
        menu_configuration,
        menu_items,
    } = aggregate;

    if menu.menu_configuration_id.is_none() {
        menu.menu_configuration_id = Some(menu_configuration.id);
    }

    let menu_id = menu.id;
    repository::upsert(txn, menu_configuration.into_active_model()).await?;
    repository::upsert(txn, menu.into_active_model(now)?).await?;

    for MenuItemAggregate { menu_item, item } in menu_items {
        let ItemAggregate { item, pricing } = item;
        if menu_item.menu_id != menu_id {
            return Err(Error::Validation {
                field: "menu_id",
                message: format!(
                    "menu item {} belongs to menu {}, not {menu_id}",
                    menu_item.id, menu_item.menu_id
                ),
            });
        }
        if item.id != menu_item.item_id {
            return Err(Error::Validation {
                field: "item_id",
                message: format!(
                    "menu item {} references item {} but carries item {}",
                    menu_item.id, menu_item.item_id, item.id
                ),
            });
        }

        let item_id = item.id;
        repository::upsert(txn, item.into_active_model(now)).await?;

        if let Some(pricing) = pricing {
            let row = NewItemPricing {
                id: pricing.id,
                item_id,
                price: pricing.price,
                currency: pricing.currency,
            }
            .into_active_model(default_currency, now)?;
            repository::upsert(txn, row).await?;
        }

        debug!("Writing menu item {} (item {})", menu_item.id, item_id);
        repository::upsert(txn, menu_item.into_active_model(now)?).await?;
    }

    Ok(())
}
