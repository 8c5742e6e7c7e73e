//! Read projections - Nested menu views handed to the presentation layer.
//!
//! Output is wrapped in [`ApiResponse`] and serializes with the same camelCase
//! field names as the remote service responses the presentation layer already
//! consumes.

use crate::{
    core::{
        catalog::{get_items_by_ids, get_menu_configurations_by_ids, get_pricing_for_items},
        menu_item::get_menu_items_by_menu_id,
        repository,
    },
    entities::{Menu, item, item_pricing, menu, menu_configuration, menu_item},
    errors::{Error, Result},
};
use chrono::{DateTime, FixedOffset, TimeZone};
use sea_orm::{DatabaseConnection, EntityTrait, QueryOrder};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, instrument};

/// Group name for menus without a stored configuration
pub const UNCONFIGURED: &str = "Unconfigured";

/// Message/data envelope shared by every projection
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiResponse<T> {
    /// Human-readable outcome
    pub message: String,
    /// Projection payload
    pub data: T,
}

impl<T> ApiResponse<T> {
    fn new(message: &str, data: T) -> Self {
        Self {
            message: message.to_string(),
            data,
        }
    }
}

/// Meal slot as embedded in projections
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigurationSummary {
    /// Configuration id
    pub id: i64,
    /// Meal slot name
    pub name: String,
    /// Usual start (Unix seconds)
    pub default_start_time: i64,
    /// Usual end (Unix seconds)
    pub default_end_time: i64,
    /// `default_end_time` as local `HH:MM`
    pub formatted_default_end_time: String,
}

impl ConfigurationSummary {
    fn from_model(model: menu_configuration::Model, offset: &FixedOffset) -> Result<Self> {
        let formatted_default_end_time = local_time(offset, model.default_end_time)?
            .format("%H:%M")
            .to_string();
        Ok(Self {
            id: model.id,
            name: model.name,
            default_start_time: model.default_start_time,
            default_end_time: model.default_end_time,
            formatted_default_end_time,
        })
    }
}

/// Lightweight menu entry of [`get_all_menus_offline`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuSummary {
    /// Menu id
    pub id: i64,
    /// Display name
    pub name: String,
    /// Start (Unix seconds)
    pub start_time: i64,
    /// End (Unix seconds)
    pub end_time: i64,
    /// Meal slot, if stored
    pub menu_configuration: Option<ConfigurationSummary>,
}

/// Menus keyed by local calendar date (`YYYY-MM-DD`), then by configuration name
pub type MenusByDate = BTreeMap<String, BTreeMap<String, Vec<MenuSummary>>>;

/// Catalog item with its current price
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemDetail {
    /// Catalog item
    #[serde(flatten)]
    pub item: item::Model,
    /// Latest price, if any
    pub pricing: Option<item_pricing::Model>,
}

/// Menu item with its catalog item; `item` is `null` when the item is not stored
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuItemDetail {
    /// Stored menu item
    #[serde(flatten)]
    pub menu_item: menu_item::Model,
    /// Catalog item and price
    pub item: Option<ItemDetail>,
}

/// Full menu view of [`get_menu_items_by_id_offline`]
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuDetail {
    /// Stored menu
    #[serde(flatten)]
    pub menu: menu::Model,
    /// Meal slot, if stored
    pub menu_configuration: Option<ConfigurationSummary>,
    /// Offered items
    pub menu_items: Vec<MenuItemDetail>,
}

fn local_time(offset: &FixedOffset, timestamp: i64) -> Result<DateTime<FixedOffset>> {
    offset
        .timestamp_opt(timestamp, 0)
        .single()
        .ok_or_else(|| Error::Validation {
            field: "timestamp",
            message: format!("{timestamp} is out of range"),
        })
}

/// Groups every stored menu by the local date of its start time, then by the name
/// of its configuration.
///
/// Dates ascend; menus inside a group keep start-time order.
#[instrument(skip(db))]
pub async fn get_all_menus_offline(
    db: &DatabaseConnection,
    offset: &FixedOffset,
) -> Result<ApiResponse<MenusByDate>> {
    let menus = Menu::find()
        .order_by_asc(menu::Column::StartTime)
        .order_by_asc(menu::Column::Id)
        .all(db)
        .await?;

    let configuration_ids: Vec<i64> = menus
        .iter()
        .filter_map(|menu| menu.menu_configuration_id)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let configurations = get_menu_configurations_by_ids(db, &configuration_ids).await?;

    let mut grouped = MenusByDate::new();
    for menu in menus {
        let date = local_time(offset, menu.start_time)?
            .format("%Y-%m-%d")
            .to_string();
        let configuration = menu
            .menu_configuration_id
            .and_then(|id| configurations.get(&id))
            .cloned()
            .map(|model| ConfigurationSummary::from_model(model, offset))
            .transpose()?;
        let group = configuration
            .as_ref()
            .map_or_else(|| UNCONFIGURED.to_string(), |c| c.name.clone());

        let slot = grouped.entry(date).or_default().entry(group).or_default();
        slot.push(MenuSummary {
            id: menu.id,
            name: menu.name,
            start_time: menu.start_time,
            end_time: menu.end_time,
            menu_configuration: configuration,
        });
    }

    debug!("Grouped menus into {} dates", grouped.len());
    Ok(ApiResponse::new("Menus fetched successfully", grouped))
}

/// Loads one menu with its configuration and every menu item, each carrying its
/// item and current pricing.
///
/// Items and pricing are fetched with one batched query each.
///
/// # Errors
/// Returns [`Error::NotFound`] if the menu does not exist.
#[instrument(skip(db, offset))]
pub async fn get_menu_items_by_id_offline(
    db: &DatabaseConnection,
    menu_id: i64,
    offset: &FixedOffset,
) -> Result<ApiResponse<MenuDetail>> {
    let menu = repository::get_by_id::<Menu, _>(db, menu_id).await?;

    let menu_configuration = match menu.menu_configuration_id {
        Some(id) => get_menu_configurations_by_ids(db, &[id])
            .await?
            .remove(&id)
            .map(|model| ConfigurationSummary::from_model(model, offset))
            .transpose()?,
        None => None,
    };

    let menu_items = get_menu_items_by_menu_id(db, menu_id).await?;
    let item_ids: Vec<i64> = menu_items
        .iter()
        .map(|menu_item| menu_item.item_id)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let items = get_items_by_ids(db, &item_ids).await?;
    let pricing = get_pricing_for_items(db, &item_ids).await?;

    let menu_items: Vec<MenuItemDetail> = menu_items
        .into_iter()
        .map(|menu_item| {
            let item = items.get(&menu_item.item_id).cloned().map(|item| ItemDetail {
                pricing: pricing.get(&item.id).cloned(),
                item,
            });
            MenuItemDetail { menu_item, item }
        })
        .collect();

    debug!("Menu {} has {} menu items", menu_id, menu_items.len());
    Ok(ApiResponse::new(
        "Menu items fetched successfully",
        MenuDetail {
            menu,
            menu_configuration,
            menu_items,
        },
    ))
}
