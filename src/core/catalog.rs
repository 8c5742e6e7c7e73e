//! Catalog data synced down from the remote service: menu configurations, items and
//! item pricing.
//!
//! These rows are only ever written from remote responses, so every write here is an
//! upsert keyed by the remote id. The current-catalog price lives in `item_pricing`;
//! order and walk-in lines keep their own price snapshots.

use crate::{
    core::repository::{self, now_unix},
    entities::{
        Item, ItemPricing, MenuConfiguration, item, item_pricing, menu_configuration,
    },
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use serde::Deserialize;
use std::collections::HashMap;
use tracing::instrument;

/// A meal-slot template as received from the remote service
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMenuConfiguration {
    /// Remote identifier
    pub id: i64,
    /// Slot name (e.g. "Breakfast")
    pub name: String,
    /// Default opening time (Unix seconds)
    pub default_start_time: i64,
    /// Default closing time (Unix seconds)
    pub default_end_time: i64,
}

impl NewMenuConfiguration {
    pub(crate) fn into_active_model(self) -> menu_configuration::ActiveModel {
        menu_configuration::ActiveModel {
            id: Set(self.id),
            name: Set(self.name),
            default_start_time: Set(self.default_start_time),
            default_end_time: Set(self.default_end_time),
        }
    }
}

/// A catalog item as received from the remote service
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewItem {
    /// Remote identifier
    pub id: i64,
    /// Display name
    pub name: String,
    /// Optional free text
    pub description: Option<String>,
    /// Base64-encoded picture
    pub image: Option<String>,
    /// Defaults to `"active"`
    pub status: Option<String>,
    /// Creator on the remote side
    pub created_by_id: Option<i64>,
    /// Last editor on the remote side
    pub updated_by_id: Option<i64>,
    /// Defaults to now
    pub created_at: Option<i64>,
    /// Defaults to now
    pub updated_at: Option<i64>,
}

impl NewItem {
    pub(crate) fn into_active_model(self, now: i64) -> item::ActiveModel {
        item::ActiveModel {
            id: Set(self.id),
            name: Set(self.name),
            description: Set(self.description),
            image: Set(self.image),
            status: Set(self.status.unwrap_or_else(|| "active".to_string())),
            created_by_id: Set(self.created_by_id),
            updated_by_id: Set(self.updated_by_id),
            created_at: Set(self.created_at.unwrap_or(now)),
            updated_at: Set(self.updated_at.unwrap_or(now)),
        }
    }
}

/// A catalog price row
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewItemPricing {
    /// Remote identifier
    pub id: i64,
    /// Priced item
    pub item_id: i64,
    /// Unit price
    pub price: f64,
    /// Currency code; the configured default applies when absent
    pub currency: Option<String>,
}

impl NewItemPricing {
    pub(crate) fn into_active_model(
        self,
        default_currency: &str,
        now: i64,
    ) -> Result<item_pricing::ActiveModel> {
        if !self.price.is_finite() || self.price < 0.0 {
            return Err(Error::Validation {
                field: "price",
                message: format!(
                    "{} is not a valid price for item {}",
                    self.price, self.item_id
                ),
            });
        }

        Ok(item_pricing::ActiveModel {
            id: Set(self.id),
            item_id: Set(self.item_id),
            price: Set(self.price),
            currency: Set(self
                .currency
                .unwrap_or_else(|| default_currency.to_string())),
            created_at: Set(now),
            updated_at: Set(now),
        })
    }
}

/// Lists all menu configurations by name.
pub async fn list_menu_configurations(
    db: &DatabaseConnection,
) -> Result<Vec<menu_configuration::Model>> {
    MenuConfiguration::find()
        .order_by_asc(menu_configuration::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Finds a menu configuration by id.
pub async fn get_menu_configuration_by_id(
    db: &DatabaseConnection,
    id: i64,
) -> Result<Option<menu_configuration::Model>> {
    repository::find_by_id::<MenuConfiguration, _>(db, id).await
}

/// Loads the configurations with the given ids in one query, keyed by id.
pub async fn get_menu_configurations_by_ids<C: ConnectionTrait>(
    db: &C,
    ids: &[i64],
) -> Result<HashMap<i64, menu_configuration::Model>> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }

    let rows = MenuConfiguration::find()
        .filter(menu_configuration::Column::Id.is_in(ids.iter().copied()))
        .all(db)
        .await?;
    Ok(rows.into_iter().map(|row| (row.id, row)).collect())
}

/// Inserts or replaces a menu configuration.
pub async fn upsert_menu_configuration(
    db: &DatabaseConnection,
    configuration: NewMenuConfiguration,
) -> Result<()> {
    repository::upsert(db, configuration.into_active_model()).await
}

/// Inserts or replaces many menu configurations in one unit of work.
pub async fn bulk_upsert_menu_configurations(
    db: &DatabaseConnection,
    configurations: Vec<NewMenuConfiguration>,
) -> Result<usize> {
    let rows = configurations
        .into_iter()
        .map(NewMenuConfiguration::into_active_model)
        .collect();
    repository::bulk_upsert(db, rows).await
}

/// Deletes a menu configuration. Menus pointing at it keep their dangling id.
pub async fn delete_menu_configuration(db: &DatabaseConnection, id: i64) -> Result<()> {
    repository::delete_by_id::<MenuConfiguration, _>(db, id).await
}

/// Finds an item by id.
pub async fn get_item_by_id(db: &DatabaseConnection, id: i64) -> Result<Option<item::Model>> {
    repository::find_by_id::<Item, _>(db, id).await
}

/// Loads the items with the given ids in one query, keyed by id.
pub async fn get_items_by_ids<C: ConnectionTrait>(
    db: &C,
    ids: &[i64],
) -> Result<HashMap<i64, item::Model>> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }

    let rows = Item::find()
        .filter(item::Column::Id.is_in(ids.iter().copied()))
        .all(db)
        .await?;
    Ok(rows.into_iter().map(|row| (row.id, row)).collect())
}

/// Inserts or replaces many items in one unit of work.
pub async fn bulk_upsert_items(db: &DatabaseConnection, items: Vec<NewItem>) -> Result<usize> {
    let now = now_unix();
    let rows = items
        .into_iter()
        .map(|item| item.into_active_model(now))
        .collect();
    repository::bulk_upsert(db, rows).await
}

/// Deletes an item together with its pricing rows.
#[instrument(skip(db))]
pub async fn delete_item(db: &DatabaseConnection, id: i64) -> Result<()> {
    let txn = db.begin().await?;
    ItemPricing::delete_many()
        .filter(item_pricing::Column::ItemId.eq(id))
        .exec(&txn)
        .await?;
    repository::delete_by_id::<Item, _>(&txn, id).await?;
    txn.commit().await?;
    Ok(())
}

/// Loads the current pricing of each given item in one query, keyed by item id.
///
/// When an item has several pricing rows the one with the highest id wins.
pub async fn get_pricing_for_items<C: ConnectionTrait>(
    db: &C,
    item_ids: &[i64],
) -> Result<HashMap<i64, item_pricing::Model>> {
    if item_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let rows = ItemPricing::find()
        .filter(item_pricing::Column::ItemId.is_in(item_ids.iter().copied()))
        .order_by_asc(item_pricing::Column::Id)
        .all(db)
        .await?;

    // Later rows overwrite earlier ones
    Ok(rows.into_iter().map(|row| (row.item_id, row)).collect())
}

/// Inserts or replaces many pricing rows in one unit of work.
pub async fn bulk_upsert_item_pricing(
    db: &DatabaseConnection,
    pricing: Vec<NewItemPricing>,
    default_currency: &str,
) -> Result<usize> {
    let now = now_unix();
    let rows = pricing
        .into_iter()
        .map(|row| row.into_active_model(default_currency, now))
        .collect::<Result<Vec<_>>>()?;
    repository::bulk_upsert(db, rows).await
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::test_utils::*;

    fn pricing(id: i64, item_id: i64, price: f64) -> NewItemPricing {
        NewItemPricing {
            id,
            item_id,
            price,
            currency: None,
        }
    }

    #[tokio::test]
    async fn test_latest_pricing_row_wins() -> Result<()> {
        let db = setup_test_db().await?;
        bulk_upsert_items(&db, vec![test_item(2, "dosa")]).await?;
        bulk_upsert_item_pricing(
            &db,
            vec![pricing(10, 2, 70.0), pricing(11, 2, 80.0)],
            "INR",
        )
        .await?;

        let prices = get_pricing_for_items(&db, &[2]).await?;
        assert_eq!(prices.len(), 1);
        assert_eq!(prices[&2].price, 80.0);
        assert_eq!(prices[&2].currency, "INR");
        Ok(())
    }

    #[tokio::test]
    async fn test_negative_price_rejected() -> Result<()> {
        let db = setup_test_db().await?;

        let result = bulk_upsert_item_pricing(&db, vec![pricing(1, 2, -5.0)], "INR").await;
        assert!(matches!(result, Err(Error::Validation { field: "price", .. })));
        assert!(get_pricing_for_items(&db, &[2]).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_items_batch_lookup_skips_missing() -> Result<()> {
        let db = setup_test_db().await?;
        bulk_upsert_items(&db, vec![test_item(1, "idly"), test_item(2, "dosa")]).await?;

        let items = get_items_by_ids(&db, &[1, 2, 99]).await?;
        assert_eq!(items.len(), 2);
        assert_eq!(items[&1].name, "idly");
        assert_eq!(items[&1].status, "active");
        assert!(get_items_by_ids(&db, &[]).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_item_removes_pricing() -> Result<()> {
        let db = setup_test_db().await?;
        bulk_upsert_items(&db, vec![test_item(2, "dosa")]).await?;
        bulk_upsert_item_pricing(&db, vec![pricing(10, 2, 80.0)], "INR").await?;

        delete_item(&db, 2).await?;
        assert!(get_item_by_id(&db, 2).await?.is_none());
        assert!(get_pricing_for_items(&db, &[2]).await?.is_empty());

        let missing = delete_item(&db, 2).await;
        assert!(missing.unwrap_err().is_not_found());
        Ok(())
    }

    #[tokio::test]
    async fn test_menu_configurations_roundtrip() -> Result<()> {
        let db = setup_test_db().await?;
        bulk_upsert_menu_configurations(
            &db,
            vec![test_configuration(2, "Lunch"), test_configuration(1, "Breakfast")],
        )
        .await?;

        let all = list_menu_configurations(&db).await?;
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].name, "Breakfast");

        upsert_menu_configuration(&db, test_configuration(2, "Late Lunch")).await?;
        let lunch = get_menu_configuration_by_id(&db, 2).await?.unwrap();
        assert_eq!(lunch.name, "Late Lunch");

        delete_menu_configuration(&db, 1).await?;
        assert_eq!(list_menu_configurations(&db).await?.len(), 1);
        Ok(())
    }
}
