//! Walk-in item business logic - Lines of walk-in orders.
//!
//! Each write here runs in a unit of work that ends with
//! [`calculate_walkin_totals`] for every walk-in it touched, so the parent's
//! amounts never disagree with its lines.

use crate::{
    core::{
        repository::{self, line_total, now_unix, set_if_some},
        walkin::calculate_walkin_totals,
    },
    entities::{Walkin, WalkinItem, WalkinItemStatus, walkin_item},
    errors::Result,
};
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use serde::Deserialize;
use std::collections::BTreeSet;
use tracing::instrument;

/// One line of a walk-in order, before it is attached to a walk-in
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalkinLine {
    /// Menu item the line was picked from
    pub menu_item_id: i64,
    /// Item name at order time
    pub item_name: String,
    /// Units ordered
    pub quantity: i32,
    /// Unit price at order time
    pub unit_price: f64,
    /// Kitchen instructions
    pub special_instructions: Option<String>,
    /// Kitchen progress of the line
    #[serde(default)]
    pub status: WalkinItemStatus,
}

impl WalkinLine {
    pub(crate) fn into_active_model(
        self,
        walkin_id: i64,
        now: i64,
    ) -> Result<walkin_item::ActiveModel> {
        let total_price = line_total(self.unit_price, self.quantity)?;

        Ok(walkin_item::ActiveModel {
            walkin_id: Set(walkin_id),
            menu_item_id: Set(self.menu_item_id),
            item_name: Set(self.item_name),
            quantity: Set(self.quantity),
            unit_price: Set(self.unit_price),
            total_price: Set(total_price),
            special_instructions: Set(self.special_instructions),
            status: Set(self.status),
            created_at: Set(now),
            ..Default::default()
        })
    }
}

/// Fields of a walk-in line that may change; `None` leaves a column untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WalkinItemPatch {
    /// Menu item the line was picked from
    pub menu_item_id: Option<i64>,
    /// Item name at order time
    pub item_name: Option<String>,
    /// Units ordered
    pub quantity: Option<i32>,
    /// Unit price at order time
    pub unit_price: Option<f64>,
    /// Kitchen instructions; `Some(None)` clears them
    pub special_instructions: Option<Option<String>>,
    /// Kitchen progress of the line
    pub status: Option<WalkinItemStatus>,
}

/// Adds a line to an existing walk-in and returns the line id.
///
/// # Errors
/// Returns [`crate::errors::Error::NotFound`] if the walk-in does not exist.
#[instrument(skip(db, line))]
pub async fn create_walkin_item(
    db: &DatabaseConnection,
    walkin_id: i64,
    line: WalkinLine,
) -> Result<i64> {
    let row = line.into_active_model(walkin_id, now_unix())?;

    let txn = db.begin().await?;
    repository::ensure_exists::<Walkin, _>(&txn, walkin_id).await?;
    let created = repository::insert(&txn, row).await?;
    calculate_walkin_totals(&txn, walkin_id).await?;
    txn.commit().await?;
    Ok(created.id)
}

/// Finds a walk-in line by id.
pub async fn get_walkin_item_by_id(
    db: &DatabaseConnection,
    id: i64,
) -> Result<Option<walkin_item::Model>> {
    repository::find_by_id::<WalkinItem, _>(db, id).await
}

/// Lists the lines of a walk-in in the order they were entered.
pub async fn get_walkin_items(
    db: &DatabaseConnection,
    walkin_id: i64,
) -> Result<Vec<walkin_item::Model>> {
    WalkinItem::find()
        .filter(walkin_item::Column::WalkinId.eq(walkin_id))
        .order_by_asc(walkin_item::Column::CreatedAt)
        .order_by_asc(walkin_item::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Applies `patch` to a walk-in line and refreshes the walk-in's totals.
///
/// Changing the unit price or the quantity recomputes `total_price`.
#[instrument(skip(db))]
pub async fn update_walkin_item(
    db: &DatabaseConnection,
    id: i64,
    patch: WalkinItemPatch,
) -> Result<()> {
    let txn = db.begin().await?;
    let current = repository::get_by_id::<WalkinItem, _>(&txn, id).await?;
    let total_price = line_total(
        patch.unit_price.unwrap_or(current.unit_price),
        patch.quantity.unwrap_or(current.quantity),
    )?;

    let row = walkin_item::ActiveModel {
        menu_item_id: set_if_some(patch.menu_item_id),
        item_name: set_if_some(patch.item_name),
        quantity: set_if_some(patch.quantity),
        unit_price: set_if_some(patch.unit_price),
        special_instructions: set_if_some(patch.special_instructions),
        status: set_if_some(patch.status),
        total_price: Set(total_price),
        ..Default::default()
    };
    repository::apply_patch(&txn, id, row).await?;
    calculate_walkin_totals(&txn, current.walkin_id).await?;
    txn.commit().await?;
    Ok(())
}

/// Removes a line and refreshes the walk-in's totals.
#[instrument(skip(db))]
pub async fn delete_walkin_item(db: &DatabaseConnection, id: i64) -> Result<()> {
    let txn = db.begin().await?;
    let current = repository::get_by_id::<WalkinItem, _>(&txn, id).await?;
    repository::delete_by_id::<WalkinItem, _>(&txn, id).await?;
    calculate_walkin_totals(&txn, current.walkin_id).await?;
    txn.commit().await?;
    Ok(())
}

/// Inserts or replaces many stored lines in one unit of work.
///
/// `total_price` is recomputed for every row, then the totals of every walk-in
/// the rows belong to, including the previous owner of a moved line.
#[instrument(skip(db, items))]
pub async fn bulk_upsert_walkin_items(
    db: &DatabaseConnection,
    items: Vec<walkin_item::Model>,
) -> Result<usize> {
    if items.is_empty() {
        return Ok(0);
    }

    let row_ids: Vec<i64> = items.iter().map(|item| item.id).collect();
    let mut walkin_ids = BTreeSet::new();
    let mut rows = Vec::with_capacity(items.len());
    for item in items {
        let total_price = line_total(item.unit_price, item.quantity)?;
        walkin_ids.insert(item.walkin_id);
        rows.push(walkin_item::ActiveModel {
            id: Set(item.id),
            walkin_id: Set(item.walkin_id),
            menu_item_id: Set(item.menu_item_id),
            item_name: Set(item.item_name),
            quantity: Set(item.quantity),
            unit_price: Set(item.unit_price),
            total_price: Set(total_price),
            special_instructions: Set(item.special_instructions),
            status: Set(item.status),
            created_at: Set(item.created_at),
        });
    }

    let txn = db.begin().await?;
    let previous = WalkinItem::find()
        .filter(walkin_item::Column::Id.is_in(row_ids))
        .all(&txn)
        .await?;
    walkin_ids.extend(previous.into_iter().map(|item| item.walkin_id));

    let count = repository::upsert_all(&txn, rows).await?;
    for walkin_id in walkin_ids {
        calculate_walkin_totals(&txn, walkin_id).await?;
    }
    txn.commit().await?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::core::walkin::{create_walkin, get_walkin_by_id};
    use crate::errors::Error;
    use crate::test_utils::*;

    async fn walkin_totals(db: &DatabaseConnection, id: i64) -> Result<(f64, f64)> {
        let walkin = get_walkin_by_id(db, id).await?.unwrap();
        Ok((walkin.total_amount, walkin.final_amount))
    }

    #[tokio::test]
    async fn test_every_mutation_refreshes_totals() -> Result<()> {
        let db = setup_test_db().await?;
        let walkin_id = create_walkin(&db, test_walkin("Asha")).await?;

        let dosa = create_walkin_item(&db, walkin_id, test_walkin_line(1, 50.0, 2)).await?;
        let coffee = create_walkin_item(&db, walkin_id, test_walkin_line(2, 20.0, 1)).await?;
        assert_eq!(walkin_totals(&db, walkin_id).await?, (120.0, 120.0));

        update_walkin_item(
            &db,
            dosa,
            WalkinItemPatch {
                quantity: Some(3),
                ..Default::default()
            },
        )
        .await?;
        assert_eq!(get_walkin_item_by_id(&db, dosa).await?.unwrap().total_price, 150.0);
        assert_eq!(walkin_totals(&db, walkin_id).await?, (170.0, 170.0));

        delete_walkin_item(&db, coffee).await?;
        assert_eq!(walkin_totals(&db, walkin_id).await?, (150.0, 150.0));
        Ok(())
    }

    #[tokio::test]
    async fn test_status_only_update_keeps_totals() -> Result<()> {
        let db = setup_test_db().await?;
        let walkin_id = create_walkin(&db, test_walkin("Asha")).await?;
        let id = create_walkin_item(&db, walkin_id, test_walkin_line(1, 50.0, 2)).await?;

        update_walkin_item(
            &db,
            id,
            WalkinItemPatch {
                status: Some(WalkinItemStatus::Served),
                special_instructions: Some(Some("Extra chutney".to_string())),
                ..Default::default()
            },
        )
        .await?;

        let stored = get_walkin_item_by_id(&db, id).await?.unwrap();
        assert_eq!(stored.status, WalkinItemStatus::Served);
        assert_eq!(stored.total_price, 100.0);
        assert_eq!(walkin_totals(&db, walkin_id).await?, (100.0, 100.0));
        Ok(())
    }

    #[tokio::test]
    async fn test_create_for_missing_walkin() -> Result<()> {
        let db = setup_test_db().await?;

        let result = create_walkin_item(&db, 42, test_walkin_line(1, 50.0, 2)).await;
        assert!(matches!(
            result,
            Err(Error::NotFound {
                entity: "walkin",
                id: 42
            })
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_items_listed_in_entry_order() -> Result<()> {
        let db = setup_test_db().await?;
        let walkin_id = create_walkin(&db, test_walkin("Asha")).await?;
        let other = create_walkin(&db, test_walkin("Ravi")).await?;
        create_walkin_item(&db, walkin_id, test_walkin_line(1, 50.0, 1)).await?;
        create_walkin_item(&db, other, test_walkin_line(2, 50.0, 1)).await?;
        create_walkin_item(&db, walkin_id, test_walkin_line(3, 50.0, 1)).await?;

        let items = get_walkin_items(&db, walkin_id).await?;
        let menu_items: Vec<i64> = items.iter().map(|i| i.menu_item_id).collect();
        assert_eq!(menu_items, vec![1, 3]);
        Ok(())
    }

    #[tokio::test]
    async fn test_bulk_upsert_moves_line_and_refreshes_both_walkins() -> Result<()> {
        let db = setup_test_db().await?;
        let first = create_walkin(&db, test_walkin("Asha")).await?;
        let second = create_walkin(&db, test_walkin("Ravi")).await?;
        let id = create_walkin_item(&db, first, test_walkin_line(1, 50.0, 2)).await?;

        let mut moved = get_walkin_item_by_id(&db, id).await?.unwrap();
        moved.walkin_id = second;
        moved.quantity = 3;
        moved.total_price = 0.0;
        assert_eq!(bulk_upsert_walkin_items(&db, vec![moved]).await?, 1);

        assert_eq!(get_walkin_item_by_id(&db, id).await?.unwrap().total_price, 150.0);
        assert_eq!(walkin_totals(&db, first).await?, (0.0, 0.0));
        assert_eq!(walkin_totals(&db, second).await?, (150.0, 150.0));
        Ok(())
    }
}
