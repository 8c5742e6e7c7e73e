//! Order item business logic - Lines of placed orders.
//!
//! `total` is never accepted from callers: every write path derives it as
//! `price * quantity` from the values being stored.

use crate::{
    core::repository::{self, line_total, now_unix, set_if_some},
    entities::{OrderItem, order_item},
    errors::Result,
};
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use serde::Deserialize;
use tracing::{debug, instrument};

/// An order line as created locally or received from the remote service
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrderItem {
    /// Remote identifier
    pub id: i64,
    /// Owning order
    pub order_id: i64,
    /// Catalog item that was ordered
    pub item_id: i64,
    /// Item name at order time
    pub item_name: String,
    /// Units ordered
    pub quantity: i32,
    /// Unit price at order time
    pub price: f64,
    /// Staff member who created the line
    pub created_by_id: Option<i64>,
    /// Staff member who last changed it
    pub updated_by_id: Option<i64>,
    /// Defaults to now
    pub created_at: Option<i64>,
    /// Defaults to now
    pub updated_at: Option<i64>,
}

impl NewOrderItem {
    pub(crate) fn into_active_model(self, now: i64) -> Result<order_item::ActiveModel> {
        let total = line_total(self.price, self.quantity)?;

        Ok(order_item::ActiveModel {
            id: Set(self.id),
            order_id: Set(self.order_id),
            item_id: Set(self.item_id),
            item_name: Set(self.item_name),
            quantity: Set(self.quantity),
            price: Set(self.price),
            total: Set(total),
            created_by_id: Set(self.created_by_id),
            updated_by_id: Set(self.updated_by_id),
            created_at: Set(self.created_at.unwrap_or(now)),
            updated_at: Set(self.updated_at.unwrap_or(now)),
        })
    }
}

/// Fields of an order line that may change; `None` leaves a column untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderItemPatch {
    /// Catalog item ordered
    pub item_id: Option<i64>,
    /// Item name at order time
    pub item_name: Option<String>,
    /// Units ordered
    pub quantity: Option<i32>,
    /// Unit price
    pub price: Option<f64>,
    /// Staff member making the change
    pub updated_by_id: Option<Option<i64>>,
}

impl OrderItemPatch {
    fn touches_total(&self) -> bool {
        self.quantity.is_some() || self.price.is_some()
    }

    fn into_active_model(self, now: i64) -> order_item::ActiveModel {
        order_item::ActiveModel {
            item_id: set_if_some(self.item_id),
            item_name: set_if_some(self.item_name),
            quantity: set_if_some(self.quantity),
            price: set_if_some(self.price),
            updated_by_id: set_if_some(self.updated_by_id),
            updated_at: Set(now),
            ..Default::default()
        }
    }
}

/// Creates an order line and returns its id.
///
/// # Errors
/// Returns [`crate::errors::Error::Write`] if the owning order does not exist.
pub async fn create_order_item(db: &DatabaseConnection, new_item: NewOrderItem) -> Result<i64> {
    let row = new_item.into_active_model(now_unix())?;
    let created = repository::insert(db, row).await?;
    Ok(created.id)
}

/// Finds an order line by id.
pub async fn get_order_item_by_id(
    db: &DatabaseConnection,
    id: i64,
) -> Result<Option<order_item::Model>> {
    repository::find_by_id::<OrderItem, _>(db, id).await
}

/// Lists order lines, optionally only those of one order.
pub async fn get_order_items<C: ConnectionTrait>(
    db: &C,
    order_id: Option<i64>,
) -> Result<Vec<order_item::Model>> {
    let mut query = OrderItem::find();
    if let Some(order_id) = order_id {
        query = query.filter(order_item::Column::OrderId.eq(order_id));
    }

    query
        .order_by_asc(order_item::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Applies `patch` to an order line, always refreshing `updated_at`.
///
/// Changing the price or the quantity recomputes `total` from the resulting pair.
#[instrument(skip(db))]
pub async fn update_order_item(
    db: &DatabaseConnection,
    id: i64,
    patch: OrderItemPatch,
) -> Result<()> {
    if !patch.touches_total() {
        return repository::apply_patch(db, id, patch.into_active_model(now_unix())).await;
    }

    let txn = db.begin().await?;
    let current = repository::get_by_id::<OrderItem, _>(&txn, id).await?;
    let total = line_total(
        patch.price.unwrap_or(current.price),
        patch.quantity.unwrap_or(current.quantity),
    )?;

    let mut row = patch.into_active_model(now_unix());
    row.total = Set(total);
    repository::apply_patch(&txn, id, row).await?;
    txn.commit().await?;
    Ok(())
}

/// Deletes an order line.
pub async fn delete_order_item(db: &DatabaseConnection, id: i64) -> Result<()> {
    repository::delete_by_id::<OrderItem, _>(db, id).await
}

/// Deletes every line of an order and returns how many were removed.
pub async fn delete_order_items_by_order_id<C: ConnectionTrait>(
    db: &C,
    order_id: i64,
) -> Result<u64> {
    let result = OrderItem::delete_many()
        .filter(order_item::Column::OrderId.eq(order_id))
        .exec(db)
        .await?;
    debug!("Deleted {} items of order {}", result.rows_affected, order_id);
    Ok(result.rows_affected)
}

/// Inserts or replaces many order lines in one unit of work.
pub async fn bulk_upsert_order_items(
    db: &DatabaseConnection,
    items: Vec<NewOrderItem>,
) -> Result<usize> {
    let now = now_unix();
    let rows = items
        .into_iter()
        .map(|item| item.into_active_model(now))
        .collect::<Result<Vec<_>>>()?;
    repository::bulk_upsert(db, rows).await
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::core::order::create_order;
    use crate::errors::Error;
    use crate::test_utils::*;

    #[tokio::test]
    async fn test_create_computes_total() -> Result<()> {
        let db = setup_test_db().await?;
        create_order(&db, test_order(1, 7)).await?;

        let id = create_order_item(&db, test_order_item(1, 1, 60.0, 3)).await?;
        let stored = get_order_item_by_id(&db, id).await?.unwrap();
        assert_eq!(stored.total, 180.0);
        assert_eq!(stored.item_name, "item 1");
        Ok(())
    }

    #[tokio::test]
    async fn test_create_requires_existing_order() -> Result<()> {
        let db = setup_test_db().await?;

        let result = create_order_item(&db, test_order_item(1, 99, 60.0, 1)).await;
        assert!(matches!(result, Err(Error::Write { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_update_recomputes_total() -> Result<()> {
        let db = setup_test_db().await?;
        create_order(&db, test_order(1, 7)).await?;
        create_order_item(&db, test_order_item(1, 1, 60.0, 3)).await?;

        update_order_item(
            &db,
            1,
            OrderItemPatch {
                quantity: Some(5),
                ..Default::default()
            },
        )
        .await?;
        assert_eq!(get_order_item_by_id(&db, 1).await?.unwrap().total, 300.0);

        update_order_item(
            &db,
            1,
            OrderItemPatch {
                price: Some(10.0),
                ..Default::default()
            },
        )
        .await?;
        let stored = get_order_item_by_id(&db, 1).await?.unwrap();
        assert_eq!(stored.quantity, 5);
        assert_eq!(stored.total, 50.0);

        let invalid = update_order_item(
            &db,
            1,
            OrderItemPatch {
                quantity: Some(0),
                ..Default::default()
            },
        )
        .await;
        assert!(matches!(invalid, Err(Error::Validation { .. })));
        assert_eq!(get_order_item_by_id(&db, 1).await?.unwrap().total, 50.0);
        Ok(())
    }

    #[tokio::test]
    async fn test_items_by_order_and_bulk_delete() -> Result<()> {
        let db = setup_test_db().await?;
        create_order(&db, test_order(1, 7)).await?;
        create_order(&db, test_order(2, 7)).await?;
        bulk_upsert_order_items(
            &db,
            vec![
                test_order_item(1, 1, 10.0, 1),
                test_order_item(2, 1, 20.0, 1),
                test_order_item(3, 2, 30.0, 1),
            ],
        )
        .await?;

        assert_eq!(get_order_items(&db, None).await?.len(), 3);
        assert_eq!(get_order_items(&db, Some(1)).await?.len(), 2);
        assert_eq!(delete_order_items_by_order_id(&db, 1).await?, 2);
        assert!(get_order_items(&db, Some(1)).await?.is_empty());

        delete_order_item(&db, 3).await?;
        assert!(delete_order_item(&db, 3).await.unwrap_err().is_not_found());
        Ok(())
    }
}
