//! Order business logic - Orders synced with the remote service.
//!
//! Orders carry remote ids. Deleting an order removes its lines through the
//! store's cascade on `order_items.order_id`.

use crate::{
    core::{
        order_item::{self, NewOrderItem},
        repository::{self, now_unix, set_if_some},
    },
    entities::{Order, order},
    errors::{Error, Result},
};
use sea_orm::{DatabaseTransaction, QueryOrder, Set, TransactionTrait, prelude::*};
use serde::Deserialize;
use tracing::{info, instrument};

/// An order as placed locally or received from the remote service
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrder {
    /// Remote identifier
    pub id: i64,
    /// Customer who placed the order
    pub user_id: i64,
    /// Order total as reported by the remote service
    pub total_amount: f64,
    /// Defaults to `"pending"`
    pub status: Option<String>,
    /// Canteen the order was placed at
    pub canteen_id: i64,
    /// Meal slot the order belongs to
    pub menu_configuration_id: Option<i64>,
    /// Token encoded in the order's QR code
    pub qr_code: Option<String>,
    /// Staff member who created the order
    pub created_by_id: Option<i64>,
    /// Staff member who last changed it
    pub updated_by_id: Option<i64>,
    /// Whether the remote service already holds this order
    #[serde(default)]
    pub is_synced: bool,
    /// Defaults to now
    pub created_at: Option<i64>,
    /// Defaults to now
    pub updated_at: Option<i64>,
}

impl NewOrder {
    fn into_active_model(self, now: i64) -> Result<order::ActiveModel> {
        if !self.total_amount.is_finite() || self.total_amount < 0.0 {
            return Err(Error::Validation {
                field: "total_amount",
                message: format!(
                    "{} is not a valid total for order {}",
                    self.total_amount, self.id
                ),
            });
        }

        Ok(order::ActiveModel {
            id: Set(self.id),
            user_id: Set(self.user_id),
            total_amount: Set(self.total_amount),
            status: Set(self.status.unwrap_or_else(|| "pending".to_string())),
            canteen_id: Set(self.canteen_id),
            menu_configuration_id: Set(self.menu_configuration_id),
            qr_code: Set(self.qr_code),
            created_by_id: Set(self.created_by_id),
            updated_by_id: Set(self.updated_by_id),
            is_synced: Set(self.is_synced),
            created_at: Set(self.created_at.unwrap_or(now)),
            updated_at: Set(self.updated_at.unwrap_or(now)),
        })
    }
}

/// Fields of an order that may change; `None` leaves a column untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderPatch {
    /// Customer who placed the order
    pub user_id: Option<i64>,
    /// New order total
    pub total_amount: Option<f64>,
    /// New status
    pub status: Option<String>,
    /// Canteen serving the order
    pub canteen_id: Option<i64>,
    /// Meal slot; `Some(None)` clears it
    pub menu_configuration_id: Option<Option<i64>>,
    /// Pickup QR payload; `Some(None)` clears it
    pub qr_code: Option<Option<String>>,
    /// Staff member making the change
    pub updated_by_id: Option<Option<i64>>,
    /// Whether the server has acknowledged the order
    pub is_synced: Option<bool>,
}

impl OrderPatch {
    fn into_active_model(self, now: i64) -> order::ActiveModel {
        order::ActiveModel {
            user_id: set_if_some(self.user_id),
            total_amount: set_if_some(self.total_amount),
            status: set_if_some(self.status),
            canteen_id: set_if_some(self.canteen_id),
            menu_configuration_id: set_if_some(self.menu_configuration_id),
            qr_code: set_if_some(self.qr_code),
            updated_by_id: set_if_some(self.updated_by_id),
            is_synced: set_if_some(self.is_synced),
            updated_at: Set(now),
            ..Default::default()
        }
    }
}

/// Optional filters for [`list_orders`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OrderFilter {
    /// Only orders placed by this user
    pub user_id: Option<i64>,
    /// Only synced (`true`) or unsynced (`false`) orders
    pub is_synced: Option<bool>,
}

/// Creates an order and returns its id.
pub async fn create_order(db: &DatabaseConnection, new_order: NewOrder) -> Result<i64> {
    let row = new_order.into_active_model(now_unix())?;
    let created = repository::insert(db, row).await?;
    Ok(created.id)
}

/// Finds an order by id.
pub async fn get_order_by_id(db: &DatabaseConnection, id: i64) -> Result<Option<order::Model>> {
    repository::find_by_id::<Order, _>(db, id).await
}

/// Lists orders, newest first.
pub async fn list_orders(
    db: &DatabaseConnection,
    filter: OrderFilter,
) -> Result<Vec<order::Model>> {
    let mut query = Order::find();
    if let Some(user_id) = filter.user_id {
        query = query.filter(order::Column::UserId.eq(user_id));
    }
    if let Some(is_synced) = filter.is_synced {
        query = query.filter(order::Column::IsSynced.eq(is_synced));
    }

    query
        .order_by_desc(order::Column::CreatedAt)
        .order_by_desc(order::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Applies `patch` to an order, always refreshing `updated_at`.
pub async fn update_order(db: &DatabaseConnection, id: i64, patch: OrderPatch) -> Result<()> {
    if let Some(total) = patch.total_amount
        && (!total.is_finite() || total < 0.0)
    {
        return Err(Error::Validation {
            field: "total_amount",
            message: format!("{total} is not a valid total for order {id}"),
        });
    }
    repository::apply_patch(db, id, patch.into_active_model(now_unix())).await
}

/// Marks an order as accepted by the remote service.
pub async fn mark_order_synced(db: &DatabaseConnection, id: i64) -> Result<()> {
    update_order(
        db,
        id,
        OrderPatch {
            is_synced: Some(true),
            ..Default::default()
        },
    )
    .await
}

/// Deletes an order; its lines go with it.
pub async fn delete_order(db: &DatabaseConnection, id: i64) -> Result<()> {
    repository::delete_by_id::<Order, _>(db, id).await
}

/// Inserts or replaces many orders in one unit of work.
///
/// Existing lines of a replaced order are kept.
pub async fn bulk_upsert_orders(db: &DatabaseConnection, orders: Vec<NewOrder>) -> Result<usize> {
    let now = now_unix();
    let rows = orders
        .into_iter()
        .map(|order| order.into_active_model(now))
        .collect::<Result<Vec<_>>>()?;
    repository::bulk_upsert(db, rows).await
}

/// A remote order response together with its lines
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderAggregate {
    /// Order columns
    #[serde(flatten)]
    pub order: NewOrder,
    /// Lines of the order; their `order_id` is replaced by the order's id
    #[serde(default)]
    pub order_items: Vec<NewOrderItem>,
}

/// Persists a remote order and replaces its lines in one unit of work.
///
/// The order is stored as synced. Lines stored earlier for the same order are
/// removed before the given ones are inserted.
///
/// # Errors
/// Returns [`Error::AggregateWrite`] wrapping the failing step; the previous state
/// of the order is left untouched in that case.
#[instrument(skip(db, aggregate), fields(order_id = aggregate.order.id))]
pub async fn save_complete_order(
    db: &DatabaseConnection,
    aggregate: OrderAggregate,
) -> Result<i64> {
    let order_id = aggregate.order.id;
    let line_count = aggregate.order_items.len();

    let txn = db
        .begin()
        .await
        .map_err(|e| Error::from(e).in_aggregate("order", Some(order_id)))?;
    write_order_aggregate(&txn, aggregate)
        .await
        .map_err(|e| e.in_aggregate("order", Some(order_id)))?;
    txn.commit()
        .await
        .map_err(|e| Error::from(e).in_aggregate("order", Some(order_id)))?;

    info!("Saved order {} with {} items", order_id, line_count);
    Ok(order_id)
}

async fn write_order_aggregate(
    txn: &DatabaseTransaction,
    aggregate: OrderAggregate,
) -> Result<()> {
    let now = now_unix();
    let OrderAggregate {
        mut order,
        order_items,
    } = aggregate;
    let order_id = order.id;
    order.is_synced = true;

    repository::upsert(txn, order.into_active_model(now)?).await?;
    order_item::delete_order_items_by_order_id(txn, order_id).await?;

    for mut line in order_items {
        line.order_id = order_id;
        repository::insert(txn, line.into_active_model(now)?).await?;
    }
    Ok(())
}
