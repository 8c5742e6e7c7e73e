//! Order entity - A placed order, synced from or to the remote service.
//!
//! Deleting an order cascades to its [`super::order_item`] rows.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Order database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "orders")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    /// Remote identifier
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: i64,
    /// Customer who placed the order
    pub user_id: i64,
    /// Order total as reported by the remote service
    pub total_amount: f64,
    /// Free-form remote status, `"pending"` by default
    pub status: String,
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
    /// Whether the remote service has accepted this row
    pub is_synced: bool,
    /// Creation time (Unix seconds)
    pub created_at: i64,
    /// Last modification time (Unix seconds)
    pub updated_at: i64,
}

/// Defines relationships between Order and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One order has many line items
    #[sea_orm(has_many = "super::order_item::Entity")]
    OrderItems,
}

impl Related<super::order_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OrderItems.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
