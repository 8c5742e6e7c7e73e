//! Order item entity - A line of an order.
//!
//! `item_name` and `price` are snapshots taken when the order was placed, so the
//! line keeps its historical price even if the catalog changes. `total` is always
//! `price * quantity`.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Order item database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "order_items")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    /// Remote identifier
    #[sea_orm(primary_key, auto_increment = false)]
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
    /// `price * quantity`
    pub total: f64,
    /// Staff member who created the line
    pub created_by_id: Option<i64>,
    /// Staff member who last changed it
    pub updated_by_id: Option<i64>,
    /// Creation time (Unix seconds)
    pub created_at: i64,
    /// Last modification time (Unix seconds)
    pub updated_at: i64,
}

/// Defines relationships between `OrderItem` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each line belongs to one order and disappears with it
    #[sea_orm(
        belongs_to = "super::order::Entity",
        from = "Column::OrderId",
        to = "super::order::Column::Id",
        on_delete = "Cascade"
    )]
    Order,
}

impl Related<super::order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Order.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
