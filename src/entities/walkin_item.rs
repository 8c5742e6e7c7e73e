//! Walk-in item entity - A line of a walk-in order with its price snapshot.
//! `total_price` is always `unit_price * quantity`.

use super::status::WalkinItemStatus;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Walk-in item database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "walkin_items")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    /// Locally assigned identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Owning walk-in
    pub walkin_id: i64,
    /// Menu item the line was picked from
    pub menu_item_id: i64,
    /// Item name at order time
    pub item_name: String,
    /// Units ordered
    pub quantity: i32,
    /// Unit price at order time
    pub unit_price: f64,
    /// `unit_price * quantity`
    pub total_price: f64,
    /// Kitchen instructions (e.g. "Less oil")
    pub special_instructions: Option<String>,
    /// Line progress
    pub status: WalkinItemStatus,
    /// Creation time (Unix seconds)
    pub created_at: i64,
}

/// Defines relationships between `WalkinItem` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each line belongs to one walk-in and disappears with it
    #[sea_orm(
        belongs_to = "super::walkin::Entity",
        from = "Column::WalkinId",
        to = "super::walkin::Column::Id",
        on_delete = "Cascade"
    )]
    Walkin,
}

impl Related<super::walkin::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Walkin.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
