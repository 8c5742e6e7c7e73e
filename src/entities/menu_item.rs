//! Menu item entity - Offers an item on a menu within an allowed quantity range.
//!
//! The store does not check `min_quantity <= max_quantity`; the writers in
//! [`crate::core::menu_item`] and [`crate::core::menu`] do.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Menu item database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "menu_items")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    /// Remote identifier
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: i64,
    /// Owning menu (weak reference)
    pub menu_id: i64,
    /// Offered item (weak reference)
    pub item_id: i64,
    /// Smallest quantity a customer may order
    pub min_quantity: i32,
    /// Largest quantity a customer may order
    pub max_quantity: i32,
    /// `"active"` unless the remote service says otherwise
    pub status: String,
    /// Staff member who created the association
    pub created_by_id: Option<i64>,
    /// Staff member who last changed it
    pub updated_by_id: Option<i64>,
    /// Creation time (Unix seconds)
    pub created_at: i64,
    /// Last modification time (Unix seconds)
    pub updated_at: i64,
}

/// `MenuItem` links to menus and items by id only
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
