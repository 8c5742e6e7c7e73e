//! Item pricing entity - Current catalog price of an item.
//!
//! Several rows may exist per item; readers take the one with the highest id.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Item pricing database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "item_pricing")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    /// Remote identifier
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: i64,
    /// Priced item (weak reference)
    pub item_id: i64,
    /// Unit price
    pub price: f64,
    /// ISO currency code, `"INR"` by default
    pub currency: String,
    /// Creation time (Unix seconds)
    pub created_at: i64,
    /// Last modification time (Unix seconds)
    pub updated_at: i64,
}

/// `ItemPricing` has no declared relationships
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
