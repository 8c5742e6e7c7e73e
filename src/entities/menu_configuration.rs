//! Menu configuration entity - The named recurring meal slot (e.g. "Breakfast")
//! with its default serving window.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Menu configuration database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "menu_configurations")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    /// Remote identifier
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: i64,
    /// Slot name shown to customers
    pub name: String,
    /// Default opening time (Unix seconds)
    pub default_start_time: i64,
    /// Default closing time (Unix seconds)
    pub default_end_time: i64,
}

/// Menus reference configurations weakly; no foreign key is declared.
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
