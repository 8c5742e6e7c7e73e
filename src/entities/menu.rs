//! Menu entity - One concrete serving window of a meal slot.
//!
//! `menu_configuration_id` is a weak reference: the store declares no foreign key,
//! so menus can be synced down before or without their configuration.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Menu database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "menus")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    /// Remote identifier
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: i64,
    /// Display name
    pub name: String,
    /// Optional free text
    pub description: Option<String>,
    /// Opening time (Unix seconds)
    pub start_time: i64,
    /// Closing time (Unix seconds)
    pub end_time: i64,
    /// `"active"` unless the remote service says otherwise
    pub status: String,
    /// Meal slot this menu instantiates
    pub menu_configuration_id: Option<i64>,
    /// Staff member who created the menu remotely
    pub created_by_id: Option<i64>,
    /// Staff member who last changed the menu
    pub updated_by_id: Option<i64>,
    /// Creation time (Unix seconds)
    pub created_at: i64,
    /// Last modification time (Unix seconds)
    pub updated_at: i64,
}

/// Menu items and configurations are linked by id only
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
