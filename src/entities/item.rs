//! Item entity - A catalog dish. The image is carried as base64 text.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Item database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "items")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    /// Remote item id
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: i64,
    /// Dish name
    pub name: String,
    /// Menu description
    pub description: Option<String>,
    /// Base64-encoded picture
    pub image: Option<String>,
    /// Availability, `active` by default
    pub status: String,
    /// Staff member who created it
    pub created_by_id: Option<i64>,
    /// Staff member who last changed it
    pub updated_by_id: Option<i64>,
    /// Creation time (Unix seconds)
    pub created_at: i64,
    /// Last change (Unix seconds)
    pub updated_at: i64,
}

/// `Item` has no declared relationships; pricing references it by id
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
