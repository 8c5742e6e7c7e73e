//! Walk-in entity - An order entered by staff for a customer at the counter.
//!
//! `total_amount` is the sum of the walk-in's item totals and
//! `final_amount = total_amount + tax_amount - discount_amount`; both are kept
//! current by [`crate::core::walkin::calculate_walkin_totals`].

use super::status::{PaymentMethod, PaymentStatus, WalkinOrderStatus};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Walk-in database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "walkins")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    /// Locally assigned identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Name given at the counter
    pub customer_name: String,
    /// Phone number, if given
    pub contact_number: Option<String>,
    /// Party size
    pub number_of_people: i32,
    /// Table label (e.g. `"T5"`)
    pub table_number: Option<String>,
    /// Service progress
    pub order_status: WalkinOrderStatus,
    /// Sum of item totals
    pub total_amount: f64,
    /// Discount subtracted from the total
    pub discount_amount: f64,
    /// Tax added to the total
    pub tax_amount: f64,
    /// Amount due
    pub final_amount: f64,
    /// How the customer pays
    pub payment_method: PaymentMethod,
    /// Settlement state
    pub payment_status: PaymentStatus,
    /// Free-form staff notes
    pub notes: Option<String>,
    /// Staff member who took the order
    pub created_by_id: Option<i64>,
    /// Staff member who last changed it
    pub updated_by_id: Option<i64>,
    /// Whether the walk-in has been pushed to the remote service
    pub is_synced: bool,
    /// Creation time (Unix seconds)
    pub created_at: i64,
    /// Last modification time (Unix seconds)
    pub updated_at: i64,
}

/// Defines relationships between Walkin and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One walk-in has many line items
    #[sea_orm(has_many = "super::walkin_item::Entity")]
    WalkinItems,
}

impl Related<super::walkin_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::WalkinItems.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
