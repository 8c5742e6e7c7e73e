//! Closed sets of values stored as text in the walk-in tables.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Kitchen/service progress of a walk-in order
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum WalkinOrderStatus {
    /// Taken, not started
    #[default]
    #[sea_orm(string_value = "pending")]
    Pending,
    /// Being cooked
    #[sea_orm(string_value = "preparing")]
    Preparing,
    /// Ready to serve
    #[sea_orm(string_value = "ready")]
    Ready,
    /// At the table
    #[sea_orm(string_value = "served")]
    Served,
    /// Settled and closed
    #[sea_orm(string_value = "completed")]
    Completed,
    /// Abandoned
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}

/// How a walk-in customer pays
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
pub enum PaymentMethod {
    /// Cash at the counter
    #[default]
    #[sea_orm(string_value = "Cash")]
    Cash,
    /// Card terminal
    #[sea_orm(string_value = "Card")]
    Card,
    /// Unified Payments Interface transfer
    #[sea_orm(string_value = "UPI")]
    #[serde(rename = "UPI")]
    Upi,
}

/// Settlement state of a walk-in order
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    /// Nothing paid yet
    #[default]
    #[sea_orm(string_value = "unpaid")]
    Unpaid,
    /// Fully settled
    #[sea_orm(string_value = "paid")]
    Paid,
    /// Part of the final amount received
    #[sea_orm(string_value = "partially_paid")]
    PartiallyPaid,
}

/// Progress of a single walk-in line item
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum WalkinItemStatus {
    /// Not started
    #[default]
    #[sea_orm(string_value = "pending")]
    Pending,
    /// Being cooked
    #[sea_orm(string_value = "preparing")]
    Preparing,
    /// Ready to serve
    #[sea_orm(string_value = "ready")]
    Ready,
    /// Delivered
    #[sea_orm(string_value = "served")]
    Served,
    /// Dropped from the order
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::ActiveEnum;

    #[test]
    fn test_stored_values_match_remote_strings() {
        assert_eq!(PaymentMethod::Upi.to_value(), "UPI");
        assert_eq!(PaymentStatus::PartiallyPaid.to_value(), "partially_paid");
        assert_eq!(WalkinOrderStatus::default().to_value(), "pending");
        assert_eq!(
            WalkinItemStatus::try_from_value(&"served".to_string()).ok(),
            Some(WalkinItemStatus::Served)
        );
    }
}
