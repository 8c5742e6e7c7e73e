//! Walk-in business logic - Counter orders entered by staff.
//!
//! A walk-in's `total_amount` and `final_amount` are derived from its items and
//! are only ever written by [`calculate_walkin_totals`]. Every mutation that can
//! change them (item writes, tax or discount changes) calls it inside the same
//! unit of work.

use crate::{
    core::{
        repository::{self, now_unix, set_if_some},
        walkin_item::WalkinLine,
    },
    entities::{
        PaymentMethod, PaymentStatus, Walkin, WalkinItem, WalkinOrderStatus, walkin, walkin_item,
    },
    errors::{Error, Result},
};
use sea_orm::sea_query::Expr;
use sea_orm::{
    DatabaseTransaction, IntoActiveModel, QueryOrder, QuerySelect, Set, TransactionTrait,
    prelude::*,
};
use serde::Deserialize;
use tracing::{debug, info, instrument};

/// A walk-in as entered at the counter
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewWalkin {
    /// Name given at the counter
    pub customer_name: String,
    /// Phone number, if given
    pub contact_number: Option<String>,
    /// Party size
    #[serde(default = "default_party_size")]
    pub number_of_people: i32,
    /// Table label
    pub table_number: Option<String>,
    /// Kitchen progress
    #[serde(default)]
    pub order_status: WalkinOrderStatus,
    /// Discount subtracted from the subtotal
    #[serde(default)]
    pub discount_amount: f64,
    /// Tax added to the subtotal
    #[serde(default)]
    pub tax_amount: f64,
    /// How the customer pays
    #[serde(default)]
    pub payment_method: PaymentMethod,
    /// Whether payment was collected
    #[serde(default)]
    pub payment_status: PaymentStatus,
    /// Free-form staff notes
    pub notes: Option<String>,
    /// Staff member who took the order
    pub created_by_id: Option<i64>,
    /// Staff member who last changed it
    pub updated_by_id: Option<i64>,
    /// Whether the server already holds this walk-in
    #[serde(default)]
    pub is_synced: bool,
}

const fn default_party_size() -> i32 {
    1
}

fn validate_adjustment(field: &'static str, amount: f64) -> Result<()> {
    if !amount.is_finite() || amount < 0.0 {
        return Err(Error::Validation {
            field,
            message: format!("{amount} is not a valid amount"),
        });
    }
    Ok(())
}

impl NewWalkin {
    fn into_active_model(self, now: i64) -> Result<walkin::ActiveModel> {
        if self.customer_name.trim().is_empty() {
            return Err(Error::Validation {
                field: "customer_name",
                message: "must not be empty".to_string(),
            });
        }
        if self.number_of_people < 1 {
            return Err(Error::Validation {
                field: "number_of_people",
                message: format!("must be at least 1, got {}", self.number_of_people),
            });
        }
        validate_adjustment("discount_amount", self.discount_amount)?;
        validate_adjustment("tax_amount", self.tax_amount)?;

        // No items yet
        let final_amount = self.tax_amount - self.discount_amount;

        Ok(walkin::ActiveModel {
            customer_name: Set(self.customer_name),
            contact_number: Set(self.contact_number),
            number_of_people: Set(self.number_of_people),
            table_number: Set(self.table_number),
            order_status: Set(self.order_status),
            total_amount: Set(0.0),
            discount_amount: Set(self.discount_amount),
            tax_amount: Set(self.tax_amount),
            final_amount: Set(final_amount),
            payment_method: Set(self.payment_method),
            payment_status: Set(self.payment_status),
            notes: Set(self.notes),
            created_by_id: Set(self.created_by_id),
            updated_by_id: Set(self.updated_by_id),
            is_synced: Set(self.is_synced),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        })
    }
}

/// Fields of a walk-in that may change; `None` leaves a column untouched.
///
/// The derived amounts are not patchable. Changing the tax or the discount
/// recomputes `final_amount`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WalkinPatch {
    /// Customer name
    pub customer_name: Option<String>,
    /// Phone number; `Some(None)` clears it
    pub contact_number: Option<Option<String>>,
    /// Party size
    pub number_of_people: Option<i32>,
    /// Table label; `Some(None)` clears it
    pub table_number: Option<Option<String>>,
    /// Kitchen progress
    pub order_status: Option<WalkinOrderStatus>,
    /// Discount subtracted from the subtotal
    pub discount_amount: Option<f64>,
    /// Tax added to the subtotal
    pub tax_amount: Option<f64>,
    /// How the customer pays
    pub payment_method: Option<PaymentMethod>,
    /// Whether payment was collected
    pub payment_status: Option<PaymentStatus>,
    /// Staff notes; `Some(None)` clears them
    pub notes: Option<Option<String>>,
    /// Staff member making the change
    pub updated_by_id: Option<Option<i64>>,
    /// Whether the server holds this walk-in
    pub is_synced: Option<bool>,
}

impl WalkinPatch {
    fn touches_adjustments(&self) -> bool {
        self.discount_amount.is_some() || self.tax_amount.is_some()
    }

    fn validate(&self) -> Result<()> {
        if let Some(discount) = self.discount_amount {
            validate_adjustment("discount_amount", discount)?;
        }
        if let Some(tax) = self.tax_amount {
            validate_adjustment("tax_amount", tax)?;
        }
        if let Some(people) = self.number_of_people
            && people < 1
        {
            return Err(Error::Validation {
                field: "number_of_people",
                message: format!("must be at least 1, got {people}"),
            });
        }
        Ok(())
    }

    fn into_active_model(self, now: i64) -> walkin::ActiveModel {
        walkin::ActiveModel {
            customer_name: set_if_some(self.customer_name),
            contact_number: set_if_some(self.contact_number),
            number_of_people: set_if_some(self.number_of_people),
            table_number: set_if_some(self.table_number),
            order_status: set_if_some(self.order_status),
            discount_amount: set_if_some(self.discount_amount),
            tax_amount: set_if_some(self.tax_amount),
            payment_method: set_if_some(self.payment_method),
            payment_status: set_if_some(self.payment_status),
            notes: set_if_some(self.notes),
            updated_by_id: set_if_some(self.updated_by_id),
            is_synced: set_if_some(self.is_synced),
            updated_at: Set(now),
            ..Default::default()
        }
    }
}

/// Optional filters for [`list_walkins`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WalkinFilter {
    /// Only walk-ins in this kitchen state
    pub order_status: Option<WalkinOrderStatus>,
    /// Only walk-ins in this payment state
    pub payment_status: Option<PaymentStatus>,
    /// Only synced or only unsynced walk-ins
    pub is_synced: Option<bool>,
}

/// Amounts written back by [`calculate_walkin_totals`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WalkinTotals {
    /// Sum of item totals, stored as `total_amount`
    pub subtotal: f64,
    /// `subtotal + tax - discount`
    pub final_amount: f64,
}

/// Recomputes and stores a walk-in's `total_amount` and `final_amount`.
///
/// Runs on the caller's connection or transaction so item writes and the totals
/// commit together.
///
/// # Errors
/// Returns [`Error::NotFound`] if the walk-in does not exist.
#[instrument(skip(db))]
pub async fn calculate_walkin_totals<C: ConnectionTrait>(
    db: &C,
    walkin_id: i64,
) -> Result<WalkinTotals> {
    let current = repository::get_by_id::<Walkin, _>(db, walkin_id).await?;

    let subtotal = WalkinItem::find()
        .select_only()
        .column_as(Expr::col(walkin_item::Column::TotalPrice).sum(), "subtotal")
        .filter(walkin_item::Column::WalkinId.eq(walkin_id))
        .into_tuple::<Option<f64>>()
        .one(db)
        .await?
        .flatten()
        .unwrap_or(0.0);
    let final_amount = subtotal + current.tax_amount - current.discount_amount;

    let totals = walkin::ActiveModel {
        total_amount: Set(subtotal),
        final_amount: Set(final_amount),
        updated_at: Set(now_unix()),
        ..Default::default()
    };
    repository::apply_patch(db, walkin_id, totals).await?;

    debug!(
        "Walkin {} totals: subtotal {:.2}, final {:.2}",
        walkin_id, subtotal, final_amount
    );
    Ok(WalkinTotals {
        subtotal,
        final_amount,
    })
}

/// Creates a walk-in without items and returns its generated id.
pub async fn create_walkin(db: &DatabaseConnection, new_walkin: NewWalkin) -> Result<i64> {
    let row = new_walkin.into_active_model(now_unix())?;
    let created = repository::insert(db, row).await?;
    Ok(created.id)
}

/// Finds a walk-in by id.
pub async fn get_walkin_by_id(db: &DatabaseConnection, id: i64) -> Result<Option<walkin::Model>> {
    repository::find_by_id::<Walkin, _>(db, id).await
}

/// Lists walk-ins, newest first.
pub async fn list_walkins(
    db: &DatabaseConnection,
    filter: WalkinFilter,
) -> Result<Vec<walkin::Model>> {
    let mut query = Walkin::find();
    if let Some(status) = filter.order_status {
        query = query.filter(walkin::Column::OrderStatus.eq(status));
    }
    if let Some(status) = filter.payment_status {
        query = query.filter(walkin::Column::PaymentStatus.eq(status));
    }
    if let Some(is_synced) = filter.is_synced {
        query = query.filter(walkin::Column::IsSynced.eq(is_synced));
    }

    query
        .order_by_desc(walkin::Column::CreatedAt)
        .order_by_desc(walkin::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Applies `patch` to a walk-in, always refreshing `updated_at`.
#[instrument(skip(db))]
pub async fn update_walkin(db: &DatabaseConnection, id: i64, patch: WalkinPatch) -> Result<()> {
    patch.validate()?;
    if !patch.touches_adjustments() {
        return repository::apply_patch(db, id, patch.into_active_model(now_unix())).await;
    }

    let txn = db.begin().await?;
    repository::apply_patch(&txn, id, patch.into_active_model(now_unix())).await?;
    calculate_walkin_totals(&txn, id).await?;
    txn.commit().await?;
    Ok(())
}

/// Marks a walk-in as pushed to the remote service.
pub async fn mark_walkin_synced(db: &DatabaseConnection, id: i64) -> Result<()> {
    update_walkin(
        db,
        id,
        WalkinPatch {
            is_synced: Some(true),
            ..Default::default()
        },
    )
    .await
}

/// Deletes a walk-in; its items go with it.
pub async fn delete_walkin(db: &DatabaseConnection, id: i64) -> Result<()> {
    repository::delete_by_id::<Walkin, _>(db, id).await
}

/// Inserts or replaces many stored walk-ins in one unit of work.
///
/// Totals are recomputed from the items already stored for each walk-in.
#[instrument(skip(db, walkins))]
pub async fn bulk_upsert_walkins(
    db: &DatabaseConnection,
    walkins: Vec<walkin::Model>,
) -> Result<usize> {
    if walkins.is_empty() {
        return Ok(0);
    }
    for row in &walkins {
        validate_adjustment("discount_amount", row.discount_amount)?;
        validate_adjustment("tax_amount", row.tax_amount)?;
    }

    let ids: Vec<i64> = walkins.iter().map(|row| row.id).collect();
    let rows = walkins
        .into_iter()
        .map(|row| row.into_active_model().reset_all())
        .collect();

    let txn = db.begin().await?;
    let count = repository::upsert_all(&txn, rows).await?;
    for id in ids {
        calculate_walkin_totals(&txn, id).await?;
    }
    txn.commit().await?;
    Ok(count)
}

/// A complete walk-in order as submitted from the counter
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalkinAggregate {
    /// Walk-in columns
    #[serde(flatten)]
    pub walkin: NewWalkin,
    /// Ordered lines
    #[serde(default)]
    pub items: Vec<WalkinLine>,
}

/// Persists a walk-in with all its items in one unit of work and returns the new
/// walk-in id.
///
/// Totals are computed inside the same unit of work, so a committed walk-in
/// always has consistent amounts.
///
/// # Errors
/// Returns [`Error::AggregateWrite`] wrapping the failing step. Nothing from the
/// aggregate is persisted in that case.
#[instrument(skip(db, aggregate), fields(items = aggregate.items.len()))]
pub async fn save_complete_walkin_order(
    db: &DatabaseConnection,
    aggregate: WalkinAggregate,
) -> Result<i64> {
    let txn = db
        .begin()
        .await
        .map_err(|e| Error::from(e).in_aggregate("walkin", None))?;
    let (walkin_id, totals) = write_walkin_aggregate(&txn, aggregate).await?;
    txn.commit()
        .await
        .map_err(|e| Error::from(e).in_aggregate("walkin", Some(walkin_id)))?;

    info!(
        "Saved walkin {} with final amount {:.2}",
        walkin_id, totals.final_amount
    );
    Ok(walkin_id)
}

async fn write_walkin_aggregate(
    txn: &DatabaseTransaction,
    aggregate: WalkinAggregate,
) -> Result<(i64, WalkinTotals)> {
    let now = now_unix();
    let WalkinAggregate { walkin, items } = aggregate;

    let row = walkin
        .into_active_model(now)
        .map_err(|e| e.in_aggregate("walkin", None))?;
    let walkin_id = repository::insert(txn, row)
        .await
        .map_err(|e| e.in_aggregate("walkin", None))?
        .id;

    let in_walkin = |e: Error| e.in_aggregate("walkin", Some(walkin_id));
    for line in items {
        let row = line.into_active_model(walkin_id, now).map_err(in_walkin)?;
        repository::insert(txn, row).await.map_err(in_walkin)?;
    }
    let totals = calculate_walkin_totals(txn, walkin_id)
        .await
        .map_err(in_walkin)?;

    Ok((walkin_id, totals))
}
