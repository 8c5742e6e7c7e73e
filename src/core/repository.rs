//! Generic repository operations shared by every entity.
//!
//! Each entity module in [`crate::core`] builds its typed inputs into `ActiveModel`s
//! and hands them to the functions here, which own the query shapes:
//! lookups by primary key, sparse patch updates, deletes that report missing rows,
//! and "insert or replace" upserts keyed by primary key.
//!
//! Functions take any [`ConnectionTrait`], so they run unchanged on a
//! `DatabaseConnection` or inside a `DatabaseTransaction`.

use crate::entities::{
    Item, ItemPricing, Menu, MenuConfiguration, MenuItem, Order, OrderItem, Walkin, WalkinItem,
};
use crate::errors::{Error, Result};
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveModelBehavior, ActiveModelTrait, ActiveValue, ColumnTrait, Condition, ConnectionTrait,
    DatabaseConnection, EntityTrait, IntoActiveModel, Iterable, PrimaryKeyToColumn, QueryFilter,
    TransactionTrait, Value,
};
use tracing::{debug, instrument};

/// An entity stored by the offline layer, named for errors and logs.
pub trait Record: EntityTrait {
    /// Singular name used in [`Error::NotFound`] and [`Error::Write`]
    const NAME: &'static str;
}

impl Record for MenuConfiguration {
    const NAME: &'static str = "menu configuration";
}
impl Record for Menu {
    const NAME: &'static str = "menu";
}
impl Record for Item {
    const NAME: &'static str = "item";
}
impl Record for ItemPricing {
    const NAME: &'static str = "item pricing";
}
impl Record for MenuItem {
    const NAME: &'static str = "menu item";
}
impl Record for Order {
    const NAME: &'static str = "order";
}
impl Record for OrderItem {
    const NAME: &'static str = "order item";
}
impl Record for Walkin {
    const NAME: &'static str = "walkin";
}
impl Record for WalkinItem {
    const NAME: &'static str = "walkin item";
}

/// Current time as Unix seconds.
#[must_use]
pub fn now_unix() -> i64 {
    chrono::Utc::now().timestamp()
}

/// `Set` when the patch carries a value, `NotSet` otherwise.
pub fn set_if_some<V: Into<Value>>(value: Option<V>) -> ActiveValue<V> {
    value.map_or(ActiveValue::NotSet, ActiveValue::Set)
}

/// Total of an order or walk-in line: `unit_price * quantity`.
///
/// # Errors
/// Returns [`Error::Validation`] for a non-positive quantity or a negative or
/// non-finite unit price.
pub fn line_total(unit_price: f64, quantity: i32) -> Result<f64> {
    if quantity <= 0 {
        return Err(Error::Validation {
            field: "quantity",
            message: format!("must be positive, got {quantity}"),
        });
    }
    if !unit_price.is_finite() || unit_price < 0.0 {
        return Err(Error::Validation {
            field: "price",
            message: format!("{unit_price} is not a valid unit price"),
        });
    }
    Ok(unit_price * f64::from(quantity))
}

fn primary_key_eq<E: EntityTrait>(id: i64) -> Condition {
    E::PrimaryKey::iter().fold(Condition::all(), |condition, key| {
        condition.add(key.into_column().eq(id))
    })
}

fn replace_on_conflict<E: EntityTrait>() -> OnConflict {
    OnConflict::columns(E::PrimaryKey::iter().map(PrimaryKeyToColumn::into_column))
        .update_columns(E::Column::iter())
        .to_owned()
}

/// Looks up a row by primary key.
pub async fn find_by_id<E, C>(db: &C, id: i64) -> Result<Option<E::Model>>
where
    E: Record,
    C: ConnectionTrait,
{
    E::find()
        .filter(primary_key_eq::<E>(id))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Looks up a row by primary key, failing with [`Error::NotFound`] if absent.
pub async fn get_by_id<E, C>(db: &C, id: i64) -> Result<E::Model>
where
    E: Record,
    C: ConnectionTrait,
{
    find_by_id::<E, C>(db, id)
        .await?
        .ok_or(Error::NotFound { entity: E::NAME, id })
}

/// Fails with [`Error::NotFound`] unless a row with this primary key exists.
pub async fn ensure_exists<E, C>(db: &C, id: i64) -> Result<()>
where
    E: Record,
    C: ConnectionTrait,
{
    get_by_id::<E, C>(db, id).await.map(|_| ())
}

/// Inserts a new row and returns it as stored.
///
/// # Errors
/// Returns [`Error::Write`] if the store rejects the row (e.g. a duplicate id or a
/// failed foreign key).
pub async fn insert<A, C>(db: &C, row: A) -> Result<<A::Entity as EntityTrait>::Model>
where
    A: ActiveModelTrait + ActiveModelBehavior + Send,
    A::Entity: Record,
    <A::Entity as EntityTrait>::Model: IntoActiveModel<A>,
    C: ConnectionTrait,
{
    row.insert(db).await.map_err(|e| Error::Write {
        entity: <A::Entity as Record>::NAME,
        message: e.to_string(),
    })
}

/// Applies a sparse update: only the `Set` fields of `patch` are written.
///
/// A patch that touches no column still verifies that the row exists.
///
/// # Errors
/// Returns [`Error::NotFound`] when no row has this primary key.
pub async fn apply_patch<A, C>(db: &C, id: i64, patch: A) -> Result<()>
where
    A: ActiveModelTrait + Send,
    A::Entity: Record,
    C: ConnectionTrait,
{
    if !patch.is_changed() {
        return ensure_exists::<A::Entity, C>(db, id).await;
    }

    let result = A::Entity::update_many()
        .set(patch)
        .filter(primary_key_eq::<A::Entity>(id))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        return Err(Error::NotFound {
            entity: <A::Entity as Record>::NAME,
            id,
        });
    }
    debug!("Patched {} {}", <A::Entity as Record>::NAME, id);
    Ok(())
}

/// Deletes a row by primary key.
///
/// # Errors
/// Returns [`Error::NotFound`] when nothing was deleted.
pub async fn delete_by_id<E, C>(db: &C, id: i64) -> Result<()>
where
    E: Record,
    C: ConnectionTrait,
{
    let result = E::delete_many()
        .filter(primary_key_eq::<E>(id))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        return Err(Error::NotFound { entity: E::NAME, id });
    }
    debug!("Deleted {} {}", E::NAME, id);
    Ok(())
}

/// Inserts `row`, or overwrites every column of the existing row with the same
/// primary key.
///
/// The conflicting row is updated in place rather than deleted and re-inserted,
/// so replacing a parent never cascades into its children.
///
/// # Errors
/// Returns [`Error::Write`] if the store reports no affected row.
pub async fn upsert<A, C>(db: &C, row: A) -> Result<()>
where
    A: ActiveModelTrait + Send,
    A::Entity: Record,
    <A::Entity as EntityTrait>::Model: IntoActiveModel<A>,
    C: ConnectionTrait,
{
    let affected = A::Entity::insert(row)
        .on_conflict(replace_on_conflict::<A::Entity>())
        .exec_without_returning(db)
        .await?;

    if affected == 0 {
        return Err(Error::Write {
            entity: <A::Entity as Record>::NAME,
            message: "upsert affected no rows".to_string(),
        });
    }
    Ok(())
}

/// Upserts every row in order on the given connection or transaction.
pub async fn upsert_all<A, C>(db: &C, rows: Vec<A>) -> Result<usize>
where
    A: ActiveModelTrait + Send,
    A::Entity: Record,
    <A::Entity as EntityTrait>::Model: IntoActiveModel<A>,
    C: ConnectionTrait,
{
    let count = rows.len();
    for row in rows {
        upsert(db, row).await?;
    }
    Ok(count)
}

/// Upserts all rows as a single unit of work: either every row lands or none does.
///
/// Used for sync-down of remote responses.
#[instrument(skip(db, rows))]
pub async fn bulk_upsert<A>(db: &DatabaseConnection, rows: Vec<A>) -> Result<usize>
where
    A: ActiveModelTrait + Send,
    A::Entity: Record,
    <A::Entity as EntityTrait>::Model: IntoActiveModel<A>,
{
    if rows.is_empty() {
        return Ok(0);
    }

    let txn = db.begin().await?;
    let count = upsert_all(&txn, rows).await?;
    txn.commit().await?;

    debug!("Upserted {} {} rows", count, <A::Entity as Record>::NAME);
    Ok(count)
}
