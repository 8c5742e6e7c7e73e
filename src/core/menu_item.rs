//! Menu item business logic - Associations between menus and catalog items.
//!
//! Every write path checks `min_quantity <= max_quantity`, since the store itself
//! does not.

use crate::{
    core::repository::{self, now_unix, set_if_some},
    entities::{MenuItem, menu_item},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use serde::Deserialize;
use tracing::{debug, instrument};

/// A menu item as created locally or received from the remote service
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMenuItem {
    /// Remote identifier
    pub id: i64,
    /// Owning menu
    pub menu_id: i64,
    /// Offered item
    pub item_id: i64,
    /// Smallest orderable quantity
    pub min_quantity: i32,
    /// Largest orderable quantity
    pub max_quantity: i32,
    /// Defaults to `"active"`
    pub status: Option<String>,
    /// Creator on the remote side
    pub created_by_id: Option<i64>,
    /// Last editor on the remote side
    pub updated_by_id: Option<i64>,
    /// Defaults to now
    pub created_at: Option<i64>,
    /// Defaults to now
    pub updated_at: Option<i64>,
}

impl NewMenuItem {
    pub(crate) fn into_active_model(self, now: i64) -> Result<menu_item::ActiveModel> {
        validate_quantity_range(self.min_quantity, self.max_quantity)?;

        Ok(menu_item::ActiveModel {
            id: Set(self.id),
            menu_id: Set(self.menu_id),
            item_id: Set(self.item_id),
            min_quantity: Set(self.min_quantity),
            max_quantity: Set(self.max_quantity),
            status: Set(self.status.unwrap_or_else(|| "active".to_string())),
            created_by_id: Set(self.created_by_id),
            updated_by_id: Set(self.updated_by_id),
            created_at: Set(self.created_at.unwrap_or(now)),
            updated_at: Set(self.updated_at.unwrap_or(now)),
        })
    }
}

/// Fields of a menu item that may change; `None` leaves a column untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MenuItemPatch {
    /// Menu to move the item to
    pub menu_id: Option<i64>,
    /// Catalog item offered
    pub item_id: Option<i64>,
    /// New minimum quantity per order
    pub min_quantity: Option<i32>,
    /// New maximum quantity per order
    pub max_quantity: Option<i32>,
    /// New status
    pub status: Option<String>,
    /// Staff member making the change
    pub updated_by_id: Option<Option<i64>>,
}

impl MenuItemPatch {
    fn touches_quantity_range(&self) -> bool {
        self.min_quantity.is_some() || self.max_quantity.is_some()
    }

    fn into_active_model(self, now: i64) -> menu_item::ActiveModel {
        menu_item::ActiveModel {
            menu_id: set_if_some(self.menu_id),
            item_id: set_if_some(self.item_id),
            min_quantity: set_if_some(self.min_quantity),
            max_quantity: set_if_some(self.max_quantity),
            status: set_if_some(self.status),
            updated_by_id: set_if_some(self.updated_by_id),
            updated_at: Set(now),
            ..Default::default()
        }
    }
}

/// Rejects a quantity range whose bounds are negative or inverted.
pub fn validate_quantity_range(min_quantity: i32, max_quantity: i32) -> Result<()> {
    if min_quantity < 0 {
        return Err(Error::Validation {
            field: "min_quantity",
            message: format!("must not be negative, got {min_quantity}"),
        });
    }
    if min_quantity > max_quantity {
        return Err(Error::Validation {
            field: "max_quantity",
            message: format!("{max_quantity} is below min_quantity {min_quantity}"),
        });
    }
    Ok(())
}

/// Creates a menu item and returns its id.
pub async fn create_menu_item(db: &DatabaseConnection, new_item: NewMenuItem) -> Result<i64> {
    let row = new_item.into_active_model(now_unix())?;
    let created = repository::insert(db, row).await?;
    Ok(created.id)
}

/// Finds a menu item by id.
pub async fn get_menu_item_by_id(
    db: &DatabaseConnection,
    id: i64,
) -> Result<Option<menu_item::Model>> {
    repository::find_by_id::<MenuItem, _>(db, id).await
}

/// Lists every menu item.
pub async fn list_menu_items(db: &DatabaseConnection) -> Result<Vec<menu_item::Model>> {
    MenuItem::find()
        .order_by_asc(menu_item::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Lists the menu items of one menu.
pub async fn get_menu_items_by_menu_id<C: ConnectionTrait>(
    db: &C,
    menu_id: i64,
) -> Result<Vec<menu_item::Model>> {
    MenuItem::find()
        .filter(menu_item::Column::MenuId.eq(menu_id))
        .order_by_asc(menu_item::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Applies `patch` to a menu item, always refreshing `updated_at`.
///
/// When either quantity bound changes, the resulting range is checked against the
/// stored row inside the same unit of work.
#[instrument(skip(db))]
pub async fn update_menu_item(
    db: &DatabaseConnection,
    id: i64,
    patch: MenuItemPatch,
) -> Result<()> {
    if !patch.touches_quantity_range() {
        return repository::apply_patch(db, id, patch.into_active_model(now_unix())).await;
    }

    let txn = db.begin().await?;
    let current = repository::get_by_id::<MenuItem, _>(&txn, id).await?;
    validate_quantity_range(
        patch.min_quantity.unwrap_or(current.min_quantity),
        patch.max_quantity.unwrap_or(current.max_quantity),
    )?;
    repository::apply_patch(&txn, id, patch.into_active_model(now_unix())).await?;
    txn.commit().await?;
    Ok(())
}

/// Deletes a menu item.
pub async fn delete_menu_item(db: &DatabaseConnection, id: i64) -> Result<()> {
    repository::delete_by_id::<MenuItem, _>(db, id).await
}

/// Deletes every menu item of a menu and returns how many were removed.
pub async fn delete_menu_items_by_menu_id<C: ConnectionTrait>(db: &C, menu_id: i64) -> Result<u64> {
    let result = MenuItem::delete_many()
        .filter(menu_item::Column::MenuId.eq(menu_id))
        .exec(db)
        .await?;
    debug!("Deleted {} menu items of menu {}", result.rows_affected, menu_id);
    Ok(result.rows_affected)
}

/// Inserts or replaces many menu items in one unit of work.
pub async fn bulk_upsert_menu_items(
    db: &DatabaseConnection,
    items: Vec<NewMenuItem>,
) -> Result<usize> {
    let now = now_unix();
    let rows = items
        .into_iter()
        .map(|item| item.into_active_model(now))
        .collect::<Result<Vec<_>>>()?;
    repository::bulk_upsert(db, rows).await
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;

    #[tokio::test]
    async fn test_create_menu_item_validation() -> Result<()> {
        let db = setup_test_db().await?;

        let inverted = NewMenuItem {
            min_quantity: 5,
            max_quantity: 2,
            ..test_menu_item(1, 1, 2)
        };
        let result = create_menu_item(&db, inverted).await;
        assert!(matches!(
            result,
            Err(Error::Validation {
                field: "max_quantity",
                ..
            })
        ));

        let negative = NewMenuItem {
            min_quantity: -1,
            ..test_menu_item(1, 1, 2)
        };
        assert!(create_menu_item(&db, negative).await.is_err());
        assert!(list_menu_items(&db).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_create_and_get_menu_item() -> Result<()> {
        let db = setup_test_db().await?;

        let id = create_menu_item(&db, test_menu_item(1, 1, 2)).await?;
        let stored = get_menu_item_by_id(&db, id).await?.unwrap();
        assert_eq!(stored.menu_id, 1);
        assert_eq!(stored.item_id, 2);
        assert_eq!(stored.status, "active");
        assert!(stored.created_at > 0);

        // Duplicate remote id is a write error
        let duplicate = create_menu_item(&db, test_menu_item(1, 1, 3)).await;
        assert!(matches!(duplicate, Err(Error::Write { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_update_checks_combined_range() -> Result<()> {
        let db = setup_test_db().await?;
        create_menu_item(&db, test_menu_item(1, 1, 2)).await?;

        // Stored range is 1..=10, so min 11 would invert it
        let result = update_menu_item(
            &db,
            1,
            MenuItemPatch {
                min_quantity: Some(11),
                ..Default::default()
            },
        )
        .await;
        assert!(matches!(result, Err(Error::Validation { .. })));

        update_menu_item(
            &db,
            1,
            MenuItemPatch {
                max_quantity: Some(4),
                status: Some("inactive".to_string()),
                ..Default::default()
            },
        )
        .await?;
        let stored = get_menu_item_by_id(&db, 1).await?.unwrap();
        assert_eq!(stored.min_quantity, 1);
        assert_eq!(stored.max_quantity, 4);
        assert_eq!(stored.status, "inactive");
        Ok(())
    }

    #[tokio::test]
    async fn test_update_missing_menu_item() -> Result<()> {
        let db = setup_test_db().await?;

        let plain = update_menu_item(
            &db,
            9,
            MenuItemPatch {
                status: Some("inactive".to_string()),
                ..Default::default()
            },
        )
        .await;
        assert!(plain.unwrap_err().is_not_found());

        let ranged = update_menu_item(
            &db,
            9,
            MenuItemPatch {
                max_quantity: Some(3),
                ..Default::default()
            },
        )
        .await;
        assert!(ranged.unwrap_err().is_not_found());
        Ok(())
    }

    #[tokio::test]
    async fn test_menu_items_by_menu_and_bulk_delete() -> Result<()> {
        let db = setup_test_db().await?;
        bulk_upsert_menu_items(
            &db,
            vec![
                test_menu_item(1, 1, 2),
                test_menu_item(2, 1, 3),
                test_menu_item(3, 2, 2),
            ],
        )
        .await?;

        assert_eq!(get_menu_items_by_menu_id(&db, 1).await?.len(), 2);
        assert_eq!(delete_menu_items_by_menu_id(&db, 1).await?, 2);
        assert!(get_menu_items_by_menu_id(&db, 1).await?.is_empty());

        delete_menu_item(&db, 3).await?;
        assert!(list_menu_items(&db).await?.is_empty());
        Ok(())
    }
}
