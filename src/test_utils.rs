//! Shared test utilities for the offline store.
//!
//! This module provides an in-memory store with every table created, plus
//! builders for test inputs with sensible defaults.

use crate::{
    core::{
        catalog::{NewItem, NewMenuConfiguration},
        menu::{ItemAggregate, MenuAggregate, MenuItemAggregate, NewMenu, PricingAggregate},
        menu_item::NewMenuItem,
        order::NewOrder,
        order_item::NewOrderItem,
        walkin::NewWalkin,
        walkin_item::WalkinLine,
    },
    entities::{PaymentMethod, PaymentStatus, WalkinItemStatus, WalkinOrderStatus},
    errors::Result,
};
use sea_orm::DatabaseConnection;
use tracing_subscriber::EnvFilter;

/// Creates an in-memory `SQLite` store with all tables initialized.
/// This is the standard setup for all store tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Routes `tracing` output to the test harness. Honors `RUST_LOG`, defaults to `trace`.
pub fn init_test_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("trace"));
    // Several tests may race to install it; the first one wins
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}

/// Creates a test menu configuration.
///
/// # Defaults
/// * `default_start_time`: 07:00 UTC on 1970-01-01
/// * `default_end_time`: 10:00 UTC on 1970-01-01
pub fn test_configuration(id: i64, name: &str) -> NewMenuConfiguration {
    NewMenuConfiguration {
        id,
        name: name.to_string(),
        default_start_time: 7 * 3600,
        default_end_time: 10 * 3600,
    }
}

/// Creates a test menu starting at `start_time` and lasting three hours.
pub fn test_menu(id: i64, configuration_id: i64, start_time: i64) -> NewMenu {
    NewMenu {
        id,
        name: format!("Menu {id}"),
        description: Some("Served at the main counter".to_string()),
        start_time,
        end_time: start_time + 3 * 3600,
        status: None,
        menu_configuration_id: Some(configuration_id),
        created_by_id: Some(1),
        updated_by_id: None,
        created_at: None,
        updated_at: None,
    }
}

/// Creates a test catalog item with no description or image.
pub fn test_item(id: i64, name: &str) -> NewItem {
    NewItem {
        id,
        name: name.to_string(),
        description: None,
        image: None,
        status: None,
        created_by_id: None,
        updated_by_id: None,
        created_at: None,
        updated_at: None,
    }
}

/// Creates a test menu item.
///
/// # Defaults
/// * quantity range: 1..=10
/// * `status`: unset, stored as `"active"`
pub fn test_menu_item(id: i64, menu_id: i64, item_id: i64) -> NewMenuItem {
    NewMenuItem {
        id,
        menu_id,
        item_id,
        min_quantity: 1,
        max_quantity: 10,
        status: None,
        created_by_id: None,
        updated_by_id: None,
        created_at: None,
        updated_at: None,
    }
}

/// A breakfast menu (id 1, configuration 1) offering dosa (item 2, 80.0) and
/// idly (item 3, 40.0), with remote timestamps as a sync-down would carry.
/// Pricing carries no currency, so the default applies.
pub fn test_menu_aggregate() -> MenuAggregate {
    const STAMP: Option<i64> = Some(1_709_200_000);
    let entry = |menu_item_id: i64, item_id: i64, name: &str, price: f64| MenuItemAggregate {
        menu_item: NewMenuItem {
            created_at: STAMP,
            updated_at: STAMP,
            ..test_menu_item(menu_item_id, 1, item_id)
        },
        item: ItemAggregate {
            item: NewItem {
                created_at: STAMP,
                updated_at: STAMP,
                ..test_item(item_id, name)
            },
            pricing: Some(PricingAggregate {
                id: menu_item_id,
                price,
                currency: None,
            }),
        },
    };

    MenuAggregate {
        menu: NewMenu {
            created_at: STAMP,
            updated_at: STAMP,
            ..test_menu(1, 1, 1_709_280_000)
        },
        menu_configuration: test_configuration(1, "Breakfast"),
        menu_items: vec![entry(1, 2, "dosa", 80.0), entry(2, 3, "idly", 40.0)],
    }
}

/// Creates a test order.
///
/// # Defaults
/// * `total_amount`: 100.0
/// * `canteen_id`: 1
/// * `status`: unset, stored as `"pending"`
/// * `is_synced`: false
pub fn test_order(id: i64, user_id: i64) -> NewOrder {
    NewOrder {
        id,
        user_id,
        total_amount: 100.0,
        status: None,
        canteen_id: 1,
        menu_configuration_id: Some(1),
        qr_code: None,
        created_by_id: Some(user_id),
        updated_by_id: None,
        is_synced: false,
        created_at: None,
        updated_at: None,
    }
}

/// Creates a test order line for item `id`, named `"item {id}"`.
pub fn test_order_item(id: i64, order_id: i64, price: f64, quantity: i32) -> NewOrderItem {
    NewOrderItem {
        id,
        order_id,
        item_id: id,
        item_name: format!("item {id}"),
        quantity,
        price,
        created_by_id: None,
        updated_by_id: None,
        created_at: None,
        updated_at: None,
    }
}

/// Creates a walk-in for one person with no tax or discount.
pub fn test_walkin(customer_name: &str) -> NewWalkin {
    NewWalkin {
        customer_name: customer_name.to_string(),
        contact_number: None,
        number_of_people: 1,
        table_number: Some("T5".to_string()),
        order_status: WalkinOrderStatus::Pending,
        discount_amount: 0.0,
        tax_amount: 0.0,
        payment_method: PaymentMethod::Cash,
        payment_status: PaymentStatus::Unpaid,
        notes: None,
        created_by_id: Some(1),
        updated_by_id: None,
        is_synced: false,
    }
}

/// Creates a walk-in line for menu item `menu_item_id`, named `"item {id}"`.
pub fn test_walkin_line(menu_item_id: i64, unit_price: f64, quantity: i32) -> WalkinLine {
    WalkinLine {
        menu_item_id,
        item_name: format!("item {menu_item_id}"),
        quantity,
        unit_price,
        special_instructions: None,
        status: WalkinItemStatus::Pending,
    }
}
