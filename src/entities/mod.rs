//! Entity module - Contains all SeaORM entity definitions for the offline store.
//! Catalog tables (configurations, menus, items, pricing, menu items) mirror remote ids;
//! order and walk-in tables hold point-in-time line-item snapshots.

pub mod item;
pub mod item_pricing;
pub mod menu;
pub mod menu_configuration;
pub mod menu_item;
pub mod order;
pub mod order_item;
pub mod status;
pub mod walkin;
pub mod walkin_item;

// Re-export specific types to avoid conflicts
pub use item::{Column as ItemColumn, Entity as Item, Model as ItemModel};
pub use item_pricing::{
    Column as ItemPricingColumn, Entity as ItemPricing, Model as ItemPricingModel,
};
pub use menu::{Column as MenuColumn, Entity as Menu, Model as MenuModel};
pub use menu_configuration::{
    Column as MenuConfigurationColumn, Entity as MenuConfiguration,
    Model as MenuConfigurationModel,
};
pub use menu_item::{Column as MenuItemColumn, Entity as MenuItem, Model as MenuItemModel};
pub use order::{Column as OrderColumn, Entity as Order, Model as OrderModel};
pub use order_item::{Column as OrderItemColumn, Entity as OrderItem, Model as OrderItemModel};
pub use status::{PaymentMethod, PaymentStatus, WalkinItemStatus, WalkinOrderStatus};
pub use walkin::{Column as WalkinColumn, Entity as Walkin, Model as WalkinModel};
pub use walkin_item::{
    Column as WalkinItemColumn, Entity as WalkinItem, Model as WalkinItemModel,
};
