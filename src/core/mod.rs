//! Core business logic for the offline store, independent of any presentation layer.
//!
//! One module per entity group, built on the generic operations in [`repository`].

pub mod catalog;
pub mod menu;
pub mod menu_item;
pub mod order;
pub mod order_item;
pub mod projection;
pub mod repository;
pub mod walkin;
pub mod walkin_item;
