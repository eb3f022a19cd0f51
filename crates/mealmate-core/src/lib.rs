//! Meal planning core: recipe catalog, dietary rules, meal selection,
//! shopping list consolidation, export, share links and subscription tiers.
//!
//! The selector and consolidator are pure. The `service` functions in
//! [`plan`], [`shopping`] and [`subscription`] wire them to PostgreSQL.

pub mod catalog;
pub mod diet;
pub mod export;
pub mod plan;
pub mod selector;
pub mod share;
pub mod shopping;
pub mod subscription;
