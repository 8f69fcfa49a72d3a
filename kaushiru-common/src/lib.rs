//! # Kau-Shiru Common Library
//!
//! Shared code for the Kau-Shiru price-tracking service including:
//! - Database initialization, schema sync and migrations
//! - Row models for posts, reactions, buy logs, quotes and contacts
//! - Configuration loading (TOML bootstrap + runtime settings)
//! - Region hierarchy and product catalog
//! - Price aggregation (category stats, trends, item stats)

pub mod aggregate;
pub mod catalog;
pub mod config;
pub mod db;
pub mod error;
pub mod region;
pub mod time;

pub use error::{Error, Result};
