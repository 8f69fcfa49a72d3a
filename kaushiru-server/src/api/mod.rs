//! HTTP API handlers for kaushiru-server

pub mod buy_logs;
pub mod catalog;
pub mod contact;
pub mod health;
pub mod posts;
pub mod quotes;
pub mod reactions;
pub mod site;
pub mod stats;

pub use buy_logs::buy_logs_routes;
pub use catalog::catalog_routes;
pub use contact::contact_routes;
pub use health::health_routes;
pub use posts::posts_routes;
pub use quotes::quotes_routes;
pub use reactions::reactions_routes;
pub use site::site_routes;
pub use stats::stats_routes;

use kaushiru_common::region::RegionSelection;
use serde::Deserialize;

/// `?big=&prefecture=&city=` shared by the region-scoped reads
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegionQuery {
    #[serde(default)]
    pub big: Option<String>,
    #[serde(default)]
    pub prefecture: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
}

impl RegionQuery {
    pub fn selection(&self) -> RegionSelection {
        RegionSelection::new(
            self.big.as_deref(),
            self.prefecture.as_deref(),
            self.city.as_deref(),
        )
    }
}
