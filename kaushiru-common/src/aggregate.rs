//! Price aggregation over submitted observations
//!
//! Pure reductions: the callers fetch rows for a time window and region,
//! these functions group them and compute display statistics.
//!
//! All prices are compared tax-included. A tax-excluded price is scaled by
//! the configured rate and rounded to whole yen.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

use crate::region::region_key;
use crate::time::utc_date;

/// One submitted price, as read from the `posts` table.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceObservation {
    /// Legacy fixed-enum category (`item_category`)
    pub item_category: Option<String>,
    /// Free item name of the newer scheme
    pub item_name: Option<String>,
    pub unit: Option<String>,
    pub price: i64,
    pub is_tax_included: bool,
    pub created_at: DateTime<Utc>,
    pub region_big: Option<String>,
    pub region_pref: Option<String>,
    pub region_city: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryStats {
    pub item_category: String,
    pub avg_price: i64,
    pub min_price: i64,
    pub max_price: i64,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PriceTrend {
    /// UTC calendar date, `YYYY-MM-DD`
    pub date: String,
    pub avg_price: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Up,
    Down,
    Flat,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryTrend {
    pub points: Vec<PriceTrend>,
    pub direction: TrendDirection,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemStats {
    pub item_name: String,
    pub unit: Option<String>,
    pub min_price: i64,
    pub max_price: i64,
    pub avg_price: i64,
    pub count: usize,
    pub latest_date: DateTime<Utc>,
    pub region_big: Option<String>,
    pub region_pref: Option<String>,
    pub region_city: Option<String>,
}

/// Tax-included price. `round(price * tax_rate)` when the price excluded tax.
pub fn normalize_price(price: i64, is_tax_included: bool, tax_rate: f64) -> i64 {
    if is_tax_included {
        price
    } else {
        (price as f64 * tax_rate).round() as i64
    }
}

fn rounded_mean(prices: &[i64]) -> i64 {
    let sum: i64 = prices.iter().sum();
    (sum as f64 / prices.len() as f64).round() as i64
}

/// Per-category min/max/avg over legacy-category rows.
///
/// Rows without `item_category` are skipped. Output is ordered by category.
pub fn category_stats(rows: &[PriceObservation], tax_rate: f64) -> Vec<CategoryStats> {
    let mut groups: BTreeMap<&str, Vec<i64>> = BTreeMap::new();

    for row in rows {
        let Some(category) = row.item_category.as_deref().filter(|c| !c.is_empty()) else {
            continue;
        };
        groups
            .entry(category)
            .or_default()
            .push(normalize_price(row.price, row.is_tax_included, tax_rate));
    }

    groups
        .into_iter()
        .filter_map(|(category, prices)| {
            let min_price = *prices.iter().min()?;
            let max_price = *prices.iter().max()?;
            Some(CategoryStats {
                item_category: category.to_string(),
                avg_price: rounded_mean(&prices),
                min_price,
                max_price,
                count: prices.len(),
            })
        })
        .collect()
}

/// Direction of a series: compares the last point to the first.
pub fn trend_direction(points: &[PriceTrend]) -> TrendDirection {
    match (points.first(), points.last()) {
        (Some(first), Some(last)) if points.len() >= 2 => {
            if last.avg_price > first.avg_price {
                TrendDirection::Up
            } else if last.avg_price < first.avg_price {
                TrendDirection::Down
            } else {
                TrendDirection::Flat
            }
        }
        _ => TrendDirection::Flat,
    }
}

/// Daily average price per legacy category, dates ascending.
pub fn price_trends(rows: &[PriceObservation], tax_rate: f64) -> BTreeMap<String, CategoryTrend> {
    let mut buckets: BTreeMap<String, BTreeMap<String, Vec<i64>>> = BTreeMap::new();

    for row in rows {
        let Some(category) = row.item_category.as_deref().filter(|c| !c.is_empty()) else {
            continue;
        };
        buckets
            .entry(category.to_string())
            .or_default()
            .entry(utc_date(row.created_at))
            .or_default()
            .push(normalize_price(row.price, row.is_tax_included, tax_rate));
    }

    buckets
        .into_iter()
        .map(|(category, days)| {
            // BTreeMap keys are ISO dates, so iteration is chronological
            let points: Vec<PriceTrend> = days
                .into_iter()
                .map(|(date, prices)| PriceTrend {
                    date,
                    avg_price: rounded_mean(&prices),
                })
                .collect();
            let direction = trend_direction(&points);
            (category, CategoryTrend { points, direction })
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct ItemKey {
    item_name: String,
    unit: Option<String>,
    region: String,
}

struct ItemAccumulator {
    key: ItemKey,
    prices: Vec<i64>,
    latest: DateTime<Utc>,
    region_big: Option<String>,
    region_pref: Option<String>,
    region_city: Option<String>,
}

/// Statistics per item name + unit + most specific region.
///
/// Rows without `item_name` (pre-migration forecast posts) are skipped.
/// A blank unit groups with a missing unit and reports as `None`.
/// Groups keep the order in which they are first seen in `rows`; the region
/// triple reported for a group is that of its first row.
pub fn item_stats(rows: &[PriceObservation], tax_rate: f64) -> Vec<ItemStats> {
    let mut index: HashMap<ItemKey, usize> = HashMap::new();
    let mut groups: Vec<ItemAccumulator> = Vec::new();

    for row in rows {
        let Some(item_name) = row.item_name.as_deref().filter(|n| !n.trim().is_empty()) else {
            continue;
        };
        let key = ItemKey {
            item_name: item_name.to_string(),
            unit: row.unit.clone().filter(|u| !u.trim().is_empty()),
            region: region_key(
                row.region_big.as_deref(),
                row.region_pref.as_deref(),
                row.region_city.as_deref(),
            ),
        };
        let price = normalize_price(row.price, row.is_tax_included, tax_rate);

        match index.get(&key) {
            Some(&i) => {
                let group = &mut groups[i];
                group.prices.push(price);
                if row.created_at > group.latest {
                    group.latest = row.created_at;
                }
            }
            None => {
                index.insert(key.clone(), groups.len());
                groups.push(ItemAccumulator {
                    key,
                    prices: vec![price],
                    latest: row.created_at,
                    region_big: row.region_big.clone(),
                    region_pref: row.region_pref.clone(),
                    region_city: row.region_city.clone(),
                });
            }
        }
    }

    groups
        .into_iter()
        .filter_map(|group| {
            let min_price = *group.prices.iter().min()?;
            let max_price = *group.prices.iter().max()?;
            Some(ItemStats {
                item_name: group.key.item_name,
                unit: group.key.unit,
                min_price,
                max_price,
                avg_price: rounded_mean(&group.prices),
                count: group.prices.len(),
                latest_date: group.latest,
                region_big: group.region_big,
                region_pref: group.region_pref,
                region_city: group.region_city,
            })
        })
        .collect()
}

/// Exact match on item name and unit (`None` matches only a missing unit).
pub fn find_item<'a>(
    stats: &'a [ItemStats],
    item_name: &str,
    unit: Option<&str>,
) -> Option<&'a ItemStats> {
    stats
        .iter()
        .find(|s| s.item_name == item_name && s.unit.as_deref() == unit)
}
