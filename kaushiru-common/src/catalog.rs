//! Product catalog: categories, units, staple items and reference prices

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::Error;

/// Category of the item-name scheme (`category_new` column).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "肉")]
    Meat,
    #[serde(rename = "魚")]
    Fish,
    #[serde(rename = "野菜")]
    Vegetable,
    #[serde(rename = "その他")]
    Other,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Meat,
        Category::Fish,
        Category::Vegetable,
        Category::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Meat => "肉",
            Category::Fish => "魚",
            Category::Vegetable => "野菜",
            Category::Other => "その他",
        }
    }

    /// Closest legacy category, used when the table only has `item_category`.
    pub fn to_legacy(self) -> LegacyCategory {
        match self {
            Category::Meat => LegacyCategory::Meat,
            Category::Vegetable => LegacyCategory::Vegetable,
            Category::Fish | Category::Other => LegacyCategory::Other,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| Error::InvalidInput(format!("Unknown category: {}", s)))
    }
}

/// Fixed category enum of the original forecast posts (`item_category`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LegacyCategory {
    #[serde(rename = "卵")]
    Egg,
    #[serde(rename = "牛乳")]
    Milk,
    #[serde(rename = "肉")]
    Meat,
    #[serde(rename = "野菜")]
    Vegetable,
    #[serde(rename = "冷凍食品")]
    Frozen,
    #[serde(rename = "その他")]
    Other,
}

impl LegacyCategory {
    pub const ALL: [LegacyCategory; 6] = [
        LegacyCategory::Egg,
        LegacyCategory::Milk,
        LegacyCategory::Meat,
        LegacyCategory::Vegetable,
        LegacyCategory::Frozen,
        LegacyCategory::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LegacyCategory::Egg => "卵",
            LegacyCategory::Milk => "牛乳",
            LegacyCategory::Meat => "肉",
            LegacyCategory::Vegetable => "野菜",
            LegacyCategory::Frozen => "冷凍食品",
            LegacyCategory::Other => "その他",
        }
    }

    fn keywords(&self) -> &'static [&'static str] {
        match self {
            LegacyCategory::Egg => &["卵", "たまご", "玉子", "egg"],
            LegacyCategory::Milk => &["牛乳", "ぎゅうにゅう", "ミルク", "milk"],
            LegacyCategory::Meat => &["肉", "にく", "meat", "牛肉", "豚肉", "鶏肉"],
            LegacyCategory::Vegetable => &[
                "野菜", "やさい", "vegetable", "キャベツ", "にんじん", "たまねぎ", "トマト",
            ],
            LegacyCategory::Frozen => &[
                "冷凍", "れいとう", "frozen", "冷凍食品", "冷凍野菜", "冷凍肉", "冷凍ごはん",
                "冷凍ピザ", "冷凍うどん", "冷凍パン",
            ],
            LegacyCategory::Other => &["その他", "other"],
        }
    }
}

impl fmt::Display for LegacyCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LegacyCategory {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LegacyCategory::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| Error::InvalidInput(format!("Unknown item category: {}", s)))
    }
}

/// Guess a legacy category from a free-form item name.
///
/// Categories are tried in declaration order; the first keyword hit wins.
pub fn detect_category(item_name: &str) -> Option<LegacyCategory> {
    let lower = item_name.to_lowercase();
    LegacyCategory::ALL.into_iter().find(|category| {
        category
            .keywords()
            .iter()
            .any(|kw| lower.contains(&kw.to_lowercase()))
    })
}

/// Units offered for every category.
pub const COMMON_UNITS: &[&str] = &["g", "kg", "個", "パック", "枚"];

/// Extra units offered for vegetables.
pub const VEGETABLE_UNITS: &[&str] = &["個", "半分", "1/4", "袋", "房"];

/// Units for a category, de-duplicated, common units first.
pub fn units_for_category(category: Category) -> Vec<&'static str> {
    let mut units: Vec<&'static str> = COMMON_UNITS.to_vec();
    if category == Category::Vegetable {
        for unit in VEGETABLE_UNITS {
            if !units.contains(unit) {
                units.push(unit);
            }
        }
    }
    units
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct DefaultItem {
    pub name: &'static str,
    pub category: Category,
    pub emoji: &'static str,
    pub default_unit: &'static str,
}

const fn item(
    name: &'static str,
    category: Category,
    emoji: &'static str,
    default_unit: &'static str,
) -> DefaultItem {
    DefaultItem { name, category, emoji, default_unit }
}

/// Staple items shown before a region has any data.
pub const DEFAULT_ITEMS: &[DefaultItem] = &[
    item("キャベツ", Category::Vegetable, "🥬", "個"),
    item("玉ねぎ", Category::Vegetable, "🧅", "個"),
    item("にんじん", Category::Vegetable, "🥕", "個"),
    item("トマト", Category::Vegetable, "🍅", "個"),
    item("きゅうり", Category::Vegetable, "🥒", "個"),
    item("レタス", Category::Vegetable, "🥬", "個"),
    item("白菜", Category::Vegetable, "🥬", "個"),
    item("じゃがいも", Category::Vegetable, "🥔", "個"),
    item("鶏もも", Category::Meat, "🍗", "g"),
    item("鶏むね", Category::Meat, "🍗", "g"),
    item("豚こま", Category::Meat, "🥩", "g"),
    item("豚バラ", Category::Meat, "🥩", "g"),
    item("牛こま", Category::Meat, "🥩", "g"),
    item("合い挽き肉", Category::Meat, "🥩", "g"),
    item("鮭", Category::Fish, "🐟", "切れ"),
    item("さんま", Category::Fish, "🐟", "尾"),
    item("いわし", Category::Fish, "🐟", "尾"),
    item("さば", Category::Fish, "🐟", "切れ"),
    item("まぐろ", Category::Fish, "🐟", "g"),
    item("食パン", Category::Other, "🍞", "斤"),
    item("卵", Category::Other, "🥚", "パック"),
    item("牛乳", Category::Other, "🥛", "本"),
    item("豆腐", Category::Other, "🧈", "丁"),
];

#[derive(Debug, Clone, Copy, Serialize)]
pub struct ReferencePrice {
    pub item_name: &'static str,
    pub category: Category,
    pub emoji: &'static str,
    pub unit: &'static str,
    pub min_price: i64,
    pub max_price: i64,
    pub note: &'static str,
}

const NATIONAL_AVERAGE: &str = "全国平均（参考）";

const fn reference(
    item_name: &'static str,
    category: Category,
    emoji: &'static str,
    unit: &'static str,
    min_price: i64,
    max_price: i64,
) -> ReferencePrice {
    ReferencePrice {
        item_name,
        category,
        emoji,
        unit,
        min_price,
        max_price,
        note: NATIONAL_AVERAGE,
    }
}

/// Reference price ranges displayed when no community data exists yet.
pub const REFERENCE_PRICES: &[ReferencePrice] = &[
    reference("キャベツ", Category::Vegetable, "🥬", "個", 98, 198),
    reference("玉ねぎ", Category::Vegetable, "🧅", "個", 50, 150),
    reference("にんじん", Category::Vegetable, "🥕", "個", 80, 180),
    reference("トマト", Category::Vegetable, "🍅", "個", 100, 300),
    reference("きゅうり", Category::Vegetable, "🥒", "個", 50, 150),
    reference("レタス", Category::Vegetable, "🥬", "個", 100, 250),
    reference("白菜", Category::Vegetable, "🥬", "個", 150, 400),
    reference("じゃがいも", Category::Vegetable, "🥔", "個", 30, 100),
    reference("鶏もも", Category::Meat, "🍗", "100g", 80, 150),
    reference("鶏むね", Category::Meat, "🍗", "100g", 60, 120),
    reference("豚こま", Category::Meat, "🥩", "100g", 100, 200),
    reference("豚バラ", Category::Meat, "🥩", "100g", 120, 250),
    reference("牛こま", Category::Meat, "🥩", "100g", 200, 400),
    reference("合い挽き肉", Category::Meat, "🥩", "100g", 150, 300),
    reference("鮭", Category::Fish, "🐟", "1切れ", 150, 400),
    reference("さんま", Category::Fish, "🐟", "1尾", 80, 200),
    reference("いわし", Category::Fish, "🐟", "1尾", 50, 150),
    reference("さば", Category::Fish, "🐟", "1切れ", 100, 300),
    reference("まぐろ", Category::Fish, "🐟", "100g", 200, 500),
    reference("食パン", Category::Other, "🍞", "1斤", 100, 300),
    reference("卵", Category::Other, "🥚", "1パック", 150, 300),
    reference("牛乳", Category::Other, "🥛", "1本", 150, 250),
    reference("豆腐", Category::Other, "🧈", "1丁", 30, 80),
];
