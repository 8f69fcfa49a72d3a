//! Region hierarchy: big region → prefecture → city
//!
//! Posts carry up to three region levels plus the legacy `area_group`
//! string. Readers filter on the most specific level the caller supplied.

use serde::{Deserialize, Serialize};

/// Region levels as supplied by a client. Empty strings count as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionSelection {
    #[serde(default)]
    pub big: Option<String>,
    #[serde(default)]
    pub prefecture: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
}

impl RegionSelection {
    pub fn new(big: Option<&str>, prefecture: Option<&str>, city: Option<&str>) -> Self {
        Self {
            big: big.map(str::to_string),
            prefecture: prefecture.map(str::to_string),
            city: city.map(str::to_string),
        }
    }

    pub fn big(&self) -> Option<&str> {
        non_empty(self.big.as_deref())
    }

    pub fn prefecture(&self) -> Option<&str> {
        non_empty(self.prefecture.as_deref())
    }

    pub fn city(&self) -> Option<&str> {
        non_empty(self.city.as_deref())
    }

    pub fn is_empty(&self) -> bool {
        self.big().is_none() && self.prefecture().is_none() && self.city().is_none()
    }

    /// Most specific level present, if any.
    pub fn most_specific(&self) -> Option<RegionFilter> {
        if let Some(city) = self.city() {
            Some(RegionFilter::City(city.to_string()))
        } else if let Some(pref) = self.prefecture() {
            Some(RegionFilter::Prefecture(pref.to_string()))
        } else {
            self.big().map(|big| RegionFilter::Big(big.to_string()))
        }
    }

    /// Filter for legacy readers: falls back to the default area group.
    pub fn filter_or_area_group(&self, default_area_group: &str) -> RegionFilter {
        self.most_specific()
            .unwrap_or_else(|| RegionFilter::AreaGroup(default_area_group.to_string()))
    }

    /// Filter for item statistics: falls back to the default big region.
    pub fn filter_or_big(&self, default_big: &str) -> RegionFilter {
        self.most_specific()
            .unwrap_or_else(|| RegionFilter::Big(default_big.to_string()))
    }
}

/// A single-column equality filter on the `posts` or `daily_quotes` table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegionFilter {
    City(String),
    Prefecture(String),
    Big(String),
    AreaGroup(String),
}

impl RegionFilter {
    pub fn column(&self) -> &'static str {
        match self {
            RegionFilter::City(_) => "region_city",
            RegionFilter::Prefecture(_) => "region_pref",
            RegionFilter::Big(_) => "region_big",
            RegionFilter::AreaGroup(_) => "area_group",
        }
    }

    pub fn value(&self) -> &str {
        match self {
            RegionFilter::City(v)
            | RegionFilter::Prefecture(v)
            | RegionFilter::Big(v)
            | RegionFilter::AreaGroup(v) => v,
        }
    }
}

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.filter(|v| !v.trim().is_empty())
}

/// Legacy `area_group` value written alongside the region columns.
pub fn area_group_for(selection: &RegionSelection, default_area_group: &str) -> String {
    selection
        .city()
        .or_else(|| selection.prefecture())
        .or_else(|| selection.big())
        .unwrap_or(default_area_group)
        .to_string()
}

/// Region component of the item grouping key: the most specific level, or "".
pub fn region_key(big: Option<&str>, prefecture: Option<&str>, city: Option<&str>) -> String {
    non_empty(city)
        .or_else(|| non_empty(prefecture))
        .or_else(|| non_empty(big))
        .unwrap_or("")
        .to_string()
}

/// Display form `📍 中部／愛知県／名古屋市`; absent levels are omitted.
pub fn format_region_display(
    big: Option<&str>,
    prefecture: Option<&str>,
    city: Option<&str>,
) -> String {
    let parts: Vec<&str> = [big, prefecture, city]
        .into_iter()
        .filter_map(non_empty)
        .collect();

    if parts.is_empty() {
        return String::new();
    }
    format!("📍 {}", parts.join("／"))
}

/// A big region with its prefectures and the default selection for it.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct BigRegion {
    pub name: &'static str,
    pub prefectures: &'static [&'static str],
    pub default_prefecture: &'static str,
    pub default_city: &'static str,
}

pub const REGION_BIG_OPTIONS: &[BigRegion] = &[
    BigRegion {
        name: "北海道",
        prefectures: &["北海道"],
        default_prefecture: "北海道",
        default_city: "札幌市",
    },
    BigRegion {
        name: "東北",
        prefectures: &["青森県", "岩手県", "宮城県", "秋田県", "山形県", "福島県"],
        default_prefecture: "宮城県",
        default_city: "仙台市",
    },
    BigRegion {
        name: "関東",
        prefectures: &["茨城県", "栃木県", "群馬県", "埼玉県", "千葉県", "東京都", "神奈川県"],
        default_prefecture: "東京都",
        default_city: "世田谷区",
    },
    BigRegion {
        name: "中部",
        prefectures: &[
            "新潟県", "富山県", "石川県", "福井県", "山梨県", "長野県", "岐阜県", "静岡県", "愛知県",
        ],
        default_prefecture: "愛知県",
        default_city: "名古屋市",
    },
    BigRegion {
        name: "近畿",
        prefectures: &["三重県", "滋賀県", "京都府", "大阪府", "兵庫県", "奈良県", "和歌山県"],
        default_prefecture: "大阪府",
        default_city: "大阪市",
    },
    BigRegion {
        name: "中国",
        prefectures: &["鳥取県", "島根県", "岡山県", "広島県", "山口県"],
        default_prefecture: "広島県",
        default_city: "広島市",
    },
    BigRegion {
        name: "四国",
        prefectures: &["徳島県", "香川県", "愛媛県", "高知県"],
        default_prefecture: "愛媛県",
        default_city: "松山市",
    },
    BigRegion {
        name: "九州・沖縄",
        prefectures: &[
            "福岡県", "佐賀県", "長崎県", "熊本県", "大分県", "宮崎県", "鹿児島県", "沖縄県",
        ],
        default_prefecture: "福岡県",
        default_city: "福岡市",
    },
];

pub fn find_big_region(name: &str) -> Option<&'static BigRegion> {
    REGION_BIG_OPTIONS.iter().find(|r| r.name == name)
}

/// Big region a prefecture belongs to.
pub fn big_region_of(prefecture: &str) -> Option<&'static BigRegion> {
    REGION_BIG_OPTIONS
        .iter()
        .find(|r| r.prefectures.contains(&prefecture))
}

/// Region levels implied by a legacy `area_group` string.
///
/// A big-region name sets `big`; a prefecture, or a string starting with a
/// prefecture's stem (`愛知西部` → 愛知県), sets `prefecture` and its `big`.
/// Anything else is unrecognized and yields an empty selection.
pub fn classify_area_group(area_group: &str) -> RegionSelection {
    let area_group = area_group.trim();
    if area_group.is_empty() {
        return RegionSelection::default();
    }

    if let Some(region) = find_big_region(area_group) {
        return RegionSelection::new(Some(region.name), None, None);
    }

    if let Some(region) = big_region_of(area_group) {
        return RegionSelection::new(Some(region.name), Some(area_group), None);
    }

    for region in REGION_BIG_OPTIONS {
        for pref in region.prefectures {
            let stem = pref.trim_end_matches(['都', '道', '府', '県']);
            if !stem.is_empty() && area_group.starts_with(stem) {
                return RegionSelection::new(Some(region.name), Some(*pref), None);
            }
        }
    }

    RegionSelection::default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_priority_city_first() {
        let sel = RegionSelection::new(Some("中部"), Some("愛知県"), Some("名古屋市"));
        assert_eq!(
            sel.filter_or_area_group("愛知西部"),
            RegionFilter::City("名古屋市".to_string())
        );

        let sel = RegionSelection::new(Some("中部"), Some("愛知県"), None);
        assert_eq!(sel.most_specific(), Some(RegionFilter::Prefecture("愛知県".to_string())));

        let sel = RegionSelection::new(Some("中部"), None, Some(""));
        assert_eq!(sel.most_specific(), Some(RegionFilter::Big("中部".to_string())));
    }

    #[test]
    fn test_filter_defaults() {
        let sel = RegionSelection::default();
        let legacy = sel.filter_or_area_group("愛知西部");
        assert_eq!(legacy.column(), "area_group");
        assert_eq!(legacy.value(), "愛知西部");

        let items = sel.filter_or_big("中部");
        assert_eq!(items.column(), "region_big");
        assert_eq!(items.value(), "中部");
    }

    #[test]
    fn test_area_group_for() {
        let sel = RegionSelection::new(Some("関東"), Some("東京都"), None);
        assert_eq!(area_group_for(&sel, "愛知西部"), "東京都");
        assert_eq!(area_group_for(&RegionSelection::default(), "愛知西部"), "愛知西部");
    }

    #[test]
    fn test_region_key() {
        assert_eq!(region_key(Some("中部"), Some("愛知県"), Some("名古屋市")), "名古屋市");
        assert_eq!(region_key(Some("中部"), None, Some(" ")), "中部");
        assert_eq!(region_key(None, None, None), "");
    }

    #[test]
    fn test_format_region_display() {
        assert_eq!(
            format_region_display(Some("中部"), Some("愛知県"), Some("名古屋市")),
            "📍 中部／愛知県／名古屋市"
        );
        assert_eq!(format_region_display(Some("中部"), None, Some("名古屋市")), "📍 中部／名古屋市");
        assert_eq!(format_region_display(None, None, None), "");
    }

    #[test]
    fn test_region_catalog() {
        assert_eq!(REGION_BIG_OPTIONS.len(), 8);
        let total: usize = REGION_BIG_OPTIONS.iter().map(|r| r.prefectures.len()).sum();
        assert_eq!(total, 47);
        for region in REGION_BIG_OPTIONS {
            assert!(region.prefectures.contains(&region.default_prefecture));
        }
        assert_eq!(big_region_of("愛知県").map(|r| r.name), Some("中部"));
        assert!(find_big_region("月面").is_none());
    }

    #[test]
    fn test_classify_area_group() {
        assert_eq!(
            classify_area_group("愛知西部"),
            RegionSelection::new(Some("中部"), Some("愛知県"), None)
        );
        assert_eq!(classify_area_group("関東"), RegionSelection::new(Some("関東"), None, None));
        assert_eq!(
            classify_area_group("大阪府"),
            RegionSelection::new(Some("近畿"), Some("大阪府"), None)
        );
        assert!(classify_area_group("どこか").is_empty());
        assert!(classify_area_group("").is_empty());
    }
}
