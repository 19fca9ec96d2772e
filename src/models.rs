//! 核心数据模型
//!
//! - `Category`：数据集分区（Country / City / Currency）
//! - `AddressPoint` / `RangeMember`：区间索引的条目
//! - `LocationDictionary`：code → 显示名称
//! - `ResolvedLocation` / `EnrichedResult` / `LocationReport`：请求级结果

use std::collections::HashMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumIter};

use crate::errors::WeblocationError;

/// 数据集分类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter, AsRefStr)]
#[strum(serialize_all = "PascalCase")]
pub enum Category {
    Country,
    City,
    Currency,
}

impl Category {
    /// 区间索引的 key，Currency 没有区间索引
    pub fn range_set(&self) -> Option<&'static str> {
        match self {
            Self::Country => Some("ip_country"),
            Self::City => Some("ip_city"),
            Self::Currency => None,
        }
    }

    /// 字典的 key
    pub fn dictionary(&self) -> &'static str {
        match self {
            Self::Country => "countries",
            Self::City => "cities",
            Self::Currency => "currency",
        }
    }

    /// 附属字典（仅 Country 有：geoname_id → ISO 国家代码）
    pub fn iso_dictionary(&self) -> Option<&'static str> {
        match self {
            Self::Country => Some("country_iso"),
            _ => None,
        }
    }

    /// 重建时需要整体删除的全部 key
    pub fn owned_keys(&self) -> Vec<&'static str> {
        let mut keys: Vec<&'static str> = Vec::with_capacity(3);
        keys.extend(self.range_set());
        keys.push(self.dictionary());
        keys.extend(self.iso_dictionary());
        keys
    }

    /// 是否为 MaxMind GeoLite2 的 zip 数据集
    pub fn is_maxmind(&self) -> bool {
        matches!(self, Self::Country | Self::City)
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl FromStr for Category {
    type Err = WeblocationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "country" => Ok(Self::Country),
            "city" => Ok(Self::City),
            "currency" => Ok(Self::Currency),
            _ => Err(WeblocationError::unknown_category(format!(
                "Unknown DB '{}'. Valid: Country, City, Currency",
                s
            ))),
        }
    }
}

/// 一个 CIDR 块的起始地址及其所属 code
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressPoint {
    pub address: u32,
    pub code: String,
}

/// 区间索引成员：code + 源数据行号
///
/// 同一个 code 会对应很多 CIDR 块，行号保证成员唯一。
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RangeMember {
    pub code: String,
    pub seq: u64,
}

impl RangeMember {
    pub fn new(code: impl Into<String>, seq: u64) -> Self {
        Self {
            code: code.into(),
            seq,
        }
    }
}

/// code → 显示名称
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocationDictionary {
    names: HashMap<String, String>,
    iso_codes: HashMap<String, String>,
}

impl LocationDictionary {
    pub fn new() -> Self {
        Self::default()
    }

    /// 同一 code 重复出现时以最后一行为准
    pub fn insert(&mut self, code: impl Into<String>, name: impl Into<String>) {
        self.names.insert(code.into(), name.into());
    }

    pub fn insert_iso(&mut self, code: impl Into<String>, iso: impl Into<String>) {
        self.iso_codes.insert(code.into(), iso.into());
    }

    pub fn get(&self, code: &str) -> Option<&str> {
        self.names.get(code).map(String::as_str)
    }

    pub fn contains(&self, code: &str) -> bool {
        self.names.contains_key(code)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = (&String, &String)> {
        self.names.iter()
    }

    pub fn iso_codes(&self) -> impl Iterator<Item = (&String, &String)> {
        self.iso_codes.iter()
    }
}

/// 解析器的输出
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedLocation {
    pub country_code: String,
    pub country_name: String,
    pub city_code: String,
    pub city_name: String,
    pub currency_code: String,
}

/// 天气读数
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeatherReading {
    pub temperature_c: f64,
    pub feels_like_c: f64,
    pub cloud_cover_percent: u8,
}

impl WeatherReading {
    /// 未配置天气凭证时使用的固定读数
    pub fn synthetic() -> Self {
        Self {
            temperature_c: 10.0,
            feels_like_c: 11.0,
            cloud_cover_percent: 40,
        }
    }
}

/// 编排器的输出
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedResult {
    pub city: String,
    pub currency: String,
    pub currency_rate: String,
    pub temperature_c: f64,
    pub feels_like_c: f64,
    pub cloud_cover_percent: u8,
}

/// 交给展示层的扁平记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationReport {
    pub ip: String,
    pub country: String,
    pub city: String,
    pub currency: String,
    pub currency_rate: String,
    pub temperature_c: f64,
    pub feels_like_c: f64,
    pub cloud_cover_percent: u8,
}

impl LocationReport {
    pub fn new(ip: String, location: &ResolvedLocation, enriched: EnrichedResult) -> Self {
        Self {
            ip,
            country: location.country_name.clone(),
            city: enriched.city,
            currency: enriched.currency,
            currency_rate: enriched.currency_rate,
            temperature_c: enriched.temperature_c,
            feels_like_c: enriched.feels_like_c,
            cloud_cover_percent: enriched.cloud_cover_percent,
        }
    }
}
