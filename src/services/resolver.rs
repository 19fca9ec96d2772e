//! 区间解析
//!
//! 查找 score ≤ 查询地址的最大成员，再与字典联表。
//! 索引为空、查不到或存储出错时统一使用 `FallbackTable` 中的兜底值。

use std::sync::Arc;

use tracing::{debug, warn};

use crate::errors::WeblocationError;
use crate::models::{Category, ResolvedLocation};
use crate::store::RangeStore;

/// 单个分类的兜底值
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fallback {
    pub code: String,
    pub name: String,
}

impl Fallback {
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
        }
    }
}

/// 各分类的兜底值
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FallbackTable {
    pub country: Fallback,
    pub city: Fallback,
    pub currency: Fallback,
}

impl Default for FallbackTable {
    fn default() -> Self {
        Self {
            country: Fallback::new("Russia", "Russia"),
            city: Fallback::new("498817", "Saint-Petersburg"),
            currency: Fallback::new("RUB", "RUB"),
        }
    }
}

impl FallbackTable {
    pub fn get(&self, category: Category) -> &Fallback {
        match category {
            Category::Country => &self.country,
            Category::City => &self.city,
            Category::Currency => &self.currency,
        }
    }
}

#[derive(Clone)]
pub struct RangeResolver {
    store: Arc<dyn RangeStore>,
    fallbacks: FallbackTable,
}

impl RangeResolver {
    pub fn new(store: Arc<dyn RangeStore>) -> Self {
        Self::with_fallbacks(store, FallbackTable::default())
    }

    pub fn with_fallbacks(store: Arc<dyn RangeStore>, fallbacks: FallbackTable) -> Self {
        Self { store, fallbacks }
    }

    pub fn fallbacks(&self) -> &FallbackTable {
        &self.fallbacks
    }

    /// 地址所属区间的 code
    ///
    /// 同分成员任取其一；地址低于全部起始地址时返回兜底 code。
    pub async fn resolve_code(&self, category: Category, address: u32) -> String {
        let fallback = &self.fallbacks.get(category).code;
        let Some(set) = category.range_set() else {
            return fallback.clone();
        };

        match self.store.floor(set, address).await {
            Ok(Some(member)) => member.code,
            Ok(None) => {
                let miss = WeblocationError::lookup_miss(format!(
                    "{} has no range at or below {}",
                    set, address
                ));
                debug!("{}, using '{}'", miss, fallback);
                fallback.clone()
            }
            Err(e) => {
                warn!("{} range lookup failed: {}, using '{}'", category, e, fallback);
                fallback.clone()
            }
        }
    }

    /// code 的显示名称，查不到或为空时返回兜底名称
    pub async fn resolve_name(&self, category: Category, code: &str) -> String {
        let fallback = &self.fallbacks.get(category).name;
        self.lookup_field(category.dictionary(), code)
            .await
            .unwrap_or_else(|| fallback.clone())
    }

    /// 国家 code 对应的货币代码
    ///
    /// 有 ISO 附属字典时先转换为 ISO 代码，否则直接用 code 查询。
    pub async fn currency_for(&self, country_code: &str) -> String {
        let iso = match Category::Country.iso_dictionary() {
            Some(dict) => self.lookup_field(dict, country_code).await,
            None => None,
        };
        let key = iso.as_deref().unwrap_or(country_code);

        self.lookup_field(Category::Currency.dictionary(), key)
            .await
            .unwrap_or_else(|| self.fallbacks.currency.code.clone())
    }

    /// 国家分支与城市分支并发执行
    pub async fn resolve_location(&self, address: u32) -> ResolvedLocation {
        let country = async {
            let code = self.resolve_code(Category::Country, address).await;
            let (name, currency) = tokio::join!(
                self.resolve_name(Category::Country, &code),
                self.currency_for(&code)
            );
            (code, name, currency)
        };
        let city = async {
            let code = self.resolve_code(Category::City, address).await;
            let name = self.resolve_name(Category::City, &code).await;
            (code, name)
        };

        let ((country_code, country_name, currency_code), (city_code, city_name)) =
            tokio::join!(country, city);

        ResolvedLocation {
            country_code,
            country_name,
            city_code,
            city_name,
            currency_code,
        }
    }

    async fn lookup_field(&self, dict: &str, field: &str) -> Option<String> {
        match self.store.get_field(dict, field).await {
            Ok(Some(value)) if !value.is_empty() => Some(value),
            Ok(_) => {
                debug!("{}", WeblocationError::lookup_miss(format!("{}[{}]", dict, field)));
                None
            }
            Err(e) => {
                warn!("Dictionary lookup {}[{}] failed: {}", dict, field, e);
                None
            }
        }
    }
}
