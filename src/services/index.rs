//! 区间索引构建
//!
//! blocks 表的每行 CIDR 转成 `(起始地址, RangeMember)`，
//! locations 表按列布局转成 code → 名称字典。
//! 持久化为整体替换：先删除该分类的全部 key，再写入。

use csv::StringRecord;
use tracing::{debug, info, warn};

use crate::config::ColumnLayout;
use crate::errors::{Result, WeblocationError};
use crate::models::{AddressPoint, Category, LocationDictionary, RangeMember};
use crate::services::dataset::RawDataset;
use crate::store::RangeStore;
use crate::utils::ip::cidr_start;

/// 一个分类构建完成的索引
#[derive(Debug, Clone, Default)]
pub struct BuiltIndex {
    pub category: Option<Category>,
    pub ranges: Vec<(u32, RangeMember)>,
    pub dictionary: LocationDictionary,
    /// CIDR 格式错误（含 IPv6）被跳过的行数
    pub skipped_malformed: usize,
    /// code 不在字典中被跳过的行数
    pub skipped_unmapped: usize,
}

impl BuiltIndex {
    pub fn skipped(&self) -> usize {
        self.skipped_malformed + self.skipped_unmapped
    }
}

/// 从 locations 表构建字典
///
/// key 为空或列数不足的行跳过。
pub fn build_dictionary(layout: &ColumnLayout, records: &[StringRecord]) -> LocationDictionary {
    let mut dictionary = LocationDictionary::new();

    for record in records {
        let Some(key) = record.get(layout.key_column).map(str::trim) else {
            continue;
        };
        if key.is_empty() {
            continue;
        }
        let Some(value) = record.get(layout.value_column) else {
            continue;
        };
        dictionary.insert(key, value.trim());

        if let Some(iso) = layout
            .iso_column
            .and_then(|col| record.get(col))
            .map(str::trim)
            .filter(|iso| !iso.is_empty())
        {
            dictionary.insert_iso(key, iso);
        }
    }

    dictionary
}

/// 解析一行 block，返回起始地址
pub fn parse_block(layout: &ColumnLayout, record: &StringRecord) -> Result<AddressPoint> {
    let network = record.get(layout.network_column).ok_or_else(|| {
        WeblocationError::malformed_row(format!("Row {:?} has no network column", record))
    })?;
    let address = cidr_start(network)?;
    let code = record
        .get(layout.block_code_column)
        .map(str::trim)
        .unwrap_or_default()
        .to_string();
    Ok(AddressPoint { address, code })
}

/// 构建索引与字典
///
/// Currency 只构建字典。任一输入表没有可用行时返回 `EmptyDataset`。
pub fn build(category: Category, layout: &ColumnLayout, raw: &RawDataset) -> Result<BuiltIndex> {
    let dictionary = build_dictionary(layout, &raw.locations);
    if dictionary.is_empty() {
        return Err(WeblocationError::empty_dataset(format!(
            "{} locations table has no usable rows ({} read)",
            category,
            raw.locations.len()
        )));
    }

    let mut index = BuiltIndex {
        category: Some(category),
        dictionary,
        ..Default::default()
    };

    if category.range_set().is_none() {
        return Ok(index);
    }

    for (seq, record) in raw.blocks.iter().enumerate() {
        let point = match parse_block(layout, record) {
            Ok(point) => point,
            Err(e) => {
                index.skipped_malformed += 1;
                debug!("{}: skipping block row {}: {}", category, seq, e);
                continue;
            }
        };

        if !index.dictionary.contains(&point.code) {
            index.skipped_unmapped += 1;
            continue;
        }

        index
            .ranges
            .push((point.address, RangeMember::new(point.code, seq as u64)));
    }

    if index.ranges.is_empty() {
        return Err(WeblocationError::empty_dataset(format!(
            "{} blocks table has no usable rows ({} read, {} malformed, {} unmapped)",
            category,
            raw.blocks.len(),
            index.skipped_malformed,
            index.skipped_unmapped
        )));
    }

    if index.skipped_malformed > 0 {
        warn!(
            "{}: skipped {} malformed block rows",
            category, index.skipped_malformed
        );
    }

    Ok(index)
}

/// 整体替换该分类在存储中的全部 key（非事务）
pub async fn persist(store: &dyn RangeStore, index: &BuiltIndex) -> Result<()> {
    let Some(category) = index.category else {
        return Err(WeblocationError::store_operation(
            "Cannot persist an index without a category",
        ));
    };

    for key in category.owned_keys() {
        store.delete(key).await?;
    }

    if let Some(set) = category.range_set() {
        store.add_ranges(set, &index.ranges).await?;
    }

    let names: Vec<(String, String)> = index
        .dictionary
        .names()
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    store.set_fields(category.dictionary(), &names).await?;

    if let Some(iso_dict) = category.iso_dictionary() {
        let iso: Vec<(String, String)> = index
            .dictionary
            .iso_codes()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        if !iso.is_empty() {
            store.set_fields(iso_dict, &iso).await?;
        }
    }

    info!(
        "{} index persisted to {}: {} ranges, {} dictionary entries, {} rows skipped",
        category,
        store.name(),
        index.ranges.len(),
        index.dictionary.len(),
        index.skipped()
    );
    Ok(())
}
