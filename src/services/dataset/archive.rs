//! zip 解压与 CSV 解码

use std::fs::File;
use std::path::{Path, PathBuf};

use csv::StringRecord;
use tracing::{debug, warn};

use crate::errors::{Result, WeblocationError};
use crate::models::Category;

use super::source::remove_artifacts;

/// 解压出的两张表
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedTables {
    pub blocks: PathBuf,
    pub locations: PathBuf,
}

pub fn blocks_member(category: Category) -> String {
    format!("GeoLite2-{}-Blocks-IPv4.csv", category)
}

pub fn locations_member(category: Category) -> String {
    format!("GeoLite2-{}-Locations-en.csv", category)
}

/// 只解压 Blocks-IPv4 与 Locations-en 两个成员，其余忽略
///
/// 归档内的目录层级被去掉，文件直接写到 `dst`。
pub fn extract_archive(path: &Path, category: Category, dst: &Path) -> Result<ExtractedTables> {
    let file = File::open(path).map_err(|e| {
        WeblocationError::download(format!("Cannot open archive {}: {}", path.display(), e))
    })?;
    let mut archive = zip::ZipArchive::new(file)?;

    let blocks_name = blocks_member(category);
    let locations_name = locations_member(category);
    let mut blocks: Option<PathBuf> = None;
    let mut locations: Option<PathBuf> = None;

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        if entry.is_dir() {
            continue;
        }

        let member = entry.name().to_string();
        let (slot, target_name) = if member.ends_with(&blocks_name) {
            (&mut blocks, &blocks_name)
        } else if member.ends_with(&locations_name) {
            (&mut locations, &locations_name)
        } else {
            continue;
        };

        let out_path = dst.join(target_name);
        let mut out = File::create(&out_path)?;
        std::io::copy(&mut entry, &mut out)?;
        debug!("Extracted {} -> {}", member, out_path.display());
        *slot = Some(out_path);
    }

    match (blocks, locations) {
        (Some(blocks), Some(locations)) => Ok(ExtractedTables { blocks, locations }),
        (blocks, locations) => {
            let extracted: Vec<PathBuf> = blocks.into_iter().chain(locations).collect();
            remove_artifacts(&extracted);
            Err(WeblocationError::download(format!(
                "Archive {} is missing {} or {}",
                path.display(),
                blocks_name,
                locations_name
            )))
        }
    }
}

/// 读取 CSV：跳过表头，允许行长度不一
///
/// 无法解码的行跳过并计数。
pub fn read_csv(path: &Path) -> Result<Vec<StringRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)?;

    let mut records = Vec::new();
    let mut skipped = 0usize;
    for record in reader.records() {
        match record {
            Ok(r) => records.push(r),
            Err(e) => {
                skipped += 1;
                debug!("Skipping undecodable row in {}: {}", path.display(), e);
            }
        }
    }

    if skipped > 0 {
        warn!("Skipped {} undecodable rows in {}", skipped, path.display());
    }
    Ok(records)
}
