use std::path::PathBuf;

use async_trait::async_trait;
use csv::StringRecord;
use tracing::{trace, warn};

use crate::errors::Result;
use crate::models::Category;

/// 一次下载得到的原始表格数据
///
/// Currency 没有 blocks 表，映射行放在 `locations` 中。
#[derive(Debug, Clone)]
pub struct RawDataset {
    pub category: Category,
    pub blocks: Vec<StringRecord>,
    pub locations: Vec<StringRecord>,
    /// 临时目录中的文件，由构建阶段负责删除
    pub artifacts: Vec<PathBuf>,
}

impl RawDataset {
    pub fn new(category: Category, blocks: Vec<StringRecord>, locations: Vec<StringRecord>) -> Self {
        Self {
            category,
            blocks,
            locations,
            artifacts: Vec::new(),
        }
    }

    pub fn with_artifacts(mut self, artifacts: Vec<PathBuf>) -> Self {
        self.artifacts = artifacts;
        self
    }

    /// 删除临时文件，失败只记录日志
    pub fn cleanup(&self) {
        remove_artifacts(&self.artifacts);
    }
}

pub(crate) fn remove_artifacts(paths: &[PathBuf]) {
    for path in paths {
        match std::fs::remove_file(path) {
            Ok(()) => trace!("Removed scratch file {}", path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!("Failed to remove scratch file {}: {}", path.display(), e),
        }
    }
}

/// 数据集来源
#[async_trait]
pub trait DatasetSource: Send + Sync {
    /// 下载并解码指定分类的数据集，不重试
    async fn fetch(&self, category: Category) -> Result<RawDataset>;

    fn name(&self) -> &'static str;
}
