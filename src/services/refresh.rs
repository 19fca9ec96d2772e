//! 数据集刷新
//!
//! 三个分类各自一个 tokio 任务：下载 → 构建（清理临时文件）→ 整体替换。
//! 某个分类失败只放弃该分类本轮刷新，旧索引保持不变。

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use strum::IntoEnumIterator;
use tracing::{debug, error, info};

use crate::config::DatasetConfig;
use crate::errors::{Result, WeblocationError};
use crate::models::Category;
use crate::services::dataset::DatasetSource;
use crate::services::index::{self, BuiltIndex};
use crate::store::RangeStore;

/// 单个分类最近一次刷新的结果
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshOutcome {
    pub category: Category,
    pub success: bool,
    pub finished_at: DateTime<Utc>,
    pub ranges: usize,
    pub entries: usize,
    pub skipped: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RefreshOutcome {
    fn succeeded(category: Category, index: &BuiltIndex) -> Self {
        Self {
            category,
            success: true,
            finished_at: Utc::now(),
            ranges: index.ranges.len(),
            entries: index.dictionary.len(),
            skipped: index.skipped(),
            error: None,
        }
    }

    fn failed(category: Category, err: &WeblocationError) -> Self {
        Self {
            category,
            success: false,
            finished_at: Utc::now(),
            ranges: 0,
            entries: 0,
            skipped: 0,
            error: Some(err.to_string()),
        }
    }
}

pub struct RefreshService {
    store: Arc<dyn RangeStore>,
    source: Arc<dyn DatasetSource>,
    dataset: DatasetConfig,
    outcomes: RwLock<HashMap<Category, RefreshOutcome>>,
    /// 同一时间只允许一轮刷新
    running: tokio::sync::Mutex<()>,
}

impl RefreshService {
    pub fn new(
        store: Arc<dyn RangeStore>,
        source: Arc<dyn DatasetSource>,
        dataset: DatasetConfig,
    ) -> Self {
        Self {
            store,
            source,
            dataset,
            outcomes: RwLock::new(HashMap::new()),
            running: tokio::sync::Mutex::new(()),
        }
    }

    /// 下载、构建并替换单个分类
    pub async fn refresh_category(&self, category: Category) -> Result<BuiltIndex> {
        debug!("Refreshing {} via {} source", category, self.source.name());
        let raw = self.source.fetch(category).await?;
        let layout = self.dataset.layout(category);

        let built = tokio::task::spawn_blocking(move || {
            let result = index::build(category, &layout, &raw);
            raw.cleanup();
            result
        })
        .await
        .map_err(|e| {
            WeblocationError::empty_dataset(format!("{} build task failed: {}", category, e))
        })??;

        index::persist(self.store.as_ref(), &built).await?;
        Ok(built)
    }

    /// 单个分类刷新并记录结果
    pub async fn refresh_one(&self, category: Category) -> RefreshOutcome {
        let outcome = match self.refresh_category(category).await {
            Ok(built) => {
                info!(
                    "{} refresh finished: {} ranges, {} entries, {} rows skipped",
                    category,
                    built.ranges.len(),
                    built.dictionary.len(),
                    built.skipped()
                );
                RefreshOutcome::succeeded(category, &built)
            }
            Err(e) => {
                error!("{} refresh abandoned, keeping previous index: {}", category, e);
                RefreshOutcome::failed(category, &e)
            }
        };
        self.outcomes.write().insert(category, outcome.clone());
        outcome
    }

    /// 三个分类并行刷新，全部结束后返回
    pub async fn refresh_all(self: &Arc<Self>) -> Vec<RefreshOutcome> {
        let _guard = self.running.lock().await;
        info!("Refreshing all datasets");

        let handles: Vec<_> = Category::iter()
            .map(|category| {
                let service = Arc::clone(self);
                (
                    category,
                    tokio::spawn(async move { service.refresh_one(category).await }),
                )
            })
            .collect();

        let mut outcomes = Vec::with_capacity(handles.len());
        for (category, handle) in handles {
            match handle.await {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => {
                    let err = WeblocationError::download(format!(
                        "{} refresh task panicked: {}",
                        category, e
                    ));
                    error!("{}", err);
                    let outcome = RefreshOutcome::failed(category, &err);
                    self.outcomes.write().insert(category, outcome.clone());
                    outcomes.push(outcome);
                }
            }
        }

        let failed = outcomes.iter().filter(|o| !o.success).count();
        info!(
            "Dataset refresh complete: {} succeeded, {} failed",
            outcomes.len() - failed,
            failed
        );
        outcomes
    }

    /// 最近一次结果，按 Country / City / Currency 排序
    pub fn outcomes(&self) -> Vec<RefreshOutcome> {
        let outcomes = self.outcomes.read();
        Category::iter()
            .filter_map(|c| outcomes.get(&c).cloned())
            .collect()
    }
}
