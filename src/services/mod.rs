//! Service layer
//!
//! - `dataset`：数据集下载与解码
//! - `index`：区间索引构建与持久化
//! - `resolver`：区间解析与兜底
//! - `enrichment`：天气与汇率补充
//! - `refresh`：三个分类的并行刷新
//! - `location`：HTTP / CLI 共用的查询入口

pub mod dataset;
pub mod enrichment;
pub mod index;
mod location;
mod refresh;
pub mod resolver;

pub use dataset::{DatasetSource, HttpDatasetSource, RawDataset};
pub use enrichment::{EnrichmentOrchestrator, ExchangeRateLookup, WeatherLookup};
pub use index::BuiltIndex;
pub use location::LocationService;
pub use refresh::{RefreshOutcome, RefreshService};
pub use resolver::{Fallback, FallbackTable, RangeResolver};
