//! 区间索引存储
//!
//! - `memory`：进程内有序结构（默认，单实例部署）
//! - `redis`：有序集合 + Hash，多个实例共享同一份索引

use std::sync::Arc;

use tracing::info;

use crate::config::StoreConfig;
use crate::errors::{Result, WeblocationError};

pub mod backends;
pub mod register;
pub mod traits;

pub use backends::{MemoryRangeStore, RedisRangeStore};
pub use traits::RangeStore;

/// 访客计数器 key
pub const VISITORS_KEY: &str = "visitors";

pub struct StoreFactory;

impl StoreFactory {
    /// 按配置中的 `store.type` 创建存储后端
    pub async fn create(config: &StoreConfig) -> Result<Arc<dyn RangeStore>> {
        register::debug_store_registry();

        let constructor = register::get_store_plugin(&config.store_type).ok_or_else(|| {
            WeblocationError::store_plugin_not_found(format!(
                "Store plugin '{}' not found. Valid: memory, redis",
                config.store_type
            ))
        })?;

        let store = constructor(config.clone()).await?;
        info!("Using range store backend: {}", store.name());
        Ok(store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_factory_creates_memory_store() {
        let config = StoreConfig::default();
        let store = StoreFactory::create(&config).await.unwrap();
        assert_eq!(store.name(), "memory");
    }

    #[tokio::test]
    async fn test_factory_unknown_plugin() {
        let config = StoreConfig {
            store_type: "sled".to_string(),
            ..Default::default()
        };
        let err = StoreFactory::create(&config).await.err().unwrap();
        assert!(matches!(err, WeblocationError::StorePluginNotFound(_)));
    }
}
