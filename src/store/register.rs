use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, RwLock};

use once_cell::sync::Lazy;

use crate::config::StoreConfig;
use crate::errors::Result;
use crate::store::backends::{MemoryRangeStore, RedisRangeStore};
use crate::store::traits::RangeStore;

pub type BoxedStoreFuture = Pin<Box<dyn Future<Output = Result<Arc<dyn RangeStore>>> + Send>>;
pub type StoreConstructor = Arc<dyn Fn(StoreConfig) -> BoxedStoreFuture + Send + Sync>;

static STORE_REGISTRY: Lazy<RwLock<HashMap<String, StoreConstructor>>> = Lazy::new(|| {
    let mut registry: HashMap<String, StoreConstructor> = HashMap::new();
    registry.insert(
        "memory".to_string(),
        Arc::new(|_config: StoreConfig| {
            Box::pin(async {
                Ok(Arc::new(MemoryRangeStore::new()) as Arc<dyn RangeStore>)
            }) as BoxedStoreFuture
        }),
    );
    registry.insert(
        "redis".to_string(),
        Arc::new(|config: StoreConfig| {
            Box::pin(async move {
                let store = RedisRangeStore::connect(&config.redis).await?;
                Ok(Arc::new(store) as Arc<dyn RangeStore>)
            }) as BoxedStoreFuture
        }),
    );
    RwLock::new(registry)
});

/// 注册额外的存储后端（同名覆盖）
pub fn register_store_plugin<S: Into<String>>(name: S, constructor: StoreConstructor) {
    let name = name.into();
    tracing::debug!("Registering store plugin: {}", name);
    let mut registry = STORE_REGISTRY
        .write()
        .expect("Store registry RwLock poisoned - a thread panicked while holding the lock");
    registry.insert(name, constructor);
}

pub fn get_store_plugin(name: &str) -> Option<StoreConstructor> {
    STORE_REGISTRY
        .read()
        .expect("Store registry RwLock poisoned - a thread panicked while holding the lock")
        .get(name)
        .cloned()
}

pub fn debug_store_registry() {
    let registry = STORE_REGISTRY.read().expect("Store registry RwLock poisoned");
    if registry.is_empty() {
        tracing::debug!("No Store plugins registered.");
    } else {
        tracing::debug!("Registered Store plugins:");
        for key in registry.keys() {
            tracing::debug!(" - {}", key);
        }
    }
}
