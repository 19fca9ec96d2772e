use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::config::StaticConfig;
use crate::services::{
    EnrichmentOrchestrator, HttpDatasetSource, LocationService, RangeResolver, RefreshService,
};
use crate::store::{RangeStore, StoreFactory};

pub struct StartupContext {
    pub store: Arc<dyn RangeStore>,
    pub location_service: LocationService,
    pub refresh_service: Arc<RefreshService>,
}

/// 创建存储并组装各个服务
///
/// 所有组件显式持有同一个存储句柄。
pub async fn prepare_services(config: &StaticConfig) -> Result<StartupContext> {
    let start_time = std::time::Instant::now();
    debug!("Preparing services...");

    let store = StoreFactory::create(&config.store)
        .await
        .context("Failed to create range store backend")?;

    let resolver = RangeResolver::new(store.clone());
    let orchestrator = EnrichmentOrchestrator::from_config(&config.enrichment);
    let location_service = LocationService::new(store.clone(), resolver, orchestrator);

    let source = Arc::new(HttpDatasetSource::new(&config.dataset));
    let refresh_service = Arc::new(RefreshService::new(
        store.clone(),
        source,
        config.dataset.clone(),
    ));

    debug!("Services prepared in {:?}", start_time.elapsed());
    Ok(StartupContext {
        store,
        location_service,
        refresh_service,
    })
}

/// 启动后立即刷新一次，之后按固定间隔刷新
///
/// 刷新在后台进行，期间的查询使用旧索引或兜底值。
pub fn spawn_refresh_scheduler(refresh: Arc<RefreshService>, interval_secs: u64) -> JoinHandle<()> {
    let period = Duration::from_secs(interval_secs.max(1));
    info!("Dataset refresh scheduled every {:?}", period);

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            refresh.refresh_all().await;
        }
    })
}

/// 服务器模式：组装服务并启动刷新调度
pub async fn prepare_server_startup(
    config: &StaticConfig,
) -> Result<(StartupContext, JoinHandle<()>)> {
    let context = prepare_services(config).await?;
    let scheduler = spawn_refresh_scheduler(
        context.refresh_service.clone(),
        config.dataset.refresh_interval_secs,
    );
    Ok((context, scheduler))
}
