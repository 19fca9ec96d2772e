use std::sync::Arc;

use tracing::{trace, warn};

use crate::errors::Result;
use crate::models::LocationReport;
use crate::services::enrichment::EnrichmentOrchestrator;
use crate::services::resolver::RangeResolver;
use crate::store::{RangeStore, VISITORS_KEY};
use crate::utils::ip::{encode, query_address};

/// 每个请求的入口：地址推导 → 解析 → 补充
///
/// HTTP 与 CLI 共用。
#[derive(Clone)]
pub struct LocationService {
    store: Arc<dyn RangeStore>,
    resolver: RangeResolver,
    orchestrator: EnrichmentOrchestrator,
}

impl LocationService {
    pub fn new(
        store: Arc<dyn RangeStore>,
        resolver: RangeResolver,
        orchestrator: EnrichmentOrchestrator,
    ) -> Self {
        Self {
            store,
            resolver,
            orchestrator,
        }
    }

    /// 从不失败：所有缺失都由兜底值填充
    pub async fn locate(&self, raw_ip: &str) -> LocationReport {
        let address = query_address(raw_ip);

        if let Err(e) = self.store.incr(VISITORS_KEY).await {
            warn!("Failed to count visitor: {}", e);
        }

        let location = self.resolver.resolve_location(encode(address)).await;
        trace!("Resolved {} -> {:?}", address, location);

        let enriched = self.orchestrator.enrich(&location).await;
        LocationReport::new(address.to_string(), &location, enriched)
    }

    pub async fn visitors(&self) -> Result<i64> {
        self.store.counter(VISITORS_KEY).await
    }

    pub fn store_name(&self) -> &'static str {
        self.store.name()
    }
}
