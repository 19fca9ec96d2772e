use std::sync::Arc;
use std::time::{Duration, Instant};

use actix_web::{HttpResponse, Responder, web};
use serde::Serialize;
use tracing::{error, trace};

use crate::services::{LocationService, RefreshOutcome, RefreshService};

// 应用启动时间结构体
#[derive(Clone, Debug)]
pub struct AppStartTime {
    pub start_datetime: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
    pub uptime: u64,
    pub store: StoreCheck,
    pub refresh: Vec<RefreshOutcome>,
    pub response_time_ms: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreCheck {
    pub status: String,
    pub backend: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visitors: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

pub struct HealthService;

impl HealthService {
    pub async fn health_check(
        location: web::Data<LocationService>,
        refresh: web::Data<Arc<RefreshService>>,
        app_start_time: web::Data<AppStartTime>,
    ) -> impl Responder {
        let start_time = Instant::now();
        trace!("Received health check request");

        let backend = location.store_name().to_string();
        let store = match tokio::time::timeout(Duration::from_secs(5), location.visitors()).await {
            Ok(Ok(visitors)) => StoreCheck {
                status: "healthy".to_string(),
                backend,
                visitors: Some(visitors),
                error: None,
            },
            Ok(Err(e)) => {
                error!("Store health check failed: {}", e);
                StoreCheck {
                    status: "unhealthy".to_string(),
                    backend,
                    visitors: None,
                    error: Some(e.to_string()),
                }
            }
            Err(_) => {
                error!("Store health check timeout");
                StoreCheck {
                    status: "unhealthy".to_string(),
                    backend,
                    visitors: None,
                    error: Some("timeout".to_string()),
                }
            }
        };

        let now = chrono::Utc::now();
        let is_healthy = store.status == "healthy";
        let body = HealthResponse {
            status: store.status.clone(),
            timestamp: now.to_rfc3339(),
            uptime: (now - app_start_time.start_datetime).num_seconds().max(0) as u64,
            store,
            refresh: refresh.outcomes(),
            response_time_ms: start_time.elapsed().as_millis() as u32,
        };

        if is_healthy {
            HttpResponse::Ok().json(body)
        } else {
            HttpResponse::ServiceUnavailable().json(body)
        }
    }
}

pub fn health_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(HealthService::health_check))
        .route("/health", web::head().to(HealthService::health_check));
}
