//! Server mode
//!
//! Prepares the store and services, starts the refresh scheduler and serves
//! the HTTP routes until the server stops or Ctrl+C is received.

use actix_web::{
    App, HttpServer,
    middleware::{Compress, DefaultHeaders},
    web,
};
use anyhow::{Context, Result};
use tracing::warn;

use crate::api::services::{AppStartTime, health_routes, location_routes};
use crate::config::get_config;
use crate::runtime::lifetime;

/// 启动 HTTP 服务，调用前需要先初始化日志
pub async fn run_server() -> Result<()> {
    let app_start_time = AppStartTime {
        start_datetime: chrono::Utc::now(),
    };

    let config = get_config();
    let (startup, scheduler) = lifetime::startup::prepare_server_startup(&config)
        .await
        .inspect_err(|e| tracing::error!("Could not prepare location services: {:#}", e))?;

    let location_service = startup.location_service.clone();
    let refresh_service = startup.refresh_service.clone();

    let cpu_count = config.server.cpu_count.clamp(1, 32);
    warn!("HTTP workers: {}", cpu_count);

    if config.server.trusted_proxies.is_empty() {
        warn!(
            "No trusted proxies configured: X-Forwarded-For is honored only \
             when the peer address is private"
        );
    } else {
        warn!("Trusted proxies: {:?}", config.server.trusted_proxies);
    }

    let bind_address = format!("{}:{}", config.server.host, config.server.port);

    let server = HttpServer::new(move || {
        App::new()
            .wrap(Compress::default())
            .wrap(DefaultHeaders::new().add(("Cache-Control", "no-cache, no-store, must-revalidate")))
            .app_data(web::Data::new(location_service.clone()))
            .app_data(web::Data::new(refresh_service.clone()))
            .app_data(web::Data::new(app_start_time.clone()))
            .configure(health_routes)
            .configure(location_routes)
    })
    .keep_alive(std::time::Duration::from_secs(30))
    .client_request_timeout(std::time::Duration::from_millis(5000))
    .workers(cpu_count);

    warn!("weblocation listening on http://{}", bind_address);
    let server = server
        .bind(&bind_address)
        .with_context(|| format!("Failed to bind {}", bind_address))?
        .run();

    tokio::select! {
        res = server => {
            res.context("HTTP server terminated with an error")?;
        }
        _ = lifetime::shutdown::listen_for_shutdown(scheduler) => {
            warn!("Graceful shutdown complete");
        }
    }

    Ok(())
}
