use std::time::Duration;

use tokio::signal;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{info, warn};

/// 关闭超时时间（秒）
const SHUTDOWN_TIMEOUT_SECS: u64 = 10;

/// 等待 Ctrl+C，然后停止刷新调度
///
/// 正在进行的刷新会被中断，下次启动时重新刷新。
pub async fn listen_for_shutdown(scheduler: JoinHandle<()>) {
    match signal::ctrl_c().await {
        Ok(()) => {
            info!("Shutdown signal received, stopping refresh scheduler...");
        }
        Err(e) => {
            warn!(
                "Failed to listen for Ctrl+C: {}. Proceeding with shutdown anyway.",
                e
            );
        }
    }

    scheduler.abort();
    match timeout(Duration::from_secs(SHUTDOWN_TIMEOUT_SECS), scheduler).await {
        Ok(_) => info!("Refresh scheduler stopped"),
        Err(_) => warn!(
            "Refresh scheduler did not stop within {} seconds",
            SHUTDOWN_TIMEOUT_SECS
        ),
    }
}
