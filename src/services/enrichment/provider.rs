//! 外部数据源抽象层
//!
//! 根据配置选择实现：
//! - 配置了 weather_key → OpenWeatherProvider
//! - 未配置 → StaticWeatherProvider（固定读数，不发请求）

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info};
use ureq::Agent;

use super::exchange::HttpExchangeRateProvider;
use super::weather::{OpenWeatherProvider, StaticWeatherProvider};
use crate::config::EnrichmentConfig;
use crate::errors::Result;
use crate::models::WeatherReading;

/// 天气查询
#[async_trait]
pub trait WeatherLookup: Send + Sync {
    /// 按城市 code 查询当前天气
    async fn current(&self, city_code: &str) -> Result<WeatherReading>;

    /// 获取 provider 名称（用于日志）
    fn name(&self) -> &'static str;
}

/// 汇率查询
#[async_trait]
pub trait ExchangeRateLookup: Send + Sync {
    /// 返回原样的汇率字符串（已去除首尾空白）
    async fn rate(&self, from: &str, to: &str) -> Result<String>;

    fn name(&self) -> &'static str;
}

static HTTP_AGENT: OnceLock<Agent> = OnceLock::new();

/// 外部数据源共享的 HTTP Agent，超时取首次初始化时的配置
pub(super) fn get_agent(timeout_secs: u64) -> Agent {
    HTTP_AGENT
        .get_or_init(|| {
            Agent::config_builder()
                .timeout_global(Some(Duration::from_secs(timeout_secs)))
                .build()
                .into()
        })
        .clone()
}

pub fn weather_provider(config: &EnrichmentConfig) -> Arc<dyn WeatherLookup> {
    let provider: Arc<dyn WeatherLookup> = match config
        .weather_key
        .as_deref()
        .filter(|k| !k.trim().is_empty())
    {
        Some(key) => Arc::new(OpenWeatherProvider::new(
            &config.weather_url_template,
            key,
            get_agent(config.http_timeout_secs),
        )),
        None => {
            debug!("Weather: no credential configured, using static reading");
            Arc::new(StaticWeatherProvider::default())
        }
    };
    info!("Weather: Initialized with {} provider", provider.name());
    provider
}

pub fn exchange_rate_provider(config: &EnrichmentConfig) -> Arc<dyn ExchangeRateLookup> {
    Arc::new(HttpExchangeRateProvider::new(
        &config.exchange_rate_url_template,
        get_agent(config.http_timeout_secs),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_selection_by_credential() {
        let config = EnrichmentConfig::default();
        assert_eq!(weather_provider(&config).name(), "Static");

        let config = EnrichmentConfig {
            weather_key: Some("   ".into()),
            ..Default::default()
        };
        assert_eq!(weather_provider(&config).name(), "Static");

        let config = EnrichmentConfig {
            weather_key: Some("appid".into()),
            ..Default::default()
        };
        assert_eq!(weather_provider(&config).name(), "OpenWeather");
    }
}
