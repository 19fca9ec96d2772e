//! 结果补充：天气 + 汇率
//!
//! 两个分支并发执行，各自单次请求、不重试，
//! 失败只记录日志并使用兜底值，互不取消。

mod exchange;
mod provider;
mod weather;

use std::sync::Arc;

use tracing::warn;

pub use exchange::{HttpExchangeRateProvider, rate_pair};
pub use provider::{ExchangeRateLookup, WeatherLookup, exchange_rate_provider, weather_provider};
pub use weather::{OpenWeatherProvider, StaticWeatherProvider, parse_weather};

use crate::config::EnrichmentConfig;
use crate::models::{EnrichedResult, ResolvedLocation, WeatherReading};

#[derive(Clone)]
pub struct EnrichmentOrchestrator {
    weather: Arc<dyn WeatherLookup>,
    rates: Arc<dyn ExchangeRateLookup>,
}

impl EnrichmentOrchestrator {
    pub fn new(weather: Arc<dyn WeatherLookup>, rates: Arc<dyn ExchangeRateLookup>) -> Self {
        Self { weather, rates }
    }

    pub fn from_config(config: &EnrichmentConfig) -> Self {
        Self::new(weather_provider(config), exchange_rate_provider(config))
    }

    pub fn weather_provider_name(&self) -> &'static str {
        self.weather.name()
    }

    pub async fn enrich(&self, location: &ResolvedLocation) -> EnrichedResult {
        let (base, target) = rate_pair(&location.currency_code);

        let (weather, rate) = tokio::join!(
            self.weather.current(&location.city_code),
            self.rates.rate(base, target)
        );

        let weather = weather.unwrap_or_else(|e| {
            warn!(
                "Weather lookup for city {} via {} failed: {}",
                location.city_code,
                self.weather.name(),
                e
            );
            WeatherReading::synthetic()
        });
        let currency_rate = rate.unwrap_or_else(|e| {
            warn!("Exchange rate lookup {}/{} failed: {}", base, target, e);
            String::new()
        });

        EnrichedResult {
            city: location.city_name.clone(),
            currency: location.currency_code.clone(),
            currency_rate,
            temperature_c: weather.temperature_c,
            feels_like_c: weather.feels_like_c,
            cloud_cover_percent: weather.cloud_cover_percent,
        }
    }
}
