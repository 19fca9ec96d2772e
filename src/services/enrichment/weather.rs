use async_trait::async_trait;
use tracing::{trace, warn};
use ureq::Agent;

use super::provider::WeatherLookup;
use crate::errors::{Result, WeblocationError};
use crate::models::WeatherReading;

/// OpenWeather 当前天气
///
/// `url_template` 使用 `{city}` 与 `{key}` 作为占位符
pub struct OpenWeatherProvider {
    url_template: String,
    key: String,
    agent: Agent,
}

impl OpenWeatherProvider {
    pub fn new(url_template: &str, key: &str, agent: Agent) -> Self {
        Self {
            url_template: url_template.to_string(),
            key: key.to_string(),
            agent,
        }
    }

    /// 同步请求（在 spawn_blocking 中调用）
    fn fetch_sync(agent: Agent, url: String) -> Result<WeatherReading> {
        let resp = agent.get(&url).call().map_err(|e| {
            WeblocationError::enrichment_transport(format!("Weather request failed: {}", e))
        })?;
        let json: serde_json::Value = resp.into_body().read_json().map_err(|e| {
            WeblocationError::enrichment_transport(format!("Weather response parse failed: {}", e))
        })?;
        parse_weather(&json)
    }
}

/// 解析 `main.temp`、`main.feels_like`、`clouds.all`
pub fn parse_weather(json: &serde_json::Value) -> Result<WeatherReading> {
    let field = |value: &serde_json::Value, name: &str| {
        value.as_f64().ok_or_else(|| {
            WeblocationError::enrichment_transport(format!("Weather response has no {}", name))
        })
    };

    let temperature_c = field(&json["main"]["temp"], "main.temp")?;
    let feels_like_c = field(&json["main"]["feels_like"], "main.feels_like")?;
    let clouds = field(&json["clouds"]["all"], "clouds.all")?;

    Ok(WeatherReading {
        temperature_c,
        feels_like_c,
        cloud_cover_percent: clouds.clamp(0.0, 100.0).round() as u8,
    })
}

#[async_trait]
impl WeatherLookup for OpenWeatherProvider {
    async fn current(&self, city_code: &str) -> Result<WeatherReading> {
        let url = self
            .url_template
            .replace("{city}", city_code)
            .replace("{key}", &self.key);
        let agent = self.agent.clone();

        let reading = tokio::task::spawn_blocking(move || Self::fetch_sync(agent, url))
            .await
            .map_err(|e| {
                warn!("Weather spawn_blocking failed: {}", e);
                WeblocationError::enrichment_transport(format!("Weather task failed: {}", e))
            })??;

        trace!("Weather for city {}: {:?}", city_code, reading);
        Ok(reading)
    }

    fn name(&self) -> &'static str {
        "OpenWeather"
    }
}

/// 固定读数，不发请求
#[derive(Debug, Clone, Copy)]
pub struct StaticWeatherProvider {
    reading: WeatherReading,
}

impl Default for StaticWeatherProvider {
    fn default() -> Self {
        Self {
            reading: WeatherReading::synthetic(),
        }
    }
}

#[async_trait]
impl WeatherLookup for StaticWeatherProvider {
    async fn current(&self, _city_code: &str) -> Result<WeatherReading> {
        Ok(self.reading)
    }

    fn name(&self) -> &'static str {
        "Static"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_weather() {
        let body = json!({
            "weather": [{"main": "Clouds"}],
            "main": {"temp": 3.52, "feels_like": -0.4, "humidity": 80},
            "clouds": {"all": 75},
            "name": "Saint Petersburg"
        });
        let reading = parse_weather(&body).unwrap();
        assert_eq!(reading.temperature_c, 3.52);
        assert_eq!(reading.feels_like_c, -0.4);
        assert_eq!(reading.cloud_cover_percent, 75);
    }

    #[test]
    fn test_parse_weather_missing_field() {
        let body = json!({"cod": 401, "message": "Invalid API key"});
        let err = parse_weather(&body).unwrap_err();
        assert!(matches!(err, WeblocationError::EnrichmentTransport(_)));
    }

    #[tokio::test]
    async fn test_static_provider_returns_synthetic_reading() {
        let provider = StaticWeatherProvider::default();
        let reading = provider.current("498817").await.unwrap();
        assert_eq!(reading.temperature_c, 10.0);
        assert_eq!(reading.feels_like_c, 11.0);
        assert_eq!(reading.cloud_cover_percent, 40);
    }

    /// 依赖外部网络服务，CI 环境可能失败
    #[tokio::test]
    #[ignore]
    async fn test_open_weather_real() {
        let key = std::env::var("WEATHER_KEY").unwrap();
        let provider = OpenWeatherProvider::new(
            "https://api.openweathermap.org/data/2.5/weather?id={city}&units=metric&appid={key}",
            &key,
            super::super::provider::get_agent(5),
        );
        assert!(provider.current("498817").await.is_ok());
    }
}
