use async_trait::async_trait;
use tracing::trace;
use ureq::Agent;

use super::provider::ExchangeRateLookup;
use crate::errors::{Result, WeblocationError};

/// 汇率基准货币：默认 EUR，目标本身是 EUR 时改用 USD
pub fn rate_pair(currency: &str) -> (&'static str, &str) {
    if currency.eq_ignore_ascii_case("EUR") {
        ("USD", currency)
    } else {
        ("EUR", currency)
    }
}

/// 响应体即汇率字符串
///
/// `url_template` 使用 `{from}` 与 `{to}` 作为占位符
pub struct HttpExchangeRateProvider {
    url_template: String,
    agent: Agent,
}

impl HttpExchangeRateProvider {
    pub fn new(url_template: &str, agent: Agent) -> Self {
        Self {
            url_template: url_template.to_string(),
            agent,
        }
    }

    fn fetch_sync(agent: Agent, url: String) -> Result<String> {
        let resp = agent.get(&url).call().map_err(|e| {
            WeblocationError::enrichment_transport(format!("Exchange rate request failed: {}", e))
        })?;
        let body = resp.into_body().read_to_string().map_err(|e| {
            WeblocationError::enrichment_transport(format!("Exchange rate body unreadable: {}", e))
        })?;
        Ok(body.trim().to_string())
    }
}

#[async_trait]
impl ExchangeRateLookup for HttpExchangeRateProvider {
    async fn rate(&self, from: &str, to: &str) -> Result<String> {
        let url = self
            .url_template
            .replace("{from}", from)
            .replace("{to}", to);
        let agent = self.agent.clone();

        let rate = tokio::task::spawn_blocking(move || Self::fetch_sync(agent, url))
            .await
            .map_err(|e| {
                WeblocationError::enrichment_transport(format!("Exchange rate task failed: {}", e))
            })??;

        trace!("Exchange rate {}/{}: {}", from, to, rate);
        Ok(rate)
    }

    fn name(&self) -> &'static str {
        "HttpExchangeRate"
    }
}
