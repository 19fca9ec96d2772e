//! HTTP 数据集来源
//!
//! 配置了 MaxMind license key 时使用官方下载地址，否则使用公共镜像。
//! Currency 始终是单个 CSV 文件。

use std::fs::File;
use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info};
use ureq::Agent;

use crate::config::DatasetConfig;
use crate::errors::{Result, WeblocationError};
use crate::models::Category;

use super::archive::{extract_archive, read_csv};
use super::source::{DatasetSource, RawDataset, remove_artifacts};

const CURRENCY_FILE_NAME: &str = "country-code-to-currency-code-mapping.csv";

pub struct HttpDatasetSource {
    config: DatasetConfig,
    agent: Agent,
}

impl HttpDatasetSource {
    pub fn new(config: &DatasetConfig) -> Self {
        let agent: Agent = Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(config.download_timeout_secs)))
            .build()
            .into();

        Self {
            config: config.clone(),
            agent,
        }
    }

    /// 分类对应的下载地址
    pub fn resolve_uri(&self, category: Category) -> String {
        resolve_uri(&self.config, category)
    }

    /// 同步下载与解码（在 spawn_blocking 中调用）
    fn fetch_blocking(config: DatasetConfig, agent: Agent, category: Category) -> Result<RawDataset> {
        let url = resolve_uri(&config, category);
        let scratch = config.scratch_dir();
        std::fs::create_dir_all(&scratch)?;

        debug!("Downloading {} dataset from {}", category, redact_key(&url));
        let resp = agent.get(&url).call().map_err(|e| {
            WeblocationError::download(format!(
                "Failed to download {} dataset: {}",
                category, e
            ))
        })?;

        if !category.is_maxmind() {
            let path = scratch.join(CURRENCY_FILE_NAME);
            save_body(resp, &path)?;
            let rows = read_csv(&path).inspect_err(|_| remove_artifacts(&[path.clone()]))?;
            return Ok(RawDataset::new(category, Vec::new(), rows).with_artifacts(vec![path]));
        }

        let file_name = content_disposition_filename(resp.headers())
            .unwrap_or_else(|| default_archive_name(category));
        let archive_path = scratch.join(file_name);
        save_body(resp, &archive_path)?;

        let tables = extract_archive(&archive_path, category, &scratch)
            .inspect_err(|_| remove_artifacts(&[archive_path.clone()]))?;
        let artifacts = vec![
            archive_path,
            tables.blocks.clone(),
            tables.locations.clone(),
        ];

        let decoded = read_csv(&tables.blocks)
            .and_then(|blocks| Ok((blocks, read_csv(&tables.locations)?)));
        match decoded {
            Ok((blocks, locations)) => {
                Ok(RawDataset::new(category, blocks, locations).with_artifacts(artifacts))
            }
            Err(e) => {
                remove_artifacts(&artifacts);
                Err(e)
            }
        }
    }
}

#[async_trait]
impl DatasetSource for HttpDatasetSource {
    async fn fetch(&self, category: Category) -> Result<RawDataset> {
        let config = self.config.clone();
        let agent = self.agent.clone();

        let raw = tokio::task::spawn_blocking(move || Self::fetch_blocking(config, agent, category))
            .await
            .map_err(|e| {
                WeblocationError::download(format!("Download task for {} failed: {}", category, e))
            })??;

        info!(
            "Fetched {} dataset: {} block rows, {} location rows",
            category,
            raw.blocks.len(),
            raw.locations.len()
        );
        Ok(raw)
    }

    fn name(&self) -> &'static str {
        "http"
    }
}

pub fn resolve_uri(config: &DatasetConfig, category: Category) -> String {
    match category {
        Category::Currency => config.currency_url.clone(),
        _ => match config.maxmind_key.as_deref().filter(|k| !k.is_empty()) {
            Some(key) => config
                .maxmind_url_template
                .replace("{category}", category.as_ref())
                .replace("{key}", key),
            None if category == Category::Country => config.country_mirror_url.clone(),
            None => config.city_mirror_url.clone(),
        },
    }
}

/// `Content-Disposition` 中的 `filename=`，只保留最后一段路径
pub fn content_disposition_filename(headers: &ureq::http::HeaderMap) -> Option<String> {
    let value = headers.get("content-disposition")?.to_str().ok()?;
    value
        .split(';')
        .filter_map(|part| part.trim().strip_prefix("filename="))
        .map(|name| name.trim().trim_matches('"'))
        .filter_map(|name| Path::new(name).file_name()?.to_str().map(String::from))
        .find(|name| !name.is_empty())
}

/// 例：`GeoLite2-City-CSV-01312024.zip`
pub fn default_archive_name(category: Category) -> String {
    format!(
        "GeoLite2-{}-CSV-{}.zip",
        category,
        chrono::Utc::now().format("%m%d%Y")
    )
}

fn save_body(resp: ureq::http::Response<ureq::Body>, path: &Path) -> Result<()> {
    let mut reader = resp.into_body().into_reader();
    let mut file = File::create(path)?;
    if let Err(e) = std::io::copy(&mut reader, &mut file) {
        remove_artifacts(&[path.to_path_buf()]);
        return Err(WeblocationError::download(format!(
            "Failed to save {}: {}",
            path.display(),
            e
        )));
    }
    Ok(())
}

fn redact_key(url: &str) -> String {
    match url.find("license_key=") {
        Some(pos) => {
            let start = pos + "license_key=".len();
            let end = url[start..].find('&').map(|i| start + i).unwrap_or(url.len());
            format!("{}***{}", &url[..start], &url[end..])
        }
        None => url.to_string(),
    }
}
