use serde::{Deserialize, Serialize};

use crate::models::Category;

/// 静态配置（从 TOML 加载，启动时使用）
///
/// 包含：
/// - server: 服务器地址、端口、CPU 数量、可信代理
/// - store: 区间索引存储后端
/// - dataset: 数据集下载与列布局
/// - enrichment: 天气 / 汇率外部服务
/// - logging: 日志配置
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StaticConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub dataset: DatasetConfig,
    #[serde(default)]
    pub enrichment: EnrichmentConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl StaticConfig {
    /// 从 TOML 文件和环境变量加载配置
    ///
    /// 优先级：ENV > config.toml > 默认值
    /// ENV 前缀：WL，分隔符：__
    /// 示例：WL__SERVER__PORT=9999
    pub fn load(path: &str) -> Self {
        use config::{Config, Environment, File};

        let builder = Config::builder()
            // 1. 从 TOML 文件加载（可选）
            .add_source(File::with_name(path).required(false))
            // 2. 从环境变量覆盖，前缀 WL，分隔符 __
            .add_source(
                Environment::with_prefix("WL")
                    .separator("__")
                    .try_parsing(true),
            );

        let mut config = match builder.build() {
            Ok(settings) => match settings.try_deserialize::<StaticConfig>() {
                Ok(config) => {
                    if std::path::Path::new(path).exists() {
                        eprintln!("[INFO] Configuration loaded from: {}", path);
                    }
                    config
                }
                Err(e) => {
                    eprintln!("[ERROR] Failed to deserialize config: {}", e);
                    Self::default()
                }
            },
            Err(e) => {
                eprintln!("[ERROR] Failed to build config: {}", e);
                Self::default()
            }
        };

        config.apply_legacy_env();
        config
    }

    /// 兼容旧的凭证环境变量 MAXMIND_KEY / WEATHER_KEY（仅在配置未设置时生效）
    pub fn apply_legacy_env(&mut self) {
        if self.dataset.maxmind_key.is_none() {
            self.dataset.maxmind_key = non_empty_env("MAXMIND_KEY");
        }
        if self.enrichment.weather_key.is_none() {
            self.enrichment.weather_key = non_empty_env("WEATHER_KEY");
        }
    }

    /// 生成示例 TOML 配置文件
    pub fn generate_sample_config() -> String {
        let sample_config = Self::default();
        toml::to_string_pretty(&sample_config)
            .unwrap_or_else(|e| format!("Error generating sample config: {}", e))
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_server_host")]
    pub host: String,
    #[serde(default = "default_server_port")]
    pub port: u16,
    #[serde(default = "default_cpu_count")]
    pub cpu_count: usize,
    /// 可信反向代理（单 IP 或 CIDR），命中时使用 X-Forwarded-For
    #[serde(default)]
    pub trusted_proxies: Vec<String>,
}

/// 区间索引存储配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(rename = "type")]
    #[serde(default = "default_store_type")]
    pub store_type: String,
    #[serde(default)]
    pub redis: RedisConfig,
}

/// Redis 配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisConfig {
    #[serde(default = "default_redis_url")]
    pub url: String,
    #[serde(default = "default_redis_key_prefix")]
    pub key_prefix: String,
    /// 每条 ZADD / HSET 命令携带的最大成员数
    #[serde(default = "default_redis_batch_size")]
    pub batch_size: usize,
}

/// CSV 列布局（0-based）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnLayout {
    /// Locations 表中 code 所在列
    pub key_column: usize,
    /// Locations 表中显示名称（Currency 为货币代码）所在列
    pub value_column: usize,
    /// Locations 表中 ISO 国家代码所在列（仅 Country）
    #[serde(default)]
    pub iso_column: Option<usize>,
    /// Blocks 表中 CIDR 所在列
    #[serde(default)]
    pub network_column: usize,
    /// Blocks 表中 code 所在列
    #[serde(default = "default_block_code_column")]
    pub block_code_column: usize,
}

impl ColumnLayout {
    /// GeoLite2-Country-Locations-en.csv:
    /// geoname_id,locale_code,continent_code,continent_name,country_iso_code,country_name,...
    pub fn country() -> Self {
        Self {
            key_column: 0,
            value_column: 5,
            iso_column: Some(4),
            network_column: 0,
            block_code_column: 1,
        }
    }

    /// GeoLite2-City-Locations-en.csv 多出 subdivision 列，city_name 在第 10 列
    pub fn city() -> Self {
        Self {
            key_column: 0,
            value_column: 10,
            iso_column: None,
            network_column: 0,
            block_code_column: 1,
        }
    }

    /// country-code-to-currency-code-mapping.csv: Country,CountryCode,Currency,Code
    pub fn currency() -> Self {
        Self {
            key_column: 1,
            value_column: 3,
            iso_column: None,
            network_column: 0,
            block_code_column: 1,
        }
    }
}

/// 数据集配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetConfig {
    /// MaxMind license key；未配置时使用公共镜像
    #[serde(default)]
    pub maxmind_key: Option<String>,
    /// 使用 {category} 与 {key} 作为占位符
    #[serde(default = "default_maxmind_url_template")]
    pub maxmind_url_template: String,
    #[serde(default = "default_country_mirror_url")]
    pub country_mirror_url: String,
    #[serde(default = "default_city_mirror_url")]
    pub city_mirror_url: String,
    #[serde(default = "default_currency_url")]
    pub currency_url: String,
    /// 下载与解压的临时目录，默认系统临时目录
    #[serde(default)]
    pub scratch_dir: Option<String>,
    #[serde(default = "default_download_timeout")]
    pub download_timeout_secs: u64,
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval_secs: u64,
    #[serde(default = "ColumnLayout::country")]
    pub country: ColumnLayout,
    #[serde(default = "ColumnLayout::city")]
    pub city: ColumnLayout,
    #[serde(default = "ColumnLayout::currency")]
    pub currency: ColumnLayout,
}

impl DatasetConfig {
    pub fn layout(&self, category: Category) -> ColumnLayout {
        match category {
            Category::Country => self.country,
            Category::City => self.city,
            Category::Currency => self.currency,
        }
    }

    pub fn scratch_dir(&self) -> std::path::PathBuf {
        self.scratch_dir
            .as_ref()
            .filter(|d| !d.is_empty())
            .map(std::path::PathBuf::from)
            .unwrap_or_else(std::env::temp_dir)
    }
}

/// 外部数据源配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichmentConfig {
    /// OpenWeather appid；未配置时使用固定天气读数
    #[serde(default)]
    pub weather_key: Option<String>,
    /// 使用 {city} 与 {key} 作为占位符
    #[serde(default = "default_weather_url_template")]
    pub weather_url_template: String,
    /// 使用 {from} 与 {to} 作为占位符
    #[serde(default = "default_exchange_rate_url_template")]
    pub exchange_rate_url_template: String,
    #[serde(default = "default_http_timeout")]
    pub http_timeout_secs: u64,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
    #[serde(default)]
    pub file: Option<String>,
    #[serde(default = "default_max_backups")]
    pub max_backups: u32,
    #[serde(default = "default_enable_rotation")]
    pub enable_rotation: bool,
}

// ============================================================
// Default value functions for static config
// ============================================================

fn default_server_host() -> String {
    "127.0.0.1".to_string()
}

fn default_server_port() -> u16 {
    8080
}

fn default_cpu_count() -> usize {
    num_cpus::get()
}

fn default_store_type() -> String {
    "memory".to_string()
}

fn default_redis_url() -> String {
    "redis://127.0.0.1:6379/5".to_string()
}

fn default_redis_key_prefix() -> String {
    "weblocation:".to_string()
}

fn default_redis_batch_size() -> usize {
    5000
}

fn default_block_code_column() -> usize {
    1
}

fn default_maxmind_url_template() -> String {
    "https://download.maxmind.com/app/geoip_download?edition_id=GeoLite2-{category}-CSV&license_key={key}&suffix=zip".to_string()
}

fn default_country_mirror_url() -> String {
    "https://gist.github.com/ShutovAndrey/16f98ad0cff549a782a31942e456f1ba/raw/8ca6715285b02b125772c45ae0b67babc21cad95/GeoLite2-Country-CSV.zip".to_string()
}

fn default_city_mirror_url() -> String {
    "https://gist.github.com/ShutovAndrey/dada04a211a785856cd383c858410c8c/raw/78775d68b7ed276538bdc11811f1d15182a56169/GeoLite2-City-CSV.zip".to_string()
}

fn default_currency_url() -> String {
    "https://gist.githubusercontent.com/HarishChaudhari/4680482/raw/b61a5bdf5f3d5c69399f9d9e592c4896fd0dc53c/country-code-to-currency-code-mapping.csv".to_string()
}

fn default_download_timeout() -> u64 {
    300
}

fn default_refresh_interval() -> u64 {
    24 * 60 * 60
}

fn default_weather_url_template() -> String {
    "https://api.openweathermap.org/data/2.5/weather?id={city}&units=metric&appid={key}"
        .to_string()
}

fn default_exchange_rate_url_template() -> String {
    "https://api.coingate.com/v2/rates/merchant/{from}/{to}".to_string()
}

fn default_http_timeout() -> u64 {
    5
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

fn default_max_backups() -> u32 {
    5
}

fn default_enable_rotation() -> bool {
    true
}

// ============================================================
// Default implementations
// ============================================================

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_server_host(),
            port: default_server_port(),
            cpu_count: default_cpu_count(),
            trusted_proxies: Vec::new(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            store_type: default_store_type(),
            redis: RedisConfig::default(),
        }
    }
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: default_redis_url(),
            key_prefix: default_redis_key_prefix(),
            batch_size: default_redis_batch_size(),
        }
    }
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            maxmind_key: None,
            maxmind_url_template: default_maxmind_url_template(),
            country_mirror_url: default_country_mirror_url(),
            city_mirror_url: default_city_mirror_url(),
            currency_url: default_currency_url(),
            scratch_dir: None,
            download_timeout_secs: default_download_timeout(),
            refresh_interval_secs: default_refresh_interval(),
            country: ColumnLayout::country(),
            city: ColumnLayout::city(),
            currency: ColumnLayout::currency(),
        }
    }
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            weather_key: None,
            weather_url_template: default_weather_url_template(),
            exchange_rate_url_template: default_exchange_rate_url_template(),
            http_timeout_secs: default_http_timeout(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            file: None,
            max_backups: default_max_backups(),
            enable_rotation: default_enable_rotation(),
        }
    }
}
