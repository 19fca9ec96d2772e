//! 完整流程测试：zip/CSV 夹具 → 刷新 → 查询 → 补充
//!
//! 数据源与外部服务全部用本地夹具替代，不访问网络。

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tempfile::TempDir;
use zip::write::SimpleFileOptions;

use weblocation::config::DatasetConfig;
use weblocation::errors::{Result, WeblocationError};
use weblocation::models::{Category, WeatherReading};
use weblocation::services::dataset::{extract_archive, read_csv};
use weblocation::services::enrichment::StaticWeatherProvider;
use weblocation::services::{
    DatasetSource, EnrichmentOrchestrator, ExchangeRateLookup, LocationService, RangeResolver,
    RawDataset, RefreshService, WeatherLookup,
};
use weblocation::store::{MemoryRangeStore, RangeStore};

// =============================================================================
// 夹具
// =============================================================================

const COUNTRY_BLOCKS: &str = "\
network,geoname_id,registered_country_geoname_id,represented_country_geoname_id,is_anonymous_proxy,is_satellite_provider
2.16.0.0/13,2921044,2921044,,0,0
8.8.8.0/24,6252001,6252001,,0,0
134.122.0.0/16,2750405,2750405,,0,0
not-a-network,6252001,6252001,,0,0
";

const COUNTRY_LOCATIONS: &str = "\
geoname_id,locale_code,continent_code,continent_name,country_iso_code,country_name,is_in_european_union
2921044,en,EU,Europe,DE,Germany,1
6252001,en,NA,North America,US,United States,0
2750405,en,EU,Europe,NL,Netherlands,1
";

const CITY_BLOCKS: &str = "\
network,geoname_id,registered_country_geoname_id,represented_country_geoname_id,is_anonymous_proxy,is_satellite_provider,postal_code,latitude,longitude,accuracy_radius
2.16.0.0/13,2950159,2921044,,0,0,10115,52.5,13.4,100
8.8.8.0/24,5375480,6252001,,0,0,94043,37.4,-122.0,1000
134.122.0.0/16,2759794,2750405,,0,0,,52.3,4.9,50
";

const CITY_LOCATIONS: &str = "\
geoname_id,locale_code,continent_code,continent_name,country_iso_code,country_name,subdivision_1_iso_code,subdivision_1_name,subdivision_2_iso_code,subdivision_2_name,city_name,metro_code,time_zone,is_in_european_union
2950159,en,EU,Europe,DE,Germany,BE,Land Berlin,,,Berlin,,Europe/Berlin,1
5375480,en,NA,North America,US,United States,CA,California,,,Mountain View,807,America/Los_Angeles,0
2759794,en,EU,Europe,NL,Netherlands,NH,North Holland,,,Amsterdam,,Europe/Amsterdam,1
";

const CURRENCY_CSV: &str = "\
Country,CountryCode,Currency,Code
Germany,DE,Euro,EUR
United States,US,US Dollar,USD
Netherlands,NL,Euro,EUR
";

fn write_archive(dir: &Path, category: Category, blocks: &str, locations: &str) -> PathBuf {
    let path = dir.join(format!("GeoLite2-{}-CSV.zip", category));
    let file = std::fs::File::create(&path).unwrap();
    let mut zip = zip::ZipWriter::new(file);
    let prefix = format!("GeoLite2-{}-CSV_20240130", category);

    let members = [
        (format!("{}/LICENSE.txt", prefix), "license"),
        (format!("{}/GeoLite2-{}-Blocks-IPv4.csv", prefix, category), blocks),
        (format!("{}/GeoLite2-{}-Blocks-IPv6.csv", prefix, category), "network\n"),
        (format!("{}/GeoLite2-{}-Locations-en.csv", prefix, category), locations),
    ];
    for (name, body) in members {
        zip.start_file(name, SimpleFileOptions::default()).unwrap();
        zip.write_all(body.as_bytes()).unwrap();
    }
    zip.finish().unwrap();
    path
}

/// 从本地 zip / CSV 读取，与 HTTP 来源走相同的解压与解码
struct ArchiveSource {
    dir: TempDir,
}

impl ArchiveSource {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        write_archive(dir.path(), Category::Country, COUNTRY_BLOCKS, COUNTRY_LOCATIONS);
        write_archive(dir.path(), Category::City, CITY_BLOCKS, CITY_LOCATIONS);
        std::fs::write(dir.path().join("currency.csv"), CURRENCY_CSV).unwrap();
        Self { dir }
    }
}

#[async_trait]
impl DatasetSource for ArchiveSource {
    async fn fetch(&self, category: Category) -> Result<RawDataset> {
        let root = self.dir.path();
        if category == Category::Currency {
            let rows = read_csv(&root.join("currency.csv"))?;
            return Ok(RawDataset::new(category, Vec::new(), rows));
        }

        let scratch = root.join(category.to_string());
        std::fs::create_dir_all(&scratch)?;
        let archive = root.join(format!("GeoLite2-{}-CSV.zip", category));
        let tables = extract_archive(&archive, category, &scratch)?;
        let blocks = read_csv(&tables.blocks)?;
        let locations = read_csv(&tables.locations)?;
        Ok(RawDataset::new(category, blocks, locations)
            .with_artifacts(vec![tables.blocks, tables.locations]))
    }

    fn name(&self) -> &'static str {
        "archive-fixture"
    }
}

#[derive(Default)]
struct RecordingRates {
    calls: Mutex<Vec<(String, String)>>,
}

#[async_trait]
impl ExchangeRateLookup for RecordingRates {
    async fn rate(&self, from: &str, to: &str) -> Result<String> {
        self.calls
            .lock()
            .unwrap()
            .push((from.to_string(), to.to_string()));
        Ok(" 1.0842\n".trim().to_string())
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}

struct FixedWeather;

#[async_trait]
impl WeatherLookup for FixedWeather {
    async fn current(&self, city_code: &str) -> Result<WeatherReading> {
        if city_code == "2950159" {
            Ok(WeatherReading {
                temperature_c: -2.5,
                feels_like_c: -6.0,
                cloud_cover_percent: 90,
            })
        } else {
            Err(WeblocationError::enrichment_transport("404 city not found"))
        }
    }

    fn name(&self) -> &'static str {
        "fixed"
    }
}

async fn refreshed_store(source: Arc<ArchiveSource>) -> Arc<MemoryRangeStore> {
    let store = Arc::new(MemoryRangeStore::new());
    let refresh = Arc::new(RefreshService::new(
        store.clone(),
        source,
        DatasetConfig::default(),
    ));
    let outcomes = refresh.refresh_all().await;
    assert!(outcomes.iter().all(|o| o.success), "{outcomes:?}");
    store
}

fn service(
    store: Arc<MemoryRangeStore>,
    weather: Arc<dyn WeatherLookup>,
    rates: Arc<dyn ExchangeRateLookup>,
) -> LocationService {
    let resolver = RangeResolver::new(store.clone());
    LocationService::new(store, resolver, EnrichmentOrchestrator::new(weather, rates))
}

// =============================================================================
// 测试
// =============================================================================

#[tokio::test]
async fn test_refresh_builds_all_categories_and_cleans_scratch() {
    let source = Arc::new(ArchiveSource::new());
    let store = refreshed_store(source.clone()).await;

    // 格式错误的行被跳过
    assert_eq!(store.range_len("ip_country"), 3);
    assert_eq!(store.range_len("ip_city"), 3);
    assert_eq!(store.dict_len("currency"), 3);
    assert_eq!(
        store.get_field("country_iso", "2921044").await.unwrap(),
        Some("DE".to_string())
    );

    let scratch = source.dir.path().join("City");
    assert!(!scratch.join("GeoLite2-City-Blocks-IPv4.csv").exists());
    assert!(!scratch.join("GeoLite2-City-Locations-en.csv").exists());
}

#[tokio::test]
async fn test_locate_merges_resolution_and_enrichment() {
    let store = refreshed_store(Arc::new(ArchiveSource::new())).await;
    let rates = Arc::new(RecordingRates::default());
    let service = service(store.clone(), Arc::new(FixedWeather), rates.clone());

    let report = service.locate("2.18.10.10").await;
    assert_eq!(report.ip, "2.18.10.10");
    assert_eq!(report.country, "Germany");
    assert_eq!(report.city, "Berlin");
    assert_eq!(report.currency, "EUR");
    assert_eq!(report.currency_rate, "1.0842");
    assert_eq!(report.temperature_c, -2.5);
    assert_eq!(report.cloud_cover_percent, 90);

    // EUR 使用 USD 作为基准
    assert_eq!(
        rates.calls.lock().unwrap().as_slice(),
        &[("USD".to_string(), "EUR".to_string())]
    );
    assert_eq!(service.visitors().await.unwrap(), 1);
}

#[tokio::test]
async fn test_locate_without_weather_credential_uses_static_reading() {
    let store = refreshed_store(Arc::new(ArchiveSource::new())).await;
    let rates = Arc::new(RecordingRates::default());
    let service = service(store, Arc::new(StaticWeatherProvider::default()), rates.clone());

    let report = service.locate("8.8.8.8").await;
    assert_eq!(report.country, "United States");
    assert_eq!(report.city, "Mountain View");
    assert_eq!(report.currency, "USD");
    assert_eq!(report.temperature_c, 10.0);
    assert_eq!(report.feels_like_c, 11.0);
    assert_eq!(report.cloud_cover_percent, 40);
    assert_eq!(
        rates.calls.lock().unwrap().as_slice(),
        &[("EUR".to_string(), "USD".to_string())]
    );
}

#[tokio::test]
async fn test_localhost_resolves_fallback_public_address() {
    let store = refreshed_store(Arc::new(ArchiveSource::new())).await;
    let service = service(
        store,
        Arc::new(FixedWeather),
        Arc::new(RecordingRates::default()),
    );

    let report = service.locate("127.0.0.1").await;
    assert_eq!(report.ip, "134.122.49.115");
    assert_eq!(report.country, "Netherlands");
    assert_eq!(report.city, "Amsterdam");
    // 天气失败时使用固定读数
    assert_eq!(report.temperature_c, 10.0);
}

#[tokio::test]
async fn test_locate_before_first_refresh_is_fully_populated() {
    let store = Arc::new(MemoryRangeStore::new());
    let service = service(
        store,
        Arc::new(StaticWeatherProvider::default()),
        Arc::new(RecordingRates::default()),
    );

    let report = service.locate("8.8.8.8").await;
    assert_eq!(report.country, "Russia");
    assert_eq!(report.city, "Saint-Petersburg");
    assert_eq!(report.currency, "RUB");
    assert_eq!(report.currency_rate, "1.0842");
}
