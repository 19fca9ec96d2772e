//! 区间索引构建 + 解析集成测试

use std::sync::Arc;

use csv::StringRecord;

use weblocation::config::ColumnLayout;
use weblocation::models::Category;
use weblocation::services::RawDataset;
use weblocation::services::index::{build, persist};
use weblocation::services::RangeResolver;
use weblocation::store::{MemoryRangeStore, RangeStore};
use weblocation::utils::ip::{encode, query_address};

// =============================================================================
// 辅助函数
// =============================================================================

fn rows(data: &[&[&str]]) -> Vec<StringRecord> {
    data.iter().map(|r| StringRecord::from(r.to_vec())).collect()
}

fn simple_layout() -> ColumnLayout {
    ColumnLayout {
        key_column: 0,
        value_column: 1,
        iso_column: None,
        network_column: 0,
        block_code_column: 1,
    }
}

async fn load(store: &MemoryRangeStore, category: Category, blocks: &[&[&str]], locations: &[&[&str]]) {
    let raw = RawDataset::new(category, rows(blocks), rows(locations));
    let index = build(category, &simple_layout(), &raw).unwrap();
    persist(store, &index).await.unwrap();
}

fn addr(ip: &str) -> u32 {
    encode(query_address(ip))
}

// =============================================================================
// 场景
// =============================================================================

#[tokio::test]
async fn test_single_block_resolves_code_and_name() {
    let store = Arc::new(MemoryRangeStore::new());
    load(&store, Category::Country, &[&["10.0.0.0/8", "US"]], &[&["US", "United States"]]).await;

    let resolver = RangeResolver::new(store.clone());
    let code = resolver.resolve_code(Category::Country, addr("10.1.2.3")).await;
    assert_eq!(code, "US");
    assert_eq!(resolver.resolve_name(Category::Country, &code).await, "United States");
}

#[tokio::test]
async fn test_empty_index_returns_sentinels() {
    let store = Arc::new(MemoryRangeStore::new());
    let resolver = RangeResolver::new(store);

    let location = resolver.resolve_location(addr("8.8.8.8")).await;
    assert_eq!(location.country_code, "Russia");
    assert_eq!(location.country_name, "Russia");
    assert_eq!(location.city_code, "498817");
    assert_eq!(location.city_name, "Saint-Petersburg");
    assert_eq!(location.currency_code, "RUB");
}

// =============================================================================
// 性质
// =============================================================================

#[tokio::test]
async fn test_address_between_starts_resolves_to_lower_start() {
    let store = Arc::new(MemoryRangeStore::new());
    load(
        &store,
        Category::City,
        &[
            &["1.0.0.0/24", "A"],
            &["1.0.4.0/22", "B"],
            &["5.0.0.0/8", "C"],
        ],
        &[&["A", "Alpha"], &["B", "Bravo"], &["C", "Charlie"]],
    )
    .await;
    let resolver = RangeResolver::new(store.clone());

    let cases = [
        ("1.0.0.0", "A"),
        ("1.0.0.255", "A"),
        // 不校验区间终点：落在空洞里的地址仍归属前一个起点
        ("1.0.3.1", "A"),
        ("1.0.4.0", "B"),
        ("4.255.255.255", "B"),
        ("5.0.0.0", "C"),
        ("223.1.1.1", "C"),
    ];
    for (ip, expected) in cases {
        assert_eq!(resolver.resolve_code(Category::City, addr(ip)).await, expected, "{ip}");
    }

    // 低于所有起点
    assert_eq!(resolver.resolve_code(Category::City, addr("0.255.255.255")).await, "498817");
}

#[tokio::test]
async fn test_rebuild_with_same_data_is_idempotent() {
    let blocks: &[&[&str]] = &[&["10.0.0.0/8", "US"], &["20.0.0.0/8", "DE"], &["30.0.0.0/8", "US"]];
    let locations: &[&[&str]] = &[&["US", "United States"], &["DE", "Germany"]];
    let probes = ["9.0.0.1", "10.0.0.1", "25.5.5.5", "30.1.1.1", "200.0.0.1"];

    let store = Arc::new(MemoryRangeStore::new());
    let resolver = RangeResolver::new(store.clone());

    load(&store, Category::Country, blocks, locations).await;
    let mut first = Vec::new();
    for ip in probes {
        first.push(resolver.resolve_location(addr(ip)).await);
    }
    let first_len = store.range_len("ip_country");

    load(&store, Category::Country, blocks, locations).await;
    let mut second = Vec::new();
    for ip in probes {
        second.push(resolver.resolve_location(addr(ip)).await);
    }

    assert_eq!(first, second);
    assert_eq!(store.range_len("ip_country"), first_len);
}

#[tokio::test]
async fn test_rows_without_dictionary_entry_never_indexed() {
    let store = Arc::new(MemoryRangeStore::new());
    load(
        &store,
        Category::Country,
        &[&["10.0.0.0/8", "US"], &["11.0.0.0/8", "XX"], &["12.0.0.0/8", ""]],
        &[&["US", "United States"]],
    )
    .await;

    assert_eq!(store.range_len("ip_country"), 1);
    let resolver = RangeResolver::new(store.clone());
    // 11.x 没有被 XX 截断，仍归属 US
    assert_eq!(resolver.resolve_code(Category::Country, addr("11.1.1.1")).await, "US");
}

#[tokio::test]
async fn test_unmapped_country_currency_is_rub() {
    let store = Arc::new(MemoryRangeStore::new());
    let raw = RawDataset::new(
        Category::Currency,
        Vec::new(),
        rows(&[&["Germany", "DE", "Euro", "EUR"]]),
    );
    let index = build(Category::Currency, &ColumnLayout::currency(), &raw).unwrap();
    persist(store.as_ref(), &index).await.unwrap();

    let resolver = RangeResolver::new(store.clone());
    assert_eq!(resolver.currency_for("DE").await, "EUR");
    assert_eq!(resolver.currency_for("KP").await, "RUB");
    assert_eq!(resolver.currency_for("").await, "RUB");
}

#[tokio::test]
async fn test_country_iso_side_table_feeds_currency_join() {
    let store = Arc::new(MemoryRangeStore::new());
    let raw = RawDataset::new(
        Category::Country,
        rows(&[&["2.16.0.0/13", "2921044", "2921044"]]),
        rows(&[&["2921044", "en", "EU", "Europe", "DE", "Germany", "1"]]),
    );
    let index = build(Category::Country, &ColumnLayout::country(), &raw).unwrap();
    persist(store.as_ref(), &index).await.unwrap();
    store
        .set_fields("currency", &[("DE".to_string(), "EUR".to_string())])
        .await
        .unwrap();

    let resolver = RangeResolver::new(store.clone());
    let location = resolver.resolve_location(addr("2.17.1.1")).await;
    assert_eq!(location.country_code, "2921044");
    assert_eq!(location.country_name, "Germany");
    assert_eq!(location.currency_code, "EUR");
}

#[tokio::test]
async fn test_blacklisted_addresses_use_fallback_public_address() {
    let store = Arc::new(MemoryRangeStore::new());
    load(
        &store,
        Category::Country,
        &[&["134.122.0.0/16", "NL"]],
        &[&["NL", "Netherlands"]],
    )
    .await;
    let resolver = RangeResolver::new(store.clone());

    for raw in ["localhost", "127.0.0.1", "0.0.0.0", "garbage"] {
        let location = resolver.resolve_location(addr(raw)).await;
        assert_eq!(location.country_name, "Netherlands", "{raw}");
    }
}
