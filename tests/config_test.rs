// ==========================================
// 解析器配置集成测试
// ==========================================
// 测试目标: config_kv → ConfigManager → ResolverConfig → 引擎行为
// ==========================================


use roro_carrier_rules::config::{config_keys, ConfigManager, ResolverConfig, ResolverConfigReader};
use roro_carrier_rules::domain::types::{PdfCategory, RelationshipType, VehicleCategory};
use roro_carrier_rules::domain::CommodityItem;
use roro_carrier_rules::engine::{CarrierRuleRepositories, CarrierRuleResolver};
use test_helpers::*;

fn setup() -> (tempfile::NamedTempFile, ConfigManager, CarrierRuleRepositories) {
    roro_carrier_rules::logging::init_test();
    let (temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let conn = open_test_connection(&db_path).expect("Failed to open connection");
    let manager = ConfigManager::from_connection(conn.clone()).expect("Failed to create ConfigManager");
    let repos = CarrierRuleRepositories::from_connection(conn);
    (temp_file, manager, repos)
}

#[test]
fn test_defaults_when_config_empty() {
    let (_tmp, manager, _repos) = setup();
    let config = manager.load_resolver_config().unwrap();
    assert_eq!(config, ResolverConfig::default());
}

#[test]
fn test_custom_towing_categories_and_event_code() {
    let (_tmp, manager, _repos) = setup();
    manager
        .set_global_config_value(config_keys::TOWING_CATEGORIES, r#"["trailer", "roro"]"#)
        .unwrap();
    manager
        .set_global_config_value(config_keys::TRACTOR_CATEGORIES, r#"["truck", "tractor unit", "spaceship"]"#)
        .unwrap();
    manager
        .set_global_config_value(config_keys::TOWING_EVENT_CODE, " tow_fee ")
        .unwrap();
    manager
        .set_global_config_value(config_keys::DEFAULT_CURRENCY, "usd")
        .unwrap();

    let config = manager.load_resolver_config().unwrap();
    assert_eq!(
        config.towing_categories,
        vec![VehicleCategory::Trailer, VehicleCategory::Roro]
    );
    // 未知类别被忽略
    assert_eq!(
        config.tractor_categories,
        vec![VehicleCategory::Truck, VehicleCategory::Truckhead]
    );
    assert_eq!(config.towing_event_code, "TOW_FEE");
    assert!(config.is_towing_event("tow_fee"));
    assert_eq!(config.default_currency, "USD");
}

#[test]
fn test_malformed_lists_fall_back_to_defaults() {
    let (_tmp, manager, _repos) = setup();
    manager
        .set_global_config_value(config_keys::TOWING_CATEGORIES, "trailer,roro")
        .unwrap();
    manager
        .set_global_config_value(config_keys::TRACTOR_CATEGORIES, r#"["spaceship"]"#)
        .unwrap();
    manager
        .set_global_config_value(config_keys::PDF_CATEGORY_KEYWORDS, "{not json")
        .unwrap();

    let config = manager.load_resolver_config().unwrap();
    let defaults = ResolverConfig::default();
    assert_eq!(config.towing_categories, defaults.towing_categories);
    assert_eq!(config.tractor_categories, defaults.tractor_categories);
    assert_eq!(config.pdf_category_keywords, defaults.pdf_category_keywords);
}

#[test]
fn test_pdf_keywords_from_json_array() {
    let (_tmp, manager, _repos) = setup();
    manager
        .set_global_config_value(
            config_keys::PDF_CATEGORY_KEYWORDS,
            r#"[{"category":"BVAN","keywords":["CAMPER"]},{"category":"CAR","keywords":["AUTO"]}]"#,
        )
        .unwrap();

    let table = manager.get_pdf_category_keywords().unwrap();
    assert_eq!(table.entries.len(), 2);
    assert_eq!(table.match_group_code("CAMPER_VANS"), Some(PdfCategory::Bvan));
    assert_eq!(table.match_group_code("AUTO_EU"), Some(PdfCategory::Car));
    // 标准码仍精确匹配
    assert_eq!(table.match_group_code("lm"), Some(PdfCategory::Lm));
    assert_eq!(table.match_group_code("HH"), None);
}

#[test]
fn test_config_snapshot_lists_values() {
    let (_tmp, manager, _repos) = setup();
    manager.set_global_config_value(config_keys::DEFAULT_CURRENCY, "EUR").unwrap();
    manager
        .set_global_config_value(config_keys::TOWING_EVENT_CODE, "TOWING")
        .unwrap();

    let snapshot: serde_json::Value = serde_json::from_str(&manager.get_config_snapshot().unwrap()).unwrap();
    assert_eq!(snapshot["default_currency"], "EUR");
    assert_eq!(snapshot["towing_event_code"], "TOWING");
    assert_eq!(
        manager.get_global_config_value(config_keys::DEFAULT_CURRENCY).unwrap().as_deref(),
        Some("EUR")
    );
}

#[test]
fn test_configured_tractor_set_changes_towing_decision() {
    let (_tmp, manager, repos) = setup();
    seed_master_data(&repos).unwrap();
    seed_quotation(&repos, 1, Some(PORT_LAGOS)).unwrap();
    insert_items(
        &repos,
        &[
            CommodityItem::new(1, 1, 1, "big_van"),
            CommodityItem::new(2, 1, 2, "trailer").with_relation(RelationshipType::Connected, Some(1)),
        ],
    )
    .unwrap();

    let default_resolver = CarrierRuleResolver::new(repos.clone(), manager.load_resolver_config().unwrap());
    assert!(default_resolver.should_apply_towing(VehicleCategory::Trailer, 2).unwrap());

    manager
        .set_global_config_value(config_keys::TRACTOR_CATEGORIES, r#"["truck","truckhead","big_van"]"#)
        .unwrap();
    let custom_resolver = CarrierRuleResolver::new(repos.clone(), manager.load_resolver_config().unwrap());
    assert!(!custom_resolver.should_apply_towing(VehicleCategory::Trailer, 2).unwrap());
}

#[test]
fn test_raw_config_rows_are_read() {
    let (temp_file, _manager, _repos) = setup();
    let db_path = temp_file.path().to_str().unwrap();
    let conn = open_test_connection(db_path).unwrap();
    insert_config(&conn, config_keys::TOWING_CATEGORIES, r#"["semi-trailer"]"#).unwrap();

    let manager = ConfigManager::new(db_path).unwrap();
    assert_eq!(manager.get_towing_categories().unwrap(), vec![VehicleCategory::Trailer]);
}
