// ==========================================
// 规则数据审计集成测试
// ==========================================
// 测试目标: 承运商映射/运价配置缺口、报价单货物结构问题
// ==========================================


use roro_carrier_rules::config::ResolverConfig;
use roro_carrier_rules::domain::types::{ChargeUnit, RelationshipType, TariffComponent};
use roro_carrier_rules::domain::{CommodityItem, RuleScope};
use roro_carrier_rules::engine::audit::finding_codes;
use roro_carrier_rules::engine::{AuditSeverity, AuditSubject, CarrierAuditEngine, CarrierRuleRepositories};
use test_helpers::*;

fn setup() -> (tempfile::NamedTempFile, CarrierRuleRepositories, CarrierAuditEngine) {
    roro_carrier_rules::logging::init_test();
    let (temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let repos = open_repos(&db_path).expect("Failed to open repos");
    seed_master_data(&repos).expect("Failed to seed master data");
    let engine = CarrierAuditEngine::new(repos.clone(), ResolverConfig::default());
    (temp_file, repos, engine)
}

#[test]
fn test_clean_carrier_has_no_findings() {
    let (_tmp, _repos, engine) = setup();
    let report = engine.audit_carrier(CARRIER_ID, date(2026, 5, 1)).unwrap();
    assert_eq!(report.subject, AuditSubject::Carrier(CARRIER_ID));
    assert_eq!(report.audit_date, date(2026, 5, 1));
    assert_eq!(report.config_snapshot, ResolverConfig::default());
    assert!(report.findings.is_empty(), "unexpected findings: {:?}", report.codes());
}

#[test]
fn test_unknown_carrier_is_error() {
    let (_tmp, _repos, engine) = setup();
    let report = engine.audit_carrier(999, date(2026, 5, 1)).unwrap();
    assert!(report.has_errors());
    assert_eq!(report.codes(), vec![finding_codes::CARRIER_NOT_FOUND]);
}

#[test]
fn test_mapping_scope_gaps_reported() {
    let (_tmp, repos, engine) = setup();
    repos
        .tariff_repo
        .insert_mapping(&mapping(
            510,
            ARTICLE_CAR_FREIGHT,
            "No port scope",
            RuleScope {
                vehicle_categories: vec!["car".to_string()],
                ..Default::default()
            },
        ))
        .unwrap();
    repos
        .tariff_repo
        .insert_mapping(&mapping(
            511,
            ARTICLE_CAR_FREIGHT,
            "Broken references",
            RuleScope {
                port_ids: vec![PORT_LAGOS, 77],
                port_group_ids: vec![999],
                vehicle_categories: vec!["hovercraft".to_string()],
                category_group_ids: vec![998],
                ..Default::default()
            },
        ))
        .unwrap();

    let report = engine.audit_carrier(CARRIER_ID, date(2026, 5, 1)).unwrap();
    assert!(report.has_errors());

    let for_mapping = |id: i64| -> Vec<&str> {
        report
            .findings
            .iter()
            .filter(|f| f.entity == "carrier_article_mapping" && f.entity_id == id)
            .map(|f| f.code.as_str())
            .collect()
    };

    let no_port = for_mapping(510);
    assert!(no_port.contains(&finding_codes::MAPPING_NO_PORT_SCOPE));
    assert!(no_port.contains(&finding_codes::MAPPING_NO_ACTIVE_TARIFF));
    assert!(!no_port.contains(&finding_codes::MAPPING_NO_CATEGORY_SCOPE));

    let broken = for_mapping(511);
    assert!(broken.contains(&finding_codes::MAPPING_UNKNOWN_PORT));
    assert!(broken.contains(&finding_codes::MAPPING_UNKNOWN_PORT_GROUP));
    assert!(broken.contains(&finding_codes::MAPPING_UNKNOWN_CATEGORY));
    assert!(broken.contains(&finding_codes::MAPPING_UNKNOWN_CATEGORY_GROUP));
    assert!(broken.contains(&finding_codes::MAPPING_NO_PDF_CATEGORY));
    assert!(!broken.contains(&finding_codes::MAPPING_NO_PORT_SCOPE));

    // 只报告不存在的那个港口
    let unknown_ports: Vec<_> = report
        .findings
        .iter()
        .filter(|f| f.code == finding_codes::MAPPING_UNKNOWN_PORT)
        .collect();
    assert_eq!(unknown_ports.len(), 1);
    assert!(unknown_ports[0].message.contains("77"));
}

#[test]
fn test_tariff_gaps_depend_on_audit_date() {
    let (_tmp, repos, engine) = setup();

    // 12 月: 所有运价都尚未生效
    let december = engine.audit_carrier(CARRIER_ID, date(2025, 12, 1)).unwrap();
    let missing: Vec<i64> = december
        .findings
        .iter()
        .filter(|f| f.code == finding_codes::MAPPING_NO_ACTIVE_TARIFF)
        .map(|f| f.entity_id)
        .collect();
    assert_eq!(missing, vec![MAPPING_HH_WAF, MAPPING_CAR_LAGOS]);
    assert!(!december.has_errors());

    repos
        .tariff_repo
        .insert_tariff(&tariff(
            730,
            MAPPING_CAR_LAGOS,
            date(2026, 1, 1),
            &[(TariffComponent::BaseFreight, 640.0, ChargeUnit::PerUnit)],
        ))
        .unwrap();

    let report = engine.audit_carrier(CARRIER_ID, date(2026, 5, 1)).unwrap();
    let ambiguous: Vec<_> = report
        .findings
        .iter()
        .filter(|f| f.code == finding_codes::TARIFF_AMBIGUOUS)
        .collect();
    assert_eq!(ambiguous.len(), 1);
    assert_eq!(ambiguous[0].entity, "carrier_purchase_tariff");
    assert_eq!(ambiguous[0].entity_id, TARIFF_CAR_JAN);
    assert_eq!(ambiguous[0].severity, AuditSeverity::Warning);
}

#[test]
fn test_quotation_structure_findings() {
    let (_tmp, repos, engine) = setup();
    seed_quotation(&repos, 1, Some(PORT_LAGOS)).unwrap();
    insert_items(
        &repos,
        &[
            CommodityItem::new(1, 1, 1, "truckhead"),
            CommodityItem::new(2, 1, 2, "trailer").with_relation(RelationshipType::Connected, Some(1)),
            CommodityItem::new(3, 1, 3, "trailer").with_relation(RelationshipType::Connected, Some(404)),
            CommodityItem::new(4, 1, 4, "car").with_relation(RelationshipType::LoadedWith, Some(5)),
            CommodityItem::new(5, 1, 5, "car").with_relation(RelationshipType::LoadedWith, Some(4)),
            CommodityItem::new(6, 1, 6, "amphibious thing"),
            CommodityItem::new(7, 1, 7, "suv").with_relation(RelationshipType::LoadedWith, None),
        ],
    )
    .unwrap();

    let report = engine.audit_quotation(1, date(2026, 5, 1)).unwrap();
    assert_eq!(report.subject, AuditSubject::Quotation(1));
    assert!(report.has_errors());

    let codes_for = |id: i64| -> Vec<&str> {
        report
            .findings
            .iter()
            .filter(|f| f.entity == "commodity_item" && f.entity_id == id)
            .map(|f| f.code.as_str())
            .collect()
    };

    assert!(codes_for(3).contains(&"ITEM_DANGLING_RELATION"));
    assert!(codes_for(4).contains(&"ITEM_STACK_CYCLE"));
    assert!(codes_for(5).contains(&"ITEM_STACK_CYCLE"));
    assert_eq!(codes_for(6), vec![finding_codes::ITEM_UNMAPPED_CATEGORY]);
    assert_eq!(codes_for(7), vec!["ITEM_LOADED_WITHOUT_TARGET"]);
    assert!(codes_for(1).is_empty());

    // 每个挂车一条拖车判定
    let towing: Vec<_> = report
        .findings
        .iter()
        .filter(|f| f.code == finding_codes::ITEM_TOWING_DECISION)
        .collect();
    assert_eq!(towing.len(), 2);
    let connected = towing.iter().find(|f| f.entity_id == 2).unwrap();
    assert!(connected.message.contains("towing=false"));
    assert!(connected.message.contains("CONNECTED_TO_TRACTOR"));
    let dangling = towing.iter().find(|f| f.entity_id == 3).unwrap();
    assert!(dangling.message.contains("towing=true"));
    assert!(dangling.message.contains("CONNECTED_TARGET_MISSING"));

    // 审计不写回
    assert!(repos.commodity_repo.find_by_id(2).unwrap().unwrap().carrier_rule_meta.is_none());
}

#[test]
fn test_quotation_without_schedule_or_record() {
    let (_tmp, repos, engine) = setup();
    seed_quotation(&repos, 2, None).unwrap();

    let report = engine.audit_quotation(2, date(2026, 5, 1)).unwrap();
    assert_eq!(report.codes(), vec![finding_codes::QUOTATION_NO_SCHEDULE]);
    assert!(!report.has_errors());

    let missing = engine.audit_quotation(404, date(2026, 5, 1)).unwrap();
    assert_eq!(missing.codes(), vec![finding_codes::QUOTATION_NOT_FOUND]);
    assert!(missing.has_errors());
}

#[test]
fn test_report_carries_effective_config() {
    let (_tmp, repos, _engine) = setup();
    let config = ResolverConfig {
        default_currency: "USD".to_string(),
        towing_event_code: "TOW_FEE".to_string(),
        ..ResolverConfig::default()
    };
    let engine = CarrierAuditEngine::new(repos, config.clone());

    let report = engine.audit_carrier(CARRIER_ID, date(2026, 5, 1)).unwrap();
    assert_eq!(report.config_snapshot, config);

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["config_snapshot"]["default_currency"], "USD");
}
