// ==========================================
// 承运商规则匹配集成测试
// ==========================================
// 测试目标: 规则入库 → match_rules 排序/互斥/叠加 → 接收判定影响解析
// ==========================================


use roro_carrier_rules::config::ResolverConfig;
use roro_carrier_rules::domain::types::{QuantityMode, SurchargeCalcMode, VehicleCategory};
use roro_carrier_rules::domain::{AcceptanceRule, CommodityItem, RuleHeader, SurchargeRule, TransformRule};
use roro_carrier_rules::engine::{CarrierRuleRepositories, CarrierRuleResolver, RuleQuery, VesselRef};
use test_helpers::*;

fn setup() -> (tempfile::NamedTempFile, CarrierRuleRepositories) {
    roro_carrier_rules::logging::init_test();
    let (temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let repos = open_repos(&db_path).expect("Failed to open repos");
    seed_master_data(&repos).expect("Failed to seed master data");
    (temp_file, repos)
}

fn acceptance(header: RuleHeader, is_accepted: bool) -> AcceptanceRule {
    AcceptanceRule {
        header,
        is_accepted,
        min_length_cm: None,
        max_length_cm: None,
        min_width_cm: None,
        max_width_cm: None,
        min_height_cm: None,
        max_height_cm: None,
        max_weight_kg: None,
        must_be_empty: false,
        must_be_self_propelled: false,
    }
}

fn surcharge(header: RuleHeader, event_code: &str, amount: f64) -> SurchargeRule {
    SurchargeRule {
        header,
        event_code: event_code.to_string(),
        calc_mode: SurchargeCalcMode::Flat,
        amount,
        article_id: None,
        quantity_mode: QuantityMode::PerItem,
        min_length_cm: None,
        min_width_cm: None,
        min_height_cm: None,
        min_weight_kg: None,
    }
}

fn query(port_id: i64, category: VehicleCategory) -> RuleQuery {
    RuleQuery {
        carrier_id: CARRIER_ID,
        port_id,
        category,
        vessel: None,
        today: date(2026, 5, 1),
    }
}

#[test]
fn test_highest_priority_acceptance_rule_wins() {
    let (_tmp, repos) = setup();
    let rules = &repos.rule_repo;

    // 通配: 全部接收
    rules.insert_acceptance_rule(&acceptance(rule_header(1, CARRIER_ID, "Accept all"), true)).unwrap();

    // WAF 港口组不收挂车（更高优先级）
    let mut waf = rule_header(2, CARRIER_ID, "No trailers to WAF");
    waf.priority = 10;
    waf.scope.port_group_ids = vec![PORT_GROUP_WAF];
    waf.scope.vehicle_categories = vec!["trailer".to_string()];
    rules.insert_acceptance_rule(&acceptance(waf, false)).unwrap();

    let resolver = CarrierRuleResolver::new(repos.clone(), ResolverConfig::default());

    let lagos_trailer = resolver.match_rules(&query(PORT_LAGOS, VehicleCategory::Trailer)).unwrap();
    assert_eq!(lagos_trailer.acceptance.as_ref().map(|r| r.header.id), Some(2));

    let lome_trailer = resolver.match_rules(&query(PORT_LOME, VehicleCategory::Trailer)).unwrap();
    assert_eq!(lome_trailer.acceptance.as_ref().map(|r| r.header.id), Some(1));

    let lagos_car = resolver.match_rules(&query(PORT_LAGOS, VehicleCategory::Car)).unwrap();
    assert_eq!(lagos_car.acceptance.as_ref().map(|r| r.header.id), Some(1));
}

#[test]
fn test_sort_order_then_id_break_priority_ties() {
    let (_tmp, repos) = setup();
    let rules = &repos.rule_repo;

    let mut late = rule_header(30, CARRIER_ID, "sort 5");
    late.sort_order = 5;
    let mut early = rule_header(31, CARRIER_ID, "sort 1");
    early.sort_order = 1;
    let mut twin = rule_header(29, CARRIER_ID, "sort 1 lower id");
    twin.sort_order = 1;

    rules.insert_surcharge_rule(&surcharge(late, "PORT_DUES", 10.0)).unwrap();
    rules.insert_surcharge_rule(&surcharge(early, "SECURITY", 12.0)).unwrap();
    rules.insert_surcharge_rule(&surcharge(twin, "ISPS", 8.0)).unwrap();

    let resolver = CarrierRuleResolver::new(repos.clone(), ResolverConfig::default());
    let matched = resolver.match_rules(&query(PORT_LAGOS, VehicleCategory::Car)).unwrap();
    let ids: Vec<i64> = matched.surcharges.iter().map(|r| r.header.id).collect();
    assert_eq!(ids, vec![29, 31, 30]);
}

#[test]
fn test_transforms_deduplicated_by_code() {
    let (_tmp, repos) = setup();
    let rules = &repos.rule_repo;

    let mut specific = rule_header(40, CARRIER_ID, "SUV billed as van at Lagos");
    specific.priority = 5;
    specific.scope.port_ids = vec![PORT_LAGOS];
    rules
        .insert_transform_rule(&TransformRule {
            header: specific,
            transform_code: "RECATEGORIZE".to_string(),
            params: serde_json::json!({ "to": "small_van" }),
        })
        .unwrap();
    rules
        .insert_transform_rule(&TransformRule {
            header: rule_header(41, CARRIER_ID, "SUV billed as car"),
            transform_code: "recategorize".to_string(),
            params: serde_json::json!({ "to": "car" }),
        })
        .unwrap();
    rules
        .insert_transform_rule(&TransformRule {
            header: rule_header(42, CARRIER_ID, "Stack billing"),
            transform_code: "BILL_STACK_AS_BASE".to_string(),
            params: serde_json::Value::Null,
        })
        .unwrap();

    let resolver = CarrierRuleResolver::new(repos.clone(), ResolverConfig::default());
    let matched = resolver.match_rules(&query(PORT_LAGOS, VehicleCategory::Suv)).unwrap();
    let ids: Vec<i64> = matched.transforms.iter().map(|r| r.header.id).collect();
    assert_eq!(ids, vec![40, 42]);

    let elsewhere = resolver.match_rules(&query(PORT_COTONOU, VehicleCategory::Suv)).unwrap();
    let ids: Vec<i64> = elsewhere.transforms.iter().map(|r| r.header.id).collect();
    assert_eq!(ids, vec![41, 42]);
}

#[test]
fn test_inactive_and_out_of_window_rules_ignored() {
    let (_tmp, repos) = setup();
    let rules = &repos.rule_repo;

    let mut inactive = rule_header(50, CARRIER_ID, "inactive");
    inactive.window.is_active = false;
    let mut expired = rule_header(51, CARRIER_ID, "expired");
    expired.window.effective_to = Some(date(2026, 3, 31));
    let mut future = rule_header(52, CARRIER_ID, "future");
    future.window.effective_from = Some(date(2026, 6, 1));
    let mut other_carrier = rule_header(53, OTHER_CARRIER_ID, "other carrier");
    other_carrier.priority = 99;

    for header in [inactive, expired, future, other_carrier] {
        rules.insert_surcharge_rule(&surcharge(header, "ETS", 5.0)).unwrap();
    }

    let resolver = CarrierRuleResolver::new(repos.clone(), ResolverConfig::default());
    let matched = resolver.match_rules(&query(PORT_LAGOS, VehicleCategory::Car)).unwrap();
    assert!(matched.surcharges.is_empty());
    assert!(matched.acceptance.is_none());
}

#[test]
fn test_vessel_filtered_rule_requires_matching_vessel() {
    let (_tmp, repos) = setup();
    let mut header = rule_header(60, CARRIER_ID, "G5 deck surcharge");
    header.scope.vessel_names = vec!["Grande Lagos".to_string()];
    repos
        .rule_repo
        .insert_surcharge_rule(&surcharge(header, "DECK", 25.0))
        .unwrap();

    let resolver = CarrierRuleResolver::new(repos.clone(), ResolverConfig::default());

    let no_vessel = resolver.match_rules(&query(PORT_LAGOS, VehicleCategory::Car)).unwrap();
    assert!(no_vessel.surcharges.is_empty());

    let mut on_vessel = query(PORT_LAGOS, VehicleCategory::Car);
    on_vessel.vessel = VesselRef::new(Some("grande lagos".to_string()), None);
    let matched = resolver.match_rules(&on_vessel).unwrap();
    assert_eq!(matched.surcharges.len(), 1);
}

#[test]
fn test_rejected_item_gets_no_tariff_or_surcharges() {
    let (_tmp, repos) = setup();
    let mut header = rule_header(70, CARRIER_ID, "Trailer length limit");
    header.scope.vehicle_categories = vec!["trailer".to_string()];
    let mut rule = acceptance(header, true);
    rule.max_length_cm = Some(1400.0);
    rule.must_be_empty = true;
    repos.rule_repo.insert_acceptance_rule(&rule).unwrap();
    repos.rule_repo.insert_surcharge_rule(&towing_rule(800, 150.0)).unwrap();

    seed_quotation(&repos, 1, Some(PORT_LAGOS)).unwrap();
    let mut too_long = CommodityItem::new(1, 1, 1, "trailer").with_dimensions(1650.0, 255.0, 400.0, 9000.0);
    too_long.is_empty = false;
    let ok = CommodityItem::new(2, 1, 2, "trailer").with_dimensions(1360.0, 255.0, 400.0, 7000.0);
    insert_items(&repos, &[too_long, ok]).unwrap();

    let resolver = CarrierRuleResolver::new(repos.clone(), ResolverConfig::default());
    let result = resolver.resolve_quotation(1, date(2026, 5, 1)).unwrap();

    let rejected = result.item(1).unwrap();
    assert!(!rejected.is_accepted());
    let verdict = rejected.acceptance.as_ref().unwrap();
    assert_eq!(verdict.rule_id, Some(70));
    assert!(verdict.reasons.iter().any(|r| r.starts_with("LENGTH_ABOVE_MAX")));
    assert!(verdict.reasons.iter().any(|r| r.starts_with("MUST_BE_EMPTY")));
    assert!(rejected.tariff.is_none());
    assert!(rejected.surcharge_events.is_empty());

    let accepted = result.item(2).unwrap();
    assert!(accepted.is_accepted());
    assert!(accepted.tariff.is_some());
    assert_eq!(accepted.surcharge_total(), 150.0);

    let meta = repos.commodity_repo.find_by_id(1).unwrap().unwrap().carrier_rule_meta.unwrap();
    assert_eq!(meta.acceptance.map(|v| v.accepted), Some(false));
}

#[test]
fn test_surcharges_stack_with_thresholds() {
    let (_tmp, repos) = setup();

    let mut heavy = surcharge(rule_header(80, CARRIER_ID, "Heavy lift"), "HEAVY", 200.0);
    heavy.min_weight_kg = Some(10000.0);
    repos.rule_repo.insert_surcharge_rule(&heavy).unwrap();

    let mut baf = surcharge(rule_header(81, CARRIER_ID, "BAF on freight"), "BAF", 10.0);
    baf.calc_mode = SurchargeCalcMode::PercentOfBase;
    repos.rule_repo.insert_surcharge_rule(&baf).unwrap();

    seed_quotation(&repos, 1, Some(PORT_LAGOS)).unwrap();
    insert_items(
        &repos,
        &[
            CommodityItem::new(1, 1, 1, "truck").with_dimensions(1000.0, 250.0, 380.0, 14000.0),
            CommodityItem::new(2, 1, 2, "truck").with_dimensions(800.0, 250.0, 380.0, 7500.0),
        ],
    )
    .unwrap();

    let result = CarrierRuleResolver::new(repos.clone(), ResolverConfig::default())
        .explain_quotation(1, date(2026, 5, 1))
        .unwrap();

    // 10 LM × 90 = 900 → BAF 90；超重 200
    let heavy_truck = result.item(1).unwrap();
    let codes: Vec<&str> = heavy_truck.surcharge_events.iter().map(|e| e.event_code.as_str()).collect();
    assert_eq!(codes, vec!["HEAVY", "BAF"]);
    assert_eq!(heavy_truck.surcharge_total(), 290.0);

    // 8 LM × 90 = 720 → BAF 72；未超重
    let light_truck = result.item(2).unwrap();
    assert_eq!(light_truck.surcharge_events.len(), 1);
    assert_eq!(light_truck.surcharge_events[0].amount, 72.0);
}
