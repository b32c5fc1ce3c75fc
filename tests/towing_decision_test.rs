// ==========================================
// 拖车费判定集成测试
// ==========================================
// 测试目标: 经数据库读取货物行后，CarrierRuleResolver 的拖车判定
// ==========================================


use roro_carrier_rules::config::ResolverConfig;
use roro_carrier_rules::domain::types::{RelationshipType, VehicleCategory};
use roro_carrier_rules::domain::CommodityItem;
use roro_carrier_rules::engine::{CarrierRuleResolver, CommodityGraph, TowingReason};
use test_helpers::{create_test_db, insert_items, open_repos, seed_master_data, seed_quotation, PORT_LAGOS};

fn setup() -> (tempfile::NamedTempFile, CarrierRuleResolver, roro_carrier_rules::engine::CarrierRuleRepositories) {
    roro_carrier_rules::logging::init_test();
    let (temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let repos = open_repos(&db_path).expect("Failed to open repos");
    seed_master_data(&repos).expect("Failed to seed master data");
    let resolver = CarrierRuleResolver::new(repos.clone(), ResolverConfig::default());
    (temp_file, resolver, repos)
}

#[test]
fn test_trailer_connected_to_truck_or_truckhead_is_not_charged() {
    let (_tmp, resolver, repos) = setup();
    seed_quotation(&repos, 1, Some(PORT_LAGOS)).unwrap();
    insert_items(
        &repos,
        &[
            CommodityItem::new(1, 1, 1, "truckhead"),
            CommodityItem::new(2, 1, 2, "trailer").with_relation(RelationshipType::Connected, Some(1)),
            CommodityItem::new(3, 1, 3, "truck"),
            CommodityItem::new(4, 1, 4, "Semi-Trailer").with_relation(RelationshipType::Connected, Some(3)),
        ],
    )
    .unwrap();

    assert!(!resolver.should_apply_towing(VehicleCategory::Trailer, 2).unwrap());
    assert!(!resolver.should_apply_towing(VehicleCategory::Trailer, 4).unwrap());

    let decision = resolver.explain_towing(VehicleCategory::Trailer, 2).unwrap();
    assert_eq!(decision.reason, TowingReason::ConnectedToTractor { tractor_item_id: 1 });
    assert_eq!(decision.inspected[0].category, "truckhead");
}

#[test]
fn test_trailer_in_stack_with_truck_is_not_charged() {
    let (_tmp, resolver, repos) = setup();
    seed_quotation(&repos, 1, Some(PORT_LAGOS)).unwrap();
    // 挂车为堆叠根，卡车与轿车装载其上
    insert_items(
        &repos,
        &[
            CommodityItem::new(10, 1, 1, "trailer"),
            CommodityItem::new(11, 1, 2, "car").with_relation(RelationshipType::LoadedWith, Some(10)),
            CommodityItem::new(12, 1, 3, "truck").with_relation(RelationshipType::LoadedWith, Some(11)),
        ],
    )
    .unwrap();

    assert!(!resolver.should_apply_towing(VehicleCategory::Trailer, 10).unwrap());

    let decision = resolver.explain_towing(VehicleCategory::Trailer, 10).unwrap();
    assert_eq!(
        decision.reason,
        TowingReason::StackHasTractor {
            stack_base_id: 10,
            tractor_item_id: 12
        }
    );
    assert_eq!(decision.inspected.len(), 2);
}

#[test]
fn test_trailer_loaded_on_truckhead_is_not_charged() {
    let (_tmp, resolver, repos) = setup();
    seed_quotation(&repos, 1, Some(PORT_LAGOS)).unwrap();
    insert_items(
        &repos,
        &[
            CommodityItem::new(20, 1, 1, "truckhead"),
            CommodityItem::new(21, 1, 2, "trailer").with_relation(RelationshipType::LoadedWith, Some(20)),
        ],
    )
    .unwrap();

    assert!(!resolver.should_apply_towing(VehicleCategory::Trailer, 21).unwrap());
}

#[test]
fn test_standalone_trailer_is_charged() {
    let (_tmp, resolver, repos) = setup();
    seed_quotation(&repos, 1, Some(PORT_LAGOS)).unwrap();
    insert_items(
        &repos,
        &[
            CommodityItem::new(30, 1, 1, "trailer"),
            CommodityItem::new(31, 1, 2, "truckhead"),
        ],
    )
    .unwrap();

    assert!(resolver.should_apply_towing(VehicleCategory::Trailer, 30).unwrap());
    let decision = resolver.explain_towing(VehicleCategory::Trailer, 30).unwrap();
    assert_eq!(decision.reason, TowingReason::Standalone);
    assert!(decision.inspected.is_empty());
}

#[test]
fn test_trailer_connected_to_non_truck_is_charged() {
    let (_tmp, resolver, repos) = setup();
    seed_quotation(&repos, 1, Some(PORT_LAGOS)).unwrap();
    insert_items(
        &repos,
        &[
            CommodityItem::new(40, 1, 1, "big_van"),
            CommodityItem::new(41, 1, 2, "trailer").with_relation(RelationshipType::Connected, Some(40)),
        ],
    )
    .unwrap();

    assert!(resolver.should_apply_towing(VehicleCategory::Trailer, 41).unwrap());
}

#[test]
fn test_non_trailer_categories_never_charged() {
    let (_tmp, resolver, repos) = setup();
    seed_quotation(&repos, 1, Some(PORT_LAGOS)).unwrap();
    insert_items(
        &repos,
        &[
            CommodityItem::new(50, 1, 1, "car"),
            CommodityItem::new(51, 1, 2, "truck").with_relation(RelationshipType::Connected, Some(50)),
            CommodityItem::new(52, 1, 3, "big_van").with_relation(RelationshipType::LoadedWith, Some(50)),
        ],
    )
    .unwrap();

    for category in [
        VehicleCategory::Car,
        VehicleCategory::Suv,
        VehicleCategory::SmallVan,
        VehicleCategory::BigVan,
        VehicleCategory::Truck,
        VehicleCategory::Truckhead,
        VehicleCategory::Roro,
        VehicleCategory::Other,
    ] {
        for item_id in [50, 51, 52, 999] {
            assert!(
                !resolver.should_apply_towing(category, item_id).unwrap(),
                "category {} item {} should never be charged",
                category,
                item_id
            );
        }
    }
}

#[test]
fn test_missing_item_is_not_charged() {
    let (_tmp, resolver, _repos) = setup();
    let decision = resolver.explain_towing(VehicleCategory::Trailer, 12345).unwrap();
    assert!(!decision.apply);
    assert_eq!(decision.reason, TowingReason::ItemNotFound);
}

#[test]
fn test_stack_group_read_from_database() {
    let (_tmp, _resolver, repos) = setup();
    seed_quotation(&repos, 1, Some(PORT_LAGOS)).unwrap();
    // A 装载于 B 之上，B 为堆叠根（A 行号在前）
    insert_items(
        &repos,
        &[
            CommodityItem::new(60, 1, 1, "car").with_relation(RelationshipType::LoadedWith, Some(61)),
            CommodityItem::new(61, 1, 2, "trailer"),
        ],
    )
    .unwrap();

    let graph = CommodityGraph::new(repos.commodity_repo.find_by_quotation(1).unwrap());
    assert_eq!(graph.get_stack_group(60), Some(61));
    assert_eq!(graph.get_stack_group(61), Some(61));

    let members: Vec<i64> = graph.get_stack_members(60).iter().map(|i| i.id).collect();
    assert_eq!(members, vec![60, 61]);
}

#[test]
fn test_relationship_update_changes_decision() {
    let (_tmp, resolver, repos) = setup();
    seed_quotation(&repos, 1, Some(PORT_LAGOS)).unwrap();
    insert_items(
        &repos,
        &[
            CommodityItem::new(70, 1, 1, "truckhead"),
            CommodityItem::new(71, 1, 2, "trailer"),
        ],
    )
    .unwrap();
    assert!(resolver.should_apply_towing(VehicleCategory::Trailer, 71).unwrap());

    repos
        .commodity_repo
        .update_relationship(71, RelationshipType::Connected, Some(70))
        .unwrap();
    assert!(!resolver.should_apply_towing(VehicleCategory::Trailer, 71).unwrap());
}
