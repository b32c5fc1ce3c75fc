// ==========================================
// RoRo 承运商规则核心 - 拖车费判定
// ==========================================
// 规则: 无动力挂车若与牵引车同票（直接牵引或同一堆叠内）则不收拖车费
// 红线: 纯函数，所有判定必须输出 reason
// 约束: 只看挂车自身发出的 connected 关系，不反查牵引车指向挂车的关系
// ==========================================

use crate::config::ResolverConfig;
use crate::domain::commodity::CommodityItem;
use crate::domain::types::VehicleCategory;
use crate::engine::commodity_graph::{CommodityGraph, StackRoot};
use serde::{Deserialize, Serialize};

/// 拖车判定原因
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "code", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TowingReason {
    /// 类别不需要拖车判定
    NotTowableCategory,
    /// 货物行不存在
    ItemNotFound,
    /// 直接牵引于牵引车
    ConnectedToTractor { tractor_item_id: i64 },
    /// 牵引目标不是牵引车
    ConnectedToNonTractor { related_item_id: i64, related_category: String },
    /// 牵引目标不存在
    ConnectedTargetMissing { related_item_id: i64 },
    /// 同一堆叠内有牵引车
    StackHasTractor { stack_base_id: i64, tractor_item_id: i64 },
    /// 同一堆叠内没有牵引车
    StackWithoutTractor { stack_base_id: i64 },
    /// 堆叠关系成环，按独立货物处理
    StackCycle,
    /// 独立运输
    Standalone,
}

/// 判定过程中检查过的货物行
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InspectedItem {
    pub item_id: i64,
    pub line_number: i32,
    pub category: String,
    pub is_tractor: bool,
}

/// 拖车判定结果（含证据）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TowingDecision {
    pub item_id: i64,
    pub category: VehicleCategory,
    pub apply: bool,
    pub reason: TowingReason,
    pub inspected: Vec<InspectedItem>,
}

impl TowingDecision {
    /// 原因代码（日志/审计使用）
    pub fn reason_code(&self) -> &'static str {
        match self.reason {
            TowingReason::NotTowableCategory => "NOT_TOWABLE_CATEGORY",
            TowingReason::ItemNotFound => "ITEM_NOT_FOUND",
            TowingReason::ConnectedToTractor { .. } => "CONNECTED_TO_TRACTOR",
            TowingReason::ConnectedToNonTractor { .. } => "CONNECTED_TO_NON_TRACTOR",
            TowingReason::ConnectedTargetMissing { .. } => "CONNECTED_TARGET_MISSING",
            TowingReason::StackHasTractor { .. } => "STACK_HAS_TRACTOR",
            TowingReason::StackWithoutTractor { .. } => "STACK_WITHOUT_TRACTOR",
            TowingReason::StackCycle => "STACK_CYCLE",
            TowingReason::Standalone => "STANDALONE",
        }
    }
}

// ==========================================
// TowingPolicy - 拖车费判定策略
// ==========================================
#[derive(Debug, Clone)]
pub struct TowingPolicy {
    towing_categories: Vec<VehicleCategory>,
    tractor_categories: Vec<VehicleCategory>,
}

impl TowingPolicy {
    pub fn new(towing_categories: Vec<VehicleCategory>, tractor_categories: Vec<VehicleCategory>) -> Self {
        Self {
            towing_categories,
            tractor_categories,
        }
    }

    pub fn from_config(config: &ResolverConfig) -> Self {
        Self::new(config.towing_categories.clone(), config.tractor_categories.clone())
    }

    fn is_tractor(&self, item: &CommodityItem) -> bool {
        item.vehicle_category()
            .map_or(false, |c| self.tractor_categories.contains(&c))
    }

    fn inspect(&self, item: &CommodityItem) -> InspectedItem {
        InspectedItem {
            item_id: item.id,
            line_number: item.line_number,
            category: item.category.clone(),
            is_tractor: self.is_tractor(item),
        }
    }

    /// 是否收取拖车费
    pub fn decide(&self, graph: &CommodityGraph, category: VehicleCategory, item_id: i64) -> bool {
        self.explain(graph, category, item_id).apply
    }

    /// 拖车费判定（含证据）
    ///
    /// # 判定顺序
    /// 1. 类别不在拖车类别内 → 不收
    /// 2. 货物行不存在 → 不收
    /// 3. 直接牵引于牵引车 → 不收；牵引目标非牵引车或不存在 → 收
    /// 4. 在堆叠中（作为根或成员）→ 堆叠内有牵引车则不收，否则收
    /// 5. 其余（独立、成环）→ 收
    pub fn explain(&self, graph: &CommodityGraph, category: VehicleCategory, item_id: i64) -> TowingDecision {
        let decision = |apply: bool, reason: TowingReason, inspected: Vec<InspectedItem>| TowingDecision {
            item_id,
            category,
            apply,
            reason,
            inspected,
        };

        if !self.towing_categories.contains(&category) {
            return decision(false, TowingReason::NotTowableCategory, Vec::new());
        }

        let item = match graph.item(item_id) {
            Some(item) => item,
            None => return decision(false, TowingReason::ItemNotFound, Vec::new()),
        };

        // 直接牵引
        if graph.is_connected(item_id) {
            return match graph.related_item(item_id) {
                Some(related) if self.is_tractor(related) => decision(
                    false,
                    TowingReason::ConnectedToTractor {
                        tractor_item_id: related.id,
                    },
                    vec![self.inspect(related)],
                ),
                Some(related) => decision(
                    true,
                    TowingReason::ConnectedToNonTractor {
                        related_item_id: related.id,
                        related_category: related.category.clone(),
                    },
                    vec![self.inspect(related)],
                ),
                None => {
                    let related_item_id = item.related_item_id.unwrap_or_default();
                    tracing::warn!(item_id, related_item_id, "牵引目标不存在，按独立挂车收取拖车费");
                    decision(
                        true,
                        TowingReason::ConnectedTargetMissing { related_item_id },
                        Vec::new(),
                    )
                }
            };
        }

        // 堆叠
        match graph.stack_root(item_id) {
            StackRoot::Root(stack_base_id) => {
                let members: Vec<&CommodityItem> = graph
                    .get_stack_members(item_id)
                    .into_iter()
                    .filter(|m| m.id != item_id)
                    .collect();
                let inspected: Vec<InspectedItem> = members.iter().map(|m| self.inspect(m)).collect();

                match members.iter().find(|m| self.is_tractor(m)) {
                    Some(tractor) => decision(
                        false,
                        TowingReason::StackHasTractor {
                            stack_base_id,
                            tractor_item_id: tractor.id,
                        },
                        inspected,
                    ),
                    None => decision(true, TowingReason::StackWithoutTractor { stack_base_id }, inspected),
                }
            }
            StackRoot::Cycle => {
                tracing::warn!(item_id, "堆叠关系成环，按独立挂车收取拖车费");
                decision(true, TowingReason::StackCycle, Vec::new())
            }
            StackRoot::NotInStack => decision(true, TowingReason::Standalone, Vec::new()),
        }
    }
}
