// ==========================================
// RoRo 承运商规则核心 - 货物组合关系图
// ==========================================
// 职责: 单个报价单内货物行的连接/堆叠结构查询
// 红线: 无状态、无副作用、无 I/O 操作
// 约束: 沿 related_item_id 遍历时以货物行数为上界，检测到环按"不在堆叠中"处理
// ==========================================

use crate::domain::commodity::CommodityItem;
use crate::domain::types::RelationshipType;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// 堆叠根查找结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StackRoot {
    NotInStack,
    Root(i64),
    Cycle,
}

/// 结构完整性问题类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GraphIssueKind {
    DanglingRelation,       // related_item_id 指向不存在的货物行
    SelfReference,          // related_item_id 指向自己
    SeparateWithRelation,   // separate 却带有 related_item_id
    ConnectedWithoutTarget, // connected 却没有 related_item_id
    LoadedWithoutTarget,    // loaded_with 却没有 related_item_id
    CrossQuotationRelation, // 指向其他报价单的货物行
    StackCycle,             // 堆叠关系成环
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphIssue {
    pub item_id: i64,
    pub line_number: i32,
    pub kind: GraphIssueKind,
    pub related_item_id: Option<i64>,
}

// ==========================================
// CommodityGraph - 货物组合关系图
// ==========================================
#[derive(Debug, Clone)]
pub struct CommodityGraph {
    items: Vec<CommodityItem>, // 按 line_number, id 排序
    index: HashMap<i64, usize>,
    stack_children: HashMap<i64, Vec<i64>>, // 堆叠上级 → 装载于其上的货物行
    roots: HashMap<i64, StackRoot>,         // 构建时一次算出
}

impl CommodityGraph {
    pub fn new(mut items: Vec<CommodityItem>) -> Self {
        items.sort_by(|a, b| a.line_number.cmp(&b.line_number).then(a.id.cmp(&b.id)));
        let index = items.iter().enumerate().map(|(pos, item)| (item.id, pos)).collect();
        let mut graph = Self {
            items,
            index,
            stack_children: HashMap::new(),
            roots: HashMap::new(),
        };

        let mut stack_children: HashMap<i64, Vec<i64>> = HashMap::new();
        for item in &graph.items {
            if let Some(parent) = graph.stack_parent(item.id) {
                stack_children.entry(parent.id).or_default().push(item.id);
            }
        }
        graph.stack_children = stack_children;

        let roots = graph
            .items
            .iter()
            .map(|item| (item.id, graph.walk_to_root(item.id)))
            .collect();
        graph.roots = roots;
        graph
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// 全部货物行（行号顺序）
    pub fn items(&self) -> &[CommodityItem] {
        &self.items
    }

    pub fn item(&self, item_id: i64) -> Option<&CommodityItem> {
        self.index.get(&item_id).map(|&pos| &self.items[pos])
    }

    /// 关联货物行
    ///
    /// 悬空引用、自引用、跨报价单引用均视为"无关联"
    pub fn related_item(&self, item_id: i64) -> Option<&CommodityItem> {
        let item = self.item(item_id)?;
        let related_id = item.related_item_id?;
        if related_id == item.id {
            return None;
        }
        self.item(related_id)
            .filter(|related| related.quotation_id == item.quotation_id)
    }

    pub fn is_separate(&self, item_id: i64) -> bool {
        self.item(item_id).map_or(false, |item| {
            item.relationship_type == RelationshipType::Separate && item.related_item_id.is_none()
        })
    }

    /// 是否直接牵引连接到另一件货物（目标是否存在不影响结果）
    pub fn is_connected(&self, item_id: i64) -> bool {
        self.item(item_id).map_or(false, |item| {
            item.relationship_type == RelationshipType::Connected && item.related_item_id.is_some()
        })
    }

    /// 堆叠上级（装载于其上的那件货物）
    fn stack_parent(&self, item_id: i64) -> Option<&CommodityItem> {
        let item = self.item(item_id)?;
        if item.relationship_type != RelationshipType::LoadedWith {
            return None;
        }
        self.related_item(item_id)
    }

    /// 是否有其他货物装载于该货物之上
    fn has_stack_children(&self, item_id: i64) -> bool {
        self.stack_children.get(&item_id).map_or(false, |children| !children.is_empty())
    }

    /// 查找堆叠根
    pub fn stack_root(&self, item_id: i64) -> StackRoot {
        self.roots.get(&item_id).copied().unwrap_or(StackRoot::NotInStack)
    }

    /// 沿 related_item_id 向上走到堆叠根
    fn walk_to_root(&self, item_id: i64) -> StackRoot {
        if self.item(item_id).is_none() {
            return StackRoot::NotInStack;
        }

        let mut visited: HashSet<i64> = HashSet::new();
        visited.insert(item_id);
        let mut current = item_id;

        // 最多走 len 步；超过即必然成环
        for _ in 0..self.items.len() {
            match self.stack_parent(current) {
                Some(parent) => {
                    if !visited.insert(parent.id) {
                        return StackRoot::Cycle;
                    }
                    current = parent.id;
                }
                None => {
                    if current == item_id && !self.has_stack_children(item_id) {
                        return StackRoot::NotInStack;
                    }
                    return StackRoot::Root(current);
                }
            }
        }

        StackRoot::Cycle
    }

    /// 堆叠组标识（堆叠根的货物行ID），不在堆叠中或成环时为 None
    pub fn get_stack_group(&self, item_id: i64) -> Option<i64> {
        match self.stack_root(item_id) {
            StackRoot::Root(root) => Some(root),
            StackRoot::NotInStack => None,
            StackRoot::Cycle => {
                tracing::warn!(item_id, "堆叠关系成环，按不在堆叠中处理");
                None
            }
        }
    }

    pub fn is_in_stack(&self, item_id: i64) -> bool {
        self.get_stack_group(item_id).is_some()
    }

    pub fn is_stack_base(&self, item_id: i64) -> bool {
        self.get_stack_group(item_id) == Some(item_id)
    }

    /// 同一堆叠内的全部货物行（行号顺序，含自身）；不在堆叠中时为空
    pub fn get_stack_members(&self, item_id: i64) -> Vec<&CommodityItem> {
        let root = match self.get_stack_group(item_id) {
            Some(root) => root,
            None => return Vec::new(),
        };
        // 从根向下展开，再按行号排序
        let mut member_ids = vec![root];
        let mut cursor = 0;
        while cursor < member_ids.len() {
            if let Some(children) = self.stack_children.get(&member_ids[cursor]) {
                member_ids.extend(children.iter().copied());
            }
            cursor += 1;
        }
        let mut positions: Vec<usize> = member_ids.iter().filter_map(|id| self.index.get(id).copied()).collect();
        positions.sort_unstable();
        positions.into_iter().map(|pos| &self.items[pos]).collect()
    }

    /// 是否为至少承载了一件其他货物的堆叠根
    pub fn is_loaded_with(&self, item_id: i64) -> bool {
        self.is_stack_base(item_id) && self.get_stack_members(item_id).len() > 1
    }

    /// 结构完整性检查（审计使用，不影响判定）
    pub fn integrity_issues(&self) -> Vec<GraphIssue> {
        let mut issues = Vec::new();

        for item in &self.items {
            let mut push = |kind: GraphIssueKind| {
                issues.push(GraphIssue {
                    item_id: item.id,
                    line_number: item.line_number,
                    kind,
                    related_item_id: item.related_item_id,
                });
            };

            match (item.relationship_type, item.related_item_id) {
                (RelationshipType::Separate, Some(_)) => push(GraphIssueKind::SeparateWithRelation),
                (RelationshipType::Connected, None) => push(GraphIssueKind::ConnectedWithoutTarget),
                (RelationshipType::LoadedWith, None) => push(GraphIssueKind::LoadedWithoutTarget),
                _ => {}
            }

            if let Some(related_id) = item.related_item_id {
                if related_id == item.id {
                    push(GraphIssueKind::SelfReference);
                } else {
                    match self.item(related_id) {
                        None => push(GraphIssueKind::DanglingRelation),
                        Some(related) if related.quotation_id != item.quotation_id => {
                            push(GraphIssueKind::CrossQuotationRelation)
                        }
                        Some(_) => {}
                    }
                }
            }

            if item.relationship_type == RelationshipType::LoadedWith
                && self.stack_root(item.id) == StackRoot::Cycle
            {
                push(GraphIssueKind::StackCycle);
            }
        }

        issues
    }
}
