// ==========================================
// RoRo 承运商规则核心 - 领域类型定义
// ==========================================
// 职责: 车辆类别、组合关系、运价单位、附加费计算方式等枚举
// 约定: 数据库存储使用 snake_case 字符串（与导入数据一致）
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 车辆类别 (Vehicle Category)
// ==========================================
// 导入数据中的类别写法很杂，统一经 parse 归一
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VehicleCategory {
    Car,       // 轿车
    Suv,       // SUV / 4x4
    SmallVan,  // 小型厢式车
    BigVan,    // 大型厢式车
    Truck,     // 卡车（自带动力）
    Truckhead, // 牵引车头
    Trailer,   // 挂车（无动力）
    Roro,      // 其他滚装货（工程机械等）
    Other,     // 其他
}

impl VehicleCategory {
    /// 解析类别字符串（含同义词）
    ///
    /// # 返回
    /// - Some(VehicleCategory): 已知类别
    /// - None: 无法识别（调用方视为"无类别匹配"）
    pub fn parse(raw: &str) -> Option<Self> {
        let key: String = raw
            .trim()
            .to_lowercase()
            .chars()
            .map(|c| if c == '-' || c == ' ' { '_' } else { c })
            .collect();

        match key.as_str() {
            "car" | "cars" | "passenger_car" | "sedan" => Some(Self::Car),
            "suv" | "4x4" | "jeep" => Some(Self::Suv),
            "small_van" | "smallvan" | "svan" | "van" => Some(Self::SmallVan),
            "big_van" | "bigvan" | "bvan" | "large_van" | "high_roof_van" => Some(Self::BigVan),
            "truck" | "lorry" | "rigid_truck" => Some(Self::Truck),
            "truckhead" | "truck_head" | "tractor" | "tractor_unit" => Some(Self::Truckhead),
            "trailer" | "semi_trailer" | "semitrailer" | "flatbed_trailer" => Some(Self::Trailer),
            "roro" | "high_and_heavy" | "machinery" | "static_cargo" => Some(Self::Roro),
            "other" | "misc" => Some(Self::Other),
            _ => None,
        }
    }

    /// 数据库存储字符串
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Car => "car",
            Self::Suv => "suv",
            Self::SmallVan => "small_van",
            Self::BigVan => "big_van",
            Self::Truck => "truck",
            Self::Truckhead => "truckhead",
            Self::Trailer => "trailer",
            Self::Roro => "roro",
            Self::Other => "other",
        }
    }

    /// 按车辆类别归入 PDF 报表的四个桶
    pub fn pdf_bucket(&self) -> Option<PdfCategory> {
        match self {
            Self::Car | Self::Suv => Some(PdfCategory::Car),
            Self::SmallVan => Some(PdfCategory::Svan),
            Self::BigVan => Some(PdfCategory::Bvan),
            Self::Truck | Self::Truckhead | Self::Trailer | Self::Roro => Some(PdfCategory::Lm),
            Self::Other => None,
        }
    }
}

impl fmt::Display for VehicleCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// PDF 报表类别 (PDF Category)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PdfCategory {
    Car,  // 轿车
    Svan, // 小厢车
    Bvan, // 大厢车
    Lm,   // 按车道米计费
}

impl PdfCategory {
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_uppercase().as_str() {
            "CAR" => Some(Self::Car),
            "SVAN" => Some(Self::Svan),
            "BVAN" => Some(Self::Bvan),
            "LM" => Some(Self::Lm),
            _ => None,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::Car => "CAR",
            Self::Svan => "SVAN",
            Self::Bvan => "BVAN",
            Self::Lm => "LM",
        }
    }
}

impl fmt::Display for PdfCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

// ==========================================
// 货物组合关系 (Relationship Type)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipType {
    Separate,   // 独立
    Connected,  // 牵引连接（挂车 → 车头）
    LoadedWith, // 装载于另一件货物之上（堆叠）
}

impl RelationshipType {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "separate" | "" => Some(Self::Separate),
            "connected" | "connected_to" | "towed_by" => Some(Self::Connected),
            "loaded_with" | "stacked" | "stacked_on" | "loaded_on" => Some(Self::LoadedWith),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Separate => "separate",
            Self::Connected => "connected",
            Self::LoadedWith => "loaded_with",
        }
    }
}

impl fmt::Display for RelationshipType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// 运价费用项 (Tariff Component)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TariffComponent {
    BaseFreight,    // 基础海运费
    Baf,            // 燃油附加费
    Ets,            // 欧盟碳排放附加费
    PortAdditional, // 港口附加费
    Admin,          // 操作费
    Thc,            // 码头操作费
    Measurement,    // 尺寸测量费
    Congestion,     // 拥堵附加费
    Iccm,           // ICCM
    FreightTax,     // 运费税
}

impl TariffComponent {
    pub const ALL: [TariffComponent; 10] = [
        Self::BaseFreight,
        Self::Baf,
        Self::Ets,
        Self::PortAdditional,
        Self::Admin,
        Self::Thc,
        Self::Measurement,
        Self::Congestion,
        Self::Iccm,
        Self::FreightTax,
    ];

    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|c| c.as_str() == raw.trim())
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BaseFreight => "base_freight",
            Self::Baf => "baf",
            Self::Ets => "ets",
            Self::PortAdditional => "port_additional",
            Self::Admin => "admin",
            Self::Thc => "thc",
            Self::Measurement => "measurement",
            Self::Congestion => "congestion",
            Self::Iccm => "iccm",
            Self::FreightTax => "freight_tax",
        }
    }
}

// ==========================================
// 计费单位 (Charge Unit)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChargeUnit {
    LumpSum,       // 整票一口价
    PerUnit,       // 按件
    PerLm,         // 按车道米
    PercentOfBase, // 基础运费百分比
}

impl ChargeUnit {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "lump_sum" | "lumpsum" | "flat" => Some(Self::LumpSum),
            "per_unit" | "unit" | "per_vehicle" => Some(Self::PerUnit),
            "per_lm" | "lm" => Some(Self::PerLm),
            "percent_of_base" | "percent" | "%" => Some(Self::PercentOfBase),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LumpSum => "lump_sum",
            Self::PerUnit => "per_unit",
            Self::PerLm => "per_lm",
            Self::PercentOfBase => "percent_of_base",
        }
    }
}

// ==========================================
// 附加费计算方式 (Surcharge Calc Mode)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SurchargeCalcMode {
    Flat,          // 固定金额
    PerUnit,       // 金额 × 数量
    PerLm,         // 金额 × 车道米
    PercentOfBase, // 基础运费 × 百分比
}

impl SurchargeCalcMode {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "flat" | "lump_sum" => Some(Self::Flat),
            "per_unit" => Some(Self::PerUnit),
            "per_lm" => Some(Self::PerLm),
            "percent_of_base" | "percent" => Some(Self::PercentOfBase),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Flat => "flat",
            Self::PerUnit => "per_unit",
            Self::PerLm => "per_lm",
            Self::PercentOfBase => "percent_of_base",
        }
    }
}

// ==========================================
// 附加费数量口径 (Quantity Mode)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuantityMode {
    PerItem,     // 按货物行数量
    PerStack,    // 每个堆叠计一次（堆叠成员不重复计费）
    PerShipment, // 整票计一次
}

impl QuantityMode {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "per_item" | "item" => Some(Self::PerItem),
            "per_stack" | "stack" => Some(Self::PerStack),
            "per_shipment" | "shipment" => Some(Self::PerShipment),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PerItem => "per_item",
            Self::PerStack => "per_stack",
            Self::PerShipment => "per_shipment",
        }
    }
}
