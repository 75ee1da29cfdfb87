// ==========================================
// SCM 推荐系统 - SKU 记录
// ==========================================
// 职责: 数据集一行的强类型表示
// 红线: 只读，流水线从不回写数据集
// ==========================================

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ==========================================
// 数据集列名（固定外部契约）
// ==========================================
pub mod columns {
    pub const SKU: &str = "SKU";
    pub const PRODUCT_TYPE: &str = "Product_type";
    pub const PRICE: &str = "Price";
    pub const AVAILABILITY: &str = "Availability";
    pub const UNITS_SOLD: &str = "Number_of_products_sold";
    pub const REVENUE: &str = "Revenue_generated";
    pub const STOCK_LEVEL: &str = "Stock_levels";
    pub const LEAD_TIME_DAYS: &str = "Lead_times";

    /// 参与计算的必需列
    pub const REQUIRED: [&str; 8] = [
        SKU,
        PRODUCT_TYPE,
        PRICE,
        AVAILABILITY,
        UNITS_SOLD,
        REVENUE,
        STOCK_LEVEL,
        LEAD_TIME_DAYS,
    ];

    /// 透传列（供应商/物流/制造属性，不参与计算）
    pub const PASS_THROUGH: [&str; 16] = [
        "Customer_demographics",
        "Order_quantities",
        "Shipping_times",
        "Shipping_carriers",
        "Shipping_costs",
        "Supplier_name",
        "Location",
        "Lead_time",
        "Production_volumes",
        "Manufacturing_lead_time",
        "Manufacturing_costs",
        "Inspection_results",
        "Defect_rates",
        "Transportation_modes",
        "Routes",
        "Costs",
    ];
}

// ==========================================
// SkuRecord - SKU 记录
// ==========================================
/// 数据集中的一条 SKU 记录
///
/// 列类型在数据访问边界一次性校验；数值域（负数等）由指标计算按 SKU 校验，
/// 单个 SKU 的坏数据不会中断整批计算。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkuRecord {
    pub sku: String,
    pub product_type: String,
    pub price: f64,
    pub availability: i64,
    pub units_sold: i64,
    pub revenue: f64,
    pub stock_level: i64,
    pub lead_time_days: f64,

    /// 其余列原样透传（列名 → 值）
    #[serde(default)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl SkuRecord {
    /// 读取透传列
    pub fn pass_through(&self, column: &str) -> Option<&serde_json::Value> {
        self.extra.get(column)
    }
}
