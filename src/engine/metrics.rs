// ==========================================
// SCM 推荐系统 - 库存指标计算引擎
// ==========================================
// 输入: 单条 SKU 记录
// 输出: 周转率 / 日均需求 / 再订货点 / 安全库存 / 单位收入
// ==========================================
// 取整规则: 2 位小数，四舍五入（远离零），只作用于四个输出指标，
//           日均需求作为中间量不取整
// ==========================================

use crate::domain::metrics::MetricSet;
use crate::domain::sku::SkuRecord;
use crate::engine::error::SkuError;

/// 需求统计窗口（天）
pub const DEMAND_WINDOW_DAYS: f64 = 30.0;
/// 95% 服务水平对应的 z 值
pub const SERVICE_LEVEL_Z: f64 = 1.65;
/// 需求波动系数
pub const DEMAND_VARIABILITY: f64 = 0.3;

/// 保留 2 位小数（四舍五入，远离零）
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

// ==========================================
// MetricsCalculator - 指标计算引擎
// ==========================================
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsCalculator {
    // 无状态引擎
}

impl MetricsCalculator {
    pub fn new() -> Self {
        Self {}
    }

    /// 计算单个 SKU 的库存指标
    ///
    /// # 错误
    /// - InvalidInput: 提前期为负或非有限值；销量/库存/收入为负
    /// - DivisionByZero: 库存为 0 或销量为 0
    pub fn compute(&self, record: &SkuRecord) -> Result<MetricSet, SkuError> {
        Self::validate(record)?;

        if record.stock_level == 0 {
            return Err(SkuError::DivisionByZero {
                field: "stock_level",
            });
        }
        if record.units_sold == 0 {
            return Err(SkuError::DivisionByZero {
                field: "units_sold",
            });
        }

        let units_sold = record.units_sold as f64;
        let stock_level = record.stock_level as f64;
        let lead_time = record.lead_time_days;

        let daily_demand = units_sold / DEMAND_WINDOW_DAYS;

        Ok(MetricSet {
            turnover_ratio: round2(units_sold / stock_level),
            daily_demand,
            reorder_point: round2(lead_time * daily_demand),
            safety_stock: round2(SERVICE_LEVEL_Z * daily_demand * DEMAND_VARIABILITY * lead_time.sqrt()),
            revenue_per_unit: round2(record.revenue / units_sold),
        })
    }

    fn validate(record: &SkuRecord) -> Result<(), SkuError> {
        if !record.lead_time_days.is_finite() {
            return Err(SkuError::invalid(
                "lead_time_days",
                record.lead_time_days,
                "提前期必须为有限值",
            ));
        }
        if record.lead_time_days < 0.0 {
            return Err(SkuError::invalid(
                "lead_time_days",
                record.lead_time_days,
                "提前期不能为负",
            ));
        }
        if record.units_sold < 0 {
            return Err(SkuError::invalid("units_sold", record.units_sold, "销量不能为负"));
        }
        if record.stock_level < 0 {
            return Err(SkuError::invalid("stock_level", record.stock_level, "库存不能为负"));
        }
        if !record.revenue.is_finite() || record.revenue < 0.0 {
            return Err(SkuError::invalid("revenue", record.revenue, "收入必须为非负有限值"));
        }
        Ok(())
    }
}
