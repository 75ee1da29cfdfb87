// ==========================================
// SCM 推荐系统 - 指标与评分值对象
// ==========================================
// 生命周期: 每次运行按 SKU 新鲜计算，不缓存、不修改
// ==========================================

use crate::domain::types::PriorityLevel;
use serde::{Deserialize, Serialize};

/// 库存指标集
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricSet {
    /// 周转率 = 销量 / 库存（2 位小数）
    pub turnover_ratio: f64,
    /// 日均需求 = 销量 / 30（不单独取整）
    pub daily_demand: f64,
    /// 再订货点 = 提前期 × 日均需求（2 位小数）
    pub reorder_point: f64,
    /// 安全库存 = 1.65 × 日均需求 × 0.3 × √提前期（2 位小数）
    pub safety_stock: f64,
    /// 单位收入 = 收入 / 销量（2 位小数）
    pub revenue_per_unit: f64,
}

/// 评分分项（可解释性）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub revenue_score: f64,
    pub turnover_score: f64,
    pub stock_health: f64,
    pub stock_score: f64,
    pub lead_risk_score: f64,
}

impl ScoreBreakdown {
    /// 贡献最大的评分分项（并列时取先出现者）
    ///
    /// 返回 REVENUE / TURNOVER / STOCK / LEAD_TIME 之一
    pub fn primary_factor(&self) -> &'static str {
        let components = [
            ("REVENUE", self.revenue_score),
            ("TURNOVER", self.turnover_score),
            ("STOCK", self.stock_score),
            ("LEAD_TIME", self.lead_risk_score),
        ];
        components
            .iter()
            .fold(("REVENUE", f64::MIN), |best, (name, value)| {
                if *value > best.1 {
                    (*name, *value)
                } else {
                    best
                }
            })
            .0
    }
}

/// 优先级评分
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriorityScore {
    /// 综合得分 [0, 100]，2 位小数
    pub score: f64,
    pub level: PriorityLevel,
    pub breakdown: ScoreBreakdown,
}
