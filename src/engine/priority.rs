// ==========================================
// SCM 推荐系统 - 优先级评分引擎
// ==========================================
// 输入: 指标集 + 库存 + 再订货点 + 提前期
// 输出: 综合得分 [0, 100] + 优先级等级 + 分项
// ==========================================
// 权重: 收入 30 / 周转 25 / 库存健康 25 / 提前期风险 20
// 每个分项先截断再加权，限制离群值的贡献
// ==========================================

mod scoring;


use crate::domain::metrics::{MetricSet, PriorityScore, ScoreBreakdown};
use crate::domain::types::PriorityLevel;
use crate::engine::error::SkuError;
use crate::engine::metrics::round2;

pub use scoring::{
    LEAD_TIME_WEIGHT, LEAD_TIME_CAP_DAYS, REVENUE_PER_UNIT_CAP, REVENUE_WEIGHT, STOCK_HEALTH_CAP,
    STOCK_WEIGHT, TURNOVER_CAP, TURNOVER_WEIGHT,
};

/// 综合得分上限
pub const MAX_PRIORITY_SCORE: f64 = 100.0;

// ==========================================
// PriorityScorer - 优先级评分引擎
// ==========================================
#[derive(Debug, Clone, Copy, Default)]
pub struct PriorityScorer {
    // 无状态引擎
}

impl PriorityScorer {
    pub fn new() -> Self {
        Self {}
    }

    // ==========================================
    // 核心方法
    // ==========================================

    /// 计算优先级评分
    ///
    /// # 参数
    /// - `metrics`: 该 SKU 的指标集
    /// - `stock_level`: 当前库存
    /// - `reorder_point`: 再订货点（指标集中已取整的值）
    /// - `lead_time_days`: 补货提前期
    ///
    /// # 返回
    /// - Ok(PriorityScore): 得分按 2 位小数取整后再判定等级
    /// - Err(DivisionByZero): reorder_point 为 0
    pub fn score(
        &self,
        metrics: &MetricSet,
        stock_level: i64,
        reorder_point: f64,
        lead_time_days: f64,
    ) -> Result<PriorityScore, SkuError> {
        if reorder_point == 0.0 {
            return Err(SkuError::DivisionByZero {
                field: "reorder_point",
            });
        }
        if !reorder_point.is_finite() || reorder_point < 0.0 {
            return Err(SkuError::invalid(
                "reorder_point",
                reorder_point,
                "再订货点必须为正的有限值",
            ));
        }

        let revenue_score = scoring::revenue_score(metrics.revenue_per_unit);
        let turnover_score = scoring::turnover_score(metrics.turnover_ratio);
        let stock_health = stock_level as f64 / reorder_point;
        let stock_score = scoring::stock_score(stock_health);
        let lead_risk_score = scoring::lead_risk_score(lead_time_days);

        let raw = revenue_score + turnover_score + stock_score + lead_risk_score;
        let score = round2(raw.clamp(0.0, MAX_PRIORITY_SCORE));

        Ok(PriorityScore {
            score,
            level: PriorityLevel::from_score(score),
            breakdown: ScoreBreakdown {
                revenue_score,
                turnover_score,
                stock_health,
                stock_score,
                lead_risk_score,
            },
        })
    }

    /// 以指标集自带的再订货点评分
    pub fn score_metrics(
        &self,
        metrics: &MetricSet,
        stock_level: i64,
        lead_time_days: f64,
    ) -> Result<PriorityScore, SkuError> {
        self.score(metrics, stock_level, metrics.reorder_point, lead_time_days)
    }

    /// 生成评分原因 (可解释性)
    ///
    /// # 返回
    /// JSON 格式的评分原因字符串
    pub fn generate_score_reason(&self, priority: &PriorityScore) -> String {
        let b = &priority.breakdown;

        serde_json::json!({
            "score": priority.score,
            "level": priority.level.as_str(),
            "components": {
                "revenue_score": round2(b.revenue_score),
                "turnover_score": round2(b.turnover_score),
                "stock_health": round2(b.stock_health),
                "stock_score": round2(b.stock_score),
                "lead_risk_score": round2(b.lead_risk_score),
            },
            "primary_factor": b.primary_factor(),
        })
        .to_string()
    }
}
