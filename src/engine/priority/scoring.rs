// 分项得分：先截断到 [0, cap] 再按权重缩放

pub const REVENUE_WEIGHT: f64 = 30.0;
pub const REVENUE_PER_UNIT_CAP: f64 = 1000.0;

pub const TURNOVER_WEIGHT: f64 = 25.0;
pub const TURNOVER_CAP: f64 = 10.0;

pub const STOCK_WEIGHT: f64 = 25.0;
/// 库存健康度上限：超过 2 倍再订货点视为完全充足
pub const STOCK_HEALTH_CAP: f64 = 2.0;

pub const LEAD_TIME_WEIGHT: f64 = 20.0;
pub const LEAD_TIME_CAP_DAYS: f64 = 30.0;

pub(super) fn revenue_score(revenue_per_unit: f64) -> f64 {
    (revenue_per_unit / REVENUE_PER_UNIT_CAP).min(1.0) * REVENUE_WEIGHT
}

pub(super) fn turnover_score(turnover_ratio: f64) -> f64 {
    (turnover_ratio / TURNOVER_CAP).min(1.0) * TURNOVER_WEIGHT
}

/// 库存越低于再订货点得分越高；stock_health = 1 时恰为 STOCK_WEIGHT
pub(super) fn stock_score(stock_health: f64) -> f64 {
    (STOCK_HEALTH_CAP - stock_health.min(STOCK_HEALTH_CAP)) * STOCK_WEIGHT
}

pub(super) fn lead_risk_score(lead_time_days: f64) -> f64 {
    (lead_time_days / LEAD_TIME_CAP_DAYS).min(1.0) * LEAD_TIME_WEIGHT
}
