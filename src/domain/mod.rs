// ==========================================
// SCM 推荐系统 - 领域模型层
// ==========================================
// 职责: 定义 SKU 记录、指标、评分、简报等值对象
// 红线: 不含数据访问逻辑，不含计算逻辑
// ==========================================

pub mod brief;
pub mod metrics;
pub mod sku;
pub mod types;

// 重导出核心类型
pub use brief::{BriefSummary, RankedBrief, RankedSku, ScoredSku, SkippedSku};
pub use metrics::{MetricSet, PriorityScore, ScoreBreakdown};
pub use sku::{columns, SkuRecord};
pub use types::{PipelineStage, PriorityLevel, SkuErrorKind};
