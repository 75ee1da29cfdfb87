// ==========================================
// SCM 推荐系统 - 引擎层
// ==========================================
// 职责: 指标计算、优先级评分、排序、流程编排
// 红线: Engine 不拼 SQL，数据访问只经由 SkuSource
// ==========================================

pub mod error;
pub mod metrics;
pub mod orchestrator;
pub mod priority;
pub mod ranking;

// 重导出核心引擎
pub use error::SkuError;
pub use metrics::{round2, MetricsCalculator};
pub use orchestrator::{
    score_all, score_record, PipelineError, PipelineOrchestrator, PipelineOutcome, PipelineRun,
    StageRecord,
};
pub use priority::PriorityScorer;
pub use ranking::PriorityRanker;
