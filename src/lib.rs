// ==========================================
// SCM 推荐系统 - 核心库
// ==========================================
// 流程: 数据集读取 → 库存指标 → 优先级评分 → 排序简报 → 报告生成
// 技术栈: Rust + SQLite
// 系统定位: 决策支持 (报告供人工补货决策参考)
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 指标/评分/排序/编排
pub mod engine;

// 报告层 - 报告生成与导出
pub mod report;

// 配置层 - 环境配置
pub mod config;

// 数据库基础设施（只读连接/busy_timeout 统一）
pub mod db;

// 日志系统
pub mod logging;

// 性能观测（SQL 计数/慢查询/阶段耗时）
pub mod perf;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{PipelineStage, PriorityLevel, SkuErrorKind};

// 领域实体
pub use domain::{
    BriefSummary, MetricSet, PriorityScore, RankedBrief, RankedSku, ScoreBreakdown, ScoredSku,
    SkippedSku, SkuRecord,
};

// 仓储
pub use repository::{RepositoryError, SkuFilter, SkuQuery, SkuRepository, SkuSource};

// 引擎
pub use engine::{
    MetricsCalculator, PipelineError, PipelineOrchestrator, PipelineOutcome, PriorityRanker,
    PriorityScorer, SkuError,
};

// 报告
pub use report::{ReportError, ReportGenerator};

// 配置
pub use config::PipelineConfig;

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "SCM 库存优先级推荐系统";
