// ==========================================
// SCM 推荐系统 - 流水线编排器
// ==========================================
// 主流程: FETCHING → SCORING → RANKING → HANDOFF → DONE
// FAILED 只能由 FETCHING 进入（查询失败）
// ==========================================
// 红线:
// - 单个 SKU 计算失败只记入跳过清单，不中断整批
// - 报告生成失败原样返回，不合成部分报告
// ==========================================

use crate::config::PipelineConfig;
use crate::domain::brief::{BriefSummary, RankedBrief, ScoredSku, SkippedSku};
use crate::domain::sku::SkuRecord;
use crate::domain::types::{PipelineStage, PriorityLevel};
use crate::engine::metrics::MetricsCalculator;
use crate::engine::priority::PriorityScorer;
use crate::engine::ranking::PriorityRanker;
use crate::perf::StageTimer;
use crate::report::{build_generator, ReportError, ReportGenerator};
use crate::repository::{RepositoryError, SkuQuery, SkuRepository, SkuSource};
use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, error, info, warn};

// ==========================================
// PipelineError - 流水线错误
// ==========================================
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("数据查询失败: {0}")]
    Query(#[from] RepositoryError),

    #[error("报告生成失败: {0}")]
    ReportGeneration(#[from] ReportError),

    #[error("非法的阶段转换: {from} -> {to}")]
    InvalidStateTransition {
        from: PipelineStage,
        to: PipelineStage,
    },

    #[error("流水线配置错误: {0}")]
    Config(String),

    #[error("内部错误: {0}")]
    Internal(String),
}

// ==========================================
// 阶段记录
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageRecord {
    pub stage: PipelineStage,
    pub at: DateTime<Utc>,
}

/// 单次运行的阶段状态机
#[derive(Debug, Clone)]
pub struct PipelineRun {
    run_id: String,
    stage: PipelineStage,
    history: Vec<StageRecord>,
}

impl PipelineRun {
    /// 新运行，初始阶段为 FETCHING
    pub fn start() -> Self {
        Self {
            run_id: uuid::Uuid::new_v4().to_string(),
            stage: PipelineStage::Fetching,
            history: vec![StageRecord {
                stage: PipelineStage::Fetching,
                at: Utc::now(),
            }],
        }
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn stage(&self) -> PipelineStage {
        self.stage
    }

    pub fn history(&self) -> &[StageRecord] {
        &self.history
    }

    /// 阶段转换
    ///
    /// # 返回
    /// - Err(InvalidStateTransition): 转换不在允许集合内，阶段保持不变
    pub fn transition(&mut self, next: PipelineStage) -> Result<(), PipelineError> {
        if !self.stage.can_transition_to(next) {
            return Err(PipelineError::InvalidStateTransition {
                from: self.stage,
                to: next,
            });
        }

        debug!(run_id = %self.run_id, from = %self.stage, to = %next, "阶段转换");
        self.stage = next;
        self.history.push(StageRecord {
            stage: next,
            at: Utc::now(),
        });
        Ok(())
    }

    fn into_history(self) -> Vec<StageRecord> {
        self.history
    }
}

// ==========================================
// PipelineOutcome - 运行结果
// ==========================================
#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    pub run_id: String,
    /// 报告生成方返回的文本
    pub report: String,
    pub brief: RankedBrief,
    /// 跳过清单（SKU、错误类型、说明）
    pub skipped: Vec<SkippedSku>,
    pub stage_history: Vec<StageRecord>,
}

/// 对单条记录依次执行指标计算与优先级评分
///
/// # 返回
/// - Ok(ScoredSku): 评分成功
/// - Err(SkippedSku): 任一环节失败，携带 SKU 编号与错误类型
pub fn score_record(
    calculator: &MetricsCalculator,
    scorer: &PriorityScorer,
    record: &SkuRecord,
) -> Result<ScoredSku, SkippedSku> {
    let outcome = calculator.compute(record).and_then(|metrics| {
        scorer
            .score_metrics(&metrics, record.stock_level, record.lead_time_days)
            .map(|priority| (metrics, priority))
    });

    match outcome {
        Ok((metrics, priority)) => Ok(ScoredSku {
            sku: record.sku.clone(),
            product_type: record.product_type.clone(),
            stock_level: record.stock_level,
            lead_time_days: record.lead_time_days,
            metrics,
            priority,
        }),
        Err(e) => Err(SkippedSku {
            sku: record.sku.clone(),
            kind: e.kind(),
            message: e.to_string(),
        }),
    }
}

// ==========================================
// PipelineOrchestrator - 流水线编排器
// ==========================================
pub struct PipelineOrchestrator {
    config: Arc<PipelineConfig>,
    source: Arc<dyn SkuSource>,
    generator: Arc<dyn ReportGenerator>,
    calculator: MetricsCalculator,
    scorer: PriorityScorer,
    ranker: PriorityRanker,
    /// 专用评分线程池（None 时使用 rayon 全局池）
    pool: Option<Arc<rayon::ThreadPool>>,
}

impl PipelineOrchestrator {
    /// 创建编排器
    ///
    /// # 参数
    /// - config: 流水线配置
    /// - source: SKU 数据来源
    /// - generator: 报告生成方
    pub fn new(
        config: PipelineConfig,
        source: Arc<dyn SkuSource>,
        generator: Arc<dyn ReportGenerator>,
    ) -> Result<Self, PipelineError> {
        let pool = match config.worker_threads {
            Some(threads) if config.parallel_scoring => {
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(threads)
                    .thread_name(|i| format!("scm-score-{}", i))
                    .build()
                    .map_err(|e| PipelineError::Config(format!("评分线程池创建失败: {}", e)))?;
                Some(Arc::new(pool))
            }
            _ => None,
        };

        Ok(Self {
            ranker: PriorityRanker::new(config.min_priority_level, config.brief_limit),
            calculator: MetricsCalculator::new(),
            scorer: PriorityScorer::new(),
            config: Arc::new(config),
            source,
            generator,
            pool,
        })
    }

    /// 按配置装配 SQLite 数据源与报告生成方
    pub fn from_config(config: PipelineConfig) -> Result<Self, PipelineError> {
        let repo = SkuRepository::from_config(&config)?;
        let generator = build_generator(&config.report);
        Self::new(config, Arc::new(repo), generator)
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// 执行完整流程
    pub async fn run(&self, query: SkuQuery) -> Result<PipelineOutcome, PipelineError> {
        let started = Instant::now();
        let mut run = PipelineRun::start();
        info!(
            run_id = %run.run_id(),
            generator = self.generator.name(),
            parallel = self.config.parallel_scoring,
            "开始执行 SKU 优先级流水线"
        );

        // ==========================================
        // 步骤1: FETCHING - 读取数据集
        // ==========================================
        let records = match self.fetch(query).await {
            Ok(records) => records,
            Err(e) => {
                error!(run_id = %run.run_id(), error = %e, "数据查询失败，流水线终止");
                run.transition(PipelineStage::Failed)?;
                return Err(e);
            }
        };
        let fetched = records.len();
        info!(run_id = %run.run_id(), fetched, "数据读取完成");
        run.transition(PipelineStage::Scoring)?;

        // ==========================================
        // 步骤2: SCORING - 指标计算 + 优先级评分
        // ==========================================
        let (scored, skipped) = self.score(records).await?;
        for s in &skipped {
            warn!(run_id = %run.run_id(), sku = %s.sku, kind = %s.kind, reason = %s.message, "SKU 已跳过");
        }
        info!(run_id = %run.run_id(), scored = scored.len(), skipped = skipped.len(), "评分完成");
        run.transition(PipelineStage::Ranking)?;

        // ==========================================
        // 步骤3: RANKING - 排序 + 过滤
        // ==========================================
        let mut by_level = BTreeMap::new();
        for s in &scored {
            *by_level.entry(s.priority.level).or_insert(0) += 1;
        }
        let scored_count = scored.len();
        let entries = {
            let _timer = StageTimer::new("pipeline.ranking");
            self.ranker.rank(scored)
        };
        run.transition(PipelineStage::Handoff)?;

        // ==========================================
        // 步骤4: HANDOFF - 移交报告生成方
        // ==========================================
        let brief = RankedBrief {
            run_id: run.run_id().to_string(),
            generated_at: Utc::now(),
            summary: BriefSummary {
                fetched,
                scored: scored_count,
                skipped: skipped.len(),
                included: entries.len(),
                by_level,
            },
            entries,
            skipped: skipped.clone(),
            narrative_sentences: self.config.report.narrative_sentences,
        };

        debug!(run_id = %run.run_id(), included = brief.summary.included, "移交报告生成方");
        let report = match self.generator.generate(&brief).await {
            Ok(report) => report,
            Err(e) => {
                error!(run_id = %run.run_id(), generator = self.generator.name(), error = %e, "报告生成失败");
                return Err(e.into());
            }
        };
        run.transition(PipelineStage::Done)?;

        let elapsed_ms = started.elapsed().as_millis() as u64;
        info!(
            run_id = %run.run_id(),
            included = brief.summary.included,
            skipped = brief.summary.skipped,
            elapsed_ms,
            "流水线执行完成"
        );
        if self.config.telemetry_enabled {
            info!(
                target: "telemetry",
                run_id = %run.run_id(),
                fetched = brief.summary.fetched,
                scored = brief.summary.scored,
                skipped = brief.summary.skipped,
                included = brief.summary.included,
                critical = brief.summary.count_of(PriorityLevel::Critical),
                elapsed_ms,
                "pipeline_run"
            );
        }

        Ok(PipelineOutcome {
            run_id: run.run_id().to_string(),
            report,
            brief,
            skipped,
            stage_history: run.into_history(),
        })
    }

    /// 在阻塞线程上执行一次数据查询
    async fn fetch(&self, query: SkuQuery) -> Result<Vec<SkuRecord>, PipelineError> {
        let source = Arc::clone(&self.source);
        tokio::task::spawn_blocking(move || {
            let _timer = StageTimer::new("pipeline.fetch");
            source.fetch(&query)
        })
        .await
        .map_err(|e| PipelineError::Internal(format!("数据查询任务异常退出: {}", e)))?
        .map_err(PipelineError::from)
    }

    /// 在阻塞线程上执行评分
    async fn score(
        &self,
        records: Vec<SkuRecord>,
    ) -> Result<(Vec<ScoredSku>, Vec<SkippedSku>), PipelineError> {
        let calculator = self.calculator;
        let scorer = self.scorer;
        let parallel = self.config.parallel_scoring;
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let _timer = StageTimer::new("pipeline.scoring");
            score_all(&calculator, &scorer, &records, parallel, pool.as_deref())
        })
        .await
        .map_err(|e| PipelineError::Internal(format!("评分任务异常退出: {}", e)))
    }
}

/// 逐条评分，输出顺序与输入一致
///
/// # 参数
/// - parallel: false 时顺序计算
/// - pool: 专用线程池（None 时使用 rayon 全局池）
pub fn score_all(
    calculator: &MetricsCalculator,
    scorer: &PriorityScorer,
    records: &[SkuRecord],
    parallel: bool,
    pool: Option<&rayon::ThreadPool>,
) -> (Vec<ScoredSku>, Vec<SkippedSku>) {
    let score = |record: &SkuRecord| score_record(calculator, scorer, record);

    let results: Vec<Result<ScoredSku, SkippedSku>> = if !parallel {
        records.iter().map(score).collect()
    } else if let Some(pool) = pool {
        pool.install(|| records.par_iter().map(score).collect::<Vec<_>>())
    } else {
        records.par_iter().map(score).collect()
    };

    let mut scored = Vec::with_capacity(results.len());
    let mut skipped = Vec::new();
    for result in results {
        match result {
            Ok(s) => scored.push(s),
            Err(s) => skipped.push(s),
        }
    }
    (scored, skipped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::SkuErrorKind;
    use crate::repository::RepositoryResult;
    use async_trait::async_trait;
    use std::sync::Mutex;

    // ==========================================
    // 测试替身
    // ==========================================

    struct MemorySource(Vec<SkuRecord>);

    impl SkuSource for MemorySource {
        fn fetch(&self, _query: &SkuQuery) -> RepositoryResult<Vec<SkuRecord>> {
            Ok(self.0.clone())
        }
    }

    struct FailingSource;

    impl SkuSource for FailingSource {
        fn fetch(&self, _query: &SkuQuery) -> RepositoryResult<Vec<SkuRecord>> {
            Err(RepositoryError::DatabaseQueryError("no such table: supply_chain_data".to_string()))
        }
    }

    /// 记录收到的简报
    #[derive(Default)]
    struct CapturingGenerator {
        briefs: Mutex<Vec<RankedBrief>>,
    }

    #[async_trait]
    impl ReportGenerator for CapturingGenerator {
        async fn generate(&self, brief: &RankedBrief) -> Result<String, ReportError> {
            self.briefs.lock().unwrap().push(brief.clone());
            Ok(brief
                .entries
                .iter()
                .map(|e| format!("{}:{}", e.rank, e.sku))
                .collect::<Vec<_>>()
                .join(","))
        }

        fn name(&self) -> &str {
            "capturing"
        }
    }

    struct FailingGenerator;

    #[async_trait]
    impl ReportGenerator for FailingGenerator {
        async fn generate(&self, _brief: &RankedBrief) -> Result<String, ReportError> {
            Err(ReportError::Generator("upstream unavailable".to_string()))
        }

        fn name(&self) -> &str {
            "failing"
        }
    }

    fn record(sku: &str, units_sold: i64, stock_level: i64, lead_time_days: f64, revenue: f64) -> SkuRecord {
        SkuRecord {
            sku: sku.to_string(),
            product_type: "skincare".to_string(),
            price: 10.0,
            availability: 50,
            units_sold,
            revenue,
            stock_level,
            lead_time_days,
            extra: BTreeMap::new(),
        }
    }

    fn config(parallel: bool) -> PipelineConfig {
        PipelineConfig {
            parallel_scoring: parallel,
            ..PipelineConfig::default()
        }
    }

    fn orchestrator(
        config: PipelineConfig,
        records: Vec<SkuRecord>,
        generator: Arc<dyn ReportGenerator>,
    ) -> PipelineOrchestrator {
        PipelineOrchestrator::new(config, Arc::new(MemorySource(records)), generator).unwrap()
    }

    fn stages(outcome: &PipelineOutcome) -> Vec<PipelineStage> {
        outcome.stage_history.iter().map(|r| r.stage).collect()
    }

    // ==========================================
    // 正常流程
    // ==========================================

    #[tokio::test]
    async fn test_reference_sku_end_to_end() {
        let generator = Arc::new(CapturingGenerator::default());
        let orch = orchestrator(config(false), vec![record("A1", 120, 40, 9.0, 6000.0)], generator.clone());

        let outcome = orch.run(SkuQuery::default()).await.unwrap();

        assert_eq!(outcome.report, "1:A1");
        assert!(outcome.skipped.is_empty());
        let entry = &outcome.brief.entries[0];
        assert_eq!(entry.metrics.turnover_ratio, 3.0);
        assert_eq!(entry.metrics.reorder_point, 36.0);
        assert_eq!(entry.metrics.safety_stock, 5.94);
        assert_eq!(entry.priority.score, 37.22);
        assert_eq!(entry.priority.level, PriorityLevel::Medium);
        assert_eq!(
            stages(&outcome),
            vec![
                PipelineStage::Fetching,
                PipelineStage::Scoring,
                PipelineStage::Ranking,
                PipelineStage::Handoff,
                PipelineStage::Done
            ]
        );
        assert_eq!(generator.briefs.lock().unwrap().len(), 1);
        assert_eq!(outcome.brief.run_id, outcome.run_id);
    }

    #[tokio::test]
    async fn test_fault_isolation() {
        let records = vec![
            record("S1", 100, 20, 5.0, 1000.0),
            record("S2", 100, 0, 5.0, 1000.0),
            record("S3", 80, 60, 12.0, 4000.0),
            record("S4", 10, 5, 2.0, 300.0),
        ];
        let orch = orchestrator(config(true), records, Arc::new(CapturingGenerator::default()));

        let outcome = orch.run(SkuQuery::default()).await.unwrap();

        assert_eq!(outcome.brief.entries.len(), 3);
        assert_eq!(outcome.skipped.len(), 1);
        assert_eq!(outcome.skipped[0].sku, "S2");
        assert_eq!(outcome.skipped[0].kind, SkuErrorKind::DivisionByZero);
        assert_eq!(outcome.brief.skipped, outcome.skipped);
        assert_eq!(outcome.brief.summary.fetched, 4);
        assert_eq!(outcome.brief.summary.scored, 3);
    }

    #[tokio::test]
    async fn test_all_skipped_still_completes() {
        let records = vec![record("Z1", 0, 10, 5.0, 0.0), record("Z2", 5, 10, -1.0, 10.0)];
        let generator = Arc::new(CapturingGenerator::default());
        let orch = orchestrator(config(false), records, generator.clone());

        let outcome = orch.run(SkuQuery::default()).await.unwrap();

        assert!(outcome.brief.is_empty());
        assert_eq!(outcome.skipped[0].kind, SkuErrorKind::DivisionByZero);
        assert_eq!(outcome.skipped[1].kind, SkuErrorKind::InvalidInput);
        assert_eq!(generator.briefs.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_parallel_and_sequential_agree() {
        let records: Vec<SkuRecord> = (0..200)
            .map(|i| record(&format!("SKU{}", i), 10 + (i % 37), 1 + (i % 23), (i % 31) as f64, (i * 17) as f64))
            .collect();

        let sequential = orchestrator(config(false), records.clone(), Arc::new(CapturingGenerator::default()));
        let mut pooled_config = config(true);
        pooled_config.worker_threads = Some(3);
        let pooled = orchestrator(pooled_config, records, Arc::new(CapturingGenerator::default()));

        let a = sequential.run(SkuQuery::default()).await.unwrap();
        let b = pooled.run(SkuQuery::default()).await.unwrap();

        assert_eq!(a.brief.entries, b.brief.entries);
        assert_eq!(a.skipped, b.skipped);
        assert_eq!(a.report, b.report);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_pooled_scoring_on_current_thread_runtime() {
        let records: Vec<SkuRecord> = (0..50)
            .map(|i| record(&format!("SKU{}", i), 5 + i, i % 7, 3.0, (i * 40) as f64))
            .collect();
        let pool = rayon::ThreadPoolBuilder::new().num_threads(2).build().unwrap();
        let (expected, expected_skipped) = score_all(
            &MetricsCalculator::new(),
            &PriorityScorer::new(),
            &records,
            true,
            Some(&pool),
        );

        let mut cfg = config(true);
        cfg.worker_threads = Some(2);
        let orch = orchestrator(cfg, records, Arc::new(CapturingGenerator::default()));

        let outcome = orch.run(SkuQuery::default()).await.unwrap();

        assert_eq!(outcome.skipped, expected_skipped);
        assert_eq!(outcome.brief.summary.scored, expected.len());
        let mut ranked: Vec<&str> = outcome.brief.entries.iter().map(|e| e.sku.as_str()).collect();
        let mut direct: Vec<&str> = expected.iter().map(|s| s.sku.as_str()).collect();
        ranked.sort_unstable();
        direct.sort_unstable();
        assert_eq!(ranked, direct);
    }

    #[tokio::test]
    async fn test_brief_filters_are_applied() {
        let mut cfg = config(false);
        cfg.min_priority_level = Some(PriorityLevel::Medium);
        cfg.brief_limit = Some(1);
        let records = vec![
            record("LOWSKU", 10, 1000, 1.0, 10.0),
            record("HOT", 300, 5, 30.0, 300000.0),
            record("MID", 120, 40, 9.0, 6000.0),
        ];
        let orch = orchestrator(cfg, records, Arc::new(CapturingGenerator::default()));

        let outcome = orch.run(SkuQuery::default()).await.unwrap();

        assert_eq!(outcome.report, "1:HOT");
        assert_eq!(outcome.brief.summary.scored, 3);
        assert_eq!(outcome.brief.summary.included, 1);
        assert_eq!(outcome.brief.summary.count_of(PriorityLevel::Low), 1);
        assert!(outcome.skipped.is_empty());
    }

    // ==========================================
    // 失败路径
    // ==========================================

    #[tokio::test]
    async fn test_query_failure_aborts_run() {
        let generator = Arc::new(CapturingGenerator::default());
        let orch = PipelineOrchestrator::new(config(true), Arc::new(FailingSource), generator.clone()).unwrap();

        let err = orch.run(SkuQuery::default()).await.unwrap_err();

        assert!(matches!(err, PipelineError::Query(RepositoryError::DatabaseQueryError(_))));
        assert!(generator.briefs.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_report_failure_is_surfaced() {
        let orch = orchestrator(config(false), vec![record("A1", 120, 40, 9.0, 6000.0)], Arc::new(FailingGenerator));

        let err = orch.run(SkuQuery::default()).await.unwrap_err();
        assert!(matches!(err, PipelineError::ReportGeneration(ReportError::Generator(_))));
    }

    #[test]
    fn test_pipeline_run_rejects_illegal_transitions() {
        let mut run = PipelineRun::start();
        assert_eq!(run.stage(), PipelineStage::Fetching);

        let err = run.transition(PipelineStage::Handoff).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::InvalidStateTransition {
                from: PipelineStage::Fetching,
                to: PipelineStage::Handoff
            }
        ));
        assert_eq!(run.stage(), PipelineStage::Fetching);

        run.transition(PipelineStage::Scoring).unwrap();
        assert!(run.transition(PipelineStage::Failed).is_err());
        assert_eq!(run.history().len(), 2);
    }

    #[test]
    fn test_score_record_maps_errors() {
        let calc = MetricsCalculator::new();
        let scorer = PriorityScorer::new();

        let skipped = score_record(&calc, &scorer, &record("Q", 12, 3, 0.0, 10.0)).unwrap_err();
        // 提前期为 0 → 再订货点为 0
        assert_eq!(skipped.kind, SkuErrorKind::DivisionByZero);
        assert_eq!(skipped.sku, "Q");

        let scored = score_record(&calc, &scorer, &record("R", 120, 40, 9.0, 6000.0)).unwrap();
        assert_eq!(scored.priority.score, 37.22);
    }
}
