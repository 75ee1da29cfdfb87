// ==========================================
// SCM 推荐系统 - 模板报告生成
// ==========================================
// 职责: 不依赖外部服务，按简报确定性地生成文本报告
// ==========================================

use crate::domain::brief::{RankedBrief, RankedSku};
use crate::domain::types::PriorityLevel;
use crate::report::generator::{ReportError, ReportGenerator};
use async_trait::async_trait;
use std::fmt::Write;

/// 明细段落最多列出的 SKU 数
pub const DEFAULT_DETAIL_ROWS: usize = 20;

/// 补货提前期风险阈值（天）
const LONG_LEAD_TIME_DAYS: f64 = 30.0;

#[derive(Debug, Clone)]
pub struct TemplateReportGenerator {
    detail_rows: usize,
}

impl Default for TemplateReportGenerator {
    fn default() -> Self {
        Self {
            detail_rows: DEFAULT_DETAIL_ROWS,
        }
    }
}

impl TemplateReportGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_detail_rows(detail_rows: usize) -> Self {
        Self { detail_rows }
    }

    /// 渲染完整报告
    pub fn render(&self, brief: &RankedBrief) -> String {
        let mut out = String::new();
        let summary = &brief.summary;

        let _ = writeln!(out, "SKU 库存优先级推荐报告");
        let _ = writeln!(out, "运行编号: {}", brief.run_id);
        let _ = writeln!(
            out,
            "生成时间: {}",
            brief.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
        );
        let _ = writeln!(out);

        // ===== 一、概览 =====
        let _ = writeln!(out, "一、概览");
        let _ = writeln!(
            out,
            "共读取 {} 个 SKU，评分成功 {} 个，跳过 {} 个，简报收录 {} 个。",
            summary.fetched, summary.scored, summary.skipped, summary.included
        );
        let histogram = PriorityLevel::all_desc()
            .iter()
            .map(|level| format!("{} {}", level, summary.count_of(*level)))
            .collect::<Vec<_>>()
            .join(" / ");
        let _ = writeln!(out, "等级分布: {}", histogram);
        let _ = writeln!(out);

        // ===== 二、重点 SKU =====
        let _ = writeln!(out, "二、重点 SKU");
        if brief.entries.is_empty() {
            let _ = writeln!(out, "（无）");
        }
        for entry in brief.entries.iter().take(self.detail_rows) {
            let _ = writeln!(
                out,
                "{}. {} ({}) 得分 {:.2} [{}]",
                entry.rank, entry.sku, entry.product_type, entry.priority.score, entry.priority.level
            );
            let _ = writeln!(
                out,
                "   周转率 {:.2}，再订货点 {:.2}，安全库存 {:.2}，当前库存 {}，单位收入 {:.2}，主要因素 {}。建议: {}",
                entry.metrics.turnover_ratio,
                entry.metrics.reorder_point,
                entry.metrics.safety_stock,
                entry.stock_level,
                entry.metrics.revenue_per_unit,
                entry.priority.breakdown.primary_factor(),
                action_for(entry)
            );
        }
        if brief.entries.len() > self.detail_rows {
            let _ = writeln!(out, "……其余 {} 个 SKU 略。", brief.entries.len() - self.detail_rows);
        }
        let _ = writeln!(out);

        // ===== 三、跳过的 SKU =====
        let _ = writeln!(out, "三、跳过的 SKU");
        if brief.skipped.is_empty() {
            let _ = writeln!(out, "（无）");
        }
        for skipped in &brief.skipped {
            let _ = writeln!(out, "- {}: {} ({})", skipped.sku, skipped.kind, skipped.message);
        }
        let _ = writeln!(out);

        // ===== 四、建议 =====
        let _ = writeln!(out, "四、建议");
        for (i, sentence) in recommendation_sentences(brief)
            .into_iter()
            .take(brief.narrative_sentences.max(1) as usize)
            .enumerate()
        {
            let _ = writeln!(out, "{}. {}", i + 1, sentence);
        }

        out
    }
}

#[async_trait]
impl ReportGenerator for TemplateReportGenerator {
    async fn generate(&self, brief: &RankedBrief) -> Result<String, ReportError> {
        Ok(self.render(brief))
    }

    fn name(&self) -> &str {
        "template"
    }
}

/// 单个 SKU 的处理建议
fn action_for(entry: &RankedSku) -> String {
    let base = match entry.priority.level {
        PriorityLevel::Critical => "立即补货",
        PriorityLevel::High => "本周内安排补货",
        PriorityLevel::Medium => "纳入常规补货计划",
        PriorityLevel::Low => "维持现状",
    };

    if (entry.stock_level as f64) < entry.metrics.reorder_point {
        format!("{}（库存已低于再订货点）", base)
    } else {
        base.to_string()
    }
}

fn join_skus<'a>(entries: impl Iterator<Item = &'a RankedSku>, max: usize) -> String {
    entries.take(max).map(|e| e.sku.as_str()).collect::<Vec<_>>().join("、")
}

/// 按重要程度排列的建议句
fn recommendation_sentences(brief: &RankedBrief) -> Vec<String> {
    let mut sentences = Vec::new();

    let critical = brief.entries_at(PriorityLevel::Critical).count();
    if critical > 0 {
        sentences.push(format!(
            "有 {} 个 SKU 处于 CRITICAL 等级，应立即补货，优先处理 {}。",
            critical,
            join_skus(brief.entries_at(PriorityLevel::Critical), 5)
        ));
    }

    let high = brief.entries_at(PriorityLevel::High).count();
    if high > 0 {
        sentences.push(format!(
            "{} 个 SKU 处于 HIGH 等级，建议本周内完成补货排程。",
            high
        ));
    }

    let below_reorder: Vec<&RankedSku> = brief
        .entries
        .iter()
        .filter(|e| (e.stock_level as f64) < e.metrics.reorder_point)
        .collect();
    if !below_reorder.is_empty() {
        sentences.push(format!(
            "{} 个 SKU 当前库存低于再订货点，需要检查在途订单，包括 {}。",
            below_reorder.len(),
            join_skus(below_reorder.iter().copied(), 5)
        ));
    }

    let long_lead = brief
        .entries
        .iter()
        .filter(|e| e.lead_time_days >= LONG_LEAD_TIME_DAYS)
        .count();
    if long_lead > 0 {
        sentences.push(format!(
            "{} 个 SKU 补货提前期不少于 {} 天，建议与供应商协商缩短交期或提高安全库存。",
            long_lead, LONG_LEAD_TIME_DAYS as i64
        ));
    }

    if !brief.skipped.is_empty() {
        sentences.push(format!(
            "{} 个 SKU 因数据问题被跳过，需核查源数据中的库存、销量与提前期字段。",
            brief.skipped.len()
        ));
    }

    if sentences.is_empty() {
        sentences.push("库存整体健康，维持当前补货节奏即可。".to_string());
    }

    sentences
}
