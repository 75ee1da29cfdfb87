// ==========================================
// SCM 推荐系统 - 结果导出
// ==========================================
// 职责: 写出报告文本、排序简报 CSV、跳过清单 JSON
// ==========================================

use crate::domain::brief::{RankedBrief, SkippedSku};
use crate::engine::priority::PriorityScorer;
use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("文件写入失败: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV 写入失败: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON 序列化失败: {0}")]
    Json(#[from] serde_json::Error),
}

/// CSV 行（展平后的排序条目）
#[derive(Debug, Serialize)]
struct BriefCsvRow<'a> {
    rank: usize,
    sku: &'a str,
    product_type: &'a str,
    priority_score: f64,
    priority_level: &'static str,
    turnover_ratio: f64,
    daily_demand: f64,
    reorder_point: f64,
    safety_stock: f64,
    revenue_per_unit: f64,
    stock_level: i64,
    lead_time_days: f64,
    primary_factor: &'static str,
    /// 评分原因 JSON
    score_reason: String,
}

fn ensure_parent(path: &Path) -> Result<(), ExportError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

pub fn write_report_text(path: &Path, report: &str) -> Result<(), ExportError> {
    ensure_parent(path)?;
    fs::write(path, report)?;
    Ok(())
}

/// 写出排序简报
pub fn write_brief_csv_to<W: Write>(writer: W, brief: &RankedBrief) -> Result<(), ExportError> {
    let scorer = PriorityScorer::new();
    let mut wtr = csv::Writer::from_writer(writer);
    for entry in &brief.entries {
        wtr.serialize(BriefCsvRow {
            rank: entry.rank,
            sku: &entry.sku,
            product_type: &entry.product_type,
            priority_score: entry.priority.score,
            priority_level: entry.priority.level.as_str(),
            turnover_ratio: entry.metrics.turnover_ratio,
            daily_demand: entry.metrics.daily_demand,
            reorder_point: entry.metrics.reorder_point,
            safety_stock: entry.metrics.safety_stock,
            revenue_per_unit: entry.metrics.revenue_per_unit,
            stock_level: entry.stock_level,
            lead_time_days: entry.lead_time_days,
            primary_factor: entry.priority.breakdown.primary_factor(),
            score_reason: scorer.generate_score_reason(&entry.priority),
        })?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_brief_csv(path: &Path, brief: &RankedBrief) -> Result<(), ExportError> {
    ensure_parent(path)?;
    write_brief_csv_to(fs::File::create(path)?, brief)
}

pub fn write_skipped_json(path: &Path, skipped: &[SkippedSku]) -> Result<(), ExportError> {
    ensure_parent(path)?;
    let json = serde_json::to_string_pretty(skipped)?;
    fs::write(path, json)?;
    Ok(())
}
