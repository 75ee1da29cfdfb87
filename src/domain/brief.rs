// ==========================================
// SCM 推荐系统 - 排序简报
// ==========================================
// 职责: 流水线移交给报告生成方的结构化简报
// 生命周期: 每次运行生成一次，移交后即丢弃
// ==========================================

use crate::domain::metrics::{MetricSet, PriorityScore};
use crate::domain::types::{PriorityLevel, SkuErrorKind};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 已评分的 SKU（排序前）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredSku {
    pub sku: String,
    pub product_type: String,
    pub stock_level: i64,
    pub lead_time_days: f64,
    pub metrics: MetricSet,
    pub priority: PriorityScore,
}

/// 简报中的一条排序结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedSku {
    /// 名次（从 1 开始）
    pub rank: usize,
    pub sku: String,
    pub product_type: String,
    pub stock_level: i64,
    pub lead_time_days: f64,
    pub metrics: MetricSet,
    pub priority: PriorityScore,
}

/// 被跳过的 SKU 及原因
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedSku {
    pub sku: String,
    pub kind: SkuErrorKind,
    pub message: String,
}

/// 简报统计
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BriefSummary {
    /// 查询返回的记录数
    pub fetched: usize,
    /// 评分成功数
    pub scored: usize,
    /// 跳过数
    pub skipped: usize,
    /// 经过过滤后进入简报的条数
    pub included: usize,
    /// 全部评分成功 SKU 的等级分布
    pub by_level: BTreeMap<PriorityLevel, usize>,
}

impl BriefSummary {
    pub fn count_of(&self, level: PriorityLevel) -> usize {
        self.by_level.get(&level).copied().unwrap_or(0)
    }
}

/// 排序简报
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedBrief {
    pub run_id: String,
    pub generated_at: DateTime<Utc>,
    /// 按得分降序、SKU 升序排列
    pub entries: Vec<RankedSku>,
    pub skipped: Vec<SkippedSku>,
    pub summary: BriefSummary,
    /// 叙述段落句数提示
    pub narrative_sentences: u8,
}

impl RankedBrief {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 某等级的条目
    pub fn entries_at(&self, level: PriorityLevel) -> impl Iterator<Item = &RankedSku> {
        self.entries
            .iter()
            .filter(move |e| e.priority.level == level)
    }
}
