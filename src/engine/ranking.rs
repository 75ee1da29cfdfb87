// ==========================================
// SCM 推荐系统 - 排序引擎
// ==========================================
// 排序键:
// 1) priority_score 降序
// 2) SKU 编号升序（得分相同时保证输出可复现）
// 之后按配置做等级过滤与 Top N 截断
// ==========================================

use crate::domain::brief::{RankedSku, ScoredSku};
use crate::domain::types::PriorityLevel;
use std::cmp::Ordering;

// ==========================================
// PriorityRanker - 排序引擎
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct PriorityRanker {
    /// 最低保留等级
    min_level: Option<PriorityLevel>,
    /// 最多保留条数
    limit: Option<usize>,
}

impl PriorityRanker {
    pub fn new(min_level: Option<PriorityLevel>, limit: Option<usize>) -> Self {
        Self { min_level, limit }
    }

    /// 排序（不过滤）
    pub fn sort(&self, mut scored: Vec<ScoredSku>) -> Vec<ScoredSku> {
        scored.sort_by(Self::compare);
        scored
    }

    /// 排序 + 过滤 + 编号名次
    ///
    /// 名次在过滤之后编号，从 1 开始连续
    pub fn rank(&self, scored: Vec<ScoredSku>) -> Vec<RankedSku> {
        let limit = self.limit.unwrap_or(usize::MAX);

        self.sort(scored)
            .into_iter()
            .filter(|s| match self.min_level {
                Some(min) => s.priority.level >= min,
                None => true,
            })
            .take(limit)
            .enumerate()
            .map(|(i, s)| RankedSku {
                rank: i + 1,
                sku: s.sku,
                product_type: s.product_type,
                stock_level: s.stock_level,
                lead_time_days: s.lead_time_days,
                metrics: s.metrics,
                priority: s.priority,
            })
            .collect()
    }

    /// 比较两个已评分 SKU
    ///
    /// # 返回
    /// Ordering::Less 表示 a 排在 b 前面
    fn compare(a: &ScoredSku, b: &ScoredSku) -> Ordering {
        // 1. 得分降序（total_cmp 保证全序）
        match b.priority.score.total_cmp(&a.priority.score) {
            Ordering::Equal => {}
            other => return other,
        }

        // 2. SKU 升序
        a.sku.cmp(&b.sku)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::metrics::{MetricSet, PriorityScore, ScoreBreakdown};

    fn scored(sku: &str, score: f64) -> ScoredSku {
        ScoredSku {
            sku: sku.to_string(),
            product_type: "cosmetics".to_string(),
            stock_level: 10,
            lead_time_days: 5.0,
            metrics: MetricSet {
                turnover_ratio: 1.0,
                daily_demand: 1.0,
                reorder_point: 5.0,
                safety_stock: 1.0,
                revenue_per_unit: 10.0,
            },
            priority: PriorityScore {
                score,
                level: PriorityLevel::from_score(score),
                breakdown: ScoreBreakdown {
                    revenue_score: 0.0,
                    turnover_score: 0.0,
                    stock_health: 1.0,
                    stock_score: 0.0,
                    lead_risk_score: 0.0,
                },
            },
        }
    }

    fn skus(ranked: &[RankedSku]) -> Vec<&str> {
        ranked.iter().map(|r| r.sku.as_str()).collect()
    }

    #[test]
    fn test_sort_by_score_descending() {
        let ranker = PriorityRanker::default();
        let ranked = ranker.rank(vec![scored("A", 10.0), scored("B", 80.0), scored("C", 45.5)]);

        assert_eq!(skus(&ranked), vec!["B", "C", "A"]);
        assert_eq!(
            ranked.iter().map(|r| r.rank).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
    }

    #[test]
    fn test_ties_broken_by_sku_ascending() {
        let ranker = PriorityRanker::default();
        let ranked = ranker.rank(vec![
            scored("SKU9", 42.0),
            scored("SKU10", 42.0),
            scored("SKU1", 42.0),
            scored("SKU5", 60.0),
        ]);

        // 字典序: "SKU1" < "SKU10" < "SKU9"
        assert_eq!(skus(&ranked), vec!["SKU5", "SKU1", "SKU10", "SKU9"]);
    }

    #[test]
    fn test_input_order_does_not_matter() {
        let ranker = PriorityRanker::default();
        let forward = ranker.rank(vec![scored("A", 50.0), scored("B", 50.0), scored("C", 20.0)]);
        let backward = ranker.rank(vec![scored("C", 20.0), scored("B", 50.0), scored("A", 50.0)]);
        assert_eq!(forward, backward);
    }

    #[test]
    fn test_min_level_filter() {
        let ranker = PriorityRanker::new(Some(PriorityLevel::High), None);
        let ranked = ranker.rank(vec![
            scored("A", 75.0), // CRITICAL
            scored("B", 55.0), // HIGH
            scored("C", 40.0), // MEDIUM
            scored("D", 10.0), // LOW
        ]);
        assert_eq!(skus(&ranked), vec!["A", "B"]);
    }

    #[test]
    fn test_limit_applies_after_filter_and_ranks_are_contiguous() {
        let ranker = PriorityRanker::new(Some(PriorityLevel::Medium), Some(2));
        let ranked = ranker.rank(vec![
            scored("A", 10.0),
            scored("B", 35.0),
            scored("C", 90.0),
            scored("D", 60.0),
        ]);
        assert_eq!(skus(&ranked), vec!["C", "D"]);
        assert_eq!(ranked[1].rank, 2);
    }

    #[test]
    fn test_empty_input() {
        assert!(PriorityRanker::default().rank(Vec::new()).is_empty());
    }
}
