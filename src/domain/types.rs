// ==========================================
// SCM 推荐系统 - 领域类型定义
// ==========================================
// 职责: 优先级等级、跳过原因、流水线阶段等枚举
// 序列化格式: SCREAMING_SNAKE_CASE (与报告/导出一致)
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ==========================================
// 优先级等级 (Priority Level)
// ==========================================
// 顺序: Low < Medium < High < Critical
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PriorityLevel {
    Low,      // 低
    Medium,   // 中
    High,     // 高
    Critical, // 紧急
}

impl PriorityLevel {
    /// 由综合得分判定等级
    ///
    /// 阈值: >70 CRITICAL, >50 HIGH, >30 MEDIUM, 其余 LOW
    pub fn from_score(score: f64) -> Self {
        if score > 70.0 {
            PriorityLevel::Critical
        } else if score > 50.0 {
            PriorityLevel::High
        } else if score > 30.0 {
            PriorityLevel::Medium
        } else {
            PriorityLevel::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PriorityLevel::Low => "LOW",
            PriorityLevel::Medium => "MEDIUM",
            PriorityLevel::High => "HIGH",
            PriorityLevel::Critical => "CRITICAL",
        }
    }

    /// 全部等级（从高到低）
    pub fn all_desc() -> [PriorityLevel; 4] {
        [
            PriorityLevel::Critical,
            PriorityLevel::High,
            PriorityLevel::Medium,
            PriorityLevel::Low,
        ]
    }
}

impl fmt::Display for PriorityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for PriorityLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "LOW" => Ok(PriorityLevel::Low),
            "MEDIUM" => Ok(PriorityLevel::Medium),
            "HIGH" => Ok(PriorityLevel::High),
            "CRITICAL" => Ok(PriorityLevel::Critical),
            other => Err(format!("未知的优先级等级: {}", other)),
        }
    }
}

// ==========================================
// 单 SKU 失败类型 (SKU Error Kind)
// ==========================================
// 机器可读的跳过原因，随跳过清单一起返回给调用方
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SkuErrorKind {
    DivisionByZero, // 除零（库存或销量为 0）
    InvalidInput,   // 输入越界（负数/非有限值）
}

impl fmt::Display for SkuErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkuErrorKind::DivisionByZero => write!(f, "DIVISION_BY_ZERO"),
            SkuErrorKind::InvalidInput => write!(f, "INVALID_INPUT"),
        }
    }
}

// ==========================================
// 流水线阶段 (Pipeline Stage)
// ==========================================
// FETCHING → SCORING → RANKING → HANDOFF → DONE
// FAILED 只能由 FETCHING 进入
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PipelineStage {
    Fetching,
    Scoring,
    Ranking,
    Handoff,
    Done,
    Failed,
}

impl PipelineStage {
    /// 判断阶段转换是否合法
    pub fn can_transition_to(&self, next: PipelineStage) -> bool {
        use PipelineStage::*;

        matches!(
            (self, next),
            (Fetching, Scoring)
                | (Fetching, Failed)
                | (Scoring, Ranking)
                | (Ranking, Handoff)
                | (Handoff, Done)
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, PipelineStage::Done | PipelineStage::Failed)
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineStage::Fetching => write!(f, "FETCHING"),
            PipelineStage::Scoring => write!(f, "SCORING"),
            PipelineStage::Ranking => write!(f, "RANKING"),
            PipelineStage::Handoff => write!(f, "HANDOFF"),
            PipelineStage::Done => write!(f, "DONE"),
            PipelineStage::Failed => write!(f, "FAILED"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_thresholds() {
        assert_eq!(PriorityLevel::from_score(70.01), PriorityLevel::Critical);
        assert_eq!(PriorityLevel::from_score(70.0), PriorityLevel::High);
        assert_eq!(PriorityLevel::from_score(50.0), PriorityLevel::Medium);
        assert_eq!(PriorityLevel::from_score(30.01), PriorityLevel::Medium);
        assert_eq!(PriorityLevel::from_score(30.0), PriorityLevel::Low);
        assert_eq!(PriorityLevel::from_score(0.0), PriorityLevel::Low);
    }

    #[test]
    fn test_level_parse_and_order() {
        assert_eq!("critical".parse::<PriorityLevel>(), Ok(PriorityLevel::Critical));
        assert_eq!(" High ".parse::<PriorityLevel>(), Ok(PriorityLevel::High));
        assert!("URGENT".parse::<PriorityLevel>().is_err());
        assert!(PriorityLevel::Critical > PriorityLevel::High);
        assert!(PriorityLevel::Medium > PriorityLevel::Low);
    }

    #[test]
    fn test_stage_transitions() {
        use PipelineStage::*;

        assert!(Fetching.can_transition_to(Scoring));
        assert!(Fetching.can_transition_to(Failed));
        assert!(Handoff.can_transition_to(Done));
        // FAILED 只能由 FETCHING 进入
        assert!(!Scoring.can_transition_to(Failed));
        assert!(!Handoff.can_transition_to(Failed));
        assert!(!Scoring.can_transition_to(Handoff));
        assert!(!Done.can_transition_to(Fetching));
        assert!(Done.is_terminal());
        assert!(Failed.is_terminal());
    }

    #[test]
    fn test_error_kind_serialization() {
        let json = serde_json::to_string(&SkuErrorKind::DivisionByZero).unwrap();
        assert_eq!(json, "\"DIVISION_BY_ZERO\"");
        assert_eq!(SkuErrorKind::InvalidInput.to_string(), "INVALID_INPUT");
    }
}
