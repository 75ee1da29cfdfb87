// ==========================================
// SCM 推荐系统 - 报告生成接口
// ==========================================
// 职责: 定义报告生成 trait，流水线只依赖此接口
// 说明: 生成方的延迟与失败模式对流水线不透明，流水线不代为重试
// ==========================================

use crate::domain::brief::RankedBrief;
use async_trait::async_trait;
use thiserror::Error;

/// 报告生成错误
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("报告服务请求失败: {0}")]
    Http(#[from] reqwest::Error),

    #[error("报告服务返回错误状态: status={status}, body={body}")]
    Status { status: u16, body: String },

    #[error("报告服务响应格式错误: {0}")]
    MalformedResponse(String),

    #[error("报告服务返回空内容")]
    EmptyResponse,

    #[error("简报序列化失败: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("报告生成失败: {0}")]
    Generator(String),
}

// ==========================================
// ReportGenerator Trait
// ==========================================
/// 报告生成方
///
/// 实现者:
/// - TemplateReportGenerator: 本地模板，离线且确定
/// - OpenAiCompatibleReportGenerator: OpenAI 兼容 chat/completions 接口
#[async_trait]
pub trait ReportGenerator: Send + Sync {
    /// 由排序简报生成报告文本
    async fn generate(&self, brief: &RankedBrief) -> Result<String, ReportError>;

    /// 生成方名称（用于日志）
    fn name(&self) -> &str;
}
