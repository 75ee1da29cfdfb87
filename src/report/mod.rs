// ==========================================
// SCM 推荐系统 - 报告层
// ==========================================
// 职责: 报告生成接口、两种实现、结果导出
// ==========================================

pub mod export;
pub mod generator;
pub mod llm;
pub mod prompt;
pub mod template;

use crate::config::{ReportBackend, ReportConfig};
use std::sync::Arc;

pub use export::{write_brief_csv, write_brief_csv_to, write_report_text, write_skipped_json, ExportError};
pub use generator::{ReportError, ReportGenerator};
pub use llm::OpenAiCompatibleReportGenerator;
pub use template::TemplateReportGenerator;

/// 按配置构造报告生成方
pub fn build_generator(config: &ReportConfig) -> Arc<dyn ReportGenerator> {
    match config.backend {
        ReportBackend::Template => Arc::new(TemplateReportGenerator::new()),
        ReportBackend::Openai => Arc::new(OpenAiCompatibleReportGenerator::from_config(config)),
    }
}
