// ==========================================
// SCM 推荐系统 - 报告提示词
// ==========================================
// 职责: 将排序简报转为 chat/completions 的 system/user 消息
// ==========================================

use crate::domain::brief::RankedBrief;
use crate::report::generator::ReportError;

const SYSTEM_PROMPT: &str = "You are a supply chain business advisor. \
You receive a ranked inventory brief computed by a deterministic analytics pipeline. \
Do not recompute or contradict the numbers in the brief. \
Write a concise, actionable inventory management report for operations managers.";

pub fn system_prompt() -> String {
    SYSTEM_PROMPT.to_string()
}

/// 构造 user 消息
///
/// 简报以 JSON 原样嵌入，等级与得分由流水线决定
pub fn user_prompt(brief: &RankedBrief) -> Result<String, ReportError> {
    let payload = serde_json::to_string_pretty(brief)?;
    let sentences = brief.narrative_sentences.max(1);

    Ok(format!(
        "Ranked brief (run_id={run_id}, {included} of {scored} scored SKUs included, {skipped} skipped):\n\
         ```json\n{payload}\n```\n\n\
         Write the report with these sections:\n\
         1. Executive summary in at most {sentences} sentences.\n\
         2. Restocking actions for CRITICAL and HIGH SKUs, highest score first.\n\
         3. Risks from long lead times or stock below the reorder point.\n\
         4. Data quality notes for every skipped SKU with its error kind.",
        run_id = brief.run_id,
        included = brief.summary.included,
        scored = brief.summary.scored,
        skipped = brief.summary.skipped,
        payload = payload,
        sentences = sentences,
    ))
}
