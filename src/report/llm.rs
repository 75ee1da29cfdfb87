// ==========================================
// SCM 推荐系统 - OpenAI 兼容报告生成
// ==========================================
// 职责: 调用 {base_url}/chat/completions 生成报告
// 说明: 单次请求，不重试；api_key 为空时不带认证头（本地模型服务）
// ==========================================

use crate::config::ReportConfig;
use crate::domain::brief::RankedBrief;
use crate::report::generator::{ReportError, ReportGenerator};
use crate::report::prompt;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::{debug, info};

pub struct OpenAiCompatibleReportGenerator {
    client: Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
    temperature: f32,
}

impl OpenAiCompatibleReportGenerator {
    pub fn new(base_url: String, model: String, api_key: Option<String>, temperature: f32) -> Self {
        Self {
            client: Client::new(),
            base_url,
            model,
            api_key,
            temperature,
        }
    }

    pub fn from_config(config: &ReportConfig) -> Self {
        Self::new(
            config.base_url.clone(),
            config.model.clone(),
            config.api_key.clone(),
            config.temperature,
        )
    }

    pub fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }

    fn request_body(&self, brief: &RankedBrief) -> Result<Value, ReportError> {
        Ok(json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": prompt::system_prompt() },
                { "role": "user", "content": prompt::user_prompt(brief)? },
            ],
            "temperature": self.temperature,
        }))
    }
}

/// 从 chat/completions 响应中取出正文
pub fn extract_content(response: &Value) -> Result<String, ReportError> {
    let content = response["choices"][0]["message"]["content"]
        .as_str()
        .ok_or_else(|| {
            ReportError::MalformedResponse("缺少 choices[0].message.content".to_string())
        })?;

    let content = content.trim();
    if content.is_empty() {
        return Err(ReportError::EmptyResponse);
    }
    Ok(content.to_string())
}

#[async_trait]
impl ReportGenerator for OpenAiCompatibleReportGenerator {
    async fn generate(&self, brief: &RankedBrief) -> Result<String, ReportError> {
        let body = self.request_body(brief)?;
        let endpoint = self.endpoint();
        debug!(endpoint = %endpoint, model = %self.model, "发送报告生成请求");

        let mut request = self.client.post(&endpoint).json(&body);
        if let Some(ref key) = self.api_key {
            request = request.bearer_auth(key);
        }

        let res = request.send().await?;
        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(ReportError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let json: Value = res.json().await?;
        let content = extract_content(&json)?;
        info!(model = %self.model, chars = content.chars().count(), "报告生成完成");
        Ok(content)
    }

    fn name(&self) -> &str {
        "openai-compatible"
    }
}
