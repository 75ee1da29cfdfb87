// ==========================================
// SCM 推荐系统 - 流水线配置
// ==========================================
// 职责: 显式配置对象，构造编排器时传入
// 来源: 环境变量（可选 .env 文件），命令行参数可再覆写
// ==========================================

use crate::domain::types::PriorityLevel;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

// .env 只加载一次，文件不存在时忽略
static DOTENV_LOADED: Lazy<()> = Lazy::new(|| {
    let _ = dotenvy::dotenv();
});

/// 强制提前加载 .env
pub fn init_dotenv() {
    Lazy::force(&DOTENV_LOADED);
}

// ==========================================
// 配置键
// ==========================================
pub mod config_keys {
    pub const DB_PATH: &str = "SCM_RECOMMENDER_DB_PATH";
    pub const TABLE: &str = "SCM_RECOMMENDER_TABLE";
    pub const BUSY_TIMEOUT_MS: &str = "SCM_RECOMMENDER_BUSY_TIMEOUT_MS";
    pub const PARALLEL: &str = "SCM_RECOMMENDER_PARALLEL";
    pub const WORKERS: &str = "SCM_RECOMMENDER_WORKERS";
    pub const BRIEF_LIMIT: &str = "SCM_RECOMMENDER_BRIEF_LIMIT";
    pub const MIN_LEVEL: &str = "SCM_RECOMMENDER_MIN_LEVEL";
    pub const TELEMETRY: &str = "SCM_RECOMMENDER_TELEMETRY";
    pub const SQL_PROFILE: &str = "SCM_RECOMMENDER_SQL_PROFILE";
    pub const SLOW_SQL_MS: &str = "SCM_RECOMMENDER_SLOW_SQL_MS";
    pub const LOG_FORMAT: &str = "SCM_RECOMMENDER_LOG_FORMAT";
    pub const REPORT_BACKEND: &str = "SCM_RECOMMENDER_REPORT_BACKEND";
    pub const LLM_BASE_URL: &str = "SCM_RECOMMENDER_LLM_BASE_URL";
    pub const LLM_MODEL: &str = "SCM_RECOMMENDER_LLM_MODEL";
    pub const LLM_API_KEY: &str = "OPENAI_API_KEY";
    pub const LLM_TEMPERATURE: &str = "SCM_RECOMMENDER_LLM_TEMPERATURE";
    pub const SENTENCES: &str = "SCM_RECOMMENDER_SENTENCES";
    pub const OUTPUT: &str = "SCM_RECOMMENDER_OUTPUT";
}

pub const DEFAULT_TABLE_NAME: &str = "supply_chain_data";
pub const DEFAULT_DB_FILE: &str = "supply_chain_dataset.sqlite";
pub const DEFAULT_OUTPUT_PATH: &str = "recommender.txt";

/// 配置错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("配置值格式错误 (key: {key}, value: {value}): {message}")]
    InvalidValue {
        key: String,
        value: String,
        message: String,
    },
}

// ==========================================
// 枚举型配置
// ==========================================

/// 日志输出格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// 报告生成后端
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportBackend {
    /// 本地模板（离线、确定性）
    #[default]
    Template,
    /// OpenAI 兼容的 chat/completions 接口
    Openai,
}

// ==========================================
// ReportConfig - 报告生成配置
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportConfig {
    pub backend: ReportBackend,
    pub base_url: String,
    pub model: String,
    /// 不参与序列化，避免密钥落盘
    #[serde(skip)]
    pub api_key: Option<String>,
    pub temperature: f32,
    /// 叙述段落句数提示 (1..=10)
    pub narrative_sentences: u8,
    pub output_path: PathBuf,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            backend: ReportBackend::Template,
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key: None,
            temperature: 0.7,
            narrative_sentences: 5,
            output_path: PathBuf::from(DEFAULT_OUTPUT_PATH),
        }
    }
}

// ==========================================
// PipelineConfig - 流水线配置
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// 数据集文件路径
    pub db_path: String,
    /// SKU 表名
    pub table_name: String,
    pub busy_timeout_ms: u64,

    /// 是否并行评分
    pub parallel_scoring: bool,
    /// 专用线程池大小（None 使用 rayon 全局池）
    pub worker_threads: Option<usize>,

    /// 简报最多保留条数（Top N）
    pub brief_limit: Option<usize>,
    /// 简报最低等级
    pub min_priority_level: Option<PriorityLevel>,

    /// 是否输出运行汇总遥测事件
    pub telemetry_enabled: bool,
    /// 是否开启 SQL 计数/慢查询日志
    pub sql_profile: bool,
    pub slow_sql_ms: u64,
    pub log_format: LogFormat,

    pub report: ReportConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            table_name: DEFAULT_TABLE_NAME.to_string(),
            busy_timeout_ms: crate::db::DEFAULT_BUSY_TIMEOUT_MS,
            parallel_scoring: true,
            worker_threads: None,
            brief_limit: None,
            min_priority_level: None,
            telemetry_enabled: false,
            sql_profile: false,
            slow_sql_ms: 200,
            log_format: LogFormat::Pretty,
            report: ReportConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// 从进程环境变量加载（先加载 .env）
    pub fn from_env() -> Result<Self, ConfigError> {
        init_dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 从任意键值来源加载，未设置的键使用默认值
    ///
    /// # 参数
    /// - lookup: 键 → 值（None 表示未设置）
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        use config_keys as k;

        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let mut config = Self::default();

        if let Some(v) = get(k::DB_PATH) {
            config.db_path = v;
        }
        if let Some(v) = get(k::TABLE) {
            config.table_name = v;
        }
        if let Some(v) = get(k::BUSY_TIMEOUT_MS) {
            config.busy_timeout_ms = parse_number(k::BUSY_TIMEOUT_MS, &v)?;
        }
        if let Some(v) = get(k::PARALLEL) {
            config.parallel_scoring = parse_bool(k::PARALLEL, &v)?;
        }
        if let Some(v) = get(k::WORKERS) {
            let n: usize = parse_number(k::WORKERS, &v)?;
            if n == 0 {
                return Err(invalid(k::WORKERS, &v, "线程数必须大于 0"));
            }
            config.worker_threads = Some(n);
        }
        if let Some(v) = get(k::BRIEF_LIMIT) {
            config.brief_limit = Some(parse_number(k::BRIEF_LIMIT, &v)?);
        }
        if let Some(v) = get(k::MIN_LEVEL) {
            let level = v
                .parse::<PriorityLevel>()
                .map_err(|e| invalid(k::MIN_LEVEL, &v, &e))?;
            config.min_priority_level = Some(level);
        }
        if let Some(v) = get(k::TELEMETRY) {
            config.telemetry_enabled = parse_bool(k::TELEMETRY, &v)?;
        }
        if let Some(v) = get(k::SQL_PROFILE) {
            config.sql_profile = parse_bool(k::SQL_PROFILE, &v)?;
        }
        if let Some(v) = get(k::SLOW_SQL_MS) {
            config.slow_sql_ms = parse_number(k::SLOW_SQL_MS, &v)?;
        }
        if let Some(v) = get(k::LOG_FORMAT) {
            config.log_format = match v.to_lowercase().as_str() {
                "pretty" | "text" => LogFormat::Pretty,
                "json" => LogFormat::Json,
                _ => return Err(invalid(k::LOG_FORMAT, &v, "仅支持 pretty/json")),
            };
        }

        // ===== 报告生成 =====
        if let Some(v) = get(k::REPORT_BACKEND) {
            config.report.backend = match v.to_lowercase().as_str() {
                "template" => ReportBackend::Template,
                "openai" | "llm" => ReportBackend::Openai,
                _ => return Err(invalid(k::REPORT_BACKEND, &v, "仅支持 template/openai")),
            };
        }
        if let Some(v) = get(k::LLM_BASE_URL) {
            config.report.base_url = v;
        }
        if let Some(v) = get(k::LLM_MODEL) {
            config.report.model = v;
        }
        config.report.api_key = get(k::LLM_API_KEY);
        if let Some(v) = get(k::LLM_TEMPERATURE) {
            config.report.temperature = parse_number(k::LLM_TEMPERATURE, &v)?;
        }
        if let Some(v) = get(k::SENTENCES) {
            let n: u8 = parse_number(k::SENTENCES, &v)?;
            if !(1..=10).contains(&n) {
                return Err(invalid(k::SENTENCES, &v, "句数范围为 1..=10"));
            }
            config.report.narrative_sentences = n;
        }
        if let Some(v) = get(k::OUTPUT) {
            config.report.output_path = PathBuf::from(v);
        }

        Ok(config)
    }
}

/// 默认数据集路径
///
/// 优先使用工作目录下的 `data/supply_chain_dataset.sqlite`，
/// 不存在时回退到用户数据目录。
pub fn default_db_path() -> String {
    let local = PathBuf::from("data").join(DEFAULT_DB_FILE);
    if local.exists() {
        return local.to_string_lossy().into_owned();
    }

    match dirs::data_dir() {
        Some(dir) => dir
            .join("scm-recommender")
            .join(DEFAULT_DB_FILE)
            .to_string_lossy()
            .into_owned(),
        None => local.to_string_lossy().into_owned(),
    }
}

fn invalid(key: &str, value: &str, message: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
        message: message.to_string(),
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.to_lowercase().as_str() {
        "1" | "true" | "yes" | "y" | "on" => Ok(true),
        "0" | "false" | "no" | "n" | "off" => Ok(false),
        _ => Err(invalid(key, value, "期望布尔值")),
    }
}

fn parse_number<T>(key: &str, value: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value
        .parse::<T>()
        .map_err(|e| invalid(key, value, &e.to_string()))
}
