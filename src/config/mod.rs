// ==========================================
// SCM 推荐系统 - 配置层
// ==========================================
// 职责: 显式配置对象，替代散落的全局环境变量开关
// 存储: 环境变量 / .env 文件
// ==========================================

pub mod pipeline_config;

// 重导出核心配置
pub use pipeline_config::{
    config_keys, default_db_path, init_dotenv, ConfigError, LogFormat, PipelineConfig,
    ReportBackend, ReportConfig, DEFAULT_DB_FILE, DEFAULT_OUTPUT_PATH, DEFAULT_TABLE_NAME,
};
