// ==========================================
// SCM 推荐系统 - 仓储层错误类型
// ==========================================
// 工具: thiserror 派生宏
// 说明: 仓储层错误对整次运行是致命的（不产出部分结果）
// ==========================================

use thiserror::Error;

/// 仓储层错误类型
#[derive(Error, Debug)]
pub enum RepositoryError {
    // ===== 查询约束 =====
    #[error("不支持的操作（数据集只读）: {0}")]
    UnsupportedOperation(String),

    #[error("非法表名: {0}")]
    InvalidTableName(String),

    // ===== 数据库错误 =====
    #[error("数据库连接失败: {0}")]
    DatabaseConnectionError(String),

    #[error("数据库查询失败: {0}")]
    DatabaseQueryError(String),

    // ===== 结构校验 =====
    #[error("查询结果缺少必需列: {column}")]
    MissingColumn { column: String },

    #[error("列类型不匹配 (column={column}, row={row}): {message}")]
    ColumnTypeMismatch {
        column: String,
        row: usize,
        message: String,
    },
}

impl RepositoryError {
    /// 是否属于查询类错误（相对于只读约束违反）
    pub fn is_query_error(&self) -> bool {
        !matches!(self, RepositoryError::UnsupportedOperation(_))
    }
}

// 实现 From<rusqlite::Error>
impl From<rusqlite::Error> for RepositoryError {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::SqliteFailure(code, msg) => match code.code {
                rusqlite::ErrorCode::CannotOpen
                | rusqlite::ErrorCode::NotADatabase
                | rusqlite::ErrorCode::PermissionDenied => RepositoryError::DatabaseConnectionError(
                    msg.unwrap_or_else(|| code.to_string()),
                ),
                rusqlite::ErrorCode::ReadOnly => RepositoryError::UnsupportedOperation(
                    msg.unwrap_or_else(|| code.to_string()),
                ),
                _ => RepositoryError::DatabaseQueryError(msg.unwrap_or_else(|| code.to_string())),
            },
            _ => RepositoryError::DatabaseQueryError(err.to_string()),
        }
    }
}

/// Result 类型别名
pub type RepositoryResult<T> = Result<T, RepositoryError>;
