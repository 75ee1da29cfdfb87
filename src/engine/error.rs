// ==========================================
// SCM 推荐系统 - 引擎层错误类型
// ==========================================
// 说明: 单 SKU 计算失败，不中断整批
// ==========================================

use crate::domain::types::SkuErrorKind;
use thiserror::Error;

/// 单 SKU 计算错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SkuError {
    #[error("除零: {field} 为 0")]
    DivisionByZero { field: &'static str },

    #[error("输入无效 (field={field}, value={value}): {message}")]
    InvalidInput {
        field: &'static str,
        value: String,
        message: String,
    },
}

impl SkuError {
    pub(crate) fn invalid(field: &'static str, value: impl ToString, message: &str) -> Self {
        SkuError::InvalidInput {
            field,
            value: value.to_string(),
            message: message.to_string(),
        }
    }

    /// 机器可读的错误类型
    pub fn kind(&self) -> SkuErrorKind {
        match self {
            SkuError::DivisionByZero { .. } => SkuErrorKind::DivisionByZero,
            SkuError::InvalidInput { .. } => SkuErrorKind::InvalidInput,
        }
    }
}
