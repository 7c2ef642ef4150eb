//! 订单服务错误类型
//!
//! 在共享库 OrderError 基础上定义本服务特有的错误变体，并负责
//! 错误到 HTTP 状态码的映射。仓储与服务层的错误原样向上透传，
//! 在 API 层统一转换为响应。

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use order_shared::error::OrderError;

use crate::validator::ValidationError;

/// 订单服务错误
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// 查询的订单不存在（与内部错误严格区分，映射为 404）
    #[error("订单不存在: {0}")]
    OrderNotFound(String),

    /// 请求路径中没有订单号
    #[error("订单号不能为空")]
    MissingOrderId,

    /// 报文校验失败，消息被永久跳过
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// 报文解码失败
    #[error("报文解析失败: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("数据库错误: {0}")]
    Database(#[from] sqlx::Error),

    /// 透传共享库错误，避免在每个 match 分支手动转换
    #[error(transparent)]
    Shared(#[from] OrderError),

    #[error("内部错误: {0}")]
    Internal(String),
}

/// 服务层 Result 类型别名
pub type Result<T> = std::result::Result<T, ServiceError>;

impl ServiceError {
    /// 返回对应的 HTTP 状态码
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::OrderNotFound(_) => StatusCode::NOT_FOUND,
            Self::MissingOrderId | Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Decode(_) | Self::Database(_) | Self::Shared(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// 返回错误码（用于 API 响应）
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::OrderNotFound(_) => "ORDER_NOT_FOUND",
            Self::MissingOrderId => "ORDER_ID_REQUIRED",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Decode(_) => "DECODE_ERROR",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Shared(_) => "INTERNAL_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // 系统级错误只返回通用提示，详细信息仅记录日志，防止信息泄露
        let message = match &self {
            Self::Database(e) => {
                tracing::error!(error = %e, "数据库操作失败");
                "服务内部错误，请稍后重试".to_string()
            }
            Self::Decode(e) => {
                tracing::error!(error = %e, "报文解析失败");
                "服务内部错误，请稍后重试".to_string()
            }
            Self::Shared(e) => {
                tracing::error!(error = %e, "基础设施错误");
                "服务内部错误，请稍后重试".to_string()
            }
            Self::Internal(e) => {
                tracing::error!(error = %e, "内部错误");
                "服务内部错误，请稍后重试".to_string()
            }
            other => other.to_string(),
        };

        let body = json!({
            "success": false,
            "code": self.error_code(),
            "message": message,
        });

        (status, axum::Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 构造所有错误变体及其期望的 (StatusCode, error_code) 映射。
    /// 使用表驱动方式避免逐个变体写重复断言，新增变体时只需在一处维护。
    fn all_error_variants() -> Vec<(ServiceError, StatusCode, &'static str)> {
        vec![
            (
                ServiceError::OrderNotFound("o-001".into()),
                StatusCode::NOT_FOUND,
                "ORDER_NOT_FOUND",
            ),
            (
                ServiceError::MissingOrderId,
                StatusCode::BAD_REQUEST,
                "ORDER_ID_REQUIRED",
            ),
            (
                ServiceError::Validation(ValidationError::EmptyItems),
                StatusCode::BAD_REQUEST,
                "VALIDATION_ERROR",
            ),
            (
                ServiceError::Database(sqlx::Error::PoolTimedOut),
                StatusCode::INTERNAL_SERVER_ERROR,
                "DATABASE_ERROR",
            ),
            (
                ServiceError::Shared(OrderError::Kafka("broker down".into())),
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
            ),
            (
                ServiceError::Internal("unexpected state".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
            ),
        ]
    }

    #[test]
    fn test_status_codes_and_error_codes() {
        for (err, status, code) in all_error_variants() {
            assert_eq!(err.status_code(), status, "{err}");
            assert_eq!(err.error_code(), code, "{err}");
        }
    }

    #[test]
    fn test_not_found_is_distinguishable() {
        // 404 与 500 必须严格区分：调用方依赖 404 做条件跳转
        let not_found = ServiceError::OrderNotFound("o-001".into());
        let internal = ServiceError::Internal("boom".into());
        assert_ne!(not_found.status_code(), internal.status_code());
    }

    #[test]
    fn test_validation_error_message_passthrough() {
        let err = ServiceError::Validation(ValidationError::MissingItemField {
            index: 2,
            field: "rid",
        });
        assert_eq!(err.to_string(), "第 2 条商品明细缺少必填字段: rid");
    }
}
