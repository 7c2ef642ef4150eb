//! 统一错误处理模块
//!
//! 定义基础设施层共享的错误类型，使用 thiserror 提供良好的错误信息。
//! 各服务在此基础上定义自己的业务错误并透传本类型。

use thiserror::Error;

/// 基础设施错误类型
#[derive(Debug, Error)]
pub enum OrderError {
    #[error("数据库错误: {0}")]
    Database(#[from] sqlx::Error),

    #[error("数据库迁移失败: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Kafka 错误: {0}")]
    Kafka(String),

    #[error("报文解析失败: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("配置加载失败: {0}")]
    Config(String),

    #[error("内部错误: {0}")]
    Internal(String),
}

/// 错误结果类型别名
pub type Result<T> = std::result::Result<T, OrderError>;

impl OrderError {
    /// 是否为可重试错误
    ///
    /// Kafka 与数据库错误大多由瞬时故障引起，调用方可以选择重试；
    /// 解析与配置错误重试不会有不同结果。
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Database(_) | Self::Kafka(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = OrderError::Kafka("broker 不可达".to_string());
        assert_eq!(err.to_string(), "Kafka 错误: broker 不可达");

        let err = OrderError::Config("缺少 database.url".to_string());
        assert_eq!(err.to_string(), "配置加载失败: 缺少 database.url");
    }

    #[test]
    fn test_is_retryable() {
        let db_err = OrderError::Database(sqlx::Error::PoolTimedOut);
        assert!(db_err.is_retryable());

        let kafka_err = OrderError::Kafka("timeout".to_string());
        assert!(kafka_err.is_retryable());

        let decode_err: OrderError = serde_json::from_str::<serde_json::Value>("not json")
            .unwrap_err()
            .into();
        assert!(!decode_err.is_retryable());
    }
}
