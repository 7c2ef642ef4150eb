//! 日志初始化模块
//!
//! 基于 tracing-subscriber 提供结构化日志。日志器不是全局单例的隐式依赖：
//! 由进程入口显式初始化一次，业务代码只通过 `tracing` 宏记录。

use anyhow::Result;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt,
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

use crate::config::ObservabilityConfig;

/// 初始化日志
///
/// 过滤级别优先取 `RUST_LOG` 环境变量，否则使用配置中的 `log_level`。
/// `log_format` 为 "json" 时输出结构化 JSON（采集友好），否则输出
/// 人类可读的 pretty 格式（本地开发友好）。
pub fn init(config: &ObservabilityConfig) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let fmt_layer = if config.log_format == "json" {
        fmt::layer()
            .json()
            .with_target(true)
            .with_thread_ids(true)
            .boxed()
    } else {
        fmt::layer()
            .with_target(true)
            .with_ansi(true)
            .boxed()
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_is_idempotent_failure() {
        // 同一进程内重复初始化会失败而非 panic，
        // 多个测试并发触发时只有第一次成功
        let config = ObservabilityConfig::default();
        let first = init(&config);
        let second = init(&config);
        assert!(first.is_ok() || second.is_err());
    }
}
