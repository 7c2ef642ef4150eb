//! 订单投递模拟器入口
//!
//! 在没有真实上游的环境里驱动摄取链路：接收 HTTP 提交的订单 JSON，
//! 原样发布到 Kafka 订单 topic。

use clap::Parser;
use tokio::net::TcpListener;
use tracing::info;

use order_shared::config::KafkaConfig;
use order_shared::kafka::KafkaProducer;

mod server;

/// 订单投递模拟器
///
/// 提供 `POST /produce` 端点，把请求体中的订单发布到 Kafka。
#[derive(Parser, Debug)]
#[command(name = "order-emulator")]
#[command(version, about = "订单系统投递模拟器")]
struct Cli {
    /// 日志级别 (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Kafka brokers 地址
    #[arg(long, default_value = "localhost:9092")]
    kafka_brokers: String,

    /// 服务端口
    #[arg(short, long, default_value = "1234")]
    port: u16,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // 优先使用环境变量 RUST_LOG，否则使用命令行参数指定的级别
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| cli.log_level.clone().into()),
        )
        .init();

    let kafka_config = KafkaConfig {
        brokers: cli.kafka_brokers,
        ..KafkaConfig::default()
    };
    let producer = KafkaProducer::new(&kafka_config)?;

    let state = server::EmulatorState { producer };
    let app = server::routes().with_state(state);

    let addr = format!("0.0.0.0:{}", cli.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("order-emulator listening on {addr}");

    axum::serve(listener, app).await?;

    Ok(())
}
