//! 订单摄取与查询服务入口
//!
//! 装配顺序：配置 -> 日志 -> 数据库（迁移 + 健康检查）-> 缓存预热 ->
//! 存储循环 -> Kafka 消费者 -> HTTP 服务。消费者与存储循环经容量为 1
//! 的 hand-off 通道衔接；ctrl-c 触发 watch 信号，消费者退出后发送端
//! 随之释放，存储循环见通道关闭自然结束。

use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::{mpsc, watch};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use order_service::api::{self, AppState};
use order_service::cache::OrderCache;
use order_service::consumer::OrderConsumer;
use order_service::repository::OrderRepository;
use order_service::service::OrderService;
use order_shared::{config::AppConfig, database::Database, observability};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load("order-service").unwrap_or_default();
    observability::init(&config.observability)?;

    info!("Starting order-service on {}", config.server_addr());

    // 数据库：建池、迁移、启动前健康检查
    let db = Database::connect(&config.database).await?;
    db.run_migrations().await?;
    db.health_check().await?;

    // 缓存注入仓储，构造时全量预热
    let cache = Arc::new(OrderCache::new());
    let repo = Arc::new(OrderRepository::new(db.pool().clone(), cache).await);
    let service = Arc::new(OrderService::new(repo));

    // hand-off 通道容量为 1：消费者在存储循环受理前阻塞，形成背压
    let (tx, rx) = mpsc::channel::<Vec<u8>>(1);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let consumer_shutdown = shutdown_rx;

    // 存储循环：不可恢复的写失败会终止它，摄取随之停止直到进程重启
    let store_service = service.clone();
    let store_handle = tokio::spawn(async move {
        if let Err(e) = store_service.store_orders(rx).await {
            error!(error = %e, "存储循环已终止，摄取停止，需重启进程恢复");
        }
    });

    // Kafka 消费者
    let consumer = OrderConsumer::new(&config.kafka, tx)?;
    let consumer_handle = tokio::spawn(async move {
        if let Err(e) = consumer.run(consumer_shutdown).await {
            error!(error = %e, "订单消费者退出");
        }
    });

    // HTTP：上游前端跨域访问，放开 CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = api::routes()
        .with_state(AppState::new(service))
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    let listener = TcpListener::bind(config.server_addr()).await?;
    info!("HTTP server listening on {}", config.server_addr());

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // HTTP 已停止，通知后台任务退出并等待收尾
    let _ = shutdown_tx.send(true);
    let _ = consumer_handle.await;
    let _ = store_handle.await;
    db.close().await;

    info!("order-service 已退出");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "监听退出信号失败");
        return;
    }
    info!("收到退出信号，开始优雅关闭");
}
