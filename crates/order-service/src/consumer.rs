//! Kafka 订单消费者
//!
//! 桥接 broker 与持久化管道：逐条解码并校验报文，通过 hand-off 通道
//! 移交给存储循环，通道受理之后才提交该条 offset。通道容量为 1，
//! `send` 会阻塞到存储循环腾出位置，持久化变慢时背压直接传导回消费
//! 进度，offset 的提交顺序与移交顺序一致。
//!
//! 注意：进入通道不等于已落库——落库在通道另一端异步发生。offset
//! 提交之后、事务提交之前进程崩溃会丢失该条消息（最多一次语义），
//! 这是当前架构的既定取舍。

use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use order_shared::config::KafkaConfig;
use order_shared::error::OrderError;
use order_shared::kafka::{ConsumerMessage, KafkaConsumer, topics};
use order_shared::order::Order;

use crate::validator::validate_order;

/// 订单消费者
///
/// 组合共享库的 KafkaConsumer（消息拉取与 offset 提交）和 hand-off
/// 通道发送端，消费组成员与分区分配由 broker 客户端负责。
pub struct OrderConsumer {
    consumer: KafkaConsumer,
    tx: mpsc::Sender<Vec<u8>>,
}

impl OrderConsumer {
    pub fn new(config: &KafkaConfig, tx: mpsc::Sender<Vec<u8>>) -> Result<Self, OrderError> {
        let consumer = KafkaConsumer::new(config)?;
        Ok(Self { consumer, tx })
    }

    /// 启动消费循环，直到收到 shutdown 信号
    ///
    /// 将通道发送端移入闭包，通过 KafkaConsumer::start 驱动循环。
    /// 单独抽取 handle_message 函数方便单元测试。
    pub async fn run(self, shutdown: watch::Receiver<bool>) -> Result<(), OrderError> {
        self.consumer.subscribe(&[topics::ORDER_MESSAGES])?;

        info!(topic = topics::ORDER_MESSAGES, "订单消费者已启动");

        let tx = self.tx;

        self.consumer
            .start(shutdown, |msg| {
                let tx = tx.clone();
                async move { handle_message(&tx, &msg).await }
            })
            .await;

        info!("订单消费者已停止");
        Ok(())
    }
}

/// 处理单条消息：解码 -> 校验 -> 移交存储循环
///
/// 返回 Ok 表示该条 offset 可以提交：解码或校验失败的报文属于永久
/// 跳过，同样返回 Ok（提交后不再重投）。只有通道关闭（存储循环已
/// 死亡）才返回 Err，此时 offset 不提交，报文留待进程重启后重新消费。
pub async fn handle_message(
    tx: &mpsc::Sender<Vec<u8>>,
    msg: &ConsumerMessage,
) -> Result<(), OrderError> {
    let order: Order = match msg.deserialize_payload() {
        Ok(order) => order,
        Err(e) => {
            warn!(
                partition = msg.partition,
                offset = msg.offset,
                error = %e,
                "报文解码失败，永久跳过"
            );
            return Ok(());
        }
    };

    if let Err(e) = validate_order(&order) {
        warn!(
            order_uid = %order.order_uid,
            offset = msg.offset,
            error = %e,
            "订单校验失败，永久跳过"
        );
        return Ok(());
    }

    // 移交原始字节而非解码后的实体，存储循环按同一报文再解码，
    // send 阻塞到接收方受理为止
    tx.send(msg.payload.clone())
        .await
        .map_err(|_| OrderError::Internal("hand-off 通道已关闭，存储循环不再接收".to_string()))?;

    debug!(
        order_uid = %order.order_uid,
        offset = msg.offset,
        "报文已移交存储循环"
    );

    Ok(())
}
