//! 测试工具模块
//!
//! 提供单元测试与集成测试共用的订单样例数据和内存版存储 Mock。
//! 样例与上游投递的真实报文结构逐字段对应。

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tokio::sync::mpsc;

use order_shared::order::{Delivery, Item, Order, Payment};

use crate::error::{Result, ServiceError};
use crate::repository::OrderStore;

/// 构造一条字段齐全、能通过校验的样例订单
pub fn sample_order() -> Order {
    sample_order_with_uid("b563feb7b2b84b6test")
}

/// 构造指定 `order_uid` 的样例订单
///
/// 集成测试里用不同的 uid 隔离用例，避免并行运行时互相污染。
pub fn sample_order_with_uid(order_uid: &str) -> Order {
    let date_created: DateTime<Utc> = "2021-11-26T06:22:19Z".parse().expect("合法的时间戳字面量");

    Order {
        order_uid: order_uid.to_string(),
        track_number: "WBILMTESTTRACK".to_string(),
        entry: "WBIL".to_string(),
        delivery: Delivery {
            name: "Test Testov".to_string(),
            phone: "+9720000000".to_string(),
            zip: "2639809".to_string(),
            city: "Kiryat Mozkin".to_string(),
            address: "Ploshad Mira 15".to_string(),
            region: "Kraiot".to_string(),
            email: "test@gmail.com".to_string(),
        },
        payment: Payment {
            transaction: order_uid.to_string(),
            request_id: String::new(),
            currency: "USD".to_string(),
            provider: "wbpay".to_string(),
            amount: 1817,
            payment_dt: 1_637_907_727,
            bank: "alpha".to_string(),
            delivery_cost: 1500,
            goods_total: 317,
            custom_fee: 0,
        },
        items: vec![Item {
            chrt_id: 9_934_930,
            track_number: "WBILMTESTTRACK".to_string(),
            price: 453,
            rid: "ab4219087a764ae0btest".to_string(),
            name: "Mascaras".to_string(),
            sale: 30,
            size: "0".to_string(),
            total_price: 317,
            nm_id: 2_389_212,
            brand: "Vivienne Sabo".to_string(),
            status: 202,
        }],
        locale: "en".to_string(),
        internal_signature: String::new(),
        customer_id: "test".to_string(),
        delivery_service: "meest".to_string(),
        shardkey: "9".to_string(),
        sm_id: 99,
        date_created,
        oof_shard: "1".to_string(),
    }
}

/// 样例订单的 JSON 报文字节，模拟 Kafka 负载
pub fn sample_order_payload(order_uid: &str) -> Vec<u8> {
    serde_json::to_vec(&sample_order_with_uid(order_uid)).expect("样例订单可序列化")
}

/// 内存版 OrderStore：无需数据库即可验证编排与 API 逻辑
///
/// 存储循环的行为与真实仓储一致——解码报文、按订单号整体替换；
/// `failing()` 构造的实例所有读取都返回内部错误，用于覆盖 500 路径。
#[derive(Default)]
pub struct InMemoryOrderStore {
    orders: DashMap<String, Arc<Order>>,
    fail_reads: bool,
}

impl InMemoryOrderStore {
    pub fn with_order(order: Order) -> Self {
        let store = Self::default();
        store
            .orders
            .insert(order.order_uid.clone(), Arc::new(order));
        store
    }

    pub fn failing() -> Self {
        Self {
            fail_reads: true,
            ..Self::default()
        }
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn get_order_by_id(&self, order_uid: &str) -> Result<Option<Arc<Order>>> {
        if self.fail_reads {
            return Err(ServiceError::Internal("storage unavailable".into()));
        }
        Ok(self.orders.get(order_uid).map(|entry| entry.clone()))
    }

    async fn store_orders(&self, mut rx: mpsc::Receiver<Vec<u8>>) -> Result<()> {
        while let Some(payload) = rx.recv().await {
            let order: Order = serde_json::from_slice(&payload)?;
            self.orders
                .insert(order.order_uid.clone(), Arc::new(order));
        }
        Ok(())
    }
}
