//! 订单应用服务
//!
//! 纯编排层：把仓储返回的实体转换为对外 DTO，错误原样向上透传，
//! "未找到"以 `None` 表达而非错误。不包含任何业务规则。

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{error, info};

use crate::dto::OrderDto;
use crate::error::Result;
use crate::repository::OrderStore;

/// 订单应用服务
///
/// 依赖 `OrderStore` trait object 而非具体仓储：服务会被 HTTP 状态
/// 和后台任务共同持有，trait object 避免了泛型传播到整个调用链。
pub struct OrderService {
    store: Arc<dyn OrderStore>,
}

impl OrderService {
    pub fn new(store: Arc<dyn OrderStore>) -> Self {
        Self { store }
    }

    /// 按订单号查询并转换为对外 DTO；未找到返回 `None`
    pub async fn get_order_by_id(&self, order_uid: &str) -> Result<Option<OrderDto>> {
        let Some(order) = self.store.get_order_by_id(order_uid).await? else {
            return Ok(None);
        };
        Ok(Some(OrderDto::from(order.as_ref())))
    }

    /// 把原始报文流转交给仓储的存储循环，并记录最终结果
    ///
    /// 正常返回意味着 hand-off 通道已关闭（消费者退出）；
    /// 返回错误意味着存储循环因不可恢复的写失败终止，摄取停止。
    pub async fn store_orders(&self, rx: mpsc::Receiver<Vec<u8>>) -> Result<()> {
        if let Err(e) = self.store.store_orders(rx).await {
            error!(error = %e, "存储循环异常终止");
            return Err(e);
        }

        info!("存储循环正常结束");
        Ok(())
    }
}
