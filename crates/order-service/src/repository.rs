//! 订单仓储（cache-aside）
//!
//! 持有 Postgres 连接池与注入的进程内缓存，实现两条路径：
//! - 读路径：缓存命中直接返回；未命中则在一个读事务内按
//!   orders -> delivery -> payment -> items 的顺序合并四张表的查询结果，
//!   成功后回填缓存再返回。
//! - 写路径（存储循环）：排空 hand-off 通道，每条报文在单个事务内写入
//!   四张表，提交后先更新缓存再处理下一条。任一语句失败即回滚。
//!
//! 订单号重复的写入会被跳过而非终止循环：orders 主键冲突说明该订单
//! 已经落库，重放不应拖垮整条摄取链路。其余写错误仍然终止循环并向
//! 上抛出，通道里排队的报文随之丢弃，直到进程重启才恢复摄取。

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use order_shared::order::{Delivery, Item, Order, Payment};

use crate::cache::OrderCache;
use crate::error::{Result, ServiceError};

/// 订单存取的抽象接口
///
/// 服务层依赖此 trait 而非具体仓储，测试中可以注入内存实现。
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// 按订单号查询，未找到返回 `None`（与错误严格区分）
    async fn get_order_by_id(&self, order_uid: &str) -> Result<Option<Arc<Order>>>;

    /// 排空原始报文通道并持续落库，直到通道关闭或出现不可恢复错误
    async fn store_orders(&self, rx: mpsc::Receiver<Vec<u8>>) -> Result<()>;
}

/// orders 表的标量行，与 delivery/payment/items 的查询结果组装成完整订单
#[derive(sqlx::FromRow)]
struct OrderRow {
    order_uid: String,
    track_number: String,
    entry: String,
    locale: String,
    internal_signature: String,
    customer_id: String,
    delivery_service: String,
    shardkey: String,
    sm_id: i64,
    date_created: DateTime<Utc>,
    oof_shard: String,
}

impl OrderRow {
    fn into_order(self, delivery: Delivery, payment: Payment, items: Vec<Item>) -> Order {
        Order {
            order_uid: self.order_uid,
            track_number: self.track_number,
            entry: self.entry,
            delivery,
            payment,
            items,
            locale: self.locale,
            internal_signature: self.internal_signature,
            customer_id: self.customer_id,
            delivery_service: self.delivery_service,
            shardkey: self.shardkey,
            sm_id: self.sm_id,
            date_created: self.date_created,
            oof_shard: self.oof_shard,
        }
    }
}

/// 订单仓储
pub struct OrderRepository {
    pool: PgPool,
    cache: Arc<OrderCache>,
}

impl OrderRepository {
    /// 创建仓储并预热缓存
    ///
    /// 把库中已有的订单全量加载进缓存；单个订单的加载失败只记日志跳过，
    /// 对应条目在缓存中缺席，首次点查时再按 cache-aside 回源。
    pub async fn new(pool: PgPool, cache: Arc<OrderCache>) -> Self {
        let repo = Self { pool, cache };
        repo.warm_cache().await;
        repo
    }

    async fn warm_cache(&self) {
        let uids: Vec<String> = match sqlx::query_scalar("SELECT order_uid FROM orders")
            .fetch_all(&self.pool)
            .await
        {
            Ok(uids) => uids,
            Err(e) => {
                error!(error = %e, "预热缓存失败：无法读取订单号列表");
                return;
            }
        };

        for uid in uids {
            match self.load_order(&uid).await {
                Ok(Some(order)) => {
                    self.cache.insert(order);
                }
                Ok(None) => {
                    warn!(order_uid = %uid, "预热时订单数据不完整，跳过");
                }
                Err(e) => {
                    error!(order_uid = %uid, error = %e, "预热时加载订单失败，跳过");
                }
            }
        }

        info!(count = self.cache.len(), "订单缓存预热完成");
    }

    /// 在一个读事务内合并四张表的查询结果
    ///
    /// orders 行缺失返回 `None`；delivery 或 payment 行缺失同样返回
    /// `None`，但这属于数据完整性破损（孤儿订单）而非订单不存在，
    /// 以 warn 级日志与前者区分。
    async fn load_order(&self, order_uid: &str) -> Result<Option<Order>> {
        let mut tx = self.pool.begin().await?;

        let Some(row) = sqlx::query_as::<_, OrderRow>(
            r#"
            SELECT order_uid, track_number, entry, locale, internal_signature,
                   customer_id, delivery_service, shardkey, sm_id, date_created, oof_shard
            FROM orders
            WHERE order_uid = $1
            "#,
        )
        .bind(order_uid)
        .fetch_optional(&mut *tx)
        .await?
        else {
            return Ok(None);
        };

        let Some(delivery) = sqlx::query_as::<_, Delivery>(
            r#"
            SELECT name, phone, zip, city, address, region, email
            FROM delivery
            WHERE order_uid = $1
            "#,
        )
        .bind(order_uid)
        .fetch_optional(&mut *tx)
        .await?
        else {
            warn!(order_uid, "订单缺少配送信息行，按未找到处理");
            return Ok(None);
        };

        let Some(payment) = sqlx::query_as::<_, Payment>(
            r#"
            SELECT transaction, request_id, currency, provider, amount, payment_dt,
                   bank, delivery_cost, goods_total, custom_fee
            FROM payment
            WHERE order_uid = $1
            "#,
        )
        .bind(order_uid)
        .fetch_optional(&mut *tx)
        .await?
        else {
            warn!(order_uid, "订单缺少支付信息行，按未找到处理");
            return Ok(None);
        };

        let items = sqlx::query_as::<_, Item>(
            r#"
            SELECT chrt_id, track_number, price, rid, name, sale, size,
                   total_price, nm_id, brand, status
            FROM items
            WHERE order_uid = $1
            "#,
        )
        .bind(order_uid)
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(Some(row.into_order(delivery, payment, items)))
    }

    /// 单个事务写入四张表
    async fn insert_order(&self, order: &Order) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO orders (order_uid, track_number, entry, locale, internal_signature,
                                customer_id, delivery_service, shardkey, sm_id, date_created, oof_shard)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(&order.order_uid)
        .bind(&order.track_number)
        .bind(&order.entry)
        .bind(&order.locale)
        .bind(&order.internal_signature)
        .bind(&order.customer_id)
        .bind(&order.delivery_service)
        .bind(&order.shardkey)
        .bind(order.sm_id)
        .bind(order.date_created)
        .bind(&order.oof_shard)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO delivery (order_uid, name, phone, zip, city, address, region, email)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(&order.order_uid)
        .bind(&order.delivery.name)
        .bind(&order.delivery.phone)
        .bind(&order.delivery.zip)
        .bind(&order.delivery.city)
        .bind(&order.delivery.address)
        .bind(&order.delivery.region)
        .bind(&order.delivery.email)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO payment (order_uid, transaction, request_id, currency, provider,
                                 amount, payment_dt, bank, delivery_cost, goods_total, custom_fee)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(&order.order_uid)
        .bind(&order.payment.transaction)
        .bind(&order.payment.request_id)
        .bind(&order.payment.currency)
        .bind(&order.payment.provider)
        .bind(order.payment.amount)
        .bind(order.payment.payment_dt)
        .bind(&order.payment.bank)
        .bind(order.payment.delivery_cost)
        .bind(order.payment.goods_total)
        .bind(order.payment.custom_fee)
        .execute(&mut *tx)
        .await?;

        for item in &order.items {
            sqlx::query(
                r#"
                INSERT INTO items (order_uid, chrt_id, track_number, price, rid, name,
                                   sale, size, total_price, nm_id, brand, status)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
                "#,
            )
            .bind(&order.order_uid)
            .bind(item.chrt_id)
            .bind(&item.track_number)
            .bind(item.price)
            .bind(&item.rid)
            .bind(&item.name)
            .bind(item.sale)
            .bind(&item.size)
            .bind(item.total_price)
            .bind(item.nm_id)
            .bind(&item.brand)
            .bind(item.status)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(())
    }
}

#[async_trait]
impl OrderStore for OrderRepository {
    async fn get_order_by_id(&self, order_uid: &str) -> Result<Option<Arc<Order>>> {
        if let Some(order) = self.cache.get(order_uid) {
            debug!(order_uid, "缓存命中");
            return Ok(Some(order));
        }

        match self.load_order(order_uid).await? {
            Some(order) => {
                info!(order_uid, "订单已从数据库加载并回填缓存");
                Ok(Some(self.cache.insert(order)))
            }
            None => {
                warn!(order_uid, "订单不存在");
                Ok(None)
            }
        }
    }

    async fn store_orders(&self, mut rx: mpsc::Receiver<Vec<u8>>) -> Result<()> {
        while let Some(payload) = rx.recv().await {
            // 报文在消费侧已通过校验；这里解码失败说明管道被污染，终止循环
            let order: Order = serde_json::from_slice(&payload)?;

            match self.insert_order(&order).await {
                Ok(()) => {
                    let order_uid = order.order_uid.clone();
                    self.cache.insert(order);
                    info!(order_uid = %order_uid, "订单已落库并更新缓存");
                }
                Err(ServiceError::Database(e)) if is_unique_violation(&e) => {
                    warn!(order_uid = %order.order_uid, "订单号重复，跳过该报文");
                    continue;
                }
                Err(e) => {
                    error!(order_uid = %order.order_uid, error = %e, "订单写入失败，存储循环终止");
                    return Err(e);
                }
            }
        }

        info!("hand-off 通道已关闭，存储循环退出");
        Ok(())
    }
}

/// 判断数据库错误是否为唯一约束冲突（orders 主键重复）
fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.is_unique_violation())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::sample_order;

    #[test]
    fn test_order_row_composition_is_lossless() {
        let expected = sample_order();

        let row = OrderRow {
            order_uid: expected.order_uid.clone(),
            track_number: expected.track_number.clone(),
            entry: expected.entry.clone(),
            locale: expected.locale.clone(),
            internal_signature: expected.internal_signature.clone(),
            customer_id: expected.customer_id.clone(),
            delivery_service: expected.delivery_service.clone(),
            shardkey: expected.shardkey.clone(),
            sm_id: expected.sm_id,
            date_created: expected.date_created,
            oof_shard: expected.oof_shard.clone(),
        };

        let composed = row.into_order(
            expected.delivery.clone(),
            expected.payment.clone(),
            expected.items.clone(),
        );

        assert_eq!(composed, expected);
    }

    #[test]
    fn test_non_database_error_is_not_unique_violation() {
        assert!(!is_unique_violation(&sqlx::Error::PoolTimedOut));
        assert!(!is_unique_violation(&sqlx::Error::RowNotFound));
    }
}
