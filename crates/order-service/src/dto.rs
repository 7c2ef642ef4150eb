//! 对外传输对象
//!
//! 与持久化实体逐字段对应的无损拷贝，使 API 层不直接暴露存储实体。
//! 字段名与 JSON 序列化结果和上游报文保持一致。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use order_shared::order::{Delivery, Item, Order, Payment};

/// 订单 DTO
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderDto {
    pub order_uid: String,
    pub track_number: String,
    pub entry: String,
    pub delivery: DeliveryDto,
    pub payment: PaymentDto,
    pub items: Vec<ItemDto>,
    pub locale: String,
    pub internal_signature: String,
    pub customer_id: String,
    pub delivery_service: String,
    pub shardkey: String,
    pub sm_id: i64,
    pub date_created: DateTime<Utc>,
    pub oof_shard: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryDto {
    pub name: String,
    pub phone: String,
    pub zip: String,
    pub city: String,
    pub address: String,
    pub region: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentDto {
    pub transaction: String,
    pub request_id: String,
    pub currency: String,
    pub provider: String,
    pub amount: i64,
    pub payment_dt: i64,
    pub bank: String,
    pub delivery_cost: i64,
    pub goods_total: i64,
    pub custom_fee: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemDto {
    pub chrt_id: i64,
    pub track_number: String,
    pub price: i64,
    pub rid: String,
    pub name: String,
    pub sale: i32,
    pub size: String,
    pub total_price: i64,
    pub nm_id: i64,
    pub brand: String,
    pub status: i32,
}

impl From<&Order> for OrderDto {
    fn from(order: &Order) -> Self {
        Self {
            order_uid: order.order_uid.clone(),
            track_number: order.track_number.clone(),
            entry: order.entry.clone(),
            delivery: DeliveryDto::from(&order.delivery),
            payment: PaymentDto::from(&order.payment),
            items: order.items.iter().map(ItemDto::from).collect(),
            locale: order.locale.clone(),
            internal_signature: order.internal_signature.clone(),
            customer_id: order.customer_id.clone(),
            delivery_service: order.delivery_service.clone(),
            shardkey: order.shardkey.clone(),
            sm_id: order.sm_id,
            date_created: order.date_created,
            oof_shard: order.oof_shard.clone(),
        }
    }
}

impl From<&Delivery> for DeliveryDto {
    fn from(delivery: &Delivery) -> Self {
        Self {
            name: delivery.name.clone(),
            phone: delivery.phone.clone(),
            zip: delivery.zip.clone(),
            city: delivery.city.clone(),
            address: delivery.address.clone(),
            region: delivery.region.clone(),
            email: delivery.email.clone(),
        }
    }
}

impl From<&Payment> for PaymentDto {
    fn from(payment: &Payment) -> Self {
        Self {
            transaction: payment.transaction.clone(),
            request_id: payment.request_id.clone(),
            currency: payment.currency.clone(),
            provider: payment.provider.clone(),
            amount: payment.amount,
            payment_dt: payment.payment_dt,
            bank: payment.bank.clone(),
            delivery_cost: payment.delivery_cost,
            goods_total: payment.goods_total,
            custom_fee: payment.custom_fee,
        }
    }
}

impl From<&Item> for ItemDto {
    fn from(item: &Item) -> Self {
        Self {
            chrt_id: item.chrt_id,
            track_number: item.track_number.clone(),
            price: item.price,
            rid: item.rid.clone(),
            name: item.name.clone(),
            sale: item.sale,
            size: item.size.clone(),
            total_price: item.total_price,
            nm_id: item.nm_id,
            brand: item.brand.clone(),
            status: item.status,
        }
    }
}
