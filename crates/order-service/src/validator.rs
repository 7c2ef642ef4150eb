//! 订单报文校验
//!
//! 报文进入持久化管道前的唯一门禁：逐项检查订单、配送、支付与每条商品
//! 明细的必填字段。校验失败的报文被永久跳过（记日志、提交 offset、不重投），
//! 存储层不再重复校验。
//!
//! 纯函数，无副作用，相同输入必然得到相同结果。

use order_shared::order::Order;
use thiserror::Error;

/// 校验错误
///
/// 按第一条命中的缺失字段报错；商品明细的错误携带明细下标，
/// 便于在日志里直接定位问题条目。
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("订单缺少必填字段: {0}")]
    MissingOrderField(&'static str),

    #[error("配送信息缺少必填字段: {0}")]
    MissingDeliveryField(&'static str),

    #[error("支付信息缺少必填字段: {0}")]
    MissingPaymentField(&'static str),

    #[error("订单商品明细为空")]
    EmptyItems,

    #[error("第 {index} 条商品明细缺少必填字段: {field}")]
    MissingItemField { index: usize, field: &'static str },
}

/// 校验一条订单报文
///
/// `internal_signature`、`request_id` 和折扣（`sale`）是可选字段，不检查；
/// `date_created` 在 JSON 解码阶段就已强制存在。
pub fn validate_order(order: &Order) -> Result<(), ValidationError> {
    let order_fields = [
        (order.order_uid.is_empty(), "order_uid"),
        (order.track_number.is_empty(), "track_number"),
        (order.entry.is_empty(), "entry"),
        (order.locale.is_empty(), "locale"),
        (order.customer_id.is_empty(), "customer_id"),
        (order.delivery_service.is_empty(), "delivery_service"),
        (order.shardkey.is_empty(), "shardkey"),
        (order.sm_id == 0, "sm_id"),
        (order.oof_shard.is_empty(), "oof_shard"),
    ];
    for (missing, field) in order_fields {
        if missing {
            return Err(ValidationError::MissingOrderField(field));
        }
    }

    let delivery = &order.delivery;
    let delivery_fields = [
        (delivery.name.is_empty(), "name"),
        (delivery.phone.is_empty(), "phone"),
        (delivery.zip.is_empty(), "zip"),
        (delivery.city.is_empty(), "city"),
        (delivery.address.is_empty(), "address"),
        (delivery.region.is_empty(), "region"),
        (delivery.email.is_empty(), "email"),
    ];
    for (missing, field) in delivery_fields {
        if missing {
            return Err(ValidationError::MissingDeliveryField(field));
        }
    }

    let payment = &order.payment;
    let payment_fields = [
        (payment.transaction.is_empty(), "transaction"),
        (payment.currency.is_empty(), "currency"),
        (payment.provider.is_empty(), "provider"),
        (payment.amount == 0, "amount"),
        (payment.payment_dt == 0, "payment_dt"),
        (payment.bank.is_empty(), "bank"),
    ];
    for (missing, field) in payment_fields {
        if missing {
            return Err(ValidationError::MissingPaymentField(field));
        }
    }

    if order.items.is_empty() {
        return Err(ValidationError::EmptyItems);
    }

    for (index, item) in order.items.iter().enumerate() {
        let item_fields = [
            (item.chrt_id == 0, "chrt_id"),
            (item.track_number.is_empty(), "track_number"),
            (item.price == 0, "price"),
            (item.rid.is_empty(), "rid"),
            (item.name.is_empty(), "name"),
            (item.size.is_empty(), "size"),
            (item.total_price == 0, "total_price"),
            (item.nm_id == 0, "nm_id"),
            (item.brand.is_empty(), "brand"),
            (item.status == 0, "status"),
        ];
        for (missing, field) in item_fields {
            if missing {
                return Err(ValidationError::MissingItemField { index, field });
            }
        }
    }

    Ok(())
}
