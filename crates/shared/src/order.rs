//! 订单数据模型
//!
//! 定义 Kafka 报文与数据库持久化共用的订单聚合结构，字段命名与上游投递的
//! JSON 报文保持一致。订单是根聚合：固定包含一份配送信息（delivery）、
//! 一份支付信息（payment）和至少一条商品明细（items）。
//!
//! 实体一经构造即不可变；同一 `order_uid` 的再次写入只会整体替换，
//! 不存在字段级更新。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 订单聚合根
///
/// 通过 `order_uid` 全局唯一标识。`internal_signature` 上游可能不携带，
/// 不参与任何校验。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub order_uid: String,
    pub track_number: String,
    pub entry: String,
    pub delivery: Delivery,
    pub payment: Payment,
    pub items: Vec<Item>,
    pub locale: String,
    #[serde(default)]
    pub internal_signature: String,
    pub customer_id: String,
    pub delivery_service: String,
    pub shardkey: String,
    pub sm_id: i64,
    pub date_created: DateTime<Utc>,
    pub oof_shard: String,
}

/// 配送信息：收件人联系方式与地址，全部字段必填
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Delivery {
    pub name: String,
    pub phone: String,
    pub zip: String,
    pub city: String,
    pub address: String,
    pub region: String,
    pub email: String,
}

/// 支付信息
///
/// `request_id` 为可选字段；`amount` 与 `payment_dt` 必须非零。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Payment {
    pub transaction: String,
    #[serde(default)]
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

/// 商品明细
///
/// 除折扣（`sale`）外所有字段必填。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Item {
    pub chrt_id: i64,
    pub track_number: String,
    pub price: i64,
    pub rid: String,
    pub name: String,
    #[serde(default)]
    pub sale: i32,
    pub size: String,
    pub total_price: i64,
    pub nm_id: i64,
    pub brand: String,
    pub status: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_JSON: &str = r#"{
        "order_uid": "b563feb7b2b84b6test",
        "track_number": "WBILMTESTTRACK",
        "entry": "WBIL",
        "delivery": {
            "name": "Test Testov",
            "phone": "+9720000000",
            "zip": "2639809",
            "city": "Kiryat Mozkin",
            "address": "Ploshad Mira 15",
            "region": "Kraiot",
            "email": "test@gmail.com"
        },
        "payment": {
            "transaction": "b563feb7b2b84b6test",
            "request_id": "",
            "currency": "USD",
            "provider": "wbpay",
            "amount": 1817,
            "payment_dt": 1637907727,
            "bank": "alpha",
            "delivery_cost": 1500,
            "goods_total": 317,
            "custom_fee": 0
        },
        "items": [
            {
                "chrt_id": 9934930,
                "track_number": "WBILMTESTTRACK",
                "price": 453,
                "rid": "ab4219087a764ae0btest",
                "name": "Mascaras",
                "sale": 30,
                "size": "0",
                "total_price": 317,
                "nm_id": 2389212,
                "brand": "Vivienne Sabo",
                "status": 202
            }
        ],
        "locale": "en",
        "internal_signature": "",
        "customer_id": "test",
        "delivery_service": "meest",
        "shardkey": "9",
        "sm_id": 99,
        "date_created": "2021-11-26T06:22:19Z",
        "oof_shard": "1"
    }"#;

    #[test]
    fn test_decode_sample_payload() {
        let order: Order = serde_json::from_str(SAMPLE_JSON).unwrap();

        assert_eq!(order.order_uid, "b563feb7b2b84b6test");
        assert_eq!(order.delivery.city, "Kiryat Mozkin");
        assert_eq!(order.payment.amount, 1817);
        assert_eq!(order.items.len(), 1);
        assert_eq!(order.items[0].chrt_id, 9934930);
        assert_eq!(order.sm_id, 99);
    }

    #[test]
    fn test_optional_fields_default() {
        // internal_signature / request_id / sale 缺失时取默认值而非解码失败
        let mut value: serde_json::Value = serde_json::from_str(SAMPLE_JSON).unwrap();
        value.as_object_mut().unwrap().remove("internal_signature");
        value["payment"].as_object_mut().unwrap().remove("request_id");
        value["items"][0].as_object_mut().unwrap().remove("sale");

        let order: Order = serde_json::from_value(value).unwrap();
        assert_eq!(order.internal_signature, "");
        assert_eq!(order.payment.request_id, "");
        assert_eq!(order.items[0].sale, 0);
    }

    #[test]
    fn test_missing_mandatory_field_fails_decode() {
        let mut value: serde_json::Value = serde_json::from_str(SAMPLE_JSON).unwrap();
        value.as_object_mut().unwrap().remove("date_created");

        assert!(serde_json::from_value::<Order>(value).is_err());
    }

    #[test]
    fn test_json_roundtrip() {
        let order: Order = serde_json::from_str(SAMPLE_JSON).unwrap();
        let encoded = serde_json::to_string(&order).unwrap();
        let decoded: Order = serde_json::from_str(&encoded).unwrap();
        assert_eq!(order, decoded);
    }
}
