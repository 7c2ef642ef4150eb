//! 模拟器 HTTP 端点
//!
//! `POST /produce` 接收订单 JSON 并转发到 Kafka 订单 topic。只做结构
//! 绑定，不做业务校验——字段内容是否合法由消费侧的校验门禁决定，
//! 模拟器要能投出"结构完整但内容非法"的报文来演练丢弃路径。

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::post,
};
use serde_json::{Value, json};
use tracing::{error, info};

use order_shared::kafka::{KafkaProducer, topics};
use order_shared::order::Order;

/// 模拟器共享状态
#[derive(Clone)]
pub struct EmulatorState {
    pub producer: KafkaProducer,
}

/// 构建模拟器路由
pub fn routes() -> Router<EmulatorState> {
    Router::new().route("/produce", post(produce))
}

/// 接收订单并发布到 Kafka
///
/// POST /produce
///
/// 请求体无法绑定为订单结构时由 Json 提取器直接拒绝（4xx）；
/// 发布失败返回 500 并附带原因。
async fn produce(
    State(state): State<EmulatorState>,
    Json(order): Json<Order>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    match state
        .producer
        .send_json(topics::ORDER_MESSAGES, &order.order_uid, &order)
        .await
    {
        Ok((partition, offset)) => {
            info!(
                order_uid = %order.order_uid,
                partition,
                offset,
                "订单已发布"
            );
            Ok(Json(json!({ "status": "ok" })))
        }
        Err(e) => {
            error!(order_uid = %order.order_uid, error = %e, "订单发布失败");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "Failed to produce message",
                    "details": e.to_string(),
                })),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, header};
    use order_shared::config::KafkaConfig;
    use tower::ServiceExt;

    /// 构造测试应用；生产者只在消息真正发送时才会联网，
    /// 绑定失败的请求根本走不到 Kafka
    fn make_app() -> Router {
        let producer =
            KafkaProducer::new(&KafkaConfig::default()).expect("创建生产者不需要可达的 broker");
        routes().with_state(EmulatorState { producer })
    }

    async fn post_json(app: Router, body: &str) -> StatusCode {
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/produce")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        response.status()
    }

    #[tokio::test]
    async fn test_malformed_json_is_rejected() {
        let status = post_json(make_app(), "not json at all").await;
        assert!(status.is_client_error(), "status={status}");
    }

    #[tokio::test]
    async fn test_structurally_incomplete_order_is_rejected() {
        // 缺少 delivery/payment/items 等必备结构，绑定失败
        let status = post_json(make_app(), r#"{"order_uid":"o-001"}"#).await;
        assert!(status.is_client_error(), "status={status}");
    }

    #[tokio::test]
    async fn test_missing_body_is_rejected() {
        let response = make_app()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/produce")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert!(response.status().is_client_error());
    }
}
