//! HTTP 查询接口
//!
//! 对外只暴露按订单号的点查端点，写入只经由 Kafka 进入，
//! 不提供任何写端点。错误到状态码的映射由 `ServiceError` 统一承担。

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};

use crate::dto::OrderDto;
use crate::error::ServiceError;
use crate::service::OrderService;

/// Axum 应用共享状态
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<OrderService>,
}

impl AppState {
    pub fn new(service: Arc<OrderService>) -> Self {
        Self { service }
    }
}

/// 构建订单查询路由
///
/// `/orders` 与 `/orders/`（无订单号）统一返回 400，
/// 与带空白订单号的请求同一口径。
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/orders/{order_uid}", get(get_order))
        .route("/orders", get(missing_order_id))
        .route("/orders/", get(missing_order_id))
}

/// 获取订单详情
///
/// GET /orders/{order_uid}
async fn get_order(
    State(state): State<AppState>,
    Path(order_uid): Path<String>,
) -> Result<Json<OrderDto>, ServiceError> {
    let order_uid = order_uid.trim();
    if order_uid.is_empty() {
        return Err(ServiceError::MissingOrderId);
    }

    match state.service.get_order_by_id(order_uid).await? {
        Some(order) => Ok(Json(order)),
        None => Err(ServiceError::OrderNotFound(order_uid.to_string())),
    }
}

/// 路径中缺少订单号时统一返回 400
async fn missing_order_id() -> ServiceError {
    ServiceError::MissingOrderId
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{InMemoryOrderStore, sample_order};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    fn make_app(store: InMemoryOrderStore) -> Router {
        let service = Arc::new(OrderService::new(Arc::new(store)));
        routes().with_state(AppState::new(service))
    }

    async fn send_get(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, body)
    }

    #[tokio::test]
    async fn test_get_known_order_returns_full_dto() {
        let order = sample_order();
        let app = make_app(InMemoryOrderStore::with_order(order.clone()));

        let (status, body) = send_get(app, &format!("/orders/{}", order.order_uid)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, serde_json::to_value(&order).unwrap());
    }

    #[tokio::test]
    async fn test_get_unknown_order_returns_404() {
        let app = make_app(InMemoryOrderStore::default());

        let (status, body) = send_get(app, "/orders/nope").await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "ORDER_NOT_FOUND");
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn test_missing_order_id_returns_400() {
        for uri in ["/orders", "/orders/", "/orders/%20"] {
            let app = make_app(InMemoryOrderStore::default());
            let (status, body) = send_get(app, uri).await;

            assert_eq!(status, StatusCode::BAD_REQUEST, "uri={uri}");
            assert_eq!(body["code"], "ORDER_ID_REQUIRED", "uri={uri}");
        }
    }

    #[tokio::test]
    async fn test_storage_failure_returns_500_without_details() {
        let app = make_app(InMemoryOrderStore::failing());

        let (status, body) = send_get(app, "/orders/o-001").await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["code"], "INTERNAL_ERROR");
        // 内部细节不应出现在响应里
        assert!(
            !body["message"]
                .as_str()
                .unwrap_or_default()
                .contains("storage unavailable")
        );
    }
}
