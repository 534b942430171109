use crate::{
    orderbook::{Orderbook, TrackOrderResult, TrackingRequest},
    rate_limit::RateLimiter,
};
use anyhow::Result;
use serde_json::json;
use std::{convert::Infallible, sync::Arc};
use warp::{
    hyper::StatusCode,
    reply::{self, Json, WithStatus},
    Filter, Rejection, Reply,
};

pub fn track_order_request(
) -> impl Filter<Extract = (String, TrackingRequest), Error = Rejection> + Clone {
    warp::path!("orders" / "track")
        .and(warp::post())
        .and(super::client_key())
        .and(super::extract_payload())
}

pub fn track_order_response(result: Result<TrackOrderResult>) -> WithStatus<Json> {
    match result {
        Ok(TrackOrderResult::Found(order)) => reply::with_status(
            reply::json(&json!({"success": true, "order": order})),
            StatusCode::OK,
        ),
        // One generic message for every malformed input; the caller learns
        // nothing about which check failed.
        Ok(TrackOrderResult::Malformed) => reply::with_status(
            super::error("InvalidTrackingRequest", "invalid order number or email"),
            StatusCode::BAD_REQUEST,
        ),
        Ok(TrackOrderResult::NotFound) => reply::with_status(
            super::error(
                "NotFound",
                "order was not found, check the order number and email",
            ),
            StatusCode::NOT_FOUND,
        ),
        Err(_) => reply::with_status(super::internal_error(), StatusCode::INTERNAL_SERVER_ERROR),
    }
}

pub fn track_order(
    orderbook: Arc<Orderbook>,
    limiter: Arc<RateLimiter>,
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    track_order_request().and_then(move |client: String, request: TrackingRequest| {
        let orderbook = orderbook.clone();
        let limiter = limiter.clone();
        async move {
            let reply = if !limiter.allow(&client) {
                tracing::debug!(%client, "rate limited order tracking");
                super::rate_limited()
            } else {
                let result = orderbook.track_order(&request).await;
                if let Err(err) = &result {
                    tracing::error!(?err, "track_order error");
                }
                track_order_response(result)
            };
            Result::<_, Infallible>::Ok(reply)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        api::response_body,
        orderbook::AddOrderResult,
        storage::memory::InMemoryOrders,
    };
    use model::{LineItem, OrderCreation, PaymentMethod};
    use std::time::Duration;

    fn submission() -> OrderCreation {
        OrderCreation {
            customer_name: "Asha Rao".to_string(),
            customer_email: "asha@example.com".to_string(),
            customer_phone: "+91 98765 43210".to_string(),
            delivery_address: "12 MG Road, Indiranagar, Bengaluru 560038".to_string(),
            items: vec![LineItem {
                id: "thali-1".to_string(),
                name: "Special Thali".to_string(),
                price: 100.0,
                quantity: 2,
                is_veg: true,
            }],
            subtotal: 200.0,
            payment_method: PaymentMethod::CashOnDelivery,
            honeypot: None,
        }
    }

    #[tokio::test]
    async fn track_order_request_ok() {
        let filter = track_order_request();
        let request = TrackingRequest {
            order_number: "HH10DEADBEEF".to_string(),
            customer_email: "asha@example.com".to_string(),
        };
        let (client, result) = warp::test::request()
            .path("/orders/track")
            .method("POST")
            .header("content-type", "application/json")
            .json(&request)
            .filter(&filter)
            .await
            .unwrap();
        assert_eq!(client, "unknown");
        assert_eq!(result.order_number, "HH10DEADBEEF");
    }

    #[tokio::test]
    async fn tracking_a_placed_order_returns_the_redacted_view() {
        let storage = Arc::new(InMemoryOrders::default());
        let orderbook = Arc::new(Orderbook::new(storage));
        let confirmation = match orderbook.add_order(submission()).await.unwrap() {
            AddOrderResult::Placed(confirmation) => confirmation,
            result => panic!("unexpected result {:?}", result),
        };
        let filter = track_order(
            orderbook,
            Arc::new(RateLimiter::new(10, Duration::from_secs(60))),
        );
        let request = TrackingRequest {
            order_number: confirmation.order_number.to_string(),
            customer_email: "asha@example.com".to_string(),
        };
        let response = warp::test::request()
            .path("/orders/track")
            .method("POST")
            .json(&request)
            .reply(&filter)
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        let body: serde_json::Value = serde_json::from_slice(response.body()).unwrap();
        assert_eq!(body["success"], true);
        assert_eq!(body["order"]["customer_name"], "Asha ***");
        assert_eq!(body["order"]["customer_email"], "as***@example.com");
        assert!(body["order"]["customer_phone"]
            .as_str()
            .unwrap()
            .ends_with("3210"));
    }

    #[tokio::test]
    async fn track_order_response_not_found() {
        let response = track_order_response(Ok(TrackOrderResult::NotFound)).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = response_body(response).await;
        let body: serde_json::Value = serde_json::from_slice(body.as_slice()).unwrap();
        assert_eq!(body["errorType"], "NotFound");
    }

    #[tokio::test]
    async fn track_order_response_malformed() {
        let response = track_order_response(Ok(TrackOrderResult::Malformed)).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn tracking_is_rate_limited_per_client() {
        let orderbook = Arc::new(Orderbook::new(Arc::new(InMemoryOrders::default())));
        let limiter = Arc::new(RateLimiter::new(1, Duration::from_secs(60)));
        let filter = track_order(orderbook, limiter);
        let request = TrackingRequest {
            order_number: "HH10DEADBEEF".to_string(),
            customer_email: "asha@example.com".to_string(),
        };
        let response = warp::test::request()
            .path("/orders/track")
            .method("POST")
            .header("x-forwarded-for", "203.0.113.7")
            .json(&request)
            .reply(&filter)
            .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let response = warp::test::request()
            .path("/orders/track")
            .method("POST")
            .header("x-forwarded-for", "203.0.113.7")
            .json(&request)
            .reply(&filter)
            .await;
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        // A different client is unaffected.
        let response = warp::test::request()
            .path("/orders/track")
            .method("POST")
            .header("x-forwarded-for", "198.51.100.2")
            .json(&request)
            .reply(&filter)
            .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
