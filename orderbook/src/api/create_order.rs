use crate::{
    orderbook::{AddOrderResult, Orderbook},
    rate_limit::RateLimiter,
};
use anyhow::Result;
use model::OrderCreation;
use serde_json::json;
use std::{convert::Infallible, sync::Arc};
use warp::{
    hyper::StatusCode,
    reply::{self, Json, WithStatus},
    Filter, Rejection, Reply,
};

pub fn create_order_request(
) -> impl Filter<Extract = (String, OrderCreation), Error = Rejection> + Clone {
    warp::path!("orders")
        .and(warp::post())
        .and(super::client_key())
        .and(super::extract_payload())
}

pub fn create_order_response(result: Result<AddOrderResult>) -> WithStatus<Json> {
    match result {
        Ok(AddOrderResult::Placed(confirmation)) => reply::with_status(
            reply::json(&json!({
                "success": true,
                "order_number": confirmation.order_number,
                "estimated_delivery": confirmation.estimated_delivery,
                "total_amount": confirmation.total_amount,
            })),
            StatusCode::OK,
        ),
        // Same success shape bots see for real orders, minus the fields we
        // would have to fabricate.
        Ok(AddOrderResult::Decoyed(order_number)) => reply::with_status(
            reply::json(&json!({
                "success": true,
                "order_number": order_number,
            })),
            StatusCode::OK,
        ),
        Ok(AddOrderResult::Invalid(errors)) => {
            reply::with_status(super::validation_error(&errors), StatusCode::BAD_REQUEST)
        }
        Ok(AddOrderResult::PriceMismatch) => reply::with_status(
            super::error("PriceMismatch", "order totals could not be verified"),
            StatusCode::BAD_REQUEST,
        ),
        Err(_) => reply::with_status(super::internal_error(), StatusCode::INTERNAL_SERVER_ERROR),
    }
}

pub fn create_order(
    orderbook: Arc<Orderbook>,
    limiter: Arc<RateLimiter>,
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    create_order_request().and_then(move |client: String, order: OrderCreation| {
        let orderbook = orderbook.clone();
        let limiter = limiter.clone();
        async move {
            // The limiter gates the request before any validation work.
            let reply = if !limiter.allow(&client) {
                tracing::debug!(%client, "rate limited order creation");
                super::rate_limited()
            } else {
                let result = orderbook.add_order(order).await;
                if let Err(err) = &result {
                    tracing::error!(?err, "add_order error");
                }
                create_order_response(result)
            };
            Result::<_, Infallible>::Ok(reply)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{api::response_body, storage::memory::InMemoryOrders};
    use model::{LineItem, OrderNumber, PaymentMethod};
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
    async fn create_order_request_ok() {
        let filter = create_order_request();
        let order = submission();
        let request = warp::test::request()
            .path("/orders")
            .method("POST")
            .header("content-type", "application/json")
            .header("x-forwarded-for", "203.0.113.7")
            .json(&order);
        let (client, result) = request.filter(&filter).await.unwrap();
        assert_eq!(client, "203.0.113.7");
        assert_eq!(result, order);
    }

    #[tokio::test]
    async fn create_order_response_placed() {
        let confirmation = crate::orderbook::OrderConfirmation {
            order_number: "HH10DEADBEEF".parse().unwrap(),
            estimated_delivery: "07:42 PM - 07:57 PM".to_string(),
            total_amount: 230.0,
        };
        let response =
            create_order_response(Ok(AddOrderResult::Placed(confirmation))).into_response();
        assert_eq!(response.status(), StatusCode::OK);
        let body = response_body(response).await;
        let body: serde_json::Value = serde_json::from_slice(body.as_slice()).unwrap();
        let expected = json!({
            "success": true,
            "order_number": "HH10DEADBEEF",
            "estimated_delivery": "07:42 PM - 07:57 PM",
            "total_amount": 230.0,
        });
        assert_eq!(body, expected);
    }

    #[tokio::test]
    async fn create_order_response_decoy_has_no_extra_fields() {
        let number: OrderNumber = "HH10DEADBEEF".parse().unwrap();
        let response = create_order_response(Ok(AddOrderResult::Decoyed(number))).into_response();
        assert_eq!(response.status(), StatusCode::OK);
        let body = response_body(response).await;
        let body: serde_json::Value = serde_json::from_slice(body.as_slice()).unwrap();
        assert_eq!(
            body,
            json!({"success": true, "order_number": "HH10DEADBEEF"})
        );
    }

    #[tokio::test]
    async fn create_order_response_validation_failure() {
        let errors = crate::order_validation::validate(OrderCreation::default()).unwrap_err();
        let response = create_order_response(Ok(AddOrderResult::Invalid(errors))).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = response_body(response).await;
        let body: serde_json::Value = serde_json::from_slice(body.as_slice()).unwrap();
        assert_eq!(body["errorType"], "ValidationFailed");
        assert!(body["details"]["customer_name"].is_array());
    }

    #[tokio::test]
    async fn create_order_response_price_mismatch_is_generic() {
        let response = create_order_response(Ok(AddOrderResult::PriceMismatch)).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = response_body(response).await;
        let body: serde_json::Value = serde_json::from_slice(body.as_slice()).unwrap();
        let expected = json!({
            "errorType": "PriceMismatch",
            "description": "order totals could not be verified",
        });
        assert_eq!(body, expected);
    }

    #[tokio::test]
    async fn sixth_request_in_a_window_is_rate_limited() {
        let orderbook = Arc::new(Orderbook::new(Arc::new(InMemoryOrders::default())));
        let limiter = Arc::new(RateLimiter::new(5, Duration::from_secs(60)));
        let filter = create_order(orderbook, limiter);
        for _ in 0..5 {
            let response = warp::test::request()
                .path("/orders")
                .method("POST")
                .header("x-forwarded-for", "203.0.113.7")
                .json(&submission())
                .reply(&filter)
                .await;
            assert_eq!(response.status(), StatusCode::OK);
        }
        let response = warp::test::request()
            .path("/orders")
            .method("POST")
            .header("x-forwarded-for", "203.0.113.7")
            .json(&submission())
            .reply(&filter)
            .await;
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    }
}
