mod create_order;
mod track_order;

use crate::{
    metrics::{end_request, start_request, LabelledReply, Metrics},
    orderbook::Orderbook,
    rate_limit::RateLimiter,
};
use serde::{de::DeserializeOwned, Serialize};
use std::{convert::Infallible, sync::Arc};
use warp::{
    hyper::StatusCode,
    reply::{json, with_status, Json, WithStatus},
    wrap_fn, Filter, Rejection, Reply,
};

pub fn handle_all_routes(
    orderbook: Arc<Orderbook>,
    order_limiter: Arc<RateLimiter>,
    tracking_limiter: Arc<RateLimiter>,
    metrics: Arc<Metrics>,
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    let create_order = create_order::create_order(orderbook.clone(), order_limiter);
    let track_order = track_order::track_order(orderbook, tracking_limiter);
    let cors = warp::cors()
        .allow_any_origin()
        .allow_methods(vec!["GET", "POST", "OPTIONS"])
        .allow_headers(vec!["Origin", "Content-Type"]);
    let routes_with_labels = warp::path!("api" / "v1" / ..).and(
        (create_order.map(|reply| LabelledReply::new(reply, "create_order")))
            .or(track_order.map(|reply| LabelledReply::new(reply, "track_order")))
            .unify(),
    );
    routes_with_labels
        .with(wrap_fn(|f| wrap_metrics(f, metrics.clone())))
        .recover(handle_rejection)
        .with(cors)
}

// We turn Rejection into Reply to workaround warp not setting CORS headers on
// rejections.
async fn handle_rejection(err: Rejection) -> Result<impl Reply, Infallible> {
    Ok(err.default_response())
}

fn wrap_metrics<F>(
    filter: F,
    metrics: Arc<Metrics>,
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone
where
    F: Filter<Extract = (LabelledReply,), Error = Rejection> + Clone + Send + Sync + 'static,
{
    warp::any()
        .and(start_request())
        .and(filter)
        .map(move |timer, reply| end_request(metrics.clone(), timer, reply))
}

/// The client key the rate limiters bucket by: first entry of
/// `x-forwarded-for`, else `x-real-ip`, else a shared "unknown" bucket.
fn client_key() -> impl Filter<Extract = (String,), Error = Rejection> + Clone {
    warp::header::optional::<String>("x-forwarded-for")
        .and(warp::header::optional::<String>("x-real-ip"))
        .map(|forwarded: Option<String>, real_ip: Option<String>| {
            forwarded
                .as_deref()
                .and_then(|value| value.split(',').next())
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(str::to_string)
                .or(real_ip)
                .unwrap_or_else(|| "unknown".to_string())
        })
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Error<'a> {
    error_type: &'a str,
    description: &'a str,
}

fn error(error_type: &str, description: impl AsRef<str>) -> Json {
    json(&Error {
        error_type,
        description: description.as_ref(),
    })
}

fn internal_error() -> Json {
    json(&Error {
        error_type: "InternalServerError",
        description: "",
    })
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ValidationErrorBody<'a> {
    error_type: &'a str,
    description: &'a str,
    details: &'a crate::order_validation::ValidationErrors,
}

fn validation_error(details: &crate::order_validation::ValidationErrors) -> Json {
    json(&ValidationErrorBody {
        error_type: "ValidationFailed",
        description: "one or more fields are invalid",
        details,
    })
}

fn rate_limited() -> WithStatus<Json> {
    with_status(
        error("TooManyRequests", "too many requests, try again later"),
        StatusCode::TOO_MANY_REQUESTS,
    )
}

const MAX_JSON_BODY_PAYLOAD: u64 = 1024 * 16;

fn extract_payload<T: DeserializeOwned + Send>(
) -> impl Filter<Extract = (T,), Error = Rejection> + Clone {
    // (rejecting huge payloads)...
    warp::body::content_length_limit(MAX_JSON_BODY_PAYLOAD).and(warp::body::json())
}

#[cfg(test)]
async fn response_body(response: warp::hyper::Response<warp::hyper::Body>) -> Vec<u8> {
    let mut body = response.into_body();
    let mut result = Vec::new();
    while let Some(bytes) = futures::StreamExt::next(&mut body).await {
        result.extend_from_slice(bytes.unwrap().as_ref());
    }
    result
}
