pub mod api;
pub mod metrics;
pub mod order_validation;
pub mod orderbook;
pub mod pricing;
pub mod rate_limit;
pub mod redaction;
pub mod storage;

use crate::{metrics::Metrics, orderbook::Orderbook, rate_limit::RateLimiter};
use prometheus::Registry;
use shared::metrics::{serve_metrics, DEFAULT_METRICS_PORT};
use std::{net::SocketAddr, sync::Arc};
use tokio::{task, task::JoinHandle};

pub fn serve_task(
    orderbook: Arc<Orderbook>,
    order_limiter: Arc<RateLimiter>,
    tracking_limiter: Arc<RateLimiter>,
    address: SocketAddr,
) -> JoinHandle<()> {
    let registry = Registry::default();
    let metrics = Arc::new(Metrics::new(&registry));
    let filter = api::handle_all_routes(orderbook, order_limiter, tracking_limiter, metrics);
    tracing::info!(%address, "serving order api");
    task::spawn(warp::serve(filter).bind(address));

    let mut metrics_address = address;
    metrics_address.set_port(DEFAULT_METRICS_PORT);
    serve_metrics(registry, metrics_address)
}
