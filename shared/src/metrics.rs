use prometheus::{Encoder, Registry, TextEncoder};
use std::{net::SocketAddr, sync::Arc};
use tokio::task::{self, JoinHandle};
use warp::{Filter, Rejection, Reply};

pub const DEFAULT_METRICS_PORT: u16 = 9586;

pub fn serve_metrics(registry: Registry, address: SocketAddr) -> JoinHandle<()> {
    let filter = handle_metrics(registry);
    tracing::info!(%address, "serving metrics");
    task::spawn(warp::serve(filter).bind(address))
}

/// Exposes all metrics of the given registry in the text format prometheus
/// scrapes.
pub fn handle_metrics(
    registry: Registry,
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    let registry = Arc::new(registry);
    warp::path!("metrics").and(warp::get()).map(move || {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        if let Err(err) = encoder.encode(&registry.gather(), &mut buffer) {
            tracing::error!(?err, "could not encode metrics");
        }
        String::from_utf8_lossy(&buffer).into_owned()
    })
}
