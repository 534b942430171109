use orderbook::{
    orderbook::Orderbook, rate_limit::RateLimiter, serve_task, storage::postgresql::Postgres,
};
use shared::arguments::duration_from_seconds;
use std::{net::SocketAddr, sync::Arc, time::Duration};
use structopt::StructOpt;

#[derive(Debug, StructOpt)]
struct Arguments {
    #[structopt(flatten)]
    shared: shared::arguments::Arguments,

    #[structopt(long, env = "BIND_ADDRESS", default_value = "0.0.0.0:8080")]
    bind_address: SocketAddr,

    /// Url of the Postgres database. By default connects to locally running
    /// postgres.
    #[structopt(long, env = "DB_URL", default_value = "postgresql://")]
    db_url: String,

    /// How many orders a single client may create per rate limit window.
    #[structopt(long, env, default_value = "5")]
    max_order_requests_per_window: usize,

    /// How many tracking lookups a single client may issue per rate limit
    /// window. Looser than order creation since tracking is a safe,
    /// idempotent read.
    #[structopt(long, env, default_value = "10")]
    max_tracking_requests_per_window: usize,

    /// The length of the rate limit window in seconds.
    #[structopt(
        long,
        env,
        default_value = "60",
        parse(try_from_str = duration_from_seconds),
    )]
    rate_limit_window: Duration,
}

#[tokio::main]
async fn main() {
    let args = Arguments::from_args();
    shared::tracing::initialize(args.shared.log_filter.as_str());
    tracing::info!("running order service with {:#?}", args);

    let database = Postgres::new(args.db_url.as_str()).expect("failed to create database");
    let orderbook = Arc::new(Orderbook::new(Arc::new(database)));
    let order_limiter = Arc::new(RateLimiter::new(
        args.max_order_requests_per_window,
        args.rate_limit_window,
    ));
    let tracking_limiter = Arc::new(RateLimiter::new(
        args.max_tracking_requests_per_window,
        args.rate_limit_window,
    ));

    let serve_task = serve_task(
        orderbook,
        order_limiter,
        tracking_limiter,
        args.bind_address,
    );

    tokio::select! {
        result = serve_task => tracing::error!(?result, "serve task exited"),
        _ = tokio::signal::ctrl_c() => tracing::info!("shutting down"),
    };
}
