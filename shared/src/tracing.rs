use std::{
    panic::{self, PanicInfo},
    thread,
};
use time::macros::format_description;
use tracing_subscriber::fmt::time::UtcTime;

/// Initializes the tracing subscriber shared between the binaries.
/// `env_filter` has similar syntax to env_logger. It is documented at
/// https://docs.rs/tracing-subscriber/latest/tracing_subscriber/filter/struct.EnvFilter.html
pub fn initialize(env_filter: &str) {
    tracing_subscriber::fmt::fmt()
        .with_timer(UtcTime::new(format_description!(
            "[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:3]Z"
        )))
        .with_env_filter(env_filter)
        .with_ansi(atty::is(atty::Stream::Stdout))
        .init();

    set_panic_hook();
}

// Panics on a request path must show up in the log stream, not only on
// stderr. The default hook still runs afterwards because it is the only one
// that can print a full backtrace on stable.
fn set_panic_hook() {
    let default_hook = panic::take_hook();
    let hook = move |info: &PanicInfo| {
        let thread = thread::current();
        let thread_name = thread.name().unwrap_or("<unnamed>");
        tracing::error!("thread '{}' {}:", thread_name, info);
        default_hook(info);
    };
    panic::set_hook(Box::new(hook));
}
