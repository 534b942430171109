//! Contains command line arguments and related helpers that are shared
//! between the binaries.

use std::{num::ParseFloatError, time::Duration};

#[derive(Debug, structopt::StructOpt)]
pub struct Arguments {
    #[structopt(long, env, default_value = "warn,orderbook=debug,shared=debug")]
    pub log_filter: String,
}

pub fn duration_from_seconds(s: &str) -> Result<Duration, ParseFloatError> {
    Ok(Duration::from_secs_f64(s.parse()?))
}
