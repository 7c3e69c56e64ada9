use tracing::trace_span;
use tracing_subscriber::{
    EnvFilter, layer::SubscriberExt, util::SubscriberInitExt,
};

use myro::{Config, Result};

mod batch;
mod procedure;
mod cache;

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::Registry::default()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let config = Config::from_env();
    tracing::info!(options = ?config.options(), cache = config.statement_cache_size(), "config");

    trace_span!("batch").in_scope(|| batch::main(&config))?;
    trace_span!("procedure").in_scope(|| procedure::main(&config))?;
    trace_span!("cache").in_scope(|| cache::main(&config));

    Ok(())
}

/// Hex dump of a frame.
fn hex(frame: &[u8]) -> String {
    use std::fmt::Write;
    frame.iter().fold(String::new(), |mut acc, b| {
        let _ = write!(acc, "{b:02x}");
        acc
    })
}
