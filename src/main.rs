use anyhow::Result;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    // stdout belongs to the REPL
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    harmonist::repl::start()
}
