use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Registry};
use tracing_tree::HierarchicalLayer;

const DEFAULT_FILTER: &str = "info";

/// Installs the global subscriber: an `EnvFilter` read from `RUST_LOG`
/// (falling back to `info`) feeding a hierarchical span tree on stderr.
pub fn init_logging() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(DEFAULT_FILTER))?;
    Registry::default()
        .with(filter)
        .with(
            HierarchicalLayer::new(2)
                .with_writer(std::io::stderr)
                .with_targets(true)
                .with_indent_lines(true),
        )
        .try_init()?;
    Ok(())
}
