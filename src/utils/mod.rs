pub mod build_info;

use std::sync::Once;

use tracing_subscriber::{filter::LevelFilter, fmt, EnvFilter};

static TRACING_INIT: Once = Once::new();

/// Installs the global fmt subscriber. `RUST_LOG` overrides the default
/// `mealbank=info` level; output goes to stderr so it never mixes with
/// command output.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        let filter = EnvFilter::builder()
            .with_default_directive(LevelFilter::WARN.into())
            .from_env_lossy();
        let filter = match "mealbank=info".parse() {
            Ok(directive) if std::env::var_os("RUST_LOG").is_none() => filter.add_directive(directive),
            _ => filter,
        };
        let _ = fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init();
    });
}
