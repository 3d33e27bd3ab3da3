//! Subscriber installation for hosts and tests.

use std::sync::Once;

static TRACING_INIT: Once = Once::new();

/// Filter directives; `INOX_LOG` wins over `RUST_LOG`.
fn filter_directives() -> Option<String> {
    std::env::var("INOX_LOG")
        .or_else(|_| std::env::var("RUST_LOG"))
        .ok()
}

/// Initialize tracing for debug output.
///
/// Call this once at startup. Safe to call multiple times.
/// Enable with `INOX_LOG=inox_eval=debug`; set `INOX_LOG_TREE=1` to render
/// spans as an indented tree.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        let Some(directives) = filter_directives() else {
            return;
        };
        let filter = EnvFilter::new(directives);
        if std::env::var_os("INOX_LOG_TREE").is_some() {
            let _ = tracing_subscriber::registry()
                .with(
                    tracing_tree::HierarchicalLayer::new(2)
                        .with_targets(true)
                        .with_bracketed_fields(true),
                )
                .with(filter)
                .try_init();
        } else {
            let _ = tracing_subscriber::registry()
                .with(fmt::layer().with_target(true).with_level(true))
                .with(filter)
                .try_init();
        }
    });
}
