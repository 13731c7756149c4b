//! Test-only: initializes tracing from `RUST_LOG` when the test binary starts.
//!
//! Included by `main.rs` so server and client logs show up with `--nocapture`:
//!
//! ```bash
//! RUST_LOG=serve=debug,questline=debug cargo test -p serve --test e2e -- --nocapture
//! ```

use ctor::ctor;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::Layer;

#[ctor]
fn init_test_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_test_writer()
                .with_filter(filter),
        )
        .try_init();
}
