//! Logging initialization.
//!
//! Structured events go to stderr so generated output and the final summary
//! stay clean on stdout. The filter comes from `RUST_LOG` when set, `info`
//! otherwise. Initialization is idempotent: a second call (e.g. from tests)
//! is a no-op.

use tracing_subscriber::EnvFilter;

/// Initialize the global subscriber.
///
/// `json` selects the JSON event formatter instead of the human-readable one.
pub fn init(json: bool) {
    use tracing_subscriber::layer::SubscriberExt as _;
    use tracing_subscriber::util::SubscriberInitExt as _;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    let result = if json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .try_init()
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init()
    };
    // Already-initialized is fine; anything else would only hurt logging.
    drop(result);
}
