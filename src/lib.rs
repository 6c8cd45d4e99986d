use tracing::level_filters::LevelFilter;

mod error;
pub use error::*;

mod atom;
pub use atom::*;

mod molecule;
pub use molecule::*;

mod builder;
pub use builder::*;

mod parse;
pub use parse::*;

mod analysis;
pub use analysis::*;

mod chain;
pub use chain::*;

mod naming;
pub use naming::*;

mod visualize;
pub use visualize::*;

/// Install a global `tracing` subscriber that prints events up to `level`
/// ("error", "warn", "info", "debug" or "trace"). Unknown levels fall back
/// to "info"; calling this more than once keeps the first subscriber.
pub fn init_logging(level: &str) {
    let level = level.parse::<LevelFilter>().unwrap_or(LevelFilter::INFO);
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .try_init();
}
