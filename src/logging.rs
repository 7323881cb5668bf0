use tracing_subscriber::{EnvFilter, fmt};

/// Sets up log output for the binary. `RUST_LOG` overrides the default
/// `info` level, e.g. `RUST_LOG=timetable_validity=debug`.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}
