//! Logging setup
//!
//! fsql itself only emits `tracing` events, under three targets:
//!
//! - [`RESOURCES`]: chain releases (`debug`) and cleanup failures (`error`)
//! - [`STREAM`]: iterator exhaustion and stream close
//! - [`NAMED`]: placeholder mapping while rewriting `:name` SQL
//!
//! The `init*` helpers install a `tracing-subscriber` fmt subscriber
//! (feature `logging`); without the feature they do nothing.

#[cfg(feature = "logging")]
use tracing_subscriber::{EnvFilter, fmt};

pub const RESOURCES: &str = "fsql::resources";
pub const STREAM: &str = "fsql::stream";
pub const NAMED: &str = "fsql::named";

/// Filter directive: `level` globally, `lifecycle` for the resource and
/// stream targets.
pub fn directive(level: &str, lifecycle: &str) -> String {
    format!("{level},{RESOURCES}={lifecycle},{STREAM}={lifecycle}")
}

/// `RUST_LOG` 이 없으면 info, 리소스 정리 실패는 항상 보임
#[cfg(feature = "logging")]
pub fn init() {
    init_with_level("info")
}

/// Install a subscriber at `level`; resource lifecycle stays at least at
/// `warn` so cleanup failures are never filtered out.
#[cfg(feature = "logging")]
pub fn init_with_level(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(directive(level, lifecycle_floor(level))));

    let _ = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_line_number(true)
        .try_init();
}

/// Test subscriber: every release and every rewrite is printed through the
/// test writer.
#[cfg(feature = "logging")]
pub fn init_test() {
    let _ = fmt()
        .with_env_filter(EnvFilter::new(format!(
            "{},{NAMED}=trace",
            directive("warn", "debug")
        )))
        .with_test_writer()
        .try_init();
}

#[cfg(not(feature = "logging"))]
pub fn init() {}

#[cfg(not(feature = "logging"))]
pub fn init_with_level(_level: &str) {}

#[cfg(not(feature = "logging"))]
pub fn init_test() {}

// error 나 off 로 낮추면 cleanup 실패까지 사라지므로 warn 아래로는 안 내림
#[cfg_attr(not(feature = "logging"), allow(dead_code))]
fn lifecycle_floor(level: &str) -> &str {
    match level.to_ascii_lowercase().as_str() {
        "error" | "off" => "warn",
        _ => level,
    }
}
