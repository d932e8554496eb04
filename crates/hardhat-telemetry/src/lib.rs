mod collector;

pub use collector::{SpanCollector, StageSpanLayer, StageSpanRecord, STAGE_SPAN};

use std::path::PathBuf;
use std::sync::Arc;

use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Service name stamped on every collected span.
pub const SERVICE_NAME: &str = "construction-crew";

/// Name of the span wrapping one full pipeline run.
pub const TURN_SPAN: &str = "turn";

/// Configuration for the telemetry subsystem.
#[derive(Clone, Debug)]
pub struct TelemetryConfig {
    /// Default log level. Overridden by RUST_LOG env var.
    pub log_level: Level,
    /// Emit JSON lines instead of human-readable logs.
    pub json: bool,
    /// SQLite file receiving stage spans. `None` disables collection.
    pub collector_db: Option<PathBuf>,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: Level::WARN,
            json: false,
            collector_db: None,
        }
    }
}

impl TelemetryConfig {
    pub(crate) fn filter_directives(&self) -> String {
        self.log_level.to_string().to_lowercase()
    }
}

/// Handle to the initialized telemetry subsystem.
pub struct TelemetryGuard {
    collector: Option<Arc<SpanCollector>>,
}

impl TelemetryGuard {
    /// The span collector, when one was configured and opened.
    pub fn collector(&self) -> Option<&SpanCollector> {
        self.collector.as_deref()
    }
}

/// Initialize the telemetry subsystem. Call once at startup.
///
/// Logs go to stderr so they never interleave with the game's stdout. A
/// collector that fails to open is reported and skipped; game behavior does
/// not depend on it.
pub fn init_telemetry(config: TelemetryConfig) -> TelemetryGuard {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.filter_directives()));

    let fmt_layer = if config.json {
        tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .with_span_list(true)
            .with_writer(std::io::stderr)
            .with_filter(env_filter)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_target(false)
            .with_writer(std::io::stderr)
            .with_filter(env_filter)
            .boxed()
    };

    let (span_layer, collector) = match &config.collector_db {
        Some(path) => match SpanCollector::new(path) {
            Ok(collector) => {
                let collector = Arc::new(collector);
                (Some(StageSpanLayer::new(collector.clone())), Some(collector))
            }
            Err(e) => {
                eprintln!("hardhat-telemetry: failed to open collector DB: {e}");
                (None, None)
            }
        },
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(span_layer)
        .init();

    if let Some(path) = &config.collector_db {
        if collector.is_some() {
            tracing::info!(path = %path.display(), service = SERVICE_NAME, "stage span collector enabled");
        }
    }

    TelemetryGuard { collector }
}
