//! Tracing subscriber initialization with structured logging and optional
//! OpenTelemetry trace export.
//!
//! # Usage
//!
//! ```no_run
//! use sqlkv_observe::tracing_setup::{TracingOptions, init_tracing};
//!
//! // -v on the command line, no OTel export
//! init_tracing(&TracingOptions { verbosity: 1, ..Default::default() }).unwrap();
//! ```

use std::sync::OnceLock;

use opentelemetry::trace::TracerProvider as _;
use opentelemetry_sdk::trace::SdkTracerProvider;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Stores the OTel tracer provider so it can be shut down cleanly on exit.
static TRACER_PROVIDER: OnceLock<SdkTracerProvider> = OnceLock::new();

/// How much to log and where.
#[derive(Debug, Clone, Default)]
pub struct TracingOptions {
    /// Number of `-v` flags given.
    pub verbosity: u8,
    /// Only log errors.
    pub quiet: bool,
    /// Bridge spans to OpenTelemetry with a stdout exporter.
    pub otel: bool,
}

impl TracingOptions {
    /// Filter directive used when `RUST_LOG` is not set.
    ///
    /// `-vv` and above include sqlx's statement log, which only has content
    /// when the storage config enables `debug_sql`.
    pub fn default_directive(&self) -> &'static str {
        match self.verbosity {
            0 if self.quiet => "error",
            0 => "warn",
            1 => "info,sqlkv_infra=debug,sqlkv_cli=debug",
            2 => "debug",
            _ => "trace",
        }
    }
}

/// Initialize the global tracing subscriber.
///
/// - Always installs a `fmt` layer writing to stderr so command output on
///   stdout stays machine-readable.
/// - `RUST_LOG` wins over the verbosity flags when set.
/// - With `otel`, spans are additionally exported to stdout via
///   OpenTelemetry (local debugging; swap the exporter for OTLP elsewhere).
///
/// # Errors
///
/// Returns an error if the global subscriber has already been set.
pub fn init_tracing(options: &TracingOptions) -> Result<(), Box<dyn std::error::Error>> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(options.default_directive()));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(options.verbosity > 0)
        .with_writer(std::io::stderr);

    if options.otel {
        let provider = SdkTracerProvider::builder()
            .with_simple_exporter(opentelemetry_stdout::SpanExporter::default())
            .build();
        let tracer = provider.tracer("sqlkv");
        let otel_layer = tracing_opentelemetry::layer().with_tracer(tracer);

        let _ = TRACER_PROVIDER.set(provider.clone());
        opentelemetry::global::set_tracer_provider(provider);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .with(otel_layer)
            .try_init()?;
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()?;
    }

    Ok(())
}

/// Flush pending spans and shut down the OpenTelemetry tracer provider.
///
/// No-op when OTel was not enabled.
pub fn shutdown_tracing() {
    if let Some(provider) = TRACER_PROVIDER.get() {
        if let Err(e) = provider.shutdown() {
            eprintln!("Warning: OTel tracer provider shutdown error: {e}");
        }
    }
}
