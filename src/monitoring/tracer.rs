/*!
 * Operation Tracing
 * Structured tracing for scoped filesystem operations using the tracing crate
 *
 * Features:
 * - Per-operation trace IDs for request correlation
 * - JSON-formatted logs on request
 * - Duration and outcome recorded on every span
 */

use std::path::Path;
use std::time::{Duration, Instant};

use tracing::{debug, info, span, warn, Level};
use tracing_subscriber::{
    fmt::format::FmtSpan, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter,
};
use uuid::Uuid;

use crate::core::limits::ENV_TRACE_JSON;
use crate::vfs::types::VfsError;

/// Operations slower than this are reported at `warn`
const SLOW_OPERATION: Duration = Duration::from_millis(10);

/// Initialize structured tracing
///
/// Environment variables:
/// - RUST_LOG: Set log level (default: info)
/// - SCOPEFS_TRACE_JSON: Enable JSON output (default: false)
///
/// Only binaries call this; the library never installs a subscriber.
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let use_json = std::env::var(ENV_TRACE_JSON)
        .map(|v| v == "1" || v == "true")
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(env_filter);

    if use_json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_current_span(true)
                    .with_span_list(true)
                    .with_span_events(FmtSpan::CLOSE)
                    .with_writer(std::io::stderr),
            )
            .init();
        info!("Structured tracing initialized with JSON output");
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_span_events(FmtSpan::CLOSE)
                    .with_writer(std::io::stderr)
                    .compact(),
            )
            .init();
        info!("Structured tracing initialized");
    }
}

/// Generate a unique trace ID for request correlation
pub fn generate_trace_id() -> String {
    Uuid::new_v4().to_string()
}

/// Span covering one scoped filesystem operation
///
/// Created on entry to a scope method and dropped on return; the drop
/// records duration and emits the completion event.
pub struct OperationSpan {
    span: tracing::Span,
    start: Instant,
    operation: &'static str,
    trace_id: String,
}

impl OperationSpan {
    pub fn new(operation: &'static str, scope: &Path, name: &Path) -> Self {
        let trace_id = generate_trace_id();

        let span = span!(
            Level::DEBUG,
            "scope_op",
            trace_id = %trace_id,
            op = operation,
            scope = %scope.display(),
            path = %name.display(),
            duration_us = tracing::field::Empty,
            result = tracing::field::Empty,
            error = tracing::field::Empty,
        );

        Self {
            span,
            start: Instant::now(),
            operation,
            trace_id,
        }
    }

    pub fn trace_id(&self) -> &str {
        &self.trace_id
    }

    /// Enter the span so events emitted by the operation nest under it
    pub fn enter(&self) -> tracing::span::Entered<'_> {
        self.span.enter()
    }

    /// Record the outcome; the error itself still goes back to the caller
    pub fn record_result<T>(&self, result: &Result<T, VfsError>) {
        match result {
            Ok(_) => {
                self.span.record("result", "success");
            }
            Err(e) => {
                self.span.record("result", "error");
                self.span.record("error", tracing::field::display(e));
            }
        }
    }
}

impl Drop for OperationSpan {
    fn drop(&mut self) {
        let duration = self.start.elapsed();
        let _entered = self.span.enter();
        self.span.record("duration_us", duration.as_micros() as u64);

        if duration > SLOW_OPERATION {
            warn!(
                trace_id = %self.trace_id,
                op = self.operation,
                duration_ms = duration.as_millis() as u64,
                slow = true,
                "slow scope operation"
            );
        } else {
            debug!(
                trace_id = %self.trace_id,
                op = self.operation,
                duration_us = duration.as_micros() as u64,
                "scope operation completed"
            );
        }
    }
}
