//! Logging setup and per-request database query counting.
//!
//! Console logging is always on. When `OTEL_EXPORTER_OTLP_ENDPOINT` points at a
//! reachable collector, traces and log records are exported there as well.

use axum::{
    body::Body,
    extract::MatchedPath,
    http::{Request, Response as HttpResponse},
    middleware::Next,
    response::Response,
};
use opentelemetry::trace::TracerProvider;
use opentelemetry_appender_tracing::layer::OpenTelemetryTracingBridge;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::logs::SdkLoggerProvider;
use opentelemetry_sdk::trace::SdkTracerProvider;
use std::env;
use std::net::{TcpStream, ToSocketAddrs};
use std::sync::{
    atomic::{AtomicU32, Ordering},
    Arc,
};
use std::fmt::Display;
use std::time::Duration;
use tower_http::trace::{
    DefaultOnBodyChunk, DefaultOnEos, HttpMakeClassifier, MakeSpan, OnFailure, OnResponse,
    TraceLayer,
};
use tracing::{span::Id, Level, Span, Subscriber};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{layer::Context, registry::LookupSpan, EnvFilter, Layer};

const SERVICE_NAME: &str = "recipe-server";

pub const QUERY_COUNT_HEADER: &str = "x-db-query-count";

/// Keeps the OTLP providers alive so buffered spans and logs can be flushed
/// on the way out.
#[derive(Debug, Default)]
pub struct TelemetryGuard {
    tracer_provider: Option<SdkTracerProvider>,
    logger_provider: Option<SdkLoggerProvider>,
}

impl TelemetryGuard {
    /// Flushes and stops the exporters. A no-op for console-only logging.
    pub fn shutdown(self) {
        if let Some(provider) = self.tracer_provider {
            if let Err(e) = provider.shutdown() {
                tracing::warn!(error = %e, "Failed to shut down trace exporter");
            }
        }
        if let Some(provider) = self.logger_provider {
            if let Err(e) = provider.shutdown() {
                eprintln!("Failed to shut down log exporter: {e}");
            }
        }
    }
}

/// Installs the global subscriber. Call once, before anything logs.
pub fn init_telemetry() -> TelemetryGuard {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let fmt_layer = tracing_subscriber::fmt::layer();
    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .with(DbQueryCountingLayer);

    let Some(endpoint) = env::var("OTEL_EXPORTER_OTLP_ENDPOINT").ok() else {
        registry.init();
        tracing::debug!("OTEL_EXPORTER_OTLP_ENDPOINT not set, using console logging only");
        return TelemetryGuard::default();
    };

    if !collector_reachable(&endpoint) {
        registry.init();
        tracing::info!(
            "OpenTelemetry endpoint {} not reachable, using console logging only",
            endpoint
        );
        return TelemetryGuard::default();
    }

    let service_name = env::var("OTEL_SERVICE_NAME").unwrap_or_else(|_| SERVICE_NAME.to_string());
    let resource = opentelemetry_sdk::Resource::builder()
        .with_service_name(service_name.clone())
        .build();

    let span_exporter = match opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(&endpoint)
        .build()
    {
        Ok(exporter) => exporter,
        Err(e) => {
            registry.init();
            tracing::warn!(
                error = %e,
                "Failed to create OTLP trace exporter, using console logging only"
            );
            return TelemetryGuard::default();
        }
    };

    let log_exporter = match opentelemetry_otlp::LogExporter::builder()
        .with_tonic()
        .with_endpoint(&endpoint)
        .build()
    {
        Ok(exporter) => exporter,
        Err(e) => {
            registry.init();
            tracing::warn!(
                error = %e,
                "Failed to create OTLP log exporter, using console logging only"
            );
            return TelemetryGuard::default();
        }
    };

    let trace_provider = SdkTracerProvider::builder()
        .with_batch_exporter(span_exporter)
        .with_resource(resource.clone())
        .build();
    let tracer = trace_provider.tracer(SERVICE_NAME);
    opentelemetry::global::set_tracer_provider(trace_provider.clone());

    let log_provider = SdkLoggerProvider::builder()
        .with_batch_exporter(log_exporter)
        .with_resource(resource)
        .build();

    registry
        .with(tracing_opentelemetry::layer().with_tracer(tracer))
        .with(OpenTelemetryTracingBridge::new(&log_provider))
        .init();

    tracing::info!(
        "OpenTelemetry enabled, exporting traces and logs to {} as {}",
        endpoint,
        service_name
    );

    TelemetryGuard {
        tracer_provider: Some(trace_provider),
        logger_provider: Some(log_provider),
    }
}

/// Quick TCP probe so a missing collector doesn't stall every export.
fn collector_reachable(endpoint: &str) -> bool {
    let host_port = endpoint
        .trim_start_matches("http://")
        .trim_start_matches("https://")
        .trim_end_matches('/');

    host_port
        .to_socket_addrs()
        .ok()
        .and_then(|mut addrs| addrs.next())
        .map(|addr| TcpStream::connect_timeout(&addr, Duration::from_millis(100)).is_ok())
        .unwrap_or(false)
}

/// HTTP request tracing: one span per request, one event per outcome.
pub fn trace_layer() -> TraceLayer<
    HttpMakeClassifier,
    RequestSpan,
    (),
    RequestOutcome,
    DefaultOnBodyChunk,
    DefaultOnEos,
    RequestOutcome,
> {
    TraceLayer::new_for_http()
        .make_span_with(RequestSpan)
        .on_request(())
        .on_response(RequestOutcome)
        .on_failure(RequestOutcome)
}

/// Names the span after the matched route rather than the raw URI.
///
/// Health checks get a trace-level span so they stay out of the info logs.
#[derive(Debug, Clone, Copy)]
pub struct RequestSpan;

impl<B> MakeSpan<B> for RequestSpan {
    fn make_span(&mut self, request: &Request<B>) -> Span {
        let path = request
            .extensions()
            .get::<MatchedPath>()
            .map(MatchedPath::as_str)
            .unwrap_or(request.uri().path());

        if path == crate::api::status::PATH_HEALTH {
            tracing::trace_span!("http_request")
        } else {
            tracing::info_span!("http_request", method = %request.method(), path = %path)
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RequestOutcome;

impl<B> OnResponse<B> for RequestOutcome {
    fn on_response(self, response: &HttpResponse<B>, latency: Duration, span: &Span) {
        if span.metadata().map(|m| *m.level()) == Some(Level::TRACE) {
            return;
        }

        let status = response.status();
        let latency_ms = latency.as_millis();
        if status.is_server_error() {
            tracing::error!(
                status = %status.as_u16(),
                latency_ms = %latency_ms,
                "request failed with server error"
            );
        } else {
            tracing::info!(
                status = %status.as_u16(),
                latency_ms = %latency_ms,
                "request completed"
            );
        }
    }
}

impl<F: Display> OnFailure<F> for RequestOutcome {
    fn on_failure(&mut self, failure: F, latency: Duration, _span: &Span) {
        tracing::error!(error = %failure, latency_ms = %latency.as_millis(), "request failed");
    }
}

tokio::task_local! {
    /// Database statements issued by the current request.
    static DB_QUERY_COUNTER: Arc<AtomicU32>;
}

/// Current request's query count, if called inside `query_counting_middleware`.
pub fn get_query_count() -> Option<u32> {
    DB_QUERY_COUNTER
        .try_with(|counter| counter.load(Ordering::Relaxed))
        .ok()
}

/// Increments the task-local counter whenever a `db.query` span is opened.
///
/// `PgStore` opens that span on the request task before handing the statement
/// to a blocking thread, so the task-local is in scope here.
pub struct DbQueryCountingLayer;

impl<S> Layer<S> for DbQueryCountingLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_new_span(&self, _attrs: &tracing::span::Attributes<'_>, id: &Id, ctx: Context<'_, S>) {
        let Some(span) = ctx.span(id) else {
            return;
        };

        if span.name() == "db.query" {
            let _ = DB_QUERY_COUNTER.try_with(|counter| {
                counter.fetch_add(1, Ordering::Relaxed);
            });
        }
    }
}

/// Starts a fresh counter for the request.
///
/// Must be the outermost layer that needs the count.
pub async fn query_counting_middleware(request: Request<Body>, next: Next) -> Response {
    let counter = Arc::new(AtomicU32::new(0));
    DB_QUERY_COUNTER.scope(counter, next.run(request)).await
}

/// Adds the query count header to the response.
pub async fn db_query_count_header_middleware(request: Request<Body>, next: Next) -> Response {
    let mut response = next.run(request).await;

    if let Some(count) = get_query_count() {
        response
            .headers_mut()
            .insert(QUERY_COUNT_HEADER, axum::http::HeaderValue::from(count));
    }

    response
}
