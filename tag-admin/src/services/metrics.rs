use axum::{extract::Request, middleware::Next, response::Response};
use prometheus::{Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder};
use std::sync::OnceLock;
use std::time::Instant;

// Global registry
pub static REGISTRY: OnceLock<Registry> = OnceLock::new();

// Inbound page/API requests
pub static HTTP_REQUESTS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();
pub static HTTP_REQUEST_DURATION_SECONDS: OnceLock<HistogramVec> = OnceLock::new();

// Outbound calls to the REST backend
pub static BACKEND_REQUESTS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();
pub static BACKEND_REQUEST_DURATION_SECONDS: OnceLock<HistogramVec> = OnceLock::new();

/// Registers all collectors. Safe to call more than once; later calls keep
/// the first registry.
pub fn init_metrics() -> Result<(), prometheus::Error> {
    if REGISTRY.get().is_some() {
        return Ok(());
    }

    let registry = Registry::new();

    let requests_total = IntCounterVec::new(
        Opts::new("http_requests_total", "Total number of HTTP requests"),
        &["method", "path", "status"],
    )?;
    let request_duration = HistogramVec::new(
        HistogramOpts::new(
            "http_request_duration_seconds",
            "HTTP request duration in seconds",
        ),
        &["method", "path", "status"],
    )?;
    let backend_total = IntCounterVec::new(
        Opts::new(
            "backend_requests_total",
            "Total number of calls made to the tag platform API",
        ),
        &["method", "endpoint", "outcome"],
    )?;
    let backend_duration = HistogramVec::new(
        HistogramOpts::new(
            "backend_request_duration_seconds",
            "Tag platform API call duration in seconds",
        ),
        &["method", "endpoint"],
    )?;

    registry.register(Box::new(requests_total.clone()))?;
    registry.register(Box::new(request_duration.clone()))?;
    registry.register(Box::new(backend_total.clone()))?;
    registry.register(Box::new(backend_duration.clone()))?;

    let _ = REGISTRY.set(registry);
    let _ = HTTP_REQUESTS_TOTAL.set(requests_total);
    let _ = HTTP_REQUEST_DURATION_SECONDS.set(request_duration);
    let _ = BACKEND_REQUESTS_TOTAL.set(backend_total);
    let _ = BACKEND_REQUEST_DURATION_SECONDS.set(backend_duration);
    Ok(())
}

pub fn get_metrics() -> String {
    let Some(registry) = REGISTRY.get() else {
        return String::new();
    };

    let mut buffer = Vec::new();
    let encoder = TextEncoder::new();
    if let Err(e) = encoder.encode(&registry.gather(), &mut buffer) {
        tracing::error!(error = %e, "Failed to encode metrics");
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}

/// Records one backend call. `endpoint` is the route template (ids removed)
/// to keep label cardinality bounded.
pub fn record_backend_call(method: &str, endpoint: &str, outcome: &str, elapsed_secs: f64) {
    if let Some(counter) = BACKEND_REQUESTS_TOTAL.get() {
        counter
            .with_label_values(&[method, endpoint, outcome])
            .inc();
    }
    if let Some(histogram) = BACKEND_REQUEST_DURATION_SECONDS.get() {
        histogram
            .with_label_values(&[method, endpoint])
            .observe(elapsed_secs);
    }
}

/// Counts every inbound request by method, matched route and status.
pub async fn http_metrics_middleware(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().to_string();
    let path = req
        .extensions()
        .get::<axum::extract::MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());

    let response = next.run(req).await;

    let status = response.status().as_u16().to_string();
    let labels = [method.as_str(), path.as_str(), status.as_str()];
    if let Some(counter) = HTTP_REQUESTS_TOTAL.get() {
        counter.with_label_values(&labels).inc();
    }
    if let Some(histogram) = HTTP_REQUEST_DURATION_SECONDS.get() {
        histogram
            .with_label_values(&labels)
            .observe(start.elapsed().as_secs_f64());
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_calls_show_up_in_output() {
        init_metrics().unwrap();
        record_backend_call("GET", "/tags/admin", "ok", 0.01);

        let text = get_metrics();
        assert!(text.contains("backend_requests_total"));
        assert!(text.contains("endpoint=\"/tags/admin\""));
    }
}
