use axum::http::{header, HeaderMap, StatusCode};
use axum::response::IntoResponse;
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGaugeVec, Opts, Registry, TextEncoder,
};
use std::future::Future;
use std::pin::Pin;
use std::sync::OnceLock;
use std::task::{Context, Poll};
use std::time::{Duration, Instant};
use tower::{Layer, Service};

struct Metrics {
    registry: Registry,
    bm_up: IntGaugeVec,
    http_requests_total: IntCounterVec,
    http_request_duration_seconds: HistogramVec,
    nfts_created_total: IntCounterVec,
    listings_created_total: IntCounterVec,
    purchases_total: IntCounterVec,
    purchase_rejected_total: IntCounterVec,
    auth_success_total: IntCounterVec,
    auth_failure_total: IntCounterVec,
    rate_limited_total: IntCounterVec,
    pinning_errors_total: IntCounterVec,
    rpc_requests_total: IntCounterVec,
}

pub const RPC_RESULT_OK: &str = "ok";
pub const RPC_RESULT_ERROR: &str = "error";

static METRICS: OnceLock<Metrics> = OnceLock::new();

fn metrics() -> &'static Metrics {
    METRICS.get_or_init(|| {
        let registry = Registry::new();

        let bm_up = IntGaugeVec::new(Opts::new("bm_up", "Service health"), &["service"])
            .expect("bm_up metric");

        let http_requests_total = IntCounterVec::new(
            Opts::new("http_requests_total", "HTTP request count"),
            &["service", "route", "method", "status"],
        )
        .expect("http_requests_total metric");

        let http_request_duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                "http_request_duration_seconds",
                "HTTP request duration in seconds",
            )
            .buckets(vec![
                0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
            ]),
            &["service", "route", "method", "status"],
        )
        .expect("http_request_duration_seconds metric");

        let nfts_created_total = IntCounterVec::new(
            Opts::new("nfts_created_total", "NFTs created through the API"),
            &["service"],
        )
        .expect("nfts_created_total metric");

        let listings_created_total = IntCounterVec::new(
            Opts::new("listings_created_total", "Marketplace listings created"),
            &["service"],
        )
        .expect("listings_created_total metric");

        let purchases_total = IntCounterVec::new(
            Opts::new("purchases_total", "Completed marketplace purchases"),
            &["service"],
        )
        .expect("purchases_total metric");

        let purchase_rejected_total = IntCounterVec::new(
            Opts::new("purchase_rejected_total", "Rejected purchase attempts"),
            &["service", "reason"],
        )
        .expect("purchase_rejected_total metric");

        let auth_success_total = IntCounterVec::new(
            Opts::new("auth_success_total", "Authentication success count"),
            &["service"],
        )
        .expect("auth_success_total metric");

        let auth_failure_total = IntCounterVec::new(
            Opts::new("auth_failure_total", "Authentication failure count"),
            &["service"],
        )
        .expect("auth_failure_total metric");

        let rate_limited_total = IntCounterVec::new(
            Opts::new("rate_limited_total", "Requests rejected by rate limiting"),
            &["service", "scope"],
        )
        .expect("rate_limited_total metric");

        let pinning_errors_total = IntCounterVec::new(
            Opts::new("pinning_errors_total", "Pinning service call failures"),
            &["service", "operation"],
        )
        .expect("pinning_errors_total metric");

        let rpc_requests_total = IntCounterVec::new(
            Opts::new("rpc_requests_total", "Chain JSON-RPC calls"),
            &["service", "method", "result"],
        )
        .expect("rpc_requests_total metric");

        registry
            .register(Box::new(bm_up.clone()))
            .expect("register bm_up");
        registry
            .register(Box::new(http_requests_total.clone()))
            .expect("register http_requests_total");
        registry
            .register(Box::new(http_request_duration_seconds.clone()))
            .expect("register http_request_duration_seconds");
        registry
            .register(Box::new(nfts_created_total.clone()))
            .expect("register nfts_created_total");
        registry
            .register(Box::new(listings_created_total.clone()))
            .expect("register listings_created_total");
        registry
            .register(Box::new(purchases_total.clone()))
            .expect("register purchases_total");
        registry
            .register(Box::new(purchase_rejected_total.clone()))
            .expect("register purchase_rejected_total");
        registry
            .register(Box::new(auth_success_total.clone()))
            .expect("register auth_success_total");
        registry
            .register(Box::new(auth_failure_total.clone()))
            .expect("register auth_failure_total");
        registry
            .register(Box::new(rate_limited_total.clone()))
            .expect("register rate_limited_total");
        registry
            .register(Box::new(pinning_errors_total.clone()))
            .expect("register pinning_errors_total");
        registry
            .register(Box::new(rpc_requests_total.clone()))
            .expect("register rpc_requests_total");

        Metrics {
            registry,
            bm_up,
            http_requests_total,
            http_request_duration_seconds,
            nfts_created_total,
            listings_created_total,
            purchases_total,
            purchase_rejected_total,
            auth_success_total,
            auth_failure_total,
            rate_limited_total,
            pinning_errors_total,
            rpc_requests_total,
        }
    })
}

pub fn init(service_name: &'static str) {
    metrics().bm_up.with_label_values(&[service_name]).set(1);
}

pub fn record_http_request(
    service_name: &'static str,
    method: &str,
    route: &str,
    status: u16,
    duration: Duration,
) {
    let status_str = status.to_string();
    let labels = &[service_name, route, method, status_str.as_str()];
    let metrics = metrics();
    metrics.http_requests_total.with_label_values(labels).inc();
    metrics
        .http_request_duration_seconds
        .with_label_values(labels)
        .observe(duration.as_secs_f64());
}

pub fn inc_nft_created(service_name: &'static str) {
    metrics()
        .nfts_created_total
        .with_label_values(&[service_name])
        .inc();
}

pub fn inc_listing_created(service_name: &'static str) {
    metrics()
        .listings_created_total
        .with_label_values(&[service_name])
        .inc();
}

pub fn inc_purchase(service_name: &'static str) {
    metrics()
        .purchases_total
        .with_label_values(&[service_name])
        .inc();
}

pub fn inc_purchase_rejected(service_name: &'static str, reason: &'static str) {
    metrics()
        .purchase_rejected_total
        .with_label_values(&[service_name, reason])
        .inc();
}

pub fn inc_auth_success(service_name: &'static str) {
    metrics()
        .auth_success_total
        .with_label_values(&[service_name])
        .inc();
}

pub fn inc_auth_failure(service_name: &'static str) {
    metrics()
        .auth_failure_total
        .with_label_values(&[service_name])
        .inc();
}

pub fn inc_rate_limited(service_name: &'static str, scope: &'static str) {
    metrics()
        .rate_limited_total
        .with_label_values(&[service_name, scope])
        .inc();
}

pub fn inc_pinning_error(service_name: &'static str, operation: &'static str) {
    metrics()
        .pinning_errors_total
        .with_label_values(&[service_name, operation])
        .inc();
}

pub fn inc_rpc_request(service_name: &'static str, method: &str, result: &'static str) {
    metrics()
        .rpc_requests_total
        .with_label_values(&[service_name, method, result])
        .inc();
}

pub fn metrics_response(service_name: &'static str) -> impl IntoResponse {
    init(service_name);
    let metrics = metrics();
    let metric_families = metrics.registry.gather();
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    if encoder.encode(&metric_families, &mut buffer).is_err() {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            HeaderMap::new(),
            "failed to encode metrics".to_string(),
        );
    }

    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        "text/plain; version=0.0.4".parse().unwrap(),
    );
    (
        StatusCode::OK,
        headers,
        String::from_utf8_lossy(&buffer).to_string(),
    )
}

#[derive(Clone)]
pub struct MetricsLayer {
    service_name: &'static str,
}

impl MetricsLayer {
    pub fn new(service_name: &'static str) -> Self {
        Self { service_name }
    }
}

#[derive(Clone)]
pub struct MetricsService<S> {
    inner: S,
    service_name: &'static str,
}

impl<S> Layer<S> for MetricsLayer {
    type Service = MetricsService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        MetricsService {
            inner,
            service_name: self.service_name,
        }
    }
}

impl<S, ReqBody, ResBody> Service<axum::http::Request<ReqBody>> for MetricsService<S>
where
    S: Service<axum::http::Request<ReqBody>, Response = axum::response::Response<ResBody>>
        + Send
        + 'static,
    S::Future: Send + 'static,
    S::Error: Send + 'static,
    ResBody: Send + 'static,
{
    type Response = axum::response::Response<ResBody>;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: axum::http::Request<ReqBody>) -> Self::Future {
        let service_name = self.service_name;
        let method = request.method().to_string();
        let route = request.uri().path().to_string();
        let start = Instant::now();
        let fut = self.inner.call(request);
        Box::pin(async move {
            match fut.await {
                Ok(response) => {
                    record_http_request(
                        service_name,
                        &method,
                        &route,
                        response.status().as_u16(),
                        start.elapsed(),
                    );
                    Ok(response)
                }
                Err(err) => {
                    record_http_request(service_name, &method, &route, 500, start.elapsed());
                    Err(err)
                }
            }
        })
    }
}
