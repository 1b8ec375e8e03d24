use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::task::{Context, Poll};
use std::time::{Duration, Instant};

use dashmap::DashMap;
use tower::{Layer, Service};
use tracing::warn;

const LOG_EVERY_DROPS: u64 = 100;
// Buckets idle longer than this get swept on the next insert.
const STALE_AFTER: Duration = Duration::from_secs(600);
const SWEEP_THRESHOLD: usize = 4096;

/// Per-client token buckets keyed by the proxy-reported address.
struct Limiter {
    buckets: DashMap<String, Bucket>,
    rate_per_sec: f64,
    burst: f64,
    dropped: AtomicU64,
}

struct Bucket {
    tokens: f64,
    last_refill: Instant,
}

impl Limiter {
    fn admit(&self, client: &str) -> bool {
        if self.buckets.len() > SWEEP_THRESHOLD {
            self.sweep();
        }
        let now = Instant::now();
        let mut entry = self.buckets.entry(client.to_string()).or_insert(Bucket {
            tokens: self.burst,
            last_refill: now,
        });
        let elapsed = now
            .saturating_duration_since(entry.last_refill)
            .as_secs_f64();
        entry.tokens = (entry.tokens + elapsed * self.rate_per_sec).min(self.burst);
        entry.last_refill = now;
        if entry.tokens >= 1.0 {
            entry.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    fn sweep(&self) {
        let now = Instant::now();
        self.buckets
            .retain(|_, bucket| now.saturating_duration_since(bucket.last_refill) < STALE_AFTER);
    }

    fn note_drop(&self) {
        let dropped = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
        if dropped % LOG_EVERY_DROPS == 0 {
            warn!("rate limiter has dropped {dropped} requests");
        }
    }
}

#[derive(Clone)]
pub struct RateLimiterLayer {
    limiter: Arc<Limiter>,
}

impl RateLimiterLayer {
    pub fn new(rate_per_sec: u32, burst: u32) -> Self {
        Self {
            limiter: Arc::new(Limiter {
                buckets: DashMap::new(),
                rate_per_sec: rate_per_sec as f64,
                burst: burst as f64,
                dropped: AtomicU64::new(0),
            }),
        }
    }
}

impl<S> Layer<S> for RateLimiterLayer {
    type Service = RateLimited<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RateLimited {
            inner,
            limiter: Arc::clone(&self.limiter),
        }
    }
}

#[derive(Clone)]
pub struct RateLimited<S> {
    inner: S,
    limiter: Arc<Limiter>,
}

impl<S, ReqBody> Service<axum::http::Request<ReqBody>> for RateLimited<S>
where
    S: Service<axum::http::Request<ReqBody>, Response = axum::http::Response<axum::body::Body>>
        + Send
        + 'static,
    S::Future: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: axum::http::Request<ReqBody>) -> Self::Future {
        if let Some(client) = client_id(&req)
            && !self.limiter.admit(&client)
        {
            self.limiter.note_drop();
            return Box::pin(async move {
                Ok(axum::http::Response::builder()
                    .status(axum::http::StatusCode::TOO_MANY_REQUESTS)
                    .body(axum::body::Body::from("rate limited"))
                    .unwrap())
            });
        }

        let fut = self.inner.call(req);
        Box::pin(async move { fut.await })
    }
}

/// First hop of the proxy chain; direct connections are not limited.
fn client_id<B>(req: &axum::http::Request<B>) -> Option<String> {
    req.headers()
        .get("X-Forwarded-For")
        .and_then(|h| h.to_str().ok())
        .and_then(|chain| chain.split(',').next())
        .map(|addr| addr.trim().to_string())
        .filter(|addr| !addr.is_empty())
}
