//! Request screening in front of the API: bot detection and a per-client
//! token bucket.
//!
//! Bots are rejected with 403 before they cost a token. Everyone else spends
//! one token per request and gets 429 once their bucket is empty. Buckets
//! refill in whole steps of `refill` tokens per elapsed `interval`.

use std::{
    collections::HashMap,
    net::SocketAddr,
    sync::{Arc, Mutex},
    time::Instant,
};

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{
        header::{RETRY_AFTER, USER_AGENT},
        StatusCode,
    },
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::{info, warn};

use crate::config::ShieldConfig;

/// Crawlers that are let through even though they announce themselves.
const ALLOWED_CRAWLERS: &[&str] = &[
    "googlebot",
    "bingbot",
    "duckduckbot",
    "yandexbot",
    "baiduspider",
    "applebot",
    "slurp",
];

const AUTOMATION_MARKERS: &[&str] = &[
    "bot",
    "crawler",
    "spider",
    "scraper",
    "curl",
    "wget",
    "python-requests",
    "python-urllib",
    "aiohttp",
    "httpclient",
    "go-http-client",
    "scrapy",
    "headless",
    "phantomjs",
    "libwww",
];

/// Buckets are pruned once the map holds this many clients.
const PRUNE_THRESHOLD: usize = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Agent {
    Browser,
    SearchEngine,
    Bot,
}

/// Classify a `User-Agent`. A missing header counts as a bot.
pub fn classify(user_agent: Option<&str>) -> Agent {
    let Some(ua) = user_agent.map(str::trim).filter(|ua| !ua.is_empty()) else {
        return Agent::Bot;
    };
    let ua = ua.to_ascii_lowercase();
    if ALLOWED_CRAWLERS.iter().any(|c| ua.contains(c)) {
        Agent::SearchEngine
    } else if AUTOMATION_MARKERS.iter().any(|m| ua.contains(m)) {
        Agent::Bot
    } else {
        Agent::Browser
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    RateLimited,
    Bot,
}

#[derive(Debug, Clone, Copy)]
struct Bucket {
    tokens: u32,
    last_refill: Instant,
}

#[derive(Debug)]
pub struct Shield {
    config: ShieldConfig,
    buckets: Mutex<HashMap<String, Bucket>>,
}

impl Shield {
    pub fn new(config: ShieldConfig) -> Self {
        Self {
            config,
            buckets: Mutex::new(HashMap::new()),
        }
    }

    pub fn decide(&self, client: &str, user_agent: Option<&str>, now: Instant) -> Decision {
        if classify(user_agent) == Agent::Bot {
            return Decision::Bot;
        }

        // A poisoned lock only means another request panicked mid-update;
        // the bucket map itself is still usable.
        let mut buckets = self.buckets.lock().unwrap_or_else(|e| e.into_inner());
        if buckets.len() >= PRUNE_THRESHOLD {
            let config = &self.config;
            buckets.retain(|_, bucket| refilled(config, *bucket, now).tokens < config.capacity);
        }

        let bucket = buckets.entry(client.to_string()).or_insert(Bucket {
            tokens: self.config.capacity,
            last_refill: now,
        });
        *bucket = refilled(&self.config, *bucket, now);

        if bucket.tokens == 0 {
            Decision::RateLimited
        } else {
            bucket.tokens -= 1;
            Decision::Allow
        }
    }
}

fn refilled(config: &ShieldConfig, bucket: Bucket, now: Instant) -> Bucket {
    let elapsed = now.saturating_duration_since(bucket.last_refill);
    let steps = u32::try_from(elapsed.as_nanos() / config.interval.as_nanos().max(1)).unwrap_or(u32::MAX);
    if steps == 0 {
        return bucket;
    }
    let added = steps.saturating_mul(config.refill);
    let last_refill = config
        .interval
        .checked_mul(steps)
        .and_then(|advance| bucket.last_refill.checked_add(advance))
        .unwrap_or(now);
    Bucket {
        tokens: bucket.tokens.saturating_add(added).min(config.capacity),
        last_refill,
    }
}

/// Identify the caller: peer address, else the first `X-Forwarded-For`
/// entry, else a shared `"unknown"` bucket.
fn client_key(request: &Request) -> String {
    if let Some(ConnectInfo(addr)) = request.extensions().get::<ConnectInfo<SocketAddr>>() {
        return addr.ip().to_string();
    }
    request
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Axum middleware applying `Shield::decide` to every request.
pub async fn protect(State(shield): State<Arc<Shield>>, request: Request, next: Next) -> Response {
    let client = client_key(&request);
    let user_agent = request
        .headers()
        .get(USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    match shield.decide(&client, user_agent.as_deref(), Instant::now()) {
        Decision::Allow => next.run(request).await,
        Decision::RateLimited => {
            info!(%client, "rate limit exceeded");
            let retry_after = shield.config.interval.as_secs().max(1).to_string();
            (
                StatusCode::TOO_MANY_REQUESTS,
                [(RETRY_AFTER, retry_after)],
                Json(json!({ "error": "Too Many Requests" })),
            )
                .into_response()
        }
        Decision::Bot => {
            warn!(%client, user_agent = user_agent.as_deref().unwrap_or(""), "bot denied");
            (StatusCode::FORBIDDEN, Json(json!({ "error": "Bot Access Detected" }))).into_response()
        }
    }
}
