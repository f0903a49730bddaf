use once_cell::sync::Lazy;
use rand::Rng;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, ORIGIN, REFERER, USER_AGENT};
use std::time::Duration;
use tracing::info;

static USER_AGENTS: Lazy<Vec<&'static str>> = Lazy::new(|| {
    vec![
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 Chrome/120 Safari/537.36",
        "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 Chrome/119 Safari/537.36",
        "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 Chrome/118 Safari/537.36",
    ]
});

/// One rotating fingerprint presented to the upstream: a user agent from the
/// fixed pool, a synthetic source-IP hint, and a dedicated HTTP client whose
/// connection pool and cookies live and die with the identity. Identities
/// are replaced wholesale, never partially mutated.
#[derive(Debug, Clone)]
pub struct Identity {
    pub user_agent: String,
    pub forwarded_ip: String,
    pub client: reqwest::Client,
}

impl Identity {
    fn new(request_timeout: Duration) -> Self {
        let mut rng = rand::thread_rng();
        let user_agent = USER_AGENTS[rng.gen_range(0..USER_AGENTS.len())].to_string();
        let forwarded_ip = (0..4)
            .map(|_| rng.gen_range(20..=230u8).to_string())
            .collect::<Vec<_>>()
            .join(".");
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .cookie_store(true)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            user_agent,
            forwarded_ip,
            client,
        }
    }

    /// Request headers carrying this identity's fingerprint.
    pub fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Ok(ua) = HeaderValue::from_str(&self.user_agent) {
            headers.insert(USER_AGENT, ua);
        }
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/json, text/plain, */*"),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-IN,en;q=0.9"));
        headers.insert(
            ORIGIN,
            HeaderValue::from_static("https://in.bookmyshow.com"),
        );
        headers.insert(
            REFERER,
            HeaderValue::from_static("https://in.bookmyshow.com/"),
        );
        if let Ok(ip) = HeaderValue::from_str(&self.forwarded_ip) {
            headers.insert("X-Forwarded-For", ip);
        }
        headers
    }
}

/// Per-worker identity slot. Each worker owns exactly one context; the
/// identity inside is created lazily and discarded wholesale on reset, so no
/// two workers can ever observe the same instance.
#[derive(Debug)]
pub struct WorkerContext {
    request_timeout: Duration,
    identity: Option<Identity>,
}

impl WorkerContext {
    pub fn new(request_timeout: Duration) -> Self {
        Self {
            request_timeout,
            identity: None,
        }
    }

    /// Returns the identity bound to this worker, creating one on first use.
    pub fn identity(&mut self) -> &Identity {
        if self.identity.is_none() {
            info!("New identity created");
            self.identity = Some(Identity::new(self.request_timeout));
        }
        self.identity.as_ref().unwrap()
    }

    /// Discards the bound identity; the next `identity()` call builds a
    /// fresh one.
    pub fn reset_identity(&mut self) {
        self.identity = None;
        info!("Identity reset");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_is_created_lazily_and_reused() {
        let mut ctx = WorkerContext::new(Duration::from_secs(5));
        let ua = ctx.identity().user_agent.clone();
        let ip = ctx.identity().forwarded_ip.clone();
        assert_eq!(ctx.identity().user_agent, ua);
        assert_eq!(ctx.identity().forwarded_ip, ip);
    }

    #[test]
    fn reset_produces_a_fresh_instance() {
        let mut ctx = WorkerContext::new(Duration::from_secs(5));
        // The IP has four random octets; a collision across reset is
        // possible but the pool is large enough that ten attempts settling
        // on the same value means rotation is broken.
        let before = ctx.identity().forwarded_ip.clone();
        let rotated = (0..10).any(|_| {
            ctx.reset_identity();
            ctx.identity().forwarded_ip != before
        });
        assert!(rotated);
    }

    #[test]
    fn forwarded_ip_octets_stay_in_range() {
        let mut ctx = WorkerContext::new(Duration::from_secs(5));
        let ip = ctx.identity().forwarded_ip.clone();
        let octets: Vec<u32> = ip.split('.').map(|o| o.parse().unwrap()).collect();
        assert_eq!(octets.len(), 4);
        for octet in octets {
            assert!((20..=230).contains(&octet));
        }
    }

    #[test]
    fn headers_carry_the_fingerprint() {
        let mut ctx = WorkerContext::new(Duration::from_secs(5));
        let identity = ctx.identity().clone();
        let headers = identity.headers();
        assert_eq!(
            headers.get(USER_AGENT).unwrap().to_str().unwrap(),
            identity.user_agent
        );
        assert_eq!(
            headers.get("X-Forwarded-For").unwrap().to_str().unwrap(),
            identity.forwarded_ip
        );
    }
}
