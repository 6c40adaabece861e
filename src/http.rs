//! Blocking HTTP fetches with browser-like headers, user-agent rotation and
//! randomized backoff.
//!
//! A fetch that runs out of attempts yields `None`. Callers treat that as an
//! ordinary outcome: the leasing site is flaky and sometimes blocks scrapers.

use std::io::IsTerminal;
use std::ops::Range;
use std::thread;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use rand::Rng;
use reqwest::blocking::Client;
use reqwest::header::{
    HeaderMap, HeaderName, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CONNECTION,
    UPGRADE_INSECURE_REQUESTS, USER_AGENT,
};

use crate::error::Result;
use crate::user_agent::UserAgentRotation;

/// A response that came back from one attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct PageResponse {
    pub url: String,
    pub status: u16,
    pub body: String,
}

impl PageResponse {
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }
}

/// Sends a single GET. Implementations do not retry.
pub trait Transport {
    fn get(&self, url: &str, headers: HeaderMap) -> Result<PageResponse>;
}

/// Production transport backed by one `reqwest` blocking client.
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .cookie_store(true)
            .timeout(timeout)
            .build()?;

        Ok(Self { client })
    }
}

impl Transport for ReqwestTransport {
    fn get(&self, url: &str, headers: HeaderMap) -> Result<PageResponse> {
        let response = self.client.get(url).headers(headers).send()?;
        let status = response.status().as_u16();
        let body = response.text()?;

        Ok(PageResponse {
            url: url.to_string(),
            status,
            body,
        })
    }
}

/// Which browser headers accompany each request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderProfile {
    /// User-Agent, Accept, Accept-Language and Connection only.
    Basic,
    /// Basic plus the `Sec-Fetch-*` family a navigating browser sends.
    /// Accept-Encoding is added by reqwest's gzip support.
    Hardened,
}

impl HeaderProfile {
    pub fn headers(&self, user_agent: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(user_agent));
        headers.insert(
            ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
            ),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.5"));
        headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));

        if *self == HeaderProfile::Hardened {
            let sec_fetch = [
                ("sec-fetch-dest", "document"),
                ("sec-fetch-mode", "navigate"),
                ("sec-fetch-site", "none"),
                ("sec-fetch-user", "?1"),
            ];
            for (name, value) in sec_fetch {
                headers.insert(HeaderName::from_static(name), HeaderValue::from_static(value));
            }
            headers.insert(UPGRADE_INSECURE_REQUESTS, HeaderValue::from_static("1"));
        }

        headers
    }
}

/// Attempt budget, delay ranges and identity handling for one fetcher.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    /// Wait between attempts on the same URL, in milliseconds.
    pub retry_delay_ms: Range<u64>,
    /// Wait before moving on to the next entry URL, in milliseconds.
    pub url_switch_delay_ms: Range<u64>,
    pub rotation: UserAgentRotation,
    pub profile: HeaderProfile,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            retry_delay_ms: 2_000..5_000,
            url_switch_delay_ms: 3_000..8_000,
            rotation: UserAgentRotation::Random,
            profile: HeaderProfile::Hardened,
        }
    }
}

/// Blocks the current thread between attempts.
pub trait Sleeper {
    fn sleep(&mut self, duration: Duration, reason: &str);
}

/// Real sleeps, with a spinner when stderr is a terminal.
pub struct ThreadSleeper {
    spinner: bool,
}

impl ThreadSleeper {
    pub fn new() -> Self {
        Self {
            spinner: std::io::stderr().is_terminal(),
        }
    }
}

impl Default for ThreadSleeper {
    fn default() -> Self {
        Self::new()
    }
}

impl Sleeper for ThreadSleeper {
    fn sleep(&mut self, duration: Duration, reason: &str) {
        if !self.spinner {
            thread::sleep(duration);
            return;
        }

        let spinner = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
            spinner.set_style(style);
        }
        spinner.set_message(format!("{} ({:.1}s)", reason, duration.as_secs_f64()));
        spinner.enable_steady_tick(Duration::from_millis(120));
        thread::sleep(duration);
        spinner.finish_and_clear();
    }
}

fn pick_delay<R: Rng + ?Sized>(rng: &mut R, range: &Range<u64>) -> Duration {
    if range.is_empty() {
        return Duration::from_millis(range.start);
    }
    Duration::from_millis(rng.gen_range(range.clone()))
}

pub struct Fetcher<T, R, S> {
    transport: T,
    rng: R,
    sleeper: S,
    policy: RetryPolicy,
}

impl<T: Transport, R: Rng, S: Sleeper> Fetcher<T, R, S> {
    pub fn new(transport: T, rng: R, sleeper: S, policy: RetryPolicy) -> Self {
        Self {
            transport,
            rng,
            sleeper,
            policy,
        }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn sleeper(&self) -> &S {
        &self.sleeper
    }

    /// Fetches `url` with the policy's attempt budget.
    pub fn fetch(&mut self, url: &str) -> Option<PageResponse> {
        let max_attempts = self.policy.max_attempts;
        self.fetch_with_attempts(url, max_attempts)
    }

    pub fn fetch_with_attempts(&mut self, url: &str, max_attempts: u32) -> Option<PageResponse> {
        let max_attempts = max_attempts.max(1);
        let mut user_agent = self.policy.rotation.initial(&mut self.rng);

        for attempt in 1..=max_attempts {
            tracing::debug!("GET {} (attempt {}/{})", url, attempt, max_attempts);

            match self.transport.get(url, self.policy.profile.headers(user_agent)) {
                Ok(response) if response.is_ok() => {
                    tracing::debug!("{} answered 200 on attempt {}", url, attempt);
                    return Some(response);
                }
                Ok(response) if response.status == 403 => {
                    tracing::warn!(
                        "{} blocked the request (HTTP 403, attempt {}/{}), rotating user agent",
                        url,
                        attempt,
                        max_attempts
                    );
                    user_agent = self.policy.rotation.next(&mut self.rng, user_agent);
                    continue;
                }
                Ok(response) => {
                    tracing::warn!(
                        "{} answered HTTP {} (attempt {}/{})",
                        url,
                        response.status,
                        attempt,
                        max_attempts
                    );
                }
                Err(e) => {
                    tracing::warn!("{} failed (attempt {}/{}): {}", url, attempt, max_attempts, e);
                }
            }

            if attempt < max_attempts {
                let delay = pick_delay(&mut self.rng, &self.policy.retry_delay_ms);
                self.sleeper.sleep(delay, "Retrying");
            }
        }

        tracing::warn!("Giving up on {} after {} attempts", url, max_attempts);
        None
    }

    /// Tries each entry URL in turn and returns the first 200 response.
    pub fn fetch_first(&mut self, urls: &[String]) -> Option<PageResponse> {
        for (index, url) in urls.iter().enumerate() {
            if index > 0 {
                let delay = pick_delay(&mut self.rng, &self.policy.url_switch_delay_ms);
                self.sleeper.sleep(delay, "Trying next entry page");
            }

            if let Some(response) = self.fetch(url) {
                return Some(response);
            }
        }

        None
    }
}
