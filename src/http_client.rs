// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

use anyhow::{Context, Result};
use moka::future::Cache;
use reqwest::header::SET_COOKIE;
use reqwest::{Client, Method};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

use crate::errors::{NetworkError, ReconError, ReconResult};

/// Realistic browser User-Agents so probes look like ordinary page loads
const BROWSER_USER_AGENTS: &[&str] = &[
    // Chrome on Windows
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    // Chrome on macOS
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    // Firefox on Windows
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:121.0) Gecko/20100101 Firefox/121.0",
];

/// Get a realistic browser User-Agent (rotates per client)
fn get_browser_user_agent() -> &'static str {
    use std::sync::atomic::{AtomicUsize, Ordering};
    static COUNTER: AtomicUsize = AtomicUsize::new(0);

    let index = COUNTER.fetch_add(1, Ordering::Relaxed) % BROWSER_USER_AGENTS.len();
    BROWSER_USER_AGENTS[index]
}

/// Bodies are read up to this many bytes (10MB); the rest is never pulled off the socket
const MAX_BODY_SIZE: usize = 10 * 1024 * 1024;

const DEFAULT_MAX_REDIRECTS: usize = 5;

/// Authentication attached to a remote API request
#[derive(Debug, Clone)]
pub enum ApiAuth {
    Basic { username: String, password: String },
    /// `Authorization: token <value>` (GitHub personal access tokens)
    Token(String),
}

/// A fully described request against a remote API
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub url: String,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub auth: Option<ApiAuth>,
    pub json: Option<serde_json::Value>,
    pub timeout: Option<Duration>,
}

impl ApiRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            query: Vec::new(),
            headers: Vec::new(),
            auth: None,
            json: None,
            timeout: None,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(Method::POST, url)
    }

    pub fn query(mut self, key: &str, value: &str) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    pub fn header(mut self, key: &str, value: &str) -> Self {
        self.headers.push((key.to_string(), value.to_string()));
        self
    }

    pub fn auth(mut self, auth: ApiAuth) -> Self {
        self.auth = Some(auth);
        self
    }

    pub fn json<T: Serialize>(mut self, body: &T) -> Self {
        self.json = serde_json::to_value(body).ok();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

#[derive(Clone)]
pub struct HttpClient {
    client: Arc<Client>,
    timeout: Duration,
    cache: Option<Arc<Cache<String, HttpResponse>>>,
    max_body_size: usize,
}

impl HttpClient {
    pub fn new(timeout_secs: u64) -> Result<Self> {
        Self::with_config(timeout_secs, None, false, DEFAULT_MAX_REDIRECTS)
    }

    pub fn with_config(
        timeout_secs: u64,
        user_agent: Option<&str>,
        accept_invalid_certs: bool,
        max_redirects: usize,
    ) -> Result<Self> {
        if accept_invalid_certs {
            tracing::warn!("Certificate validation is disabled for probe traffic");
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .danger_accept_invalid_certs(accept_invalid_certs)
            .redirect(reqwest::redirect::Policy::limited(max_redirects))
            .user_agent(user_agent.unwrap_or_else(|| get_browser_user_agent()))
            .tcp_keepalive(Duration::from_secs(60))
            .tcp_nodelay(true)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client: Arc::new(client),
            timeout: Duration::from_secs(timeout_secs),
            cache: None,
            max_body_size: MAX_BODY_SIZE,
        })
    }

    /// Enable response caching for plain GET requests
    pub fn with_cache(mut self, max_capacity: u64, ttl_secs: u64) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_capacity)
            .time_to_live(Duration::from_secs(ttl_secs))
            .build();
        self.cache = Some(Arc::new(cache));
        self
    }

    /// Lower the body cap (bytes beyond it are dropped)
    pub fn with_max_body_size(mut self, max_body_size: usize) -> Self {
        self.max_body_size = max_body_size;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Send GET request, served from cache when enabled
    pub async fn get(&self, url: &str, timeout: Duration) -> ReconResult<HttpResponse> {
        if let Some(cache) = &self.cache {
            if let Some(cached_response) = cache.get(url).await {
                debug!("Cache hit for {}", url);
                return Ok(cached_response);
            }
        }

        let response = self.request_with_method(Method::GET, url, timeout).await?;

        if let Some(cache) = &self.cache {
            cache.insert(url.to_string(), response.clone()).await;
        }

        Ok(response)
    }

    /// Send request with an arbitrary HTTP method (OPTIONS, PUT, DELETE, ...)
    pub async fn request_with_method(
        &self,
        method: Method,
        url: &str,
        timeout: Duration,
    ) -> ReconResult<HttpResponse> {
        let started = Instant::now();
        let response = self
            .client
            .request(method, url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| map_send_error(e, url, timeout))?;

        self.read_response(response, url, timeout, started).await
    }

    /// Send a remote API request. Status codes are returned, never turned into errors.
    pub async fn execute(&self, request: &ApiRequest) -> ReconResult<HttpResponse> {
        let timeout = request.timeout.unwrap_or(self.timeout);
        let mut builder = self
            .client
            .request(request.method.clone(), &request.url)
            .timeout(timeout);

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }

        for (key, value) in &request.headers {
            builder = builder.header(key, value);
        }

        builder = match &request.auth {
            Some(ApiAuth::Basic { username, password }) => {
                builder.basic_auth(username, Some(password))
            }
            Some(ApiAuth::Token(token)) => builder.header("Authorization", format!("token {}", token)),
            None => builder,
        };

        if let Some(json) = &request.json {
            builder = builder.json(json);
        }

        let started = Instant::now();
        let response = builder
            .send()
            .await
            .map_err(|e| map_send_error(e, &request.url, timeout))?;

        self.read_response(response, &request.url, timeout, started).await
    }

    async fn read_response(
        &self,
        mut response: reqwest::Response,
        url: &str,
        timeout: Duration,
        started: Instant,
    ) -> ReconResult<HttpResponse> {
        let status_code = response.status().as_u16();

        let cookies = response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .filter_map(parse_set_cookie)
            .collect::<Vec<_>>();

        let headers = {
            let headers = response.headers();
            let mut map: HashMap<String, String> = HashMap::with_capacity(headers.len());
            for (k, v) in headers.iter() {
                if let Ok(value_str) = v.to_str() {
                    map.entry(k.as_str().to_string())
                        .and_modify(|existing| {
                            existing.push_str(", ");
                            existing.push_str(value_str);
                        })
                        .or_insert_with(|| value_str.to_string());
                }
            }
            map
        };

        let mut body_bytes: Vec<u8> = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| map_body_error(e, url, timeout))?
        {
            let room = self.max_body_size - body_bytes.len();
            if chunk.len() >= room {
                body_bytes.extend_from_slice(&chunk[..room]);
                debug!(url = %url, limit = self.max_body_size, "Response body truncated");
                break;
            }
            body_bytes.extend_from_slice(&chunk);
        }
        let body = String::from_utf8_lossy(&body_bytes).into_owned();

        Ok(HttpResponse {
            status_code,
            body,
            headers,
            cookies,
            duration_ms: started.elapsed().as_millis() as u64,
        })
    }
}

fn map_send_error(err: reqwest::Error, url: &str, timeout: Duration) -> ReconError {
    if err.is_timeout() {
        ReconError::Network(NetworkError::ConnectionTimeout {
            url: url.to_string(),
            timeout,
        })
    } else {
        ReconError::from(err)
    }
}

/// A body that stops short is a failed request, never an empty page
fn map_body_error(err: reqwest::Error, url: &str, timeout: Duration) -> ReconError {
    if err.is_timeout() {
        return map_send_error(err, url, timeout);
    }
    ReconError::Network(NetworkError::BodyRead {
        url: url.to_string(),
        reason: err.to_string(),
    })
}

/// `name=value; Path=/; HttpOnly` -> (name, value)
fn parse_set_cookie(raw: &str) -> Option<(String, String)> {
    let pair = raw.split(';').next()?;
    let (name, value) = pair.split_once('=')?;
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    Some((name.to_string(), value.trim().to_string()))
}

#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status_code: u16,
    pub body: String,
    /// Lowercased header names; repeated headers joined with ", "
    pub headers: HashMap<String, String>,
    pub cookies: Vec<(String, String)>,
    pub duration_ms: u64,
}

impl HttpResponse {
    pub fn header(&self, name: &str) -> Option<String> {
        self.headers.get(&name.to_lowercase()).cloned()
    }

    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.cookies
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }
}
