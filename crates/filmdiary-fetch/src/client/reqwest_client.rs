//! `reqwest`-backed [`HttpClient`] with a persistent session.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use reqwest::cookie::Jar;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, USER_AGENT};
use reqwest::Client;

use super::classify::classify_reqwest_error;
use super::{AttemptRequest, HttpClient};
use crate::error::FetchError;
use crate::types::{HttpResponse, TransportError};

/// HTTP session reused across attempts and fetches.
///
/// Cookies (including challenge-clearance cookies) live in a shared jar, so a
/// later attempt presents whatever the mitigation layer handed out earlier.
/// `reqwest` fixes the connect timeout per client, so one client is kept per
/// distinct connect timeout. Attempt `n` of every fetch reuses the same
/// client, and its connection pool, as attempt `n` of the previous fetch.
///
/// Safe for sequential reuse; concurrent fetches through one instance work
/// but share cookies.
pub struct ReqwestHttpClient {
    jar: Arc<Jar>,
    clients: Mutex<HashMap<Duration, Client>>,
}

impl ReqwestHttpClient {
    /// Creates a session and eagerly builds the client for `connect_timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed (e.g., TLS backend initialisation failure).
    pub fn new(connect_timeout: Duration) -> Result<Self, FetchError> {
        let jar = Arc::new(Jar::default());
        let client = build_client(&jar, connect_timeout)?;
        Ok(Self {
            jar,
            clients: Mutex::new(HashMap::from([(connect_timeout, client)])),
        })
    }

    fn client_for(&self, connect_timeout: Duration) -> Result<Client, reqwest::Error> {
        let mut clients = self.clients.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(client) = clients.get(&connect_timeout) {
            return Ok(client.clone());
        }
        tracing::debug!(
            connect_timeout_secs = connect_timeout.as_secs(),
            "building HTTP client for new connect timeout"
        );
        let client = build_client(&self.jar, connect_timeout)?;
        clients.insert(connect_timeout, client.clone());
        Ok(client)
    }

    #[cfg(test)]
    fn cached_clients(&self) -> usize {
        self.clients
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

fn build_client(jar: &Arc<Jar>, connect_timeout: Duration) -> Result<Client, reqwest::Error> {
    Client::builder()
        .cookie_provider(Arc::clone(jar))
        .connect_timeout(connect_timeout)
        .gzip(true)
        .brotli(true)
        .deflate(true)
        .build()
}

/// Profile identity headers first, then the request's own headers, which win
/// on conflict.
fn attempt_headers(request: &AttemptRequest<'_>) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        USER_AGENT,
        HeaderValue::from_static(request.profile.user_agent()),
    );
    for (name, value) in request.profile.identity_headers() {
        headers.insert(
            HeaderName::from_static(name),
            HeaderValue::from_static(value),
        );
    }
    for (name, value) in request.headers {
        headers.insert(name.clone(), value.clone());
    }
    headers
}

impl HttpClient for ReqwestHttpClient {
    async fn get(&self, request: AttemptRequest<'_>) -> Result<HttpResponse, TransportError> {
        let client = self
            .client_for(request.timeouts.connect)
            .map_err(|e| classify_reqwest_error(&e))?;

        tracing::debug!(
            attempt = request.attempt,
            url = request.url,
            profile = %request.profile,
            total_timeout_secs = request.timeouts.total.as_secs(),
            "sending GET"
        );
        let response = client
            .get(request.url)
            .headers(attempt_headers(&request))
            .timeout(request.timeouts.total)
            .send()
            .await
            .map_err(|e| classify_reqwest_error(&e))?;

        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let body = response
            .text()
            .await
            .map_err(|e| classify_reqwest_error(&e))?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}
