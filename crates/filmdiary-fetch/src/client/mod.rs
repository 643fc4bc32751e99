//! Transport capabilities consumed by the retry loop.
//!
//! [`HttpClient`] issues exactly one GET per call and reports either a
//! response or a classified [`TransportError`]; it never retries.
//! [`Sleeper`] suspends between attempts. Both are traits so the loop can be
//! driven by stubs in tests.

mod classify;
mod reqwest_client;

use std::future::Future;
use std::time::Duration;

use filmdiary_core::BrowserProfile;
use reqwest::header::HeaderMap;

use crate::config::AttemptTimeouts;
use crate::types::{HttpResponse, TransportError};

pub use classify::classify_reqwest_error;
pub use reqwest_client::ReqwestHttpClient;

/// Everything one attempt needs to put on the wire.
#[derive(Debug, Clone, Copy)]
pub struct AttemptRequest<'a> {
    pub url: &'a str,
    pub headers: &'a HeaderMap,
    pub profile: BrowserProfile,
    pub timeouts: AttemptTimeouts,
    /// 1-based attempt number, for logging.
    pub attempt: u32,
}

pub trait HttpClient {
    /// Issues one GET request.
    ///
    /// Any response that arrives, whatever its status, is `Ok`; only failures
    /// to obtain a complete response are `Err`.
    fn get(
        &self,
        request: AttemptRequest<'_>,
    ) -> impl Future<Output = Result<HttpResponse, TransportError>> + Send;
}

pub trait Sleeper {
    fn sleep(&self, delay: Duration) -> impl Future<Output = ()> + Send;
}

/// Suspends on the tokio timer, yielding the executor.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

impl Sleeper for TokioSleeper {
    async fn sleep(&self, delay: Duration) {
        tokio::time::sleep(delay).await;
    }
}
