//! The retry loop: attempt, classify, back off, repeat.
//!
//! Attempts are strictly sequential. Retrying a blocked or rate-limited
//! target in parallel only deepens the block, so the loop never has more than
//! one request in flight and never starts attempt `n + 1` before the backoff
//! after attempt `n` has elapsed.

use std::future::Future;

use crate::client::{AttemptRequest, HttpClient, Sleeper, TokioSleeper};
use crate::config::FetchConfig;
use crate::types::{
    AttemptOutcome, FetchRequest, FetchResult, HttpResponse, RetryNotice, TransportError,
};

pub struct RetryingFetcher<C, S = TokioSleeper> {
    client: C,
    sleeper: S,
    config: FetchConfig,
}

impl<C: HttpClient> RetryingFetcher<C> {
    /// Creates a fetcher that sleeps on the tokio timer between attempts.
    pub fn new(client: C, config: FetchConfig) -> Self {
        Self::with_sleeper(client, TokioSleeper, config)
    }
}

impl<C: HttpClient, S: Sleeper> RetryingFetcher<C, S> {
    pub fn with_sleeper(client: C, sleeper: S, config: FetchConfig) -> Self {
        Self {
            client,
            sleeper,
            config,
        }
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn sleeper(&self) -> &S {
        &self.sleeper
    }

    /// Runs up to `request.max_attempts` attempts and returns the terminal
    /// result. Retryable conditions never escape; only the outcome of the
    /// final attempt (or the first success) does.
    pub async fn fetch(&self, request: &FetchRequest) -> FetchResult {
        self.fetch_cancellable(request, std::future::pending::<()>(), |_| {})
            .await
    }

    /// [`RetryingFetcher::fetch`] with a cancellation signal and a progress
    /// observer.
    ///
    /// When `cancel` resolves, the in-flight request or pending backoff is
    /// dropped and [`FetchResult::Cancelled`] is returned. `on_retry` is called
    /// once per non-final failed attempt, before the backoff sleep starts.
    pub async fn fetch_cancellable<F, N>(
        &self,
        request: &FetchRequest,
        cancel: F,
        mut on_retry: N,
    ) -> FetchResult
    where
        F: Future<Output = ()>,
        N: FnMut(&RetryNotice),
    {
        let url = request.url.as_str();
        let max_attempts = request.max_attempts;
        tokio::pin!(cancel);

        for attempt in 1..=max_attempts {
            let attempt_request = AttemptRequest {
                url,
                headers: &request.headers,
                profile: request.profile,
                timeouts: self.config.timeouts.for_attempt(attempt),
                attempt,
            };

            let result = tokio::select! {
                biased;
                () = &mut cancel => return cancelled(url, attempt),
                result = self.client.get(attempt_request) => result,
            };

            let outcome = self.classify(result);
            if let AttemptOutcome::Success { body } = outcome {
                tracing::info!(url, attempt, bytes = body.len(), "fetch succeeded");
                return FetchResult::Ok { body };
            }

            if attempt == max_attempts {
                return terminal_result(url, attempt, outcome);
            }

            let is_block_retry = matches!(outcome, AttemptOutcome::BlockedRetryable { .. });
            let delay = self.config.backoff.delay(attempt, is_block_retry);
            let notice = RetryNotice {
                attempt,
                reason: outcome.reason(),
                delay,
            };
            tracing::debug!(
                url,
                attempt,
                max_attempts,
                delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                reason = %notice.reason,
                outcome = ?outcome,
                "fetch attempt failed, retrying after backoff"
            );
            on_retry(&notice);

            tokio::select! {
                biased;
                () = &mut cancel => return cancelled(url, attempt),
                () = self.sleeper.sleep(delay) => {}
            }
        }

        tracing::info!(url, max_attempts, "fetch loop ended without an outcome");
        FetchResult::ExhaustedNoOutcome {
            url: url.to_owned(),
        }
    }

    /// Classifies one attempt's result. Only status 200 counts as success.
    pub fn classify(&self, result: Result<HttpResponse, TransportError>) -> AttemptOutcome {
        match result {
            Err(err) => AttemptOutcome::TransportError(err),
            Ok(response) if response.status == 200 => AttemptOutcome::Success {
                body: response.body,
            },
            Ok(response) => match self.config.detector.classify(&response) {
                Some(reason) => AttemptOutcome::BlockedRetryable {
                    status_code: response.status,
                    reason: reason.as_str().to_owned(),
                },
                None => AttemptOutcome::HttpErrorRetryable {
                    status_code: response.status,
                },
            },
        }
    }
}

fn cancelled(url: &str, attempt: u32) -> FetchResult {
    tracing::info!(url, attempt, "fetch cancelled");
    FetchResult::Cancelled {
        url: url.to_owned(),
    }
}

/// Converts the final attempt's failure into the caller-facing result.
fn terminal_result(url: &str, attempt: u32, outcome: AttemptOutcome) -> FetchResult {
    let url = url.to_owned();
    match outcome {
        AttemptOutcome::Success { body } => FetchResult::Ok { body },
        AttemptOutcome::BlockedRetryable {
            status_code,
            reason,
        } => {
            tracing::info!(
                %url,
                attempt,
                status = status_code,
                %reason,
                "blocked by anti-bot mitigation"
            );
            FetchResult::CloudflareBlocked { url, status_code }
        }
        AttemptOutcome::HttpErrorRetryable { status_code } => {
            tracing::info!(%url, attempt, status = status_code, "HTTP error on final attempt");
            FetchResult::HttpError { url, status_code }
        }
        AttemptOutcome::TransportError(err) => {
            tracing::info!(%url, attempt, error = %err, "transport failure on final attempt");
            FetchResult::NetworkError {
                url,
                error_kind: err.kind,
                message: err.message,
            }
        }
    }
}

#[cfg(test)]
#[path = "fetcher_test.rs"]
mod tests;
