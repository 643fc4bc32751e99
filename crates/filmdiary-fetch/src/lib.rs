pub mod backoff;
pub mod block;
pub mod client;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod types;

pub use backoff::{BackoffCurve, BackoffPolicy};
pub use block::{BlockDetector, BlockReason};
pub use client::{AttemptRequest, HttpClient, ReqwestHttpClient, Sleeper, TokioSleeper};
pub use config::{AttemptTimeouts, FetchConfig, TimeoutSchedule};
pub use error::FetchError;
pub use fetcher::RetryingFetcher;
pub use types::{
    AttemptOutcome, ErrorKind, FetchRequest, FetchResult, HttpResponse, RetryNotice,
    TransportError,
};
