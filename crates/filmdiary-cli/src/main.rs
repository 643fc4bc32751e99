mod report;

use std::io::{self, IsTerminal};
use std::process::ExitCode;

use clap::Parser;
use filmdiary_core::BrowserProfile;
use filmdiary_fetch::{FetchConfig, ReqwestHttpClient, RetryingFetcher};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "fetch-page")]
#[command(about = "Fetch a page with a browser-like session, retrying through anti-bot challenges")]
struct Cli {
    /// Page to fetch.
    url: String,
    /// Maximum number of attempts. Zero or negative makes no attempt.
    #[arg(allow_negative_numbers = true)]
    retries: i64,
    /// Browser identity to present: chrome, edge, firefox or safari.
    #[arg(long)]
    impersonate: Option<BrowserProfile>,
}

impl Cli {
    fn max_attempts(&self) -> u32 {
        u32::try_from(self.retries.max(0)).unwrap_or(u32::MAX)
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(code) => ExitCode::from(code),
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::from(report::SETUP_FAILURE)
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<u8> {
    let config = filmdiary_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .init();

    let mut fetch_config = FetchConfig::from_app_config(&config);
    if let Some(profile) = cli.impersonate {
        fetch_config.profile = profile;
    }
    let request = fetch_config.request(&cli.url, cli.max_attempts())?;
    let session = ReqwestHttpClient::new(fetch_config.timeouts.for_attempt(1).connect)?;
    let fetcher = RetryingFetcher::new(session, fetch_config);

    let result = fetcher
        .fetch_cancellable(&request, ctrl_c(), |notice| eprintln!("{notice}"))
        .await;

    let code = report::write_result(&result, &mut io::stdout().lock(), &mut io::stderr().lock())?;
    Ok(code)
}

/// Resolves on Ctrl-C. If the handler cannot be installed the fetch simply
/// runs uncancellable.
async fn ctrl_c() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %err, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
}
