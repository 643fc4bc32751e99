//! Terminal `FetchResult` to process output and exit status.

use std::io::{self, Write};

use filmdiary_fetch::FetchResult;

pub const SUCCESS: u8 = 0;
pub const SETUP_FAILURE: u8 = 1;
pub const CLOUDFLARE_BLOCK: u8 = 86;
pub const HTTP_ERROR: u8 = 87;
pub const NETWORK_ERROR: u8 = 88;
pub const FAILED: u8 = 89;
pub const CANCELLED: u8 = 130;

/// Writes the page body to `out`, or a one-line failure summary to `err`, and
/// returns the exit status for `result`.
pub fn write_result(
    result: &FetchResult,
    out: &mut impl Write,
    err: &mut impl Write,
) -> io::Result<u8> {
    let code = match result {
        FetchResult::Ok { body } => {
            out.write_all(body.as_bytes())?;
            out.flush()?;
            return Ok(SUCCESS);
        }
        FetchResult::CloudflareBlocked { url, status_code } => {
            writeln!(err, "CLOUDFLARE_BLOCK {url} HTTP {status_code}")?;
            CLOUDFLARE_BLOCK
        }
        FetchResult::HttpError { url, status_code } => {
            writeln!(err, "HTTP_ERROR {url} HTTP {status_code}")?;
            HTTP_ERROR
        }
        FetchResult::NetworkError {
            url,
            error_kind,
            message,
        } => {
            writeln!(err, "NETWORK_ERROR {url} {error_kind}: {message}")?;
            NETWORK_ERROR
        }
        FetchResult::ExhaustedNoOutcome { url } => {
            writeln!(err, "FAILED {url}")?;
            FAILED
        }
        FetchResult::Cancelled { url } => {
            writeln!(err, "CANCELLED {url}")?;
            CANCELLED
        }
    };
    err.flush()?;
    Ok(code)
}

#[cfg(test)]
mod tests {
    use filmdiary_fetch::ErrorKind;

    use super::*;

    const URL: &str = "https://letterboxd.com/someone/films/diary/";

    fn render(result: &FetchResult) -> (u8, String, String) {
        let mut out = Vec::new();
        let mut err = Vec::new();
        let code = write_result(result, &mut out, &mut err).unwrap();
        (
            code,
            String::from_utf8(out).unwrap(),
            String::from_utf8(err).unwrap(),
        )
    }

    #[test]
    fn success_writes_body_verbatim() {
        let (code, out, err) = render(&FetchResult::Ok {
            body: "<html>\n  diary\n</html>".to_owned(),
        });
        assert_eq!(code, 0);
        assert_eq!(out, "<html>\n  diary\n</html>");
        assert!(err.is_empty());
    }

    #[test]
    fn failures_map_to_summary_lines_and_exit_codes() {
        let url = URL.to_owned();
        let cases = [
            (
                FetchResult::CloudflareBlocked {
                    url: url.clone(),
                    status_code: 429,
                },
                86,
                format!("CLOUDFLARE_BLOCK {URL} HTTP 429\n"),
            ),
            (
                FetchResult::HttpError {
                    url: url.clone(),
                    status_code: 500,
                },
                87,
                format!("HTTP_ERROR {URL} HTTP 500\n"),
            ),
            (
                FetchResult::NetworkError {
                    url: url.clone(),
                    error_kind: ErrorKind::Timeout,
                    message: "operation timed out".to_owned(),
                },
                88,
                format!("NETWORK_ERROR {URL} Timeout: operation timed out\n"),
            ),
            (
                FetchResult::ExhaustedNoOutcome { url: url.clone() },
                89,
                format!("FAILED {URL}\n"),
            ),
            (
                FetchResult::Cancelled { url },
                130,
                format!("CANCELLED {URL}\n"),
            ),
        ];

        for (result, expected_code, expected_line) in cases {
            let (code, out, err) = render(&result);
            assert_eq!(code, expected_code, "{result:?}");
            assert!(out.is_empty(), "stdout must stay empty for {result:?}");
            assert_eq!(err, expected_line);
        }
    }
}
