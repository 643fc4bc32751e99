//! Map `reqwest` failures onto the finite [`ErrorKind`] set.

use std::error::Error as _;

use crate::types::{ErrorKind, TransportError};

/// Classifies a `reqwest` error and renders its full cause chain as the
/// message.
#[must_use]
pub fn classify_reqwest_error(err: &reqwest::Error) -> TransportError {
    let kind = if err.is_timeout() {
        ErrorKind::Timeout
    } else if mentions_tls(&source_chain(err)) {
        ErrorKind::TlsError
    } else if err.is_connect() || err.is_request() {
        ErrorKind::ConnectionFailed
    } else {
        ErrorKind::Other
    };
    TransportError::new(kind, error_chain(err))
}

/// `reqwest` reports TLS handshake failures as connect errors; the only
/// distinguishing evidence is in the text of the underlying causes. The
/// top-level message embeds the request URL and is never inspected.
fn mentions_tls(message: &str) -> bool {
    let lower = message.to_ascii_lowercase();
    ["tls", "certificate", "handshake", "ssl"]
        .iter()
        .any(|marker| lower.contains(marker))
}

fn source_chain(err: &reqwest::Error) -> String {
    let mut text = String::new();
    let mut source = err.source();
    while let Some(cause) = source {
        text.push_str(&cause.to_string());
        text.push('\n');
        source = cause.source();
    }
    text
}

fn error_chain(err: &reqwest::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tls_markers_are_case_insensitive() {
        assert!(mentions_tls("invalid peer certificate: UnknownIssuer"));
        assert!(mentions_tls("TLS handshake eof"));
        assert!(!mentions_tls("dns error: failed to lookup address"));
    }

    #[tokio::test]
    async fn refused_connection_is_connection_failed() {
        let err = reqwest::Client::new()
            .get("http://127.0.0.1:1/")
            .send()
            .await
            .unwrap_err();
        let classified = classify_reqwest_error(&err);
        assert_eq!(classified.kind, ErrorKind::ConnectionFailed, "{classified}");
        assert!(!classified.message.is_empty());
    }

    #[tokio::test]
    async fn tls_words_in_url_do_not_make_refusal_a_tls_error() {
        let err = reqwest::Client::new()
            .get("http://127.0.0.1:1/handshake/tls-settings")
            .send()
            .await
            .unwrap_err();
        let classified = classify_reqwest_error(&err);
        assert_eq!(classified.kind, ErrorKind::ConnectionFailed, "{classified}");
        assert!(classified.message.contains("tls-settings"));
    }

    #[tokio::test]
    async fn unparseable_url_is_other() {
        let err = reqwest::Client::new()
            .get("not a url")
            .send()
            .await
            .unwrap_err();
        assert_eq!(classify_reqwest_error(&err).kind, ErrorKind::Other);
    }
}
