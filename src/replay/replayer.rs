//! Response reconstruction from a recorded entry.
//!
//! # Design Decisions
//! - Status forwarded verbatim, redirects included; an unrepresentable
//!   status (HAR records `0` for aborted requests) is sent as 200
//! - Headers pass an allow-list; length and encoding headers describe the
//!   original wire body and are never forwarded
//! - base64 bodies are decoded before they are written

use axum::http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use base64::{engine::general_purpose, Engine as _};
use thiserror::Error;

use crate::archive::model::Entry;

/// Recorded response headers that are replayed. Compared case-insensitively.
pub const FORWARDED_HEADERS: [&str; 5] = [
    "accept-ranges",
    "content-type",
    "vary",
    "location",
    "set-cookie",
];

/// Data-integrity faults in a recorded entry.
#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("recorded body is not valid base64: {0}")]
    InvalidBase64(#[from] base64::DecodeError),
}

/// A response rebuilt from the archive.
#[derive(Debug, Clone)]
pub struct ReplayedResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

/// Rebuild the recorded response of `entry`.
pub fn replay(entry: &Entry) -> Result<ReplayedResponse, ReplayError> {
    let recorded = &entry.response;

    let status = StatusCode::from_u16(recorded.status).unwrap_or_else(|_| {
        tracing::warn!(
            url = %entry.request.url,
            status = recorded.status,
            "Recorded status is not a valid HTTP status, replaying as 200"
        );
        StatusCode::OK
    });

    let mut headers = HeaderMap::new();
    for header in &recorded.headers {
        if !is_forwarded(&header.name) {
            continue;
        }
        match (
            HeaderName::from_bytes(header.name.as_bytes()),
            HeaderValue::from_bytes(header.value.as_bytes()),
        ) {
            (Ok(name), Ok(value)) => {
                headers.append(name, value);
            }
            _ => {
                tracing::warn!(
                    url = %entry.request.url,
                    header = %header.name,
                    "Skipping unrepresentable recorded header"
                );
            }
        }
    }

    let body = if recorded.content.is_base64() {
        general_purpose::STANDARD.decode(recorded.content.text())?
    } else {
        recorded.content.text().as_bytes().to_vec()
    };

    Ok(ReplayedResponse {
        status,
        headers,
        body,
    })
}

fn is_forwarded(name: &str) -> bool {
    FORWARDED_HEADERS
        .iter()
        .any(|allowed| allowed.eq_ignore_ascii_case(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::model::{Content, Header, Response};

    fn entry(status: u16, headers: &[(&str, &str)], content: Content) -> Entry {
        Entry {
            response: Response {
                status,
                headers: headers
                    .iter()
                    .map(|(n, v)| Header {
                        name: (*n).into(),
                        value: (*v).into(),
                    })
                    .collect(),
                content,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn text(body: &str) -> Content {
        Content {
            text: Some(body.into()),
            ..Default::default()
        }
    }

    #[test]
    fn test_base64_body_decoded() {
        let content = Content {
            text: Some("SGVsbG8=".into()),
            encoding: Some("base64".into()),
            ..Default::default()
        };
        let replayed = replay(&entry(200, &[], content)).unwrap();
        assert_eq!(replayed.body, b"Hello");
    }

    #[test]
    fn test_plain_body_verbatim() {
        let replayed = replay(&entry(200, &[], text("SGVsbG8="))).unwrap();
        assert_eq!(replayed.body, b"SGVsbG8=");

        let replayed = replay(&entry(204, &[], Content::default())).unwrap();
        assert!(replayed.body.is_empty());
        assert_eq!(replayed.status, StatusCode::NO_CONTENT);
    }

    #[test]
    fn test_invalid_base64_is_error() {
        let content = Content {
            text: Some("not base64!".into()),
            encoding: Some("base64".into()),
            ..Default::default()
        };
        assert!(matches!(
            replay(&entry(200, &[], content)),
            Err(ReplayError::InvalidBase64(_))
        ));
    }

    #[test]
    fn test_aborted_capture_replays_as_ok() {
        let replayed = replay(&entry(0, &[("content-type", "text/plain")], text(""))).unwrap();
        assert_eq!(replayed.status, StatusCode::OK);
        assert_eq!(replayed.headers.get("content-type").unwrap(), "text/plain");
        assert!(replayed.body.is_empty());
    }

    #[test]
    fn test_non_ascii_header_forwarded() {
        let replayed = replay(&entry(
            200,
            &[("Set-Cookie", "city=Zürich; Path=/"), ("Content-Type", "text/plain")],
            text("hi"),
        ))
        .unwrap();

        let cookie = replayed.headers.get("set-cookie").unwrap();
        assert_eq!(cookie.as_bytes(), "city=Zürich; Path=/".as_bytes());
        assert_eq!(replayed.headers.len(), 2);
    }

    #[test]
    fn test_header_allow_list() {
        let replayed = replay(&entry(
            302,
            &[
                ("Content-Type", "text/html"),
                ("Content-Length", "999"),
                ("Content-Encoding", "gzip"),
                ("Location", "/next"),
                ("Vary", "Accept-Encoding"),
                ("Accept-Ranges", "bytes"),
                ("Server", "nginx"),
                ("set-cookie", "a=1; Path=/"),
                ("Set-Cookie", "b=2; Path=/"),
            ],
            text("moved"),
        ))
        .unwrap();

        assert_eq!(replayed.status, StatusCode::FOUND);
        assert_eq!(replayed.headers.get("content-type").unwrap(), "text/html");
        assert_eq!(replayed.headers.get("location").unwrap(), "/next");
        assert_eq!(replayed.headers.get("vary").unwrap(), "Accept-Encoding");
        assert_eq!(replayed.headers.get("accept-ranges").unwrap(), "bytes");
        assert!(replayed.headers.get("content-length").is_none());
        assert!(replayed.headers.get("content-encoding").is_none());
        assert!(replayed.headers.get("server").is_none());

        let cookies: Vec<_> = replayed.headers.get_all("set-cookie").iter().collect();
        assert_eq!(cookies.len(), 2);
    }

    #[test]
    fn test_unrepresentable_header_skipped() {
        let replayed = replay(&entry(200, &[("content-type", "text/plain\n")], text("hi"))).unwrap();
        assert!(replayed.headers.is_empty());
        assert_eq!(replayed.body, b"hi");
    }
}
