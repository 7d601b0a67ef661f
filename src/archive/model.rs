//! HTTP Archive (HAR 1.2) document types.
//!
//! Only the fields the replay engine (or an operator reading logs) cares about
//! are modelled; everything else in a HAR file is ignored by serde. Every
//! field defaults when absent so that archives produced by different browsers
//! and extensions still decode.

use serde::{Deserialize, Serialize};

/// Top-level HAR document: `{ "log": { ... } }`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct HarDocument {
    pub log: Archive,
}

/// The recorded archive. Immutable once loaded.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Archive {
    pub version: String,
    pub creator: Creator,
    pub pages: Vec<Page>,
    pub entries: Vec<Entry>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Creator {
    pub name: String,
    pub version: String,
}

/// A captured page. The capture tooling stores the top-level URL of the
/// page in `title`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Page {
    pub started_date_time: String,
    pub id: String,
    pub title: String,
}

/// One recorded request/response exchange.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Entry {
    pub pageref: Option<String>,
    pub started_date_time: String,
    pub time: f64,
    pub request: Request,
    pub response: Response,
    #[serde(rename = "serverIPAddress")]
    pub server_ip_address: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Request {
    pub method: String,
    pub url: String,
    pub http_version: String,
    pub headers: Vec<Header>,
    pub query_string: Vec<QueryParam>,
    pub cookies: Vec<Cookie>,
    pub headers_size: i64,
    pub body_size: i64,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Response {
    pub status: u16,
    pub status_text: String,
    pub http_version: String,
    pub headers: Vec<Header>,
    pub cookies: Vec<Cookie>,
    pub content: Content,
    #[serde(rename = "redirectURL")]
    pub redirect_url: String,
    pub headers_size: i64,
    pub body_size: i64,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Header {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct QueryParam {
    pub name: String,
    pub value: String,
}

/// Cookie as recorded. Scoping attributes are kept for completeness but the
/// matcher only compares names and values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Cookie {
    pub name: String,
    pub value: String,
    pub path: Option<String>,
    pub domain: Option<String>,
    pub expires: Option<String>,
    pub http_only: Option<bool>,
    pub secure: Option<bool>,
}

/// Recorded response body.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Content {
    pub size: i64,
    pub mime_type: String,
    pub text: Option<String>,
    pub encoding: Option<String>,
}

impl Content {
    /// Recorded body text, empty when the capture carried none.
    pub fn text(&self) -> &str {
        self.text.as_deref().unwrap_or("")
    }

    pub fn has_body(&self) -> bool {
        !self.text().is_empty()
    }

    pub fn is_base64(&self) -> bool {
        self.encoding
            .as_deref()
            .is_some_and(|e| e.eq_ignore_ascii_case("base64"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
      "log": {
        "version": "1.2",
        "creator": { "name": "WebInspector", "version": "537.36" },
        "pages": [
          {
            "startedDateTime": "2023-03-01T10:00:00.000Z",
            "id": "page_1",
            "title": "https://shop.example/home",
            "pageTimings": { "onContentLoad": 120.5, "onLoad": 300.1 }
          }
        ],
        "entries": [
          {
            "_initiator": { "type": "other" },
            "pageref": "page_1",
            "startedDateTime": "2023-03-01T10:00:00.100Z",
            "time": 42.0,
            "request": {
              "method": "GET",
              "url": "https://shop.example/logo.png",
              "httpVersion": "http/2.0",
              "headers": [{ "name": "accept", "value": "image/*" }],
              "queryString": [],
              "cookies": [{ "name": "sid", "value": "abc", "httpOnly": true, "secure": true }],
              "headersSize": -1,
              "bodySize": 0
            },
            "response": {
              "status": 200,
              "statusText": "",
              "httpVersion": "http/2.0",
              "headers": [{ "name": "content-type", "value": "image/png" }],
              "cookies": [],
              "content": { "size": 5, "mimeType": "image/png", "text": "SGVsbG8=", "encoding": "base64" },
              "redirectURL": "",
              "headersSize": -1,
              "bodySize": -1
            },
            "cache": {},
            "timings": { "blocked": -1, "dns": -1, "ssl": -1, "connect": -1, "send": 0, "wait": 10.2, "receive": 0.5 },
            "serverIPAddress": "10.0.0.1"
          }
        ]
      }
    }"#;

    #[test]
    fn test_decode_chrome_har() {
        let doc: HarDocument = serde_json::from_str(SAMPLE).unwrap();
        let archive = doc.log;

        assert_eq!(archive.pages.len(), 1);
        assert_eq!(archive.pages[0].title, "https://shop.example/home");

        let entry = &archive.entries[0];
        assert_eq!(entry.request.method, "GET");
        assert_eq!(entry.request.cookies[0].name, "sid");
        assert_eq!(entry.request.cookies[0].http_only, Some(true));
        assert_eq!(entry.response.status, 200);
        assert_eq!(entry.server_ip_address.as_deref(), Some("10.0.0.1"));
        assert!(entry.response.content.is_base64());
        assert!(entry.response.content.has_body());
    }

    #[test]
    fn test_missing_fields_default() {
        let doc: HarDocument = serde_json::from_str(
            r#"{"log":{"entries":[{"request":{"method":"POST","url":"https://a.test/"},"response":{"status":204,"content":{}}}]}}"#,
        )
        .unwrap();

        assert!(doc.log.pages.is_empty());
        let content = &doc.log.entries[0].response.content;
        assert_eq!(content.text(), "");
        assert!(!content.has_body());
        assert!(!content.is_base64());
    }

    #[test]
    fn test_base64_tag_case_insensitive() {
        let content = Content {
            encoding: Some("BASE64".into()),
            ..Default::default()
        };
        assert!(content.is_base64());
    }
}
