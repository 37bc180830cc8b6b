//! URL rewriting subsystem.
//!
//! # Data Flow
//! ```text
//! fetched body + final URL + content type
//!     → ContentKind (html / css / script / other text / binary)
//!     → html.rs  attribute passes, inline styles, shim (shim.rs)
//!     → css.rs   url() passes
//!     → script.rs quoted http(s) literals
//!     → rewritten body, or the original body on any RewriteError
//! ```
//!
//! Every pass goes through `reference.rs`, which classifies a reference as
//! relative, absolute or protocol-relative and encodes it into `/proxy?url=`.

pub mod css;
pub mod html;
pub mod reference;
pub mod script;
pub mod shim;

use std::borrow::Cow;

use axum::body::Bytes;
use url::Url;

use crate::observability::metrics;

pub use reference::{proxy_url, ReferenceClass, PROXY_PATH};

/// Internal rewrite failure. Never surfaced to clients.
#[derive(Debug, thiserror::Error)]
pub enum RewriteError {
    #[error("payload is not valid UTF-8: {0}")]
    NotUtf8(#[from] std::str::Utf8Error),
    #[error("page URL cannot be used as a base: {0}")]
    InvalidBase(#[from] url::ParseError),
    #[error("failed to encode page URL for the shim: {0}")]
    Shim(#[from] serde_json::Error),
}

/// How a payload is treated, derived from its declared content type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    Html,
    Css,
    /// JavaScript and JSON.
    Script,
    /// Other text (plain, xml). Delivered unmodified.
    Text,
    Binary,
}

impl ContentKind {
    pub fn from_content_type(content_type: Option<&str>) -> Self {
        let ct = content_type.unwrap_or_default().to_ascii_lowercase();
        if ct.contains("text/html") {
            ContentKind::Html
        } else if ct.contains("text/css") {
            ContentKind::Css
        } else if ct.contains("javascript") || ct.contains("application/json") {
            ContentKind::Script
        } else if ct.contains("text/") || ct.contains("application/xml") {
            ContentKind::Text
        } else {
            ContentKind::Binary
        }
    }

    pub fn is_textual(self) -> bool {
        !matches!(self, ContentKind::Binary)
    }

    pub fn is_rewritable(self) -> bool {
        matches!(self, ContentKind::Html | ContentKind::Css | ContentKind::Script)
    }

    fn label(self) -> &'static str {
        match self {
            ContentKind::Html => "html",
            ContentKind::Css => "css",
            ContentKind::Script => "script",
            ContentKind::Text => "text",
            ContentKind::Binary => "binary",
        }
    }
}

/// Rewrite `content` served from `page_url`, or fail.
pub fn try_rewrite(content: &str, page_url: &str, kind: ContentKind) -> Result<String, RewriteError> {
    let page = Url::parse(page_url)?;
    let rewritten = match kind {
        ContentKind::Html => html::rewrite_html(content, &page)?,
        ContentKind::Css => css::rewrite_css(content, &page),
        ContentKind::Script => script::rewrite_script(content),
        ContentKind::Text | ContentKind::Binary => content.to_string(),
    };
    Ok(rewritten)
}

/// Best-effort rewrite of a text payload. Returns `content` unchanged on failure.
pub fn rewrite<'a>(content: &'a str, page_url: &str, content_type: Option<&str>) -> Cow<'a, str> {
    let kind = ContentKind::from_content_type(content_type);
    if !kind.is_rewritable() {
        return Cow::Borrowed(content);
    }
    match try_rewrite(content, page_url, kind) {
        Ok(rewritten) => Cow::Owned(rewritten),
        Err(e) => {
            fallback(kind, page_url, &e);
            Cow::Borrowed(content)
        }
    }
}

/// Best-effort rewrite of a fetched body. Binary and non-UTF-8 payloads pass through byte for byte.
pub fn rewrite_body(body: Bytes, page_url: &str, content_type: Option<&str>) -> Bytes {
    let kind = ContentKind::from_content_type(content_type);
    if !kind.is_rewritable() {
        return body;
    }
    let text = match std::str::from_utf8(&body) {
        Ok(text) => text,
        Err(e) => {
            fallback(kind, page_url, &RewriteError::from(e));
            return body;
        }
    };
    let rewritten = match rewrite(text, page_url, content_type) {
        Cow::Owned(rewritten) => Some(rewritten),
        Cow::Borrowed(_) => None,
    };
    rewritten.map(Bytes::from).unwrap_or(body)
}

fn fallback(kind: ContentKind, page_url: &str, error: &RewriteError) {
    tracing::warn!(url = %page_url, kind = kind.label(), error = %error, "Rewrite failed, serving original content");
    metrics::record_rewrite_fallback(kind.label());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_kind() {
        assert_eq!(
            ContentKind::from_content_type(Some("text/html; charset=utf-8")),
            ContentKind::Html
        );
        assert_eq!(ContentKind::from_content_type(Some("text/css")), ContentKind::Css);
        assert_eq!(
            ContentKind::from_content_type(Some("application/javascript")),
            ContentKind::Script
        );
        assert_eq!(
            ContentKind::from_content_type(Some("text/javascript")),
            ContentKind::Script
        );
        assert_eq!(
            ContentKind::from_content_type(Some("application/json")),
            ContentKind::Script
        );
        assert_eq!(ContentKind::from_content_type(Some("text/plain")), ContentKind::Text);
        assert_eq!(
            ContentKind::from_content_type(Some("application/xml")),
            ContentKind::Text
        );
        assert_eq!(ContentKind::from_content_type(Some("image/png")), ContentKind::Binary);
        assert_eq!(ContentKind::from_content_type(None), ContentKind::Binary);
    }

    #[test]
    fn test_invalid_base_falls_back() {
        let html = r#"<a href="/a">"#;
        assert_eq!(rewrite(html, "not a url", Some("text/html")), html);
    }

    #[test]
    fn test_binary_body_untouched() {
        let png = Bytes::from_static(&[0x89, b'P', b'N', b'G', 0x00, 0xff, b'"', b'h']);
        let out = rewrite_body(png.clone(), "https://x.com/i.png", Some("image/png"));
        assert_eq!(out, png);
    }

    #[test]
    fn test_non_utf8_html_untouched() {
        let body = Bytes::from_static(b"<a href=\"/a\">\xff\xfe</a>");
        let out = rewrite_body(body.clone(), "https://x.com/", Some("text/html"));
        assert_eq!(out, body);
    }

    #[test]
    fn test_plain_text_untouched() {
        let body = Bytes::from_static(b"see href=\"/a\"");
        let out = rewrite_body(body.clone(), "https://x.com/", Some("text/plain"));
        assert_eq!(out, body);
    }

    #[test]
    fn test_css_body() {
        let out = rewrite_body(
            Bytes::from_static(b"a{b:url(../img.png)}"),
            "https://x.com/css/s.css",
            Some("text/css"),
        );
        assert_eq!(
            &out[..],
            b"a{b:url(/proxy?url=https%3A%2F%2Fx.com%2Fimg.png)}"
        );
    }
}
