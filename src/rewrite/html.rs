//! HTML rewriting.
//!
//! # Passes
//! 1. `src|href|action|data-src|data-href` attributes, once per reference class
//!    (relative, then absolute, then protocol-relative)
//! 2. `url(...)` inside `style` attributes and `<style>` elements
//! 3. shim injection before `</head>`
//!
//! References the patterns cannot parse are left as they are.

use std::sync::LazyLock;

use regex::{Captures, Regex};
use url::Url;

use crate::rewrite::css;
use crate::rewrite::reference::ReferenceClass;
use crate::rewrite::{shim, RewriteError};

static URL_ATTRIBUTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\b(data-src|data-href|src|href|action)\s*=\s*(?:"([^"]*)"|'([^']*)')"#)
        .expect("valid attribute pattern")
});

static STYLE_ATTRIBUTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\b(style)\s*=\s*(?:"([^"]*)"|'([^']*)')"#).expect("valid style pattern")
});

static STYLE_ELEMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)(<style\b[^>]*>)(.*?)(</style\s*>)").expect("valid style element pattern")
});

static HEAD_CLOSE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)</head\s*>").expect("valid head pattern"));

static HEAD_OPEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<head\b[^>]*>").expect("valid head open pattern"));

static HTML_OPEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<html\b[^>]*>").expect("valid html pattern"));

/// Rewrite a whole document and inject the shim.
pub fn rewrite_html(html: &str, page: &Url) -> Result<String, RewriteError> {
    let rewritten = ReferenceClass::PASSES
        .iter()
        .fold(html.to_string(), |acc, class| rewrite_attributes(&acc, page, *class));
    let rewritten = rewrite_inline_styles(&rewritten, page);
    inject_shim(&rewritten, page)
}

/// One pass over the URL-bearing attributes, touching only values of `class`.
pub fn rewrite_attributes(html: &str, page: &Url, class: ReferenceClass) -> String {
    URL_ATTRIBUTE
        .replace_all(html, |caps: &Captures| {
            let raw = caps
                .get(2)
                .or_else(|| caps.get(3))
                .map_or("", |m| m.as_str());
            let value = raw.replace("&amp;", "&");
            match class.rewrite(&value, page) {
                Some(proxied) => format!(r#"{}="{}""#, &caps[1], proxied),
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}

/// Rewrite `url()` references in `style="..."` attributes and `<style>` blocks.
pub fn rewrite_inline_styles(html: &str, page: &Url) -> String {
    let with_attributes = STYLE_ATTRIBUTE.replace_all(html, |caps: &Captures| {
        let (quote, value) = match (caps.get(2), caps.get(3)) {
            (Some(v), _) => ('"', v.as_str()),
            (_, Some(v)) => ('\'', v.as_str()),
            _ => return caps[0].to_string(),
        };
        if !value.to_ascii_lowercase().contains("url(") {
            return caps[0].to_string();
        }
        format!(
            "{}={quote}{}{quote}",
            &caps[1],
            css::rewrite_css(value, page)
        )
    });

    STYLE_ELEMENT
        .replace_all(&with_attributes, |caps: &Captures| {
            format!(
                "{}{}{}",
                &caps[1],
                css::rewrite_css(&caps[2], page),
                &caps[3]
            )
        })
        .into_owned()
}

/// Insert the shim before `</head>`, after an unclosed `<head>`, or into a
/// synthesized head when there is none.
pub fn inject_shim(html: &str, page: &Url) -> Result<String, RewriteError> {
    let shim = shim::render(page)?;

    if let Some(head_close) = HEAD_CLOSE.find(html) {
        let mut out = String::with_capacity(html.len() + shim.len());
        out.push_str(&html[..head_close.start()]);
        out.push_str(&shim);
        out.push_str(&html[head_close.start()..]);
        return Ok(out);
    }

    if let Some(head_open) = HEAD_OPEN.find(html) {
        let mut out = String::with_capacity(html.len() + shim.len());
        out.push_str(&html[..head_open.end()]);
        out.push_str(&shim);
        out.push_str(&html[head_open.end()..]);
        return Ok(out);
    }

    if let Some(html_open) = HTML_OPEN.find(html) {
        let mut out = String::with_capacity(html.len() + shim.len() + 13);
        out.push_str(&html[..html_open.end()]);
        out.push_str("<head>");
        out.push_str(&shim);
        out.push_str("</head>");
        out.push_str(&html[html_open.end()..]);
        return Ok(out);
    }

    Ok(format!("{}{}", shim, html))
}
