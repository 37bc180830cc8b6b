//! Script and JSON rewriting.
//!
//! Only quoted string literals consisting entirely of an http(s) URL are
//! touched; anything else in code is left alone.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::rewrite::reference::proxy_url;

static URL_LITERAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""(https?://[^"'`\s]+)"|'(https?://[^"'`\s]+)'|`(https?://[^"'`\s]+)`"#)
        .expect("valid string literal pattern")
});

pub fn rewrite_script(source: &str) -> String {
    URL_LITERAL
        .replace_all(source, |caps: &Captures| {
            let (quote, url) = match (caps.get(1), caps.get(2), caps.get(3)) {
                (Some(v), _, _) => ('"', v.as_str()),
                (_, Some(v), _) => ('\'', v.as_str()),
                (_, _, Some(v)) => ('`', v.as_str()),
                _ => return caps[0].to_string(),
            };
            // template interpolation
            if quote == '`' && url.contains("${") {
                return caps[0].to_string();
            }
            format!("{quote}{}{quote}", proxy_url(url))
        })
        .into_owned()
}
