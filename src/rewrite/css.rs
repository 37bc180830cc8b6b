//! Stylesheet rewriting: `url(...)` tokens.

use std::sync::LazyLock;

use regex::{Captures, Regex};
use url::Url;

use crate::rewrite::reference::ReferenceClass;

/// `url( "x" )`, `url('x')` or `url(x)`; group 1/2/3 hold the value per quote style.
static CSS_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)url\(\s*(?:"([^"]*)"|'([^']*)'|([^'"\)\s][^'"\)]*?))\s*\)"#)
        .expect("valid css url pattern")
});

/// Apply the relative, absolute and protocol-relative passes in order.
pub fn rewrite_css(css: &str, page: &Url) -> String {
    ReferenceClass::PASSES
        .iter()
        .fold(css.to_string(), |acc, class| rewrite_pass(&acc, page, *class))
}

/// One pass over `css`, rewriting only `url()` values of `class`.
pub fn rewrite_pass(css: &str, page: &Url, class: ReferenceClass) -> String {
    CSS_URL
        .replace_all(css, |caps: &Captures| {
            let (quote, value) = match (caps.get(1), caps.get(2), caps.get(3)) {
                (Some(v), _, _) => ("\"", v.as_str()),
                (_, Some(v), _) => ("'", v.as_str()),
                (_, _, Some(v)) => ("", v.as_str()),
                _ => return caps[0].to_string(),
            };
            match class.rewrite(value, page) {
                Some(proxied) => format!("url({quote}{proxied}{quote})"),
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}
