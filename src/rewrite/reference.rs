//! Reference classes and the resolve-and-encode step shared by every pass.

use url::Url;

/// Path prefix that routes a request back through the proxy.
pub const PROXY_PATH: &str = "/proxy?url=";

/// Proxy path for an absolute URL.
pub fn proxy_url(absolute: &str) -> String {
    format!("{}{}", PROXY_PATH, urlencoding::encode(absolute))
}

/// The URL pattern a single rewrite pass targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceClass {
    /// `img/a.png`, `/a/b`, `../c.css`, `?page=2`
    Relative,
    /// `http://...` or `https://...`
    Absolute,
    /// `//cdn.example.com/...`
    ProtocolRelative,
}

impl ReferenceClass {
    /// Order in which passes run over a buffer.
    pub const PASSES: [ReferenceClass; 3] = [
        ReferenceClass::Relative,
        ReferenceClass::Absolute,
        ReferenceClass::ProtocolRelative,
    ];

    /// Classify a raw reference. `None` means the reference must be left alone
    /// (fragments and non-http schemes such as `data:`, `javascript:`, `mailto:`).
    pub fn classify(value: &str) -> Option<Self> {
        let value = value.trim();
        let lower = value.to_ascii_lowercase();

        if lower.starts_with("http://") || lower.starts_with("https://") {
            Some(ReferenceClass::Absolute)
        } else if value.starts_with("//") {
            Some(ReferenceClass::ProtocolRelative)
        } else if value.starts_with('#') || has_scheme(&lower) {
            None
        } else {
            Some(ReferenceClass::Relative)
        }
    }

    /// Absolute form of `value`, which must belong to this class.
    pub fn resolve(self, value: &str, page: &Url) -> Option<String> {
        let value = value.trim();
        match self {
            ReferenceClass::Relative => page.join(value).ok().map(String::from),
            ReferenceClass::Absolute => Some(value.to_string()),
            ReferenceClass::ProtocolRelative => Some(format!("{}:{}", page.scheme(), value)),
        }
    }

    /// Proxy path for `value` if it belongs to this class.
    pub fn rewrite(self, value: &str, page: &Url) -> Option<String> {
        if Self::classify(value) != Some(self) {
            return None;
        }
        self.resolve(value, page).map(|absolute| proxy_url(&absolute))
    }
}

/// RFC 3986 scheme: ALPHA *( ALPHA / DIGIT / "+" / "-" / "." ) ":"
fn has_scheme(lower: &str) -> bool {
    let Some(idx) = lower.find(':') else {
        return false;
    };
    let scheme = &lower[..idx];
    scheme.starts_with(|c: char| c.is_ascii_alphabetic())
        && scheme
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page() -> Url {
        Url::parse("https://x.com/dir/page.html").unwrap()
    }

    #[test]
    fn test_classify() {
        assert_eq!(ReferenceClass::classify("/a/b"), Some(ReferenceClass::Relative));
        assert_eq!(ReferenceClass::classify("img.png"), Some(ReferenceClass::Relative));
        assert_eq!(ReferenceClass::classify("../up"), Some(ReferenceClass::Relative));
        assert_eq!(
            ReferenceClass::classify("HTTPS://x.com"),
            Some(ReferenceClass::Absolute)
        );
        assert_eq!(
            ReferenceClass::classify("//cdn.x.com/a.js"),
            Some(ReferenceClass::ProtocolRelative)
        );
        assert_eq!(ReferenceClass::classify("#top"), None);
        assert_eq!(ReferenceClass::classify("javascript:void(0)"), None);
        assert_eq!(ReferenceClass::classify("mailto:a@x.com"), None);
        assert_eq!(ReferenceClass::classify("data:image/png;base64,AAAA"), None);
        assert_eq!(ReferenceClass::classify("tel:+1555"), None);
    }

    #[test]
    fn test_resolve_each_class() {
        let page = page();
        assert_eq!(
            ReferenceClass::Relative.resolve("/a/b", &page).unwrap(),
            "https://x.com/a/b"
        );
        assert_eq!(
            ReferenceClass::Relative.resolve("img.png", &page).unwrap(),
            "https://x.com/dir/img.png"
        );
        assert_eq!(
            ReferenceClass::ProtocolRelative
                .resolve("//cdn.x.com/a.js", &page)
                .unwrap(),
            "https://cdn.x.com/a.js"
        );
    }

    #[test]
    fn test_rewrite_only_matches_own_class() {
        let page = page();
        assert_eq!(ReferenceClass::Absolute.rewrite("/a", &page), None);
        assert_eq!(
            ReferenceClass::Absolute.rewrite("http://y.com/", &page).unwrap(),
            "/proxy?url=http%3A%2F%2Fy.com%2F"
        );
    }
}
