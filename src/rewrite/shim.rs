//! Client-side interception shim injected into proxied HTML documents.
//!
//! The static passes only see references present in the markup. The shim
//! covers requests built at runtime: it drops `<base>` elements and routes
//! string URLs given to `fetch` and `XMLHttpRequest.open` through the proxy,
//! resolving relative ones against the original page URL.

use url::Url;

use crate::rewrite::RewriteError;

const PAGE_URL_PLACEHOLDER: &str = "__RELAY_PAGE_URL__";

const SHIM_TEMPLATE: &str = r#"<script data-content-relay>
(function () {
  var PAGE_URL = __RELAY_PAGE_URL__;
  var PROXY = '/proxy?url=';
  document.querySelectorAll('base').forEach(function (el) { el.remove(); });
  function route(url) {
    if (typeof url !== 'string' || url.indexOf('data:') === 0 ||
        url.indexOf('blob:') === 0 || url.indexOf(PROXY) === 0) {
      return url;
    }
    var absolute;
    try { absolute = new URL(url, PAGE_URL).href; } catch (e) { return url; }
    if (absolute.indexOf('http:') !== 0 && absolute.indexOf('https:') !== 0) {
      return url;
    }
    return PROXY + encodeURIComponent(absolute);
  }
  var nativeFetch = window.fetch;
  if (nativeFetch) {
    window.fetch = function (input, init) {
      return nativeFetch.call(this, route(input), init);
    };
  }
  var nativeOpen = XMLHttpRequest.prototype.open;
  XMLHttpRequest.prototype.open = function (method, url) {
    var args = Array.prototype.slice.call(arguments);
    args[1] = route(url);
    return nativeOpen.apply(this, args);
  };
})();
</script>"#;

/// Render the shim for `page`.
///
/// The URL is embedded as a JSON string literal with `</` escaped so it can
/// never close the surrounding script element.
pub fn render(page: &Url) -> Result<String, RewriteError> {
    let literal = serde_json::to_string(page.as_str())?.replace("</", "<\\/");
    Ok(SHIM_TEMPLATE.replace(PAGE_URL_PLACEHOLDER, &literal))
}
