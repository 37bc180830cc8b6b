//! HTML page shown in place of a resource the relay could not fetch.

use axum::body::Body;
use axum::http::{header, HeaderValue, Response};

use crate::fetch::FetchError;

/// Minimal HTML escaping for text and attribute contexts.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Render the themed error document for `requested`.
pub fn render_body(requested: &str, error: &FetchError) -> String {
    let (heading, message) = match error {
        FetchError::Upstream { status } => (
            format!("{} Error", status.as_u16()),
            format!(
                "Server responded with error: <strong>{}</strong>",
                escape_html(status.canonical_reason().unwrap_or("Unknown"))
            ),
        ),
        FetchError::InvalidUrl { reason, .. } => (
            "Invalid URL".to_string(),
            format!("The address could not be understood: <strong>{}</strong>", escape_html(reason)),
        ),
        other => (
            "Connection Error".to_string(),
            format!(
                "Could not connect to the server: <strong>{}</strong>",
                escape_html(&other.to_string())
            ),
        ),
    };

    let code = error
        .code()
        .map(|code| format!(r#"<div class="code">Error Code: {}</div>"#, escape_html(code)))
        .unwrap_or_default();

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>Proxy Error</title>
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<style>
  * {{ margin: 0; padding: 0; box-sizing: border-box; }}
  body {{
    font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', system-ui, sans-serif;
    display: flex; align-items: center; justify-content: center;
    min-height: 100vh; padding: 20px;
    background: linear-gradient(135deg, #0a0a0a 0%, #1a1a1a 100%);
    color: #e5e5e5;
  }}
  .card {{
    max-width: 500px; width: 100%; padding: 40px; text-align: center;
    background: rgba(26, 26, 26, 0.8); border-radius: 24px;
    border: 1px solid rgba(255, 255, 255, 0.1);
    box-shadow: 0 20px 60px rgba(0, 0, 0, 0.5);
  }}
  h1 {{ color: #ef4444; margin-bottom: 16px; font-size: 24px; }}
  .message {{ color: #a0a0a0; margin-bottom: 20px; line-height: 1.6; }}
  .code {{
    display: inline-block; margin-top: 10px; padding: 8px 12px; border-radius: 8px;
    background: rgba(0, 0, 0, 0.3); color: #f59e0b; font-family: monospace;
  }}
  .url {{
    margin-top: 20px; padding: 12px; border-radius: 12px; word-break: break-all;
    background: rgba(59, 130, 246, 0.1); border: 1px solid rgba(59, 130, 246, 0.3);
    color: #3b82f6; font-family: 'Courier New', monospace; font-size: 13px;
  }}
</style>
</head>
<body>
<div class="card">
  <h1>{heading}</h1>
  <p class="message">{message}</p>
  {code}
  <div class="url">{url}</div>
</div>
</body>
</html>
"#,
        heading = heading,
        message = message,
        code = code,
        url = escape_html(requested),
    )
}

/// Error page response with the status mandated by the failure.
pub fn render(requested: &str, error: &FetchError) -> Response<Body> {
    let mut response = Response::new(Body::from(render_body(requested, error)));
    *response.status_mut() = error.response_status();
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/html; charset=utf-8"),
    );
    response
}
