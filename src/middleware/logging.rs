use std::time::Instant;

use axum::{
    extract::{Request, State},
    http::{HeaderMap, Method, StatusCode},
    middleware::Next,
    response::Response,
};

use crate::config::LoggingConfig;

const RESET: &str = "\x1b[0m";

/// One line per request: method, path, protocol, status, user agent and
/// elapsed time. The query string is left out so tokens never reach the log.
pub async fn request_logger(State(logging): State<LoggingConfig>, request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let proto = header_or(request.headers(), "x-forwarded-proto", "http");
    let agent = header_or(request.headers(), "user-agent", "Unknown");

    let response = next.run(request).await;

    let line = RequestLine {
        method: &method,
        path: &path,
        proto: &proto,
        status: response.status(),
        agent: &agent,
        elapsed_ms: start.elapsed().as_millis(),
    };
    let rendered = if logging.colorful { line.colored() } else { line.plain() };
    tracing::info!(target: "watchme::http", "{}", rendered);

    response
}

fn header_or(headers: &HeaderMap, name: &str, fallback: &str) -> String {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
        .unwrap_or(fallback)
        .to_string()
}

struct RequestLine<'a> {
    method: &'a Method,
    path: &'a str,
    proto: &'a str,
    status: StatusCode,
    agent: &'a str,
    elapsed_ms: u128,
}

impl RequestLine<'_> {
    fn plain(&self) -> String {
        format!(
            "{} {} {} <{}> - {} {}ms",
            self.method,
            self.path,
            self.proto,
            self.status.as_u16(),
            self.agent,
            self.elapsed_ms
        )
    }

    fn colored(&self) -> String {
        let method_color = if *self.method == Method::GET {
            "32"
        } else if *self.method == Method::POST {
            "33"
        } else if *self.method == Method::PUT {
            "34"
        } else if *self.method == Method::DELETE {
            "31"
        } else {
            "36"
        };
        let status_color = if self.status.is_server_error() {
            "31"
        } else if self.status.is_client_error() {
            "33"
        } else if self.status.is_redirection() {
            "36"
        } else {
            "32"
        };
        let time_color = if self.elapsed_ms > 1000 { "31" } else { "32" };

        format!(
            "\x1b[{mc}m{method}{reset} {path} {proto} \x1b[{sc}m<{status}>{reset} - {agent} \x1b[{tc}m{ms}ms{reset}",
            mc = method_color,
            method = self.method,
            path = self.path,
            proto = self.proto,
            sc = status_color,
            status = self.status.as_u16(),
            agent = self.agent,
            tc = time_color,
            ms = self.elapsed_ms,
            reset = RESET,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(method: &Method, status: StatusCode, elapsed_ms: u128) -> RequestLine<'_> {
        RequestLine {
            method,
            path: "/api/v1/heartbeat",
            proto: "https",
            status,
            agent: "esp32/1.2",
            elapsed_ms,
        }
    }

    #[test]
    fn plain_line_layout() {
        let rendered = line(&Method::POST, StatusCode::OK, 12).plain();
        assert_eq!(rendered, "POST /api/v1/heartbeat https <200> - esp32/1.2 12ms");
    }

    #[test]
    fn colored_line_picks_colors_by_method_status_and_time() {
        let rendered = line(&Method::POST, StatusCode::NOT_FOUND, 1500).colored();
        assert!(rendered.starts_with("\x1b[33mPOST\x1b[0m"));
        assert!(rendered.contains("\x1b[33m<404>\x1b[0m"));
        assert!(rendered.ends_with("\x1b[31m1500ms\x1b[0m"));

        let rendered = line(&Method::GET, StatusCode::INTERNAL_SERVER_ERROR, 3).colored();
        assert!(rendered.starts_with("\x1b[32mGET\x1b[0m"));
        assert!(rendered.contains("\x1b[31m<500>\x1b[0m"));
        assert!(rendered.ends_with("\x1b[32m3ms\x1b[0m"));
    }

    #[test]
    fn missing_headers_fall_back() {
        let headers = HeaderMap::new();
        assert_eq!(header_or(&headers, "user-agent", "Unknown"), "Unknown");
        assert_eq!(header_or(&headers, "x-forwarded-proto", "http"), "http");
    }
}
