use axum::{extract::Request, http::Uri, middleware::Next, response::Response};
use std::time::Instant;

/// Request logging middleware
///
/// For SSE responses the duration covers the time to headers, not the stream.
pub async fn log_request(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let path = log_path(req.uri()).to_string();
    let start = Instant::now();

    let response = next.run(req).await;

    tracing::info!(
        method = %method,
        path = %path,
        status = %response.status(),
        duration_ms = %start.elapsed().as_millis(),
        "Request processed"
    );

    response
}

/// Path without the query string; `input` carries the user's prompt
pub(crate) fn log_path(uri: &Uri) -> &str {
    uri.path()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_path_drops_prompt_query() {
        let uri: Uri = "/api/agent/stream?input=my%20secret%20question&thread_id=t1"
            .parse()
            .unwrap();
        assert_eq!(log_path(&uri), "/api/agent/stream");
    }
}
