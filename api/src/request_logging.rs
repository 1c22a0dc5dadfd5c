use poem::http::StatusCode;
use poem::{Endpoint, IntoResponse, Middleware, Request, Response};
use std::time::Instant;

/// Logs each request once it completes: method, path, query, status,
/// duration and client IP. Server errors log at `error`, client errors at
/// `warn`, successes at `info`.
pub struct RequestLogging;

impl<E: Endpoint> Middleware<E> for RequestLogging {
    type Output = RequestLoggingEndpoint<E>;

    fn transform(&self, ep: E) -> Self::Output {
        RequestLoggingEndpoint { inner: ep }
    }
}

pub struct RequestLoggingEndpoint<E> {
    inner: E,
}

struct RequestLine {
    method: String,
    path: String,
    query: String,
    client_ip: String,
    started: Instant,
}

impl RequestLine {
    fn from_request(req: &Request) -> Self {
        Self {
            method: req.method().to_string(),
            path: req.uri().path().to_string(),
            query: req.uri().query().unwrap_or_default().to_string(),
            client_ip: req
                .remote_addr()
                .as_socket_addr()
                .map(|addr| addr.ip().to_string())
                .unwrap_or_else(|| "unknown".to_string()),
            started: Instant::now(),
        }
    }

    fn finish(&self, status: StatusCode, error: Option<&str>) {
        let duration_ms = self.started.elapsed().as_millis();
        let status = status.as_u16();
        let error = error.unwrap_or_default();
        let Self {
            method,
            path,
            query,
            client_ip,
            ..
        } = self;

        macro_rules! emit {
            ($level:ident, $message:literal) => {
                tracing::$level!(
                    method = %method,
                    path = %path,
                    query = %query,
                    status,
                    duration_ms = %duration_ms,
                    client_ip = %client_ip,
                    error = %error,
                    $message
                )
            };
        }

        match status {
            500.. => emit!(error, "request failed"),
            400..=499 => emit!(warn, "request rejected"),
            200..=299 => emit!(info, "request completed"),
            _ => emit!(debug, "request completed"),
        }
    }
}

impl<E: Endpoint> Endpoint for RequestLoggingEndpoint<E> {
    type Output = Response;

    async fn call(&self, req: Request) -> poem::Result<Self::Output> {
        let line = RequestLine::from_request(&req);

        match self.inner.call(req).await {
            Ok(resp) => {
                let resp = resp.into_response();
                line.finish(resp.status(), None);
                Ok(resp)
            }
            Err(err) => {
                line.finish(err.status(), Some(&err.to_string()));
                Err(err)
            }
        }
    }
}
