//! # smsgate HTTP transport
//!
//! [`ReqwestTransport`] implements [`HttpTransport`] on top of one shared
//! `reqwest::Client`. Clone it (or wrap it in an `Arc`) and hand it to every
//! facade that should reuse the same connection pool.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use smsgate_core::{
    Headers, HttpResponse, HttpTransport, OutgoingRequest, RequestBody, SmsError,
    TransportFailure,
};
use tracing::debug;

/// HTTP transport backed by `reqwest`.
#[derive(Clone, Debug)]
pub struct ReqwestTransport {
    http: reqwest::Client,
    /// Report 4xx/5xx responses as failures carrying the response.
    http_errors: bool,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self::from_client(reqwest::Client::new())
    }

    /// Wrap an already configured client.
    pub fn from_client(http: reqwest::Client) -> Self {
        Self {
            http,
            http_errors: true,
        }
    }

    pub fn builder() -> ReqwestTransportBuilder {
        ReqwestTransportBuilder::default()
    }

    pub fn client(&self) -> &reqwest::Client {
        &self.http
    }

    pub fn http_errors(&self) -> bool {
        self.http_errors
    }
}

impl Default for ReqwestTransport {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for [`ReqwestTransport`].
#[derive(Debug, Clone)]
pub struct ReqwestTransportBuilder {
    timeout: Option<Duration>,
    user_agent: Option<String>,
    http_errors: bool,
}

impl Default for ReqwestTransportBuilder {
    fn default() -> Self {
        Self {
            timeout: None,
            user_agent: None,
            http_errors: true,
        }
    }
}

impl ReqwestTransportBuilder {
    /// Timeout applied to the whole request.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// When set (the default), 4xx/5xx responses are reported as failures that
    /// still carry the response. When cleared, every response is a success.
    pub fn http_errors(mut self, enabled: bool) -> Self {
        self.http_errors = enabled;
        self
    }

    pub fn build(self) -> Result<ReqwestTransport, SmsError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(user_agent) = self.user_agent {
            builder = builder.user_agent(user_agent);
        }

        let http = builder
            .build()
            .map_err(|e| SmsError::Transport(e.to_string()))?;

        Ok(ReqwestTransport {
            http,
            http_errors: self.http_errors,
        })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn execute(&self, request: &OutgoingRequest) -> Result<HttpResponse, TransportFailure> {
        let headers = header_map(&request.headers)?;
        let builder = match &request.body {
            RequestBody::Query(pairs) => self.http.get(&request.url).query(pairs),
            RequestBody::Form(pairs) => self.http.post(&request.url).form(pairs),
            RequestBody::Json(value) => self.http.post(&request.url).json(value),
        };

        // applied after the body so configured values replace reqwest's Content-Type
        let res = builder
            .headers(headers)
            .send()
            .await
            .map_err(|e| TransportFailure::new(e.to_string()))?;

        let status = res.status();
        let body = res
            .text()
            .await
            .map_err(|e| TransportFailure::new(e.to_string()))?;
        debug!(status = status.as_u16(), bytes = body.len(), "received gateway reply");

        let response = HttpResponse {
            status: status.as_u16(),
            body,
        };
        if self.http_errors && (status.is_client_error() || status.is_server_error()) {
            return Err(TransportFailure::with_response(
                format!("HTTP {}", status),
                response,
            ));
        }
        Ok(response)
    }
}

/// Build a header map where a later value replaces an earlier one of the same name.
fn header_map(headers: &Headers) -> Result<HeaderMap, TransportFailure> {
    let mut map = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        let name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
            TransportFailure::new(format!("invalid header name {:?}: {}", name, e))
        })?;
        let value = HeaderValue::from_str(value).map_err(|e| {
            TransportFailure::new(format!("invalid value for header {}: {}", name, e))
        })?;
        map.insert(name, value);
    }
    Ok(map)
}
