//! Request dispatch and outcome classification.

use async_trait::async_trait;
use time::OffsetDateTime;
use tracing::{debug, error};
use uuid::Uuid;

use crate::model::{Headers, OutgoingRequest, Outcome, SendResult};

/// Status and body returned by a gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

/// Transport-level failure, optionally carrying the response that caused it.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{message}")]
pub struct TransportFailure {
    pub message: String,
    pub response: Option<HttpResponse>,
}

impl TransportFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            response: None,
        }
    }

    pub fn with_response(message: impl Into<String>, response: HttpResponse) -> Self {
        Self {
            message: message.into(),
            response: Some(response),
        }
    }
}

/// Issues one HTTP request. Implementations must not retry.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn execute(&self, request: &OutgoingRequest) -> Result<HttpResponse, TransportFailure>;
}

/// Send `request` once and classify what came back.
///
/// Never fails: any HTTP status is a [`Outcome::Success`], a transport failure
/// with a response is an [`Outcome::HttpError`], anything else is an
/// [`Outcome::TransportError`].
pub async fn dispatch(transport: &dyn HttpTransport, request: &OutgoingRequest) -> SendResult {
    let request_id = Uuid::new_v4();
    let sent_at = OffsetDateTime::now_utc();

    debug!(
        %request_id,
        method = request.method(),
        url = %request.url,
        headers = ?redacted(&request.headers),
        payload = ?request.body,
        "SMS gateway request"
    );

    match transport.execute(request).await {
        Ok(response) => {
            debug!(
                %request_id,
                status_code = response.status,
                body = %response.body,
                "SMS gateway response"
            );
            SendResult {
                request_id,
                sent_at,
                status: Some(response.status),
                body: response.body,
                outcome: Outcome::Success,
            }
        }
        Err(TransportFailure {
            message,
            response: Some(response),
        }) => {
            error!(
                %request_id,
                status_code = response.status,
                body = %response.body,
                %message,
                "SMS gateway error"
            );
            SendResult {
                request_id,
                sent_at,
                status: Some(response.status),
                body: response.body,
                outcome: Outcome::HttpError,
            }
        }
        Err(TransportFailure { message, .. }) => {
            error!(%request_id, %message, "SMS gateway exception");
            SendResult {
                request_id,
                sent_at,
                status: None,
                body: String::new(),
                outcome: Outcome::TransportError { message },
            }
        }
    }
}

fn redacted(headers: &Headers) -> Vec<(&str, &str)> {
    headers
        .iter()
        .map(|(name, value)| {
            if name.eq_ignore_ascii_case("authorization") {
                (name.as_str(), "<redacted>")
            } else {
                (name.as_str(), value.as_str())
            }
        })
        .collect()
}
