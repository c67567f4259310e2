use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use time::OffsetDateTime;
use uuid::Uuid;

/// Parameter tree sent to a gateway.
pub type Params = Map<String, Value>;

/// Lightweight header representation to avoid tying the core to any HTTP client.
pub type Headers = Vec<(String, String)>;

/// HTTP method configured for a gateway.
///
/// Unknown values are kept verbatim so the failure surfaces when the request is
/// built rather than when configuration is parsed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RequestMethod {
    #[default]
    Get,
    Post,
    Other(String),
}

impl RequestMethod {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Other(method) => method,
        }
    }
}

impl From<String> for RequestMethod {
    fn from(value: String) -> Self {
        match value.trim().to_ascii_uppercase().as_str() {
            "GET" => Self::Get,
            "POST" => Self::Post,
            _ => Self::Other(value),
        }
    }
}

impl From<&str> for RequestMethod {
    fn from(value: &str) -> Self {
        Self::from(value.to_owned())
    }
}

impl From<RequestMethod> for String {
    fn from(value: RequestMethod) -> Self {
        value.as_str().to_owned()
    }
}

impl fmt::Display for RequestMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolved, fully-defaulted configuration for one gateway.
#[derive(Debug, Clone, PartialEq)]
pub struct GatewayProfile {
    /// Gateway name the profile was resolved for, e.g. "textlocal".
    pub name: String,
    pub method: RequestMethod,
    pub url: String,
    /// Prefix the country code to every recipient before sending.
    pub add_code: bool,
    /// Encode POST bodies as JSON and send recipients as an array.
    pub json: bool,
    /// With `json`, wrap a single recipient into a one-element array.
    pub json_to_array: bool,
    pub send_to_param_name: String,
    pub msg_param_name: String,
    /// Static parameters included in every request.
    pub other_params: Params,
    /// Static headers included in every request.
    pub headers: Headers,
    /// Envelope key under which recipient and message are nested.
    pub wrapper: Option<String>,
    /// Extra fields merged into the wrapped object.
    pub wrapper_params: Params,
}

/// One destination number or a bulk list of them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Recipient {
    One(String),
    Many(Vec<String>),
}

impl Recipient {
    pub fn is_many(&self) -> bool {
        matches!(self, Self::Many(_))
    }

    pub fn into_value(self) -> Value {
        match self {
            Self::One(number) => Value::String(number),
            Self::Many(numbers) => Value::Array(numbers.into_iter().map(Value::String).collect()),
        }
    }
}

impl From<&str> for Recipient {
    fn from(value: &str) -> Self {
        Self::One(value.to_owned())
    }
}

impl From<String> for Recipient {
    fn from(value: String) -> Self {
        Self::One(value)
    }
}

impl From<Vec<String>> for Recipient {
    fn from(value: Vec<String>) -> Self {
        Self::Many(value)
    }
}

impl From<Vec<&str>> for Recipient {
    fn from(value: Vec<&str>) -> Self {
        Self::Many(value.into_iter().map(str::to_owned).collect())
    }
}

impl From<&[&str]> for Recipient {
    fn from(value: &[&str]) -> Self {
        Self::Many(value.iter().map(|s| (*s).to_owned()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for Recipient {
    fn from(value: [&str; N]) -> Self {
        Self::Many(value.iter().map(|s| (*s).to_owned()).collect())
    }
}

/// Caller input for one send: recipient, text and per-call extras.
#[derive(Debug, Clone)]
pub struct SendRequest {
    pub to: Recipient,
    pub text: String,
    /// Merged over the gateway's parameters; caller values win.
    pub params: Params,
    /// Merged over the gateway's headers; caller values win.
    pub headers: Headers,
}

impl SendRequest {
    pub fn new(to: impl Into<Recipient>, text: impl Into<String>) -> Self {
        Self {
            to: to.into(),
            text: text.into(),
            params: Params::new(),
            headers: Headers::new(),
        }
    }

    pub fn param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    pub fn params(mut self, params: Params) -> Self {
        self.params.extend(params);
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn headers(mut self, headers: Headers) -> Self {
        self.headers.extend(headers);
        self
    }
}

/// Wire encoding of a built request.
///
/// The variant fixes the HTTP method: a query set only travels with GET, a form
/// or JSON body only with POST.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    Query(Vec<(String, String)>),
    Form(Vec<(String, String)>),
    Json(Value),
}

/// Fully composed request, ready for a transport.
#[derive(Debug, Clone, PartialEq)]
pub struct OutgoingRequest {
    pub url: String,
    pub headers: Headers,
    pub body: RequestBody,
}

impl OutgoingRequest {
    pub fn method(&self) -> &'static str {
        match self.body {
            RequestBody::Query(_) => "GET",
            RequestBody::Form(_) | RequestBody::Json(_) => "POST",
        }
    }

    /// Header value by case-insensitive name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// How a dispatched request ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Outcome {
    /// The gateway answered; any status code counts.
    Success,
    /// The transport reported an error but carried the gateway's response.
    HttpError,
    /// No response was obtained (DNS, refused connection, timeout).
    TransportError { message: String },
}

/// Normalised result of one send.
#[derive(Debug, Clone)]
pub struct SendResult {
    /// Correlates the result with the request/response log events.
    pub request_id: Uuid,
    pub sent_at: OffsetDateTime,
    /// HTTP status, unset on transport errors.
    pub status: Option<u16>,
    /// Response body, empty on transport errors.
    pub body: String,
    pub outcome: Outcome,
}

impl SendResult {
    pub fn is_success(&self) -> bool {
        self.outcome == Outcome::Success
    }

    pub fn error_message(&self) -> Option<&str> {
        match &self.outcome {
            Outcome::TransportError { message } => Some(message),
            _ => None,
        }
    }
}
