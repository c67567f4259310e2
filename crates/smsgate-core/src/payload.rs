//! Parameter-tree composition and wire-encoding selection.

use serde_json::Value;

use crate::model::{
    GatewayProfile, Headers, OutgoingRequest, Params, Recipient, RequestBody, RequestMethod,
};
use crate::SmsError;

/// Builds the [`OutgoingRequest`] for one send against a gateway profile.
///
/// Merges follow last-write-wins throughout: profile values first, then wrapper
/// params, then caller values.
#[derive(Debug, Clone)]
pub struct PayloadBuilder<'a> {
    profile: &'a GatewayProfile,
    extra_params: Option<&'a Params>,
    extra_headers: Option<&'a Headers>,
    wrapper_params: Option<&'a Params>,
}

impl<'a> PayloadBuilder<'a> {
    pub fn new(profile: &'a GatewayProfile) -> Self {
        Self {
            profile,
            extra_params: None,
            extra_headers: None,
            wrapper_params: None,
        }
    }

    /// Caller parameters merged over everything else.
    pub fn extra_params(mut self, params: &'a Params) -> Self {
        self.extra_params = Some(params);
        self
    }

    /// Caller headers merged over the profile's headers.
    pub fn extra_headers(mut self, headers: &'a Headers) -> Self {
        self.extra_headers = Some(headers);
        self
    }

    /// Caller wrapper fields, merged over the profile's `wrapper_params`.
    /// Ignored when the profile has no wrapper.
    pub fn wrapper_params(mut self, params: &'a Params) -> Self {
        self.wrapper_params = Some(params);
        self
    }

    /// Compose the request. For GET the whole payload, wrapper included, becomes
    /// the query string; nested values are flattened by [`flatten_params`].
    pub fn build(self, recipient: Recipient, message: &str) -> Result<OutgoingRequest, SmsError> {
        let profile = self.profile;
        let mut payload = match &profile.wrapper {
            Some(wrapper) => {
                let mut inner = Params::new();
                inner.insert(profile.send_to_param_name.clone(), recipient.into_value());
                inner.insert(
                    profile.msg_param_name.clone(),
                    Value::String(message.to_owned()),
                );
                merge_params(&mut inner, &profile.wrapper_params);
                if let Some(extra) = self.wrapper_params {
                    merge_params(&mut inner, extra);
                }

                let mut payload = Params::new();
                payload.insert(wrapper.clone(), Value::Array(vec![Value::Object(inner)]));
                merge_params(&mut payload, &profile.other_params);
                payload
            }
            None => {
                let mut payload = profile.other_params.clone();
                payload.insert(profile.send_to_param_name.clone(), recipient.into_value());
                payload.insert(
                    profile.msg_param_name.clone(),
                    Value::String(message.to_owned()),
                );
                payload
            }
        };
        if let Some(extra) = self.extra_params {
            merge_params(&mut payload, extra);
        }

        let mut headers = profile.headers.clone();
        if let Some(extra) = self.extra_headers {
            merge_headers(&mut headers, extra);
        }

        let body = match (&profile.method, profile.json) {
            (RequestMethod::Get, _) => RequestBody::Query(flatten_params(&payload)),
            (RequestMethod::Post, true) => RequestBody::Json(Value::Object(payload)),
            (RequestMethod::Post, false) => RequestBody::Form(flatten_params(&payload)),
            (RequestMethod::Other(method), _) => {
                return Err(SmsError::UnsupportedMethod(method.clone()))
            }
        };

        Ok(OutgoingRequest {
            url: profile.url.clone(),
            headers,
            body,
        })
    }
}

fn merge_params(target: &mut Params, source: &Params) {
    for (key, value) in source {
        target.insert(key.clone(), value.clone());
    }
}

/// Header names compare case-insensitively; the incoming spelling replaces the old one.
fn merge_headers(target: &mut Headers, source: &Headers) {
    for (name, value) in source {
        match target.iter_mut().find(|(k, _)| k.eq_ignore_ascii_case(name)) {
            Some(existing) => *existing = (name.clone(), value.clone()),
            None => target.push((name.clone(), value.clone())),
        }
    }
}

/// Flatten a parameter tree into form/query pairs.
///
/// Nested values use bracket keys (`messages[0][to]`), booleans become `1`/`0`
/// and nulls are dropped.
pub fn flatten_params(params: &Params) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    for (key, value) in params {
        push_pair(&mut pairs, key.clone(), value);
    }
    pairs
}

fn push_pair(pairs: &mut Vec<(String, String)>, key: String, value: &Value) {
    match value {
        Value::Null => {}
        Value::Bool(flag) => pairs.push((key, if *flag { "1" } else { "0" }.to_owned())),
        Value::Number(number) => pairs.push((key, number.to_string())),
        Value::String(text) => pairs.push((key, text.clone())),
        Value::Array(items) => {
            for (index, item) in items.iter().enumerate() {
                push_pair(pairs, format!("{}[{}]", key, index), item);
            }
        }
        Value::Object(map) => {
            for (name, item) in map {
                push_pair(pairs, format!("{}[{}]", key, name), item);
            }
        }
    }
}
