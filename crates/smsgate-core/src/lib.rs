//! # smsgate core
//!
//! Core types and the request-composition pipeline for the smsgate adapter.
//!
//! This crate turns a configured gateway profile plus a recipient and a message
//! into the exact wire-level request a third-party SMS gateway expects:
//! - [`config`] resolves a [`GatewayProfile`] from a [`ConfigSource`]
//! - [`recipient`] normalises one or many phone numbers
//! - [`payload`] builds the parameter tree and picks query, form or JSON encoding
//! - [`dispatch`] issues the request through an [`HttpTransport`] and classifies the outcome
//! - [`hook`] lets a gateway rewrite the built request (bespoke auth schemes)
//!
//! ## Example
//!
//! ```rust,ignore
//! use smsgate_core::{PayloadBuilder, Recipient, format_recipients, resolve_profile};
//!
//! let profile = resolve_profile(&config, "textlocal")?;
//! let to = format_recipients(Recipient::from(["111", "222"]), &profile, None);
//! let request = PayloadBuilder::new(&profile).build(to, "hi")?;
//! let result = smsgate_core::dispatch(&transport, &request).await;
//! ```

pub mod config;
pub mod dispatch;
pub mod hook;
pub mod model;
pub mod payload;
pub mod recipient;
pub mod secrets;

pub use config::{resolve_profile, ConfigSource, GatewayConfig, ParamsConfig, SmsGateConfig};
pub use dispatch::{dispatch, HttpResponse, HttpTransport, TransportFailure};
pub use hook::RequestHook;
pub use model::*;
pub use payload::{flatten_params, PayloadBuilder};
pub use recipient::{add_country_code, format_recipients, DEFAULT_COUNTRY_CODE};
pub use secrets::{EnvSecrets, SecretProvider, StaticSecrets};

/// Errors raised before a request reaches the wire.
///
/// HTTP-level and network-level failures are never reported through this type;
/// they are recorded as an [`Outcome`] on the returned [`SendResult`].
#[derive(Debug, thiserror::Error)]
pub enum SmsError {
    /// Gateway configuration is missing, incomplete or could not be loaded
    #[error("configuration error: {0}")]
    Configuration(String),
    /// Gateway method is neither GET nor POST
    #[error("unsupported method {0:?}: only GET and POST are allowed")]
    UnsupportedMethod(String),
    /// A request hook could not rewrite the request
    #[error("request hook error: {0}")]
    Hook(String),
    /// HTTP transport could not be constructed
    #[error("transport error: {0}")]
    Transport(String),
}
