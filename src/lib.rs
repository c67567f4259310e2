//! # smsgate
//!
//! A configuration-driven adapter that sends a text message through one of several
//! interchangeable third-party SMS gateways.
//!
//! ## Features
//!
//! - **One call, many gateways**: query, form and JSON gateways behind [`SmsApi::send_message`]
//! - **Bulk recipients**: comma-joined for form/query gateways, arrays for JSON gateways
//! - **Wrapped payloads**: recipient and message nested under a gateway-specific envelope
//! - **Country codes**: optional prefixing, resolved once per facade and reused
//! - **Request hooks**: per-gateway rewrites such as Twilio's Basic auth
//! - **Layered configuration**: files plus environment variables, re-read on every send
//! - **Observability**: every request, response and failure is a `tracing` event
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use smsgate::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//!     let mut api = SmsApi::from_env()?;
//!     let result = api
//!         .gateway("textlocal")
//!         .send_message(SendRequest::new(["9876543210", "9876543211"], "Hello!"))
//!         .await?;
//!
//!     if !result.is_success() {
//!         eprintln!("send failed: {:?} {}", result.outcome, result.body);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Configuration
//!
//! ```toml
//! [sms]
//! default = "textlocal"
//! country_code = "91"
//!
//! [sms.gateways.textlocal]
//! method = "POST"
//! url = "https://api.textlocal.in/send/"
//! add_code = true
//!
//! [sms.gateways.textlocal.params]
//! send_to_param_name = "numbers"
//! msg_param_name = "message"
//!
//! [sms.gateways.textlocal.params.others]
//! apikey = "..."
//! sender = "TXTLCL"
//! ```

pub mod api;
pub mod config;
pub mod logging;

pub use api::SmsApi;
pub use crate::config::*;

/// Common imports for smsgate usage
pub mod prelude {
    pub use crate::api::SmsApi;
    pub use crate::config::{AppConfig, FileConfigSource, LoggingConfig, TransportConfig};
    pub use crate::logging::init_tracing;
    pub use smsgate_core::*;
    pub use smsgate_http::ReqwestTransport;
    pub use smsgate_twilio::BasicAuthHook;
}
