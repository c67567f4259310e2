//! # Twilio request hook
//!
//! Twilio authenticates with HTTP Basic credentials built from the account SID and
//! auth token. Gateway configs for Twilio declare an `Authorization` header as a
//! placeholder; [`BasicAuthHook`] replaces its value with the real credentials.
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use smsgate_twilio::BasicAuthHook;
//!
//! let api = SmsApi::new(config, transport).with_hook("twilio", Arc::new(BasicAuthHook::from_env()));
//! ```

use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use smsgate_core::{EnvSecrets, OutgoingRequest, RequestHook, SecretProvider, SmsError};
use tracing::debug;

const HOOK_NAME: &str = "twilio-basic-auth";

/// Secret holding the Twilio account SID.
pub const ACCOUNT_SID_SECRET: &str = "TWILIO_ACCOUNT_SID";
/// Secret holding the Twilio auth token.
pub const AUTH_TOKEN_SECRET: &str = "TWILIO_AUTH_TOKEN";

/// Rewrites an existing `Authorization` header to `Basic base64(id:token)`.
///
/// Requests without an `Authorization` header are left untouched and the
/// secrets are never read.
#[derive(Clone)]
pub struct BasicAuthHook {
    secrets: Arc<dyn SecretProvider>,
    account_id_secret: String,
    auth_token_secret: String,
}

impl BasicAuthHook {
    pub fn new(secrets: Arc<dyn SecretProvider>) -> Self {
        Self {
            secrets,
            account_id_secret: ACCOUNT_SID_SECRET.to_owned(),
            auth_token_secret: AUTH_TOKEN_SECRET.to_owned(),
        }
    }

    /// Hook reading `TWILIO_ACCOUNT_SID` / `TWILIO_AUTH_TOKEN` from the environment.
    pub fn from_env() -> Self {
        Self::new(Arc::new(EnvSecrets))
    }

    /// Use different secret names, e.g. for a second Twilio account.
    pub fn with_secret_names(
        mut self,
        account_id: impl Into<String>,
        auth_token: impl Into<String>,
    ) -> Self {
        self.account_id_secret = account_id.into();
        self.auth_token_secret = auth_token.into();
        self
    }

    /// The `Authorization` header value for the configured secrets.
    pub fn credentials(&self) -> Result<String, SmsError> {
        let account_id = self.lookup(&self.account_id_secret)?;
        let auth_token = self.lookup(&self.auth_token_secret)?;
        Ok(format!(
            "Basic {}",
            STANDARD.encode(format!("{}:{}", account_id, auth_token))
        ))
    }

    fn lookup(&self, name: &str) -> Result<String, SmsError> {
        self.secrets
            .secret(name)
            .ok_or_else(|| SmsError::Hook(format!("secret {} is not set", name)))
    }
}

impl RequestHook for BasicAuthHook {
    fn name(&self) -> &'static str {
        HOOK_NAME
    }

    fn apply(&self, request: &mut OutgoingRequest) -> Result<(), SmsError> {
        let Some(index) = request
            .headers
            .iter()
            .position(|(name, _)| name.eq_ignore_ascii_case("authorization"))
        else {
            return Ok(());
        };

        let credentials = self.credentials()?;
        request.headers[index].1 = credentials;
        debug!(hook = HOOK_NAME, "replaced Authorization header");
        Ok(())
    }
}
