//! The `SmsApi` facade: gateway selection, per-instance state and the send pipeline.

use std::collections::HashMap;
use std::sync::Arc;

use smsgate_core::{
    dispatch, format_recipients, resolve_profile, ConfigSource, HttpTransport, Params,
    PayloadBuilder, RequestHook, SendRequest, SendResult, SmsError, SmsGateConfig,
    DEFAULT_COUNTRY_CODE,
};
use tracing::{debug, info};

use crate::config::FileConfigSource;

/// Configuration-driven SMS sender.
///
/// Gateway, country code and wrapper params set on the facade persist across
/// sends. The gateway profile itself is re-read from the [`ConfigSource`] on
/// every send. The last [`SendResult`] stays available through
/// [`SmsApi::response`] and [`SmsApi::response_code`].
#[derive(Clone)]
pub struct SmsApi {
    config: Arc<dyn ConfigSource>,
    transport: Arc<dyn HttpTransport>,
    hooks: HashMap<String, Vec<Arc<dyn RequestHook>>>,
    gateway: Option<String>,
    country_code: Option<String>,
    wrapper_params: Params,
    last_result: Option<SendResult>,
}

impl SmsApi {
    pub fn new(config: Arc<dyn ConfigSource>, transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            config,
            transport,
            hooks: HashMap::new(),
            gateway: None,
            country_code: None,
            wrapper_params: Params::new(),
            last_result: None,
        }
    }

    /// Facade over `config/` files and `SMSGATE` environment variables, with a
    /// transport built from their `transport` section.
    pub fn from_env() -> Result<Self, SmsError> {
        let source = FileConfigSource::default();
        let app = source
            .load_app_config()
            .map_err(|e| SmsError::Configuration(e.to_string()))?;
        let transport = app.build_transport()?;
        Ok(Self::new(Arc::new(source), Arc::new(transport)))
    }

    /// Register a hook applied to every request sent through `gateway`.
    pub fn with_hook(mut self, gateway: impl Into<String>, hook: Arc<dyn RequestHook>) -> Self {
        self.hooks.entry(gateway.into()).or_default().push(hook);
        self
    }

    /// Select the gateway for subsequent sends.
    pub fn gateway(&mut self, name: impl Into<String>) -> &mut Self {
        self.gateway = Some(name.into()).filter(|name| !name.is_empty());
        self
    }

    /// Override the country code prefixed for `add_code` gateways.
    pub fn country_code(&mut self, code: impl Into<String>) -> &mut Self {
        self.country_code = Some(code.into()).filter(|code| !code.is_empty());
        self
    }

    /// Replace the caller-side wrapper params merged into wrapped payloads.
    pub fn add_wrapper_params(&mut self, params: Params) -> &mut Self {
        self.wrapper_params = params;
        self
    }

    /// Resolve, format, build and dispatch one message.
    ///
    /// Returns `Err` only when no request could be built (configuration,
    /// unsupported method, hook failure); the retained result is cleared in that
    /// case. HTTP and network failures are an `Ok` result whose `outcome` is not
    /// `Success`.
    pub async fn send_message(&mut self, request: SendRequest) -> Result<&SendResult, SmsError> {
        self.last_result = None;

        let config = self.config.load()?;
        let gateway = self.resolve_gateway(&config)?;
        let profile = resolve_profile(&config, &gateway)?;
        debug!(
            gateway = %gateway,
            method = %profile.method,
            url = %profile.url,
            "resolved gateway profile"
        );

        let country_code = if profile.add_code {
            Some(self.resolve_country_code(&config))
        } else {
            None
        };
        let recipient = format_recipients(request.to, &profile, country_code.as_deref());

        let mut outgoing = PayloadBuilder::new(&profile)
            .extra_params(&request.params)
            .extra_headers(&request.headers)
            .wrapper_params(&self.wrapper_params)
            .build(recipient, &request.text)?;

        if let Some(hooks) = self.hooks.get(&gateway) {
            for hook in hooks {
                hook.apply(&mut outgoing)?;
                debug!(gateway = %gateway, hook = hook.name(), "applied request hook");
            }
        }

        let result = dispatch(self.transport.as_ref(), &outgoing).await;
        info!(
            gateway = %gateway,
            request_id = %result.request_id,
            status_code = ?result.status,
            outcome = ?result.outcome,
            "SMS sent"
        );
        Ok(&*self.last_result.insert(result))
    }

    fn resolve_gateway(&mut self, config: &SmsGateConfig) -> Result<String, SmsError> {
        if self.gateway.is_none() {
            self.gateway = config.default.clone().filter(|name| !name.is_empty());
        }
        self.gateway.clone().ok_or_else(|| {
            SmsError::Configuration("no gateway selected and no default gateway configured".into())
        })
    }

    /// Explicit override, else the cached value, else config, else the built-in default.
    /// The result is cached on the instance.
    fn resolve_country_code(&mut self, config: &SmsGateConfig) -> String {
        self.country_code
            .get_or_insert_with(|| {
                config
                    .country_code
                    .clone()
                    .filter(|code| !code.is_empty())
                    .unwrap_or_else(|| DEFAULT_COUNTRY_CODE.to_owned())
            })
            .clone()
    }

    /// The shared transport this facade sends through.
    pub fn client(&self) -> &Arc<dyn HttpTransport> {
        &self.transport
    }

    /// Body of the last response, empty if there is none.
    pub fn response(&self) -> &str {
        self.last_result
            .as_ref()
            .map(|result| result.body.as_str())
            .unwrap_or_default()
    }

    /// Status code of the last response, if one was received.
    pub fn response_code(&self) -> Option<u16> {
        self.last_result.as_ref().and_then(|result| result.status)
    }

    pub fn last_result(&self) -> Option<&SendResult> {
        self.last_result.as_ref()
    }

    /// Gateway selected explicitly or picked up from the configured default.
    pub fn active_gateway(&self) -> Option<&str> {
        self.gateway.as_deref()
    }

    pub fn resolved_country_code(&self) -> Option<&str> {
        self.country_code.as_deref()
    }
}
