//! Gateway configuration and profile resolution.
//!
//! Configuration is always read through a [`ConfigSource`] snapshot taken once per
//! send, so edits made between sends are picked up by the next one.

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::model::{GatewayProfile, Params, RequestMethod};
use crate::SmsError;

/// Names of the recipient and message fields, plus static parameters.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ParamsConfig {
    #[serde(default)]
    pub send_to_param_name: String,
    #[serde(default)]
    pub msg_param_name: String,
    /// Static parameters sent with every request
    #[serde(default)]
    pub others: Params,
}

/// Raw configuration block for one gateway, as written in config files.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GatewayConfig {
    /// GET or POST (default: GET)
    #[serde(default)]
    pub method: RequestMethod,
    #[serde(default)]
    pub url: String,
    /// Prefix the country code to recipients (default: false)
    #[serde(default)]
    pub add_code: bool,
    /// Send POST bodies as JSON (default: false)
    #[serde(default)]
    pub json: bool,
    /// Wrap a single recipient into an array for JSON gateways (default: true)
    #[serde(default = "default_true", alias = "jsonToArray")]
    pub json_to_array: bool,
    #[serde(default)]
    pub params: ParamsConfig,
    /// Static headers, sent in the order they are written
    #[serde(default)]
    pub headers: Params,
    #[serde(default)]
    pub wrapper: Option<String>,
    #[serde(default, alias = "wrapperParams")]
    pub wrapper_params: Params,
}

fn default_true() -> bool {
    true
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            method: RequestMethod::Get,
            url: String::new(),
            add_code: false,
            json: false,
            json_to_array: true,
            params: ParamsConfig::default(),
            headers: Params::new(),
            wrapper: None,
            wrapper_params: Params::new(),
        }
    }
}

/// The SMS section of the configuration: default gateway, default country code
/// and one block per gateway.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SmsGateConfig {
    /// Gateway used when none is selected on the facade
    #[serde(default)]
    pub default: Option<String>,
    /// Country code prefixed to recipients when a gateway sets `add_code`
    #[serde(default)]
    pub country_code: Option<String>,
    #[serde(default)]
    pub gateways: BTreeMap<String, GatewayConfig>,
}

impl SmsGateConfig {
    pub fn with_gateway(mut self, name: impl Into<String>, gateway: GatewayConfig) -> Self {
        self.gateways.insert(name.into(), gateway);
        self
    }

    pub fn with_default(mut self, name: impl Into<String>) -> Self {
        self.default = Some(name.into());
        self
    }

    pub fn with_country_code(mut self, code: impl Into<String>) -> Self {
        self.country_code = Some(code.into());
        self
    }
}

/// Typed configuration lookup.
///
/// Implementations must not cache across calls: every [`ConfigSource::load`]
/// returns the configuration as it is right now.
pub trait ConfigSource: Send + Sync {
    fn load(&self) -> Result<SmsGateConfig, SmsError>;
}

impl ConfigSource for SmsGateConfig {
    fn load(&self) -> Result<SmsGateConfig, SmsError> {
        Ok(self.clone())
    }
}

impl ConfigSource for RwLock<SmsGateConfig> {
    fn load(&self) -> Result<SmsGateConfig, SmsError> {
        self.read()
            .map(|config| config.clone())
            .map_err(|e| SmsError::Configuration(format!("config lock poisoned: {}", e)))
    }
}

impl<T: ConfigSource + ?Sized> ConfigSource for Arc<T> {
    fn load(&self) -> Result<SmsGateConfig, SmsError> {
        (**self).load()
    }
}

/// Resolve the named gateway block into a validated [`GatewayProfile`].
pub fn resolve_profile(config: &SmsGateConfig, gateway: &str) -> Result<GatewayProfile, SmsError> {
    let block = config.gateways.get(gateway).ok_or_else(|| {
        SmsError::Configuration(format!("no configuration block for gateway {:?}", gateway))
    })?;
    GatewayProfile::from_config(gateway, block)
}

impl GatewayProfile {
    pub fn from_config(name: &str, config: &GatewayConfig) -> Result<Self, SmsError> {
        if config.url.trim().is_empty() {
            return Err(SmsError::Configuration(format!(
                "gateway {:?} has no url",
                name
            )));
        }
        url::Url::parse(&config.url).map_err(|e| {
            SmsError::Configuration(format!("gateway {:?} has an invalid url: {}", name, e))
        })?;
        if config.params.send_to_param_name.is_empty() || config.params.msg_param_name.is_empty()
        {
            return Err(SmsError::Configuration(format!(
                "gateway {:?} must name both send_to_param_name and msg_param_name",
                name
            )));
        }

        Ok(Self {
            name: name.to_owned(),
            method: config.method.clone(),
            url: config.url.clone(),
            add_code: config.add_code,
            json: config.json,
            json_to_array: config.json_to_array,
            send_to_param_name: config.params.send_to_param_name.clone(),
            msg_param_name: config.params.msg_param_name.clone(),
            other_params: config.params.others.clone(),
            headers: header_list(name, &config.headers)?,
            // an empty wrapper key means "no wrapper"
            wrapper: config.wrapper.clone().filter(|w| !w.is_empty()),
            wrapper_params: config.wrapper_params.clone(),
        })
    }
}

/// Header values may be written as strings, numbers or booleans.
fn header_list(gateway: &str, headers: &Params) -> Result<Vec<(String, String)>, SmsError> {
    headers
        .iter()
        .map(|(name, value)| {
            let value = match value {
                Value::String(text) => text.clone(),
                Value::Number(number) => number.to_string(),
                Value::Bool(flag) => flag.to_string(),
                other => {
                    return Err(SmsError::Configuration(format!(
                        "gateway {:?} header {:?} must be a scalar, got {}",
                        gateway, name, other
                    )))
                }
            };
            Ok((name.clone(), value))
        })
        .collect()
}
