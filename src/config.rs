use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use smsgate_core::{ConfigSource, SmsError, SmsGateConfig};
use smsgate_http::ReqwestTransport;
use std::env;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Application configuration
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct AppConfig {
    /// Default gateway, default country code and per-gateway blocks
    #[serde(default)]
    pub sms: SmsGateConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
    /// HTTP transport configuration
    #[serde(default)]
    pub transport: TransportConfig,
}

/// Logging configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    /// Log level or filter directive (default: info)
    pub level: String,
    /// Log format: json or pretty (default: json)
    pub format: String,
}

/// HTTP transport configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct TransportConfig {
    /// Whole-request timeout in seconds (default: none)
    pub timeout_seconds: Option<u64>,
    /// User-Agent header override (default: reqwest's)
    pub user_agent: Option<String>,
    /// Treat 4xx/5xx replies as HTTP errors (default: true)
    pub http_errors: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "json".to_string(),
        }
    }
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: None,
            user_agent: None,
            http_errors: true,
        }
    }
}

impl AppConfig {
    /// Load configuration from `config/` files and `SMSGATE` environment variables
    pub fn load() -> Result<Self, ConfigError> {
        FileConfigSource::default().load_app_config()
    }

    /// Build the shared HTTP transport described by the `transport` section
    pub fn build_transport(&self) -> Result<ReqwestTransport, SmsError> {
        let mut builder = ReqwestTransport::builder().http_errors(self.transport.http_errors);
        if let Some(seconds) = self.transport.timeout_seconds {
            builder = builder.timeout(Duration::from_secs(seconds));
        }
        if let Some(user_agent) = &self.transport.user_agent {
            builder = builder.user_agent(user_agent.clone());
        }
        builder.build()
    }
}

/// Layered file + environment configuration, re-read on every lookup.
///
/// Sources, later ones winning: built-in defaults, `{dir}/default`,
/// `{dir}/{run_mode}`, `{dir}/local`, then environment variables with the
/// configured prefix and `__` as the nesting separator.
///
/// The `sms` section holds literal gateway, parameter and header names, so it
/// is read from `.toml`/`.json` files with key case preserved. Environment
/// overrides for it match existing keys case-insensitively.
#[derive(Debug, Clone)]
pub struct FileConfigSource {
    dir: PathBuf,
    run_mode: String,
    env_prefix: String,
}

impl Default for FileConfigSource {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("config"),
            run_mode: env::var("RUN_MODE").unwrap_or_else(|_| "development".into()),
            env_prefix: "SMSGATE".into(),
        }
    }
}

impl FileConfigSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            ..Self::default()
        }
    }

    pub fn run_mode(mut self, run_mode: impl Into<String>) -> Self {
        self.run_mode = run_mode.into();
        self
    }

    pub fn env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    fn layers(&self) -> [&str; 3] {
        ["default", self.run_mode.as_str(), "local"]
    }

    pub fn load_app_config(&self) -> Result<AppConfig, ConfigError> {
        let file = |name: &str| {
            let path = self.dir.join(name);
            File::with_name(&path.to_string_lossy()).required(false)
        };

        let mut builder = Config::builder().add_source(Config::try_from(&AppConfig::default())?);
        for layer in self.layers() {
            builder = builder.add_source(file(layer));
        }
        let s = builder
            .add_source(Environment::with_prefix(&self.env_prefix).separator("__"))
            .build()?;

        let mut app: AppConfig = s.try_deserialize()?;
        app.sms = self.load_sms_config()?;
        Ok(app)
    }

    /// Read only the `sms` section, keeping every key exactly as written.
    pub fn load_sms_config(&self) -> Result<SmsGateConfig, ConfigError> {
        let mut tree = Value::Object(Map::new());
        for layer in self.layers() {
            if let Some(layer) = self.read_layer(layer)? {
                merge_values(&mut tree, layer);
            }
        }

        let sms_prefix = format!("{}__sms__", self.env_prefix);
        let mut sms = tree
            .get_mut("sms")
            .map(Value::take)
            .unwrap_or_else(|| Value::Object(Map::new()));
        apply_env_overrides(&mut sms, &sms_prefix, env::vars());

        serde_json::from_value(sms).map_err(|e| ConfigError::Message(format!("sms: {}", e)))
    }

    fn read_layer(&self, name: &str) -> Result<Option<Value>, ConfigError> {
        let toml_path = self.dir.join(format!("{}.toml", name));
        if toml_path.is_file() {
            let text = fs::read_to_string(&toml_path).map_err(|e| file_error(&toml_path, e))?;
            let table: toml::Table =
                toml::from_str(&text).map_err(|e| file_error(&toml_path, e))?;
            return serde_json::to_value(table)
                .map(Some)
                .map_err(|e| file_error(&toml_path, e));
        }

        let json_path = self.dir.join(format!("{}.json", name));
        if json_path.is_file() {
            let text = fs::read_to_string(&json_path).map_err(|e| file_error(&json_path, e))?;
            return serde_json::from_str(&text)
                .map(Some)
                .map_err(|e| file_error(&json_path, e));
        }
        Ok(None)
    }
}

impl ConfigSource for FileConfigSource {
    fn load(&self) -> Result<SmsGateConfig, SmsError> {
        self.load_sms_config()
            .map_err(|e| SmsError::Configuration(e.to_string()))
    }
}

fn file_error(path: &Path, err: impl fmt::Display) -> ConfigError {
    ConfigError::Message(format!("{}: {}", path.display(), err))
}

/// Deep-merge `overlay` into `base`; tables merge key by key, anything else replaces.
fn merge_values(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Object(base), Value::Object(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(existing) => merge_values(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}

/// Apply `{prefix}a__b__c=value` variables to `tree`.
///
/// Variable names carry no case, so each segment matches an existing key
/// ignoring case and only falls back to a lowercase key when none exists.
/// Values take the type of the value they replace; new values are booleans
/// when they read `true`/`false` and strings otherwise.
fn apply_env_overrides<I>(tree: &mut Value, prefix: &str, vars: I)
where
    I: IntoIterator<Item = (String, String)>,
{
    for (key, raw) in vars {
        let lowered = key.to_ascii_lowercase();
        let Some(path) = lowered.strip_prefix(&prefix.to_ascii_lowercase()) else {
            continue;
        };
        let segments: Vec<&str> = path.split("__").filter(|s| !s.is_empty()).collect();
        if segments.is_empty() {
            continue;
        }

        let mut node = &mut *tree;
        for segment in &segments {
            if !node.is_object() {
                *node = Value::Object(Map::new());
            }
            if !node.is_object() {
                break;
            }
            let map = node.as_object_mut().expect("node is an object");
            let name = map
                .keys()
                .find(|existing| existing.eq_ignore_ascii_case(segment))
                .cloned()
                .unwrap_or_else(|| (*segment).to_owned());
            node = map.entry(name).or_insert(Value::Null);
        }
        *node = coerce_env_value(node, raw);
        debug!(variable = %key, "applied sms environment override");
    }
}

fn coerce_env_value(current: &Value, raw: String) -> Value {
    match current {
        Value::Bool(_) | Value::Null => match raw.as_str() {
            "true" => Value::Bool(true),
            "false" => Value::Bool(false),
            _ => Value::String(raw),
        },
        Value::Number(_) => raw
            .parse::<i64>()
            .map(Value::from)
            .or_else(|_| raw.parse::<f64>().map(Value::from))
            .unwrap_or(Value::String(raw)),
        _ => Value::String(raw),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smsgate_core::RequestMethod;
    use std::fs;

    const TEXTLOCAL: &str = r#"
[sms]
default = "textlocal"
country_code = "44"

[sms.gateways.textlocal]
method = "POST"
url = "https://api.textlocal.in/send/"
add_code = true

[sms.gateways.textlocal.params]
send_to_param_name = "numbers"
msg_param_name = "message"

[sms.gateways.textlocal.params.others]
apikey = "KEY"
sender = "TXTLCL"

[transport]
timeout_seconds = 10
"#;

    fn temp_config_dir() -> PathBuf {
        let dir = env::temp_dir().join(format!("smsgate-config-{}", uuid::Uuid::new_v4()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn source(dir: &PathBuf) -> FileConfigSource {
        FileConfigSource::new(dir.clone())
            .run_mode("test")
            .env_prefix("SMSGATE_UNIT_TEST_UNSET")
    }

    #[test]
    fn defaults_without_any_files() {
        let dir = temp_config_dir();
        let config = source(&dir).load_app_config().unwrap();

        assert!(config.sms.default.is_none());
        assert!(config.sms.gateways.is_empty());
        assert_eq!(config.logging.level, "info");
        assert!(config.transport.http_errors);
        fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn loads_gateway_blocks_from_files() {
        let dir = temp_config_dir();
        fs::write(dir.join("default.toml"), TEXTLOCAL).unwrap();

        let config = source(&dir).load_app_config().unwrap();
        assert_eq!(config.sms.default.as_deref(), Some("textlocal"));
        assert_eq!(config.sms.country_code.as_deref(), Some("44"));
        assert_eq!(config.transport.timeout_seconds, Some(10));

        let gateway = &config.sms.gateways["textlocal"];
        assert_eq!(gateway.method, RequestMethod::Post);
        assert!(gateway.add_code);
        assert!(gateway.json_to_array);
        assert_eq!(gateway.params.send_to_param_name, "numbers");
        assert_eq!(gateway.params.others["apikey"], serde_json::json!("KEY"));
        assert!(config.build_transport().is_ok());
        fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn run_mode_file_overrides_default_file() {
        let dir = temp_config_dir();
        fs::write(dir.join("default.toml"), TEXTLOCAL).unwrap();
        fs::write(dir.join("test.toml"), "[sms]\ncountry_code = \"1\"\n").unwrap();

        let sms = source(&dir).load().unwrap();
        assert_eq!(sms.country_code.as_deref(), Some("1"));
        assert_eq!(sms.default.as_deref(), Some("textlocal"));
        fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn every_load_reads_the_files_again() {
        let dir = temp_config_dir();
        let source = source(&dir);
        fs::write(dir.join("default.toml"), TEXTLOCAL).unwrap();
        assert_eq!(source.load().unwrap().default.as_deref(), Some("textlocal"));

        fs::write(
            dir.join("default.toml"),
            TEXTLOCAL.replace("default = \"textlocal\"", "default = \"msg91\""),
        )
        .unwrap();
        assert_eq!(source.load().unwrap().default.as_deref(), Some("msg91"));
        fs::remove_dir_all(dir).ok();
    }

    const TWILIO: &str = r#"
[sms]
default = "Twilio"

[sms.gateways.Twilio]
method = "POST"
url = "https://api.twilio.com/2010-04-01/Accounts/AC1/Messages.json"

[sms.gateways.Twilio.headers]
X-Zeta = "z"
Authorization = "set-by-hook"

[sms.gateways.Twilio.params]
send_to_param_name = "To"
msg_param_name = "Body"

[sms.gateways.Twilio.params.others]
From = "+15550000000"
apiKey = "K"
"#;

    #[test]
    fn file_keys_keep_their_case_and_order() {
        let dir = temp_config_dir();
        fs::write(dir.join("default.toml"), TWILIO).unwrap();

        let sms = source(&dir).load().unwrap();
        assert_eq!(sms.default.as_deref(), Some("Twilio"));
        let profile = smsgate_core::resolve_profile(&sms, "Twilio").unwrap();
        assert_eq!(profile.send_to_param_name, "To");
        assert_eq!(profile.msg_param_name, "Body");
        let others: Vec<&str> = profile.other_params.keys().map(String::as_str).collect();
        assert_eq!(others, vec!["From", "apiKey"]);
        let headers: Vec<&str> = profile.headers.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(headers, vec!["X-Zeta", "Authorization"]);

        let app = source(&dir).load_app_config().unwrap();
        assert!(app.sms.gateways.contains_key("Twilio"));
        fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn json_layer_merges_over_toml_layer() {
        let dir = temp_config_dir();
        fs::write(dir.join("default.toml"), TWILIO).unwrap();
        fs::write(
            dir.join("local.json"),
            r#"{ "sms": { "gateways": { "Twilio": { "params": { "others": { "apiKey": "LOCAL" } } } } } }"#,
        )
        .unwrap();

        let sms = source(&dir).load().unwrap();
        let others = &sms.gateways["Twilio"].params.others;
        assert_eq!(others["apiKey"], serde_json::json!("LOCAL"));
        assert_eq!(others["From"], serde_json::json!("+15550000000"));
        fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn env_overrides_match_existing_keys_ignoring_case() {
        let mut tree = serde_json::json!({
            "default": "Twilio",
            "gateways": { "Twilio": {
                "add_code": false,
                "params": { "others": { "apiKey": "K" } }
            } }
        });
        let var = |key: &str, value: &str| (key.to_string(), value.to_string());
        let vars = vec![
            var("SMSGATE__SMS__GATEWAYS__TWILIO__PARAMS__OTHERS__APIKEY", "ENV"),
            var("SMSGATE__SMS__GATEWAYS__TWILIO__ADD_CODE", "true"),
            var("SMSGATE__SMS__COUNTRY_CODE", "44"),
            var("OTHER__SMS__DEFAULT", "ignored"),
        ];
        apply_env_overrides(&mut tree, "SMSGATE__sms__", vars);

        assert_eq!(tree["gateways"]["Twilio"]["params"]["others"]["apiKey"], "ENV");
        assert_eq!(tree["gateways"]["Twilio"]["add_code"], true);
        assert_eq!(tree["country_code"], "44");
        assert_eq!(tree["default"], "Twilio");
        assert!(tree["gateways"].get("twilio").is_none());
    }
}
