//! Send an SMS through a configured gateway.
//!
//! Reads `config/` files and `SMSGATE` environment variables, e.g.
//! `cargo run --example send_message -- --gateway textlocal --to 9876543210 --text hi`.
use std::env;
use std::sync::Arc;

use smsgate::prelude::*;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let app = AppConfig::load()?;
    init_tracing(&app.logging)?;

    let to = arg_or_env("--to", "SMS_TO");
    let text = arg_or_env("--text", "SMS_TEXT");

    let mut api = SmsApi::from_env()?.with_hook("twilio", Arc::new(BasicAuthHook::from_env()));
    if let Some(gateway) = optional_arg("--gateway") {
        api.gateway(gateway);
    }

    let recipients: Vec<String> = to.split(',').map(str::to_owned).collect();
    let result = api
        .send_message(SendRequest::new(recipients, text))
        .await?
        .clone();
    println!(
        "Sent via {} ({:?}): status {:?}\nBody: {}",
        api.active_gateway().unwrap_or("?"),
        result.outcome,
        result.status,
        result.body
    );
    Ok(())
}

fn optional_arg(flag: &str) -> Option<String> {
    let args: Vec<String> = env::args().collect();
    let idx = args.iter().position(|a| a == flag)?;
    args.get(idx + 1).cloned()
}

fn arg_or_env(flag: &str, env_key: &str) -> String {
    optional_arg(flag)
        .or_else(|| env::var(env_key).ok())
        .unwrap_or_else(|| panic!("missing {} (arg {} or env {})", flag, flag, env_key))
}
