use crate::challenge::notifier::{GatewayNotifier, LogNotifier, Notifier};
use crate::sesamo;
use anyhow::{Context, Result};
use secrecy::SecretString;
use std::sync::Arc;
use tracing::warn;
use url::Url;

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub sms_gateway_url: Option<String>,
    pub sms_gateway_token: Option<SecretString>,
    pub sms_dry_run: bool,
}

/// Handle the server action
/// # Errors
/// Returns an error if the SMS gateway URL is missing or invalid, or if the
/// server fails to start.
pub async fn handle(args: Args) -> Result<()> {
    let notifier: Arc<dyn Notifier> = if args.sms_dry_run {
        warn!("SMS dry-run enabled, passcodes will be logged instead of delivered");
        Arc::new(LogNotifier)
    } else {
        let url = args
            .sms_gateway_url
            .context("missing required argument: --sms-gateway-url")?;

        let endpoint =
            Url::parse(&url).with_context(|| format!("Invalid SMS gateway URL: {url}"))?;

        let token = args.sms_gateway_token.unwrap_or_default();

        Arc::new(GatewayNotifier::new(endpoint, token)?)
    };

    sesamo::new(args.port, notifier).await
}
