use crate::cli::actions::{Action, server::Args};
use anyhow::Result;
use secrecy::SecretString;

/// Turn parsed CLI matches into the action to execute.
/// # Errors
/// Returns an error if required arguments are missing or inconsistent.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches.get_one::<u16>("port").copied().unwrap_or(8080);
    let sms_dry_run = matches.get_flag("sms-dry-run");

    let sms_gateway_url = matches.get_one::<String>("sms-gateway-url").cloned();
    if !sms_dry_run && sms_gateway_url.is_none() {
        return Err(anyhow::anyhow!(
            "missing required argument: --sms-gateway-url"
        ));
    }

    let sms_gateway_token = matches
        .get_one::<String>("sms-gateway-token")
        .cloned()
        .map(SecretString::from);

    Ok(Action::Server(Args {
        port,
        sms_gateway_url,
        sms_gateway_token,
        sms_dry_run,
    }))
}
