//! SMS delivery abstraction for freshly generated passcodes.
//!
//! Delivery is fire-and-forget: the orchestrator hands a message over and
//! moves on. Implementations own the transport and log the outcome; a failed
//! delivery never feeds back into the challenge state machine.

use crate::challenge::passcode::Passcode;
use anyhow::{Context, Result};
use secrecy::{ExposeSecret, SecretString};
use std::collections::HashMap;
use tracing::{error, info};
use url::Url;

/// Outbound text message carrying a passcode.
#[derive(Clone, Debug)]
pub struct SmsMessage {
    pub phone: String,
    pub body: String,
}

impl SmsMessage {
    /// The one message this service sends: a human-readable sentence
    /// embedding the 6-digit code.
    #[must_use]
    pub fn passcode(phone: &str, passcode: &Passcode) -> Self {
        Self {
            phone: phone.to_string(),
            body: format!("Your secret code: {passcode}"),
        }
    }
}

/// SMS delivery capability consumed by `CreateChallenge`.
pub trait Notifier: Send + Sync {
    /// Dispatch a message. The delivery result is opaque to callers.
    fn send(&self, message: SmsMessage);
}

/// Local dev sender that logs the message instead of sending a real SMS.
#[derive(Clone, Debug)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn send(&self, message: SmsMessage) {
        info!(phone = %message.phone, body = %message.body, "sms send stub");
    }
}

/// Sender backed by an HTTP SMS gateway.
///
/// `send` spawns the request on the runtime and returns immediately; the
/// gateway response is logged and otherwise discarded.
#[derive(Clone, Debug)]
pub struct GatewayNotifier {
    client: reqwest::Client,
    endpoint: Url,
    token: SecretString,
}

impl GatewayNotifier {
    /// Build the gateway client.
    ///
    /// # Errors
    /// Returns an error if the underlying HTTP client cannot be constructed.
    pub fn new(endpoint: Url, token: SecretString) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(crate::APP_USER_AGENT)
            .build()
            .context("Error creating reqwest client")?;

        Ok(Self {
            client,
            endpoint,
            token,
        })
    }
}

impl Notifier for GatewayNotifier {
    fn send(&self, message: SmsMessage) {
        let client = self.client.clone();
        let endpoint = self.endpoint.clone();
        let token = self.token.clone();

        // Fire-and-forget: the spawned task logs the outcome and drops it.
        tokio::spawn(async move {
            let mut map = HashMap::new();
            map.insert("phone", message.phone.clone());
            map.insert("message", message.body);

            match client
                .post(endpoint)
                .bearer_auth(token.expose_secret())
                .json(&map)
                .send()
                .await
            {
                Ok(response) if response.status().is_success() => {
                    info!(phone = %message.phone, status = %response.status(), "SMS dispatched");
                }
                Ok(response) => {
                    error!(
                        phone = %message.phone,
                        status = %response.status(),
                        "SMS gateway rejected message"
                    );
                }
                Err(e) => {
                    error!(phone = %message.phone, "Error sending SMS: {e:?}");
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passcode_message_embeds_the_code() {
        let passcode = Passcode::from_metadata("CODE-482913").unwrap();
        let message = SmsMessage::passcode("+15555550100", &passcode);
        assert_eq!(message.phone, "+15555550100");
        assert_eq!(message.body, "Your secret code: 482913");
    }

    #[test]
    fn gateway_notifier_is_constructible() {
        let endpoint = Url::parse("https://sms.gateway.tld/v1/messages").unwrap();
        let notifier = GatewayNotifier::new(endpoint, SecretString::default());
        assert!(notifier.is_ok());
    }
}
