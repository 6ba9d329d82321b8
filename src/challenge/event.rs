//! Provider trigger event data model.
//!
//! The identity provider sends the same event structure for all three
//! triggers and consumes it back after the orchestrator has mutated the
//! response half. Field names follow the provider's camelCase wire format.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use utoipa::ToSchema;

/// Lifecycle trigger that selects the decision procedure to run.
#[derive(ToSchema, Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerKind {
    CreateChallenge,
    DefineChallenge,
    VerifyChallenge,
}

/// Kind of a challenge attempt recorded in the session history.
///
/// `SRP_A` is the provider's built-in first factor; `CUSTOM` is the OTP step
/// this service implements.
#[derive(ToSchema, Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChallengeKind {
    #[serde(rename = "SRP_A")]
    SrpA,
    #[serde(rename = "CUSTOM")]
    Custom,
}

/// One entry of the session history.
///
/// `metadata` carries the issued passcode for custom attempts
/// (`CODE-<6 digits>`); `result` is absent while the answer is pending.
#[derive(ToSchema, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeAttempt {
    pub challenge_kind: ChallengeKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<bool>,
}

impl ChallengeAttempt {
    /// Attempt recorded for the provider's built-in first factor.
    #[must_use]
    pub fn srp_a() -> Self {
        Self {
            challenge_kind: ChallengeKind::SrpA,
            metadata: None,
            result: None,
        }
    }

    /// Custom OTP attempt with its metadata tag and checked result.
    #[must_use]
    pub fn custom(metadata: &str, result: bool) -> Self {
        Self {
            challenge_kind: ChallengeKind::Custom,
            metadata: Some(metadata.to_string()),
            result: Some(result),
        }
    }
}

/// Parameters visible to the client.
#[derive(ToSchema, Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PublicParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

/// Parameters kept on the provider side, never exposed to the client.
#[derive(ToSchema, Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PrivateParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pass_code: Option<String>,
}

/// Request half of the trigger event, owned by the provider.
#[derive(ToSchema, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeRequest {
    /// Ordered history of challenge attempts. Empty means a fresh login.
    #[serde(default)]
    pub session: Vec<ChallengeAttempt>,
    #[serde(default)]
    pub user_attributes: HashMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submitted_answer: Option<String>,
    #[serde(default)]
    pub private_params: PrivateParams,
    /// Absent on the wire means the account exists; the provider only sets
    /// the flag when the login targets an unknown user.
    #[serde(default = "default_user_found")]
    pub user_found: bool,
}

fn default_user_found() -> bool {
    true
}

impl Default for ChallengeRequest {
    fn default() -> Self {
        Self {
            session: Vec::new(),
            user_attributes: HashMap::new(),
            submitted_answer: None,
            private_params: PrivateParams::default(),
            user_found: true,
        }
    }
}

impl ChallengeRequest {
    /// Last recorded attempt, or `None` on a fresh session.
    #[must_use]
    pub fn last_attempt(&self) -> Option<&ChallengeAttempt> {
        self.session.last()
    }

    /// Phone number resolved by the provider from the user attributes.
    #[must_use]
    pub fn phone(&self) -> Option<&str> {
        self.user_attributes.get("phone").map(String::as_str)
    }
}

/// Response half of the trigger event, filled in by the orchestrator.
#[derive(ToSchema, Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeResponse {
    #[serde(default)]
    pub public_params: PublicParams,
    #[serde(default)]
    pub private_params: PrivateParams,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata_tag: Option<String>,
    #[serde(default)]
    pub issue_tokens: bool,
    #[serde(default)]
    pub fail_authentication: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_challenge_kind: Option<ChallengeKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer_correct: Option<bool>,
}

/// One trigger invocation: the provider sends it, the orchestrator mutates
/// it, the provider reads the mutated copy back.
#[derive(ToSchema, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeEvent {
    pub trigger_source: TriggerKind,
    #[serde(default)]
    pub request: ChallengeRequest,
    #[serde(default)]
    pub response: ChallengeResponse,
}

impl ChallengeEvent {
    #[must_use]
    pub fn new(trigger_source: TriggerKind) -> Self {
        Self {
            trigger_source,
            request: ChallengeRequest::default(),
            response: ChallengeResponse::default(),
        }
    }
}
