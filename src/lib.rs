//! # Sesamo (OTP Challenge Orchestrator)
//!
//! `sesamo` implements the one-time-passcode (OTP) challenge step of a custom
//! authentication flow. An external identity provider drives the flow and
//! invokes the orchestrator once per lifecycle trigger:
//!
//! - **`CreateChallenge`**: produce (or re-surface) the passcode the user must
//!   answer, delivering fresh codes over SMS.
//! - **`DefineChallenge`**: decide the next step from the session history:
//!   issue tokens, demand another custom round, or deny authentication.
//! - **`VerifyChallenge`**: compare the submitted answer against the passcode
//!   issued in the current round.
//!
//! ## Session Model
//!
//! The orchestrator is stateless across invocations. All state travels in the
//! trigger event's session history, an append-only list of challenge attempts
//! owned and persisted by the provider. A passcode stays live across repeated
//! custom attempts within one session; a new one is drawn only on a fresh
//! session or right after the provider's built-in `SRP_A` first factor.
//!
//! ## Attempt Cap
//!
//! Users get three custom attempts. The first two wrong answers loop back into
//! another round; the third wrong answer and unknown accounts are terminal
//! denials, surfaced as a distinct error response so the provider denies the
//! login instead of retrying.

pub mod challenge;
pub mod cli;
pub mod sesamo;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_git_commit_hash_format() {
        if GIT_COMMIT_HASH == "unknown" {
            // Acceptable in non-git build environments
            return;
        }
        // Should be a hex string (full SHA-1 is 40 chars, but could be short)
        assert!(
            GIT_COMMIT_HASH.chars().all(|c| c.is_ascii_hexdigit()),
            "GIT_COMMIT_HASH should be a hex string, got: {GIT_COMMIT_HASH}"
        );
        assert!(
            GIT_COMMIT_HASH.len() >= 7,
            "GIT_COMMIT_HASH should be at least 7 characters long, got: {GIT_COMMIT_HASH}"
        );
    }

    #[test]
    fn test_app_user_agent_format() {
        assert!(APP_USER_AGENT.starts_with(env!("CARGO_PKG_NAME")));
        assert!(APP_USER_AGENT.contains(env!("CARGO_PKG_VERSION")));
    }
}
