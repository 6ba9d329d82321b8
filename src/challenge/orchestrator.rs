//! Challenge decision procedures.
//!
//! One invocation per provider trigger; each procedure reads the request half
//! of the event and writes the response half in place. Denials are returned
//! as values so callers must branch on them explicitly.

use crate::challenge::event::{ChallengeEvent, ChallengeKind, TriggerKind};
use crate::challenge::notifier::{Notifier, SmsMessage};
use crate::challenge::passcode::Passcode;
use std::fmt;
use tracing::{info, warn};

/// Maximum number of custom attempts before authentication hard-fails.
pub const MAX_ATTEMPTS: usize = 3;

/// Terminal denial. The provider must treat either variant as "deny login,
/// do not retry", distinct from a normal response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deny {
    /// The login targets an account that does not exist.
    UserNotFound,
    /// The user answered wrong three times.
    InvalidOtp,
}

impl fmt::Display for Deny {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UserNotFound => write!(f, "User does not exist"),
            Self::InvalidOtp => write!(f, "Invalid OTP"),
        }
    }
}

impl std::error::Error for Deny {}

/// Route a trigger event to its decision procedure.
///
/// # Errors
/// Returns a [`Deny`] when `DefineChallenge` reaches a terminal denial.
pub fn dispatch(event: &mut ChallengeEvent, notifier: &dyn Notifier) -> Result<(), Deny> {
    match event.trigger_source {
        TriggerKind::CreateChallenge => {
            create_challenge(event, notifier);
            Ok(())
        }
        TriggerKind::DefineChallenge => define_challenge(event),
        TriggerKind::VerifyChallenge => {
            verify_challenge(event);
            Ok(())
        }
    }
}

/// Produce (or re-surface) the passcode the user must answer.
///
/// A fresh code is drawn and sent over SMS only when the session is empty or
/// the last attempt is the provider's built-in `SRP_A` factor; otherwise the
/// code from the previous custom attempt is still live and is carried
/// forward unchanged, with no SMS.
pub fn create_challenge(event: &mut ChallengeEvent, notifier: &dyn Notifier) {
    let phone = event.request.phone().map(str::to_string);

    let passcode = match event.request.last_attempt() {
        None => issue_passcode(phone.as_deref(), notifier),
        Some(last) if last.challenge_kind == ChallengeKind::SrpA => {
            issue_passcode(phone.as_deref(), notifier)
        }
        Some(last) => match last.metadata.as_deref().and_then(Passcode::from_metadata) {
            Some(passcode) => passcode,
            None => {
                // Unreachable when the provider honors the metadata format;
                // reissue instead of leaving the round without a code.
                warn!("Previous custom attempt carries no passcode metadata, reissuing");
                issue_passcode(phone.as_deref(), notifier)
            }
        },
    };

    event.response.public_params.phone = phone;
    event.response.private_params.pass_code = Some(passcode.as_str().to_string());
    event.response.metadata_tag = Some(passcode.metadata_tag());
}

fn issue_passcode(phone: Option<&str>, notifier: &dyn Notifier) -> Passcode {
    let passcode = Passcode::generate();

    match phone {
        Some(phone) => notifier.send(SmsMessage::passcode(phone, &passcode)),
        None => warn!("Request has no phone attribute, generated passcode was not dispatched"),
    }

    passcode
}

/// Decide the next step from the session history.
///
/// Rules are evaluated in order: unknown user, `SRP_A` handoff, correct
/// custom answer, third wrong answer, then the retry default. `SRP_A`
/// entries carry no result, so the handoff rule must run before the
/// result-based ones.
///
/// # Errors
/// Returns [`Deny::UserNotFound`] for unknown accounts and
/// [`Deny::InvalidOtp`] after the third wrong answer. The response flags are
/// written before the denial is returned.
pub fn define_challenge(event: &mut ChallengeEvent) -> Result<(), Deny> {
    if !event.request.user_found {
        event.response.issue_tokens = false;
        event.response.fail_authentication = true;
        return Err(Deny::UserNotFound);
    }

    let last = event
        .request
        .last_attempt()
        .map(|attempt| (attempt.challenge_kind, attempt.result));
    let rounds = event.request.session.len();

    match last {
        Some((ChallengeKind::SrpA, _)) => {
            // First factor passed: clear it so the custom OTP round starts
            // fresh with attempt count 1.
            event.request.session.clear();
            event.response.issue_tokens = false;
            event.response.fail_authentication = false;
            event.response.next_challenge_kind = Some(ChallengeKind::Custom);
            Ok(())
        }
        Some((ChallengeKind::Custom, Some(true))) => {
            info!("The user provided the right answer to the challenge");
            event.response.issue_tokens = true;
            event.response.fail_authentication = false;
            Ok(())
        }
        Some((_, Some(false))) if rounds >= MAX_ATTEMPTS => {
            event.response.issue_tokens = false;
            event.response.fail_authentication = true;
            Err(Deny::InvalidOtp)
        }
        // Custom attempts 1 and 2 with a wrong or pending result, or a
        // fresh session: demand another custom round.
        _ => {
            event.response.issue_tokens = false;
            event.response.fail_authentication = false;
            event.response.next_challenge_kind = Some(ChallengeKind::Custom);
            Ok(())
        }
    }
}

/// Compare the submitted answer against the passcode issued in this round.
///
/// Exact string equality, no trimming or case folding. A missing answer or
/// missing stored code never matches.
pub fn verify_challenge(event: &mut ChallengeEvent) {
    let expected = event.request.private_params.pass_code.as_deref();
    let answer = event.request.submitted_answer.as_deref();

    let correct = matches!((answer, expected), (Some(answer), Some(expected)) if answer == expected);
    event.response.answer_correct = Some(correct);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::challenge::event::{ChallengeAttempt, ChallengeRequest};
    use std::sync::Mutex;

    /// Test double recording every message handed to the notifier.
    #[derive(Default)]
    struct RecordingNotifier {
        sent: Mutex<Vec<SmsMessage>>,
    }

    impl RecordingNotifier {
        fn sent(&self) -> Vec<SmsMessage> {
            self.sent.lock().unwrap().clone()
        }
    }

    impl Notifier for RecordingNotifier {
        fn send(&self, message: SmsMessage) {
            self.sent.lock().unwrap().push(message);
        }
    }

    fn event(trigger: TriggerKind, request: ChallengeRequest) -> ChallengeEvent {
        let mut event = ChallengeEvent::new(trigger);
        event.request = request;
        event
    }

    fn with_phone(mut request: ChallengeRequest) -> ChallengeRequest {
        request
            .user_attributes
            .insert("phone".to_string(), "+15555550100".to_string());
        request
    }

    #[test]
    fn create_generates_and_sends_on_fresh_session() {
        let notifier = RecordingNotifier::default();
        let mut event = event(
            TriggerKind::CreateChallenge,
            with_phone(ChallengeRequest::default()),
        );

        create_challenge(&mut event, &notifier);

        let sent = notifier.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].phone, "+15555550100");

        let code = event.response.private_params.pass_code.as_deref().unwrap();
        let value: u32 = code.parse().unwrap();
        assert!((100_000..=999_999).contains(&value));
        assert!(sent[0].body.ends_with(code));
        assert_eq!(event.response.metadata_tag.as_deref(), Some(format!("CODE-{code}").as_str()));
        assert_eq!(event.response.public_params.phone.as_deref(), Some("+15555550100"));
    }

    #[test]
    fn create_generates_after_srp_a() {
        let notifier = RecordingNotifier::default();
        let mut request = with_phone(ChallengeRequest::default());
        request.session.push(ChallengeAttempt::srp_a());
        let mut event = event(TriggerKind::CreateChallenge, request);

        create_challenge(&mut event, &notifier);

        assert_eq!(notifier.sent().len(), 1);
        assert!(event.response.private_params.pass_code.is_some());
    }

    #[test]
    fn create_reuses_live_code_without_sending() {
        let notifier = RecordingNotifier::default();
        let mut request = with_phone(ChallengeRequest::default());
        request
            .session
            .push(ChallengeAttempt::custom("CODE-482913", false));
        let mut event = event(TriggerKind::CreateChallenge, request);

        create_challenge(&mut event, &notifier);

        assert!(notifier.sent().is_empty());
        assert_eq!(
            event.response.private_params.pass_code.as_deref(),
            Some("482913")
        );
        assert_eq!(event.response.metadata_tag.as_deref(), Some("CODE-482913"));
    }

    #[test]
    fn create_is_idempotent_on_unchanged_session() {
        let notifier = RecordingNotifier::default();
        let mut request = with_phone(ChallengeRequest::default());
        request
            .session
            .push(ChallengeAttempt::custom("CODE-271828", false));

        let mut first = event(TriggerKind::CreateChallenge, request.clone());
        let mut second = event(TriggerKind::CreateChallenge, request);
        create_challenge(&mut first, &notifier);
        create_challenge(&mut second, &notifier);

        assert_eq!(
            first.response.private_params.pass_code,
            second.response.private_params.pass_code
        );
        assert!(notifier.sent().is_empty());
    }

    #[test]
    fn create_without_phone_still_issues_a_code() {
        let notifier = RecordingNotifier::default();
        let mut event = event(TriggerKind::CreateChallenge, ChallengeRequest::default());

        create_challenge(&mut event, &notifier);

        assert!(notifier.sent().is_empty());
        assert!(event.response.private_params.pass_code.is_some());
        assert_eq!(event.response.public_params.phone, None);
    }

    #[test]
    fn define_denies_unknown_user_regardless_of_session() {
        let mut request = ChallengeRequest {
            user_found: false,
            ..ChallengeRequest::default()
        };
        request
            .session
            .push(ChallengeAttempt::custom("CODE-482913", true));
        let mut event = event(TriggerKind::DefineChallenge, request);

        assert_eq!(define_challenge(&mut event), Err(Deny::UserNotFound));
        assert!(!event.response.issue_tokens);
        assert!(event.response.fail_authentication);
    }

    #[test]
    fn define_resets_session_after_srp_a() {
        let mut request = ChallengeRequest::default();
        request.session.push(ChallengeAttempt::srp_a());
        let mut event = event(TriggerKind::DefineChallenge, request);

        assert_eq!(define_challenge(&mut event), Ok(()));
        assert!(event.request.session.is_empty());
        assert!(!event.response.issue_tokens);
        assert!(!event.response.fail_authentication);
        assert_eq!(
            event.response.next_challenge_kind,
            Some(ChallengeKind::Custom)
        );
    }

    #[test]
    fn define_issues_tokens_on_correct_answer() {
        let mut request = ChallengeRequest::default();
        request
            .session
            .push(ChallengeAttempt::custom("CODE-482913", true));
        let mut event = event(TriggerKind::DefineChallenge, request);

        assert_eq!(define_challenge(&mut event), Ok(()));
        assert!(event.response.issue_tokens);
        assert!(!event.response.fail_authentication);
        assert_eq!(event.response.next_challenge_kind, None);
    }

    #[test]
    fn define_denies_after_third_wrong_answer() {
        let mut request = ChallengeRequest::default();
        for _ in 0..MAX_ATTEMPTS {
            request
                .session
                .push(ChallengeAttempt::custom("CODE-482913", false));
        }
        let mut event = event(TriggerKind::DefineChallenge, request);

        assert_eq!(define_challenge(&mut event), Err(Deny::InvalidOtp));
        assert!(!event.response.issue_tokens);
        assert!(event.response.fail_authentication);
    }

    #[test]
    fn define_retries_on_first_and_second_wrong_answers() {
        for wrong_answers in 1..MAX_ATTEMPTS {
            let mut request = ChallengeRequest::default();
            for _ in 0..wrong_answers {
                request
                    .session
                    .push(ChallengeAttempt::custom("CODE-482913", false));
            }
            let mut event = event(TriggerKind::DefineChallenge, request);

            assert_eq!(define_challenge(&mut event), Ok(()));
            assert!(!event.response.issue_tokens);
            assert!(!event.response.fail_authentication);
            assert_eq!(
                event.response.next_challenge_kind,
                Some(ChallengeKind::Custom)
            );
        }
    }

    #[test]
    fn define_demands_custom_round_on_fresh_session() {
        let mut event = event(TriggerKind::DefineChallenge, ChallengeRequest::default());

        assert_eq!(define_challenge(&mut event), Ok(()));
        assert_eq!(
            event.response.next_challenge_kind,
            Some(ChallengeKind::Custom)
        );
    }

    #[test]
    fn define_correct_answer_wins_over_attempt_cap() {
        // Third round answered correctly: rule order must issue tokens, not
        // deny on session length.
        let mut request = ChallengeRequest::default();
        request
            .session
            .push(ChallengeAttempt::custom("CODE-482913", false));
        request
            .session
            .push(ChallengeAttempt::custom("CODE-482913", false));
        request
            .session
            .push(ChallengeAttempt::custom("CODE-482913", true));
        let mut event = event(TriggerKind::DefineChallenge, request);

        assert_eq!(define_challenge(&mut event), Ok(()));
        assert!(event.response.issue_tokens);
    }

    #[test]
    fn verify_accepts_exact_match() {
        let mut request = ChallengeRequest::default();
        request.submitted_answer = Some("482913".to_string());
        request.private_params.pass_code = Some("482913".to_string());
        let mut event = event(TriggerKind::VerifyChallenge, request);

        verify_challenge(&mut event);
        assert_eq!(event.response.answer_correct, Some(true));
    }

    #[test]
    fn verify_rejects_mismatch_without_normalization() {
        for answer in ["482914", " 482913", "482913 ", "48291", ""] {
            let mut request = ChallengeRequest::default();
            request.submitted_answer = Some(answer.to_string());
            request.private_params.pass_code = Some("482913".to_string());
            let mut event = event(TriggerKind::VerifyChallenge, request);

            verify_challenge(&mut event);
            assert_eq!(event.response.answer_correct, Some(false), "answer: {answer:?}");
        }
    }

    #[test]
    fn verify_rejects_missing_answer_or_code() {
        let mut missing_answer = event(TriggerKind::VerifyChallenge, {
            let mut request = ChallengeRequest::default();
            request.private_params.pass_code = Some("482913".to_string());
            request
        });
        verify_challenge(&mut missing_answer);
        assert_eq!(missing_answer.response.answer_correct, Some(false));

        let mut missing_code = event(TriggerKind::VerifyChallenge, {
            let mut request = ChallengeRequest::default();
            request.submitted_answer = Some("482913".to_string());
            request
        });
        verify_challenge(&mut missing_code);
        assert_eq!(missing_code.response.answer_correct, Some(false));
    }

    #[test]
    fn dispatch_routes_by_trigger_kind() {
        let notifier = RecordingNotifier::default();

        let mut create = event(
            TriggerKind::CreateChallenge,
            with_phone(ChallengeRequest::default()),
        );
        assert_eq!(dispatch(&mut create, &notifier), Ok(()));
        assert!(create.response.private_params.pass_code.is_some());

        let mut define = event(TriggerKind::DefineChallenge, ChallengeRequest::default());
        assert_eq!(dispatch(&mut define, &notifier), Ok(()));

        let mut verify = event(TriggerKind::VerifyChallenge, ChallengeRequest::default());
        assert_eq!(dispatch(&mut verify, &notifier), Ok(()));
        assert_eq!(verify.response.answer_correct, Some(false));
    }

    #[test]
    fn full_flow_succeeds_on_second_attempt() {
        let notifier = RecordingNotifier::default();

        // Login start: provider ran SRP_A, asks what comes next.
        let mut request = with_phone(ChallengeRequest::default());
        request.session.push(ChallengeAttempt::srp_a());
        let mut define = event(TriggerKind::DefineChallenge, request);
        assert_eq!(define_challenge(&mut define), Ok(()));
        assert_eq!(
            define.response.next_challenge_kind,
            Some(ChallengeKind::Custom)
        );

        // Round 1: fresh code issued and sent.
        let mut create = event(TriggerKind::CreateChallenge, define.request.clone());
        create_challenge(&mut create, &notifier);
        let code = create
            .response
            .private_params
            .pass_code
            .clone()
            .unwrap();
        assert_eq!(notifier.sent().len(), 1);

        // Wrong answer recorded by the provider; round 2 reuses the code.
        let mut request = with_phone(ChallengeRequest::default());
        request.session.push(ChallengeAttempt::custom(
            &create.response.metadata_tag.clone().unwrap(),
            false,
        ));
        let mut define = event(TriggerKind::DefineChallenge, request.clone());
        assert_eq!(define_challenge(&mut define), Ok(()));

        let mut create = event(TriggerKind::CreateChallenge, request.clone());
        create_challenge(&mut create, &notifier);
        assert_eq!(notifier.sent().len(), 1, "reuse must not send again");
        assert_eq!(
            create.response.private_params.pass_code.as_deref(),
            Some(code.as_str())
        );

        // Correct answer this time.
        request.submitted_answer = Some(code.clone());
        request.private_params.pass_code = Some(code);
        let mut verify = event(TriggerKind::VerifyChallenge, request.clone());
        verify_challenge(&mut verify);
        assert_eq!(verify.response.answer_correct, Some(true));

        // Provider appends the successful attempt; tokens are issued.
        request.session.push(ChallengeAttempt::custom(
            create.response.metadata_tag.as_deref().unwrap(),
            true,
        ));
        let mut define = event(TriggerKind::DefineChallenge, request);
        assert_eq!(define_challenge(&mut define), Ok(()));
        assert!(define.response.issue_tokens);
    }
}
