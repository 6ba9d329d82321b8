//! OTP challenge state machine.
//!
//! The provider delivers one [`event::ChallengeEvent`] per trigger; the
//! orchestrator mutates it in place and hands fresh passcodes to a
//! [`notifier::Notifier`] for SMS delivery.

pub mod event;
pub mod notifier;
pub mod orchestrator;
pub mod passcode;

pub use event::{ChallengeAttempt, ChallengeEvent, ChallengeKind, TriggerKind};
pub use notifier::{GatewayNotifier, LogNotifier, Notifier, SmsMessage};
pub use orchestrator::Deny;
pub use passcode::Passcode;
