//! Session health policy
//!
//! Pure decision table from a classified failure to a recovery action.
//! No side effects and no hidden state.

use serde::Serialize;

use super::host::ErrorCode;

/// Classification of a capture-session error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum FailureClass {
    /// Permission refused; cannot succeed without new user consent
    PermissionDenied,

    /// Silence timeout; informational only
    NoSpeechDetected,

    /// The session was aborted
    SessionAborted,

    /// Recognition service unreachable
    TransientNetwork,

    /// Anything else
    Unclassified,
}

impl FailureClass {
    /// Every class, for exhaustive iteration
    pub const ALL: [FailureClass; 5] = [
        FailureClass::PermissionDenied,
        FailureClass::NoSpeechDetected,
        FailureClass::SessionAborted,
        FailureClass::TransientNetwork,
        FailureClass::Unclassified,
    ];
}

impl From<ErrorCode> for FailureClass {
    fn from(code: ErrorCode) -> Self {
        match code {
            ErrorCode::Permission => Self::PermissionDenied,
            ErrorCode::NoSpeech => Self::NoSpeechDetected,
            ErrorCode::Aborted => Self::SessionAborted,
            ErrorCode::Network => Self::TransientNetwork,
            ErrorCode::Other => Self::Unclassified,
        }
    }
}

/// What the manager should do about a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum RecoveryAction {
    /// Recycle the session without delay
    RestartNow,

    /// Recycle the session after the error restart delay
    RestartAfterDelay,

    /// Drop the session and settle to idle
    SettleIdle,

    /// Do nothing and wait for the next event
    Ignore,
}

/// Decide how to recover from a failure
///
/// A non-manual abort is ignored because the `ended` signal that follows it
/// drives the restart; acting on both would restart twice.
///
/// # Example
/// ```
/// use voicenav_lib::recognition::{decide, FailureClass, RecoveryAction};
///
/// assert_eq!(decide(FailureClass::PermissionDenied, false), RecoveryAction::SettleIdle);
/// assert_eq!(decide(FailureClass::SessionAborted, false), RecoveryAction::Ignore);
/// ```
pub fn decide(class: FailureClass, was_manual_stop: bool) -> RecoveryAction {
    match class {
        FailureClass::PermissionDenied => RecoveryAction::SettleIdle,
        FailureClass::SessionAborted if was_manual_stop => RecoveryAction::SettleIdle,
        FailureClass::SessionAborted => RecoveryAction::Ignore,
        FailureClass::TransientNetwork => RecoveryAction::RestartAfterDelay,
        FailureClass::NoSpeechDetected => RecoveryAction::Ignore,
        FailureClass::Unclassified => RecoveryAction::RestartAfterDelay,
    }
}
