//! Continuous voice-command recognition
//!
//! Keeps a host capture session alive for as long as the user wants voice
//! control, recovers from failures according to the health policy, and turns
//! recognized utterances into commands.

/// Error types
pub mod error;

/// Manager event stream
pub mod events;

/// Host speech-recognition contract
pub mod host;

/// Recognition session manager
pub mod manager;

/// Failure classification and recovery policy
pub mod policy;

/// Manager state machine
pub mod state;

pub use error::{VoiceError, VoiceResult};
pub use events::{EventBus, VoiceEvent};
pub use host::{
    CaptureConfig, CaptureSession, ErrorCode, HostError, HostEvent, SessionSignal, SignalSink,
    SpeechHost,
};
pub use manager::{Callback, CommandHandlers, RecognitionManager, SelectCallback};
pub use policy::{decide, FailureClass, RecoveryAction};
pub use state::{ManagerState, SessionPhase, StateCell, StateError, StateResult};
