//! Host speech-recognition capability
//!
//! The platform's speech-to-text engine is an external collaborator. This
//! module defines the contract the manager consumes: open a capture session,
//! start and stop it (fire-and-forget), and observe its lifecycle through
//! signals delivered on a [`SignalSink`].

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc;

/// Settings passed to the host when a capture session is opened
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// BCP 47 language tag (e.g., "en-US")
    pub language: String,

    /// Keep listening after each final result
    pub continuous: bool,

    /// Deliver interim (non-final) results
    pub interim_results: bool,
}

impl CaptureConfig {
    /// Create a configuration for the given language
    pub fn new(language: impl Into<String>) -> Self {
        Self {
            language: language.into(),
            ..Self::default()
        }
    }

    /// Enable interim results
    pub fn with_interim_results(mut self) -> Self {
        self.interim_results = true;
        self
    }
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            language: "en-US".to_string(),
            continuous: true,
            interim_results: false,
        }
    }
}

/// Error codes reported by the host on a live session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorCode {
    /// Microphone or recognition permission refused
    Permission,

    /// No speech was heard before the host gave up
    NoSpeech,

    /// The session was aborted
    Aborted,

    /// The recognition service could not be reached
    Network,

    /// Anything else the host reports
    Other,
}

impl ErrorCode {
    /// Map a host error string onto the closed code set
    ///
    /// # Example
    /// ```
    /// use voicenav_lib::recognition::ErrorCode;
    ///
    /// assert_eq!(ErrorCode::from_raw("not-allowed"), ErrorCode::Permission);
    /// assert_eq!(ErrorCode::from_raw("audio-capture"), ErrorCode::Other);
    /// ```
    pub fn from_raw(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "permission" | "not-allowed" | "service-not-allowed" => Self::Permission,
            "no-speech" | "nospeech" => Self::NoSpeech,
            "aborted" => Self::Aborted,
            "network" => Self::Network,
            _ => Self::Other,
        }
    }
}

/// Lifecycle and result events emitted by a capture session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostEvent {
    /// The session is capturing
    Started,

    /// The session terminated (for any reason)
    Ended,

    /// The session reported an error
    Error(ErrorCode),

    /// A finalized utterance
    Result(String),
}

/// A host event tagged with the generation of the session that produced it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSignal {
    /// Generation of the originating session
    pub generation: u64,

    /// The event itself
    pub event: HostEvent,
}

/// Delivery handle given to the host for one capture session
///
/// Every event sent through a sink carries the generation the sink was
/// created with, so the manager can discard events from sessions it has
/// already moved past.
#[derive(Debug, Clone)]
pub struct SignalSink {
    generation: u64,
    tx: mpsc::UnboundedSender<SessionSignal>,
}

impl SignalSink {
    /// Create a sink for the given session generation
    pub fn new(generation: u64, tx: mpsc::UnboundedSender<SessionSignal>) -> Self {
        Self { generation, tx }
    }

    /// Generation this sink stamps onto events
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Deliver an event
    ///
    /// Returns `false` if the manager is gone.
    pub fn emit(&self, event: HostEvent) -> bool {
        self.tx
            .send(SessionSignal {
                generation: self.generation,
                event,
            })
            .is_ok()
    }

    /// Report that capture has started
    pub fn started(&self) -> bool {
        self.emit(HostEvent::Started)
    }

    /// Report that the session has terminated
    pub fn ended(&self) -> bool {
        self.emit(HostEvent::Ended)
    }

    /// Report a session error
    pub fn error(&self, code: ErrorCode) -> bool {
        self.emit(HostEvent::Error(code))
    }

    /// Report a finalized utterance
    pub fn result(&self, text: impl Into<String>) -> bool {
        self.emit(HostEvent::Result(text.into()))
    }
}

/// Errors raised synchronously when opening a session
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HostError {
    /// The host has no speech-recognition capability
    #[error("Speech recognition is not available on this host")]
    CapabilityUnavailable,

    /// The host refused to open a session
    #[error("Failed to open capture session: {0}")]
    OpenFailed(String),
}

/// One live connection to the host's speech-to-text capability
pub trait CaptureSession: Send {
    /// Begin capturing; completion is observed as [`HostEvent::Started`]
    fn start(&mut self);

    /// Request termination; completion is observed as [`HostEvent::Ended`]
    fn stop(&mut self);
}

/// The platform speech-recognition capability
pub trait SpeechHost: Send + Sync + 'static {
    /// Whether speech recognition exists at all on this host
    fn is_available(&self) -> bool;

    /// Open a new capture session whose events are delivered on `sink`
    fn open_session(
        &self,
        config: &CaptureConfig,
        sink: SignalSink,
    ) -> Result<Box<dyn CaptureSession>, HostError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_config_default() {
        let config = CaptureConfig::default();

        assert_eq!(config.language, "en-US");
        assert!(config.continuous);
        assert!(!config.interim_results);
    }

    #[test]
    fn test_capture_config_builder() {
        let config = CaptureConfig::new("de-DE").with_interim_results();

        assert_eq!(config.language, "de-DE");
        assert!(config.continuous);
        assert!(config.interim_results);
    }

    #[test]
    fn test_error_code_from_raw() {
        assert_eq!(ErrorCode::from_raw("not-allowed"), ErrorCode::Permission);
        assert_eq!(ErrorCode::from_raw("service-not-allowed"), ErrorCode::Permission);
        assert_eq!(ErrorCode::from_raw("Permission"), ErrorCode::Permission);
        assert_eq!(ErrorCode::from_raw("no-speech"), ErrorCode::NoSpeech);
        assert_eq!(ErrorCode::from_raw("aborted"), ErrorCode::Aborted);
        assert_eq!(ErrorCode::from_raw(" network "), ErrorCode::Network);
        assert_eq!(ErrorCode::from_raw("language-not-supported"), ErrorCode::Other);
    }

    #[test]
    fn test_sink_stamps_generation() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let sink = SignalSink::new(7, tx);

        assert!(sink.started());
        assert!(sink.result("next"));

        let first = rx.try_recv().unwrap();
        assert_eq!(first.generation, 7);
        assert_eq!(first.event, HostEvent::Started);

        let second = rx.try_recv().unwrap();
        assert_eq!(second.event, HostEvent::Result("next".to_string()));
    }

    #[test]
    fn test_sink_reports_closed_manager() {
        let (tx, rx) = mpsc::unbounded_channel();
        let sink = SignalSink::new(1, tx);
        drop(rx);

        assert!(!sink.ended());
    }

    #[test]
    fn test_host_error_display() {
        let err = HostError::OpenFailed("busy".to_string());
        assert!(err.to_string().contains("busy"));
        assert!(HostError::CapabilityUnavailable.to_string().contains("not available"));
    }
}
