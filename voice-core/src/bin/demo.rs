//! Terminal driver for the voice command manager
//!
//! Stands in for a platform speech engine: every line typed on stdin is
//! delivered as a finalized utterance, and a few `:`-prefixed lines drive the
//! session lifecycle.
//!
//! ```text
//! voicenav-demo [config.json]
//!
//! :start          start voice control
//! :stop           stop voice control
//! :end            simulate the engine ending the session on its own
//! :error <code>   simulate an engine error (e.g. network, no-speech, not-allowed)
//! :items <n>      change the number of orders on screen
//! :quit           exit
//! ```

use std::sync::{Arc, Mutex};

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, BufReader};

use voicenav_lib::config::{ConfigManager, VoiceConfig};
use voicenav_lib::recognition::{
    CaptureConfig, CaptureSession, CommandHandlers, ErrorCode, HostError, RecognitionManager,
    SignalSink, SpeechHost, VoiceEvent,
};
use voicenav_lib::status::StatusPresenter;
use voicenav_lib::utils::error::{AppError, AppResult};
use voicenav_lib::utils::logging::init_logging;

const DEFAULT_ITEM_COUNT: usize = 5;

/// Host whose "speech" comes from the terminal
#[derive(Clone, Default)]
struct TerminalHost {
    sink: Arc<Mutex<Option<SignalSink>>>,
}

impl TerminalHost {
    fn with_sink(&self, f: impl FnOnce(&SignalSink)) {
        match self.sink.lock() {
            Ok(guard) => match guard.as_ref() {
                Some(sink) => f(sink),
                None => println!("(no capture session is open)"),
            },
            Err(_) => tracing::error!("Terminal host sink lock poisoned"),
        }
    }
}

struct TerminalSession {
    sink: SignalSink,
}

impl CaptureSession for TerminalSession {
    fn start(&mut self) {
        self.sink.started();
    }

    fn stop(&mut self) {
        self.sink.ended();
    }
}

impl SpeechHost for TerminalHost {
    fn is_available(&self) -> bool {
        true
    }

    fn open_session(
        &self,
        config: &CaptureConfig,
        sink: SignalSink,
    ) -> Result<Box<dyn CaptureSession>, HostError> {
        tracing::debug!(
            language = %config.language,
            generation = sink.generation(),
            "Opening terminal session"
        );

        let mut current = self
            .sink
            .lock()
            .map_err(|_| HostError::OpenFailed("sink lock poisoned".to_string()))?;
        *current = Some(sink.clone());

        Ok(Box::new(TerminalSession { sink }))
    }
}

/// Print an error the way a UI would show it
fn report(err: &AppError) {
    let ctx = err.context();
    tracing::error!(code = ?ctx.code, detail = %ctx.detail, "Voice control error");

    println!("error: {}", ctx.message);
    if let Some(hint) = &ctx.recovery_hint {
        println!("hint: {}", hint);
    }
}

fn load_config(path: Option<&str>) -> AppResult<VoiceConfig> {
    match path {
        Some(path) => Ok(ConfigManager::load(path)?),
        None => Ok(VoiceConfig::default()),
    }
}

fn spawn_manager(host: &TerminalHost, config: &VoiceConfig) -> AppResult<RecognitionManager> {
    let handlers = CommandHandlers::new()
        .on_next(|| println!("-> next order"))
        .on_previous(|| println!("-> previous order"))
        .on_select(|index| println!("-> open order #{}", index + 1));

    Ok(RecognitionManager::spawn(
        host.clone(),
        config,
        DEFAULT_ITEM_COUNT,
        handlers,
    )?)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();

    let path = std::env::args().nth(1);
    let host = TerminalHost::default();

    let started = load_config(path.as_deref())
        .and_then(|config| Ok((spawn_manager(&host, &config)?, config)));
    let (manager, config) = match started {
        Ok(started) => started,
        Err(err) => {
            report(&err);
            return Err(err).context("voicenav demo failed to start");
        }
    };

    let mut presenter = StatusPresenter::start(manager.subscribe(), config.status.display_ms);
    let mut status_rx = presenter.subscribe();
    let status_task = tokio::spawn(async move {
        while status_rx.changed().await.is_ok() {
            let message = status_rx.borrow_and_update().clone();
            if message.visible {
                println!("[{:?}] {}", message.kind, message.text);
            }
        }
    });

    let mut events = manager.subscribe();
    let event_task = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            match event {
                VoiceEvent::StatusChanged(_) => {}
                other => tracing::debug!(event = other.name(), "Voice event"),
            }
        }
    });

    println!("voicenav demo: type :start to begin, :quit to exit");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("failed to read stdin")? {
        let line = line.trim();
        let (directive, argument) = match line.split_once(' ') {
            Some((directive, argument)) => (directive, argument.trim()),
            None => (line, ""),
        };

        match directive {
            "" => {}
            ":quit" => break,
            ":start" => {
                if let Err(e) = manager.start().await {
                    report(&AppError::from(e));
                }
            }
            ":stop" => manager.stop().await?,
            ":end" => host.with_sink(|sink| {
                sink.ended();
            }),
            ":error" => host.with_sink(|sink| {
                sink.error(ErrorCode::from_raw(argument));
            }),
            ":items" => match argument.parse::<usize>() {
                Ok(count) => manager.set_item_count(count).await?,
                Err(_) => println!("usage: :items <n>"),
            },
            _ => host.with_sink(|sink| {
                sink.result(line);
            }),
        }

        println!("state: {}", manager.state().name());
    }

    manager.shutdown().await;
    presenter.stop().await;
    status_task.abort();
    event_task.abort();

    Ok(())
}
