//! 语音会话管理器模块
//!
//! 在用户需要语音控制期间保持采集会话常驻：会话自然结束后透明重建，
//! 按故障类别执行不同的恢复策略，并把识别到的语句转换为应用指令。
//!
//! # 并发模型
//!
//! 管理器运行在单独的 tokio 任务中，所有输入（UI 命令、宿主信号、三个计时器）
//! 通过一个 `select!` 循环逐个处理，每个处理函数运行完毕后才处理下一个事件，
//! 因此不需要任何锁。
//!
//! # 状态流转
//!
//! ```text
//! start()          started              ended (非手动)        restart 到期
//! Idle ──> Listening::Opening ──> Listening::Active ──> Listening::Restarting ──> 打开新会话
//!                                        │
//!                                 stop() │
//!                                        v
//!                                    Stopping ── ended / 宽限期超时 ──> Idle
//! ```
//!
//! # 不变量
//!
//! - 任何时刻最多只有一个存活的采集会话；旧会话终止（或宽限期超时被放弃）后才会打开新会话
//! - restart 与 heartbeat 计时器互斥；进入 Stopping 或 Idle 时两者都被清除
//! - 每个会话带有递增的 generation，来自旧会话的信号一律忽略

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::Instant;

use super::error::{VoiceError, VoiceResult};
use super::events::{EventBus, VoiceEvent};
use super::host::{
    CaptureConfig, CaptureSession, HostError, HostEvent, SessionSignal, SignalSink, SpeechHost,
};
use super::policy::{decide, FailureClass, RecoveryAction};
use super::state::{ManagerState, SessionPhase, StateCell};
use crate::config::{ConfigResult, TimingConfig, VoiceConfig};
use crate::grammar::{normalize, Command, CommandParser};
use crate::status::StatusMessage;
use crate::utils::time::sleep_until_opt;

/// 无参指令回调
pub type Callback = Box<dyn Fn() + Send + Sync>;

/// 选择指令回调（0 基索引）
pub type SelectCallback = Box<dyn Fn(usize) + Send + Sync>;

/// 指令回调集合
///
/// 在管理器任务中同步调用
///
/// # Examples
///
/// ```
/// use voicenav_lib::recognition::CommandHandlers;
///
/// let handlers = CommandHandlers::new()
///     .on_next(|| println!("next"))
///     .on_select(|index| println!("open {}", index));
/// ```
#[derive(Default)]
pub struct CommandHandlers {
    on_next: Option<Callback>,
    on_previous: Option<Callback>,
    on_select: Option<SelectCallback>,
}

impl CommandHandlers {
    /// 创建空的回调集合
    pub fn new() -> Self {
        Self::default()
    }

    /// 设置"下一项"回调
    pub fn on_next(mut self, callback: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_next = Some(Box::new(callback));
        self
    }

    /// 设置"上一项"回调
    pub fn on_previous(mut self, callback: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_previous = Some(Box::new(callback));
        self
    }

    /// 设置"选择"回调
    pub fn on_select(mut self, callback: impl Fn(usize) + Send + Sync + 'static) -> Self {
        self.on_select = Some(Box::new(callback));
        self
    }
}

/// 管理器命令
enum ManagerCommand {
    /// 启动语音控制
    Start {
        response: oneshot::Sender<VoiceResult<()>>,
    },
    /// 停止语音控制
    Stop { response: oneshot::Sender<()> },
    /// 更新列表长度
    SetItemCount { count: usize },
}

/// 语音会话管理器
///
/// UI 侧句柄；真正的状态机运行在后台任务中。
/// 必须在 tokio 运行时内创建。
pub struct RecognitionManager {
    /// 命令发送器
    command_tx: mpsc::Sender<ManagerCommand>,
    /// 当前状态（无锁读取）
    state: Arc<StateCell>,
    /// 事件总线
    bus: Arc<EventBus>,
    /// 管理器任务句柄
    task: JoinHandle<()>,
}

impl RecognitionManager {
    /// 创建管理器并启动后台任务
    ///
    /// # Arguments
    ///
    /// * `host` - 宿主语音识别能力
    /// * `config` - 语音控制配置
    /// * `item_count` - 当前可导航的列表长度
    /// * `handlers` - 指令回调
    ///
    /// # Errors
    ///
    /// 配置未通过 [`VoiceConfig::validate`] 时返回 [`crate::config::ConfigError::Invalid`]，
    /// 此时不会启动后台任务
    pub fn spawn<H: SpeechHost>(
        host: H,
        config: &VoiceConfig,
        item_count: usize,
        handlers: CommandHandlers,
    ) -> ConfigResult<Self> {
        config.validate()?;

        let (command_tx, command_rx) = mpsc::channel::<ManagerCommand>(16);
        let (signal_tx, signal_rx) = mpsc::unbounded_channel::<SessionSignal>();
        let state = Arc::new(StateCell::new());
        let bus = Arc::new(EventBus::new());

        let engine = Engine::new(
            host,
            config,
            item_count,
            handlers,
            Arc::clone(&state),
            Arc::clone(&bus),
            signal_tx,
        );
        let task = tokio::spawn(engine.run(command_rx, signal_rx));

        Ok(Self {
            command_tx,
            state,
            bus,
            task,
        })
    }

    /// 启动语音控制
    ///
    /// 已在监听时为空操作。
    ///
    /// # Errors
    ///
    /// 宿主没有语音识别能力时返回 [`VoiceError::CapabilityUnavailable`]，且状态不变
    pub async fn start(&self) -> VoiceResult<()> {
        self.request(|response| ManagerCommand::Start { response }).await?
    }

    /// 停止语音控制
    ///
    /// 取消所有待触发的重启与心跳；空闲时调用是安全的空操作
    pub async fn stop(&self) -> VoiceResult<()> {
        self.request(|response| ManagerCommand::Stop { response }).await
    }

    /// 更新可导航列表长度（用于越界检查）
    pub async fn set_item_count(&self, count: usize) -> VoiceResult<()> {
        self.command_tx
            .send(ManagerCommand::SetItemCount { count })
            .await
            .map_err(|_| VoiceError::ManagerClosed)
    }

    /// 检查是否在监听中（含重启间隙）
    pub fn is_listening(&self) -> bool {
        self.state.current().is_listening()
    }

    /// 获取当前状态
    pub fn state(&self) -> ManagerState {
        self.state.current()
    }

    /// 订阅管理器事件
    ///
    /// 事件按发射顺序到达
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<VoiceEvent> {
        self.bus.subscribe()
    }

    /// 关闭管理器
    ///
    /// 停止存活的会话并等待后台任务退出
    pub async fn shutdown(self) {
        let Self {
            command_tx, task, ..
        } = self;
        drop(command_tx);

        if let Err(e) = task.await {
            tracing::warn!(error = %e, "Recognition manager task ended abnormally");
        }
    }

    async fn request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<T>) -> ManagerCommand,
    ) -> VoiceResult<T> {
        let (response_tx, response_rx) = oneshot::channel();

        self.command_tx
            .send(make(response_tx))
            .await
            .map_err(|_| VoiceError::ManagerClosed)?;

        response_rx.await.map_err(|_| VoiceError::ManagerClosed)
    }
}

/// 存活的采集会话
struct LiveSession {
    generation: u64,
    handle: Box<dyn CaptureSession>,
    /// 已收到 started
    started: bool,
    /// 已请求 stop，等待 ended
    closing: bool,
}

/// 管理器计时器
///
/// restart 与 heartbeat 互斥；grace 只在等待会话终止时存在
#[derive(Debug, Default)]
struct Timers {
    restart: Option<Instant>,
    heartbeat: Option<Instant>,
    grace: Option<Instant>,
}

impl Timers {
    fn arm_restart(&mut self, delay: Duration) {
        self.heartbeat = None;
        self.restart = Some(Instant::now() + delay);
    }

    fn arm_heartbeat(&mut self, interval: Duration) -> bool {
        if self.restart.is_some() {
            return false;
        }
        self.heartbeat = Some(Instant::now() + interval);
        true
    }

    fn arm_grace(&mut self, grace: Duration) {
        self.grace = Some(Instant::now() + grace);
    }

    fn cancel_recovery(&mut self) {
        self.restart = None;
        self.heartbeat = None;
    }

    fn clear(&mut self) {
        *self = Self::default();
    }
}

/// 管理器状态机
///
/// 仅由后台任务持有和修改
struct Engine<H> {
    host: H,
    capture: CaptureConfig,
    timing: TimingConfig,
    parser: CommandParser,
    handlers: CommandHandlers,
    item_count: usize,
    state: Arc<StateCell>,
    bus: Arc<EventBus>,
    signal_tx: mpsc::UnboundedSender<SessionSignal>,
    generation: u64,
    session: Option<LiveSession>,
    /// 用户主动停止
    manual_stop: bool,
    /// 停止过程中收到 start，旧会话终止后重新启动
    start_after_stop: bool,
    /// restart 到期时旧会话仍存活，等它 ended 后立即打开新会话
    reopen_on_end: bool,
    /// 用户 start() 之后尚未发出"开始监听"提示
    announce_start: bool,
    timers: Timers,
}

impl<H: SpeechHost> Engine<H> {
    fn new(
        host: H,
        config: &VoiceConfig,
        item_count: usize,
        handlers: CommandHandlers,
        state: Arc<StateCell>,
        bus: Arc<EventBus>,
        signal_tx: mpsc::UnboundedSender<SessionSignal>,
    ) -> Self {
        Self {
            host,
            capture: config.capture.clone(),
            timing: config.timing.clone(),
            parser: CommandParser::new(&config.grammar),
            handlers,
            item_count,
            state,
            bus,
            signal_tx,
            generation: 0,
            session: None,
            manual_stop: false,
            start_after_stop: false,
            reopen_on_end: false,
            announce_start: false,
            timers: Timers::default(),
        }
    }

    async fn run(
        mut self,
        mut commands: mpsc::Receiver<ManagerCommand>,
        mut signals: mpsc::UnboundedReceiver<SessionSignal>,
    ) {
        tracing::info!("Recognition manager started");

        loop {
            tokio::select! {
                // 接收 UI 命令
                command = commands.recv() => {
                    match command {
                        Some(command) => self.handle_command(command),
                        None => break,
                    }
                }
                // 接收宿主信号
                Some(signal) = signals.recv() => self.handle_signal(signal),
                // 停止宽限期
                _ = sleep_until_opt(self.timers.grace) => self.on_grace_expired(),
                // 延迟重启
                _ = sleep_until_opt(self.timers.restart) => self.on_restart_due(),
                // 心跳回收
                _ = sleep_until_opt(self.timers.heartbeat) => self.on_heartbeat(),
            }
        }

        self.teardown();
        tracing::info!("Recognition manager stopped");
    }

    fn handle_command(&mut self, command: ManagerCommand) {
        match command {
            ManagerCommand::Start { response } => {
                let result = self.handle_start();
                let _ = response.send(result);
            }
            ManagerCommand::Stop { response } => {
                self.handle_stop();
                let _ = response.send(());
            }
            ManagerCommand::SetItemCount { count } => {
                tracing::debug!(count = count, "Item count updated");
                self.item_count = count;
            }
        }
    }

    fn handle_start(&mut self) -> VoiceResult<()> {
        let current = self.state.current();

        if current.is_listening() {
            tracing::warn!(
                state = current.name(),
                "Start requested while already listening, ignoring"
            );
            return Ok(());
        }

        if !self.host.is_available() {
            tracing::warn!("Speech recognition capability unavailable");
            return Err(VoiceError::CapabilityUnavailable);
        }

        if current.is_stopping() {
            tracing::info!("Start requested while stopping, resuming once the session ends");
            self.start_after_stop = true;
            return Ok(());
        }

        self.begin_listening()
    }

    /// 打开会话成功（或进入重试）后才离开 Idle
    fn begin_listening(&mut self) -> VoiceResult<()> {
        match self.open_session() {
            Ok(()) => {
                self.enter_listening(SessionPhase::Opening);
                Ok(())
            }
            Err(HostError::CapabilityUnavailable) => {
                tracing::warn!("Host refused to open a session: capability unavailable");
                Err(VoiceError::CapabilityUnavailable)
            }
            Err(err) => {
                tracing::warn!(error = %err, "Failed to open capture session, retrying");
                self.enter_listening(SessionPhase::Restarting);
                self.schedule_restart(
                    self.timing.error_restart_delay(),
                    Some(StatusMessage::info("Voice recognition unavailable, retrying...")),
                );
                Ok(())
            }
        }
    }

    fn enter_listening(&mut self, phase: SessionPhase) {
        self.manual_stop = false;
        self.reopen_on_end = false;
        self.announce_start = true;
        self.transition(ManagerState::Listening(phase));
    }

    fn handle_stop(&mut self) {
        match self.state.current() {
            ManagerState::Idle => {
                tracing::debug!("Stop requested while idle, nothing to do");
            }
            ManagerState::Stopping => {
                tracing::debug!("Stop already in progress");
                self.start_after_stop = false;
            }
            ManagerState::Listening(_) => {
                tracing::info!("Stopping voice control");
                self.manual_stop = true;
                self.start_after_stop = false;
                self.reopen_on_end = false;
                self.timers.cancel_recovery();
                self.transition(ManagerState::Stopping);

                match self.session.as_mut() {
                    Some(live) => {
                        if !live.closing {
                            live.closing = true;
                            live.handle.stop();
                        }
                        self.timers.arm_grace(self.timing.stop_grace());
                    }
                    None => self.settle_idle(None),
                }
            }
        }
    }

    fn handle_signal(&mut self, signal: SessionSignal) {
        let SessionSignal { generation, event } = signal;

        if !self.is_current(generation) {
            tracing::debug!(
                generation = generation,
                current = self.generation,
                event = ?event,
                "Ignoring signal from stale session"
            );
            return;
        }

        match event {
            HostEvent::Started => self.on_started(),
            HostEvent::Ended => self.on_ended(),
            HostEvent::Error(code) => self.on_error(FailureClass::from(code)),
            HostEvent::Result(text) => self.on_result(&text),
        }
    }

    fn on_started(&mut self) {
        let Some(live) = self.session.as_mut() else {
            return;
        };

        if live.started {
            tracing::debug!(generation = live.generation, "Duplicate started signal ignored");
            return;
        }
        live.started = true;
        let generation = live.generation;

        if live.closing {
            tracing::debug!(generation = generation, "Session started after stop was requested");
            return;
        }

        if !self.state.current().is_listening() {
            return;
        }

        self.transition(ManagerState::Listening(SessionPhase::Active));
        self.arm_heartbeat();
        self.bus.emit(VoiceEvent::SessionStarted { generation });

        if std::mem::take(&mut self.announce_start) {
            self.emit_status(StatusMessage::success("Listening for voice commands"));
        }

        tracing::info!(generation = generation, "Capture session started");
    }

    fn on_ended(&mut self) {
        let Some(live) = self.session.take() else {
            return;
        };
        self.timers.grace = None;

        tracing::debug!(generation = live.generation, "Capture session ended");
        self.session_closed();
    }

    fn on_grace_expired(&mut self) {
        self.timers.grace = None;

        let Some(live) = self.session.take() else {
            return;
        };

        tracing::warn!(
            generation = live.generation,
            "Capture session did not end within grace period, abandoning it"
        );
        self.session_closed();
    }

    /// 会话已终止（或被放弃）后的统一处理
    fn session_closed(&mut self) {
        if self.manual_stop || self.state.current().is_stopping() {
            self.settle_idle(None);
            return;
        }

        if !self.state.current().is_listening() {
            return;
        }

        if self.reopen_on_end {
            self.reopen_on_end = false;
            self.reopen();
        } else if self.timers.restart.is_none() {
            tracing::info!(
                delay_ms = self.timing.restart_delay_ms,
                "Capture session ended unexpectedly, scheduling restart"
            );
            self.schedule_restart(self.timing.restart_delay(), None);
        }
    }

    fn on_error(&mut self, class: FailureClass) {
        let was_manual_stop = self.manual_stop || self.state.current().is_stopping();
        let action = decide(class, was_manual_stop);

        tracing::debug!(class = ?class, action = ?action, was_manual_stop, "Session error");

        match action {
            RecoveryAction::Ignore => match class {
                FailureClass::NoSpeechDetected => {
                    self.emit_status(StatusMessage::info("No speech detected"));
                }
                // 随后的 ended 负责重启
                FailureClass::SessionAborted => {
                    self.emit_status(StatusMessage::info("Voice recognition interrupted"));
                }
                _ => {}
            },
            RecoveryAction::SettleIdle if class == FailureClass::PermissionDenied => {
                tracing::error!("Microphone permission denied, voice control halted");
                self.start_after_stop = false;
                self.settle_idle(Some(StatusMessage::error(
                    "Microphone permission denied. Allow access, then start voice control again.",
                )));
            }
            RecoveryAction::SettleIdle => self.settle_idle(None),
            RecoveryAction::RestartAfterDelay => {
                self.recover(class, self.timing.error_restart_delay())
            }
            RecoveryAction::RestartNow => self.recover(class, Duration::ZERO),
        }
    }

    fn recover(&mut self, class: FailureClass, delay: Duration) {
        if !self.state.current().is_listening() {
            tracing::debug!(class = ?class, "Recovery skipped, stop in progress");
            return;
        }

        tracing::warn!(
            class = ?class,
            delay_ms = delay.as_millis() as u64,
            "Recoverable session error, scheduling restart"
        );

        let text = match class {
            FailureClass::TransientNetwork => "Connection problem, reconnecting...",
            _ => "Voice recognition interrupted, restarting...",
        };
        self.schedule_restart(delay, Some(StatusMessage::info(text)));
    }

    fn on_restart_due(&mut self) {
        self.timers.restart = None;

        if self.manual_stop || !self.state.current().is_listening() {
            return;
        }

        match self.session.as_mut() {
            Some(live) => {
                tracing::debug!(
                    generation = live.generation,
                    "Waiting for previous session to end before restarting"
                );
                if !live.closing {
                    live.closing = true;
                    live.handle.stop();
                }
                self.reopen_on_end = true;
                if self.timers.grace.is_none() {
                    self.timers.arm_grace(self.timing.stop_grace());
                }
            }
            None => self.reopen(),
        }
    }

    fn on_heartbeat(&mut self) {
        self.timers.heartbeat = None;

        if self.manual_stop
            || self.timers.restart.is_some()
            || self.state.current() != ManagerState::Listening(SessionPhase::Active)
        {
            return;
        }

        let Some(live) = self.session.as_mut() else {
            return;
        };
        if live.closing {
            return;
        }

        tracing::info!(generation = live.generation, "Heartbeat: recycling capture session");
        live.closing = true;
        live.handle.stop();
        self.timers.arm_grace(self.timing.stop_grace());
    }

    fn on_result(&mut self, text: &str) {
        if !self.state.current().is_listening() {
            tracing::debug!("Result ignored while stopping");
            return;
        }

        let utterance = normalize(text);
        if utterance.is_empty() {
            return;
        }

        let command = self.parser.parse(&utterance);
        tracing::info!(utterance = %utterance, command = command.name(), "Utterance recognized");

        self.bus.emit(VoiceEvent::CommandRecognized(command.clone()));
        self.dispatch(command, &utterance);
    }

    fn dispatch(&self, command: Command, utterance: &str) {
        match command {
            Command::NextItem => {
                if let Some(callback) = &self.handlers.on_next {
                    callback();
                }
                self.emit_status(StatusMessage::success("Next order"));
            }
            Command::PreviousItem => {
                if let Some(callback) = &self.handlers.on_previous {
                    callback();
                }
                self.emit_status(StatusMessage::success("Previous order"));
            }
            Command::SelectItem { index } => {
                let in_range = usize::try_from(index)
                    .ok()
                    .filter(|&index| index < self.item_count);

                match in_range {
                    Some(index) => {
                        if let Some(callback) = &self.handlers.on_select {
                            callback(index);
                        }
                        self.emit_status(StatusMessage::success(format!(
                            "Opening order {}",
                            index + 1
                        )));
                    }
                    None => {
                        tracing::info!(
                            index = index,
                            item_count = self.item_count,
                            "Selection out of range"
                        );
                        let text = if self.item_count == 0 {
                            "There are no orders to open".to_string()
                        } else {
                            format!(
                                "Order {} is out of range (1-{})",
                                index.saturating_add(1),
                                self.item_count
                            )
                        };
                        self.emit_status(StatusMessage::error(text));
                    }
                }
            }
            Command::Unrecognized => {
                self.emit_status(StatusMessage::info(format!(
                    "Didn't catch that: \"{}\"",
                    utterance
                )));
            }
        }
    }

    fn open_session(&mut self) -> Result<(), HostError> {
        if let Some(live) = &self.session {
            tracing::error!(
                generation = live.generation,
                "Refusing to open a second capture session"
            );
            return Ok(());
        }

        self.generation += 1;
        let generation = self.generation;
        let sink = SignalSink::new(generation, self.signal_tx.clone());

        let mut handle = self.host.open_session(&self.capture, sink)?;
        handle.start();

        tracing::info!(
            generation = generation,
            language = %self.capture.language,
            "Capture session opened"
        );
        self.session = Some(LiveSession {
            generation,
            handle,
            started: false,
            closing: false,
        });

        Ok(())
    }

    fn reopen(&mut self) {
        self.transition(ManagerState::Listening(SessionPhase::Restarting));

        match self.open_session() {
            Ok(()) => {}
            Err(HostError::CapabilityUnavailable) => {
                tracing::error!("Speech recognition disappeared during restart");
                self.settle_idle(Some(StatusMessage::error(
                    "Speech recognition is no longer available",
                )));
            }
            Err(err) => {
                tracing::warn!(error = %err, "Failed to reopen capture session, retrying");
                self.timers.arm_restart(self.timing.error_restart_delay());
            }
        }
    }

    fn schedule_restart(&mut self, delay: Duration, status: Option<StatusMessage>) {
        self.timers.arm_restart(delay);
        if self.state.current().is_listening() {
            self.transition(ManagerState::Listening(SessionPhase::Restarting));
        }
        if let Some(status) = status {
            self.emit_status(status);
        }
    }

    fn arm_heartbeat(&mut self) {
        if let Some(interval) = self.timing.heartbeat_interval() {
            if self.timers.arm_heartbeat(interval) {
                tracing::debug!(interval_ms = self.timing.heartbeat_interval_ms, "Heartbeat armed");
            }
        }
    }

    /// 落回空闲
    ///
    /// 清除所有计时器，放弃仍存活的会话句柄，发射 SessionStopped 与状态消息
    fn settle_idle(&mut self, status: Option<StatusMessage>) {
        self.timers.clear();
        self.reopen_on_end = false;
        self.announce_start = false;

        if let Some(mut live) = self.session.take() {
            if !live.closing {
                live.handle.stop();
            }
            tracing::debug!(generation = live.generation, "Abandoning capture session handle");
        }

        if self.state.current().is_idle() {
            return;
        }

        self.transition(ManagerState::Idle);
        tracing::info!("Voice control stopped");
        self.bus.emit(VoiceEvent::SessionStopped);
        self.emit_status(status.unwrap_or_else(|| StatusMessage::info("Voice control stopped")));

        if std::mem::take(&mut self.start_after_stop) {
            tracing::info!("Resuming voice control after stop");
            if let Err(e) = self.begin_listening() {
                tracing::warn!(error = %e, "Failed to resume voice control");
                self.emit_status(StatusMessage::error(e.to_string()));
            }
        }
    }

    fn teardown(&mut self) {
        self.start_after_stop = false;
        self.settle_idle(None);
    }

    fn is_current(&self, generation: u64) -> bool {
        self.session
            .as_ref()
            .is_some_and(|live| live.generation == generation)
    }

    fn emit_status(&self, status: StatusMessage) {
        self.bus.emit(VoiceEvent::StatusChanged(status));
    }

    fn transition(&self, new_state: ManagerState) {
        if let Err(e) = self.state.transition(new_state) {
            tracing::warn!(error = %e, "Rejected state transition");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_restart_clears_heartbeat() {
        let mut timers = Timers::default();

        assert!(timers.arm_heartbeat(Duration::from_secs(30)));
        timers.arm_restart(Duration::from_millis(300));

        assert!(timers.restart.is_some());
        assert!(timers.heartbeat.is_none());
    }

    #[test]
    fn test_heartbeat_refused_while_restart_pending() {
        let mut timers = Timers::default();
        timers.arm_restart(Duration::from_millis(300));

        assert!(!timers.arm_heartbeat(Duration::from_secs(30)));
        assert!(timers.heartbeat.is_none());
    }

    #[test]
    fn test_cancel_recovery_keeps_grace() {
        let mut timers = Timers::default();
        timers.arm_restart(Duration::from_millis(300));
        timers.arm_grace(Duration::from_secs(2));

        timers.cancel_recovery();
        assert!(timers.restart.is_none());
        assert!(timers.grace.is_some());

        timers.clear();
        assert!(timers.grace.is_none());
    }

    /// 在 open_session 内部记录管理器状态，然后拒绝打开
    struct RefusingHost {
        state: Arc<StateCell>,
        seen: Arc<std::sync::Mutex<Vec<ManagerState>>>,
    }

    impl SpeechHost for RefusingHost {
        fn is_available(&self) -> bool {
            true
        }

        fn open_session(
            &self,
            _config: &CaptureConfig,
            _sink: SignalSink,
        ) -> Result<Box<dyn CaptureSession>, HostError> {
            self.seen.lock().unwrap().push(self.state.current());
            Err(HostError::CapabilityUnavailable)
        }
    }

    #[test]
    fn test_refused_open_never_leaves_idle() {
        let state = Arc::new(StateCell::new());
        let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
        let (signal_tx, _signal_rx) = mpsc::unbounded_channel();
        let host = RefusingHost {
            state: Arc::clone(&state),
            seen: Arc::clone(&seen),
        };

        let mut engine = Engine::new(
            host,
            &VoiceConfig::default(),
            5,
            CommandHandlers::new(),
            Arc::clone(&state),
            Arc::new(EventBus::new()),
            signal_tx,
        );

        assert_eq!(engine.handle_start(), Err(VoiceError::CapabilityUnavailable));
        assert_eq!(*seen.lock().unwrap(), vec![ManagerState::Idle]);
        assert_eq!(state.current(), ManagerState::Idle);
        assert!(!engine.announce_start);
    }

    #[test]
    fn test_command_handlers_builder() {
        let handlers = CommandHandlers::new().on_next(|| {}).on_select(|_| {});

        assert!(handlers.on_next.is_some());
        assert!(handlers.on_previous.is_none());
        assert!(handlers.on_select.is_some());
    }
}
