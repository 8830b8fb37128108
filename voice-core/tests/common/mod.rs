//! 测试辅助：可脚本化的宿主语音识别能力
//!
//! `ScriptedHost` 记录每个打开的会话，测试通过保存下来的 `SignalSink`
//! 以任意顺序注入 started / ended / error / result 信号。

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::mpsc;
use voicenav_lib::config::VoiceConfig;
use voicenav_lib::recognition::{
    CaptureConfig, CaptureSession, HostError, SignalSink, SpeechHost, VoiceEvent,
};
use voicenav_lib::status::StatusMessage;

#[derive(Default)]
struct HostLog {
    sinks: Vec<SignalSink>,
    configs: Vec<CaptureConfig>,
    open_error: Option<HostError>,
}

struct Inner {
    log: Mutex<HostLog>,
    available: AtomicBool,
    auto_start: AtomicBool,
    end_on_stop: AtomicBool,
    starts: AtomicUsize,
    stops: AtomicUsize,
}

/// 可脚本化的宿主
#[derive(Clone)]
pub struct ScriptedHost {
    inner: Arc<Inner>,
}

impl ScriptedHost {
    /// 会话启动后立即报告 started，停止后立即报告 ended
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                log: Mutex::new(HostLog::default()),
                available: AtomicBool::new(true),
                auto_start: AtomicBool::new(true),
                end_on_stop: AtomicBool::new(true),
                starts: AtomicUsize::new(0),
                stops: AtomicUsize::new(0),
            }),
        }
    }

    /// 没有语音识别能力的宿主
    pub fn unavailable() -> Self {
        let host = Self::new();
        host.set_available(false);
        host
    }

    /// 会话启动后不自动报告 started
    pub fn manual_start(self) -> Self {
        self.inner.auto_start.store(false, Ordering::SeqCst);
        self
    }

    /// stop() 之后不报告 ended（模拟卡死的宿主）
    pub fn silent_stop(self) -> Self {
        self.inner.end_on_stop.store(false, Ordering::SeqCst);
        self
    }

    pub fn set_available(&self, available: bool) {
        self.inner.available.store(available, Ordering::SeqCst);
    }

    /// 下一次 open_session 返回指定错误
    pub fn fail_next_open(&self, error: HostError) {
        self.inner.log.lock().unwrap().open_error = Some(error);
    }

    /// 已打开的会话数
    pub fn opened(&self) -> usize {
        self.inner.log.lock().unwrap().sinks.len()
    }

    pub fn starts(&self) -> usize {
        self.inner.starts.load(Ordering::SeqCst)
    }

    pub fn stops(&self) -> usize {
        self.inner.stops.load(Ordering::SeqCst)
    }

    /// 第 n 个会话（从 0 开始）的信号入口
    pub fn sink(&self, n: usize) -> SignalSink {
        self.inner.log.lock().unwrap().sinks[n].clone()
    }

    /// 最近打开的会话的信号入口
    pub fn latest(&self) -> SignalSink {
        let log = self.inner.log.lock().unwrap();
        log.sinks.last().cloned().expect("no session has been opened")
    }

    pub fn last_config(&self) -> Option<CaptureConfig> {
        self.inner.log.lock().unwrap().configs.last().cloned()
    }
}

struct ScriptedSession {
    sink: SignalSink,
    inner: Arc<Inner>,
}

impl CaptureSession for ScriptedSession {
    fn start(&mut self) {
        self.inner.starts.fetch_add(1, Ordering::SeqCst);
        if self.inner.auto_start.load(Ordering::SeqCst) {
            self.sink.started();
        }
    }

    fn stop(&mut self) {
        self.inner.stops.fetch_add(1, Ordering::SeqCst);
        if self.inner.end_on_stop.load(Ordering::SeqCst) {
            self.sink.ended();
        }
    }
}

impl SpeechHost for ScriptedHost {
    fn is_available(&self) -> bool {
        self.inner.available.load(Ordering::SeqCst)
    }

    fn open_session(
        &self,
        config: &CaptureConfig,
        sink: SignalSink,
    ) -> Result<Box<dyn CaptureSession>, HostError> {
        let mut log = self.inner.log.lock().unwrap();
        if let Some(error) = log.open_error.take() {
            return Err(error);
        }

        log.sinks.push(sink.clone());
        log.configs.push(config.clone());

        Ok(Box::new(ScriptedSession {
            sink,
            inner: Arc::clone(&self.inner),
        }))
    }
}

/// 测试用配置：默认计时，心跳关闭
pub fn quiet_config() -> VoiceConfig {
    let mut config = VoiceConfig::default();
    config.timing.heartbeat_enabled = false;
    config
}

/// 让管理器任务处理完已排队的消息
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(1)).await;
}

/// 取出当前已到达的所有事件
pub fn drain(rx: &mut mpsc::UnboundedReceiver<VoiceEvent>) -> Vec<VoiceEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

/// 只保留状态消息
pub fn statuses(events: &[VoiceEvent]) -> Vec<StatusMessage> {
    events
        .iter()
        .filter_map(|event| match event {
            VoiceEvent::StatusChanged(message) => Some(message.clone()),
            _ => None,
        })
        .collect()
}

/// 记录回调调用的计数器
#[derive(Clone, Default)]
pub struct Calls {
    pub next: Arc<AtomicUsize>,
    pub previous: Arc<AtomicUsize>,
    pub selected: Arc<Mutex<Vec<usize>>>,
}

impl Calls {
    pub fn handlers(&self) -> voicenav_lib::recognition::CommandHandlers {
        let next = Arc::clone(&self.next);
        let previous = Arc::clone(&self.previous);
        let selected = Arc::clone(&self.selected);

        voicenav_lib::recognition::CommandHandlers::new()
            .on_next(move || {
                next.fetch_add(1, Ordering::SeqCst);
            })
            .on_previous(move || {
                previous.fetch_add(1, Ordering::SeqCst);
            })
            .on_select(move |index| selected.lock().unwrap().push(index))
    }

    pub fn next(&self) -> usize {
        self.next.load(Ordering::SeqCst)
    }

    pub fn previous(&self) -> usize {
        self.previous.load(Ordering::SeqCst)
    }

    pub fn selected(&self) -> Vec<usize> {
        self.selected.lock().unwrap().clone()
    }

    pub fn total(&self) -> usize {
        self.next() + self.previous() + self.selected().len()
    }
}
