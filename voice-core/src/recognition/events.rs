//! 管理器事件模块
//!
//! 管理器向订阅者（UI、状态提示）按发射顺序推送的事件

use std::sync::Mutex;

use serde::Serialize;
use tokio::sync::mpsc;

use crate::grammar::Command;
use crate::status::StatusMessage;

/// 管理器事件
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", content = "payload", rename_all = "snake_case")]
pub enum VoiceEvent {
    /// 某一代会话已开始采集
    SessionStarted { generation: u64 },

    /// 识别到一条指令（包括 Unrecognized）
    CommandRecognized(Command),

    /// 需要提示用户的状态消息
    StatusChanged(StatusMessage),

    /// 管理器已回到空闲
    SessionStopped,
}

impl VoiceEvent {
    /// 获取事件名称（用于日志）
    pub fn name(&self) -> &'static str {
        match self {
            Self::SessionStarted { .. } => "SessionStarted",
            Self::CommandRecognized(_) => "CommandRecognized",
            Self::StatusChanged(_) => "StatusChanged",
            Self::SessionStopped => "SessionStopped",
        }
    }
}

/// 事件总线
///
/// 使用无界通道，保证每个订阅者按发射顺序收到全部事件
pub struct EventBus {
    /// 事件监听器列表
    listeners: Mutex<Vec<mpsc::UnboundedSender<VoiceEvent>>>,
}

impl EventBus {
    /// 创建新的事件总线
    pub fn new() -> Self {
        Self {
            listeners: Mutex::new(Vec::new()),
        }
    }

    /// 添加事件监听器
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<VoiceEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.lock().push(tx);
        rx
    }

    /// 向所有监听者发射事件，同时移除已关闭的监听器
    pub fn emit(&self, event: VoiceEvent) {
        tracing::trace!(event = event.name(), "Emitting voice event");
        self.lock().retain(|tx| tx.send(event.clone()).is_ok());
    }

    /// 获取当前监听器数量
    pub fn listener_count(&self) -> usize {
        let mut listeners = self.lock();
        listeners.retain(|tx| !tx.is_closed());
        listeners.len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<mpsc::UnboundedSender<VoiceEvent>>> {
        // 监听器列表在 panic 后仍然一致，直接恢复
        self.listeners
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emit_preserves_order() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe();

        bus.emit(VoiceEvent::SessionStarted { generation: 1 });
        bus.emit(VoiceEvent::CommandRecognized(Command::NextItem));
        bus.emit(VoiceEvent::SessionStopped);

        assert_eq!(rx.try_recv().unwrap(), VoiceEvent::SessionStarted { generation: 1 });
        assert_eq!(rx.try_recv().unwrap(), VoiceEvent::CommandRecognized(Command::NextItem));
        assert_eq!(rx.try_recv().unwrap(), VoiceEvent::SessionStopped);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_closed_listeners_are_pruned() {
        let bus = EventBus::new();
        let rx1 = bus.subscribe();
        let _rx2 = bus.subscribe();
        assert_eq!(bus.listener_count(), 2);

        drop(rx1);
        bus.emit(VoiceEvent::SessionStopped);
        assert_eq!(bus.listener_count(), 1);
    }

    #[test]
    fn test_event_serialization() {
        let json = serde_json::to_string(&VoiceEvent::SessionStarted { generation: 3 }).unwrap();
        assert!(json.contains("session_started"));
        assert!(json.contains("\"generation\":3"));

        let json =
            serde_json::to_string(&VoiceEvent::StatusChanged(StatusMessage::info("hi"))).unwrap();
        assert!(json.contains("status_changed"));
        assert!(json.contains("hi"));
    }
}
