//! 状态提示器
//!
//! 监听管理器事件流中的 StatusChanged，显示最新消息并在固定时长后自动隐藏。
//! 新消息会替换旧消息并重新计时，旧消息的计时不会隐藏新消息。

use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::time::Instant;

use super::StatusMessage;
use crate::recognition::VoiceEvent;
use crate::utils::time::sleep_until_opt;

/// 默认显示时长（毫秒）
pub const DEFAULT_DISPLAY_MS: u64 = 3000;

/// 状态提示器
pub struct StatusPresenter {
    /// 停止信号发送器
    stop_tx: Option<mpsc::Sender<()>>,
    /// 当前显示的消息
    status_rx: watch::Receiver<StatusMessage>,
}

impl StatusPresenter {
    /// 创建并启动状态提示器
    ///
    /// # Arguments
    ///
    /// * `events` - 管理器事件订阅
    /// * `display_ms` - 每条消息的显示时长（毫秒）
    pub fn start(mut events: mpsc::UnboundedReceiver<VoiceEvent>, display_ms: u64) -> Self {
        let (stop_tx, mut stop_rx) = mpsc::channel::<()>(1);
        let (status_tx, status_rx) = watch::channel(StatusMessage::hidden());
        let display = Duration::from_millis(display_ms);

        tokio::spawn(async move {
            let mut hide_at: Option<Instant> = None;
            let mut events_closed = false;

            loop {
                tokio::select! {
                    // 接收管理器事件
                    event = events.recv(), if !events_closed => {
                        match event {
                            Some(VoiceEvent::StatusChanged(message)) => {
                                hide_at = Some(Instant::now() + display);
                                status_tx.send_replace(StatusMessage {
                                    visible: true,
                                    ..message
                                });
                            }
                            Some(_) => {}
                            None => {
                                tracing::debug!("Event stream closed, presenter draining");
                                events_closed = true;
                            }
                        }
                    }
                    // 到时隐藏
                    _ = sleep_until_opt(hide_at) => {
                        hide_at = None;
                        status_tx.send_modify(|message| message.visible = false);
                    }
                    // 接收停止信号
                    _ = stop_rx.recv() => {
                        tracing::debug!("StatusPresenter stopped");
                        break;
                    }
                }

                if events_closed && hide_at.is_none() {
                    break;
                }
            }
        });

        tracing::info!(display_ms = display_ms, "StatusPresenter started");
        Self {
            stop_tx: Some(stop_tx),
            status_rx,
        }
    }

    /// 获取当前消息
    pub fn current(&self) -> StatusMessage {
        self.status_rx.borrow().clone()
    }

    /// 订阅消息变化
    pub fn subscribe(&self) -> watch::Receiver<StatusMessage> {
        self.status_rx.clone()
    }

    /// 停止提示器
    pub async fn stop(&mut self) {
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.send(()).await;
        }
    }
}

impl Drop for StatusPresenter {
    fn drop(&mut self) {
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.try_send(());
        }
    }
}
