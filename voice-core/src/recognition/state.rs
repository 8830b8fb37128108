//! 管理器状态模块
//!
//! 定义语音会话管理器的状态机以及无锁的状态单元

use std::sync::Arc;

use arc_swap::ArcSwap;
use serde::Serialize;
use thiserror::Error;

/// 监听子状态
///
/// 表示 Listening 阶段内会话的具体状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SessionPhase {
    /// 用户刚启动，等待首个 started 信号
    Opening,

    /// 会话正常运行，事件持续到达
    Active,

    /// 上一个会话已结束或正在回收，新会话尚未 started
    Restarting,
}

/// 管理器主状态
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum ManagerState {
    /// 空闲：没有会话，也没有启动请求
    #[default]
    Idle,

    /// 监听中（含重启间隙）
    Listening(SessionPhase),

    /// 已请求停止，等待终止信号
    Stopping,
}

impl ManagerState {
    /// 检查是否为空闲状态
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    /// 检查是否在监听中
    pub fn is_listening(&self) -> bool {
        matches!(self, Self::Listening(_))
    }

    /// 检查是否正在停止
    pub fn is_stopping(&self) -> bool {
        matches!(self, Self::Stopping)
    }

    /// 获取监听子状态（如果处于监听状态）
    pub fn phase(&self) -> Option<SessionPhase> {
        match self {
            Self::Listening(phase) => Some(*phase),
            _ => None,
        }
    }

    /// 获取状态名称（用于日志和调试）
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::Listening(SessionPhase::Opening) => "Listening::Opening",
            Self::Listening(SessionPhase::Active) => "Listening::Active",
            Self::Listening(SessionPhase::Restarting) => "Listening::Restarting",
            Self::Stopping => "Stopping",
        }
    }
}


/// 状态相关错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StateError {
    /// 无效的状态转换
    #[error("Invalid state transition from {from:?} to {to:?}")]
    InvalidTransition {
        from: ManagerState,
        to: ManagerState,
    },
}

/// 状态模块的结果类型
pub type StateResult<T> = Result<T, StateError>;

/// 状态单元
///
/// 只有管理器任务写入；UI 侧通过 [`StateCell::current`] 无锁读取
pub struct StateCell {
    /// 当前状态（使用 ArcSwap 实现无锁读取）
    state: ArcSwap<ManagerState>,
}

impl StateCell {
    /// 创建新的状态单元
    ///
    /// # Examples
    ///
    /// ```
    /// use voicenav_lib::recognition::StateCell;
    ///
    /// let cell = StateCell::new();
    /// assert!(cell.current().is_idle());
    /// ```
    pub fn new() -> Self {
        Self {
            state: ArcSwap::new(Arc::new(ManagerState::Idle)),
        }
    }

    /// 获取当前状态
    pub fn current(&self) -> ManagerState {
        **self.state.load()
    }

    /// 转换到新状态
    ///
    /// # Errors
    ///
    /// 如果状态转换不合法，返回 [`StateError::InvalidTransition`]
    ///
    /// # Examples
    ///
    /// ```
    /// use voicenav_lib::recognition::{ManagerState, SessionPhase, StateCell};
    ///
    /// let cell = StateCell::new();
    /// assert!(cell.transition(ManagerState::Listening(SessionPhase::Opening)).is_ok());
    /// assert!(cell.transition(ManagerState::Stopping).is_ok());
    ///
    /// // Stopping 只能落回 Idle
    /// assert!(cell.transition(ManagerState::Listening(SessionPhase::Active)).is_err());
    /// ```
    pub fn transition(&self, new_state: ManagerState) -> StateResult<()> {
        let current = self.current();

        if !Self::is_valid_transition(current, new_state) {
            return Err(StateError::InvalidTransition {
                from: current,
                to: new_state,
            });
        }

        self.state.store(Arc::new(new_state));
        tracing::debug!(from = current.name(), to = new_state.name(), "State transition");
        Ok(())
    }

    /// 强制设置状态（跳过验证）
    ///
    /// **警告**: 仅用于恢复路径
    pub fn force_set(&self, new_state: ManagerState) {
        self.state.store(Arc::new(new_state));
    }

    /// 重置为空闲状态
    pub fn reset(&self) {
        self.force_set(ManagerState::Idle);
    }

    /// 验证状态转换是否合法
    fn is_valid_transition(from: ManagerState, to: ManagerState) -> bool {
        use ManagerState::*;

        match (from, to) {
            // 启动
            (Idle, Listening(_)) => true,

            // 子状态切换
            (Listening(_), Listening(_)) => true,

            // 用户停止
            (Listening(_), Stopping) => true,

            // 致命错误直接落回空闲
            (Listening(_), Idle) => true,

            // 终止信号到达或宽限期超时
            (Stopping, Idle) => true,

            _ => false,
        }
    }
}

impl Default for StateCell {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manager_state_predicates() {
        assert!(ManagerState::Idle.is_idle());
        assert!(ManagerState::Listening(SessionPhase::Active).is_listening());
        assert!(ManagerState::Listening(SessionPhase::Restarting).is_listening());
        assert!(ManagerState::Stopping.is_stopping());
        assert!(!ManagerState::Stopping.is_listening());

        assert_eq!(
            ManagerState::Listening(SessionPhase::Opening).phase(),
            Some(SessionPhase::Opening)
        );
        assert_eq!(ManagerState::Idle.phase(), None);
    }

    #[test]
    fn test_state_names() {
        assert_eq!(ManagerState::Idle.name(), "Idle");
        assert_eq!(
            ManagerState::Listening(SessionPhase::Active).name(),
            "Listening::Active"
        );
        assert_eq!(ManagerState::Stopping.name(), "Stopping");
    }

    #[test]
    fn test_valid_lifecycle() {
        let cell = StateCell::new();

        assert!(cell.transition(ManagerState::Listening(SessionPhase::Opening)).is_ok());
        assert!(cell.transition(ManagerState::Listening(SessionPhase::Active)).is_ok());
        assert!(cell.transition(ManagerState::Listening(SessionPhase::Restarting)).is_ok());
        assert!(cell.transition(ManagerState::Stopping).is_ok());
        assert!(cell.transition(ManagerState::Idle).is_ok());
        assert!(cell.current().is_idle());
    }

    #[test]
    fn test_invalid_transitions() {
        let cell = StateCell::new();

        // Idle -> Stopping (invalid)
        let result = cell.transition(ManagerState::Stopping);
        assert!(matches!(result, Err(StateError::InvalidTransition { .. })));

        // Idle -> Idle (invalid)
        assert!(cell.transition(ManagerState::Idle).is_err());

        cell.transition(ManagerState::Listening(SessionPhase::Opening)).unwrap();
        cell.transition(ManagerState::Stopping).unwrap();

        // Stopping -> Listening (invalid)
        assert!(cell
            .transition(ManagerState::Listening(SessionPhase::Opening))
            .is_err());
    }

    #[test]
    fn test_fatal_error_settles_from_listening() {
        let cell = StateCell::new();
        cell.transition(ManagerState::Listening(SessionPhase::Active)).unwrap();

        assert!(cell.transition(ManagerState::Idle).is_ok());
    }

    #[test]
    fn test_force_set_and_reset() {
        let cell = StateCell::new();

        cell.force_set(ManagerState::Stopping);
        assert!(cell.current().is_stopping());

        cell.reset();
        assert!(cell.current().is_idle());
    }

    #[test]
    fn test_state_error_display() {
        let err = StateError::InvalidTransition {
            from: ManagerState::Idle,
            to: ManagerState::Stopping,
        };
        assert!(err.to_string().contains("Idle"));
        assert!(err.to_string().contains("Stopping"));
    }
}
