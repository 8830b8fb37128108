//! 语音控制错误类型

use thiserror::Error;

/// 语音控制相关错误
///
/// 只有 `start()` 时的能力检查会向调用方抛出；其余故障都在管理器内部恢复或上报
#[derive(Error, Debug, Clone, PartialEq)]
pub enum VoiceError {
    /// 宿主不支持语音识别
    #[error("Speech recognition is not available on this host")]
    CapabilityUnavailable,

    /// 管理器任务已退出
    #[error("Recognition manager has shut down")]
    ManagerClosed,
}

/// 语音控制模块的结果类型
pub type VoiceResult<T> = Result<T, VoiceError>;
