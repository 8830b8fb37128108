//! 应用层错误
//!
//! 调用方只会遇到两类错误：`start()` 的能力检查失败，以及配置加载/校验失败。
//! 会话内部的故障都由管理器自行恢复，不会出现在这里。
//!
//! `AppError` 把两者统一起来，并给出可以直接展示给用户的文本和处理建议。
//!
//! # 使用示例
//!
//! ```
//! use voicenav_lib::recognition::VoiceError;
//! use voicenav_lib::utils::error::{AppError, ErrorCode};
//!
//! let err = AppError::from(VoiceError::CapabilityUnavailable);
//! assert_eq!(err.code(), ErrorCode::VoiceUnavailable);
//! assert!(err.recovery_hint().is_some());
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::ConfigError;
use crate::recognition::VoiceError;

/// 应用错误类型
#[derive(Error, Debug)]
pub enum AppError {
    /// 语音控制错误
    #[error("Voice error: {0}")]
    Voice(#[from] VoiceError),

    /// 配置错误
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

/// 错误代码（前端按代码区分处理）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// 宿主不支持语音识别
    VoiceUnavailable,
    /// 管理器已关闭
    VoiceManagerClosed,
    /// 配置文件无法读取
    ConfigUnreadable,
    /// 配置文件不是合法 JSON
    ConfigMalformed,
    /// 配置值不合法
    ConfigInvalid,
}

/// 可序列化的错误描述，供 UI 展示或日志记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorContext {
    pub code: ErrorCode,
    /// 面向用户的文本
    pub message: String,
    /// 原始错误（用于日志）
    pub detail: String,
    pub recovery_hint: Option<String>,
    pub recoverable: bool,
}

impl AppError {
    /// 获取错误代码
    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::Voice(VoiceError::CapabilityUnavailable) => ErrorCode::VoiceUnavailable,
            AppError::Voice(VoiceError::ManagerClosed) => ErrorCode::VoiceManagerClosed,
            AppError::Config(ConfigError::Io(_)) => ErrorCode::ConfigUnreadable,
            AppError::Config(ConfigError::Json(_)) => ErrorCode::ConfigMalformed,
            AppError::Config(ConfigError::Invalid(_)) => ErrorCode::ConfigInvalid,
        }
    }

    /// 面向用户的错误文本
    pub fn user_message(&self) -> String {
        match self {
            AppError::Voice(VoiceError::CapabilityUnavailable) => {
                "Voice control is not supported here".to_string()
            }
            AppError::Voice(VoiceError::ManagerClosed) => {
                "Voice control has been shut down".to_string()
            }
            AppError::Config(ConfigError::Io(_)) => "Could not read the config file".to_string(),
            AppError::Config(ConfigError::Json(e)) => {
                format!("The config file is malformed (line {})", e.line())
            }
            AppError::Config(ConfigError::Invalid(reason)) => {
                format!("Invalid setting: {}", reason)
            }
        }
    }

    /// 处理建议
    pub fn recovery_hint(&self) -> Option<&'static str> {
        match self.code() {
            ErrorCode::VoiceUnavailable => {
                Some("Use a browser or device with speech recognition support")
            }
            ErrorCode::VoiceManagerClosed => None,
            ErrorCode::ConfigUnreadable => Some("Check the config path and file permissions"),
            ErrorCode::ConfigMalformed | ErrorCode::ConfigInvalid => {
                Some("Fix the config file or delete it to restore defaults")
            }
        }
    }

    /// 用户能否在不重启应用的情况下自行解决
    pub fn is_recoverable(&self) -> bool {
        matches!(self, AppError::Config(_))
    }

    /// 生成完整的错误描述
    pub fn context(&self) -> ErrorContext {
        ErrorContext {
            code: self.code(),
            message: self.user_message(),
            detail: self.to_string(),
            recovery_hint: self.recovery_hint().map(str::to_string),
            recoverable: self.is_recoverable(),
        }
    }
}

/// 应用结果类型
pub type AppResult<T> = Result<T, AppError>;
