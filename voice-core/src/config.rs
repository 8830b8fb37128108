//! 应用配置模块
//!
//! 提供语音控制配置的加载、保存和校验
//!
//! # 使用示例
//!
//! ```no_run
//! use voicenav_lib::config::ConfigManager;
//!
//! // 加载配置（文件不存在时使用默认值）
//! let mut config = ConfigManager::load("voicenav.json")?;
//!
//! // 修改配置
//! config.timing.heartbeat_enabled = false;
//!
//! // 保存配置
//! ConfigManager::save("voicenav.json", &config)?;
//! # Ok::<(), voicenav_lib::config::ConfigError>(())
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::grammar::GrammarConfig;
use crate::recognition::CaptureConfig;
use crate::status::DEFAULT_DISPLAY_MS;

/// 配置错误类型
#[derive(Error, Debug)]
pub enum ConfigError {
    /// IO 错误
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON 序列化/反序列化错误
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// 配置值无效
    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// 配置结果类型
pub type ConfigResult<T> = Result<T, ConfigError>;

/// 语音控制配置
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VoiceConfig {
    /// 采集会话配置
    pub capture: CaptureConfig,
    /// 计时配置
    pub timing: TimingConfig,
    /// 指令语法
    pub grammar: GrammarConfig,
    /// 状态提示配置
    pub status: StatusConfig,
}

impl VoiceConfig {
    /// 校验配置
    ///
    /// # Errors
    ///
    /// 任何会导致计时器立即反复触发的零值都会返回 [`ConfigError::Invalid`]
    pub fn validate(&self) -> ConfigResult<()> {
        let timing = &self.timing;

        if timing.heartbeat_enabled && timing.heartbeat_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "heartbeat_interval_ms must be greater than 0".to_string(),
            ));
        }
        if timing.stop_grace_ms == 0 {
            return Err(ConfigError::Invalid(
                "stop_grace_ms must be greater than 0".to_string(),
            ));
        }
        if self.status.display_ms == 0 {
            return Err(ConfigError::Invalid(
                "display_ms must be greater than 0".to_string(),
            ));
        }
        if self.capture.language.trim().is_empty() {
            return Err(ConfigError::Invalid("language must not be empty".to_string()));
        }

        Ok(())
    }
}

/// 计时配置
///
/// 心跳是针对部分宿主长时间运行后静默停止投递事件的保护措施，可调可关
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// 会话意外结束后的重启延迟（毫秒）
    pub restart_delay_ms: u64,
    /// 可恢复错误后的重启延迟（毫秒）
    pub error_restart_delay_ms: u64,
    /// 是否启用心跳回收
    pub heartbeat_enabled: bool,
    /// 心跳间隔（毫秒）
    pub heartbeat_interval_ms: u64,
    /// 请求停止后等待终止信号的宽限期（毫秒）
    pub stop_grace_ms: u64,
}

impl TimingConfig {
    /// 意外结束后的重启延迟
    pub fn restart_delay(&self) -> Duration {
        Duration::from_millis(self.restart_delay_ms)
    }

    /// 错误后的重启延迟
    pub fn error_restart_delay(&self) -> Duration {
        Duration::from_millis(self.error_restart_delay_ms)
    }

    /// 心跳间隔（未启用时为 None）
    pub fn heartbeat_interval(&self) -> Option<Duration> {
        self.heartbeat_enabled
            .then(|| Duration::from_millis(self.heartbeat_interval_ms))
    }

    /// 停止宽限期
    pub fn stop_grace(&self) -> Duration {
        Duration::from_millis(self.stop_grace_ms)
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            restart_delay_ms: 300,
            error_restart_delay_ms: 1000,
            heartbeat_enabled: true,
            heartbeat_interval_ms: 30_000,
            stop_grace_ms: 2000,
        }
    }
}

/// 状态提示配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatusConfig {
    /// 每条消息的显示时长（毫秒）
    pub display_ms: u64,
}

impl Default for StatusConfig {
    fn default() -> Self {
        Self {
            display_ms: DEFAULT_DISPLAY_MS,
        }
    }
}

/// 配置管理器
///
/// 提供配置文件的加载、保存和管理功能
pub struct ConfigManager;

impl ConfigManager {
    /// 加载配置
    ///
    /// 如果文件不存在则返回默认配置；加载后会执行校验
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<VoiceConfig> {
        let path = path.as_ref();

        tracing::debug!(path = %path.display(), "Loading config");

        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: VoiceConfig = serde_json::from_str(&content)?;
            config.validate()?;
            tracing::info!(path = %path.display(), "Config loaded successfully");
            Ok(config)
        } else {
            tracing::info!("Config file not found, using defaults");
            Ok(VoiceConfig::default())
        }
    }

    /// 保存配置
    pub fn save(path: impl AsRef<Path>, config: &VoiceConfig) -> ConfigResult<()> {
        let path = path.as_ref();

        tracing::debug!(path = %path.display(), "Saving config");

        // 确保目录存在
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let content = serde_json::to_string_pretty(config)?;
        std::fs::write(path, content)?;

        tracing::info!(path = %path.display(), "Config saved successfully");
        Ok(())
    }

    /// 检查配置文件是否存在
    pub fn exists(path: impl AsRef<Path>) -> bool {
        path.as_ref().exists()
    }

    /// 删除配置文件
    pub fn delete(path: impl AsRef<Path>) -> ConfigResult<()> {
        let path = path.as_ref();
        if path.exists() {
            std::fs::remove_file(path)?;
            tracing::info!(path = %path.display(), "Config deleted");
        }
        Ok(())
    }

    /// 重置为默认配置
    pub fn reset(path: impl AsRef<Path>) -> ConfigResult<VoiceConfig> {
        let config = VoiceConfig::default();
        Self::save(path, &config)?;
        tracing::info!("Config reset to defaults");
        Ok(config)
    }
}
