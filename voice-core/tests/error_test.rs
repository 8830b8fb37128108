//! 应用层错误集成测试
//!
//! 真实的启动失败与配置失败都应该能转换为带提示的 AppError

mod common;

use common::{quiet_config, ScriptedHost};
use tempfile::TempDir;
use voicenav_lib::config::ConfigManager;
use voicenav_lib::recognition::RecognitionManager;
use voicenav_lib::utils::{AppError, AppResult, ErrorCode};

#[tokio::test(start_paused = true)]
async fn test_start_without_capability_is_reported() {
    let host = ScriptedHost::unavailable();
    let manager =
        RecognitionManager::spawn(host, &quiet_config(), 5, Default::default()).unwrap();

    let err = AppError::from(manager.start().await.unwrap_err());
    let ctx = err.context();

    assert_eq!(ctx.code, ErrorCode::VoiceUnavailable);
    assert_eq!(ctx.message, "Voice control is not supported here");
    assert!(ctx.recovery_hint.is_some());
    assert!(!ctx.recoverable);
}

#[test]
fn test_malformed_config_is_reported() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("voice.json");
    std::fs::write(&path, "{ \"timing\": ").unwrap();

    let load = || -> AppResult<_> { Ok(ConfigManager::load(&path)?) };
    let err = load().unwrap_err();

    assert_eq!(err.code(), ErrorCode::ConfigMalformed);
    assert!(err.is_recoverable());
    assert_eq!(
        err.recovery_hint(),
        Some("Fix the config file or delete it to restore defaults")
    );
}

#[test]
fn test_invalid_config_rejected_at_spawn() {
    let mut config = quiet_config();
    config.status.display_ms = 0;

    let err = AppError::from(
        RecognitionManager::spawn(ScriptedHost::new(), &config, 5, Default::default())
            .err()
            .unwrap(),
    );

    assert_eq!(err.code(), ErrorCode::ConfigInvalid);
    assert!(err.user_message().contains("display_ms"));
    assert!(err.context().detail.starts_with("Config error"));
}
