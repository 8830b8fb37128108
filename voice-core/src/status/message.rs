use serde::{Deserialize, Serialize};

/// 状态消息类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusKind {
    /// 一般信息
    Info,
    /// 操作成功
    Success,
    /// 错误
    Error,
}

/// 状态消息
///
/// 每次需要反馈用户时创建；显示固定时长后变为不可见
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusMessage {
    /// 显示文本
    pub text: String,
    /// 消息类型
    pub kind: StatusKind,
    /// 是否可见
    pub visible: bool,
}

impl StatusMessage {
    /// 创建可见的状态消息
    pub fn new(kind: StatusKind, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            kind,
            visible: true,
        }
    }

    /// 创建信息消息
    pub fn info(text: impl Into<String>) -> Self {
        Self::new(StatusKind::Info, text)
    }

    /// 创建成功消息
    pub fn success(text: impl Into<String>) -> Self {
        Self::new(StatusKind::Success, text)
    }

    /// 创建错误消息
    pub fn error(text: impl Into<String>) -> Self {
        Self::new(StatusKind::Error, text)
    }

    /// 空的隐藏消息（提示器初始状态）
    pub fn hidden() -> Self {
        Self {
            text: String::new(),
            kind: StatusKind::Info,
            visible: false,
        }
    }

    /// 返回同一消息的隐藏副本
    pub fn into_hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    /// 检查是否为错误消息
    pub fn is_error(&self) -> bool {
        self.kind == StatusKind::Error
    }
}

impl Default for StatusMessage {
    fn default() -> Self {
        Self::hidden()
    }
}
