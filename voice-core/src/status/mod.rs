//! 状态提示模块
//!
//! 提供短暂显示、自动隐藏的用户状态消息
//!
//! # 模块结构
//!
//! - `message` - 状态消息类型
//! - `presenter` - 消费管理器事件流并负责自动隐藏的提示器

mod message;
mod presenter;

pub use message::{StatusKind, StatusMessage};
pub use presenter::{StatusPresenter, DEFAULT_DISPLAY_MS};
