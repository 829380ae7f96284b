//! # Loader 模块
//!
//! 图片加载是核心层唯一的异步边界。
//!
//! 核心层不直接加载图片，而是向宿主发出 [`HostRequest`]，
//! 宿主加载完成后调用控制器的 `on_image_loaded` / `on_image_failed` 回报结果。
//!
//! ```text
//! Controller                     Host
//!   │── HostRequest::Load ────────►│
//!   │        (若干帧之后)            │
//!   │◄── on_image_loaded(ticket) ──│
//! ```
//!
//! 每个加载请求携带一个 [`LoadTicket`]：槽位 + 递增的代数。
//! 同一槽位发出新请求后，旧请求的回报会因代数不匹配而被丢弃。

use serde::{Deserialize, Serialize};

use crate::slot::SlotId;

/// 已加载的图片
///
/// 对核心层不透明，只使用其尺寸计算中心锚点。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageHandle {
    /// 宿主侧的资源键（通常是图片路径）
    pub key: String,
    pub width: u32,
    pub height: u32,
}

impl ImageHandle {
    pub fn new(key: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            key: key.into(),
            width,
            height,
        }
    }
}

/// 加载凭据
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LoadTicket {
    pub slot: SlotId,
    pub generation: u64,
}

/// 核心层向宿主发出的请求
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum HostRequest {
    /// 为槽位加载图片，完成后须携带 `ticket` 回报
    Load { ticket: LoadTicket, path: String },
    /// 预加载（只需放入缓存，无需回报）
    Preload { path: String },
}

impl HostRequest {
    /// 请求的图片路径
    pub fn path(&self) -> &str {
        match self {
            Self::Load { path, .. } | Self::Preload { path } => path,
        }
    }
}
