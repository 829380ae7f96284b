//! # Standing Picture
//!
//! 消息窗口立绘的纯逻辑核心。
//!
//! ## 架构概述
//!
//! `standing-picture` 不依赖任何 IO 或渲染引擎，只负责决定每一帧
//! 两个立绘槽位的位置、不透明度、色调和动作位移。
//! 它通过 **事件回调 + 请求队列** 与宿主层（Host）通信：
//!
//! ```text
//! Host                                   Controller
//!   │── on_message_start(text) ──────────────►│
//!   │◄── drain_requests(): HostRequest ───────│
//!   │── on_image_loaded / on_image_failed ───►│
//!   │── on_frame_tick() ─────────────────────►│
//!   │◄── [SpriteFrame; 2] ────────────────────│
//! ```
//!
//! ## 核心类型
//!
//! - [`StandingPictureController`]：控制器，宿主唯一需要持有的对象
//! - [`DisplayRequest`]：一条消息解码出的显示请求
//! - [`SpriteFrame`]：每帧输出的精灵参数
//! - [`HostRequest`]：向宿主发出的图片加载请求
//!
//! ## 模块结构
//!
//! - [`catalog`]：立绘清单
//! - [`config`]：启动配置与全局状态
//! - [`controller`]：控制器
//! - [`decoder`]：控制字符解码
//! - [`error`]：错误类型定义
//! - [`loader`]：宿主加载协议
//! - [`motion`]：动作库
//! - [`slot`]：槽位状态机
//! - [`sprite`]：渲染参数

pub mod catalog;
pub mod config;
pub mod controller;
pub mod decoder;
pub mod error;
pub mod loader;
pub mod motion;
pub mod slot;
pub mod sprite;

// 重导出核心类型
pub use catalog::{Origin, PictureCatalog, PortraitDefinition};
pub use config::{BootConfig, GlobalConfig, SlotConfig, TransitionStyle};
pub use controller::StandingPictureController;
pub use decoder::{
    DisplayRequest, FnVariables, FocusTarget, NoVariables, SlotTrigger, VarValue, VariableSource,
    decode, strip_tags,
};
pub use error::{CatalogError, ConfigError, LoadError, UnknownMotion};
pub use loader::{HostRequest, ImageHandle, LoadTicket};
pub use motion::Motion;
pub use slot::{SlotId, SlotPhase, SlotState};
pub use sprite::{BlendColor, BlendMode, SpriteFrame, Tone, Vec2};
