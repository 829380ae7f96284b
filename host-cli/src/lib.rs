//! # Host CLI
//!
//! 无界面的立绘宿主，用于预览和回归测试。
//!
//! - [`scene`]：场景文件格式
//! - [`loader`]：模拟异步图片加载
//! - [`runner`]：逐帧驱动控制器

pub mod loader;
pub mod runner;
pub mod scene;

pub use loader::{Completion, SimulatedLoader};
pub use runner::{FrameRecord, RunReport, SceneRunner};
pub use scene::{Scene, SceneEvent};
