//! # Error 模块
//!
//! 定义 standing-picture 中使用的错误类型。
//!
//! 每帧调用的接口（`on_frame_tick` 等）不返回错误：
//! 这里的错误只用于配置加载、立绘清单校验以及宿主回报的图片加载失败。

use thiserror::Error;

/// 立绘清单条目被拒绝的原因
///
/// 被拒绝的条目会被跳过，不会中断启动。
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CatalogError {
    /// 条目无法反序列化
    #[error("第 {index} 条立绘定义格式错误: {message}")]
    Malformed { index: usize, message: String },

    /// 缺少 ID
    #[error("第 {index} 条立绘定义缺少 ID")]
    EmptyId { index: usize },

    /// 缺少图片文件名
    #[error("立绘 '{id}' 未指定图片文件")]
    EmptyImage { id: String },

    /// ID 重复
    #[error("立绘 ID '{id}' 重复，保留首个定义")]
    DuplicateId { id: String },
}

/// 启动配置加载错误
#[derive(Error, Debug)]
pub enum ConfigError {
    /// 文件读取失败
    #[error("配置文件读取失败: {path} - {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// JSON 解析失败
    #[error("配置文件解析失败: {0}")]
    Parse(#[from] serde_json::Error),
}

/// 图片加载失败（由宿主回报）
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LoadError {
    /// 图片不存在
    #[error("图片不存在: {path}")]
    NotFound { path: String },

    /// 图片解码失败
    #[error("图片解码失败: {path} - {message}")]
    Decode { path: String, message: String },
}

/// 动作名称无法识别
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("未知的动作: '{name}'")]
pub struct UnknownMotion {
    pub name: String,
}
