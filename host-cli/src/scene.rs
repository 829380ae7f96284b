//! # Scene 模块
//!
//! 预览场景文件：按顺序执行的宿主事件列表。
//!
//! ```json
//! {
//!   "variables": { "1": "lulu_smile" },
//!   "image_sizes": { "lulu_smile": [400, 800] },
//!   "events": [
//!     { "message": "\\F[\\V[1]]\\M[yes]こんにちは" },
//!     { "ticks": 30 },
//!     { "set_tone": [-68, -68, 0, 68] },
//!     "close_window",
//!     { "ticks": 20 }
//!   ]
//! }
//! ```

use std::collections::HashMap;
use std::path::Path;

use anyhow::Context;
use serde::Deserialize;
use standing_picture::VarValue;

/// 场景事件
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SceneEvent {
    /// 开始一条消息
    Message(String),
    /// 推进若干帧
    Ticks(u32),
    /// 消息窗口完全关闭
    CloseWindow,
    /// 插件命令：显示开关
    SetEnabled(bool),
    /// 插件命令：色调 `[r, g, b, gray]`
    SetTone([i32; 4]),
    /// 修改游戏变量
    SetVariable { id: u32, value: serde_json::Value },
}

/// 预览场景
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Scene {
    /// 初始游戏变量
    #[serde(default)]
    pub variables: HashMap<u32, serde_json::Value>,

    /// 不读取文件时使用的图片尺寸 `[width, height]`
    #[serde(default)]
    pub image_sizes: HashMap<String, [u32; 2]>,

    #[serde(default)]
    pub events: Vec<SceneEvent>,
}

impl Scene {
    /// 从 JSON 文件加载
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("无法读取场景文件: {}", path.display()))?;
        Self::from_json_str(&content).with_context(|| format!("场景文件格式错误: {}", path.display()))
    }

    pub fn from_json_str(content: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// 初始变量表
    pub fn variable_table(&self) -> HashMap<u32, VarValue> {
        self.variables
            .iter()
            .map(|(&id, value)| (id, to_var_value(value)))
            .collect()
    }
}

/// JSON 值转换为游戏变量
pub fn to_var_value(value: &serde_json::Value) -> VarValue {
    use serde_json::Value;

    match value {
        Value::Bool(b) => VarValue::Bool(*b),
        Value::Number(n) => match n.as_i64() {
            Some(i) => VarValue::Int(i),
            None => VarValue::Float(n.as_f64().unwrap_or_default()),
        },
        Value::String(s) => VarValue::String(s.clone()),
        Value::Null => VarValue::Int(0),
        other => VarValue::String(other.to_string()),
    }
}
