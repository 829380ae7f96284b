//! # Config 模块
//!
//! 启动配置与全局状态。
//!
//! - [`BootConfig`]：启动时由宿主传入，之后只读
//! - [`GlobalConfig`]：由插件命令修改的全局开关与色调，归控制器所有
//!
//! 枚举类参数同时接受插件参数的数字编码与名称，例如
//! `"transition": 2` 与 `"transition": "float_left"` 等价。

use std::fmt;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::slot::SlotId;
use crate::sprite::{Tone, Vec2};

/// 浮动切换效果的位移距离（像素）
pub const FLOAT_DISTANCE: f32 = 30.0;

/// 焦点压暗的默认强度
pub const DEFAULT_FOCUS_DARKEN: i32 = -96;

/// 插件参数编码：数字或字符串
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ParamCode {
    Number(i64),
    Text(String),
}

impl ParamCode {
    /// 按数字解读（字符串形式的数字同样接受）
    pub fn as_number(&self) -> Option<i64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(s) => s.trim().parse().ok(),
        }
    }

    /// 按名称解读：小写并去掉 `_` `-` 空白
    pub fn as_name(&self) -> Option<String> {
        match self {
            Self::Number(_) => None,
            Self::Text(s) => Some(
                s.chars()
                    .filter(|c| !matches!(c, '_' | '-') && !c.is_whitespace())
                    .flat_map(char::to_lowercase)
                    .collect(),
            ),
        }
    }
}

impl fmt::Display for ParamCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => write!(f, "'{s}'"),
        }
    }
}

/// 切换效果（立绘出现/消失时的过渡方式）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "ParamCode", rename_all = "snake_case")]
pub enum TransitionStyle {
    /// 无过渡，立即显示/消失
    None,
    /// 淡入淡出
    #[default]
    Fade,
    /// 从左侧浮入，向左侧浮出
    FloatLeft,
    /// 从右侧浮入，向右侧浮出
    FloatRight,
    /// 从下方浮入，向下方浮出
    FloatBottom,
    /// 从上方浮入，向上方浮出
    FloatTop,
}

impl TransitionStyle {
    /// 浮动方向（单位向量），非浮动效果返回 `None`
    pub fn direction(self) -> Option<Vec2> {
        match self {
            Self::None | Self::Fade => None,
            Self::FloatLeft => Some(Vec2::new(-1.0, 0.0)),
            Self::FloatRight => Some(Vec2::new(1.0, 0.0)),
            Self::FloatBottom => Some(Vec2::new(0.0, 1.0)),
            Self::FloatTop => Some(Vec2::new(0.0, -1.0)),
        }
    }

    /// 入场时相对锚点的初始偏移，也是退场时漂移的终点
    pub fn float_offset(self) -> Vec2 {
        self.direction()
            .map(|dir| dir.scale(FLOAT_DISTANCE))
            .unwrap_or(Vec2::ZERO)
    }
}

impl TryFrom<ParamCode> for TransitionStyle {
    type Error = String;

    fn try_from(code: ParamCode) -> Result<Self, Self::Error> {
        match (code.as_number(), code.as_name().as_deref()) {
            (Some(0), _) | (_, Some("none")) => Ok(Self::None),
            (Some(1), _) | (_, Some("fade")) => Ok(Self::Fade),
            (Some(2), _) | (_, Some("floatleft")) => Ok(Self::FloatLeft),
            (Some(3), _) | (_, Some("floatright")) => Ok(Self::FloatRight),
            (Some(4), _) | (_, Some("floatbottom")) => Ok(Self::FloatBottom),
            (Some(5), _) | (_, Some("floattop")) => Ok(Self::FloatTop),
            _ => Err(format!("未知的切换效果: {code}")),
        }
    }
}

/// 单个槽位的配置
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SlotConfig {
    /// 切换效果
    #[serde(default)]
    pub transition: TransitionStyle,

    /// 是否绘制在消息窗口之前
    #[serde(default)]
    pub in_front_of_window: bool,
}

/// 启动配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BootConfig {
    /// 槽位 1（`\F`）配置
    #[serde(default)]
    pub slot1: SlotConfig,

    /// 槽位 2（`\FF`）配置
    #[serde(default)]
    pub slot2: SlotConfig,

    /// 焦点压暗强度 (-255 ~ 0)
    #[serde(default = "default_focus_darken_amount")]
    pub focus_darken_amount: i32,

    /// 启动时是否预加载所有立绘图片
    #[serde(default)]
    pub preload_on_boot: bool,

    /// 立绘清单（原始条目，逐条解析，格式错误的条目被跳过）
    #[serde(default)]
    pub pictures: Vec<serde_json::Value>,
}

fn default_focus_darken_amount() -> i32 {
    DEFAULT_FOCUS_DARKEN
}

impl Default for BootConfig {
    fn default() -> Self {
        Self {
            slot1: SlotConfig::default(),
            slot2: SlotConfig::default(),
            focus_darken_amount: default_focus_darken_amount(),
            preload_on_boot: false,
            pictures: Vec::new(),
        }
    }
}

impl BootConfig {
    /// 从 JSON 文件加载
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&content)
    }

    /// 从 JSON 字符串解析
    pub fn from_json_str(content: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(content)?)
    }

    /// 获取槽位配置
    pub fn slot(&self, slot: SlotId) -> &SlotConfig {
        match slot {
            SlotId::Primary => &self.slot1,
            SlotId::Secondary => &self.slot2,
        }
    }

    /// 截断到合法区间后的压暗强度
    pub fn focus_darken(&self) -> i32 {
        self.focus_darken_amount.clamp(-255, 0)
    }
}

/// 全局状态（插件命令修改）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalConfig {
    /// 立绘显示开关
    pub enabled: bool,
    /// 色调覆盖
    pub tone: Option<Tone>,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            tone: None,
        }
    }
}
