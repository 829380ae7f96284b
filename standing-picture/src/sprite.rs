//! # Sprite 模块
//!
//! 核心层向渲染层输出的精灵参数。
//!
//! 核心层不做任何像素合成，宿主每帧读取 [`SpriteFrame`] 后自行绘制。

use serde::{Deserialize, Serialize};

use crate::config::ParamCode;
use crate::loader::ImageHandle;
use crate::slot::SlotId;

/// 2D 向量（像素坐标或缩放倍率）
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// 分量相加
    pub fn add(self, other: Self) -> Self {
        Self::new(self.x + other.x, self.y + other.y)
    }

    /// 数乘
    pub fn scale(self, factor: f32) -> Self {
        Self::new(self.x * factor, self.y * factor)
    }

    /// 逐轴向 `target` 移动至多 `step`，不越过目标
    pub fn approach(self, target: Self, step: f32) -> Self {
        Self::new(
            approach_axis(self.x, target.x, step),
            approach_axis(self.y, target.y, step),
        )
    }
}

fn approach_axis(current: f32, target: f32, step: f32) -> f32 {
    if current < target {
        (current + step).min(target)
    } else if current > target {
        (current - step).max(target)
    } else {
        current
    }
}

/// 色调（RGB 偏移 + 灰度）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Tone {
    /// 红 (-255 ~ 255)
    pub red: i32,
    /// 绿 (-255 ~ 255)
    pub green: i32,
    /// 蓝 (-255 ~ 255)
    pub blue: i32,
    /// 灰度 (0 ~ 255)
    pub gray: i32,
}

impl Tone {
    pub const NEUTRAL: Self = Self {
        red: 0,
        green: 0,
        blue: 0,
        gray: 0,
    };

    /// 创建色调，超出范围的分量被截断到合法区间
    pub fn clamped(red: i32, green: i32, blue: i32, gray: i32) -> Self {
        Self {
            red: red.clamp(-255, 255),
            green: green.clamp(-255, 255),
            blue: blue.clamp(-255, 255),
            gray: gray.clamp(0, 255),
        }
    }
}

/// 混合色（叠加在精灵上的颜色与强度）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BlendColor {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
    pub strength: u8,
}

impl BlendColor {
    pub const NONE: Self = Self {
        red: 0,
        green: 0,
        blue: 0,
        strength: 0,
    };

    /// 黑色压暗
    pub fn darken(strength: u8) -> Self {
        Self {
            strength,
            ..Self::NONE
        }
    }
}

/// 合成方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "ParamCode", rename_all = "lowercase")]
pub enum BlendMode {
    #[default]
    Normal,
    Add,
    Subtract,
    Screen,
}

impl TryFrom<ParamCode> for BlendMode {
    type Error = String;

    fn try_from(code: ParamCode) -> Result<Self, Self::Error> {
        match (code.as_number(), code.as_name().as_deref()) {
            (Some(0), _) | (_, Some("normal")) => Ok(Self::Normal),
            (Some(1), _) | (_, Some("add")) => Ok(Self::Add),
            (Some(2), _) | (_, Some("subtract")) => Ok(Self::Subtract),
            (Some(3), _) | (_, Some("screen")) => Ok(Self::Screen),
            _ => Err(format!("未知的合成方式: {code}")),
        }
    }
}

/// 单个槽位在一帧内的渲染参数
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpriteFrame {
    /// 所属槽位
    pub slot: SlotId,
    /// 是否需要绘制
    pub visible: bool,
    /// 当前显示的图片（未加载完成时为 `None`）
    pub image: Option<ImageHandle>,
    /// 左上角位置
    pub position: Vec2,
    /// 不透明度 (0 ~ 255)
    pub opacity: u8,
    /// 缩放倍率（槽位 2 左右反转时 x 为负）
    pub scale: Vec2,
    pub blend_mode: BlendMode,
    pub color_tone: Tone,
    pub blend_color: BlendColor,
    /// 是否绘制在消息窗口之前
    pub in_front_of_window: bool,
    /// 同层内的绘制顺序，数值大的在上
    pub z_order: u8,
}
