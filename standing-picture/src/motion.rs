//! # Motion 模块
//!
//! 立绘动作库：名称到逐帧位移序列的固定映射。
//!
//! 每个动作由一个计数器驱动，[`Motion::step`] 是纯函数：
//! 输入当前计数器（和当前 X 坐标），输出本帧位移与下一帧的计数器。
//! 计数器为 0 表示动作结束。
//!
//! ## 终止方式
//!
//! | 动作 | 初始计数 | 终止 |
//! |---|---|---|
//! | `yes` `no` `jump` | 24 | 倒数到 0 |
//! | `yesyes` `noslow` `jumpjump` | 48 | 倒数到 0 |
//! | `jumploop` | 48 | 倒数到 0 后回到 48（循环） |
//! | `shake` | 1 | 正数到 10 后归 0 |
//! | `shakeloop` | 1 | 正数到 10 后回到 1（循环） |
//! | `runleft` `runright` | 1 | X 坐标越过 ±2000 |

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::UnknownMotion;

/// 跑出画面的动作每帧移动距离
pub const RUN_SPEED: f32 = 16.0;

/// 跑出画面的动作在 X 越过该距离后结束
pub const RUN_BOUND: f32 = 2000.0;

/// 立绘动作
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Motion {
    /// 无动作
    #[default]
    None,
    /// 点头
    Yes,
    /// 点头两次
    YesYes,
    /// 左右摇晃
    No,
    /// 缓慢左右摇晃
    NoSlow,
    /// 跳一下
    Jump,
    /// 跳两下
    JumpJump,
    /// 持续跳跃
    JumpLoop,
    /// 颤抖
    Shake,
    /// 持续颤抖
    ShakeLoop,
    /// 向左跑出画面
    RunLeft,
    /// 向右跑出画面
    RunRight,
}

/// 单帧动作结果
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionStep {
    pub dx: f32,
    pub dy: f32,
    /// 下一帧的计数器，0 表示结束
    pub next: u32,
}

impl MotionStep {
    const fn new(dx: f32, dy: f32, next: u32) -> Self {
        Self { dx, dy, next }
    }
}

impl Motion {
    /// 除 `None` 以外的全部动作
    pub const ALL: [Motion; 11] = [
        Self::Yes,
        Self::YesYes,
        Self::No,
        Self::NoSlow,
        Self::Jump,
        Self::JumpJump,
        Self::JumpLoop,
        Self::Shake,
        Self::ShakeLoop,
        Self::RunLeft,
        Self::RunRight,
    ];

    /// 动作名称
    pub fn name(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Yes => "yes",
            Self::YesYes => "yesyes",
            Self::No => "no",
            Self::NoSlow => "noslow",
            Self::Jump => "jump",
            Self::JumpJump => "jumpjump",
            Self::JumpLoop => "jumploop",
            Self::Shake => "shake",
            Self::ShakeLoop => "shakeloop",
            Self::RunLeft => "runleft",
            Self::RunRight => "runright",
        }
    }

    /// 动作开始时的计数器
    pub fn total_frames(self) -> u32 {
        match self {
            Self::None => 0,
            Self::Yes | Self::No | Self::Jump => 24,
            Self::YesYes | Self::NoSlow | Self::JumpJump | Self::JumpLoop => 48,
            Self::Shake | Self::ShakeLoop | Self::RunLeft | Self::RunRight => 1,
        }
    }

    /// 是否循环播放（不会自行结束）
    pub fn is_looping(self) -> bool {
        matches!(self, Self::JumpLoop | Self::ShakeLoop)
    }

    /// 是否按位置而不是帧数结束
    pub fn ends_by_position(self) -> bool {
        matches!(self, Self::RunLeft | Self::RunRight)
    }

    /// 计算一帧
    ///
    /// - `counter`: 当前计数器（应大于 0）
    /// - `x`: 当前 X 坐标，仅跑出画面的动作使用
    pub fn step(self, counter: u32, x: f32) -> MotionStep {
        let c = counter;
        let down = c.saturating_sub(1);
        match self {
            Self::None => MotionStep::new(0.0, 0.0, 0),
            Self::Yes => MotionStep::new(0.0, if c > 12 { 2.0 } else { -2.0 }, down),
            Self::YesYes => {
                let dy = if c > 36 || (c <= 24 && c > 12) {
                    2.0
                } else {
                    -2.0
                };
                MotionStep::new(0.0, dy, down)
            }
            Self::No => {
                let dx = if c > 18 || c <= 6 { 2.0 } else { -2.0 };
                MotionStep::new(dx, 0.0, down)
            }
            Self::NoSlow => {
                let dx = if c > 36 || c <= 12 { 1.0 } else { -1.0 };
                MotionStep::new(dx, 0.0, down)
            }
            Self::Jump => MotionStep::new(0.0, if c > 12 { -2.0 } else { 2.0 }, down),
            Self::JumpJump => {
                let dy = if c > 36 || (c <= 24 && c > 12) {
                    -2.0
                } else {
                    2.0
                };
                MotionStep::new(0.0, dy, down)
            }
            Self::JumpLoop => {
                let dy = if c > 36 {
                    -2.0
                } else if c > 24 {
                    2.0
                } else {
                    0.0
                };
                let next = if down == 0 { 48 } else { down };
                MotionStep::new(0.0, dy, next)
            }
            Self::Shake => match c {
                0..=2 => MotionStep::new(-2.0, 0.0, c + 1),
                3..=4 => MotionStep::new(0.0, -2.0, c + 1),
                5..=6 => MotionStep::new(4.0, 4.0, c + 1),
                7..=8 => MotionStep::new(0.0, -2.0, c + 1),
                9 => MotionStep::new(-2.0, 0.0, 10),
                10 => MotionStep::new(-2.0, 0.0, 0),
                _ => MotionStep::new(0.0, 0.0, 0),
            },
            Self::ShakeLoop => {
                let (dx, dy) = match c {
                    0..=2 => (-1.0, 0.0),
                    3..=4 => (0.0, -1.0),
                    5..=6 => (2.0, 2.0),
                    7..=8 => (0.0, -1.0),
                    9..=10 => (-1.0, 0.0),
                    _ => (0.0, 0.0),
                };
                let next = if c + 1 > 10 { 1 } else { c + 1 };
                MotionStep::new(dx, dy, next)
            }
            Self::RunLeft => {
                let next = if x - RUN_SPEED < -RUN_BOUND { 0 } else { c };
                MotionStep::new(-RUN_SPEED, 0.0, next)
            }
            Self::RunRight => {
                let next = if x + RUN_SPEED > RUN_BOUND { 0 } else { c };
                MotionStep::new(RUN_SPEED, 0.0, next)
            }
        }
    }
}

impl FromStr for Motion {
    type Err = UnknownMotion;

    /// 从名称解析（不区分大小写）
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(Self::None),
            "yes" => Ok(Self::Yes),
            "yesyes" => Ok(Self::YesYes),
            "no" => Ok(Self::No),
            "noslow" => Ok(Self::NoSlow),
            "jump" => Ok(Self::Jump),
            "jumpjump" => Ok(Self::JumpJump),
            "jumploop" => Ok(Self::JumpLoop),
            "shake" => Ok(Self::Shake),
            "shakeloop" => Ok(Self::ShakeLoop),
            "runleft" => Ok(Self::RunLeft),
            "runright" => Ok(Self::RunRight),
            _ => Err(UnknownMotion {
                name: s.to_string(),
            }),
        }
    }
}
