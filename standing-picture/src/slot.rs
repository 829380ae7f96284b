//! # Slot 模块
//!
//! 单个立绘槽位的状态机。
//!
//! ## 阶段转换
//!
//! ```text
//! Hidden ──(图片就绪)──► Opening ──(不透明度到达目标)──► Shown
//!   ▲                                                    │
//!   └──(不透明度归零)── Closing ◄──(清除请求/窗口关闭)──────┘
//! ```
//!
//! - `Opening` / `Closing` 是过渡阶段，由 [`SlotState::advance`] 逐帧推进
//! - `Shown` / `Hidden` 是稳定阶段
//! - 动作只在 `Shown` 阶段播放
//!
//! 位置由三部分组成：锚点 + 切换效果偏移 + 动作位移。

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::catalog::PortraitDefinition;
use crate::config::{GlobalConfig, SlotConfig, TransitionStyle};
use crate::loader::{ImageHandle, LoadTicket};
use crate::motion::Motion;
use crate::sprite::{BlendColor, SpriteFrame, Tone, Vec2};

/// 淡入淡出所需帧数
pub const FADE_FRAMES: f32 = 15.0;

/// 切换效果每帧移动距离（像素）
pub const FLOAT_SPEED: f32 = 2.0;

/// 判定不透明度到达目标时的容差
const OPACITY_EPSILON: f32 = 1e-3;

/// 槽位标识
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SlotId {
    /// 槽位 1（`\F` / `\M`）
    #[serde(rename = "slot1")]
    Primary,
    /// 槽位 2（`\FF` / `\MM`）
    #[serde(rename = "slot2")]
    Secondary,
}

impl SlotId {
    pub const ALL: [SlotId; 2] = [Self::Primary, Self::Secondary];

    /// 数组下标
    pub fn index(self) -> usize {
        match self {
            Self::Primary => 0,
            Self::Secondary => 1,
        }
    }

    /// 另一个槽位
    pub fn other(self) -> Self {
        match self {
            Self::Primary => Self::Secondary,
            Self::Secondary => Self::Primary,
        }
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Primary => write!(f, "slot1"),
            Self::Secondary => write!(f, "slot2"),
        }
    }
}

/// 槽位阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SlotPhase {
    #[default]
    Hidden,
    Opening,
    Shown,
    Closing,
}

/// 已加载、正在显示的立绘
#[derive(Debug, Clone, PartialEq)]
struct Displayed {
    portrait: PortraitDefinition,
    image: ImageHandle,
}

/// 等待图片加载的请求
#[derive(Debug, Clone, PartialEq)]
struct PendingLoad {
    generation: u64,
    portrait: PortraitDefinition,
    motion: Motion,
}

/// 槽位状态
///
/// 只由控制器修改：消息开始时应用触发，之后每帧 [`advance`](Self::advance)。
#[derive(Debug, Clone)]
pub struct SlotState {
    slot: SlotId,
    style: TransitionStyle,
    /// 正在显示的立绘（图片已就绪）
    displayed: Option<Displayed>,
    /// 尚未完成的加载
    pending: Option<PendingLoad>,
    /// 加载代数，每次发出新请求或取消请求时递增
    generation: u64,
    phase: SlotPhase,
    opacity: f32,
    anchor: Vec2,
    /// 切换效果造成的偏移
    offset: Vec2,
    motion: Motion,
    motion_counter: u32,
    /// 动作累计位移
    motion_offset: Vec2,
    focus_darkened: bool,
}

impl SlotState {
    /// 创建隐藏状态的槽位
    pub fn new(slot: SlotId, style: TransitionStyle) -> Self {
        Self {
            slot,
            style,
            displayed: None,
            pending: None,
            generation: 0,
            phase: SlotPhase::Hidden,
            opacity: 0.0,
            anchor: Vec2::ZERO,
            offset: Vec2::ZERO,
            motion: Motion::None,
            motion_counter: 0,
            motion_offset: Vec2::ZERO,
            focus_darkened: false,
        }
    }

    pub fn slot(&self) -> SlotId {
        self.slot
    }

    pub fn phase(&self) -> SlotPhase {
        self.phase
    }

    /// 当前不透明度（不受全局开关影响）
    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    /// 正在显示的立绘 ID
    pub fn displayed_id(&self) -> Option<&str> {
        self.displayed.as_ref().map(|d| d.portrait.id.as_str())
    }

    /// 是否有尚未完成的加载
    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }

    pub fn anchor(&self) -> Vec2 {
        self.anchor
    }

    /// 当前位置（锚点 + 切换偏移 + 动作位移）
    pub fn position(&self) -> Vec2 {
        self.anchor.add(self.offset).add(self.motion_offset)
    }

    pub fn motion(&self) -> Motion {
        self.motion
    }

    /// 动作剩余计数，0 表示没有进行中的动作
    pub fn motion_frames_remaining(&self) -> u32 {
        self.motion_counter
    }

    pub fn motion_offset(&self) -> Vec2 {
        self.motion_offset
    }

    pub fn is_focus_darkened(&self) -> bool {
        self.focus_darkened
    }

    pub(crate) fn set_focus_darkened(&mut self, darkened: bool) {
        self.focus_darkened = darkened;
    }

    /// 目标不透明度（当前显示立绘的配置值）
    fn target_opacity(&self) -> f32 {
        self.displayed
            .as_ref()
            .map(|d| d.portrait.opacity)
            .unwrap_or(0.0)
    }

    fn set_phase(&mut self, phase: SlotPhase) {
        if self.phase != phase {
            debug!(slot = %self.slot, from = ?self.phase, to = ?phase, "槽位阶段切换");
            self.phase = phase;
        }
    }

    /// 开始（或重新开始）动作，动作位移归零
    fn start_motion(&mut self, motion: Motion) {
        self.motion = motion;
        self.motion_counter = motion.total_frames();
        self.motion_offset = Vec2::ZERO;
    }

    /// 作废尚未完成的加载
    fn cancel_pending(&mut self) {
        if self.pending.take().is_some() {
            self.generation += 1;
        }
    }

    /// 请求显示立绘
    ///
    /// 需要加载图片时返回加载凭据；同一立绘已在显示时不重新淡入，
    /// 只重新开始动作。
    pub fn show(&mut self, portrait: &PortraitDefinition, motion: Motion) -> Option<LoadTicket> {
        let already_displayed = self.displayed_id() == Some(portrait.id.as_str())
            && self.phase != SlotPhase::Hidden;

        if already_displayed {
            self.cancel_pending();
            if self.phase == SlotPhase::Closing {
                self.set_phase(SlotPhase::Opening);
            }
            self.start_motion(motion);
            return None;
        }

        if let Some(pending) = self.pending.as_mut()
            && pending.portrait.id == portrait.id
        {
            pending.motion = motion;
            return None;
        }

        // 等待加载期间保持原有的显示状态
        self.generation += 1;
        self.pending = Some(PendingLoad {
            generation: self.generation,
            portrait: portrait.clone(),
            motion,
        });
        debug!(slot = %self.slot, id = %portrait.id, generation = self.generation, "请求加载立绘");
        Some(LoadTicket {
            slot: self.slot,
            generation: self.generation,
        })
    }

    /// 清除槽位：作废加载、停止动作并开始淡出
    pub fn clear(&mut self) {
        self.cancel_pending();
        self.motion = Motion::None;
        self.motion_counter = 0;
        match self.phase {
            SlotPhase::Opening | SlotPhase::Shown if self.opacity <= 0.0 => {
                self.set_phase(SlotPhase::Hidden)
            }
            SlotPhase::Opening | SlotPhase::Shown => self.set_phase(SlotPhase::Closing),
            SlotPhase::Hidden | SlotPhase::Closing => {}
        }
    }

    /// 图片加载完成
    ///
    /// 凭据过期时丢弃结果并返回 `false`。
    pub fn on_loaded(&mut self, ticket: LoadTicket, image: ImageHandle) -> bool {
        let fresh = self
            .pending
            .as_ref()
            .is_some_and(|p| ticket.slot == self.slot && p.generation == ticket.generation);
        if !fresh {
            debug!(slot = %self.slot, generation = ticket.generation, "丢弃过期的加载结果");
            return false;
        }
        let Some(PendingLoad {
            portrait, motion, ..
        }) = self.pending.take()
        else {
            return false;
        };

        self.anchor = portrait.anchor_for(self.slot, &image);
        let target_opacity = portrait.opacity;

        if self.phase == SlotPhase::Hidden || self.opacity <= 0.0 {
            // 从不可见状态入场：浮动效果从偏移处开始，无过渡直接到目标不透明度
            self.offset = self.style.float_offset();
            self.opacity = if self.style == TransitionStyle::None {
                target_opacity
            } else {
                0.0
            };
        } else {
            // 替换正在显示的立绘：直接就位，从当前不透明度继续
            self.offset = Vec2::ZERO;
            self.opacity = self.opacity.min(target_opacity);
        }

        self.displayed = Some(Displayed { portrait, image });
        self.start_motion(motion);

        if self.opacity >= target_opacity {
            self.set_phase(SlotPhase::Shown);
        } else {
            self.set_phase(SlotPhase::Opening);
        }
        true
    }

    /// 图片加载失败：保持加载前的显示状态
    ///
    /// 凭据过期时返回 `false`。
    pub fn on_failed(&mut self, ticket: LoadTicket) -> bool {
        let fresh = self
            .pending
            .as_ref()
            .is_some_and(|p| ticket.slot == self.slot && p.generation == ticket.generation);
        if fresh {
            self.pending = None;
        }
        fresh
    }

    /// 推进一帧
    pub fn advance(&mut self) {
        // 淡入完成的那一帧不播放动作，下一帧开始
        let was_shown = self.phase == SlotPhase::Shown;
        match self.phase {
            SlotPhase::Hidden => return,
            SlotPhase::Opening => self.step_opening(),
            SlotPhase::Shown => self.offset = self.offset.approach(Vec2::ZERO, FLOAT_SPEED),
            SlotPhase::Closing => self.step_closing(),
        }

        if was_shown && self.phase == SlotPhase::Shown && self.motion_counter > 0 {
            self.step_motion();
        }
    }

    fn step_opening(&mut self) {
        let target = self.target_opacity();
        self.offset = self.offset.approach(Vec2::ZERO, FLOAT_SPEED);
        self.opacity += target / FADE_FRAMES;
        if self.opacity >= target - OPACITY_EPSILON {
            self.opacity = target;
            self.set_phase(SlotPhase::Shown);
        }
    }

    fn step_closing(&mut self) {
        if self.opacity > 0.0 {
            if self.style == TransitionStyle::None || self.displayed.is_none() {
                self.opacity = 0.0;
            } else {
                let step = self.target_opacity() / FADE_FRAMES;
                self.opacity = (self.opacity - step).max(0.0);
            }
            if self.style.direction().is_some() {
                self.offset = self
                    .offset
                    .approach(self.style.float_offset(), FLOAT_SPEED);
            }
        }
        if self.opacity <= OPACITY_EPSILON {
            self.opacity = 0.0;
            self.set_phase(SlotPhase::Hidden);
        }
    }

    fn step_motion(&mut self) {
        let step = self.motion.step(self.motion_counter, self.position().x);
        self.motion_offset = self.motion_offset.add(Vec2::new(step.dx, step.dy));
        self.motion_counter = step.next;
    }

    /// 生成本帧的渲染参数
    ///
    /// - 全局关闭时输出不透明度强制为 0，不改变内部状态
    /// - 焦点压暗每帧重新计算
    pub fn frame(&self, config: &SlotConfig, global: &GlobalConfig, darken: i32) -> SpriteFrame {
        let opacity = if global.enabled {
            self.opacity.round().clamp(0.0, 255.0) as u8
        } else {
            0
        };
        let blend_color = if self.focus_darkened {
            BlendColor::darken(darken.unsigned_abs().min(255) as u8)
        } else {
            BlendColor::NONE
        };
        let (scale, blend_mode) = match &self.displayed {
            Some(d) => (d.portrait.scale_for(self.slot), d.portrait.blend_mode),
            None => (Vec2::new(1.0, 1.0), Default::default()),
        };

        SpriteFrame {
            slot: self.slot,
            visible: self.displayed.is_some() && self.phase != SlotPhase::Hidden && opacity > 0,
            image: self.displayed.as_ref().map(|d| d.image.clone()),
            position: self.position(),
            opacity,
            scale,
            blend_mode,
            color_tone: global.tone.unwrap_or(Tone::NEUTRAL),
            blend_color,
            in_front_of_window: config.in_front_of_window,
            z_order: match self.slot {
                SlotId::Primary => 1,
                SlotId::Secondary => 0,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn portrait(id: &str) -> PortraitDefinition {
        PortraitDefinition::new(id, format!("{id}_img"))
    }

    fn image(key: &str) -> ImageHandle {
        ImageHandle::new(key, 300, 600)
    }

    /// 请求并立即完成加载
    fn show_loaded(slot: &mut SlotState, def: &PortraitDefinition, motion: Motion) {
        let ticket = slot.show(def, motion).expect("需要加载");
        assert!(slot.on_loaded(ticket, image(&def.image)));
    }

    #[test]
    fn test_slot_id() {
        assert_eq!(SlotId::Primary.index(), 0);
        assert_eq!(SlotId::Secondary.index(), 1);
        assert_eq!(SlotId::Primary.other(), SlotId::Secondary);
        assert_eq!(SlotId::Secondary.to_string(), "slot2");
    }

    #[test]
    fn test_waits_for_load_before_opening() {
        let mut slot = SlotState::new(SlotId::Primary, TransitionStyle::Fade);
        let ticket = slot.show(&portrait("lulu"), Motion::None).unwrap();

        for _ in 0..5 {
            slot.advance();
        }
        assert_eq!(slot.phase(), SlotPhase::Hidden);
        assert_eq!(slot.opacity(), 0.0);
        assert!(slot.is_loading());

        assert!(slot.on_loaded(ticket, image("lulu_img")));
        assert_eq!(slot.phase(), SlotPhase::Opening);
        assert_eq!(slot.position(), Vec2::new(464.0, 96.0));
    }

    #[test]
    fn test_fade_in_reaches_exact_opacity() {
        let mut def = portrait("lulu");
        def.opacity = 200.0;
        let mut slot = SlotState::new(SlotId::Primary, TransitionStyle::Fade);
        show_loaded(&mut slot, &def, Motion::None);

        for i in 0..15 {
            assert_eq!(slot.phase(), SlotPhase::Opening, "第 {i} 帧");
            slot.advance();
            assert!(slot.opacity() <= 200.0);
        }
        assert_eq!(slot.phase(), SlotPhase::Shown);
        assert_eq!(slot.opacity(), 200.0);
    }

    #[test]
    fn test_float_left_entry_and_exit() {
        let mut slot = SlotState::new(SlotId::Primary, TransitionStyle::FloatLeft);
        show_loaded(&mut slot, &portrait("lulu"), Motion::None);
        assert_eq!(slot.position(), Vec2::new(434.0, 96.0));

        for _ in 0..15 {
            slot.advance();
        }
        assert_eq!(slot.phase(), SlotPhase::Shown);
        assert_eq!(slot.position(), Vec2::new(464.0, 96.0));

        slot.clear();
        assert_eq!(slot.phase(), SlotPhase::Closing);
        for _ in 0..15 {
            slot.advance();
        }
        assert_eq!(slot.phase(), SlotPhase::Hidden);
        assert_eq!(slot.opacity(), 0.0);
        assert_eq!(slot.position(), Vec2::new(434.0, 96.0));
    }

    #[test]
    fn test_none_style_is_instant() {
        let mut slot = SlotState::new(SlotId::Secondary, TransitionStyle::None);
        show_loaded(&mut slot, &portrait("mina"), Motion::None);
        assert_eq!(slot.phase(), SlotPhase::Shown);
        assert_eq!(slot.opacity(), 255.0);
        assert_eq!(slot.position(), Vec2::new(20.0, 96.0));

        slot.clear();
        slot.advance();
        assert_eq!(slot.phase(), SlotPhase::Hidden);
    }

    #[test]
    fn test_same_portrait_is_noop() {
        let def = portrait("lulu");
        let mut slot = SlotState::new(SlotId::Primary, TransitionStyle::Fade);
        show_loaded(&mut slot, &def, Motion::None);
        for _ in 0..5 {
            slot.advance();
        }
        let opacity = slot.opacity();

        assert_eq!(slot.show(&def, Motion::Jump), None);
        assert_eq!(slot.phase(), SlotPhase::Opening);
        assert_eq!(slot.opacity(), opacity);
        assert_eq!(slot.motion(), Motion::Jump);
        assert_eq!(slot.motion_frames_remaining(), 24);
    }

    #[test]
    fn test_motion_suspended_while_opening() {
        let mut slot = SlotState::new(SlotId::Primary, TransitionStyle::Fade);
        show_loaded(&mut slot, &portrait("lulu"), Motion::Yes);

        for _ in 0..14 {
            slot.advance();
        }
        assert_eq!(slot.phase(), SlotPhase::Opening);
        assert_eq!(slot.motion_frames_remaining(), 24);
        assert_eq!(slot.motion_offset(), Vec2::ZERO);

        // 第 15 帧进入 Shown，动作从第 16 帧开始
        slot.advance();
        assert_eq!(slot.phase(), SlotPhase::Shown);
        assert_eq!(slot.motion_frames_remaining(), 24);
        assert_eq!(slot.motion_offset(), Vec2::ZERO);

        slot.advance();
        assert_eq!(slot.motion_frames_remaining(), 23);

        for _ in 0..23 {
            slot.advance();
        }
        assert_eq!(slot.motion_frames_remaining(), 0);
        assert_eq!(slot.motion_offset(), Vec2::ZERO);
    }

    #[test]
    fn test_stale_load_discarded() {
        let mut slot = SlotState::new(SlotId::Primary, TransitionStyle::Fade);
        let first = slot.show(&portrait("a"), Motion::None).unwrap();
        let second = slot.show(&portrait("b"), Motion::None).unwrap();
        assert_ne!(first, second);

        assert!(!slot.on_loaded(first, image("a_img")));
        assert_eq!(slot.phase(), SlotPhase::Hidden);

        assert!(slot.on_loaded(second, image("b_img")));
        assert_eq!(slot.displayed_id(), Some("b"));
    }

    #[test]
    fn test_clear_invalidates_pending_load() {
        let mut slot = SlotState::new(SlotId::Primary, TransitionStyle::Fade);
        let ticket = slot.show(&portrait("a"), Motion::None).unwrap();
        slot.clear();
        assert!(!slot.is_loading());
        assert!(!slot.on_loaded(ticket, image("a_img")));
        assert_eq!(slot.phase(), SlotPhase::Hidden);
    }

    #[test]
    fn test_ticket_for_other_slot_rejected() {
        let mut slot = SlotState::new(SlotId::Primary, TransitionStyle::Fade);
        let ticket = slot.show(&portrait("a"), Motion::None).unwrap();
        let foreign = LoadTicket {
            slot: SlotId::Secondary,
            ..ticket
        };
        assert!(!slot.on_loaded(foreign, image("a_img")));
        assert!(slot.is_loading());
    }

    #[test]
    fn test_failed_load_keeps_previous_state() {
        let mut slot = SlotState::new(SlotId::Primary, TransitionStyle::Fade);
        show_loaded(&mut slot, &portrait("a"), Motion::None);
        for _ in 0..15 {
            slot.advance();
        }

        let ticket = slot.show(&portrait("b"), Motion::None).unwrap();
        assert!(slot.on_failed(ticket));
        assert!(!slot.on_failed(ticket));
        for _ in 0..30 {
            slot.advance();
        }
        assert_eq!(slot.phase(), SlotPhase::Shown);
        assert_eq!(slot.displayed_id(), Some("a"));
        assert_eq!(slot.opacity(), 255.0);
    }

    #[test]
    fn test_swap_while_shown_is_immediate() {
        let mut slot = SlotState::new(SlotId::Primary, TransitionStyle::FloatRight);
        show_loaded(&mut slot, &portrait("a"), Motion::None);
        for _ in 0..15 {
            slot.advance();
        }
        show_loaded(&mut slot, &portrait("b"), Motion::None);
        assert_eq!(slot.phase(), SlotPhase::Shown);
        assert_eq!(slot.opacity(), 255.0);
        assert_eq!(slot.position(), Vec2::new(464.0, 96.0));
    }

    #[test]
    fn test_reopen_while_closing() {
        let def = portrait("a");
        let mut slot = SlotState::new(SlotId::Primary, TransitionStyle::Fade);
        show_loaded(&mut slot, &def, Motion::None);
        for _ in 0..15 {
            slot.advance();
        }
        slot.clear();
        for _ in 0..5 {
            slot.advance();
        }
        assert_eq!(slot.phase(), SlotPhase::Closing);

        assert_eq!(slot.show(&def, Motion::None), None);
        assert_eq!(slot.phase(), SlotPhase::Opening);
        for _ in 0..5 {
            slot.advance();
        }
        assert_eq!(slot.phase(), SlotPhase::Shown);
        assert_eq!(slot.opacity(), 255.0);
    }

    #[test]
    fn test_hidden_same_portrait_reloads() {
        let def = portrait("a");
        let mut slot = SlotState::new(SlotId::Primary, TransitionStyle::None);
        show_loaded(&mut slot, &def, Motion::None);
        slot.clear();
        slot.advance();
        assert_eq!(slot.phase(), SlotPhase::Hidden);
        assert!(slot.show(&def, Motion::None).is_some());
    }

    #[test]
    fn test_frame_output() {
        let mut def = portrait("a");
        def.flip_slot2 = true;
        let mut slot = SlotState::new(SlotId::Secondary, TransitionStyle::None);
        let config = SlotConfig {
            transition: TransitionStyle::None,
            in_front_of_window: true,
        };
        let mut global = GlobalConfig::default();

        let frame = slot.frame(&config, &global, -96);
        assert!(!frame.visible);
        assert_eq!(frame.image, None);

        show_loaded(&mut slot, &def, Motion::None);
        slot.set_focus_darkened(true);
        global.tone = Some(Tone::clamped(10, 20, 30, 40));

        let frame = slot.frame(&config, &global, -96);
        assert!(frame.visible);
        assert_eq!(frame.opacity, 255);
        assert_eq!(frame.scale, Vec2::new(-1.0, 1.0));
        assert_eq!(frame.blend_color, BlendColor::darken(96));
        assert_eq!(frame.color_tone, Tone::clamped(10, 20, 30, 40));
        assert!(frame.in_front_of_window);
        assert_eq!(frame.z_order, 0);

        global.enabled = false;
        let frame = slot.frame(&config, &global, -96);
        assert!(!frame.visible);
        assert_eq!(frame.opacity, 0);
        assert_eq!(slot.opacity(), 255.0);
    }
}
