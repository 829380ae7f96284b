//! # Decoder 模块
//!
//! 把消息原文解码为 [`DisplayRequest`]，并返回删除控制字符后的文本。
//!
//! ## 处理顺序
//!
//! 1. [`substitute_variables`]：替换 `\V[n]`（立绘 ID 可以由变量决定）
//! 2. [`decode`]：依次提取槽位 1 立绘、槽位 1 动作、槽位 2 立绘、槽位 2 动作、焦点
//! 3. [`strip_tags`]：无条件删除全部控制字符
//!
//! 解码是纯函数，对同一文本重复解码得到相同结果。

mod tags;
mod variables;


use serde::{Deserialize, Serialize};

use crate::slot::SlotId;

pub use tags::{TagKind, TagMatch, extract_first_tag, find_tags, strip_tags};
pub use variables::{FnVariables, NoVariables, VarValue, VariableSource, substitute_variables};

/// 单个槽位的触发
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotTrigger {
    /// 立绘 ID（不保证存在于立绘清单中）
    pub portrait_id: String,
    /// 动作名称
    pub motion: Option<String>,
}

/// 焦点目标
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FocusTarget {
    /// 不压暗
    #[default]
    None,
    /// 强调槽位 1（压暗槽位 2）
    Primary,
    /// 强调槽位 2（压暗槽位 1）
    Secondary,
    /// 两个槽位都压暗
    All,
}

impl FocusTarget {
    /// 解析 `\AA[...]` 的内容，未知内容视为 `None`
    pub fn from_token(token: &str) -> Self {
        if token.eq_ignore_ascii_case("F") {
            Self::Primary
        } else if token.eq_ignore_ascii_case("FF") {
            Self::Secondary
        } else if token.eq_ignore_ascii_case("N") {
            Self::All
        } else {
            Self::None
        }
    }

    /// 该槽位是否应被压暗
    pub fn darkens(self, slot: SlotId) -> bool {
        match self {
            Self::None => false,
            Self::Primary => slot == SlotId::Secondary,
            Self::Secondary => slot == SlotId::Primary,
            Self::All => true,
        }
    }
}

/// 一条消息的显示请求
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DisplayRequest {
    pub slot1: Option<SlotTrigger>,
    pub slot2: Option<SlotTrigger>,
    pub focus: FocusTarget,
}

impl DisplayRequest {
    /// 获取槽位的触发
    pub fn trigger(&self, slot: SlotId) -> Option<&SlotTrigger> {
        match slot {
            SlotId::Primary => self.slot1.as_ref(),
            SlotId::Secondary => self.slot2.as_ref(),
        }
    }
}

fn slot_trigger(text: &str, picture: TagKind, motion: TagKind) -> Option<SlotTrigger> {
    let portrait_id = extract_first_tag(text, picture)?;
    Some(SlotTrigger {
        portrait_id: portrait_id.to_string(),
        motion: extract_first_tag(text, motion).map(str::to_string),
    })
}

/// 解码已完成变量替换的文本
///
/// 返回显示请求和删除控制字符后的文本。
/// 没有立绘 ID 时动作控制字符被忽略。
pub fn decode(text: &str) -> (DisplayRequest, String) {
    let request = DisplayRequest {
        slot1: slot_trigger(text, TagKind::Picture, TagKind::Motion),
        slot2: slot_trigger(text, TagKind::SecondaryPicture, TagKind::SecondaryMotion),
        focus: extract_first_tag(text, TagKind::Focus)
            .map(FocusTarget::from_token)
            .unwrap_or_default(),
    };
    (request, strip_tags(text))
}

/// 先替换变量再解码
pub fn decode_message(raw: &str, vars: &impl VariableSource) -> (DisplayRequest, String) {
    decode(&substitute_variables(raw, vars))
}
