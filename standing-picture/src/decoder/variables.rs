//! # 变量替换
//!
//! 在扫描控制字符之前，把 `\V[n]` 替换为游戏变量 n 的当前值。

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// 变量值
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum VarValue {
    /// 整数
    Int(i64),
    /// 浮点数
    Float(f64),
    /// 字符串
    String(String),
    /// 布尔值
    Bool(bool),
}

impl fmt::Display for VarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(n) => write!(f, "{n}"),
            Self::Float(n) => write!(f, "{n}"),
            Self::String(s) => write!(f, "{s}"),
            Self::Bool(b) => write!(f, "{b}"),
        }
    }
}

impl From<i64> for VarValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<&str> for VarValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

/// 游戏变量查询
pub trait VariableSource {
    /// 查询变量，未设置时返回 `None`
    fn variable(&self, id: u32) -> Option<VarValue>;
}

impl<T: VariableSource + ?Sized> VariableSource for &T {
    fn variable(&self, id: u32) -> Option<VarValue> {
        (**self).variable(id)
    }
}

impl VariableSource for HashMap<u32, VarValue> {
    fn variable(&self, id: u32) -> Option<VarValue> {
        self.get(&id).cloned()
    }
}

/// 没有任何变量
#[derive(Debug, Clone, Copy, Default)]
pub struct NoVariables;

impl VariableSource for NoVariables {
    fn variable(&self, _id: u32) -> Option<VarValue> {
        None
    }
}

/// 用闭包查询变量
pub struct FnVariables<F>(pub F);

impl<F> VariableSource for FnVariables<F>
where
    F: Fn(u32) -> Option<VarValue>,
{
    fn variable(&self, id: u32) -> Option<VarValue> {
        (self.0)(id)
    }
}

/// 匹配 `\V[digits]`，返回变量编号和结束位置
fn match_variable(text: &str, start: usize) -> Option<(u32, usize)> {
    let rest = text.get(start..)?.strip_prefix('\\')?;
    let rest = rest
        .strip_prefix('V')
        .or_else(|| rest.strip_prefix('v'))?
        .strip_prefix('[')?;
    let close = rest.find(']')?;
    let digits = &rest[..close];
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let id = digits.parse().ok()?;
    Some((id, start + 3 + close + 1))
}

fn substitute_once(text: &str, vars: &impl VariableSource) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for (pos, _) in text.match_indices('\\') {
        if pos < last {
            continue;
        }
        if let Some((id, end)) = match_variable(text, pos) {
            out.push_str(&text[last..pos]);
            match vars.variable(id) {
                Some(value) => out.push_str(&value.to_string()),
                None => out.push('0'),
            }
            last = end;
        }
    }
    out.push_str(&text[last..]);
    out
}

/// 替换 `\V[n]`
///
/// 执行两遍，支持 `\V[\V[n]]` 形式的间接引用。未设置的变量替换为 `0`。
pub fn substitute_variables(text: &str, vars: &impl VariableSource) -> String {
    let once = substitute_once(text, vars);
    substitute_once(&once, vars)
}
