//! # 控制字符扫描
//!
//! 手写的扫描器，无正则依赖。
//!
//! 识别五种控制字符（大小写不敏感）：
//!
//! | 控制字符 | 含义 | 内容字符 |
//! |---|---|---|
//! | `\F[id]` | 槽位 1 立绘 | 字母、数字、`_`、`-` |
//! | `\FF[id]` | 槽位 2 立绘 | 同上 |
//! | `\M[name]` | 槽位 1 动作 | ASCII 字母、数字、`_` |
//! | `\MM[name]` | 槽位 2 动作 | 同上 |
//! | `\AA[target]` | 焦点 | 同上 |

/// 控制字符种类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TagKind {
    /// `\F[id]`
    Picture,
    /// `\FF[id]`
    SecondaryPicture,
    /// `\M[name]`
    Motion,
    /// `\MM[name]`
    SecondaryMotion,
    /// `\AA[target]`
    Focus,
}

impl TagKind {
    pub const ALL: [TagKind; 5] = [
        Self::Picture,
        Self::SecondaryPicture,
        Self::Motion,
        Self::SecondaryMotion,
        Self::Focus,
    ];

    /// 反斜杠之后的名称
    pub fn name(self) -> &'static str {
        match self {
            Self::Picture => "F",
            Self::SecondaryPicture => "FF",
            Self::Motion => "M",
            Self::SecondaryMotion => "MM",
            Self::Focus => "AA",
        }
    }

    fn accepts(self, c: char) -> bool {
        match self {
            Self::Picture | Self::SecondaryPicture => c.is_alphanumeric() || c == '_' || c == '-',
            Self::Motion | Self::SecondaryMotion | Self::Focus => {
                c.is_ascii_alphanumeric() || c == '_'
            }
        }
    }
}

/// 一处控制字符匹配
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagMatch<'a> {
    pub kind: TagKind,
    /// 起始字节位置（反斜杠处）
    pub start: usize,
    /// 结束字节位置（`]` 之后）
    pub end: usize,
    /// 方括号内的内容
    pub content: &'a str,
}

/// 尝试在 `start` 处匹配指定种类的控制字符
fn match_at(text: &str, start: usize, kind: TagKind) -> Option<TagMatch<'_>> {
    let rest = text.get(start..)?.strip_prefix('\\')?;
    let name = kind.name();
    let head = rest.get(..name.len())?;
    if !head.eq_ignore_ascii_case(name) {
        return None;
    }

    let rest = rest[name.len()..].strip_prefix('[')?;
    let close = rest.find(']')?;
    let content = &rest[..close];
    if content.is_empty() || !content.chars().all(|c| kind.accepts(c)) {
        return None;
    }

    Some(TagMatch {
        kind,
        start,
        end: start + 1 + name.len() + 1 + close + 1,
        content,
    })
}

/// 提取指定种类的第一个控制字符的内容
///
/// 同种控制字符出现多次时只取第一个，其余忽略。
pub fn extract_first_tag(text: &str, kind: TagKind) -> Option<&str> {
    text.match_indices('\\')
        .find_map(|(pos, _)| match_at(text, pos, kind))
        .map(|m| m.content)
}

/// 从左到右找出所有不重叠的控制字符
pub fn find_tags(text: &str) -> Vec<TagMatch<'_>> {
    let mut found = Vec::new();
    let mut cursor = 0;
    for (pos, _) in text.match_indices('\\') {
        if pos < cursor {
            continue;
        }
        if let Some(m) = TagKind::ALL
            .iter()
            .find_map(|&kind| match_at(text, pos, kind))
        {
            cursor = m.end;
            found.push(m);
        }
    }
    found
}

fn strip_once(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for m in find_tags(text) {
        out.push_str(&text[last..m.start]);
        last = m.end;
    }
    out.push_str(&text[last..]);
    out
}

/// 删除全部五种控制字符
///
/// 与立绘是否存在无关，总是删除。
/// 删除后拼接出新的控制字符时继续删除，直到文本不再变化。
pub fn strip_tags(text: &str) -> String {
    let mut current = strip_once(text);
    loop {
        let next = strip_once(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}
