//! # Catalog 模块
//!
//! 立绘清单：ID 到立绘外观配置的静态查找表。
//!
//! 启动时由配置构建，之后只读。格式错误或无效的条目会被跳过，
//! 原因记录在 [`PictureCatalog::warnings`] 中，不会中断启动。

use std::collections::HashMap;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use tracing::warn;

use crate::config::ParamCode;
use crate::error::CatalogError;
use crate::loader::ImageHandle;
use crate::slot::SlotId;
use crate::sprite::{BlendMode, Vec2};

/// 立绘原点
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "ParamCode", rename_all = "snake_case")]
pub enum Origin {
    /// 配置坐标即图片左上角
    #[default]
    TopLeft,
    /// 配置坐标即图片中心
    Center,
}

impl TryFrom<ParamCode> for Origin {
    type Error = String;

    fn try_from(code: ParamCode) -> Result<Self, Self::Error> {
        match (code.as_number(), code.as_name().as_deref()) {
            (Some(0), _) | (_, Some("topleft")) => Ok(Self::TopLeft),
            (Some(1), _) | (_, Some("center")) => Ok(Self::Center),
            _ => Err(format!("未知的原点: {code}")),
        }
    }
}

/// 立绘定义
///
/// 同时接受两种写法：本模块的 snake_case 字段，以及插件参数 `sPictures`
/// 的原始字段（`imageName`、`x`/`y`、`x2`/`y2`、`reverse`、`scaleX`/`scaleY`、
/// `blendMode`）。插件参数中的数字常以字符串形式保存，数值字段两者都接受。
/// 未知字段按格式错误处理。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawPortrait")]
pub struct PortraitDefinition {
    /// 控制字符中使用的 ID（也接受数字 ID）
    pub id: String,

    /// 图片文件名（`img/pictures` 下，不含扩展名）
    pub image: String,

    /// 原点
    pub origin: Origin,

    /// 槽位 1 的显示位置
    pub slot1_position: Vec2,

    /// 槽位 2 的显示位置
    pub slot2_position: Vec2,

    /// 在槽位 2 显示时是否左右反转
    pub flip_slot2: bool,

    /// 缩放率（百分比，-2000 ~ 2000）
    pub scale: Vec2,

    /// 不透明度 (0 ~ 255)
    pub opacity: f32,

    /// 合成方式
    pub blend_mode: BlendMode,
}

fn default_slot1_position() -> Vec2 {
    Vec2::new(464.0, 96.0)
}

fn default_slot2_position() -> Vec2 {
    Vec2::new(20.0, 96.0)
}

fn default_scale() -> Vec2 {
    Vec2::new(100.0, 100.0)
}

fn default_opacity() -> f32 {
    255.0
}

/// 反序列化用的原始字段
///
/// 分量字段（`x`、`scale_x` 等）覆盖对应向量字段的同名分量。
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawPortrait {
    #[serde(deserialize_with = "string_or_number")]
    id: String,
    #[serde(alias = "imageName")]
    image: String,
    #[serde(default)]
    origin: Origin,

    slot1_position: Option<Vec2>,
    slot2_position: Option<Vec2>,
    #[serde(default, deserialize_with = "number_or_string")]
    x: Option<f32>,
    #[serde(default, deserialize_with = "number_or_string")]
    y: Option<f32>,
    #[serde(default, deserialize_with = "number_or_string")]
    x2: Option<f32>,
    #[serde(default, deserialize_with = "number_or_string")]
    y2: Option<f32>,

    flip_slot2: Option<bool>,
    /// 插件写法：`1` 不反转，`-1` 反转
    reverse: Option<ParamCode>,

    scale: Option<Vec2>,
    #[serde(default, alias = "scaleX", deserialize_with = "number_or_string")]
    scale_x: Option<f32>,
    #[serde(default, alias = "scaleY", deserialize_with = "number_or_string")]
    scale_y: Option<f32>,

    #[serde(default, deserialize_with = "number_or_string")]
    opacity: Option<f32>,
    #[serde(default, alias = "blendMode")]
    blend_mode: BlendMode,
}

impl TryFrom<RawPortrait> for PortraitDefinition {
    type Error = String;

    fn try_from(raw: RawPortrait) -> Result<Self, Self::Error> {
        let flip_slot2 = match raw.reverse {
            Some(code) => match code.as_number() {
                Some(1) => false,
                Some(-1) => true,
                _ => return Err(format!("未知的反转设置: {code}")),
            },
            None => raw.flip_slot2.unwrap_or(false),
        };

        Ok(Self {
            id: raw.id,
            image: raw.image,
            origin: raw.origin,
            slot1_position: with_components(
                raw.slot1_position.unwrap_or_else(default_slot1_position),
                raw.x,
                raw.y,
            ),
            slot2_position: with_components(
                raw.slot2_position.unwrap_or_else(default_slot2_position),
                raw.x2,
                raw.y2,
            ),
            flip_slot2,
            scale: with_components(
                raw.scale.unwrap_or_else(default_scale),
                raw.scale_x,
                raw.scale_y,
            ),
            opacity: raw.opacity.unwrap_or_else(default_opacity),
            blend_mode: raw.blend_mode,
        })
    }
}

fn with_components(base: Vec2, x: Option<f32>, y: Option<f32>) -> Vec2 {
    Vec2::new(x.unwrap_or(base.x), y.unwrap_or(base.y))
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match ParamCode::deserialize(deserializer)? {
        ParamCode::Number(n) => n.to_string(),
        ParamCode::Text(s) => s,
    })
}

/// 数字或数字字符串；空字符串视为未填写
fn number_or_string<'de, D>(deserializer: D) -> Result<Option<f32>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Number {
        Float(f32),
        Text(String),
    }

    match Option::<Number>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Number::Float(n)) => Ok(Some(n)),
        Some(Number::Text(s)) if s.trim().is_empty() => Ok(None),
        Some(Number::Text(s)) => s
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| D::Error::custom(format!("不是数字: '{s}'"))),
    }
}

impl PortraitDefinition {
    /// 创建使用默认外观的立绘定义
    pub fn new(id: impl Into<String>, image: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            image: image.into(),
            origin: Origin::default(),
            slot1_position: default_slot1_position(),
            slot2_position: default_slot2_position(),
            flip_slot2: false,
            scale: default_scale(),
            opacity: default_opacity(),
            blend_mode: BlendMode::default(),
        }
    }

    /// 配置中的槽位坐标
    pub fn position_for(&self, slot: SlotId) -> Vec2 {
        match slot {
            SlotId::Primary => self.slot1_position,
            SlotId::Secondary => self.slot2_position,
        }
    }

    /// 槽位上的缩放倍率（槽位 2 反转时 x 取负）
    pub fn scale_for(&self, slot: SlotId) -> Vec2 {
        let scale = self.scale.scale(0.01);
        if slot == SlotId::Secondary && self.flip_slot2 {
            Vec2::new(-scale.x, scale.y)
        } else {
            scale
        }
    }

    /// 图片加载后的锚点位置
    ///
    /// `Center` 原点按缩放后的尺寸减去一半。
    pub fn anchor_for(&self, slot: SlotId, image: &ImageHandle) -> Vec2 {
        let position = self.position_for(slot);
        match self.origin {
            Origin::TopLeft => position,
            Origin::Center => {
                let scale = self.scale_for(slot);
                Vec2::new(
                    position.x - image.width as f32 * scale.x.abs() / 2.0,
                    position.y - image.height as f32 * scale.y.abs() / 2.0,
                )
            }
        }
    }

    /// 截断越界数值
    fn normalized(mut self) -> Self {
        self.id = self.id.trim().to_string();
        self.image = self.image.trim().to_string();
        self.opacity = self.opacity.clamp(0.0, 255.0);
        self.scale = Vec2::new(
            self.scale.x.clamp(-2000.0, 2000.0),
            self.scale.y.clamp(-2000.0, 2000.0),
        );
        self
    }
}

/// 立绘清单
#[derive(Debug, Clone, Default)]
pub struct PictureCatalog {
    /// 按配置顺序保存的立绘定义
    entries: Vec<PortraitDefinition>,
    /// ID -> entries 下标
    index: HashMap<String, usize>,
    /// 被跳过的条目
    warnings: Vec<CatalogError>,
}

impl PictureCatalog {
    /// 从原始 JSON 条目构建
    pub fn from_raw(values: &[serde_json::Value]) -> Self {
        let mut catalog = Self::default();
        for (index, value) in values.iter().enumerate() {
            match PortraitDefinition::deserialize(value) {
                Ok(definition) => catalog.insert(index, definition),
                Err(e) => catalog.reject(CatalogError::Malformed {
                    index,
                    message: e.to_string(),
                }),
            }
        }
        catalog
    }

    /// 从已解析的定义构建
    pub fn from_definitions(definitions: impl IntoIterator<Item = PortraitDefinition>) -> Self {
        let mut catalog = Self::default();
        for (index, definition) in definitions.into_iter().enumerate() {
            catalog.insert(index, definition);
        }
        catalog
    }

    fn insert(&mut self, index: usize, definition: PortraitDefinition) {
        let definition = definition.normalized();

        if definition.id.is_empty() {
            return self.reject(CatalogError::EmptyId { index });
        }
        if definition.image.is_empty() {
            return self.reject(CatalogError::EmptyImage { id: definition.id });
        }
        if self.index.contains_key(&definition.id) {
            return self.reject(CatalogError::DuplicateId { id: definition.id });
        }

        self.index
            .insert(definition.id.clone(), self.entries.len());
        self.entries.push(definition);
    }

    fn reject(&mut self, error: CatalogError) {
        warn!(error = %error, "跳过立绘定义");
        self.warnings.push(error);
    }

    /// 按 ID 查找
    pub fn get(&self, id: &str) -> Option<&PortraitDefinition> {
        self.index.get(id).map(|&i| &self.entries[i])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 按配置顺序遍历
    pub fn iter(&self) -> impl Iterator<Item = &PortraitDefinition> {
        self.entries.iter()
    }

    /// 被跳过条目的原因
    pub fn warnings(&self) -> &[CatalogError] {
        &self.warnings
    }

    /// 去重后的图片列表（用于预加载）
    pub fn image_paths(&self) -> Vec<&str> {
        let mut paths: Vec<&str> = Vec::new();
        for entry in &self.entries {
            if !paths.contains(&entry.image.as_str()) {
                paths.push(&entry.image);
            }
        }
        paths
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_definition_defaults() {
        let def: PortraitDefinition =
            serde_json::from_value(json!({ "id": "lulu", "image": "lulu_normal" })).unwrap();
        assert_eq!(def.origin, Origin::TopLeft);
        assert_eq!(def.slot1_position, Vec2::new(464.0, 96.0));
        assert_eq!(def.slot2_position, Vec2::new(20.0, 96.0));
        assert!(!def.flip_slot2);
        assert_eq!(def.scale, Vec2::new(100.0, 100.0));
        assert_eq!(def.opacity, 255.0);
        assert_eq!(def.blend_mode, BlendMode::Normal);
        assert_eq!(def, PortraitDefinition::new("lulu", "lulu_normal"));
    }

    #[test]
    fn test_numeric_id_and_plugin_field_names() {
        let def: PortraitDefinition = serde_json::from_value(json!({
            "id": 3,
            "imageName": "pic3",
            "origin": "1",
            "blend_mode": 1
        }))
        .unwrap();
        assert_eq!(def.id, "3");
        assert_eq!(def.image, "pic3");
        assert_eq!(def.origin, Origin::Center);
        assert_eq!(def.blend_mode, BlendMode::Add);
    }

    #[test]
    fn test_plugin_struct_entries() {
        let raw = vec![
            json!({
                "id": "1",
                "imageName": "a",
                "x": 100,
                "y": 50,
                "x2": 300,
                "y2": 60,
                "reverse": -1,
                "scaleX": 50,
                "blendMode": 1
            }),
            json!({ "id": "2", "imageName": "b", "opacity": "200" }),
            // 插件编辑器保存的参数全部是字符串
            json!({
                "id": "3",
                "imageName": "c",
                "origin": "0",
                "x": "10",
                "y": "",
                "x2": "20.5",
                "y2": "30",
                "reverse": "1",
                "scaleX": "-100",
                "scaleY": "150",
                "opacity": "255",
                "blendMode": "3"
            }),
        ];
        let catalog = PictureCatalog::from_raw(&raw);
        assert!(catalog.warnings().is_empty(), "{:?}", catalog.warnings());
        assert_eq!(catalog.len(), 3);

        let a = catalog.get("1").unwrap();
        assert_eq!(a.image, "a");
        assert_eq!(a.slot1_position, Vec2::new(100.0, 50.0));
        assert_eq!(a.slot2_position, Vec2::new(300.0, 60.0));
        assert!(a.flip_slot2);
        assert_eq!(a.scale, Vec2::new(50.0, 100.0));
        assert_eq!(a.blend_mode, BlendMode::Add);
        assert_eq!(a.scale_for(SlotId::Secondary), Vec2::new(-0.5, 1.0));

        let b = catalog.get("2").unwrap();
        assert_eq!(b.opacity, 200.0);
        assert_eq!(b.slot1_position, Vec2::new(464.0, 96.0));

        let c = catalog.get("3").unwrap();
        assert_eq!(c.slot1_position, Vec2::new(10.0, 96.0));
        assert_eq!(c.slot2_position, Vec2::new(20.5, 30.0));
        assert!(!c.flip_slot2);
        assert_eq!(c.scale, Vec2::new(-100.0, 150.0));
        assert_eq!(c.blend_mode, BlendMode::Screen);
    }

    #[test]
    fn test_unrecognized_fields_are_malformed() {
        let raw = vec![
            json!({ "id": "a", "image": "a", "xx": 100 }),
            json!({ "id": "b", "image": "b", "reverse": 0 }),
            json!({ "id": "c", "image": "c", "opacity": "bright" }),
            json!({ "id": "d", "image": "d", "slot1_position": { "x": 1, "y": 2 }, "y": 5 }),
        ];
        let catalog = PictureCatalog::from_raw(&raw);

        assert_eq!(catalog.len(), 1);
        assert_eq!(
            catalog.get("d").unwrap().slot1_position,
            Vec2::new(1.0, 5.0)
        );
        let indices: Vec<usize> = catalog
            .warnings()
            .iter()
            .map(|w| match w {
                CatalogError::Malformed { index, .. } => *index,
                other => panic!("unexpected warning: {other:?}"),
            })
            .collect();
        assert_eq!(indices, vec![0, 1, 2]);
    }

    #[test]
    fn test_catalog_skips_bad_entries() {
        let raw = vec![
            json!({ "id": "lulu", "image": "lulu_normal" }),
            json!({ "image": "no_id" }),
            json!({ "id": "", "image": "blank" }),
            json!({ "id": "empty_image", "image": "  " }),
            json!({ "id": "lulu", "image": "lulu_other" }),
            json!({ "id": "mina", "image": "mina", "origin": 5 }),
            json!({ "id": "mina", "image": "mina_normal", "opacity": 400 }),
        ];
        let catalog = PictureCatalog::from_raw(&raw);

        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.get("lulu").unwrap().image, "lulu_normal");
        assert_eq!(catalog.get("mina").unwrap().opacity, 255.0);
        assert!(catalog.get("empty_image").is_none());
        assert!(!catalog.contains("unknown"));

        let warnings = catalog.warnings();
        assert_eq!(warnings.len(), 5);
        assert!(matches!(warnings[0], CatalogError::Malformed { index: 1, .. }));
        assert_eq!(warnings[1], CatalogError::EmptyId { index: 2 });
        assert_eq!(
            warnings[2],
            CatalogError::EmptyImage {
                id: "empty_image".to_string()
            }
        );
        assert_eq!(
            warnings[3],
            CatalogError::DuplicateId {
                id: "lulu".to_string()
            }
        );
        assert!(matches!(warnings[4], CatalogError::Malformed { index: 5, .. }));
    }

    #[test]
    fn test_scale_and_flip() {
        let mut def = PortraitDefinition::new("a", "a");
        def.scale = Vec2::new(50.0, 200.0);
        assert_eq!(def.scale_for(SlotId::Primary), Vec2::new(0.5, 2.0));
        assert_eq!(def.scale_for(SlotId::Secondary), Vec2::new(0.5, 2.0));

        def.flip_slot2 = true;
        assert_eq!(def.scale_for(SlotId::Primary), Vec2::new(0.5, 2.0));
        assert_eq!(def.scale_for(SlotId::Secondary), Vec2::new(-0.5, 2.0));
    }

    #[test]
    fn test_anchor_for_origin() {
        let image = ImageHandle::new("a", 200, 400);
        let mut def = PortraitDefinition::new("a", "a");
        assert_eq!(
            def.anchor_for(SlotId::Primary, &image),
            Vec2::new(464.0, 96.0)
        );

        def.origin = Origin::Center;
        def.scale = Vec2::new(50.0, 50.0);
        def.flip_slot2 = true;
        // 200 * 0.5 / 2 = 50, 400 * 0.5 / 2 = 100
        assert_eq!(
            def.anchor_for(SlotId::Secondary, &image),
            Vec2::new(-30.0, -4.0)
        );
    }

    #[test]
    fn test_iter_in_config_order() {
        assert!(PictureCatalog::from_raw(&[]).is_empty());

        let catalog = PictureCatalog::from_raw(&[
            json!({ "id": "b", "image": "b" }),
            json!({ "id": "a", "image": "a" }),
            json!({ "id": "b", "image": "b2" }),
        ]);
        assert!(!catalog.is_empty());
        let ids: Vec<&str> = catalog.iter().map(|def| def.id.as_str()).collect();
        assert_eq!(ids, ["b", "a"]);
    }

    #[test]
    fn test_image_paths_deduplicated() {
        let catalog = PictureCatalog::from_definitions([
            PortraitDefinition::new("a", "shared"),
            PortraitDefinition::new("b", "shared"),
            PortraitDefinition::new("c", "other"),
        ]);
        assert_eq!(catalog.image_paths(), vec!["shared", "other"]);
    }
}
