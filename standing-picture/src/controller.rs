//! # Controller 模块
//!
//! 立绘控制器：接收宿主的事件回调，驱动两个槽位的状态机。
//!
//! ## 驱动模型
//!
//! ```text
//! on_message_start(text)  ──► DisplayRequest ──► 更新槽位目标
//!                                               └► HostRequest::Load 入队
//! on_image_loaded(ticket) ──► 槽位进入 Opening
//! on_frame_tick()         ──► 推进一帧 ──► [SpriteFrame; 2]
//! ```
//!
//! 控制器拥有全部状态（包括全局开关和色调），没有任何进程级的全局变量。

use tracing::{debug, info, warn};

use crate::catalog::PictureCatalog;
use crate::config::{BootConfig, GlobalConfig, SlotConfig};
use crate::decoder::{self, DisplayRequest, FocusTarget, VariableSource};
use crate::error::{LoadError, UnknownMotion};
use crate::loader::{HostRequest, ImageHandle, LoadTicket};
use crate::motion::Motion;
use crate::slot::{SlotId, SlotState};
use crate::sprite::{SpriteFrame, Tone};

/// 立绘控制器
///
/// # 使用示例
///
/// ```ignore
/// let mut controller = StandingPictureController::boot(config);
///
/// let text = controller.on_message_start(raw, &variables);
/// for request in controller.drain_requests() {
///     host.load(request);
/// }
///
/// // 每帧
/// let frames = controller.on_frame_tick();
/// ```
#[derive(Debug)]
pub struct StandingPictureController {
    catalog: PictureCatalog,
    slot_configs: [SlotConfig; 2],
    focus_darken: i32,
    global: GlobalConfig,
    slots: [SlotState; 2],
    focus: FocusTarget,
    /// 待宿主处理的请求
    requests: Vec<HostRequest>,
}

impl StandingPictureController {
    /// 启动：构建立绘清单，需要时为全部图片发出预加载请求
    pub fn boot(config: BootConfig) -> Self {
        let catalog = PictureCatalog::from_raw(&config.pictures);
        let slot_configs = SlotId::ALL.map(|slot| *config.slot(slot));

        let requests = if config.preload_on_boot {
            catalog
                .image_paths()
                .into_iter()
                .map(|path| HostRequest::Preload {
                    path: path.to_string(),
                })
                .collect()
        } else {
            Vec::new()
        };

        info!(
            pictures = catalog.len(),
            skipped = catalog.warnings().len(),
            preload = requests.len(),
            "立绘控制器启动"
        );

        Self {
            slots: SlotId::ALL.map(|slot| SlotState::new(slot, slot_configs[slot.index()].transition)),
            catalog,
            slot_configs,
            focus_darken: config.focus_darken(),
            global: GlobalConfig::default(),
            focus: FocusTarget::None,
            requests,
        }
    }

    /// 消息开始：替换变量、解码控制字符并应用
    ///
    /// 返回删除控制字符后的文本。
    pub fn on_message_start(&mut self, raw: &str, vars: &impl VariableSource) -> String {
        let (request, text) = decoder::decode_message(raw, vars);
        self.apply_request(&request);
        text
    }

    /// 应用显示请求
    ///
    /// - 立绘 ID 不在清单中时清除该槽位
    /// - 没有触发的槽位被清除
    /// - 焦点持续到下一条消息
    pub fn apply_request(&mut self, request: &DisplayRequest) {
        for slot in SlotId::ALL {
            let state = &mut self.slots[slot.index()];
            let Some(trigger) = request.trigger(slot) else {
                state.clear();
                continue;
            };
            let Some(portrait) = self.catalog.get(&trigger.portrait_id) else {
                warn!(slot = %slot, id = %trigger.portrait_id, "立绘 ID 不存在，清除槽位");
                state.clear();
                continue;
            };

            let motion = match trigger.motion.as_deref() {
                Some(name) => name.parse().unwrap_or_else(|e: UnknownMotion| {
                    debug!(slot = %slot, error = %e, "按无动作处理");
                    Motion::None
                }),
                None => Motion::None,
            };

            if let Some(ticket) = state.show(portrait, motion) {
                self.requests.push(HostRequest::Load {
                    ticket,
                    path: portrait.image.clone(),
                });
            }
        }

        self.focus = request.focus;
        for state in &mut self.slots {
            state.set_focus_darkened(self.focus.darkens(state.slot()));
        }
    }

    /// 消息窗口完全关闭：两个槽位都开始淡出
    pub fn on_message_window_fully_closed(&mut self) {
        debug!("消息窗口关闭，清除立绘");
        for state in &mut self.slots {
            state.clear();
        }
    }

    /// 推进一帧并返回两个槽位的渲染参数
    ///
    /// 全局关闭时状态冻结，输出不透明度为 0。
    pub fn on_frame_tick(&mut self) -> [SpriteFrame; 2] {
        if self.global.enabled {
            for state in &mut self.slots {
                state.advance();
            }
        }
        SlotId::ALL.map(|slot| self.sprite_frame(slot))
    }

    /// 读取当前渲染参数（不推进）
    pub fn sprite_frame(&self, slot: SlotId) -> SpriteFrame {
        self.slots[slot.index()].frame(
            &self.slot_configs[slot.index()],
            &self.global,
            self.focus_darken,
        )
    }

    /// 宿主回报：图片加载完成
    pub fn on_image_loaded(&mut self, ticket: LoadTicket, image: ImageHandle) {
        self.slots[ticket.slot.index()].on_loaded(ticket, image);
    }

    /// 宿主回报：图片加载失败
    pub fn on_image_failed(&mut self, ticket: LoadTicket, error: LoadError) {
        if self.slots[ticket.slot.index()].on_failed(ticket) {
            warn!(slot = %ticket.slot, error = %error, "立绘图片加载失败");
        } else {
            debug!(slot = %ticket.slot, error = %error, "忽略过期的加载失败");
        }
    }

    /// 取出待处理的宿主请求
    pub fn drain_requests(&mut self) -> Vec<HostRequest> {
        std::mem::take(&mut self.requests)
    }

    /// 插件命令：立绘显示开关
    pub fn set_enabled(&mut self, enabled: bool) {
        if self.global.enabled != enabled {
            info!(enabled, "切换立绘显示");
        }
        self.global.enabled = enabled;
    }

    /// 插件命令：设置色调（各分量截断到合法区间）
    pub fn set_tone(&mut self, red: i32, green: i32, blue: i32, gray: i32) {
        let tone = Tone::clamped(red, green, blue, gray);
        info!(?tone, "设置立绘色调");
        self.global.tone = Some(tone);
    }

    pub fn slot(&self, slot: SlotId) -> &SlotState {
        &self.slots[slot.index()]
    }

    pub fn global(&self) -> &GlobalConfig {
        &self.global
    }

    pub fn catalog(&self) -> &PictureCatalog {
        &self.catalog
    }

    pub fn focus(&self) -> FocusTarget {
        self.focus
    }
}
