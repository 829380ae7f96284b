//! # Runner 模块
//!
//! 按场景事件驱动控制器，记录每一帧的渲染参数。
//!
//! 每帧的处理顺序：
//!
//! 1. 加载器推进一帧，完成的加载回报给控制器
//! 2. `on_frame_tick()` 推进两个槽位
//! 3. 记录 [`FrameRecord`]

use std::collections::HashMap;

use serde::Serialize;
use standing_picture::{BootConfig, SpriteFrame, StandingPictureController, VarValue};
use tracing::info;

use crate::loader::{Completion, SimulatedLoader};
use crate::scene::{Scene, SceneEvent, to_var_value};

/// 一帧的输出
#[derive(Debug, Clone, Serialize)]
pub struct FrameRecord {
    /// 帧序号（从 1 开始）
    pub frame: u64,
    pub sprites: [SpriteFrame; 2],
}

/// 一次场景运行的结果
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunReport {
    /// 删除控制字符后的消息文本
    pub messages: Vec<String>,
    pub frames: Vec<FrameRecord>,
}

/// 场景运行器
pub struct SceneRunner {
    controller: StandingPictureController,
    loader: SimulatedLoader,
    variables: HashMap<u32, VarValue>,
    frame: u64,
}

impl SceneRunner {
    /// 启动控制器，处理启动时的预加载请求
    pub fn new(config: BootConfig, variables: HashMap<u32, VarValue>, loader: SimulatedLoader) -> Self {
        let mut runner = Self {
            controller: StandingPictureController::boot(config),
            loader,
            variables,
            frame: 0,
        };
        runner.dispatch_requests();
        runner
    }

    pub fn controller(&self) -> &StandingPictureController {
        &self.controller
    }

    /// 依次执行场景事件
    pub fn run(&mut self, scene: &Scene) -> RunReport {
        let mut report = RunReport::default();
        for event in &scene.events {
            self.handle(event, &mut report);
        }
        info!(
            frames = report.frames.len(),
            messages = report.messages.len(),
            "场景运行结束"
        );
        report
    }

    fn handle(&mut self, event: &SceneEvent, report: &mut RunReport) {
        match event {
            SceneEvent::Message(raw) => {
                let text = self.controller.on_message_start(raw, &self.variables);
                info!(text = %text, "消息开始");
                report.messages.push(text);
                self.dispatch_requests();
            }
            SceneEvent::Ticks(count) => {
                for _ in 0..*count {
                    report.frames.push(self.tick());
                }
            }
            SceneEvent::CloseWindow => self.controller.on_message_window_fully_closed(),
            SceneEvent::SetEnabled(enabled) => self.controller.set_enabled(*enabled),
            SceneEvent::SetTone([red, green, blue, gray]) => {
                self.controller.set_tone(*red, *green, *blue, *gray)
            }
            SceneEvent::SetVariable { id, value } => {
                self.variables.insert(*id, to_var_value(value));
            }
        }
    }

    /// 推进一帧
    pub fn tick(&mut self) -> FrameRecord {
        for completion in self.loader.poll() {
            match completion {
                Completion::Loaded(ticket, image) => self.controller.on_image_loaded(ticket, image),
                Completion::Failed(ticket, error) => self.controller.on_image_failed(ticket, error),
            }
        }
        self.frame += 1;
        FrameRecord {
            frame: self.frame,
            sprites: self.controller.on_frame_tick(),
        }
    }

    fn dispatch_requests(&mut self) {
        for request in self.controller.drain_requests() {
            self.loader.submit(request);
        }
    }
}
