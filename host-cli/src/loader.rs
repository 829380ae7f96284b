//! # Loader 模块
//!
//! 模拟异步图片加载：请求在若干帧之后完成。
//!
//! 图片尺寸优先取场景文件中的 `image_sizes`，否则在资源目录下按
//! `<path>.png` / `.webp` / `.jpg` / `.jpeg` 查找并读取文件头。
//! 已加载（含预加载）的图片进入缓存，下一帧即可完成。

use std::collections::HashMap;
use std::path::PathBuf;

use standing_picture::{HostRequest, ImageHandle, LoadError, LoadTicket};
use tracing::{debug, warn};

const EXTENSIONS: [&str; 4] = ["png", "webp", "jpg", "jpeg"];

/// 加载结果
#[derive(Debug, Clone, PartialEq)]
pub enum Completion {
    Loaded(LoadTicket, ImageHandle),
    Failed(LoadTicket, LoadError),
}

#[derive(Debug)]
struct InFlight {
    ticket: LoadTicket,
    path: String,
    remaining: u32,
}

/// 模拟加载器
#[derive(Debug, Default)]
pub struct SimulatedLoader {
    assets_root: Option<PathBuf>,
    latency: u32,
    known_sizes: HashMap<String, [u32; 2]>,
    cache: HashMap<String, ImageHandle>,
    in_flight: Vec<InFlight>,
}

impl SimulatedLoader {
    /// - `assets_root`: 图片目录，`None` 时只使用 `known_sizes`
    /// - `latency`: 加载耗时（帧）
    pub fn new(
        assets_root: Option<PathBuf>,
        latency: u32,
        known_sizes: HashMap<String, [u32; 2]>,
    ) -> Self {
        Self {
            assets_root,
            latency,
            known_sizes,
            cache: HashMap::new(),
            in_flight: Vec::new(),
        }
    }

    /// 接收控制器发出的请求
    pub fn submit(&mut self, request: HostRequest) {
        match request {
            HostRequest::Load { ticket, path } => {
                let remaining = if self.cache.contains_key(&path) {
                    1
                } else {
                    self.latency.max(1)
                };
                debug!(slot = %ticket.slot, path = %path, remaining, "开始加载");
                self.in_flight.push(InFlight {
                    ticket,
                    path,
                    remaining,
                });
            }
            HostRequest::Preload { path } => match self.resolve(&path) {
                Ok(_) => debug!(path = %path, "预加载完成"),
                Err(e) => warn!(error = %e, "预加载失败"),
            },
        }
    }

    /// 推进一帧，返回本帧完成的加载
    pub fn poll(&mut self) -> Vec<Completion> {
        let mut done = Vec::new();
        let mut pending = Vec::with_capacity(self.in_flight.len());
        for mut job in std::mem::take(&mut self.in_flight) {
            job.remaining = job.remaining.saturating_sub(1);
            if job.remaining == 0 {
                done.push(job);
            } else {
                pending.push(job);
            }
        }
        self.in_flight = pending;

        done.into_iter()
            .map(|job| match self.resolve(&job.path) {
                Ok(image) => Completion::Loaded(job.ticket, image),
                Err(e) => Completion::Failed(job.ticket, e),
            })
            .collect()
    }

    /// 是否还有未完成的加载
    pub fn is_idle(&self) -> bool {
        self.in_flight.is_empty()
    }

    fn resolve(&mut self, path: &str) -> Result<ImageHandle, LoadError> {
        if let Some(image) = self.cache.get(path) {
            return Ok(image.clone());
        }

        let image = match self.known_sizes.get(path) {
            Some(&[width, height]) => ImageHandle::new(path, width, height),
            None => self.read_dimensions(path)?,
        };
        self.cache.insert(path.to_string(), image.clone());
        Ok(image)
    }

    fn read_dimensions(&self, path: &str) -> Result<ImageHandle, LoadError> {
        let not_found = || LoadError::NotFound {
            path: path.to_string(),
        };
        let root = self.assets_root.as_ref().ok_or_else(not_found)?;
        let file = EXTENSIONS
            .iter()
            .map(|ext| root.join(format!("{path}.{ext}")))
            .find(|candidate| candidate.is_file())
            .ok_or_else(not_found)?;

        let (width, height) =
            image::image_dimensions(&file).map_err(|e| LoadError::Decode {
                path: path.to_string(),
                message: e.to_string(),
            })?;
        Ok(ImageHandle::new(path, width, height))
    }
}
