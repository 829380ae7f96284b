//! # sp-preview
//!
//! 按场景文件逐帧驱动立绘控制器，输出每帧的精灵参数。
//!
//! ## 用法
//!
//! ```bash
//! cargo run -p host-cli -- --config boot.json --scene scene.json
//! cargo run -p host-cli -- --config boot.json --scene scene.json --assets img/pictures --json
//! ```

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use host_cli::{RunReport, Scene, SceneRunner, SimulatedLoader};
use standing_picture::{BootConfig, SpriteFrame};
use tracing::Level;

#[derive(Parser)]
#[command(name = "sp-preview")]
#[command(about = "立绘预览 - 无界面逐帧运行场景")]
#[command(version)]
struct Cli {
    /// 启动配置（JSON）
    #[arg(short, long)]
    config: PathBuf,

    /// 场景文件（JSON）
    #[arg(short, long)]
    scene: PathBuf,

    /// 图片目录（未指定时只使用场景中的 image_sizes）
    #[arg(short, long)]
    assets: Option<PathBuf>,

    /// 模拟加载耗时（帧）
    #[arg(long, default_value = "2")]
    load_latency: u32,

    /// 以 JSON 输出
    #[arg(long)]
    json: bool,

    /// 日志详细程度（-v: debug, -vv: trace）
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    let config = BootConfig::load(&cli.config)
        .with_context(|| format!("无法加载启动配置: {}", cli.config.display()))?;
    let scene = Scene::load(&cli.scene)?;

    let loader = SimulatedLoader::new(cli.assets, cli.load_latency, scene.image_sizes.clone());
    let mut runner = SceneRunner::new(config, scene.variable_table(), loader);
    let report = runner.run(&scene);

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }
    Ok(())
}

fn print_report(report: &RunReport) {
    for (i, text) in report.messages.iter().enumerate() {
        println!("message #{}: {}", i + 1, text);
    }
    for record in &report.frames {
        let [slot1, slot2] = &record.sprites;
        println!(
            "{:>5} | {} | {}",
            record.frame,
            describe(slot1),
            describe(slot2)
        );
    }
}

fn describe(sprite: &SpriteFrame) -> String {
    let Some(image) = sprite.image.as_ref().filter(|_| sprite.visible) else {
        return format!("{:<44}", "-");
    };
    let mut line = format!(
        "{:<12} ({:>7.1},{:>7.1}) a={:<3}",
        image.key, sprite.position.x, sprite.position.y, sprite.opacity
    );
    if sprite.blend_color.strength > 0 {
        line.push_str(" dim");
    }
    format!("{line:<44}")
}
