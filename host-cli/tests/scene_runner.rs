//! # 场景运行集成测试
//!
//! 配置和场景写入临时目录，图片使用真实的 PNG 文件。

use std::path::Path;

use host_cli::{Scene, SceneRunner, SimulatedLoader};
use standing_picture::{BootConfig, SlotId, SlotPhase, Vec2};

const PRIMARY: usize = 0;

fn write(dir: &Path, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    path
}

fn write_png(dir: &Path, name: &str, width: u32, height: u32) {
    image::RgbaImage::new(width, height)
        .save(dir.join(format!("{name}.png")))
        .unwrap();
}

const BOOT: &str = r#"{
    "slot1": { "transition": "fade" },
    "pictures": [
        { "id": "lulu", "image": "lulu_normal" },
        { "id": "lulu_center", "image": "lulu_normal", "origin": "center" },
        { "id": "ghost", "image": "ghost" }
    ]
}"#;

fn runner(dir: &Path, latency: u32) -> SceneRunner {
    let config = BootConfig::load(write(dir, "boot.json", BOOT)).unwrap();
    let loader = SimulatedLoader::new(Some(dir.to_path_buf()), latency, Default::default());
    SceneRunner::new(config, Default::default(), loader)
}

#[test]
fn test_show_then_close() {
    let dir = tempfile::tempdir().unwrap();
    write_png(dir.path(), "lulu_normal", 40, 80);
    let scene_path = write(
        dir.path(),
        "scene.json",
        r#"{
            "events": [
                { "message": "\\F[lulu]\\M[jump]こんにちは" },
                { "ticks": 20 },
                "close_window",
                { "ticks": 20 }
            ]
        }"#,
    );
    let scene = Scene::load(scene_path).unwrap();

    let mut runner = runner(dir.path(), 2);
    let report = runner.run(&scene);

    assert_eq!(report.messages, ["こんにちは"]);
    assert_eq!(report.frames.len(), 40);
    assert_eq!(report.frames[0].frame, 1);

    // 第 1 帧仍在加载，第 2 帧加载完成开始淡入
    assert!(!report.frames[0].sprites[PRIMARY].visible);
    assert_eq!(report.frames[1].sprites[PRIMARY].opacity, 17);
    assert_eq!(report.frames[15].sprites[PRIMARY].opacity, 255);

    let last = &report.frames[39].sprites[PRIMARY];
    assert!(!last.visible);
    assert_eq!(runner.controller().slot(SlotId::Primary).phase(), SlotPhase::Hidden);
}

#[test]
fn test_center_origin_uses_file_dimensions() {
    let dir = tempfile::tempdir().unwrap();
    write_png(dir.path(), "lulu_normal", 40, 80);
    let scene = Scene::from_json_str(
        r#"{ "events": [ { "message": "\\F[lulu_center]" }, { "ticks": 20 } ] }"#,
    )
    .unwrap();

    let report = runner(dir.path(), 1).run(&scene);
    let last = &report.frames[19].sprites[PRIMARY];
    assert!(last.visible);
    assert_eq!(last.position, Vec2::new(444.0, 56.0));
    assert_eq!(last.image.as_ref().map(|i| (i.width, i.height)), Some((40, 80)));
}

#[test]
fn test_missing_image_never_shows() {
    let dir = tempfile::tempdir().unwrap();
    let scene = Scene::from_json_str(
        r#"{ "events": [ { "message": "\\F[ghost]" }, { "ticks": 20 } ] }"#,
    )
    .unwrap();

    let mut runner = runner(dir.path(), 1);
    let report = runner.run(&scene);
    assert!(report.frames.iter().all(|f| !f.sprites[PRIMARY].visible));
    assert!(!runner.controller().slot(SlotId::Primary).is_loading());
}

#[test]
fn test_corrupt_image_fails_to_load() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "ghost.png", "not a png");
    let scene = Scene::from_json_str(
        r#"{ "events": [ { "message": "\\F[ghost]" }, { "ticks": 5 } ] }"#,
    )
    .unwrap();

    let mut runner = runner(dir.path(), 1);
    runner.run(&scene);
    let slot = runner.controller().slot(SlotId::Primary);
    assert_eq!(slot.phase(), SlotPhase::Hidden);
    assert!(!slot.is_loading());
}

#[test]
fn test_variables_and_commands() {
    let dir = tempfile::tempdir().unwrap();
    write_png(dir.path(), "lulu_normal", 40, 80);
    let scene = Scene::from_json_str(
        r#"{
            "variables": { "3": "lulu" },
            "events": [
                { "message": "\\F[\\V[3]]所持金\\V[4]G" },
                { "ticks": 20 },
                { "set_tone": [300, 0, 0, 0] },
                { "set_enabled": false },
                { "ticks": 1 },
                { "set_enabled": true },
                { "set_variable": { "id": 4, "value": 120 } },
                { "message": "\\F[\\V[3]]所持金\\V[4]G" },
                { "ticks": 1 }
            ]
        }"#,
    )
    .unwrap();

    let mut runner = SceneRunner::new(
        BootConfig::from_json_str(BOOT).unwrap(),
        scene.variable_table(),
        SimulatedLoader::new(Some(dir.path().to_path_buf()), 1, Default::default()),
    );
    let report = runner.run(&scene);

    assert_eq!(report.messages, ["所持金0G", "所持金120G"]);
    let disabled = &report.frames[20].sprites[PRIMARY];
    assert_eq!(disabled.opacity, 0);
    assert_eq!(disabled.color_tone.red, 255);
    let resumed = &report.frames[21].sprites[PRIMARY];
    assert_eq!(resumed.opacity, 255);
    assert!(resumed.visible);
}
