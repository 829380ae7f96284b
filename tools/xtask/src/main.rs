//! # xtask - 开发辅助工具
//!
//! 提供本地质量门禁与开发辅助命令。
//!
//! ## 命令
//!
//! - `check-all`: 运行 fmt、clippy、test
//! - `cov-core`: 运行 standing-picture 覆盖率
//! - `catalog-check`: 检查启动配置中的立绘清单（无效条目、缺失图片）

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use standing_picture::{BootConfig, PictureCatalog};
use walkdir::WalkDir;
use xshell::{Shell, cmd};

const IMAGE_EXTENSIONS: [&str; 4] = ["png", "webp", "jpg", "jpeg"];

fn main() -> ExitCode {
    if let Err(e) = real_main() {
        eprintln!("xtask error: {e:#}");
        return ExitCode::from(1);
    }
    ExitCode::from(0)
}

fn real_main() -> anyhow::Result<()> {
    let mut args = std::env::args().skip(1);
    let sub = args.next().unwrap_or_else(|| "help".to_string());

    match sub.as_str() {
        "check-all" => {
            let sh = Shell::new()?;
            eprintln!("\n==> cargo fmt --all -- --check");
            cmd!(sh, "cargo fmt --all -- --check").run()?;
            eprintln!("\n==> cargo clippy --workspace --all-targets");
            cmd!(sh, "cargo clippy --workspace --all-targets").run()?;
            eprintln!("\n==> cargo test --workspace");
            cmd!(sh, "cargo test --workspace").run()?;
        }
        "cov-core" => {
            let sh = Shell::new()?;
            if cmd!(sh, "cargo llvm-cov --version").quiet().run().is_err() {
                anyhow::bail!(
                    "cargo llvm-cov 不可用。\n\
请先安装：\n\
  - cargo install cargo-llvm-cov\n\
  - rustup component add llvm-tools-preview\n\
然后重试。"
                );
            }
            eprintln!("\n==> cargo llvm-cov -p standing-picture --html");
            cmd!(sh, "cargo llvm-cov -p standing-picture --html").run()?;
            eprintln!("\nCoverage HTML: target/llvm-cov/html/index.html");
        }
        "catalog-check" => {
            let Some(config) = args.next() else {
                anyhow::bail!("缺少配置文件路径\n用法: cargo xtask catalog-check <config> [--pictures <dir>]");
            };
            let mut pictures = None;
            while let Some(arg) = args.next() {
                match arg.as_str() {
                    "--pictures" => pictures = args.next().map(PathBuf::from),
                    other => anyhow::bail!("unknown argument: {other}"),
                }
            }
            catalog_check(Path::new(&config), pictures.as_deref())?;
        }
        "help" | "-h" | "--help" => {
            print_help();
        }
        other => anyhow::bail!("unknown xtask subcommand: {other}"),
    }

    Ok(())
}

fn print_help() {
    eprintln!(
        r#"xtask - 开发辅助工具

USAGE:
  cargo xtask <command>

COMMANDS:
  check-all       运行 fmt、clippy、test 门禁检查
  cov-core        运行 standing-picture 覆盖率报告
  catalog-check   检查立绘清单

CATALOG-CHECK:
  cargo xtask catalog-check <config> [--pictures <dir>]

  检查内容：
    - 格式错误、缺少 ID / 图片、ID 重复的条目
    - 清单中没有任何有效立绘
    - 图片文件是否存在（指定 --pictures 时）
"#
    );
}

//=============================================================================
// catalog-check 命令实现
//=============================================================================

fn catalog_check(config_path: &Path, pictures_dir: Option<&Path>) -> anyhow::Result<()> {
    let config = BootConfig::load(config_path)?;
    let catalog = PictureCatalog::from_raw(&config.pictures);

    eprintln!(
        "==> {}: {} 个立绘定义，{} 个有效\n",
        config_path.display(),
        config.pictures.len(),
        catalog.len()
    );

    for entry in catalog.iter() {
        eprintln!("  {} -> {}", entry.id, entry.image);
    }
    for warning in catalog.warnings() {
        eprintln!("[WARN] {warning}");
    }
    if catalog.is_empty() {
        eprintln!("[WARN] 没有可用的立绘定义");
    }

    let mut missing = Vec::new();
    if let Some(dir) = pictures_dir {
        if !dir.is_dir() {
            anyhow::bail!("图片目录不存在: {}", dir.display());
        }
        let available = collect_image_stems(dir);
        for path in catalog.image_paths() {
            if !available.contains(path) {
                missing.push(path);
            }
        }
    }
    for path in &missing {
        eprintln!("[WARN] 图片不存在: {path}");
    }

    let warn_count =
        catalog.warnings().len() + missing.len() + usize::from(catalog.is_empty());
    eprintln!();
    if warn_count > 0 {
        anyhow::bail!("立绘清单检查发现 {warn_count} 个问题");
    }
    eprintln!("✅ 检查通过，无错误");
    Ok(())
}

/// 收集目录下所有图片（相对路径，不含扩展名，`/` 分隔）
fn collect_image_stems(dir: &Path) -> BTreeSet<String> {
    WalkDir::new(dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter_map(|e| {
            let path = e.path();
            let ext = path.extension()?.to_str()?.to_ascii_lowercase();
            if !IMAGE_EXTENSIONS.contains(&ext.as_str()) {
                return None;
            }
            let relative = path.strip_prefix(dir).ok()?.with_extension("");
            Some(relative.to_string_lossy().replace('\\', "/"))
        })
        .collect()
}
