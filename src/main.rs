use std::path::PathBuf;

use anyhow::{bail, Result};
use primitive_batch::{logger, App, Config};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    // 加载配置：RENDER_CONFIG 指向 TOML 文件时优先使用
    let mut config = match std::env::var("RENDER_CONFIG") {
        Ok(path) => Config::from_toml_file(&path)?,
        Err(_) => Config::from_env(),
    };

    // 位置参数: <input_dir> <output_dir>
    let mut args = std::env::args().skip(1);
    if let Some(input_dir) = args.next() {
        config.input_dir = PathBuf::from(input_dir);
    }
    if let Some(output_dir) = args.next() {
        config.output_dir = PathBuf::from(output_dir);
    }

    // 初始化日志
    logger::init_with_verbose(config.verbose_logging);

    let app = App::initialize(config).await?;

    // Ctrl-C：做完进行中的任务后停止
    let cancel = app.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("⏹️ 收到中断信号，等待进行中的任务结束...");
            cancel.cancel();
        }
    });

    let summary = app.run().await?;

    if !summary.is_success() {
        bail!("{} 个任务渲染失败, {} 个任务已取消", summary.failed, summary.cancelled);
    }
    info!("✓ 完成");

    Ok(())
}
