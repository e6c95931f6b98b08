//! 日志工具模块
//!
//! 提供启动横幅、统计输出和任务日志文件头

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use anyhow::Result;
use tracing::{info, warn};

use crate::config::Config;
use crate::orchestrator::BatchSummary;

/// 初始化任务日志文件：追加一段带时间的分隔头
///
/// # 参数
/// - `log_file_path`: 日志文件路径
pub fn init_log_file(log_file_path: &Path) -> Result<()> {
    let log_header = format!(
        "{}\n渲染任务日志 - {}\n{}\n",
        "=".repeat(60),
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        "=".repeat(60)
    );
    let mut file = OpenOptions::new().create(true).append(true).open(log_file_path)?;
    file.write_all(log_header.as_bytes())?;
    Ok(())
}

/// 记录程序启动信息
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 批量渲染模式");
    info!("📁 输入目录: {}", config.input_dir.display());
    info!("📁 输出目录: {}", config.output_dir.display());
    info!(
        "🎛️ n={:?} a={:?} s={:?} m={:?}",
        config.shape_counts, config.alphas, config.scales, config.modes
    );
    if !config.options.is_empty() {
        info!("🎛️ 选项: {:?}", config.options);
    }
    info!("📊 worker 数量: {}", config.pool_size);
    info!("{}", "=".repeat(60));
}

/// 打印最终统计信息
pub fn print_final_stats(summary: &BatchSummary) {
    info!("\n{}", "=".repeat(60));
    info!("📊 全部处理完成统计");
    info!("完成时间: {}", chrono::Local::now().format("%Y-%m-%d %H:%M:%S"));
    info!("耗时: {:.1}s", summary.elapsed_secs);
    info!("{}", "=".repeat(60));
    info!("✅ 成功: {}/{}", summary.rendered, summary.total);
    if summary.unchecked > 0 {
        info!("· 未检查: {}", summary.unchecked);
    }
    info!("❌ 失败: {}", summary.failed);
    if summary.cancelled > 0 {
        info!("⏹️ 已取消: {}", summary.cancelled);
    }
    for failure in &summary.failures {
        warn!("  {} -> {}: {}", failure.input_path.display(), failure.output_path.display(), failure.reason);
    }
    info!("{}", "=".repeat(60));
}

/// 将统计写入 JSON 文件
pub fn write_summary(path: &Path, summary: &BatchSummary) -> Result<()> {
    let json = serde_json::to_string_pretty(summary)?;
    std::fs::write(path, json)?;
    info!("\n统计已保存至: {}", path.display());
    Ok(())
}
