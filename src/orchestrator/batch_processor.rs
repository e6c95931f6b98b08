//! 批量渲染应用 - 编排层
//!
//! ## 职责
//!
//! 本模块是整个应用的入口，负责把配置变成一次完整的批量渲染。
//!
//! ## 核心功能
//!
//! 1. **应用初始化**：校验配置、初始化任务日志、构造渲染器
//! 2. **任务枚举**：扫描输入目录，跳过已存在的输出
//! 3. **批量调度**：交给 `BatchScheduler` 并发执行
//! 4. **全局统计**：输出统计，按需写入 JSON

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::config::Config;
use crate::infrastructure::{PrimitiveRenderer, Renderer};
use crate::orchestrator::scheduler::{BatchScheduler, BatchSummary};
use crate::services::{JobEnumerator, JobLogger, SerializedLogger, TracingJobLogger};
use crate::utils::logging::{init_log_file, log_startup, print_final_stats, write_summary};

/// 应用主结构
pub struct App {
    config: Config,
    enumerator: JobEnumerator,
    scheduler: BatchScheduler,
}

impl App {
    /// 初始化应用，使用外部 `primitive` 渲染器
    pub async fn initialize(config: Config) -> Result<Self> {
        let renderer = Arc::new(PrimitiveRenderer::new(
            config.renderer_program.clone(),
            config.input_size,
        ));
        Self::with_renderer(config, renderer)
    }

    /// 使用指定渲染器初始化
    pub fn with_renderer(config: Config, renderer: Arc<dyn Renderer>) -> Result<Self> {
        config.validate()?;

        let logger: Arc<dyn JobLogger> = match &config.job_log_file {
            Some(path) => {
                init_log_file(Path::new(path)).with_context(|| format!("无法初始化任务日志: {}", path))?;
                Arc::new(SerializedLogger::append_to(path).with_context(|| format!("无法打开任务日志: {}", path))?)
            }
            None => Arc::new(TracingJobLogger),
        };

        log_startup(&config);

        let enumerator = JobEnumerator::new(config.layout, &config.extensions);
        let scheduler = BatchScheduler::new(renderer, logger, config.pool_size)
            .with_completion_mode(config.completion_mode)
            .with_job_timeout(config.job_timeout());

        Ok(Self {
            config,
            enumerator,
            scheduler,
        })
    }

    /// 取消令牌（例如 Ctrl-C 时触发）
    pub fn cancellation_token(&self) -> CancellationToken {
        self.scheduler.cancellation_token()
    }

    /// 运行应用主逻辑
    pub async fn run(&self) -> Result<BatchSummary> {
        let jobs = self
            .enumerator
            .enumerate(&self.config.input_dir, &self.config.output_dir, &self.config.parameter_space())
            .await?;

        let summary = if jobs.is_empty() {
            warn!("⚠️ 没有需要渲染的任务");
            BatchSummary::default()
        } else {
            self.scheduler.run(jobs).await?
        };

        print_final_stats(&summary);

        if let Some(path) = &self.config.summary_file {
            write_summary(Path::new(path), &summary)?;
        }

        Ok(summary)
    }
}
