//! 单任务渲染流程 - 流程层
//!
//! 核心职责：定义"一个任务"的完整处理流程
//!
//! 流程顺序：
//! 1. 调用渲染器（可选超时，panic 隔离）
//! 2. 按完成模式得出结果
//! 3. 写一行任务日志

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::FutureExt;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::RenderError;
use crate::infrastructure::Renderer;
use crate::models::RenderJob;
use crate::services::JobLogger;

/// 完成信号的语义
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionMode {
    /// 检查渲染结果，失败会出现在统计里
    #[default]
    Checked,
    /// 不检查渲染结果，只表示"任务走完了"
    FireAndForget,
}

impl CompletionMode {
    pub fn parse(text: &str) -> Option<Self> {
        match text.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "checked" => Some(Self::Checked),
            "fire_and_forget" => Some(Self::FireAndForget),
            _ => None,
        }
    }
}

/// 任务结果
#[derive(Debug)]
pub enum JobOutcome {
    /// 渲染成功
    Rendered,
    /// 渲染失败
    Failed(RenderError),
    /// 未检查结果（FireAndForget 模式）
    Unchecked,
    /// 批次被取消，任务从未开始
    Cancelled,
}

impl JobOutcome {
    fn label(&self) -> &'static str {
        match self {
            Self::Rendered => "✓",
            Self::Failed(_) => "✗",
            Self::Unchecked => "·",
            Self::Cancelled => "-",
        }
    }
}

/// 完成信号：每个入队的任务恰好一个
#[derive(Debug)]
pub struct JobCompletion {
    pub job: RenderJob,
    pub outcome: JobOutcome,
}

impl JobCompletion {
    pub fn cancelled(job: RenderJob) -> Self {
        Self {
            job,
            outcome: JobOutcome::Cancelled,
        }
    }
}

/// 单任务渲染流程
///
/// - 不持有队列，不关心并发
/// - 每个任务最多尝试一次
pub struct RenderFlow {
    renderer: Arc<dyn Renderer>,
    logger: Arc<dyn JobLogger>,
    mode: CompletionMode,
    timeout: Option<Duration>,
}

impl RenderFlow {
    pub fn new(renderer: Arc<dyn Renderer>, logger: Arc<dyn JobLogger>) -> Self {
        Self {
            renderer,
            logger,
            mode: CompletionMode::default(),
            timeout: None,
        }
    }

    pub fn with_mode(mut self, mode: CompletionMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub async fn run(&self, job: &RenderJob) -> JobOutcome {
        let started = Instant::now();
        let result = self.invoke(job).await;
        let elapsed = started.elapsed();

        let outcome = match (self.mode, result) {
            (CompletionMode::Checked, Ok(())) => JobOutcome::Rendered,
            (CompletionMode::Checked, Err(e)) => {
                warn!("渲染失败 {}: {}", job.output_path.display(), e);
                JobOutcome::Failed(e)
            }
            (CompletionMode::FireAndForget, result) => {
                if let Err(e) = result {
                    debug!("忽略渲染结果 {}: {}", job.output_path.display(), e);
                }
                JobOutcome::Unchecked
            }
        };

        self.logger
            .log(&format!("{} {} {:.2}s", outcome.label(), job, elapsed.as_secs_f64()));

        outcome
    }

    async fn invoke(&self, job: &RenderJob) -> Result<(), RenderError> {
        let render = AssertUnwindSafe(self.renderer.render(job)).catch_unwind();

        let caught = match self.timeout {
            Some(after) => match tokio::time::timeout(after, render).await {
                Ok(caught) => caught,
                Err(_) => return Err(RenderError::TimedOut { after }),
            },
            None => render.await,
        };

        caught.unwrap_or_else(|panic| Err(RenderError::Panicked(panic_message(&*panic))))
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
