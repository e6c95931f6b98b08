//! 批量调度器 - 编排层
//!
//! 驱动方流程：全部任务入队 → 启动 worker 池 → 在完成屏障上等待
//! → 关闭 worker 池 → 汇总统计。
//!
//! 取消时：worker 做完手上的任务后退出，队列里剩下的任务记为已取消，
//! 因此完成信号总数始终等于入队任务数。

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::error::AppResult;
use crate::infrastructure::Renderer;
use crate::models::RenderJob;
use crate::orchestrator::completion::CompletionBarrier;
use crate::orchestrator::job_queue::JobQueue;
use crate::orchestrator::worker_pool::WorkerPool;
use crate::services::JobLogger;
use crate::workflow::{CompletionMode, JobCompletion, JobOutcome, RenderFlow};

/// 失败任务
#[derive(Debug, Clone, Serialize)]
pub struct FailedJob {
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    pub reason: String,
}

/// 批次统计
#[derive(Debug, Default, Clone, Serialize)]
pub struct BatchSummary {
    pub total: usize,
    pub rendered: usize,
    pub failed: usize,
    pub unchecked: usize,
    pub cancelled: usize,
    pub elapsed_secs: f64,
    pub failures: Vec<FailedJob>,
}

impl BatchSummary {
    fn from_completions(completions: &[JobCompletion], elapsed: Duration) -> Self {
        let mut summary = Self {
            total: completions.len(),
            elapsed_secs: elapsed.as_secs_f64(),
            ..Default::default()
        };

        for completion in completions {
            match &completion.outcome {
                JobOutcome::Rendered => summary.rendered += 1,
                JobOutcome::Unchecked => summary.unchecked += 1,
                JobOutcome::Cancelled => summary.cancelled += 1,
                JobOutcome::Failed(e) => {
                    summary.failed += 1;
                    summary.failures.push(FailedJob {
                        input_path: completion.job.input_path.clone(),
                        output_path: completion.job.output_path.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        summary
    }

    pub fn is_success(&self) -> bool {
        self.failed == 0 && self.cancelled == 0
    }
}

/// 批量调度器
pub struct BatchScheduler {
    renderer: Arc<dyn Renderer>,
    logger: Arc<dyn JobLogger>,
    pool_size: usize,
    mode: CompletionMode,
    job_timeout: Option<Duration>,
    cancel: CancellationToken,
}

impl BatchScheduler {
    pub fn new(renderer: Arc<dyn Renderer>, logger: Arc<dyn JobLogger>, pool_size: usize) -> Self {
        Self {
            renderer,
            logger,
            pool_size: pool_size.max(1),
            mode: CompletionMode::default(),
            job_timeout: None,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_completion_mode(mut self, mode: CompletionMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_job_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.job_timeout = timeout;
        self
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// 取消令牌，触发后批次在当前任务完成后停止
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// 运行一个批次
    ///
    /// 调用前任务列表必须已经完整生成；返回时收到的完成信号数等于任务数
    pub async fn run(&self, jobs: Vec<RenderJob>) -> AppResult<BatchSummary> {
        let started = Instant::now();
        let queue = Arc::new(JobQueue::new());

        let count = jobs.len();
        for job in jobs {
            queue.push(job)?;
        }

        let flow = Arc::new(
            RenderFlow::new(self.renderer.clone(), self.logger.clone())
                .with_mode(self.mode)
                .with_timeout(self.job_timeout),
        );

        let (done, mut barrier) = CompletionBarrier::channel(count);
        let pool = WorkerPool::spawn(self.pool_size, queue.clone(), flow, done, self.cancel.child_token());
        info!("🚀 已入队 {} 个任务, worker 数量: {}", count, pool.size());

        let finished = tokio::select! {
            result = barrier.wait() => Some(result),
            _ = self.cancel.cancelled() => None,
        };

        pool.shutdown().await;

        match finished {
            Some(result) => result?,
            None => {
                warn!("⚠️ 批次已取消，等待进行中的任务结束");
                barrier.drain().await;
                for job in queue.drain().await {
                    barrier.record(JobCompletion::cancelled(job));
                }
                if barrier.received() != barrier.expected() {
                    warn!(
                        "完成信号数量不一致: {}/{}",
                        barrier.received(),
                        barrier.expected()
                    );
                }
            }
        }

        let completions = barrier.into_completions();
        Ok(BatchSummary::from_completions(&completions, started.elapsed()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancelled_batch_is_not_success() {
        let cancelled = BatchSummary {
            total: 3,
            rendered: 2,
            cancelled: 1,
            ..Default::default()
        };
        assert!(!cancelled.is_success());

        let rendered = BatchSummary {
            total: 3,
            rendered: 3,
            ..Default::default()
        };
        assert!(rendered.is_success());
        assert!(BatchSummary::default().is_success());
    }
}
