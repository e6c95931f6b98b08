//! Worker 池
//!
//! 固定数量的长期 worker 共享一个任务队列和一个完成信号通道。
//! 每个 worker 循环：取任务 → 渲染 → 发送一个完成信号。
//! 取消令牌只在两个任务之间检查，正在渲染的任务会做完。

use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

use crate::orchestrator::completion::CompletionSender;
use crate::orchestrator::job_queue::JobQueue;
use crate::workflow::{JobCompletion, RenderFlow};

pub struct WorkerPool {
    handles: Vec<JoinHandle<()>>,
    shutdown: CancellationToken,
}

impl WorkerPool {
    /// 启动 `pool_size` 个 worker
    ///
    /// `done` 的所有权交给 worker，全部 worker 退出后通道随之关闭
    pub fn spawn(
        pool_size: usize,
        queue: Arc<JobQueue>,
        flow: Arc<RenderFlow>,
        done: CompletionSender,
        shutdown: CancellationToken,
    ) -> Self {
        let handles = (1..=pool_size)
            .map(|worker_id| {
                let queue = queue.clone();
                let flow = flow.clone();
                let done = done.clone();
                let shutdown = shutdown.clone();
                tokio::spawn(worker_loop(worker_id, queue, flow, done, shutdown))
            })
            .collect();

        Self { handles, shutdown }
    }

    pub fn size(&self) -> usize {
        self.handles.len()
    }

    /// 通知所有 worker 停止并等待它们退出
    pub async fn shutdown(self) {
        self.shutdown.cancel();
        for (idx, handle) in self.handles.into_iter().enumerate() {
            if let Err(e) = handle.await {
                error!("[worker {}] 任务执行失败: {}", idx + 1, e);
            }
        }
    }
}

async fn worker_loop(
    worker_id: usize,
    queue: Arc<JobQueue>,
    flow: Arc<RenderFlow>,
    done: CompletionSender,
    shutdown: CancellationToken,
) {
    debug!("[worker {}] 启动", worker_id);

    loop {
        let job = tokio::select! {
            biased;
            _ = shutdown.cancelled() => break,
            job = queue.pop() => match job {
                Some(job) => job,
                None => break,
            },
        };

        let outcome = flow.run(&job).await;

        if done.send(JobCompletion { job, outcome }).is_err() {
            break;
        }
    }

    debug!("[worker {}] 退出", worker_id);
}
