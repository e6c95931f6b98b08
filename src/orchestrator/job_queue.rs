//! 任务队列
//!
//! 无界 FIFO，多个 worker 共享同一个接收端。本层不去重，
//! 重复检查在枚举阶段完成。

use tokio::sync::{mpsc, Mutex};

use crate::error::{AppError, AppResult};
use crate::models::RenderJob;

pub struct JobQueue {
    sender: mpsc::UnboundedSender<RenderJob>,
    receiver: Mutex<mpsc::UnboundedReceiver<RenderJob>>,
}

impl JobQueue {
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        Self {
            sender,
            receiver: Mutex::new(receiver),
        }
    }

    pub fn push(&self, job: RenderJob) -> AppResult<()> {
        self.sender.send(job).map_err(|_| AppError::QueueClosed)
    }

    /// 取出下一个任务，队列为空时阻塞
    ///
    /// 可以安全地在 `select!` 中取消：任务不会丢失
    pub async fn pop(&self) -> Option<RenderJob> {
        self.receiver.lock().await.recv().await
    }

    /// 取走所有尚未被 worker 领取的任务
    pub async fn drain(&self) -> Vec<RenderJob> {
        let mut receiver = self.receiver.lock().await;
        let mut remaining = Vec::new();
        while let Ok(job) = receiver.try_recv() {
            remaining.push(job);
        }
        remaining
    }
}

impl Default for JobQueue {
    fn default() -> Self {
        Self::new()
    }
}
