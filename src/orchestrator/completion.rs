//! 完成屏障
//!
//! 驱动方入队 `expected` 个任务后，恰好接收 `expected` 个完成信号才返回。

use tokio::sync::mpsc;

use crate::error::{AppError, AppResult};
use crate::workflow::JobCompletion;

pub type CompletionSender = mpsc::UnboundedSender<JobCompletion>;

pub struct CompletionBarrier {
    expected: usize,
    receiver: mpsc::UnboundedReceiver<JobCompletion>,
    completions: Vec<JobCompletion>,
}

impl CompletionBarrier {
    /// 创建屏障和发送端；发送端交给 worker 池，驱动方不持有
    pub fn channel(expected: usize) -> (CompletionSender, Self) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let barrier = Self {
            expected,
            receiver,
            completions: Vec::with_capacity(expected),
        };
        (sender, barrier)
    }

    pub fn expected(&self) -> usize {
        self.expected
    }

    pub fn received(&self) -> usize {
        self.completions.len()
    }

    /// 阻塞直到收齐全部完成信号
    ///
    /// 可以安全地在 `select!` 中取消，已收到的信号保留在屏障里
    pub async fn wait(&mut self) -> AppResult<()> {
        while self.completions.len() < self.expected {
            match self.receiver.recv().await {
                Some(completion) => self.completions.push(completion),
                None => {
                    return Err(AppError::BarrierBroken {
                        received: self.completions.len(),
                        expected: self.expected,
                    })
                }
            }
        }
        Ok(())
    }

    /// 接收剩余信号直到所有发送端关闭（worker 全部退出之后调用）
    pub async fn drain(&mut self) {
        while let Some(completion) = self.receiver.recv().await {
            self.completions.push(completion);
        }
    }

    /// 记录一个不经过 worker 的完成信号（取消时未开始的任务）
    pub fn record(&mut self, completion: JobCompletion) {
        self.completions.push(completion);
    }

    pub fn into_completions(self) -> Vec<JobCompletion> {
        self.completions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{RenderJob, RenderParams};
    use std::path::PathBuf;
    use std::time::Duration;

    fn completion(n: u32) -> JobCompletion {
        JobCompletion::cancelled(RenderJob::new(
            PathBuf::from("a.jpg"),
            PathBuf::from(format!("a.{}.png", n)),
            "a".to_string(),
            RenderParams::new(n, 128, 4, 1),
        ))
    }

    #[tokio::test]
    async fn test_wait_returns_after_exact_count() {
        let (sender, mut barrier) = CompletionBarrier::channel(3);

        let producer = tokio::spawn(async move {
            for n in 1..=3 {
                tokio::time::sleep(Duration::from_millis(5)).await;
                sender.send(completion(n)).unwrap();
            }
            // 多发的信号不属于本批次
            let _ = sender.send(completion(99));
        });

        barrier.wait().await.unwrap();
        assert_eq!(barrier.received(), 3);
        producer.await.unwrap();
        assert_eq!(barrier.into_completions().len(), 3);
    }

    #[tokio::test]
    async fn test_zero_jobs_do_not_block() {
        let (_sender, mut barrier) = CompletionBarrier::channel(0);
        tokio_test::assert_ok!(barrier.wait().await);
    }

    #[tokio::test]
    async fn test_closed_channel_breaks_barrier() {
        let (sender, mut barrier) = CompletionBarrier::channel(2);
        sender.send(completion(1)).unwrap();
        drop(sender);

        let err = tokio_test::assert_err!(barrier.wait().await);
        assert!(matches!(err, AppError::BarrierBroken { received: 1, expected: 2 }));
    }
}
