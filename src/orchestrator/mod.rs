//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责批量调度，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `batch_processor` - 应用入口
//! - 配置 → 枚举 → 调度 → 统计
//!
//! ### `scheduler` - 批量调度器
//! - 入队、启动 worker 池、等待完成屏障、处理取消
//!
//! ### `job_queue` / `worker_pool` / `completion`
//! - 共享 FIFO 队列、固定数量的 worker、计数屏障
//!
//! ## 层次关系
//!
//! ```text
//! batch_processor (配置 → Vec<RenderJob>)
//!     ↓
//! scheduler (Vec<RenderJob> → BatchSummary)
//!     ↓
//! worker_pool (队列 → 完成信号)
//!     ↓
//! workflow::RenderFlow (处理单个 RenderJob)
//!     ↓
//! infrastructure (外部渲染程序)
//! ```

pub mod batch_processor;
pub mod completion;
pub mod job_queue;
pub mod scheduler;
pub mod worker_pool;

// 重新导出主要类型
pub use batch_processor::App;
pub use completion::CompletionBarrier;
pub use job_queue::JobQueue;
pub use scheduler::{BatchScheduler, BatchSummary, FailedJob};
pub use worker_pool::WorkerPool;
