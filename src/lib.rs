//! # Primitive Batch
//!
//! 把一个目录里的源图片按多组参数批量交给外部渲染程序，生成衍生图片
//!
//! ## 架构设计
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 外部渲染程序的调用边界
//! - `Renderer` - 渲染接口；`PrimitiveRenderer` - 调用 `primitive` 可执行文件
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"
//! - `JobEnumerator` - 源图片 × 参数组合 → 有序任务列表（跳过已存在的输出）
//! - `JobLogger` - 逐行写任务日志，并发写入不交错
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一个任务"的完整处理流程
//! - `RenderFlow` - 渲染 → 判定结果 → 写日志
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/` - 队列、worker 池、完成屏障、批量调度、应用入口
//!
//! ## 模块结构

pub mod config;
pub mod error;
pub mod infrastructure;
pub mod logger;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::Config;
pub use error::{AppError, AppResult, RenderError};
pub use infrastructure::{PrimitiveRenderer, Renderer};
pub use models::{OutputLayout, ParameterSpace, RenderJob, RenderParams};
pub use orchestrator::{App, BatchScheduler, BatchSummary};
pub use services::{JobEnumerator, JobLogger, SerializedLogger};
pub use workflow::{CompletionMode, JobCompletion, JobOutcome};
