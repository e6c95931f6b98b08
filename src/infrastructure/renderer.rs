//! 渲染器 - 基础设施层
//!
//! 外部渲染程序被当作黑盒：给定输入、输出和参数，只按退出状态和
//! 输出文件是否存在来判断成败。

use std::ffi::OsString;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use crate::error::RenderError;
use crate::models::RenderJob;

/// 渲染能力
///
/// 调度器只依赖这个接口，测试中可以用假实现替换
#[async_trait]
pub trait Renderer: Send + Sync {
    /// 渲染一个任务，成功时输出文件应已写入 `job.output_path`
    async fn render(&self, job: &RenderJob) -> Result<(), RenderError>;
}

/// 调用外部 `primitive` 程序的渲染器
///
/// 参数以独立的 argv 传入，不经过 shell
#[derive(Debug, Clone)]
pub struct PrimitiveRenderer {
    program: String,
    input_size: u32,
}

impl PrimitiveRenderer {
    pub fn new(program: impl Into<String>, input_size: u32) -> Self {
        Self {
            program: program.into(),
            input_size,
        }
    }

    /// 构造完整的参数列表
    pub fn command_args(&self, job: &RenderJob) -> Vec<OsString> {
        let params = &job.params;
        let output_size = self.input_size.saturating_mul(params.scale);

        let mut args: Vec<OsString> = vec![
            "-i".into(),
            job.input_path.clone().into_os_string(),
            "-o".into(),
            job.output_path.clone().into_os_string(),
            "-n".into(),
            params.shape_count.to_string().into(),
            "-a".into(),
            params.alpha.to_string().into(),
            "-m".into(),
            params.mode.to_string().into(),
            "-r".into(),
            self.input_size.to_string().into(),
            "-s".into(),
            output_size.to_string().into(),
        ];
        for (name, value) in &params.options {
            args.push(format!("-{}", name).into());
            args.push(value.into());
        }
        args
    }
}

#[async_trait]
impl Renderer for PrimitiveRenderer {
    async fn render(&self, job: &RenderJob) -> Result<(), RenderError> {
        let args = self.command_args(job);
        debug!("执行: {} {:?}", self.program, args);

        // 超时或取消时 future 被丢弃，子进程随之被杀掉
        let status = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .status()
            .await
            .map_err(|source| RenderError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if !status.success() {
            return Err(RenderError::ExitStatus {
                status: status.to_string(),
            });
        }

        match tokio::fs::try_exists(&job.output_path).await {
            Ok(true) => Ok(()),
            _ => Err(RenderError::MissingOutput {
                path: job.output_path.clone(),
            }),
        }
    }
}
