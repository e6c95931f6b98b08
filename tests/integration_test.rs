use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use primitive_batch::error::RenderError;
use primitive_batch::services::TracingJobLogger;
use primitive_batch::{
    logger, App, BatchScheduler, CompletionMode, Config, JobEnumerator, OutputLayout, ParameterSpace, RenderJob,
    Renderer, SerializedLogger,
};
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

/// 直接写出输出文件的假渲染器
#[derive(Default)]
struct FakeRenderer {
    calls: AtomicUsize,
    delay: Duration,
}

impl FakeRenderer {
    fn with_delay(delay: Duration) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            delay,
        }
    }
}

#[async_trait]
impl Renderer for FakeRenderer {
    async fn render(&self, job: &RenderJob) -> Result<(), RenderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        tokio::fs::write(&job.output_path, b"png").await.map_err(|source| RenderError::Spawn {
            program: "fake".to_string(),
            source,
        })
    }
}

/// 图形数量为 100 的任务退出成功但不写文件
struct FlakyRenderer;

#[async_trait]
impl Renderer for FlakyRenderer {
    async fn render(&self, job: &RenderJob) -> Result<(), RenderError> {
        if job.params.shape_count == 100 {
            return Err(RenderError::MissingOutput {
                path: job.output_path.clone(),
            });
        }
        tokio::fs::write(&job.output_path, b"png").await.map_err(|source| RenderError::Spawn {
            program: "flaky".to_string(),
            source,
        })
    }
}

/// 永远不返回的渲染器
struct HangingRenderer;

#[async_trait]
impl Renderer for HangingRenderer {
    async fn render(&self, _job: &RenderJob) -> Result<(), RenderError> {
        std::future::pending::<()>().await;
        Ok(())
    }
}

fn scenario_input() -> TempDir {
    let input = TempDir::new().unwrap();
    std::fs::write(input.path().join("a.jpg"), b"").unwrap();
    std::fs::write(input.path().join("b.jpg"), b"").unwrap();
    input
}

fn scenario_space() -> ParameterSpace {
    ParameterSpace::new(vec![50, 100], vec![128], vec![4], vec![1])
}

fn enumerator() -> JobEnumerator {
    JobEnumerator::new(OutputLayout::Flat, &["jpg".to_string()])
}

async fn enumerate(input: &Path, output: &Path) -> Vec<RenderJob> {
    enumerator().enumerate(input, output, &scenario_space()).await.unwrap()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_scenario_renders_all_then_rerun_is_empty() {
    logger::init();
    let input = scenario_input();
    let output = TempDir::new().unwrap();

    let jobs = enumerate(input.path(), output.path()).await;
    assert_eq!(jobs.len(), 4);

    let renderer = Arc::new(FakeRenderer::default());
    let scheduler = BatchScheduler::new(renderer.clone(), Arc::new(TracingJobLogger), 2);
    let summary = scheduler.run(jobs).await.unwrap();

    assert_eq!(summary.total, 4);
    assert_eq!(summary.rendered, 4);
    assert!(summary.is_success());
    assert_eq!(renderer.calls.load(Ordering::SeqCst), 4);
    for name in ["a.50.128.4.1.png", "a.100.128.4.1.png", "b.50.128.4.1.png", "b.100.128.4.1.png"] {
        assert!(output.path().join(name).is_file(), "missing {}", name);
    }

    // 幂等：第二次枚举没有任何任务
    assert!(enumerate(input.path(), output.path()).await.is_empty());
}

#[tokio::test]
async fn test_failed_job_is_reported_and_retried_next_run() {
    let input = scenario_input();
    let output = TempDir::new().unwrap();

    let jobs = enumerate(input.path(), output.path()).await;
    let scheduler = BatchScheduler::new(Arc::new(FlakyRenderer), Arc::new(TracingJobLogger), 2);
    let summary = scheduler.run(jobs).await.unwrap();

    assert_eq!(summary.total, 4);
    assert_eq!(summary.rendered, 2);
    assert_eq!(summary.failed, 2);
    assert!(summary
        .failures
        .iter()
        .all(|failure| failure.output_path.to_string_lossy().contains(".100.")));

    // 下一次运行只调度失败的部分
    let remaining = enumerate(input.path(), output.path()).await;
    assert_eq!(remaining.len(), 2);
    assert!(remaining.iter().all(|job| job.params.shape_count == 100));
}

#[tokio::test]
async fn test_fire_and_forget_completes_despite_failures() {
    let input = scenario_input();
    let output = TempDir::new().unwrap();

    let jobs = enumerate(input.path(), output.path()).await;
    let scheduler = BatchScheduler::new(Arc::new(FlakyRenderer), Arc::new(TracingJobLogger), 3)
        .with_completion_mode(CompletionMode::FireAndForget);
    let summary = scheduler.run(jobs).await.unwrap();

    assert_eq!(summary.total, 4);
    assert_eq!(summary.unchecked, 4);
    assert_eq!(summary.failed, 0);
}

#[tokio::test]
async fn test_timeout_turns_hang_into_failure() {
    let input = scenario_input();
    let output = TempDir::new().unwrap();

    let jobs = enumerate(input.path(), output.path()).await;
    let scheduler = BatchScheduler::new(Arc::new(HangingRenderer), Arc::new(TracingJobLogger), 2)
        .with_job_timeout(Some(Duration::from_millis(50)));
    let summary = scheduler.run(jobs).await.unwrap();

    assert_eq!(summary.total, 4);
    assert_eq!(summary.failed, 4);
    assert!(summary.failures.iter().all(|failure| failure.reason.contains("超时")));
}

#[tokio::test]
async fn test_cancellation_drains_queue() {
    let input = scenario_input();
    let output = TempDir::new().unwrap();
    let space = ParameterSpace::new(vec![10, 20, 30, 40, 50], vec![128], vec![4], vec![1]);
    let jobs = enumerator().enumerate(input.path(), output.path(), &space).await.unwrap();
    assert_eq!(jobs.len(), 10);

    let cancel = CancellationToken::new();
    let renderer = Arc::new(FakeRenderer::with_delay(Duration::from_millis(200)));
    let scheduler =
        BatchScheduler::new(renderer.clone(), Arc::new(TracingJobLogger), 1).with_cancellation(cancel.clone());

    let trigger = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        cancel.cancel();
    });

    let summary = scheduler.run(jobs).await.unwrap();
    trigger.await.unwrap();

    assert_eq!(summary.total, 10);
    assert_eq!(summary.rendered + summary.cancelled, 10);
    assert!(summary.cancelled >= 1);
    assert_eq!(renderer.calls.load(Ordering::SeqCst), summary.rendered);
    assert!(!summary.is_success());
}

#[tokio::test]
async fn test_empty_batch_returns_immediately() {
    let scheduler = BatchScheduler::new(Arc::new(FakeRenderer::default()), Arc::new(TracingJobLogger), 4);
    let summary = scheduler.run(Vec::new()).await.unwrap();
    assert_eq!(summary.total, 0);
}

#[tokio::test]
async fn test_app_runs_from_config() {
    let input = scenario_input();
    let output = TempDir::new().unwrap();
    let log_file = output.path().join("jobs.log");
    let summary_file = output.path().join("summary.json");

    let config = Config {
        input_dir: input.path().to_path_buf(),
        output_dir: output.path().join("renders"),
        shape_counts: vec![50, 100],
        alphas: vec![128],
        scales: vec![4],
        modes: vec![1],
        pool_size: 2,
        layout: OutputLayout::PerImage,
        job_log_file: Some(log_file.to_string_lossy().into_owned()),
        summary_file: Some(summary_file.to_string_lossy().into_owned()),
        ..Config::default()
    };

    let app = App::with_renderer(config, Arc::new(FakeRenderer::default())).unwrap();
    let summary = app.run().await.unwrap();

    assert_eq!(summary.rendered, 4);
    assert!(output.path().join("renders").join("a").join("100.128.4.1.png").is_file());

    let log = std::fs::read_to_string(&log_file).unwrap();
    assert_eq!(log.lines().filter(|line| line.starts_with('✓')).count(), 4);

    let json: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&summary_file).unwrap()).unwrap();
    assert_eq!(json["total"], 4);
    assert_eq!(json["failed"], 0);

    // 第二次运行没有任务，统计文件也被覆盖
    let summary = app.run().await.unwrap();
    assert_eq!(summary.total, 0);
    let json: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&summary_file).unwrap()).unwrap();
    assert_eq!(json["total"], 0);
    assert_eq!(json["rendered"], 0);
}

#[test]
fn test_serialized_logger_writes_whole_lines() {
    use primitive_batch::JobLogger;

    let logger = SerializedLogger::new(Vec::<u8>::new());
    logger.log("first");
    logger.log("second");
    assert_eq!(String::from_utf8(logger.into_inner()).unwrap(), "first\nsecond\n");
}
