//! 任务日志服务 - 业务能力层
//!
//! 只负责"写一行任务日志"能力。多个 worker 并发写入时，
//! 每一行都是完整的，不会与其他行交错。

use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::Path;
use std::sync::Mutex;

use tracing::info;

/// 注入给 worker 的日志接口
pub trait JobLogger: Send + Sync {
    fn log(&self, line: &str);
}

/// 互斥写入的日志
///
/// 持锁期间写入整行并 flush，锁释放后才允许下一行
pub struct SerializedLogger<W: Write + Send> {
    sink: Mutex<W>,
}

impl<W: Write + Send> SerializedLogger<W> {
    pub fn new(sink: W) -> Self {
        Self {
            sink: Mutex::new(sink),
        }
    }

    /// 取回底层 writer
    pub fn into_inner(self) -> W {
        self.sink.into_inner().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl SerializedLogger<std::fs::File> {
    /// 以追加模式打开日志文件
    pub fn append_to(path: impl AsRef<Path>) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self::new(file))
    }
}

impl<W: Write + Send> JobLogger for SerializedLogger<W> {
    fn log(&self, line: &str) {
        // 某个 worker panic 后锁会被污染，日志仍然可以继续写
        let mut sink = self.sink.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let result = writeln!(sink, "{}", line).and_then(|_| sink.flush());
        if let Err(e) = result {
            tracing::warn!("写入任务日志失败: {}", e);
        }
    }
}

/// 直接转发到 tracing
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingJobLogger;

impl JobLogger for TracingJobLogger {
    fn log(&self, line: &str) {
        info!("{}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_concurrent_lines_are_not_interleaved() {
        let logger = Arc::new(SerializedLogger::new(Vec::<u8>::new()));

        let handles: Vec<_> = (0..8)
            .map(|worker| {
                let logger = logger.clone();
                thread::spawn(move || {
                    for job in 0..50 {
                        logger.log(&format!("worker-{} job-{} {}", worker, job, "x".repeat(64)));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let logger = Arc::try_unwrap(logger).ok().unwrap();
        let output = String::from_utf8(logger.into_inner()).unwrap();
        let lines: Vec<_> = output.lines().collect();

        assert_eq!(lines.len(), 400);
        for line in lines {
            assert!(line.starts_with("worker-"));
            assert!(line.ends_with(&"x".repeat(64)));
            assert_eq!(line.matches("worker-").count(), 1);
        }
    }
}
