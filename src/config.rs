use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::{AppError, ConfigError};
use crate::models::{OutputLayout, ParameterSpace};
use crate::workflow::CompletionMode;

/// 程序配置
///
/// 显式传给枚举器、调度器和渲染器，不存在全局配置
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 源图片目录
    pub input_dir: PathBuf,
    /// 输出目录
    pub output_dir: PathBuf,
    /// 图形数量列表
    pub shape_counts: Vec<u32>,
    /// 透明度列表
    pub alphas: Vec<u32>,
    /// 放大倍数列表
    pub scales: Vec<u32>,
    /// 模式列表
    pub modes: Vec<u32>,
    /// 额外命名选项
    pub options: BTreeMap<String, Vec<String>>,
    /// 同时运行的 worker 数量
    pub pool_size: usize,
    /// 输出目录布局
    pub layout: OutputLayout,
    /// 完成信号是否携带渲染结果
    pub completion_mode: CompletionMode,
    /// 单个任务超时（秒），不设置则不限时
    pub job_timeout_secs: Option<u64>,
    /// 外部渲染程序
    pub renderer_program: String,
    /// 渲染器内部缩放尺寸（`-r`），输出尺寸 = 该值 × 倍数
    pub input_size: u32,
    /// 支持的图片扩展名（不区分大小写）
    pub extensions: Vec<String>,
    /// 任务日志文件，不设置则写入 tracing
    pub job_log_file: Option<String>,
    /// JSON 统计文件
    pub summary_file: Option<String>,
    /// 是否显示详细日志
    pub verbose_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("input"),
            output_dir: PathBuf::from("output"),
            shape_counts: vec![500],
            alphas: vec![128],
            scales: vec![4],
            modes: vec![0, 1, 3, 5],
            options: BTreeMap::new(),
            pool_size: 4,
            layout: OutputLayout::Flat,
            completion_mode: CompletionMode::Checked,
            job_timeout_secs: None,
            renderer_program: "primitive".to_string(),
            input_size: 256,
            extensions: vec!["jpg".to_string(), "jpeg".to_string(), "png".to_string()],
            job_log_file: Some("render_jobs.log".to_string()),
            summary_file: None,
            verbose_logging: false,
        }
    }
}

impl Config {
    /// 从环境变量读取，缺失或解析失败时使用默认值
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            input_dir: env_var("INPUT_DIR").map(PathBuf::from).unwrap_or(default.input_dir),
            output_dir: env_var("OUTPUT_DIR").map(PathBuf::from).unwrap_or(default.output_dir),
            shape_counts: env_var("SHAPE_COUNTS").and_then(|v| parse_list(&v)).unwrap_or(default.shape_counts),
            alphas: env_var("ALPHAS").and_then(|v| parse_list(&v)).unwrap_or(default.alphas),
            scales: env_var("SCALES").and_then(|v| parse_list(&v)).unwrap_or(default.scales),
            modes: env_var("MODES").and_then(|v| parse_list(&v)).unwrap_or(default.modes),
            options: default.options,
            pool_size: env_var("POOL_SIZE").and_then(|v| v.parse().ok()).unwrap_or(default.pool_size),
            layout: env_var("OUTPUT_LAYOUT").and_then(|v| OutputLayout::parse(&v)).unwrap_or(default.layout),
            completion_mode: env_var("COMPLETION_MODE")
                .and_then(|v| CompletionMode::parse(&v))
                .unwrap_or(default.completion_mode),
            job_timeout_secs: env_var("JOB_TIMEOUT_SECS").and_then(|v| v.parse().ok()).or(default.job_timeout_secs),
            renderer_program: env_var("RENDERER_PROGRAM").unwrap_or(default.renderer_program),
            input_size: env_var("INPUT_SIZE").and_then(|v| v.parse().ok()).unwrap_or(default.input_size),
            extensions: env_var("EXTENSIONS").and_then(|v| parse_list(&v)).unwrap_or(default.extensions),
            job_log_file: env_var("JOB_LOG_FILE").or(default.job_log_file),
            summary_file: env_var("SUMMARY_FILE").or(default.summary_file),
            verbose_logging: env_var("VERBOSE_LOGGING").and_then(|v| v.parse().ok()).unwrap_or(default.verbose_logging),
        }
    }

    /// 从 TOML 文件读取，未出现的字段使用默认值
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFailed {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::ParseFailed {
            path: path.to_path_buf(),
            source,
        })
    }

    /// 参数空间
    pub fn parameter_space(&self) -> ParameterSpace {
        ParameterSpace {
            shape_counts: self.shape_counts.clone(),
            alphas: self.alphas.clone(),
            scales: self.scales.clone(),
            modes: self.modes.clone(),
            options: self.options.clone(),
        }
    }

    pub fn job_timeout(&self) -> Option<Duration> {
        self.job_timeout_secs.map(Duration::from_secs)
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.pool_size == 0 {
            return Err(ConfigError::ZeroPoolSize.into());
        }
        self.parameter_space().validate()?;
        Ok(())
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// 解析逗号分隔的列表，任意一项失败则整体失败
fn parse_list<T: std::str::FromStr>(value: &str) -> Option<Vec<T>> {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(|item| item.parse().ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_list() {
        assert_eq!(parse_list::<u32>("50, 100,200"), Some(vec![50, 100, 200]));
        assert_eq!(parse_list::<u32>("50,x"), None);
        assert_eq!(parse_list::<String>("jpg,png"), Some(vec!["jpg".to_string(), "png".to_string()]));
    }

    #[test]
    fn test_toml_overrides_defaults() {
        let config: Config = toml::from_str(
            r#"
            input_dir = "photos"
            shape_counts = [50, 100]
            pool_size = 2
            layout = "per_image"
            completion_mode = "fire_and_forget"

            [options]
            rep = ["0", "2"]
            "#,
        )
        .unwrap();

        assert_eq!(config.input_dir, PathBuf::from("photos"));
        assert_eq!(config.shape_counts, vec![50, 100]);
        assert_eq!(config.pool_size, 2);
        assert_eq!(config.layout, OutputLayout::PerImage);
        assert_eq!(config.completion_mode, CompletionMode::FireAndForget);
        assert_eq!(config.options["rep"], vec!["0", "2"]);
        assert_eq!(config.alphas, vec![128]);
    }

    #[test]
    fn test_validate_rejects_zero_pool() {
        let config = Config {
            pool_size: 0,
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(AppError::Config(ConfigError::ZeroPoolSize))));
        assert!(Config::default().validate().is_ok());
    }
}
