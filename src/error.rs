use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// 应用程序错误类型
///
/// 只包含会中止整个批次的错误；单个任务的渲染失败见 [`RenderError`]
#[derive(Debug, Error)]
pub enum AppError {
    /// 读取输入目录失败（致命，批次尚未开始调度）
    #[error("无法读取输入目录 {path}: {source}")]
    Enumeration {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// 创建输出目录失败（"已存在"不算错误）
    #[error("无法创建输出目录 {path}: {source}")]
    OutputDirectoryCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// 参数空间不合法
    #[error("参数错误: {0}")]
    InvalidParameter(#[from] ParameterError),

    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),

    /// 任务队列已关闭，无法继续入队
    #[error("任务队列已关闭")]
    QueueClosed,

    /// 所有 worker 都已退出，但完成信号数量不足
    #[error("完成信号通道提前关闭: 已收到 {received}/{expected}")]
    BarrierBroken { received: usize, expected: usize },
}

/// 参数空间校验错误
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParameterError {
    /// 某个维度的取值列表为空
    #[error("参数维度 `{dimension}` 的取值列表为空")]
    EmptyDimension { dimension: String },

    /// 取值超出允许范围
    #[error("参数维度 `{dimension}` 的取值 {value} 超出范围 {range}")]
    OutOfRange {
        dimension: &'static str,
        value: u32,
        range: &'static str,
    },

    /// 选项名或选项值包含非法字符
    #[error("选项 `{text}` 只能包含字母、数字和下划线")]
    InvalidToken { text: String },

    /// 选项名与渲染器保留参数冲突
    #[error("选项名 `{name}` 与渲染器保留参数冲突")]
    ReservedOption { name: String },
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 读取配置文件失败
    #[error("无法读取配置文件 {path}: {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// 解析配置文件失败
    #[error("无法解析配置文件 {path}: {source}")]
    ParseFailed {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// worker 数量必须为正
    #[error("worker 数量必须大于 0")]
    ZeroPoolSize,
}

/// 单个渲染任务的失败原因
///
/// 只记录在该任务的完成信号里，不会中止批次中的其他任务
#[derive(Debug, Error)]
pub enum RenderError {
    /// 无法启动外部渲染程序
    #[error("无法启动渲染程序 `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// 渲染程序非正常退出
    #[error("渲染程序退出状态异常: {status}")]
    ExitStatus { status: String },

    /// 渲染程序退出成功，但没有生成输出文件
    #[error("渲染程序未生成输出文件: {path}")]
    MissingOutput { path: PathBuf },

    /// 超时
    #[error("渲染超时 ({after:?})")]
    TimedOut { after: Duration },

    /// 渲染过程发生 panic
    #[error("渲染过程 panic: {0}")]
    Panicked(String),
}

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
