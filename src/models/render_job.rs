use std::fmt::Display;
use std::path::PathBuf;

use serde::Serialize;

use crate::models::mode::mode_name;
use crate::models::parameter_space::RenderParams;

/// 入队排序键：（基名，图形数量，模式）
///
/// 只用于保证多次运行的入队顺序一致，worker 取出后不再关心它
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SortKey {
    pub base_name: String,
    pub shape_count: u32,
    pub mode: u32,
}

/// 一个渲染任务：一张源图 × 一组参数 → 一个输出文件
///
/// 由枚举器创建，之后不可变；只经过队列一次，只被一个 worker 处理
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderJob {
    /// 源图片路径
    pub input_path: PathBuf,
    /// 输出路径（由基名和参数唯一决定）
    pub output_path: PathBuf,
    /// 源文件基名（不含扩展名）
    pub base_name: String,
    /// 渲染参数
    pub params: RenderParams,
}

impl RenderJob {
    pub fn new(input_path: PathBuf, output_path: PathBuf, base_name: String, params: RenderParams) -> Self {
        Self {
            input_path,
            output_path,
            base_name,
            params,
        }
    }

    pub fn sort_key(&self) -> SortKey {
        SortKey {
            base_name: self.base_name.clone(),
            shape_count: self.params.shape_count,
            mode: self.params.mode,
        }
    }
}

impl Display for RenderJob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} -> {} (n={} a={} s={} m={}/{}",
            self.input_path.display(),
            self.output_path.display(),
            self.params.shape_count,
            self.params.alpha,
            self.params.scale,
            self.params.mode,
            mode_name(self.params.mode)
        )?;
        for (name, value) in &self.params.options {
            write!(f, " {}={}", name, value)?;
        }
        write!(f, ")")
    }
}
