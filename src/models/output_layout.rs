//! 输出文件命名
//!
//! 输出路径只由（源文件基名，参数组合）决定，并且对这两者是单射：
//! 所有数值维度都以固定顺序编码进文件名，命名选项的名字和值只允许
//! `[A-Za-z0-9_]`，不会与分隔符 `.` `-` 混淆。

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::models::parameter_space::RenderParams;

/// 输出目录布局
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputLayout {
    /// `<out>/<base>.<n>.<a>.<s>.<m>.png`
    #[default]
    Flat,
    /// `<out>/<base>/<n>.<a>.<s>.<m>.png`，参数组合很多时使用
    PerImage,
}

impl OutputLayout {
    /// 解析配置字符串（`flat` / `per_image`）
    pub fn parse(text: &str) -> Option<Self> {
        match text.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "flat" => Some(Self::Flat),
            "per_image" => Some(Self::PerImage),
            _ => None,
        }
    }

    /// 该布局下某个源文件的输出目录
    pub fn image_dir(&self, output_dir: &Path, base_name: &str) -> PathBuf {
        match self {
            Self::Flat => output_dir.to_path_buf(),
            Self::PerImage => output_dir.join(base_name),
        }
    }

    /// 推导输出路径
    pub fn output_path(&self, output_dir: &Path, base_name: &str, params: &RenderParams) -> PathBuf {
        let stem = param_stem(params);
        let file_name = match self {
            Self::Flat => format!("{}.{}.png", base_name, stem),
            Self::PerImage => format!("{}.png", stem),
        };
        self.image_dir(output_dir, base_name).join(file_name)
    }
}

fn param_stem(params: &RenderParams) -> String {
    let mut stem = format!(
        "{}.{}.{}.{}",
        params.shape_count, params.alpha, params.scale, params.mode
    );
    for (name, value) in &params.options {
        stem.push('.');
        stem.push_str(name);
        stem.push('-');
        stem.push_str(value);
    }
    stem
}
