//! 任务枚举服务 - 业务能力层
//!
//! 源图片 × 参数组合 → 有序的任务列表。
//! 输出文件已经存在的组合直接跳过，重复运行只会调度缺失的部分。

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use tokio::fs;
use tracing::{debug, info, warn};

use crate::error::{AppError, AppResult};
use crate::models::{OutputLayout, ParameterSpace, RenderJob};

/// 任务枚举器
#[derive(Debug, Clone)]
pub struct JobEnumerator {
    layout: OutputLayout,
    extensions: Vec<String>,
}

impl JobEnumerator {
    pub fn new(layout: OutputLayout, extensions: &[String]) -> Self {
        Self {
            layout,
            extensions: extensions
                .iter()
                .map(|ext| ext.trim_start_matches('.').to_ascii_lowercase())
                .collect(),
        }
    }

    /// 枚举全部待渲染任务
    ///
    /// # 参数
    /// - `input_dir`: 源图片目录
    /// - `output_dir`: 输出目录（不存在时创建）
    /// - `space`: 参数空间
    ///
    /// # 返回
    /// 按（基名，图形数量，模式）排序的任务列表
    pub async fn enumerate(
        &self,
        input_dir: &Path,
        output_dir: &Path,
        space: &ParameterSpace,
    ) -> AppResult<Vec<RenderJob>> {
        let combos = space.combinations()?;
        let inputs = self.list_inputs(input_dir).await?;

        ensure_dir(output_dir).await?;

        let mut jobs = Vec::new();
        let mut skipped = 0usize;

        for (base_name, input_path) in &inputs {
            ensure_dir(&self.layout.image_dir(output_dir, base_name)).await?;

            for params in &combos {
                let output_path = self.layout.output_path(output_dir, base_name, params);
                if output_exists(&output_path).await {
                    debug!("跳过已存在的输出: {}", output_path.display());
                    skipped += 1;
                    continue;
                }
                jobs.push(RenderJob::new(
                    input_path.clone(),
                    output_path,
                    base_name.clone(),
                    params.clone(),
                ));
            }
        }

        // 稳定排序：同键任务保持生成顺序
        jobs.sort_by_key(RenderJob::sort_key);

        info!(
            "📋 {} 张图片 × {} 组参数: 待渲染 {} 个, 已存在 {} 个",
            inputs.len(),
            combos.len(),
            jobs.len(),
            skipped
        );

        Ok(jobs)
    }

    /// 列出支持的源图片，按文件名排序，返回（基名，路径）
    ///
    /// 基名重复时（如 `a.jpg` 和 `a.png`）只保留文件名排在前面的那个
    async fn list_inputs(&self, input_dir: &Path) -> AppResult<BTreeMap<String, PathBuf>> {
        let enumeration_error = |source| AppError::Enumeration {
            path: input_dir.to_path_buf(),
            source,
        };

        let mut entries = fs::read_dir(input_dir).await.map_err(enumeration_error)?;
        let mut files = Vec::new();

        while let Some(entry) = entries.next_entry().await.map_err(enumeration_error)? {
            let file_type = entry.file_type().await.map_err(enumeration_error)?;
            if file_type.is_dir() {
                continue;
            }
            let path = entry.path();
            if self.is_supported(&path) {
                files.push(path);
            }
        }

        // 不信任操作系统的目录顺序
        files.sort();

        let mut inputs: BTreeMap<String, PathBuf> = BTreeMap::new();
        for path in files {
            let Some(base_name) = path.file_stem().map(|s| s.to_string_lossy().into_owned()) else {
                continue;
            };
            // `...jpg` 的基名是 `..`，拼进输出路径会跳出输出目录
            if !is_plain_name(&base_name) {
                warn!("⚠️ {} 的基名 {:?} 不能用作输出名，已忽略", path.display(), base_name);
                continue;
            }
            if let Some(existing) = inputs.get(&base_name) {
                warn!(
                    "⚠️ {} 与 {} 基名相同，输出会冲突，已忽略",
                    path.display(),
                    existing.display()
                );
                continue;
            }
            inputs.insert(base_name, path);
        }

        Ok(inputs)
    }

    fn is_supported(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| self.extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
            .unwrap_or(false)
    }
}

/// 基名必须是单个普通路径分量
fn is_plain_name(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

/// 创建目录；目录已存在不算错误，但同名的普通文件是错误
async fn ensure_dir(path: &Path) -> AppResult<()> {
    match fs::create_dir_all(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::AlreadyExists && is_dir(path).await => Ok(()),
        Err(source) => Err(AppError::OutputDirectoryCreate {
            path: path.to_path_buf(),
            source,
        }),
    }
}

async fn is_dir(path: &Path) -> bool {
    fs::metadata(path).await.map(|m| m.is_dir()).unwrap_or(false)
}

async fn output_exists(path: &Path) -> bool {
    fs::try_exists(path).await.unwrap_or(false)
}
