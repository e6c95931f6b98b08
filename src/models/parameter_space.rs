//! 参数空间
//!
//! 每个参数维度一个取值列表，笛卡尔积得到全部参数组合

use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::ParameterError;
use crate::models::mode::MAX_MODE;

/// 渲染器自身占用的参数名，命名选项不能使用
const RESERVED_OPTIONS: &[&str] = &["i", "o", "n", "a", "s", "m", "r"];

fn token_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z0-9_]+$").expect("token pattern is valid"))
}

/// 一组具体的渲染参数
///
/// 创建后不可变，原样传给渲染器
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct RenderParams {
    /// 图形数量 `n`
    pub shape_count: u32,
    /// 透明度 `a`
    pub alpha: u32,
    /// 输出放大倍数 `s`
    pub scale: u32,
    /// 图形模式 `m`
    pub mode: u32,
    /// 额外命名选项（按名字排序）
    pub options: BTreeMap<String, String>,
}

impl RenderParams {
    pub fn new(shape_count: u32, alpha: u32, scale: u32, mode: u32) -> Self {
        Self {
            shape_count,
            alpha,
            scale,
            mode,
            options: BTreeMap::new(),
        }
    }

    pub fn with_option(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.insert(name.into(), value.into());
        self
    }
}

/// 参数空间：各维度取值列表的笛卡尔积
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterSpace {
    pub shape_counts: Vec<u32>,
    pub alphas: Vec<u32>,
    pub scales: Vec<u32>,
    pub modes: Vec<u32>,
    #[serde(default)]
    pub options: BTreeMap<String, Vec<String>>,
}

impl ParameterSpace {
    pub fn new(shape_counts: Vec<u32>, alphas: Vec<u32>, scales: Vec<u32>, modes: Vec<u32>) -> Self {
        Self {
            shape_counts,
            alphas,
            scales,
            modes,
            options: BTreeMap::new(),
        }
    }

    pub fn with_option(mut self, name: impl Into<String>, values: Vec<String>) -> Self {
        self.options.insert(name.into(), values);
        self
    }

    /// 校验所有维度
    pub fn validate(&self) -> Result<(), ParameterError> {
        check_dimension("shape_count", &self.shape_counts, 1, u32::MAX, "[1, ∞)")?;
        check_dimension("alpha", &self.alphas, 0, 255, "[0, 255]")?;
        check_dimension("scale", &self.scales, 1, u32::MAX, "[1, ∞)")?;
        check_dimension("mode", &self.modes, 0, MAX_MODE, "[0, 8]")?;

        for (name, values) in &self.options {
            check_token(name)?;
            if RESERVED_OPTIONS.contains(&name.as_str()) {
                return Err(ParameterError::ReservedOption { name: name.clone() });
            }
            if values.is_empty() {
                return Err(ParameterError::EmptyDimension {
                    dimension: name.clone(),
                });
            }
            for value in values {
                check_token(value)?;
            }
        }

        Ok(())
    }

    /// 生成全部参数组合
    ///
    /// 顺序固定：图形数量、透明度、倍数、模式，然后按选项名依次展开。
    /// 同一列表内的重复值只保留第一次出现。
    pub fn combinations(&self) -> Result<Vec<RenderParams>, ParameterError> {
        self.validate()?;

        let mut base = Vec::new();
        for &n in &dedup(&self.shape_counts) {
            for &a in &dedup(&self.alphas) {
                for &s in &dedup(&self.scales) {
                    for &m in &dedup(&self.modes) {
                        base.push(RenderParams::new(n, a, s, m));
                    }
                }
            }
        }

        let combos = self.options.iter().fold(base, |acc, (name, values)| {
            let values = dedup(values);
            acc.into_iter()
                .flat_map(|params| {
                    values
                        .iter()
                        .map(move |value| params.clone().with_option(name.clone(), value.clone()))
                        .collect::<Vec<_>>()
                })
                .collect()
        });

        Ok(combos)
    }
}

fn check_dimension(
    dimension: &'static str,
    values: &[u32],
    min: u32,
    max: u32,
    range: &'static str,
) -> Result<(), ParameterError> {
    if values.is_empty() {
        return Err(ParameterError::EmptyDimension {
            dimension: dimension.to_string(),
        });
    }
    match values.iter().find(|&&v| v < min || v > max) {
        Some(&value) => Err(ParameterError::OutOfRange {
            dimension,
            value,
            range,
        }),
        None => Ok(()),
    }
}

fn check_token(text: &str) -> Result<(), ParameterError> {
    if token_pattern().is_match(text) {
        Ok(())
    } else {
        Err(ParameterError::InvalidToken {
            text: text.to_string(),
        })
    }
}

fn dedup<T: PartialEq + Clone>(values: &[T]) -> Vec<T> {
    let mut unique = Vec::with_capacity(values.len());
    for value in values {
        if !unique.contains(value) {
            unique.push(value.clone());
        }
    }
    unique
}
