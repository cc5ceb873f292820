//! # 解析器模块
//!
//! 加载并校验 JSON 输入文档（缺陷相图、化学势）。
//!
//! ## 依赖关系
//! - 被 `commands/` 模块使用
//! - 使用 `models/` 数据模型
//! - 子模块: diagram, chempots

pub mod chempots;
pub mod diagram;

use crate::error::{DefectPlotError, Result};
use std::fs;
use std::path::Path;

/// 读取文本文件，统一错误包装
fn read_to_string(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| DefectPlotError::FileReadError {
        path: path.display().to_string(),
        source: e,
    })
}
