//! # levels 子命令 CLI 定义
//!
//! 电荷转变能级汇总参数。
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/levels.rs`

use clap::Args;
use std::path::PathBuf;

/// levels 子命令参数
#[derive(Args, Debug)]
pub struct LevelsArgs {
    /// Input: defect phase diagram JSON file
    pub input: PathBuf,

    /// Export the transition levels to a CSV file
    #[arg(long)]
    pub output_csv: Option<PathBuf>,
}
