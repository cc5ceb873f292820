//! # CLI 模块
//!
//! 使用 `clap` 定义命令行参数和子命令。
//!
//! ## 命令结构
//! - `plot`: 绘制缺陷形成能图
//! - `levels`: 电荷转变能级汇总
//!
//! ## 依赖关系
//! - 被 `main.rs` 使用
//! - 子模块: plot, levels

pub mod levels;
pub mod plot;

use clap::{Parser, Subcommand};

/// defectplot - 缺陷形成能图绘制工具箱
#[derive(Parser)]
#[command(name = "defectplot")]
#[command(author = "Changjiang Wu")]
#[command(version)]
#[command(about = "Defect formation energy / transition level diagram plotting toolkit", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// 可用的子命令
#[derive(Subcommand)]
pub enum Commands {
    /// Plot defect formation energies vs Fermi level (PNG/SVG), or export line data (CSV)
    Plot(plot::PlotArgs),

    /// Summarize charge transition levels as a table
    Levels(levels::LevelsArgs),
}
