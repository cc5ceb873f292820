//! # plot 子命令 CLI 定义
//!
//! 缺陷形成能图绘制参数。
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/plot.rs`

use crate::error::{DefectPlotError, Result};

use clap::{Args, ValueEnum};
use std::path::PathBuf;

// ─────────────────────────────────────────────────────────────
// 枚举参数
// ─────────────────────────────────────────────────────────────

/// 条目显示模式
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq, Default)]
pub enum DisplayMode {
    /// Only the lowest-energy (stable) charge state at each Fermi level
    #[default]
    Stable,
    /// Every (defect, charge state) entry as its own line
    All,
    /// Stable states in bold, all entries as faded grey lines
    Faded,
}

impl std::fmt::Display for DisplayMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DisplayMode::Stable => write!(f, "stable"),
            DisplayMode::All => write!(f, "all"),
            DisplayMode::Faded => write!(f, "faded"),
        }
    }
}

/// 形成能线调色板
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq, Default)]
pub enum Colormap {
    /// 8 colours (qualitative, publication default)
    #[default]
    Dark2,
    /// 10 colours
    Tab10,
    /// 20 colours
    Tab20,
}

impl std::fmt::Display for Colormap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Colormap::Dark2 => write!(f, "dark2"),
            Colormap::Tab10 => write!(f, "tab10"),
            Colormap::Tab20 => write!(f, "tab20"),
        }
    }
}

/// 图像输出格式
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum PlotOutputFormat {
    /// PNG image (publication quality)
    Png,
    /// SVG vector image
    Svg,
    /// CSV data file (line vertices)
    Csv,
}

// ─────────────────────────────────────────────────────────────
// plot 子命令参数
// ─────────────────────────────────────────────────────────────

/// plot 子命令参数
#[derive(Args, Debug)]
pub struct PlotArgs {
    /// Input: defect phase diagram JSON file
    pub input: PathBuf,

    /// Output file path (facet name appended when multiple facets are plotted)
    #[arg(short, long, default_value = "formation_energy.png")]
    pub output: PathBuf,

    /// Output format (auto-detected from extension if not specified)
    #[arg(short, long, value_enum)]
    pub format: Option<PlotOutputFormat>,

    /// Chemical potentials JSON file (flat {element: potential} map, or doped-style facets)
    #[arg(long)]
    pub chempots: Option<PathBuf>,

    /// Facet(s) to plot, comma-separated (default: all facets in the chempots file)
    #[arg(long, value_delimiter = ',')]
    pub facets: Option<Vec<String>>,

    /// Elemental reference energies JSON file (for manually specified absolute chempots)
    #[arg(long)]
    pub elemental_refs: Option<PathBuf>,

    /// Which formation energy lines to draw
    #[arg(long, value_enum, default_value_t = DisplayMode::Stable)]
    pub display: DisplayMode,

    /// Fermi level axis range as MIN:MAX in eV (default: -0.3 to band gap + 0.3)
    #[arg(long)]
    pub xlim: Option<String>,

    /// Formation energy axis range as MIN:MAX in eV (default: automatic)
    #[arg(long)]
    pub ylim: Option<String>,

    /// Draw a dashed vertical line at this Fermi level (eV, e.g. the equilibrium position)
    #[arg(long)]
    pub fermi_level: Option<f64>,

    /// Colormap for the formation energy lines
    #[arg(long, value_enum, default_value_t = Colormap::Dark2)]
    pub colormap: Colormap,

    /// Annotate transition levels with their charge states
    #[arg(long, default_value_t = false)]
    pub auto_labels: bool,

    /// Suppress the chemical potential caption
    #[arg(long, default_value_t = false)]
    pub no_chempot_caption: bool,

    /// Figure width in pixels (for PNG) or points (for SVG)
    #[arg(long, default_value_t = 1200)]
    pub width: u32,

    /// Figure height in pixels (for PNG) or points (for SVG)
    #[arg(long, default_value_t = 800)]
    pub height: u32,

    /// Title for the plot (default: facet name, or the host name from the diagram)
    #[arg(long)]
    pub title: Option<String>,
}

/// 解析坐标轴范围字符串 (e.g., "-0.3:2.5")
pub fn parse_axis_range(input: &str) -> Result<(f64, f64)> {
    let parts: Vec<&str> = input.split(':').collect();
    if parts.len() != 2 {
        return Err(DefectPlotError::InvalidRange(input.to_string()));
    }

    let min: f64 = parts[0]
        .trim()
        .parse()
        .map_err(|_| DefectPlotError::InvalidRange(input.to_string()))?;
    let max: f64 = parts[1]
        .trim()
        .parse()
        .map_err(|_| DefectPlotError::InvalidRange(input.to_string()))?;

    if !(min.is_finite() && max.is_finite()) || max <= min {
        return Err(DefectPlotError::InvalidRange(input.to_string()));
    }

    Ok((min, max))
}
