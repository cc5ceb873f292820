//! # 转变能级图核心模块
//!
//! 提供缺陷形成能 vs 费米能级图的核心计算与绘制。
//!
//! ## 子模块
//! - `envelope`: 稳定电荷态下包络线与全条目线构建
//! - `scale`: y 轴范围计算
//! - `labels`: 缺陷名称格式化与图例去重
//! - `colors`: 调色板
//! - `plot`: 图表绘制
//! - `export`: 数据导出
//!
//! ## 依赖关系
//! - 被 `commands/plot.rs`, `commands/levels.rs` 使用
//! - 使用 `models/diagram.rs`, `models/chempots.rs`

pub mod colors;
pub mod envelope;
pub mod export;
pub mod labels;
pub mod plot;
pub mod scale;

pub use envelope::{build_lines, LineData, Polyline};
