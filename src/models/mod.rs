//! # 数据模型模块
//!
//! 缺陷相图与化学势的数据模型。
//!
//! ## 依赖关系
//! - 被 `parsers/`, `tld/`, `commands/` 模块使用

pub mod chempots;
pub mod diagram;

pub use chempots::{ChemPotSpec, ChemicalPotentials};
pub use diagram::{DefectEntry, DefectPhaseDiagram, EntryRef, TransitionLevel};
