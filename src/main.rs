//! # defectplot - 缺陷形成能图绘制工具箱
//!
//! 从计算好的缺陷热力学数据绘制缺陷形成能 vs 费米能级图
//! （即缺陷相图 / 电荷转变能级图），输出论文级别的图像。
//!
//! ## 子命令
//! - `plot`   - 绘制缺陷形成能图 (PNG/SVG)，或导出线数据 (CSV)
//! - `levels` - 打印/导出电荷转变能级汇总表
//!
//! ## 依赖关系
//! ```text
//! main.rs
//!   ├── cli/        (命令行参数定义)
//!   ├── commands/   (命令执行逻辑)
//!   │     ├── parsers/   (JSON 输入解析与校验)
//!   │     ├── models/    (数据模型)
//!   │     └── tld/       (转变能级图核心算法与绘制)
//!   ├── utils/      (工具函数)
//!   └── error.rs    (错误处理)
//! ```

mod cli;
mod commands;
mod error;
mod models;
mod parsers;
mod tld;
mod utils;

use clap::Parser;
use cli::Cli;

fn main() {
    // Initialize colored output for Windows compatibility
    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    let cli = Cli::parse();

    if let Err(e) = commands::run(cli.command) {
        utils::output::print_error(&format!("{}", e));
        std::process::exit(1);
    }
}
