//! # levels 子命令实现
//!
//! 汇总缺陷相图中的电荷转变能级并生成终端表格，可选导出 CSV。
//!
//! ## 依赖关系
//! - 使用 `cli/levels.rs` 定义的参数
//! - 使用 `parsers/diagram.rs`, `tld/export.rs`
//! - 使用 `utils/output.rs`

use crate::cli::levels::LevelsArgs;
use crate::error::{DefectPlotError, Result};
use crate::models::DefectPhaseDiagram;
use crate::parsers;
use crate::tld::export;
use crate::utils::output;

use tabled::{Table, Tabled};

/// 转变能级表格行
#[derive(Debug, Clone, Tabled)]
struct LevelRow {
    #[tabled(rename = "Defect")]
    defect: String,
    #[tabled(rename = "Transition")]
    transition: String,
    #[tabled(rename = "Fermi Level (eV)")]
    fermi_level: String,
    #[tabled(rename = "In Gap")]
    in_gap: String,
}

/// 执行转变能级汇总
pub fn execute(args: LevelsArgs) -> Result<()> {
    output::print_header("Charge Transition Levels");

    if !args.input.is_file() {
        return Err(DefectPlotError::FileNotFound {
            path: args.input.display().to_string(),
        });
    }

    let diagram = parsers::diagram::parse_diagram_file(&args.input)?;

    let host = diagram
        .name
        .as_ref()
        .map(|n| format!("{}, ", n))
        .unwrap_or_default();
    output::print_info(&format!("{}band gap: {:.3} eV", host, diagram.band_gap));

    let rows = level_rows(&diagram);
    if rows.is_empty() {
        output::print_warning("The diagram has no transition level map.");
        return Ok(());
    }

    let table = Table::new(&rows);
    println!("{}", table);

    if let Some(csv_path) = &args.output_csv {
        export::transition_levels_to_csv(&diagram, csv_path)?;
        output::print_success(&format!(
            "Transition levels saved to '{}'",
            csv_path.display()
        ));
    }

    Ok(())
}

/// 每个断点一行；无转变的缺陷种类给出占位行
fn level_rows(diagram: &DefectPhaseDiagram) -> Vec<LevelRow> {
    let mut rows = Vec::new();

    for (species, levels) in &diagram.transition_level_map {
        if levels.is_empty() {
            rows.push(LevelRow {
                defect: species.clone(),
                transition: "(none)".to_string(),
                fermi_level: "-".to_string(),
                in_gap: "-".to_string(),
            });
            continue;
        }
        for level in levels {
            let in_gap = (0.0..=diagram.band_gap).contains(&level.fermi_level);
            rows.push(LevelRow {
                defect: species.clone(),
                transition: level.label(),
                fermi_level: format!("{:.3}", level.fermi_level),
                in_gap: if in_gap { "yes" } else { "no" }.to_string(),
            });
        }
    }

    rows
}
