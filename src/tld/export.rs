//! # 数据导出
//!
//! 导出形成能线顶点与电荷转变能级到 CSV。
//!
//! ## 支持格式
//! - 线数据: defect, fermi_level_eV, formation_energy_eV
//! - 转变能级: defect, transition, fermi_level_eV, in_gap
//!
//! ## 依赖关系
//! - 被 `commands/plot.rs`, `commands/levels.rs` 调用
//! - 使用 `tld/envelope.rs` 的 Polyline 结构
//! - 使用 `csv` 库写入 CSV 文件

use crate::error::{DefectPlotError, Result};
use crate::models::DefectPhaseDiagram;
use crate::tld::envelope::Polyline;

use std::path::Path;

/// 导出形成能线顶点为 CSV 格式
pub fn lines_to_csv(lines: &[(String, Polyline)], output_path: &Path) -> Result<()> {
    let mut wtr = csv::Writer::from_path(output_path).map_err(DefectPlotError::CsvError)?;

    wtr.write_record(["defect", "fermi_level_eV", "formation_energy_eV"])
        .map_err(DefectPlotError::CsvError)?;

    for (name, line) in lines {
        for (fermi, energy) in line.points() {
            wtr.write_record([
                name.clone(),
                format!("{:.4}", fermi),
                format!("{:.6}", energy),
            ])
            .map_err(DefectPlotError::CsvError)?;
        }
    }

    wtr.flush().map_err(|e| DefectPlotError::FileWriteError {
        path: output_path.display().to_string(),
        source: e,
    })?;

    Ok(())
}

/// 导出电荷转变能级为 CSV 格式
pub fn transition_levels_to_csv(
    diagram: &DefectPhaseDiagram,
    output_path: &Path,
) -> Result<()> {
    let mut wtr = csv::Writer::from_path(output_path).map_err(DefectPlotError::CsvError)?;

    wtr.write_record(["defect", "transition", "fermi_level_eV", "in_gap"])
        .map_err(DefectPlotError::CsvError)?;

    for (species, levels) in &diagram.transition_level_map {
        for level in levels {
            let in_gap = (0.0..=diagram.band_gap).contains(&level.fermi_level);
            wtr.write_record([
                species.clone(),
                level.label(),
                format!("{:.4}", level.fermi_level),
                if in_gap { "yes" } else { "no" }.to_string(),
            ])
            .map_err(DefectPlotError::CsvError)?;
        }
    }

    wtr.flush().map_err(|e| DefectPlotError::FileWriteError {
        path: output_path.display().to_string(),
        source: e,
    })?;

    Ok(())
}
