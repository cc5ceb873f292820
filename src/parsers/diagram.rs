//! # 缺陷相图 JSON 解析器
//!
//! 反序列化缺陷相图文档并做结构校验：条目唯一、稳定条目引用可解析、
//! 转变能级电荷态均有对应稳定条目。各缺陷的转变能级在加载后按费米能级
//! 升序排序，不信任输入顺序。
//!
//! ## 依赖关系
//! - 被 `commands/plot.rs`, `commands/levels.rs` 调用
//! - 使用 `models/diagram.rs` 数据模型
//! - 使用 `serde_json` 反序列化

use crate::error::{DefectPlotError, Result};
use crate::models::DefectPhaseDiagram;

use std::collections::BTreeSet;
use std::path::Path;

/// 解析并校验缺陷相图文件
pub fn parse_diagram_file(path: &Path) -> Result<DefectPhaseDiagram> {
    let text = super::read_to_string(path)?;
    let mut diagram: DefectPhaseDiagram =
        serde_json::from_str(&text).map_err(|e| DefectPlotError::ParseError {
            format: "defect phase diagram JSON".to_string(),
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

    normalize_and_validate(&mut diagram)?;
    Ok(diagram)
}

/// 排序转变能级并校验图的结构一致性
pub fn normalize_and_validate(diagram: &mut DefectPhaseDiagram) -> Result<()> {
    if !(diagram.band_gap.is_finite() && diagram.band_gap > 0.0) {
        return inconsistent(format!("band gap must be positive, got {}", diagram.band_gap));
    }
    if !diagram.vbm.is_finite() {
        return inconsistent(format!("VBM must be finite, got {}", diagram.vbm));
    }
    if diagram.entries.is_empty() {
        return inconsistent("no defect entries".to_string());
    }

    // 条目 (名称, 电荷态) 必须唯一
    let mut seen = BTreeSet::new();
    for entry in &diagram.entries {
        if !entry.energy.is_finite() {
            return inconsistent(format!("entry '{}' has non-finite energy", entry.id()));
        }
        if !seen.insert((entry.name.clone(), entry.charge_state)) {
            return inconsistent(format!("duplicate defect entry '{}'", entry.id()));
        }
    }

    // 稳定条目引用必须可解析
    for (species, refs) in &diagram.stable_entries {
        if refs.is_empty() {
            return inconsistent(format!("defect '{}' has an empty stable entry list", species));
        }
        for r in refs {
            if diagram.find_entry(&r.name, r.charge_state).is_none() {
                return inconsistent(format!(
                    "stable entry '{}_{}' of defect '{}' is not among the listed entries",
                    r.name, r.charge_state, species
                ));
            }
        }
    }

    // 转变能级：种类有稳定条目，断点有限，电荷集合非空且可解析
    for (species, levels) in &diagram.transition_level_map {
        if !diagram.stable_entries.contains_key(species) {
            return inconsistent(format!("defect '{}' has no stable entries", species));
        }
        for level in levels {
            if !level.fermi_level.is_finite() {
                return inconsistent(format!(
                    "defect '{}' has a non-finite transition level",
                    species
                ));
            }
            if level.charges.is_empty() {
                return inconsistent(format!(
                    "transition level at {} eV of defect '{}' has an empty charge set",
                    level.fermi_level, species
                ));
            }
            for charge in &level.charges {
                if diagram.stable_entry_with_charge(species, *charge).is_none() {
                    return inconsistent(format!(
                        "charge state {} at the {} eV transition level of defect '{}' \
                         has no matching stable entry",
                        charge, level.fermi_level, species
                    ));
                }
            }
        }
    }

    // 断点升序（有限性已校验，partial_cmp 不会失败）
    for levels in diagram.transition_level_map.values_mut() {
        levels.sort_by(|a, b| a.fermi_level.partial_cmp(&b.fermi_level).unwrap());
    }

    Ok(())
}

fn inconsistent(reason: String) -> Result<()> {
    Err(DefectPlotError::InconsistentDiagram { reason })
}
