//! # 化学势 JSON 解析器
//!
//! 加载化学势文档（单一映射或多 facet 形式）与元素参考能量文件。
//!
//! ## 依赖关系
//! - 被 `commands/plot.rs` 调用
//! - 使用 `models/chempots.rs` 数据模型
//! - 使用 `serde_json` 反序列化

use crate::error::{DefectPlotError, Result};
use crate::models::{ChemPotSpec, ChemicalPotentials};

use std::path::Path;

/// 解析化学势文件（自动识别单一映射 / facet 形式）
pub fn parse_chempots_file(path: &Path) -> Result<ChemPotSpec> {
    let text = super::read_to_string(path)?;
    let spec: ChemPotSpec =
        serde_json::from_str(&text).map_err(|e| DefectPlotError::ParseError {
            format: "chemical potentials JSON".to_string(),
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

    validate(&spec).map_err(|reason| DefectPlotError::ParseError {
        format: "chemical potentials JSON".to_string(),
        path: path.display().to_string(),
        reason,
    })?;

    Ok(spec)
}

/// 解析元素参考能量文件（`{元素符号: 参考能量}`）
pub fn parse_element_map_file(path: &Path) -> Result<ChemicalPotentials> {
    let text = super::read_to_string(path)?;
    serde_json::from_str(&text).map_err(|e| DefectPlotError::ParseError {
        format: "elemental references JSON".to_string(),
        path: path.display().to_string(),
        reason: e.to_string(),
    })
}

fn validate(spec: &ChemPotSpec) -> std::result::Result<(), String> {
    match spec {
        ChemPotSpec::Absolute(pots) => {
            if pots.is_empty() {
                return Err("empty chemical potential map".to_string());
            }
            check_finite(pots)
        }
        ChemPotSpec::Facets {
            facets,
            elemental_refs,
        } => {
            if facets.is_empty() {
                return Err("no facets defined".to_string());
            }
            for (facet, pots) in facets {
                if pots.is_empty() {
                    return Err(format!("facet '{}' has no chemical potentials", facet));
                }
                check_finite(pots).map_err(|e| format!("facet '{}': {}", facet, e))?;
            }
            check_finite(elemental_refs)
        }
    }
}

fn check_finite(pots: &ChemicalPotentials) -> std::result::Result<(), String> {
    for (el, mu) in pots {
        if !mu.is_finite() {
            return Err(format!("non-finite chemical potential for element '{}'", el));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_rejects_empty_map() {
        let spec: ChemPotSpec = serde_json::from_str("{}").unwrap();
        assert!(validate(&spec).is_err());
    }

    #[test]
    fn test_validate_accepts_both_forms() {
        let flat: ChemPotSpec = serde_json::from_str(r#"{ "Cd": -1.0 }"#).unwrap();
        assert!(validate(&flat).is_ok());

        let facets: ChemPotSpec = serde_json::from_str(
            r#"{ "facets": { "A": { "Cd": -1.0 } }, "elemental_refs": { "Cd": -0.5 } }"#,
        )
        .unwrap();
        assert!(validate(&facets).is_ok());
    }
}
