//! # 化学势数据模型
//!
//! 支持两种化学势输入形式：
//! - 单一绝对化学势映射：`{元素符号: 化学势}`
//! - 多 facet 结构：化学势稳定区的各顶点各持一组映射，共享元素参考能量
//!
//! ## 依赖关系
//! - 被 `parsers/chempots.rs` 构造
//! - 被 `commands/plot.rs` 使用

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 元素符号 → 化学势 (eV)
pub type ChemicalPotentials = BTreeMap<String, f64>;

/// 疑似 formal 化学势的判定阈值 (eV)
const FORMAL_ATOL: f64 = 0.1;

/// 化学势输入
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChemPotSpec {
    /// 多 facet 形式：每个 facet 一组 DFT 化学势，外加共享的元素参考能量
    Facets {
        facets: BTreeMap<String, ChemicalPotentials>,
        #[serde(default)]
        elemental_refs: ChemicalPotentials,
    },

    /// 单一绝对（DFT）化学势映射
    Absolute(ChemicalPotentials),
}

impl ChemPotSpec {
    /// 所有 facet 名称（绝对形式返回空）
    pub fn facet_names(&self) -> Vec<String> {
        match self {
            ChemPotSpec::Facets { facets, .. } => facets.keys().cloned().collect(),
            ChemPotSpec::Absolute(_) => Vec::new(),
        }
    }

    /// 单一映射中是否有化学势接近零
    ///
    /// 接近零通常意味着用户给的是 formal（相对元素参考）化学势而非 DFT
    /// 绝对值，绝对形成能会因此产生大误差（转变能级位置不受影响）。
    pub fn looks_formal(&self) -> bool {
        match self {
            ChemPotSpec::Absolute(pots) => pots.values().any(|mu| mu.abs() < FORMAL_ATOL),
            ChemPotSpec::Facets { .. } => false,
        }
    }
}

/// 格式化图表顶部的化学势标注行
///
/// 提供元素参考能量时换算为 formal 化学势并注明。
pub fn chempot_caption(
    pots: &ChemicalPotentials,
    elemental_refs: Option<&ChemicalPotentials>,
) -> String {
    let values: Vec<String> = pots
        .iter()
        .map(|(el, mu)| {
            let shown = match elemental_refs {
                Some(refs) => mu - refs.get(el).copied().unwrap_or(0.0),
                None => *mu,
            };
            format!("μ({}) = {:.2}", el, shown)
        })
        .collect();

    let unit = if elemental_refs.is_some() {
        "[eV, w.r.t. elemental refs]"
    } else {
        "[eV, DFT]"
    };

    format!("{}  {}", values.join(", "), unit)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_absolute_form() {
        let spec: ChemPotSpec = serde_json::from_str(r#"{ "Cd": -1.2, "Te": -3.4 }"#).unwrap();
        match spec {
            ChemPotSpec::Absolute(pots) => {
                assert!((pots["Cd"] + 1.2).abs() < 1e-12);
                assert!((pots["Te"] + 3.4).abs() < 1e-12);
            }
            _ => panic!("expected absolute form"),
        }
    }

    #[test]
    fn test_parse_facet_form() {
        let text = r#"{
            "facets": { "Cd-rich": { "Cd": -0.1, "Te": -1.5 } },
            "elemental_refs": { "Cd": -0.9, "Te": -3.1 }
        }"#;
        let spec: ChemPotSpec = serde_json::from_str(text).unwrap();
        match spec {
            ChemPotSpec::Facets {
                facets,
                elemental_refs,
            } => {
                assert_eq!(facets.len(), 1);
                assert!(facets.contains_key("Cd-rich"));
                assert!((elemental_refs["Te"] + 3.1).abs() < 1e-12);
            }
            _ => panic!("expected facet form"),
        }
    }

    #[test]
    fn test_looks_formal() {
        let formal: ChemPotSpec = serde_json::from_str(r#"{ "Cd": 0.0, "Te": -1.5 }"#).unwrap();
        assert!(formal.looks_formal());

        let dft: ChemPotSpec = serde_json::from_str(r#"{ "Cd": -1.2, "Te": -3.4 }"#).unwrap();
        assert!(!dft.looks_formal());
    }

    #[test]
    fn test_chempot_caption() {
        let mut pots = ChemicalPotentials::new();
        pots.insert("Cd".to_string(), -1.0);
        pots.insert("Te".to_string(), -3.5);

        let caption = chempot_caption(&pots, None);
        assert_eq!(caption, "μ(Cd) = -1.00, μ(Te) = -3.50  [eV, DFT]");

        let mut refs = ChemicalPotentials::new();
        refs.insert("Cd".to_string(), -0.5);
        refs.insert("Te".to_string(), -3.0);
        let formal = chempot_caption(&pots, Some(&refs));
        assert_eq!(
            formal,
            "μ(Cd) = -0.50, μ(Te) = -0.50  [eV, w.r.t. elemental refs]"
        );
    }
}
