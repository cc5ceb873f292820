//! # 缺陷相图数据模型
//!
//! 存储缺陷相图计算结果：缺陷条目、稳定电荷态分组、电荷转变能级映射，
//! 以及形成能求值。形成能对费米能级是仿射函数：
//!
//! ```text
//! E_f(q, E_F) = E_raw − Σ n_el·μ_el + q·(E_VBM + E_F)
//! ```
//!
//! 其中 `E_raw` 为与化学势、费米能级无关的部分（缺陷超胞能量差加有限尺寸
//! 修正），`n_el` 为添加 (+) / 移除 (−) 的原子数。
//!
//! ## 依赖关系
//! - 被 `parsers/diagram.rs` 构造并校验
//! - 被 `tld/`, `commands/` 模块使用

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::models::chempots::ChemicalPotentials;

/// 缺陷条目：一个 (缺陷种类, 电荷态) 组合
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefectEntry {
    /// 缺陷名称（如 `v_Cd`, `Te_Cd`, `Int_Te_3`）
    pub name: String,

    /// 电荷态
    pub charge_state: i32,

    /// 形成能中与化学势、费米能级无关的部分 (eV)
    pub energy: f64,

    /// 元素计量变化：元素符号 → 添加 (+) / 移除 (−) 的原子数
    #[serde(default)]
    pub element_changes: BTreeMap<String, i32>,
}

impl DefectEntry {
    /// 条目标识：`{name}_{charge_state}`
    pub fn id(&self) -> String {
        format!("{}_{}", self.name, self.charge_state)
    }
}

/// 对缺陷条目的引用，用于稳定条目分组
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub struct EntryRef {
    pub name: String,
    pub charge_state: i32,
}

/// 电荷转变能级：在该费米能级处形成能简并的电荷态集合
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransitionLevel {
    /// 费米能级断点 (eV, 相对 VBM)
    pub fermi_level: f64,

    /// 在断点处简并的电荷态集合
    pub charges: BTreeSet<i32>,
}

impl TransitionLevel {
    /// 断点以下稳定的电荷态（集合中的最大者）
    pub fn upper_charge(&self) -> Option<i32> {
        self.charges.iter().next_back().copied()
    }

    /// 断点以上稳定的电荷态（集合中的最小者）
    pub fn lower_charge(&self) -> Option<i32> {
        self.charges.iter().next().copied()
    }

    /// 转变能级标签，如 `ε(+1/0)`
    pub fn label(&self) -> String {
        let hi = self.upper_charge().unwrap_or(0);
        let lo = self.lower_charge().unwrap_or(0);
        format!("ε({}/{})", signed_charge(hi), signed_charge(lo))
    }
}

/// 电荷态字符串：正值带显式 `+` 号
fn signed_charge(q: i32) -> String {
    if q > 0 {
        format!("+{}", q)
    } else {
        q.to_string()
    }
}

/// 缺陷相图
///
/// 所有数据在加载时构造并校验，绘制过程中不可变。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefectPhaseDiagram {
    /// 宿主材料名称
    #[serde(default)]
    pub name: Option<String>,

    /// 带隙 (eV)
    pub band_gap: f64,

    /// 价带顶 (eV, DFT 绝对值)
    pub vbm: f64,

    /// 所有缺陷条目
    pub entries: Vec<DefectEntry>,

    /// 缺陷种类 → 在某处为最低能量电荷态的条目
    #[serde(default)]
    pub stable_entries: BTreeMap<String, Vec<EntryRef>>,

    /// 缺陷种类 → 电荷转变能级（按费米能级升序）
    #[serde(default)]
    pub transition_level_map: BTreeMap<String, Vec<TransitionLevel>>,
}

impl DefectPhaseDiagram {
    /// 形成能求值：对固定化学势，是费米能级的仿射函数（斜率 = 电荷态）
    ///
    /// 化学势映射中缺失的元素按零处理。
    pub fn formation_energy(
        &self,
        entry: &DefectEntry,
        chempots: &ChemicalPotentials,
        fermi_level: f64,
    ) -> f64 {
        let mu_sum: f64 = entry
            .element_changes
            .iter()
            .map(|(el, n)| *n as f64 * chempots.get(el).copied().unwrap_or(0.0))
            .sum();
        entry.energy - mu_sum + entry.charge_state as f64 * (self.vbm + fermi_level)
    }

    /// 按 (名称, 电荷态) 查找条目
    pub fn find_entry(&self, name: &str, charge_state: i32) -> Option<&DefectEntry> {
        self.entries
            .iter()
            .find(|e| e.name == name && e.charge_state == charge_state)
    }

    /// 解析某缺陷种类的稳定条目（保持录入顺序）
    pub fn stable_entries_for(&self, species: &str) -> Vec<&DefectEntry> {
        self.stable_entries
            .get(species)
            .map(|refs| {
                refs.iter()
                    .filter_map(|r| self.find_entry(&r.name, r.charge_state))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// 在某缺陷种类的稳定条目中查找指定电荷态的条目
    ///
    /// 多个稳定条目共享同一电荷态时，取名称字典序最小者。
    pub fn stable_entry_with_charge(&self, species: &str, charge: i32) -> Option<&DefectEntry> {
        self.stable_entries_for(species)
            .into_iter()
            .filter(|e| e.charge_state == charge)
            .min_by(|a, b| a.name.cmp(&b.name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str, charge: i32, energy: f64) -> DefectEntry {
        DefectEntry {
            name: name.to_string(),
            charge_state: charge,
            energy,
            element_changes: BTreeMap::new(),
        }
    }

    fn diagram_with(entries: Vec<DefectEntry>) -> DefectPhaseDiagram {
        DefectPhaseDiagram {
            name: None,
            band_gap: 2.0,
            vbm: 0.0,
            entries,
            stable_entries: BTreeMap::new(),
            transition_level_map: BTreeMap::new(),
        }
    }

    #[test]
    fn test_formation_energy_affine_in_fermi_level() {
        let diagram = diagram_with(vec![entry("v_Cd", -2, 3.0)]);
        let pots = ChemicalPotentials::new();
        let e = &diagram.entries[0];

        let e0 = diagram.formation_energy(e, &pots, 0.0);
        let e1 = diagram.formation_energy(e, &pots, 1.0);
        let e2 = diagram.formation_energy(e, &pots, 2.0);

        // 斜率 = 电荷态
        assert!((e1 - e0 - (-2.0)).abs() < 1e-12);
        assert!((e2 - e1 - (-2.0)).abs() < 1e-12);
        assert!((e0 - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_formation_energy_vbm_offset() {
        let mut diagram = diagram_with(vec![entry("v_Cd", 1, 1.0)]);
        diagram.vbm = 2.5;
        let pots = ChemicalPotentials::new();
        let e = &diagram.entries[0];

        // E_f(0) = 1.0 + 1·(2.5 + 0)
        assert!((diagram.formation_energy(e, &pots, 0.0) - 3.5).abs() < 1e-12);
    }

    #[test]
    fn test_formation_energy_chemical_potentials() {
        let mut e = entry("v_Cd", 0, 4.0);
        e.element_changes.insert("Cd".to_string(), -1);
        let diagram = diagram_with(vec![e]);

        let mut pots = ChemicalPotentials::new();
        pots.insert("Cd".to_string(), -1.5);

        // 移除一个 Cd：E_f = 4.0 − (−1)·(−1.5) = 2.5
        let ef = diagram.formation_energy(&diagram.entries[0], &pots, 0.0);
        assert!((ef - 2.5).abs() < 1e-12);

        // 缺失元素按零化学势处理
        let ef_zero = diagram.formation_energy(&diagram.entries[0], &ChemicalPotentials::new(), 0.0);
        assert!((ef_zero - 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_stable_entry_with_charge_name_tie_break() {
        let mut diagram = diagram_with(vec![
            entry("v_Cd_b", 0, 1.0),
            entry("v_Cd_a", 0, 1.2),
        ]);
        diagram.stable_entries.insert(
            "v_Cd".to_string(),
            vec![
                EntryRef {
                    name: "v_Cd_b".to_string(),
                    charge_state: 0,
                },
                EntryRef {
                    name: "v_Cd_a".to_string(),
                    charge_state: 0,
                },
            ],
        );

        // 同电荷态并列时取名称字典序最小者
        let picked = diagram.stable_entry_with_charge("v_Cd", 0).unwrap();
        assert_eq!(picked.name, "v_Cd_a");
    }

    #[test]
    fn test_transition_level_charges() {
        let level = TransitionLevel {
            fermi_level: 0.5,
            charges: [1, -1].into_iter().collect(),
        };
        assert_eq!(level.upper_charge(), Some(1));
        assert_eq!(level.lower_charge(), Some(-1));
        assert_eq!(level.label(), "ε(+1/-1)");

        let neutral = TransitionLevel {
            fermi_level: 0.5,
            charges: [0, -2].into_iter().collect(),
        };
        assert_eq!(neutral.label(), "ε(0/-2)");
    }
}
