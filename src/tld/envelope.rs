//! # 形成能线构建器
//!
//! 实现转变能级图的核心几何计算。
//!
//! ## 算法概述
//! 1. 全条目线：每个 (缺陷, 电荷态) 条目独立生成跨越宽外推上下限的两点直线
//! 2. 稳定包络线：沿缺陷的转变能级断点走线 —— 断点以下取并列集合中的最高
//!    电荷态，断点以上取最低电荷态，得到分段线性的最低形成能包络
//! 3. 在可视费米窗口两端采样形成能，供 y 轴范围计算
//! 4. 在带隙内对包络线等距采样 100 点；若全为负，记录最小值用于压低 y 轴
//!    下限（物理上不合理，调用方发出警告）
//!
//! ## 依赖关系
//! - 被 `commands/plot.rs` 调用
//! - 使用 `models/diagram.rs` 的形成能求值

use crate::error::{DefectPlotError, Result};
use crate::models::{ChemicalPotentials, DefectEntry, DefectPhaseDiagram, TransitionLevel};

/// 线的外推下限 (eV)，远超任何物理费米窗口
pub const LOWER_CAP: f64 = -100.0;

/// 线的外推上限 (eV)
pub const UPPER_CAP: f64 = 100.0;

/// 带隙内采样点数
const GAP_SAMPLES: usize = 100;

/// 折线：等长的费米能级 / 形成能序列，x 构造后严格非降
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Polyline {
    pub fermi: Vec<f64>,
    pub energy: Vec<f64>,
}

impl Polyline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, fermi: f64, energy: f64) {
        debug_assert!(self.fermi.last().map_or(true, |last| fermi >= *last));
        self.fermi.push(fermi);
        self.energy.push(energy);
    }

    pub fn len(&self) -> usize {
        self.fermi.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fermi.is_empty()
    }

    /// (费米能级, 形成能) 点迭代器
    pub fn points(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.fermi.iter().copied().zip(self.energy.iter().copied())
    }

    /// 线性插值采样，两端取端点值
    pub fn sample_at(&self, x: f64) -> f64 {
        debug_assert!(!self.is_empty());
        if x <= self.fermi[0] {
            return self.energy[0];
        }
        if x >= self.fermi[self.len() - 1] {
            return self.energy[self.len() - 1];
        }
        for i in 1..self.len() {
            let (x0, x1) = (self.fermi[i - 1], self.fermi[i]);
            if x <= x1 {
                let t = if x1 > x0 { (x - x0) / (x1 - x0) } else { 0.0 };
                return self.energy[i - 1] + t * (self.energy[i] - self.energy[i - 1]);
            }
        }
        self.energy[self.len() - 1]
    }
}

/// 形成能线构建结果
#[derive(Debug, Clone)]
pub struct LineData {
    /// 缺陷种类 → 稳定包络线（按种类名排序）
    pub stable: Vec<(String, Polyline)>,

    /// 条目标识 → 全条目两点线（按录入顺序）
    pub all: Vec<(String, Polyline)>,

    /// 稳定模式的 y 轴范围采样值
    pub stable_range_vals: Vec<f64>,

    /// 全条目模式的 y 轴范围采样值
    pub all_range_vals: Vec<f64>,

    /// y 轴下限（默认 0，被全负包络压低）
    pub ymin_floor: f64,

    /// 带隙内形成能全为负的缺陷种类（调用方发出警告）
    pub below_zero_species: Vec<String>,
}

/// 构建全部形成能线
pub fn build_lines(
    diagram: &DefectPhaseDiagram,
    chempots: &ChemicalPotentials,
    window: (f64, f64),
) -> Result<LineData> {
    let (all, all_range_vals) = build_all_states(diagram, chempots, window);

    let mut stable = Vec::new();
    let mut stable_range_vals = Vec::new();
    let mut ymin_floor = 0.0_f64;
    let mut below_zero_species = Vec::new();

    for (species, levels) in &diagram.transition_level_map {
        let line = if levels.is_empty() {
            single_state_line(diagram, species, chempots, window, &all, &mut stable_range_vals)?
        } else {
            build_envelope(
                diagram,
                species,
                levels,
                chempots,
                window,
                &mut stable_range_vals,
            )?
        };

        // 整条包络在带隙内均为负 => 压低 y 轴下限并记录种类
        let samples = sample_in_gap(&line, diagram.band_gap);
        if samples.iter().all(|y| *y < 0.0) {
            let min_sample = samples.iter().copied().fold(f64::INFINITY, f64::min);
            ymin_floor = ymin_floor.min(min_sample);
            below_zero_species.push(species.clone());
        }

        stable.push((species.clone(), line));
    }

    Ok(LineData {
        stable,
        all,
        stable_range_vals,
        all_range_vals,
        ymin_floor,
        below_zero_species,
    })
}

/// 全条目线：每个条目一条跨越外推上下限的两点直线
///
/// 同时在可视窗口两端采样每个条目的形成能，供全条目模式的 y 轴范围使用。
pub fn build_all_states(
    diagram: &DefectPhaseDiagram,
    chempots: &ChemicalPotentials,
    window: (f64, f64),
) -> (Vec<(String, Polyline)>, Vec<f64>) {
    let mut lines = Vec::new();
    let mut range_vals = Vec::new();

    for entry in &diagram.entries {
        let mut line = Polyline::new();
        for cap in [LOWER_CAP, UPPER_CAP] {
            line.push(cap, diagram.formation_energy(entry, chempots, cap));
        }
        for edge in [window.0, window.1] {
            range_vals.push(diagram.formation_energy(entry, chempots, edge));
        }
        lines.push((entry.id(), line));
    }

    (lines, range_vals)
}

/// 稳定包络线：沿排序后的转变能级断点走线
///
/// 断点以下最高电荷态稳定（高电荷态的形成能随费米能级降低下降更快），
/// 断点以上最低电荷态稳定。断点本身的形成能与窗口两端的形成能进入
/// 范围采样集合。
fn build_envelope(
    diagram: &DefectPhaseDiagram,
    species: &str,
    levels: &[TransitionLevel],
    chempots: &ChemicalPotentials,
    window: (f64, f64),
    range_vals: &mut Vec<f64>,
) -> Result<Polyline> {
    let mut sorted: Vec<&TransitionLevel> = levels.iter().collect();
    sorted.sort_by(|a, b| a.fermi_level.partial_cmp(&b.fermi_level).unwrap());

    let mut line = Polyline::new();

    // 下边界：第一个断点处并列集合中的最高电荷态，外推至下限
    let first = sorted[0];
    let charge = first
        .upper_charge()
        .ok_or_else(|| empty_charge_set(species, first))?;
    let entry = lookup_stable(diagram, species, charge)?;
    line.push(LOWER_CAP, diagram.formation_energy(entry, chempots, LOWER_CAP));
    range_vals.push(diagram.formation_energy(entry, chempots, window.0));

    // 逐断点：取并列集合中的最高电荷态求值
    for level in &sorted {
        let charge = level
            .upper_charge()
            .ok_or_else(|| empty_charge_set(species, level))?;
        let entry = lookup_stable(diagram, species, charge)?;
        let energy = diagram.formation_energy(entry, chempots, level.fermi_level);
        line.push(level.fermi_level, energy);
        range_vals.push(energy);
    }

    // 上边界：最后一个断点处并列集合中的最低电荷态，外推至上限
    let last = sorted[sorted.len() - 1];
    let charge = last
        .lower_charge()
        .ok_or_else(|| empty_charge_set(species, last))?;
    let entry = lookup_stable(diagram, species, charge)?;
    line.push(UPPER_CAP, diagram.formation_energy(entry, chempots, UPPER_CAP));
    range_vals.push(diagram.formation_energy(entry, chempots, window.1));

    Ok(line)
}

/// 无转变能级的缺陷种类：复用其唯一稳定条目的全条目两点线
fn single_state_line(
    diagram: &DefectPhaseDiagram,
    species: &str,
    chempots: &ChemicalPotentials,
    window: (f64, f64),
    all: &[(String, Polyline)],
    range_vals: &mut Vec<f64>,
) -> Result<Polyline> {
    let entries = diagram.stable_entries_for(species);
    let entry = entries.first().ok_or_else(|| DefectPlotError::InconsistentDiagram {
        reason: format!("defect '{}' has no stable entries", species),
    })?;

    let id = entry.id();
    let line = all
        .iter()
        .find(|(key, _)| *key == id)
        .map(|(_, line)| line.clone())
        .ok_or_else(|| DefectPlotError::InconsistentDiagram {
            reason: format!("stable entry '{}' is not among the listed entries", id),
        })?;

    for edge in [window.0, window.1] {
        range_vals.push(diagram.formation_energy(entry, chempots, edge));
    }

    Ok(line)
}

/// 带隙内等距采样 100 点（线性插值）
pub fn sample_in_gap(line: &Polyline, band_gap: f64) -> Vec<f64> {
    (0..GAP_SAMPLES)
        .map(|i| {
            let x = band_gap * i as f64 / (GAP_SAMPLES - 1) as f64;
            line.sample_at(x)
        })
        .collect()
}

fn lookup_stable<'a>(
    diagram: &'a DefectPhaseDiagram,
    species: &str,
    charge: i32,
) -> Result<&'a DefectEntry> {
    diagram
        .stable_entry_with_charge(species, charge)
        .ok_or_else(|| DefectPlotError::InconsistentDiagram {
            reason: format!(
                "no stable entry with charge state {} for defect '{}'",
                charge, species
            ),
        })
}

fn empty_charge_set(species: &str, level: &TransitionLevel) -> DefectPlotError {
    DefectPlotError::InconsistentDiagram {
        reason: format!(
            "transition level at {} eV of defect '{}' has an empty charge set",
            level.fermi_level, species
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EntryRef;
    use std::collections::BTreeMap;

    fn entry(name: &str, charge: i32, energy: f64) -> DefectEntry {
        DefectEntry {
            name: name.to_string(),
            charge_state: charge,
            energy,
            element_changes: BTreeMap::new(),
        }
    }

    fn entry_ref(name: &str, charge: i32) -> EntryRef {
        EntryRef {
            name: name.to_string(),
            charge_state: charge,
        }
    }

    /// 单缺陷、两电荷态 (+1, -1)、转变能级在 1.0 eV、带隙 2.0 eV
    ///
    /// E_f(+1, E_F) = e_plus + E_F，E_f(-1, E_F) = e_minus − E_F；
    /// e_plus = e_minus − 2.0 时恰好在 E_F = 1.0 处交叉。
    fn two_charge_diagram(e_plus: f64) -> DefectPhaseDiagram {
        let e_minus = e_plus + 2.0;
        let mut diagram = DefectPhaseDiagram {
            name: None,
            band_gap: 2.0,
            vbm: 0.0,
            entries: vec![entry("v_Cd", 1, e_plus), entry("v_Cd", -1, e_minus)],
            stable_entries: BTreeMap::new(),
            transition_level_map: BTreeMap::new(),
        };
        diagram.stable_entries.insert(
            "v_Cd".to_string(),
            vec![entry_ref("v_Cd", 1), entry_ref("v_Cd", -1)],
        );
        diagram.transition_level_map.insert(
            "v_Cd".to_string(),
            vec![TransitionLevel {
                fermi_level: 1.0,
                charges: [1, -1].into_iter().collect(),
            }],
        );
        diagram
    }

    #[test]
    fn test_envelope_point_count_and_monotone_x() {
        let diagram = two_charge_diagram(0.5);
        let pots = ChemicalPotentials::new();
        let lines = build_lines(&diagram, &pots, (-0.3, 2.3)).unwrap();

        // k 个断点 => k + 2 个顶点
        let (_, envelope) = &lines.stable[0];
        assert_eq!(envelope.len(), 3);
        for i in 1..envelope.len() {
            assert!(envelope.fermi[i] > envelope.fermi[i - 1]);
        }
        assert!((envelope.fermi[1] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_envelope_charge_selection() {
        let diagram = two_charge_diagram(0.5);
        let pots = ChemicalPotentials::new();
        let lines = build_lines(&diagram, &pots, (-0.3, 2.3)).unwrap();
        let (_, envelope) = &lines.stable[0];

        // 断点以下 +1 态：E_f(+1, -100) = 0.5 − 100
        assert!((envelope.energy[0] - (0.5 - 100.0)).abs() < 1e-9);
        // 断点处简并：E_f = 0.5 + 1.0 = 1.5
        assert!((envelope.energy[1] - 1.5).abs() < 1e-9);
        // 断点以上 -1 态：E_f(-1, 100) = 2.5 − 100
        assert!((envelope.energy[2] - (2.5 - 100.0)).abs() < 1e-9);
    }

    #[test]
    fn test_envelope_two_breakpoints() {
        // 三个电荷态 (+1, 0, -1)，转变能级 0.7 与 1.2 eV
        let mut diagram = DefectPhaseDiagram {
            name: None,
            band_gap: 2.0,
            vbm: 0.0,
            entries: vec![
                entry("Te_Cd", 1, 0.2),
                entry("Te_Cd", 0, 0.9),
                entry("Te_Cd", -1, 2.1),
            ],
            stable_entries: BTreeMap::new(),
            transition_level_map: BTreeMap::new(),
        };
        diagram.stable_entries.insert(
            "Te_Cd".to_string(),
            vec![
                entry_ref("Te_Cd", 1),
                entry_ref("Te_Cd", 0),
                entry_ref("Te_Cd", -1),
            ],
        );
        diagram.transition_level_map.insert(
            "Te_Cd".to_string(),
            vec![
                TransitionLevel {
                    fermi_level: 0.7,
                    charges: [1, 0].into_iter().collect(),
                },
                TransitionLevel {
                    fermi_level: 1.2,
                    charges: [0, -1].into_iter().collect(),
                },
            ],
        );

        let pots = ChemicalPotentials::new();
        let lines = build_lines(&diagram, &pots, (-0.3, 2.3)).unwrap();
        let (_, envelope) = &lines.stable[0];

        assert_eq!(envelope.len(), 4);
        for i in 1..envelope.len() {
            assert!(envelope.fermi[i] > envelope.fermi[i - 1]);
        }

        // 下外推取 +1 态，断点处取各自并列集合的最高电荷态，上外推取 -1 态
        assert!((envelope.energy[0] - (0.2 - 100.0)).abs() < 1e-9);
        assert!((envelope.energy[1] - 0.9).abs() < 1e-9);
        assert!((envelope.energy[2] - 0.9).abs() < 1e-9);
        assert!((envelope.energy[3] - (2.1 - 100.0)).abs() < 1e-9);
    }

    #[test]
    fn test_single_charge_species_reuses_all_states_line() {
        let mut diagram = DefectPhaseDiagram {
            name: None,
            band_gap: 2.0,
            vbm: 0.0,
            entries: vec![entry("Te_i", 0, 1.8)],
            stable_entries: BTreeMap::new(),
            transition_level_map: BTreeMap::new(),
        };
        diagram
            .stable_entries
            .insert("Te_i".to_string(), vec![entry_ref("Te_i", 0)]);
        diagram
            .transition_level_map
            .insert("Te_i".to_string(), Vec::new());

        let pots = ChemicalPotentials::new();
        let lines = build_lines(&diagram, &pots, (-0.3, 2.3)).unwrap();

        let (_, envelope) = &lines.stable[0];
        let (_, all_line) = lines.all.iter().find(|(id, _)| id == "Te_i_0").unwrap();
        assert_eq!(envelope, all_line);
        assert_eq!(envelope.len(), 2);
    }

    #[test]
    fn test_all_states_lines_span_caps() {
        let diagram = two_charge_diagram(0.5);
        let pots = ChemicalPotentials::new();
        let (all, range_vals) = build_all_states(&diagram, &pots, (-0.3, 2.3));

        assert_eq!(all.len(), 2);
        for (_, line) in &all {
            assert_eq!(line.len(), 2);
            assert!((line.fermi[0] - LOWER_CAP).abs() < 1e-12);
            assert!((line.fermi[1] - UPPER_CAP).abs() < 1e-12);
        }
        // 每条目两端各一个窗口采样值
        assert_eq!(range_vals.len(), 4);
    }

    #[test]
    fn test_below_zero_warning_and_floor() {
        // e_plus = -4.0：带隙内整条包络为负
        let diagram = two_charge_diagram(-4.0);
        let pots = ChemicalPotentials::new();
        let lines = build_lines(&diagram, &pots, (-0.3, 2.3)).unwrap();

        assert_eq!(lines.below_zero_species, vec!["v_Cd".to_string()]);
        // 带隙内最低采样值在 E_F = 0 处：E_f(+1, 0) = −4.0
        assert!((lines.ymin_floor - (-4.0)).abs() < 1e-9);
    }

    #[test]
    fn test_no_warning_when_positive_somewhere_in_gap() {
        let diagram = two_charge_diagram(0.5);
        let pots = ChemicalPotentials::new();
        let lines = build_lines(&diagram, &pots, (-0.3, 2.3)).unwrap();

        assert!(lines.below_zero_species.is_empty());
        assert_eq!(lines.ymin_floor, 0.0);
    }

    #[test]
    fn test_polyline_sample_clamps_at_ends() {
        let mut line = Polyline::new();
        line.push(0.0, 1.0);
        line.push(2.0, 3.0);

        assert!((line.sample_at(-1.0) - 1.0).abs() < 1e-12);
        assert!((line.sample_at(3.0) - 3.0).abs() < 1e-12);
        assert!((line.sample_at(1.0) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_range_vals_include_window_edges_and_breakpoints() {
        let diagram = two_charge_diagram(0.5);
        let pots = ChemicalPotentials::new();
        let lines = build_lines(&diagram, &pots, (0.0, 2.0)).unwrap();

        // 窗口左端 (+1 态)、断点、窗口右端 (-1 态)
        let expected = [0.5, 1.5, 0.5];
        assert_eq!(lines.stable_range_vals.len(), expected.len());
        for (got, want) in lines.stable_range_vals.iter().zip(expected) {
            assert!((got - want).abs() < 1e-9);
        }
    }
}
