//! # 缺陷名称格式化与图例去重
//!
//! 将原始缺陷标识映射为图例用的人类可读标签：
//! - 空位 `v_Cd` / `vac_1_Cd` → `V_Cd`
//! - 间隙 `Te_i` / `Int_Te_3` → `Te_i`
//! - 替位/反位 `Te_Cd` / `sub_1_Te_on_Cd` → `Te_Cd`
//!
//! 全条目模式下末尾的电荷态以 Unicode 上标呈现（`⁰`, `⁺`, `²⁻`, …）。
//! 同一图例内标签必须唯一：碰撞时先补位点编号，再在末尾上标块之前插入
//! 递增字母后缀。格式化失败的名称原样回退，不向外传播错误。
//!
//! ## 依赖关系
//! - 被 `commands/plot.rs` 调用
//! - 使用 `regex` 解析缺陷标识

/// Unicode 上标字符集（电荷态块）
const SUPERSCRIPTS: &str = "⁰¹²³⁴⁵⁶⁷⁸⁹⁺⁻";

/// 格式化图例标签序列，保证输出唯一且顺序与输入一致
///
/// 对累积输出集合的纯函数：首个出现的标签从不加后缀。
pub fn format_legend(names: &[String], all_entries: bool) -> Vec<String> {
    let mut legend: Vec<String> = Vec::new();

    for raw in names {
        // 先尝试不带位点编号的格式化；失败则原样使用
        let mut label =
            format_defect_name(raw, false, all_entries).unwrap_or_else(|| raw.clone());

        // 碰撞：补位点编号重试
        if legend.contains(&label) {
            if let Some(with_site) = format_defect_name(raw, true, all_entries) {
                label = with_site;
            }
        }

        // 仍碰撞：插入字母后缀直至唯一
        if legend.contains(&label) {
            label = append_suffix_letter(&label, &legend);
        }

        legend.push(label);
    }

    legend
}

/// 格式化单个缺陷标识
///
/// `with_charge` 时解析末尾的 `_{q}` 电荷记号并以上标呈现；
/// 无法识别的标识返回 `None`。
pub fn format_defect_name(raw: &str, include_site: bool, with_charge: bool) -> Option<String> {
    let (base, charge) = if with_charge {
        split_charge_token(raw)
    } else {
        (raw, None)
    };

    let (stem, site) = parse_species(base)?;

    let mut label = stem;
    if include_site {
        if let Some(n) = site {
            label.push('_');
            label.push_str(&n.to_string());
        }
    }
    if let Some(q) = charge {
        label.push_str(&superscript_charge(q));
    }

    Some(label)
}

/// 在末尾上标块之前插入字母后缀（a, b, …, z, aa, bb, …）
fn append_suffix_letter(label: &str, taken: &[String]) -> String {
    let (stem, superscript) = split_superscript_suffix(label);

    let mut i = 0usize;
    loop {
        let letter = char::from(b'a' + (i % 26) as u8);
        let reps = i / 26 + 1;
        let suffix: String = std::iter::repeat(letter).take(reps).collect();
        let candidate = format!("{}_{}{}", stem, suffix, superscript);
        if !taken.contains(&candidate) {
            return candidate;
        }
        i += 1;
    }
}

/// 拆出末尾的 Unicode 上标块（固定的尾部定界符，可为空）
fn split_superscript_suffix(label: &str) -> (&str, &str) {
    let mut boundary = label.len();
    for (idx, ch) in label.char_indices().rev() {
        if SUPERSCRIPTS.contains(ch) {
            boundary = idx;
        } else {
            break;
        }
    }
    label.split_at(boundary)
}

/// 拆出末尾的 `_{q}` 电荷记号
fn split_charge_token(raw: &str) -> (&str, Option<i32>) {
    use regex::Regex;

    let pattern = Regex::new(r"^(.+)_(-?\d+)$").unwrap();
    match pattern.captures(raw) {
        Some(caps) => {
            let base = caps.get(1).unwrap();
            let charge = caps.get(2).unwrap().as_str().parse::<i32>().ok();
            (&raw[base.range()], charge)
        }
        None => (raw, None),
    }
}

/// 解析缺陷种类标识，返回 (格式化主干, 位点编号)
fn parse_species(base: &str) -> Option<(String, Option<u32>)> {
    use regex::Regex;

    const EL: &str = "[A-Z][a-z]?";

    // 空位
    let vacancy = Regex::new(&format!(r"^v_({EL})$")).unwrap();
    if let Some(caps) = vacancy.captures(base) {
        return Some((format!("V_{}", &caps[1]), None));
    }
    let vacancy_site = Regex::new(&format!(r"^vac_(\d+)_({EL})$")).unwrap();
    if let Some(caps) = vacancy_site.captures(base) {
        return Some((format!("V_{}", &caps[2]), caps[1].parse().ok()));
    }

    // 间隙
    let interstitial = Regex::new(&format!(r"^({EL})_i$")).unwrap();
    if let Some(caps) = interstitial.captures(base) {
        return Some((format!("{}_i", &caps[1]), None));
    }
    let interstitial_site = Regex::new(&format!(r"^Int_({EL})_(\d+)$")).unwrap();
    if let Some(caps) = interstitial_site.captures(base) {
        return Some((format!("{}_i", &caps[1]), caps[2].parse().ok()));
    }

    // 替位/反位（带位点编号的旧式命名）
    let substitution_site = Regex::new(&format!(r"^(?:sub|as)_(\d+)_({EL})_on_({EL})$")).unwrap();
    if let Some(caps) = substitution_site.captures(base) {
        return Some((format!("{}_{}", &caps[2], &caps[3]), caps[1].parse().ok()));
    }
    let substitution = Regex::new(&format!(r"^({EL})_({EL})$")).unwrap();
    if let Some(caps) = substitution.captures(base) {
        return Some((format!("{}_{}", &caps[1], &caps[2]), None));
    }

    None
}

/// 电荷态的 Unicode 上标：`⁰`, `⁺`, `⁻`, `²⁺`, `²⁻`, …
fn superscript_charge(q: i32) -> String {
    if q == 0 {
        return "⁰".to_string();
    }

    let mut out = String::new();
    let magnitude = q.unsigned_abs();
    if magnitude != 1 {
        for digit in magnitude.to_string().chars() {
            let idx = digit.to_digit(10).unwrap() as usize;
            out.push(SUPERSCRIPTS.chars().nth(idx).unwrap());
        }
    }
    out.push(if q > 0 { '⁺' } else { '⁻' });
    out
}
