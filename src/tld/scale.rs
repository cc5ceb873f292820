//! # y 轴范围计算
//!
//! 由费米窗口内的形成能采样值推导 y 轴范围：顶部留 10% 余量，开启自动
//! 标注时进一步加宽为最大值的 1.17 倍，给转变能级文字留出空间。
//!
//! ## 依赖关系
//! - 被 `commands/plot.rs` 调用

/// 计算 y 轴范围 (ymin, ymax)
///
/// `ymin` 默认 0，被全负包络的最小采样值压低（见 `envelope::LineData`）。
///
/// 前置条件：`range_vals` 至少包含窗口两端的两个采样值。空输入不会
/// panic，但返回无意义的非有限值。
pub fn compute_ylim(range_vals: &[f64], ymin: f64, auto_labels: bool) -> (f64, f64) {
    let max_val = range_vals.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let min_val = range_vals.iter().copied().fold(f64::INFINITY, f64::min);

    let window = max_val - min_val;
    let spacer = 0.1 * window;
    let mut ymax = max_val + spacer;

    // 标注文字不能越过坐标轴，余量比例不足时加宽
    if auto_labels && spacer / ymax < 0.145 {
        ymax = max_val * 1.17;
    }

    (ymin, ymax)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ylim_headroom() {
        let (ymin, ymax) = compute_ylim(&[0.0, 2.0], 0.0, false);
        assert_eq!(ymin, 0.0);
        assert!((ymax - 2.2).abs() < 1e-12);
    }

    #[test]
    fn test_ylim_auto_label_widening() {
        // spacer = 0.1, 0.1/1.1 ≈ 0.091 < 0.145 => ymax = 1.17
        let (_, ymax) = compute_ylim(&[0.0, 1.0], 0.0, true);
        assert!((ymax - 1.17).abs() < 1e-12);
    }

    #[test]
    fn test_ylim_auto_label_keeps_wide_spacer() {
        // spacer = 1.0, 1.0/6.0 ≈ 0.167 >= 0.145 => 不加宽
        let (_, ymax) = compute_ylim(&[-5.0, 5.0], 0.0, true);
        assert!((ymax - 6.0).abs() < 1e-12);
    }

    #[test]
    fn test_ylim_lowered_floor() {
        let (ymin, _) = compute_ylim(&[0.0, 2.0], -1.5, false);
        assert!((ymin + 1.5).abs() < 1e-12);
    }
}
