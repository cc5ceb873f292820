//! # 调色板
//!
//! 形成能线使用的命名调色板（matplotlib 的 Dark2 / tab10 / tab20 取色），
//! 以及带边着色与淡化线的固定颜色。缺陷种类多于调色板颜色数时循环取色，
//! 由调用方发出警告。
//!
//! ## 依赖关系
//! - 被 `commands/plot.rs`, `tld/plot.rs` 使用
//! - 使用 `plotters` 的 RGBColor

use plotters::style::RGBColor;

/// Dark2 调色板（8 色）
pub const DARK2: &[RGBColor] = &[
    RGBColor(27, 158, 119),
    RGBColor(217, 95, 2),
    RGBColor(117, 112, 179),
    RGBColor(231, 41, 138),
    RGBColor(102, 166, 30),
    RGBColor(230, 171, 2),
    RGBColor(166, 118, 29),
    RGBColor(102, 102, 102),
];

/// tab10 调色板（10 色）
pub const TAB10: &[RGBColor] = &[
    RGBColor(31, 119, 180),
    RGBColor(255, 127, 14),
    RGBColor(44, 160, 44),
    RGBColor(214, 39, 40),
    RGBColor(148, 103, 189),
    RGBColor(140, 86, 75),
    RGBColor(227, 119, 194),
    RGBColor(127, 127, 127),
    RGBColor(188, 189, 34),
    RGBColor(23, 190, 207),
];

/// tab20 调色板（20 色）
pub const TAB20: &[RGBColor] = &[
    RGBColor(31, 119, 180),
    RGBColor(174, 199, 232),
    RGBColor(255, 127, 14),
    RGBColor(255, 187, 120),
    RGBColor(44, 160, 44),
    RGBColor(152, 223, 138),
    RGBColor(214, 39, 40),
    RGBColor(255, 152, 150),
    RGBColor(148, 103, 189),
    RGBColor(197, 176, 213),
    RGBColor(140, 86, 75),
    RGBColor(196, 156, 148),
    RGBColor(227, 119, 194),
    RGBColor(247, 182, 210),
    RGBColor(127, 127, 127),
    RGBColor(199, 199, 199),
    RGBColor(188, 189, 34),
    RGBColor(219, 219, 141),
    RGBColor(23, 190, 207),
    RGBColor(158, 218, 229),
];

/// 淡化全条目线的灰色
pub const FADE_GREY: RGBColor = RGBColor(204, 204, 204);

/// 价带侧着色（蓝）
pub const VALENCE_BLUE: RGBColor = RGBColor(100, 143, 214);

/// 导带侧着色（橙）
pub const CONDUCTION_ORANGE: RGBColor = RGBColor(235, 151, 78);

/// 按序取色，超出调色板长度时循环
pub fn color_at(palette: &[RGBColor], index: usize) -> RGBColor {
    palette[index % palette.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_wraps_around() {
        assert_eq!(color_at(DARK2, 0), color_at(DARK2, DARK2.len()));
        assert_eq!(color_at(TAB10, 3), TAB10[3]);
    }
}
