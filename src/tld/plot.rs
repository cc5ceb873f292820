//! # 转变能级图绘制
//!
//! 使用 `plotters` 库生成高质量缺陷形成能图。
//!
//! ## 功能
//! - 论文级别的图表质量
//! - 稳定包络线 / 全条目线 / 淡化背景线
//! - 转变能级标记与可选 `ε(q₁/q₂)` 标注
//! - 带边渐变着色、化学势标注、参考费米能级虚线
//! - 支持 PNG 和 SVG 输出
//!
//! ## 依赖关系
//! - 被 `commands/plot.rs` 调用
//! - 使用 `tld/envelope.rs` 的 Polyline、`tld/colors.rs` 的调色板
//! - 使用 `plotters` 渲染图表

use crate::error::{DefectPlotError, Result};
use crate::tld::colors;
use crate::tld::envelope::Polyline;

use plotters::coord::cartesian::Cartesian2d;
use plotters::coord::types::RangedCoordf64;
use plotters::prelude::*;
use plotters::series::DashedLineSeries;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use std::path::Path;

/// 带边着色的渐变条带数
const SHADE_STRIPS: usize = 48;

/// 带边着色在带边处的最大不透明度
const SHADE_MAX_ALPHA: f64 = 0.28;

/// 转变能级标记
#[derive(Debug, Clone)]
pub struct TlMarker {
    /// 断点费米能级 (eV)
    pub fermi: f64,
    /// 断点处形成能 (eV)
    pub energy: f64,
    /// 标注文字，如 `ε(+1/0)`
    pub label: String,
    /// 上方电荷态为正时右对齐
    pub align_right: bool,
}

/// 一条带图例的形成能线
#[derive(Debug, Clone)]
pub struct SeriesLine {
    pub legend: String,
    pub line: Polyline,
    pub color: RGBColor,
    pub markers: Vec<TlMarker>,
}

/// 一幅图的全部绘制数据
#[derive(Debug, Clone)]
pub struct DiagramScene {
    /// 图标题（facet 名或用户指定）
    pub title: Option<String>,
    /// 化学势标注行，绘制在图区顶部
    pub chempot_caption: Option<String>,
    /// 带隙 (eV)
    pub band_gap: f64,
    pub xlim: (f64, f64),
    pub ylim: (f64, f64),
    /// 参考费米能级竖线
    pub fermi_level: Option<f64>,
    /// 带图例的形成能线
    pub series: Vec<SeriesLine>,
    /// 淡化背景线（不进图例）
    pub faded: Vec<Polyline>,
    /// 是否标注转变能级文字
    pub auto_labels: bool,
}

type Chart2d<'a, DB> = ChartContext<'a, DB, Cartesian2d<RangedCoordf64, RangedCoordf64>>;

/// 渲染缺陷形成能图
pub fn render_diagram(
    scene: &DiagramScene,
    output_path: &Path,
    width: u32,
    height: u32,
    use_svg: bool,
) -> Result<()> {
    if use_svg {
        let root = SVGBackend::new(output_path, (width, height)).into_drawing_area();
        draw_diagram(&root, scene)?;
        root.present()
            .map_err(|e| DefectPlotError::RenderError(e.to_string()))?;
    } else {
        let root = BitMapBackend::new(output_path, (width, height)).into_drawing_area();
        draw_diagram(&root, scene)?;
        root.present()
            .map_err(|e| DefectPlotError::RenderError(e.to_string()))?;
    }
    Ok(())
}

/// 绘制图表的核心逻辑
fn draw_diagram<DB: DrawingBackend>(
    root: &DrawingArea<DB, plotters::coord::Shift>,
    scene: &DiagramScene,
) -> Result<()>
where
    DB::ErrorType: 'static,
{
    root.fill(&WHITE).map_err(render_err)?;

    let (x0, x1) = scene.xlim;
    let (y0, y1) = scene.ylim;

    let mut builder = ChartBuilder::on(root);
    builder
        .margin(30)
        .x_label_area_size(50)
        .y_label_area_size(60);
    if let Some(title) = &scene.title {
        builder.caption(title, ("sans-serif", 26).into_font());
    }
    let mut chart = builder
        .build_cartesian_2d(x0..x1, y0..y1)
        .map_err(render_err)?;

    chart
        .configure_mesh()
        .disable_mesh()
        .x_labels(5)
        .y_labels(5)
        .x_desc("Fermi Level (eV)")
        .y_desc("Formation Energy (eV)")
        .x_label_style(("sans-serif", 16))
        .y_label_style(("sans-serif", 16))
        .axis_desc_style(("sans-serif", 18))
        .draw()
        .map_err(render_err)?;

    draw_band_edge_shading(&mut chart, scene)?;

    // 淡化全条目线（不进图例）
    for line in &scene.faded {
        chart
            .draw_series(LineSeries::new(
                line.points(),
                colors::FADE_GREY.mix(0.5).stroke_width(2),
            ))
            .map_err(render_err)?;
    }

    // E_f = 0 基准线（y 轴下限为负时仍可见）
    chart
        .draw_series(LineSeries::new(
            [(x0, 0.0), (x1, 0.0)],
            BLACK.stroke_width(1),
        ))
        .map_err(render_err)?;

    // 形成能线
    for series in &scene.series {
        let color = series.color;
        chart
            .draw_series(LineSeries::new(series.line.points(), color.stroke_width(2)))
            .map_err(render_err)?
            .label(series.legend.as_str())
            .legend(move |(x, y)| {
                PathElement::new(vec![(x, y), (x + 18, y)], color.stroke_width(2))
            });
    }

    // 转变能级标记与标注
    for series in &scene.series {
        if series.markers.is_empty() {
            continue;
        }
        chart
            .draw_series(
                series
                    .markers
                    .iter()
                    .map(|m| Circle::new((m.fermi, m.energy), 4, series.color.filled())),
            )
            .map_err(render_err)?;

        if scene.auto_labels {
            draw_marker_labels(&mut chart, scene, &series.markers)?;
        }
    }

    // 参考费米能级
    if let Some(fermi) = scene.fermi_level {
        chart
            .draw_series(DashedLineSeries::new(
                [(fermi, y0), (fermi, y1)],
                6,
                4,
                BLACK.stroke_width(1),
            ))
            .map_err(render_err)?;
    }

    // 化学势标注行，绘制在图区顶部左侧
    if let Some(caption) = &scene.chempot_caption {
        let pos = (x0 + 0.02 * (x1 - x0), y1 - 0.04 * (y1 - y0));
        chart
            .draw_series(std::iter::once(Text::new(
                caption.clone(),
                pos,
                ("sans-serif", 14).into_font().color(&BLACK),
            )))
            .map_err(render_err)?;
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperRight)
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()
        .map_err(render_err)?;

    Ok(())
}

/// 带边渐变着色：价带侧蓝色、导带侧橙色，带边处最深向外淡出
fn draw_band_edge_shading<DB: DrawingBackend>(
    chart: &mut Chart2d<'_, DB>,
    scene: &DiagramScene,
) -> Result<()>
where
    DB::ErrorType: 'static,
{
    let (x0, x1) = scene.xlim;
    let (y0, y1) = scene.ylim;

    // 价带侧：x ∈ [xlim.0, 0]，VBM 处最深
    if x0 < 0.0 {
        let edge = x1.min(0.0);
        let width = edge - x0;
        for i in 0..SHADE_STRIPS {
            let a = x0 + width * i as f64 / SHADE_STRIPS as f64;
            let b = x0 + width * (i + 1) as f64 / SHADE_STRIPS as f64;
            let alpha = SHADE_MAX_ALPHA * (i + 1) as f64 / SHADE_STRIPS as f64;
            chart
                .draw_series(std::iter::once(Rectangle::new(
                    [(a, y0), (b, y1)],
                    colors::VALENCE_BLUE.mix(alpha).filled(),
                )))
                .map_err(render_err)?;
        }
    }

    // 导带侧：x ∈ [带隙, xlim.1]，CBM 处最深
    if x1 > scene.band_gap {
        let edge = x0.max(scene.band_gap);
        let width = x1 - edge;
        for i in 0..SHADE_STRIPS {
            let a = edge + width * i as f64 / SHADE_STRIPS as f64;
            let b = edge + width * (i + 1) as f64 / SHADE_STRIPS as f64;
            let alpha = SHADE_MAX_ALPHA * (SHADE_STRIPS - i) as f64 / SHADE_STRIPS as f64;
            chart
                .draw_series(std::iter::once(Rectangle::new(
                    [(a, y0), (b, y1)],
                    colors::CONDUCTION_ORANGE.mix(alpha).filled(),
                )))
                .map_err(render_err)?;
        }
    }

    Ok(())
}

/// 转变能级文字标注，偏移在标记上方，越界不绘制
fn draw_marker_labels<DB: DrawingBackend>(
    chart: &mut Chart2d<'_, DB>,
    scene: &DiagramScene,
    markers: &[TlMarker],
) -> Result<()>
where
    DB::ErrorType: 'static,
{
    let (x0, x1) = scene.xlim;
    let (y0, y1) = scene.ylim;
    let dy = 0.02 * (y1 - y0);

    for marker in markers {
        let (x, y) = (marker.fermi, marker.energy + dy);
        if !(x0..=x1).contains(&x) || !(y0..=y1).contains(&y) {
            continue;
        }

        let h_pos = if marker.align_right {
            HPos::Right
        } else {
            HPos::Left
        };
        let style = ("sans-serif", 14)
            .into_font()
            .color(&BLACK)
            .pos(Pos::new(h_pos, VPos::Bottom));

        chart
            .draw_series(std::iter::once(Text::new(marker.label.clone(), (x, y), style)))
            .map_err(render_err)?;
    }

    Ok(())
}

fn render_err<E: std::fmt::Debug>(e: E) -> DefectPlotError {
    DefectPlotError::RenderError(format!("{:?}", e))
}
