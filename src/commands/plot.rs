//! # plot 子命令实现
//!
//! 从缺陷相图文档绘制形成能 vs 费米能级图。
//!
//! ## 功能
//! - 单一化学势映射或多 facet 循环（每个 facet 一幅图）
//! - 三种显示模式：稳定包络 / 全条目 / 淡化背景
//! - 自动 y 轴范围与图例去重
//! - 输出高质量图像 (PNG/SVG) 或线数据 (CSV)
//!
//! ## 依赖关系
//! - 使用 `cli/plot.rs` 定义的 PlotArgs
//! - 使用 `parsers/` 读取输入
//! - 使用 `tld/` 模块进行计算与绘制

use crate::cli::plot::{parse_axis_range, Colormap, DisplayMode, PlotArgs, PlotOutputFormat};
use crate::error::{DefectPlotError, Result};
use crate::models::chempots::chempot_caption;
use crate::models::{ChemPotSpec, ChemicalPotentials, DefectPhaseDiagram};
use crate::parsers;
use crate::tld::colors;
use crate::tld::envelope::{self, Polyline};
use crate::tld::export;
use crate::tld::labels;
use crate::tld::plot::{render_diagram, DiagramScene, SeriesLine, TlMarker};
use crate::tld::scale;
use crate::utils::{output, progress};

use plotters::style::RGBColor;
use std::path::{Path, PathBuf};

/// 执行绘图
pub fn execute(args: PlotArgs) -> Result<()> {
    output::print_header("Defect Formation Energy Diagram");

    if !args.input.is_file() {
        return Err(DefectPlotError::FileNotFound {
            path: args.input.display().to_string(),
        });
    }

    let diagram = parsers::diagram::parse_diagram_file(&args.input)?;
    output::print_info(&format!(
        "Loaded {} defect entries across {} species (band gap {:.3} eV)",
        diagram.entries.len(),
        diagram.transition_level_map.len(),
        diagram.band_gap
    ));

    let spec = match &args.chempots {
        Some(path) => Some(parsers::chempots::parse_chempots_file(path)?),
        None => None,
    };
    let manual_refs = match &args.elemental_refs {
        Some(path) => Some(parsers::chempots::parse_element_map_file(path)?),
        None => None,
    };

    // 化学势合理性检查（仅提示，不中断）
    match &spec {
        None => output::print_warning(
            "No chemical potentials specified, so chemical potentials are set to zero for \
             each species. This will give large errors in the absolute values of formation \
             energies, but the transition level positions will be unaffected.",
        ),
        Some(s) if args.facets.is_none() && manual_refs.is_none() && s.looks_formal() => {
            output::print_warning(
                "At least one of the manually-specified chemical potentials is close to zero, \
                 which is likely a formal chemical potential (i.e. relative to the elemental \
                 reference energies), but no elemental reference energies were given with \
                 --elemental-refs. This will give large errors in the absolute values of \
                 formation energies, but the transition level positions will be unaffected.",
            );
        }
        _ => {}
    }

    let format = resolve_format(&args);
    let jobs = resolve_jobs(&args, &diagram, spec, manual_refs)?;

    let pb = (jobs.len() > 1)
        .then(|| progress::create_progress_bar(jobs.len() as u64, "Rendering"));

    let mut written: Vec<PathBuf> = Vec::new();
    for job in &jobs {
        render_one(&diagram, &args, job, format)?;
        written.push(job.output.clone());
        if let Some(pb) = &pb {
            pb.inc(1);
        }
    }
    if let Some(pb) = pb {
        pb.finish_and_clear();
    }

    output::print_separator();
    for path in &written {
        output::print_success(&format!("Saved '{}'", path.display()));
    }

    Ok(())
}

/// 单幅图的绘制任务
struct PlotJob {
    title: Option<String>,
    potentials: Option<ChemicalPotentials>,
    elemental_refs: Option<ChemicalPotentials>,
    output: PathBuf,
}

/// 组装绘制任务：无化学势 / 单一映射 → 一幅图，facet 形式 → 每 facet 一幅
fn resolve_jobs(
    args: &PlotArgs,
    diagram: &DefectPhaseDiagram,
    spec: Option<ChemPotSpec>,
    manual_refs: Option<ChemicalPotentials>,
) -> Result<Vec<PlotJob>> {
    let default_title = args.title.clone().or_else(|| diagram.name.clone());

    let mut jobs = match spec {
        None => vec![PlotJob {
            title: default_title,
            potentials: None,
            elemental_refs: None,
            output: args.output.clone(),
        }],
        Some(ChemPotSpec::Absolute(pots)) => vec![PlotJob {
            title: default_title,
            potentials: Some(pots),
            elemental_refs: manual_refs,
            output: args.output.clone(),
        }],
        Some(ChemPotSpec::Facets {
            facets,
            elemental_refs,
        }) => {
            let selected: Vec<String> = match &args.facets {
                Some(list) => {
                    for name in list {
                        if !facets.contains_key(name) {
                            return Err(DefectPlotError::InvalidArgument(format!(
                                "unknown facet '{}'; available: {}",
                                name,
                                facets.keys().cloned().collect::<Vec<_>>().join(", ")
                            )));
                        }
                    }
                    list.clone()
                }
                None => facets.keys().cloned().collect(),
            };

            let multi = selected.len() > 1;
            selected
                .iter()
                .map(|facet| PlotJob {
                    title: Some(facet.clone()),
                    potentials: Some(facets[facet].clone()),
                    elemental_refs: Some(elemental_refs.clone()),
                    output: if multi {
                        facet_path(&args.output, facet)
                    } else {
                        args.output.clone()
                    },
                })
                .collect()
        }
    };

    // 单幅图时用户标题优先于 facet 名
    if jobs.len() == 1 {
        if let Some(title) = &args.title {
            jobs[0].title = Some(title.clone());
        }
    }

    Ok(jobs)
}

/// 绘制一幅图（或导出其线数据）
fn render_one(
    diagram: &DefectPhaseDiagram,
    args: &PlotArgs,
    job: &PlotJob,
    format: PlotOutputFormat,
) -> Result<()> {
    let pots = job.potentials.clone().unwrap_or_default();

    let xlim = match &args.xlim {
        Some(text) => parse_axis_range(text)?,
        None => (-0.3, diagram.band_gap + 0.3),
    };

    let lines = envelope::build_lines(diagram, &pots, xlim)?;

    for species in &lines.below_zero_species {
        output::print_warning(&format!(
            "All formation energies for {} are below zero across the entire band gap \
             range. This is typically unphysical, and likely due to mis-specification \
             of chemical potentials.",
            species
        ));
    }

    let all_mode = args.display == DisplayMode::All;
    let plotted: &[(String, Polyline)] = if all_mode { &lines.all } else { &lines.stable };

    if format == PlotOutputFormat::Csv {
        return export::lines_to_csv(plotted, &job.output);
    }

    let names: Vec<String> = plotted.iter().map(|(name, _)| name.clone()).collect();
    let legend = labels::format_legend(&names, all_mode);

    let palette = palette_for(args.colormap);
    if plotted.len() > palette.len() {
        output::print_warning(&format!(
            "The chosen colormap '{}' only has {} colours, yet there are {} defect lines \
             to plot, so line colours will repeat. Recommended to set --colormap to \
             'tab10' or 'tab20'.",
            args.colormap,
            palette.len(),
            plotted.len()
        ));
    }

    let range_vals = if all_mode {
        &lines.all_range_vals
    } else {
        &lines.stable_range_vals
    };
    let ylim = match &args.ylim {
        Some(text) => parse_axis_range(text)?,
        None => scale::compute_ylim(range_vals, lines.ymin_floor, args.auto_labels),
    };

    let series: Vec<SeriesLine> = plotted
        .iter()
        .zip(&legend)
        .enumerate()
        .map(|(i, ((name, line), label))| SeriesLine {
            legend: label.clone(),
            line: line.clone(),
            color: colors::color_at(palette, i),
            markers: if all_mode {
                Vec::new()
            } else {
                species_markers(diagram, name, line)
            },
        })
        .collect();

    let faded = if args.display == DisplayMode::Faded {
        lines.all.iter().map(|(_, line)| line.clone()).collect()
    } else {
        Vec::new()
    };

    let caption = match (&job.potentials, args.no_chempot_caption) {
        (Some(pots), false) => Some(chempot_caption(pots, job.elemental_refs.as_ref())),
        _ => None,
    };

    let scene = DiagramScene {
        title: job.title.clone(),
        chempot_caption: caption,
        band_gap: diagram.band_gap,
        xlim,
        ylim,
        fermi_level: args.fermi_level,
        series,
        faded,
        auto_labels: args.auto_labels,
    };

    render_diagram(
        &scene,
        &job.output,
        args.width,
        args.height,
        format == PlotOutputFormat::Svg,
    )
}

/// 包络线内部顶点即断点（加载时已按费米能级升序排序）
fn species_markers(
    diagram: &DefectPhaseDiagram,
    species: &str,
    line: &Polyline,
) -> Vec<TlMarker> {
    let levels = match diagram.transition_level_map.get(species) {
        Some(levels) if !levels.is_empty() => levels,
        _ => return Vec::new(),
    };

    levels
        .iter()
        .enumerate()
        .map(|(i, level)| TlMarker {
            fermi: line.fermi[i + 1],
            energy: line.energy[i + 1],
            label: level.label(),
            align_right: level.upper_charge().unwrap_or(0) > 0,
        })
        .collect()
}

/// 输出格式：显式指定优先，否则按扩展名推断
fn resolve_format(args: &PlotArgs) -> PlotOutputFormat {
    args.format.unwrap_or_else(|| {
        let ext = args
            .output
            .extension()
            .and_then(|e| e.to_str())
            .map(|s| s.to_lowercase());
        match ext.as_deref() {
            Some("svg") => PlotOutputFormat::Svg,
            Some("csv") => PlotOutputFormat::Csv,
            _ => PlotOutputFormat::Png,
        }
    })
}

fn palette_for(colormap: Colormap) -> &'static [RGBColor] {
    match colormap {
        Colormap::Dark2 => colors::DARK2,
        Colormap::Tab10 => colors::TAB10,
        Colormap::Tab20 => colors::TAB20,
    }
}

/// 在扩展名之前插入 facet 名："plot.png" + "Cd-rich" → "plot_Cd-rich.png"
fn facet_path(base: &Path, facet: &str) -> PathBuf {
    let stem = base
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("formation_energy");
    let name = match base.extension().and_then(|e| e.to_str()) {
        Some(ext) => format!("{}_{}.{}", stem, facet, ext),
        None => format!("{}_{}", stem, facet),
    };
    base.with_file_name(name)
}
