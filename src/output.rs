use crate::aggregate::{
    selected_impact, top_benefit, top_n_by_reference, top_n_by_selected_impact, AreaScore,
    TopBenefit,
};
use crate::error::Result;
use crate::index::{DatasetIndex, IndexMeta};
use crate::reports::{DashboardView, MainChart, Series};
use crate::types::{
    Benefit, ChartType, ExportAreaRow, RankedAreaRow, SelectionState, SeriesRow, StatCardRow,
};
use crate::util::{format_int, format_number};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tabled::{settings::Style, Table, Tabled};
use tracing::info;

pub const COMPARISON_FILE: &str = "top_areas_by_total_impact.csv";
pub const SELECTED_FILE: &str = "top_areas_by_selected_impact.csv";
pub const SUMMARY_FILE: &str = "summary.json";

pub fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    for r in rows {
        wtr.serialize(r)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let s = serde_json::to_string_pretty(value)?;
    std::fs::write(path, s)?;
    Ok(())
}

pub fn preview_table_rows<T>(rows: &[T], max_rows: usize)
where
    T: Tabled + Clone,
{
    let slice: Vec<T> = rows.iter().cloned().take(max_rows).collect();
    if slice.is_empty() {
        println!("(no rows)\n");
        return;
    }
    let table_str = Table::new(slice).with(Style::markdown()).to_string();
    println!("{}\n", table_str);
}

fn series_rows(series: &Series) -> Vec<SeriesRow> {
    series
        .labels
        .iter()
        .zip(&series.values)
        .map(|(label, value)| SeriesRow {
            label: label.clone(),
            value: format_number(*value, 3),
        })
        .collect()
}

fn ranked_rows(series: &Series) -> Vec<RankedAreaRow> {
    series
        .labels
        .iter()
        .zip(&series.values)
        .enumerate()
        .map(|(i, (area, value))| RankedAreaRow {
            rank: i + 1,
            area: area.clone(),
            value: format_number(*value, 3),
        })
        .collect()
}

pub fn stat_card_rows(view: &DashboardView) -> Vec<StatCardRow> {
    let s = &view.stats;
    vec![
        StatCardRow {
            title: "Rows Loaded".into(),
            value: format_int(s.rows),
            label: "Data records".into(),
        },
        StatCardRow {
            title: "Total Impact".into(),
            value: format_number(s.total_impact, 2),
            label: "Dataset reference metric".into(),
        },
        StatCardRow {
            title: "Selected Impact".into(),
            value: format_number(s.selected_impact, 2),
            label: "From chosen co-benefits".into(),
        },
        StatCardRow {
            title: "Active Benefits".into(),
            value: s.active_benefits.to_string(),
            label: "Selected categories".into(),
        },
        StatCardRow {
            title: "Top Benefit".into(),
            value: s
                .top_benefit
                .map(|t| t.benefit.label().to_string())
                .unwrap_or_else(|| "-".to_string()),
            label: "Highest contribution".into(),
        },
    ]
}

/// Terminal rendition of one refresh.
pub fn print_dashboard(view: &DashboardView, max_rows: usize) {
    println!("[{}]", view.mode);
    for line in &view.region_info {
        println!("  {}", line);
    }
    println!();
    preview_table_rows(&stat_card_rows(view), usize::MAX);

    println!("{}\n", view.title);
    match &view.main {
        MainChart::Bar(series) | MainChart::Pie(series) => {
            preview_table_rows(&series_rows(series), usize::MAX)
        }
        MainChart::Heatmap { areas, benefits, z } => {
            for (benefit, row) in benefits.iter().zip(z) {
                let cells: Vec<String> = areas
                    .iter()
                    .zip(row)
                    .take(max_rows)
                    .map(|(a, v)| format!("{}={}", a, format_number(*v, 2)))
                    .collect();
                println!("  {}: {}", benefit, cells.join(", "));
            }
            println!();
        }
        MainChart::Scatter { x_benefit, y_benefit, points } => {
            println!("  x = {}, y = {}", x_benefit.label(), y_benefit.label());
            for p in points.iter().take(max_rows) {
                println!(
                    "  {}: ({}, {})",
                    p.area_id,
                    format_number(p.x, 3),
                    format_number(p.y, 3)
                );
            }
            println!();
        }
    }

    println!("{}\n", view.comparison.name);
    preview_table_rows(&ranked_rows(&view.comparison), max_rows);
    println!("{}\n", view.detail.name);
    preview_table_rows(&series_rows(&view.detail), max_rows);

    println!("Takeaways:");
    for t in &view.takeaways {
        println!("  - {}", t);
    }
    println!();
}

#[derive(Debug, Serialize)]
pub struct SummaryExport {
    pub generated_at: DateTime<Utc>,
    pub meta: IndexMeta,
    pub region: String,
    pub selected_benefits: Vec<Benefit>,
    pub top_n: usize,
    pub chart: ChartType,
    pub selected_impact: Option<f64>,
    pub top_benefit: Option<TopBenefit>,
}

#[derive(Debug, Clone)]
pub struct ExportPaths {
    pub comparison: PathBuf,
    pub selected: PathBuf,
    pub summary: PathBuf,
}

fn export_rows(scores: &[AreaScore]) -> Vec<ExportAreaRow> {
    scores
        .iter()
        .enumerate()
        .map(|(i, s)| ExportAreaRow {
            rank: i + 1,
            area: s.area_id.clone(),
            value: s.value,
        })
        .collect()
}

/// Writes both Top-N rankings and a JSON summary of the current view into
/// `out_dir`. Needs a non-empty selection.
pub fn export_reports(
    out_dir: &Path,
    index: &DatasetIndex,
    selection: &SelectionState,
) -> Result<ExportPaths> {
    let top_n = selection.top_n();
    let by_selected = top_n_by_selected_impact(index, selection, top_n)?;
    let by_reference = top_n_by_reference(index, top_n);

    std::fs::create_dir_all(out_dir)?;
    let paths = ExportPaths {
        comparison: out_dir.join(COMPARISON_FILE),
        selected: out_dir.join(SELECTED_FILE),
        summary: out_dir.join(SUMMARY_FILE),
    };

    write_csv(&paths.comparison, &export_rows(&by_reference))?;
    write_csv(&paths.selected, &export_rows(&by_selected))?;

    let summary = SummaryExport {
        generated_at: Utc::now(),
        meta: index.meta().clone(),
        region: selection.region.to_string(),
        selected_benefits: selection.selected_benefits().to_vec(),
        top_n,
        chart: selection.chart,
        selected_impact: selected_impact(index, selection)?,
        top_benefit: top_benefit(index, selection, &selection.region),
    };
    write_json(&paths.summary, &summary)?;

    info!(dir = %out_dir.display(), rows = by_reference.len(), "reports exported");
    Ok(paths)
}
