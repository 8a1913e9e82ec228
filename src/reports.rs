use crate::aggregate::{
    benefit_breakdown, reference_total, selected_impact, top_benefit, top_n_by_reference,
    AreaScore, TopBenefit,
};
use crate::error::Result;
use crate::index::{DatasetIndex, IndexMeta};
use crate::types::{Benefit, ChartType, Region, SelectionState};
use crate::util::{format_int, format_number};
use serde::Serialize;

/// Areas sampled by the heatmap and scatter views.
pub const SAMPLE_CAP: usize = 50;
/// Bars in the overview detail chart.
pub const DETAIL_TOP: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    pub name: String,
    pub labels: Vec<String>,
    pub values: Vec<f64>,
}

impl Series {
    fn from_benefits(name: impl Into<String>, rows: &[(Benefit, f64)]) -> Self {
        Self {
            name: name.into(),
            labels: rows.iter().map(|(b, _)| b.label().to_string()).collect(),
            values: rows.iter().map(|(_, v)| *v).collect(),
        }
    }

    fn from_scores(name: impl Into<String>, scores: &[AreaScore]) -> Self {
        Self {
            name: name.into(),
            labels: scores.iter().map(|s| s.area_id.clone()).collect(),
            values: scores.iter().map(|s| s.value).collect(),
        }
    }

    fn clamped(mut self) -> Self {
        for v in &mut self.values {
            *v = v.max(0.0);
        }
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScatterPoint {
    pub area_id: String,
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum MainChart {
    Bar(Series),
    /// Negative slices are clamped to zero.
    Pie(Series),
    /// `z[benefit][area]`.
    Heatmap {
        areas: Vec<String>,
        benefits: Vec<String>,
        z: Vec<Vec<f64>>,
    },
    Scatter {
        x_benefit: Benefit,
        y_benefit: Benefit,
        points: Vec<ScatterPoint>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatCards {
    pub rows: usize,
    pub total_impact: f64,
    pub selected_impact: f64,
    pub active_benefits: usize,
    pub top_benefit: Option<TopBenefit>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardView {
    pub mode: &'static str,
    pub title: String,
    pub main: MainChart,
    pub comparison: Series,
    pub detail: Series,
    pub stats: StatCards,
    pub region_info: Vec<String>,
    pub takeaways: Vec<String>,
}

pub fn mode_badge(region: &Region) -> &'static str {
    if region.is_all() {
        "Overview Mode"
    } else {
        "Detail Mode"
    }
}

pub fn footer_meta(meta: &IndexMeta) -> String {
    format!(
        "Loaded {} rows | Total Impact (all) = {} | Range: [{} … {}]",
        format_int(meta.rows),
        format_number(meta.sum_total, 2),
        format_number(meta.sum_min, 2),
        format_number(meta.sum_max, 2)
    )
}

/// Everything one refresh renders. Fails with `EmptySelection` when no
/// benefit is selected, since none of the charts would mean anything.
pub fn build_dashboard(index: &DatasetIndex, selection: &SelectionState) -> Result<DashboardView> {
    let region = &selection.region;
    let top_n = selection.top_n();

    let (title, main) = match region {
        Region::All => (
            main_title(selection.chart),
            overview_chart(index, selection)?,
        ),
        Region::Area(id) => {
            let rows = benefit_breakdown(index, selection, region)?.unwrap_or_default();
            let series = Series::from_benefits("Selected Impact", &rows);
            let chart = match selection.chart {
                ChartType::Pie => MainChart::Pie(series.clamped()),
                _ => MainChart::Bar(series),
            };
            (format!("Breakdown for {} (Selected Impact)", id), chart)
        }
    };

    let comparison = Series::from_scores(
        format!("Top-{} Areas by Total Impact", top_n),
        &top_n_by_reference(index, top_n),
    );

    let impact = selected_impact(index, selection)?.unwrap_or(0.0);
    let total = reference_total(index, region).unwrap_or(0.0);

    let detail = match region {
        Region::All => Series::from_scores(
            "Top 10 Areas (Total Impact)",
            &top_n_by_reference(index, DETAIL_TOP),
        ),
        Region::Area(id) => Series {
            name: format!("Impact Summary for {}", id),
            labels: vec!["Total Impact (sum)".into(), "Selected Impact".into()],
            values: vec![total, impact],
        },
    };

    let top = top_benefit(index, selection, region);
    let stats = StatCards {
        rows: index.meta().rows,
        total_impact: total,
        selected_impact: impact,
        active_benefits: selection.selected_benefits().len(),
        top_benefit: top,
    };

    Ok(DashboardView {
        mode: mode_badge(region),
        title,
        main,
        comparison,
        detail,
        stats,
        region_info: region_info(index, selection)?,
        takeaways: takeaways(index, selection, top, total, impact),
    })
}

fn main_title(chart: ChartType) -> String {
    match chart {
        ChartType::Heatmap => "Heatmap (Top-N Areas x Benefits)".into(),
        ChartType::Scatter => "Scatter (Top-N Areas by sum)".into(),
        ChartType::Bar | ChartType::Pie => "Overview of Co-benefits (Selected Impact)".into(),
    }
}

fn overview_chart(index: &DatasetIndex, selection: &SelectionState) -> Result<MainChart> {
    let rows = benefit_breakdown(index, selection, &Region::All)?.unwrap_or_default();
    let series = Series::from_benefits("Selected Impact", &rows);
    let benefits = selection.selected_benefits();
    let sample = top_n_by_reference(index, selection.top_n().min(SAMPLE_CAP));

    let chart = match selection.chart {
        ChartType::Bar => MainChart::Bar(series),
        ChartType::Pie => MainChart::Pie(series.clamped()),
        ChartType::Heatmap => {
            let z: Vec<Vec<f64>> = benefits
                .iter()
                .map(|&b| sample.iter().map(|s| area_value(index, &s.area_id, b)).collect())
                .collect();
            MainChart::Heatmap {
                areas: sample.iter().map(|s| s.area_id.clone()).collect(),
                benefits: benefits.iter().map(|b| b.label().to_string()).collect(),
                z,
            }
        }
        ChartType::Scatter => match benefits {
            [bx, by, ..] => MainChart::Scatter {
                x_benefit: *bx,
                y_benefit: *by,
                points: sample
                    .iter()
                    .map(|s| ScatterPoint {
                        area_id: s.area_id.clone(),
                        x: area_value(index, &s.area_id, *bx),
                        y: area_value(index, &s.area_id, *by),
                    })
                    .collect(),
            },
            _ => MainChart::Bar(series),
        },
    };
    Ok(chart)
}

fn area_value(index: &DatasetIndex, area_id: &str, benefit: Benefit) -> f64 {
    index
        .area(area_id)
        .map(|r| r.benefit_values[benefit])
        .unwrap_or(0.0)
}

fn region_info(index: &DatasetIndex, selection: &SelectionState) -> Result<Vec<String>> {
    let lines = match &selection.region {
        Region::All => vec![
            "Showing All Areas".to_string(),
            "Total Impact uses the dataset sum (ranking Top-N).".to_string(),
            "Selected Impact uses the chosen co-benefit columns.".to_string(),
        ],
        Region::Area(id) => match index.area(id) {
            None => vec!["Area not found in loaded data".to_string()],
            Some(record) => {
                let impact = selected_impact(index, selection)?.unwrap_or(0.0);
                vec![
                    id.clone(),
                    format!("Total Impact (sum): {}", format_number(record.reference_total, 3)),
                    format!("Selected Impact: {}", format_number(impact, 3)),
                ]
            }
        },
    };
    Ok(lines)
}

fn takeaways(
    index: &DatasetIndex,
    selection: &SelectionState,
    top: Option<TopBenefit>,
    total: f64,
    impact: f64,
) -> Vec<String> {
    let first = match top {
        Some(t) => format!(
            "Top co-benefit contribution is \"{}\" (based on current view).",
            t.benefit.label()
        ),
        None => "Select at least one co-benefit category to see insights.".to_string(),
    };
    let second = match top_n_by_reference(index, 1).first() {
        Some(s) => format!(
            "Highest Total Impact area is \"{}\" with Total Impact = {}.",
            s.area_id,
            format_number(s.value, 3)
        ),
        None => "Top area could not be computed.".to_string(),
    };
    let third = match &selection.region {
        Region::All => format!(
            "Overview charts aggregate all areas; comparison charts show Top-{} by dataset sum.",
            selection.top_n()
        ),
        Region::Area(id) => format!(
            "For \"{}\": Total Impact (sum) = {}, Selected Impact = {}.",
            id,
            format_number(total, 3),
            format_number(impact, 3)
        ),
    };
    vec![first, second, third]
}
