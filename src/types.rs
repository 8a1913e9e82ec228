use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Index, IndexMut};
use tabled::Tabled;

/// Top-N used when the configured or typed value is unusable.
pub const DEFAULT_TOP_N: usize = 30;

/// The eleven fixed co-benefit categories, in dataset column order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Benefit {
    AirQuality,
    Congestion,
    Dampness,
    DietChange,
    ExcessCold,
    ExcessHeat,
    HassleCosts,
    Noise,
    PhysicalActivity,
    RoadRepairs,
    RoadSafety,
}

impl Benefit {
    pub const COUNT: usize = 11;

    pub const ALL: [Benefit; Benefit::COUNT] = [
        Benefit::AirQuality,
        Benefit::Congestion,
        Benefit::Dampness,
        Benefit::DietChange,
        Benefit::ExcessCold,
        Benefit::ExcessHeat,
        Benefit::HassleCosts,
        Benefit::Noise,
        Benefit::PhysicalActivity,
        Benefit::RoadRepairs,
        Benefit::RoadSafety,
    ];

    /// Column name in the input file.
    pub fn key(self) -> &'static str {
        match self {
            Benefit::AirQuality => "air_quality",
            Benefit::Congestion => "congestion",
            Benefit::Dampness => "dampness",
            Benefit::DietChange => "diet_change",
            Benefit::ExcessCold => "excess_cold",
            Benefit::ExcessHeat => "excess_heat",
            Benefit::HassleCosts => "hassle_costs",
            Benefit::Noise => "noise",
            Benefit::PhysicalActivity => "physical_activity",
            Benefit::RoadRepairs => "road_repairs",
            Benefit::RoadSafety => "road_safety",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Benefit::AirQuality => "Air Quality",
            Benefit::Congestion => "Congestion",
            Benefit::Dampness => "Dampness",
            Benefit::DietChange => "Diet Change",
            Benefit::ExcessCold => "Excess Cold",
            Benefit::ExcessHeat => "Excess Heat",
            Benefit::HassleCosts => "Hassle Costs",
            Benefit::Noise => "Noise",
            Benefit::PhysicalActivity => "Physical Activity",
            Benefit::RoadRepairs => "Road Repairs",
            Benefit::RoadSafety => "Road Safety",
        }
    }

    /// Accepts either the column key (`air_quality`) or the display label
    /// (`Air Quality`), case-insensitively.
    pub fn from_key(s: &str) -> Option<Benefit> {
        let s = s.trim();
        Benefit::ALL
            .into_iter()
            .find(|b| b.key().eq_ignore_ascii_case(s) || b.label().eq_ignore_ascii_case(s))
    }

    fn slot(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Benefit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One score per benefit category. Missing categories read as `0.0`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BenefitValues([f64; Benefit::COUNT]);

impl BenefitValues {
    /// Element-wise accumulation, used to fold area scores into dataset totals.
    pub fn accumulate(&mut self, other: &BenefitValues) {
        for (slot, value) in self.0.iter_mut().zip(other.0.iter()) {
            *slot += value;
        }
    }

    pub fn total(&self) -> f64 {
        self.0.iter().sum()
    }
}

impl Index<Benefit> for BenefitValues {
    type Output = f64;

    fn index(&self, benefit: Benefit) -> &f64 {
        &self.0[benefit.slot()]
    }
}

impl IndexMut<Benefit> for BenefitValues {
    fn index_mut(&mut self, benefit: Benefit) -> &mut f64 {
        &mut self.0[benefit.slot()]
    }
}

/// One data line of the input, keyed by header name in header order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawRow {
    fields: Vec<(String, String)>,
}

impl RawRow {
    pub fn new(fields: Vec<(String, String)>) -> Self {
        Self { fields }
    }

    /// Value of the named column. With duplicated header names the rightmost
    /// column wins.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .rev()
            .find(|(header, _)| header == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// A small area with its per-benefit scores and the dataset's `sum` column.
#[derive(Debug, Clone, PartialEq)]
pub struct AreaRecord {
    pub area_id: String,
    pub benefit_values: BenefitValues,
    pub reference_total: f64,
}

/// Scope of the current view.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Region {
    #[default]
    All,
    Area(String),
}

impl Region {
    /// `"all"` (any case) or a blank string selects every region.
    pub fn parse(s: &str) -> Region {
        let s = s.trim();
        if s.is_empty() || s.eq_ignore_ascii_case("all") {
            Region::All
        } else {
            Region::Area(s.to_string())
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, Region::All)
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Region::All => f.write_str("all"),
            Region::Area(id) => f.write_str(id),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartType {
    #[default]
    Bar,
    Pie,
    Heatmap,
    Scatter,
}

impl ChartType {
    pub fn parse(s: &str) -> Option<ChartType> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bar" => Some(ChartType::Bar),
            "pie" => Some(ChartType::Pie),
            "heatmap" => Some(ChartType::Heatmap),
            "scatter" => Some(ChartType::Scatter),
            _ => None,
        }
    }
}

/// What the user is currently looking at. Owned by the control layer and
/// handed to the aggregation queries by reference.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionState {
    pub region: Region,
    benefits: Vec<Benefit>,
    top_n: usize,
    pub chart: ChartType,
}

impl Default for SelectionState {
    fn default() -> Self {
        Self::new(DEFAULT_TOP_N)
    }
}

impl SelectionState {
    /// All regions, every benefit selected in column order.
    pub fn new(top_n: usize) -> Self {
        Self {
            region: Region::All,
            benefits: Benefit::ALL.to_vec(),
            top_n: sanitize_top_n(top_n),
            chart: ChartType::Bar,
        }
    }

    /// Selected categories in insertion order.
    pub fn selected_benefits(&self) -> &[Benefit] {
        &self.benefits
    }

    pub fn is_selected(&self, benefit: Benefit) -> bool {
        self.benefits.contains(&benefit)
    }

    /// Returns `false` if the benefit was already selected.
    pub fn select(&mut self, benefit: Benefit) -> bool {
        if self.is_selected(benefit) {
            return false;
        }
        self.benefits.push(benefit);
        true
    }

    /// Returns `false` if the benefit was not selected.
    pub fn deselect(&mut self, benefit: Benefit) -> bool {
        let before = self.benefits.len();
        self.benefits.retain(|b| *b != benefit);
        self.benefits.len() != before
    }

    /// Flips the benefit and returns whether it is selected afterwards.
    pub fn toggle(&mut self, benefit: Benefit) -> bool {
        if self.deselect(benefit) {
            false
        } else {
            self.select(benefit)
        }
    }

    pub fn select_all(&mut self) {
        self.benefits = Benefit::ALL.to_vec();
    }

    pub fn clear_benefits(&mut self) {
        self.benefits.clear();
    }

    pub fn top_n(&self) -> usize {
        self.top_n
    }

    pub fn set_top_n(&mut self, n: usize) {
        self.top_n = sanitize_top_n(n);
    }

    /// Parses typed input; anything that is not a positive integer falls back
    /// to [`DEFAULT_TOP_N`].
    pub fn parse_top_n(s: &str) -> usize {
        s.trim()
            .parse::<usize>()
            .ok()
            .map(sanitize_top_n)
            .unwrap_or(DEFAULT_TOP_N)
    }
}

fn sanitize_top_n(n: usize) -> usize {
    if n == 0 {
        DEFAULT_TOP_N
    } else {
        n
    }
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct RankedAreaRow {
    #[serde(rename = "Rank")]
    #[tabled(rename = "Rank")]
    pub rank: usize,
    #[serde(rename = "Area")]
    #[tabled(rename = "Area")]
    pub area: String,
    #[serde(rename = "Value")]
    #[tabled(rename = "Value")]
    pub value: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct SeriesRow {
    #[serde(rename = "Label")]
    #[tabled(rename = "Label")]
    pub label: String,
    #[serde(rename = "Value")]
    #[tabled(rename = "Value")]
    pub value: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct StatCardRow {
    #[tabled(rename = "Stat")]
    pub title: String,
    #[tabled(rename = "Value")]
    pub value: String,
    #[tabled(rename = "Note")]
    pub label: String,
}

/// Raw-number row for CSV exports of a ranking.
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct ExportAreaRow {
    #[serde(rename = "Rank")]
    pub rank: usize,
    #[serde(rename = "Area")]
    pub area: String,
    #[serde(rename = "Value")]
    pub value: f64,
}
