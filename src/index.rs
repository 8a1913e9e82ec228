use crate::types::{AreaRecord, Benefit, BenefitValues, RawRow};
use crate::util::to_number;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::HashMap;
use tracing::{debug, warn};

/// Area options shown when the search box is empty.
pub const REGION_OPTIONS_DEFAULT: usize = 300;
/// Upper bound on substring matches returned by a search.
pub const REGION_SEARCH_CAP: usize = 200;
/// Ranked areas offered when a search matches nothing.
pub const REGION_SEARCH_FALLBACK: usize = 50;

/// Dataset-wide counters and the range of the reference total.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IndexMeta {
    /// Data rows processed, duplicates included.
    pub rows: usize,
    /// Distinct area ids in the lookup.
    pub areas: usize,
    /// Rows whose area id replaced an earlier lookup entry.
    pub duplicate_areas: usize,
    pub sum_min: f64,
    pub sum_max: f64,
    pub sum_total: f64,
}

/// Everything derived from one load. Built once, read-only afterwards, and
/// replaced wholesale on reload.
#[derive(Debug, Clone, Default)]
pub struct DatasetIndex {
    records: Vec<AreaRecord>,
    area_lookup: HashMap<String, usize>,
    benefit_totals: BenefitValues,
    ranked: Vec<usize>,
    meta: IndexMeta,
}

impl DatasetIndex {
    pub fn build(rows: &[RawRow]) -> Self {
        let mut records: Vec<AreaRecord> = Vec::with_capacity(rows.len());
        let mut area_lookup: HashMap<String, usize> = HashMap::with_capacity(rows.len());
        let mut benefit_totals = BenefitValues::default();
        let mut duplicate_areas = 0usize;
        let (mut sum_min, mut sum_max, mut sum_total) = (f64::INFINITY, f64::NEG_INFINITY, 0.0);

        for (i, row) in rows.iter().enumerate() {
            let area_id = match row.get("small_area") {
                Some(id) if !id.is_empty() => id.to_string(),
                _ => format!("Area_{}", i),
            };

            let mut benefit_values = BenefitValues::default();
            for b in Benefit::ALL {
                benefit_values[b] = to_number(row.get(b.key()));
            }
            benefit_totals.accumulate(&benefit_values);

            let reference_total = to_number(row.get("sum"));
            sum_min = sum_min.min(reference_total);
            sum_max = sum_max.max(reference_total);
            sum_total += reference_total;

            let pos = records.len();
            if area_lookup.insert(area_id.clone(), pos).is_some() {
                duplicate_areas += 1;
                warn!(area_id = %area_id, row = i, "duplicate area id, later row replaces lookup entry");
            }
            records.push(AreaRecord {
                area_id,
                benefit_values,
                reference_total,
            });
        }

        // Stable: equal totals keep row order.
        let mut ranked: Vec<usize> = (0..records.len()).collect();
        ranked.sort_by(|&a, &b| {
            records[b]
                .reference_total
                .partial_cmp(&records[a].reference_total)
                .unwrap_or(Ordering::Equal)
        });

        let meta = IndexMeta {
            rows: records.len(),
            areas: area_lookup.len(),
            duplicate_areas,
            sum_min: if sum_min.is_finite() { sum_min } else { 0.0 },
            sum_max: if sum_max.is_finite() { sum_max } else { 0.0 },
            sum_total,
        };
        debug!(rows = meta.rows, areas = meta.areas, "dataset index built");

        Self {
            records,
            area_lookup,
            benefit_totals,
            ranked,
            meta,
        }
    }

    pub fn meta(&self) -> &IndexMeta {
        &self.meta
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The lookup entry for `area_id`; the last row wins for duplicated ids.
    pub fn area(&self, area_id: &str) -> Option<&AreaRecord> {
        self.area_lookup.get(area_id).map(|&pos| &self.records[pos])
    }

    /// All rows in input order, duplicates included.
    pub fn records(&self) -> &[AreaRecord] {
        &self.records
    }

    pub fn benefit_totals(&self) -> &BenefitValues {
        &self.benefit_totals
    }

    /// Every row ordered by reference total, highest first.
    pub fn ranked_records(&self) -> impl Iterator<Item = &AreaRecord> + '_ {
        self.ranked.iter().map(move |&pos| &self.records[pos])
    }

    pub fn ranked_areas(&self) -> Vec<&str> {
        self.ranked_records().map(|r| r.area_id.as_str()).collect()
    }

    /// Case-insensitive substring search over the ranked area ids.
    ///
    /// At most `cap` matches are returned. If nothing matches, the first
    /// `fallback` ranked ids come back instead so a non-empty dataset never
    /// yields an empty list.
    pub fn search_areas(&self, query: &str, cap: usize, fallback: usize) -> Vec<&str> {
        let q = query.trim().to_lowercase();
        let matches: Vec<&str> = self
            .ranked_records()
            .map(|r| r.area_id.as_str())
            .filter(|id| id.to_lowercase().contains(&q))
            .take(cap)
            .collect();
        if matches.is_empty() {
            self.ranked_records()
                .take(fallback)
                .map(|r| r.area_id.as_str())
                .collect()
        } else {
            matches
        }
    }

    /// The area picker list: the top ranked ids for a blank query, otherwise
    /// search results.
    pub fn region_options(&self, query: &str) -> Vec<&str> {
        if query.trim().is_empty() {
            self.ranked_records()
                .take(REGION_OPTIONS_DEFAULT)
                .map(|r| r.area_id.as_str())
                .collect()
        } else {
            self.search_areas(query, REGION_SEARCH_CAP, REGION_SEARCH_FALLBACK)
        }
    }
}
