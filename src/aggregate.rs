//! Queries over a loaded dataset and the current selection.
//!
//! Every function here is a pure read: same index and same selection, same
//! answer. Unknown areas come back as `None`. An empty benefit selection is
//! reported as [`DashboardError::EmptySelection`] wherever the answer depends
//! on the selection.

use crate::error::{DashboardError, Result};
use crate::index::DatasetIndex;
use crate::types::{AreaRecord, Benefit, Region, SelectionState};
use serde::Serialize;
use std::cmp::Ordering;

/// One bar of a ranking.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AreaScore {
    pub area_id: String,
    pub value: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TopBenefit {
    pub benefit: Benefit,
    pub value: f64,
}

fn require_selection(selection: &SelectionState) -> Result<&[Benefit]> {
    let benefits = selection.selected_benefits();
    if benefits.is_empty() {
        return Err(DashboardError::EmptySelection);
    }
    Ok(benefits)
}

fn selected_sum(record: &AreaRecord, benefits: &[Benefit]) -> f64 {
    benefits.iter().map(|&b| record.benefit_values[b]).sum()
}

/// Sum of the selected benefits for one area.
pub fn selected_impact_for_area(
    index: &DatasetIndex,
    selection: &SelectionState,
    area_id: &str,
) -> Result<Option<f64>> {
    let benefits = require_selection(selection)?;
    Ok(index.area(area_id).map(|r| selected_sum(r, benefits)))
}

/// Sum of the selected benefits over the whole dataset.
pub fn selected_impact_dataset_wide(
    index: &DatasetIndex,
    selection: &SelectionState,
) -> Result<f64> {
    let benefits = require_selection(selection)?;
    let totals = index.benefit_totals();
    Ok(benefits.iter().map(|&b| totals[b]).sum())
}

/// Selected impact for the selection's own region.
pub fn selected_impact(index: &DatasetIndex, selection: &SelectionState) -> Result<Option<f64>> {
    match &selection.region {
        Region::All => selected_impact_dataset_wide(index, selection).map(Some),
        Region::Area(id) => selected_impact_for_area(index, selection, id),
    }
}

/// Reference total for a scope: the dataset sum for all regions, the area's
/// `sum` otherwise.
pub fn reference_total(index: &DatasetIndex, scope: &Region) -> Option<f64> {
    match scope {
        Region::All => Some(index.meta().sum_total),
        Region::Area(id) => index.area(id).map(|r| r.reference_total),
    }
}

/// The selected benefit with the largest value in `scope`.
///
/// Ties go to the benefit selected first. `None` when nothing is selected or
/// the area is unknown.
pub fn top_benefit(
    index: &DatasetIndex,
    selection: &SelectionState,
    scope: &Region,
) -> Option<TopBenefit> {
    let values = match scope {
        Region::All => *index.benefit_totals(),
        Region::Area(id) => index.area(id)?.benefit_values,
    };
    let mut best: Option<TopBenefit> = None;
    for &benefit in selection.selected_benefits() {
        let value = values[benefit];
        if best.map_or(true, |b| value > b.value) {
            best = Some(TopBenefit { benefit, value });
        }
    }
    best
}

/// `(benefit, value)` for each selected benefit in selection order.
pub fn benefit_breakdown(
    index: &DatasetIndex,
    selection: &SelectionState,
    scope: &Region,
) -> Result<Option<Vec<(Benefit, f64)>>> {
    let benefits = require_selection(selection)?;
    let values = match scope {
        Region::All => *index.benefit_totals(),
        Region::Area(id) => match index.area(id) {
            Some(r) => r.benefit_values,
            None => return Ok(None),
        },
    };
    Ok(Some(benefits.iter().map(|&b| (b, values[b])).collect()))
}

/// The first `n` ids of the reference-total ranking, each resolved through
/// the area lookup. A duplicated id therefore shows the later row's total at
/// every position it holds.
pub fn top_n_by_reference(index: &DatasetIndex, n: usize) -> Vec<AreaScore> {
    index
        .ranked_records()
        .take(n)
        .map(|r| AreaScore {
            area_id: r.area_id.clone(),
            value: index
                .area(&r.area_id)
                .map(|hit| hit.reference_total)
                .unwrap_or(0.0),
        })
        .collect()
}

/// The `n` rows with the largest selected-benefit sum. Independent of the
/// reference ranking; equal sums keep row order.
pub fn top_n_by_selected_impact(
    index: &DatasetIndex,
    selection: &SelectionState,
    n: usize,
) -> Result<Vec<AreaScore>> {
    let benefits = require_selection(selection)?;
    let mut scores: Vec<AreaScore> = index
        .records()
        .iter()
        .map(|r| AreaScore {
            area_id: r.area_id.clone(),
            value: selected_sum(r, benefits),
        })
        .collect();
    scores.sort_by(|a, b| b.value.partial_cmp(&a.value).unwrap_or(Ordering::Equal));
    scores.truncate(n);
    Ok(scores)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::parse_records;

    fn fixture() -> DatasetIndex {
        // Reference totals rank C > B > A, noise + dampness rank A > B > C.
        let text = "small_area;noise;dampness;air_quality;sum\n\
                    A;4;4;-1;1\n\
                    B;2;1;5;2\n\
                    C;0,5;0;9;3\n";
        DatasetIndex::build(&parse_records(text).unwrap())
    }

    fn selecting(benefits: &[Benefit]) -> SelectionState {
        let mut sel = SelectionState::new(10);
        sel.clear_benefits();
        for &b in benefits {
            sel.select(b);
        }
        sel
    }

    #[test]
    fn area_and_dataset_impacts() {
        let idx = fixture();
        let sel = selecting(&[Benefit::Noise, Benefit::Dampness]);
        assert_eq!(selected_impact_for_area(&idx, &sel, "A").unwrap(), Some(8.0));
        assert_eq!(selected_impact_for_area(&idx, &sel, "Z").unwrap(), None);
        assert_eq!(selected_impact_dataset_wide(&idx, &sel).unwrap(), 11.5);
    }

    #[test]
    fn empty_selection_is_reported() {
        let idx = fixture();
        let sel = selecting(&[]);
        assert!(matches!(
            selected_impact_dataset_wide(&idx, &sel),
            Err(DashboardError::EmptySelection)
        ));
        assert!(matches!(
            selected_impact_for_area(&idx, &sel, "A"),
            Err(DashboardError::EmptySelection)
        ));
        assert!(matches!(
            top_n_by_selected_impact(&idx, &sel, 3),
            Err(DashboardError::EmptySelection)
        ));
        assert!(top_benefit(&idx, &sel, &Region::All).is_none());
    }

    #[test]
    fn rankings_diverge() {
        let idx = fixture();
        let sel = selecting(&[Benefit::Noise, Benefit::Dampness]);
        let by_ref: Vec<String> = top_n_by_reference(&idx, 3).into_iter().map(|s| s.area_id).collect();
        let by_sel: Vec<String> = top_n_by_selected_impact(&idx, &sel, 3)
            .unwrap()
            .into_iter()
            .map(|s| s.area_id)
            .collect();
        assert_eq!(by_ref, vec!["C", "B", "A"]);
        assert_eq!(by_sel, vec!["A", "B", "C"]);
    }

    #[test]
    fn top_n_is_capped_by_dataset_size() {
        let idx = fixture();
        assert_eq!(top_n_by_reference(&idx, 5).len(), 3);
        assert_eq!(top_n_by_reference(&idx, 0).len(), 0);
    }

    #[test]
    fn duplicated_ids_resolve_to_the_lookup_total() {
        let idx = DatasetIndex::build(&parse_records("small_area;sum\nX;5\nY;4\nX;6\n").unwrap());
        let top: Vec<(String, f64)> = top_n_by_reference(&idx, 3)
            .into_iter()
            .map(|s| (s.area_id, s.value))
            .collect();
        assert_eq!(
            top,
            vec![("X".to_string(), 6.0), ("X".to_string(), 6.0), ("Y".to_string(), 4.0)]
        );
    }

    #[test]
    fn top_benefit_ties_go_to_first_selected() {
        let idx = fixture();
        let sel = selecting(&[Benefit::Dampness, Benefit::Noise]);
        let top = top_benefit(&idx, &sel, &Region::Area("A".into())).unwrap();
        assert_eq!(top.benefit, Benefit::Dampness);
        let sel = selecting(&[Benefit::Noise, Benefit::Dampness]);
        let top = top_benefit(&idx, &sel, &Region::Area("A".into())).unwrap();
        assert_eq!(top.benefit, Benefit::Noise);
        let top = top_benefit(&idx, &selecting(&Benefit::ALL), &Region::All).unwrap();
        assert_eq!(top.benefit, Benefit::AirQuality);
        assert_eq!(top.value, 13.0);
    }

    #[test]
    fn top_benefit_for_unknown_area_is_none() {
        let idx = fixture();
        assert!(top_benefit(&idx, &selecting(&Benefit::ALL), &Region::Area("Z".into())).is_none());
    }

    #[test]
    fn queries_are_repeatable() {
        let idx = fixture();
        let sel = selecting(&[Benefit::AirQuality, Benefit::Noise]);
        assert_eq!(
            top_n_by_selected_impact(&idx, &sel, 2).unwrap(),
            top_n_by_selected_impact(&idx, &sel, 2).unwrap()
        );
        assert_eq!(
            benefit_breakdown(&idx, &sel, &Region::All).unwrap(),
            benefit_breakdown(&idx, &sel, &Region::All).unwrap()
        );
    }

    #[test]
    fn breakdown_follows_selection_order() {
        let idx = fixture();
        let sel = selecting(&[Benefit::AirQuality, Benefit::Noise]);
        let rows = benefit_breakdown(&idx, &sel, &Region::Area("B".into())).unwrap().unwrap();
        assert_eq!(rows, vec![(Benefit::AirQuality, 5.0), (Benefit::Noise, 2.0)]);
        assert_eq!(
            benefit_breakdown(&idx, &sel, &Region::Area("Z".into())).unwrap(),
            None
        );
        assert_eq!(reference_total(&idx, &Region::All), Some(6.0));
    }
}
