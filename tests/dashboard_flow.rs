use cobenefit_dashboard::aggregate::{
    selected_impact_dataset_wide, top_benefit, top_n_by_reference, top_n_by_selected_impact,
};
use cobenefit_dashboard::loader::{load_index, parse_records, FileSource};
use cobenefit_dashboard::output::export_reports;
use cobenefit_dashboard::reports::build_dashboard;
use cobenefit_dashboard::{
    Benefit, DashboardError, DatasetIndex, LoadOutcome, Region, SelectionState, Session,
};
use proptest::prelude::*;
use std::time::{Duration, Instant};

const HEADER: &str = "small_area;air_quality;congestion;dampness;diet_change;excess_cold;excess_heat;hassle_costs;noise;physical_activity;road_repairs;road_safety;sum";

fn build(text: &str) -> DatasetIndex {
    DatasetIndex::build(&parse_records(text).unwrap())
}

#[test]
fn scenario_two_areas_with_locale_decimals() {
    let idx = build("small_area;air_quality;sum\nA;2,5;10\nB;1,0;20\n");
    assert_eq!(idx.area("A").unwrap().benefit_values[Benefit::AirQuality], 2.5);
    assert_eq!(idx.benefit_totals()[Benefit::AirQuality], 3.5);
    assert_eq!(idx.ranked_areas(), vec!["B", "A"]);
    assert_eq!(idx.meta().sum_total, 30.0);
}

#[test]
fn empty_selection_over_all_regions_is_signalled() {
    let idx = build("small_area;air_quality;sum\nA;2,5;10\n");
    let mut sel = SelectionState::default();
    sel.region = Region::All;
    sel.clear_benefits();
    assert!(matches!(
        selected_impact_dataset_wide(&idx, &sel),
        Err(DashboardError::EmptySelection)
    ));
}

#[test]
fn top_five_of_two_areas_is_two() {
    let idx = build("small_area;sum\nA;1\nB;2\n");
    let top = top_n_by_reference(&idx, 5);
    assert_eq!(top.len(), 2);
    assert_eq!(top[0].area_id, "B");
    assert_eq!(top[0].value, 2.0);
}

#[test]
fn duplicate_area_ids_keep_both_rows_in_ranking() {
    let idx = build("small_area;noise;sum\nX;1;5\nY;2;4\nX;3;6\n");
    assert_eq!(idx.meta().rows, 3);
    assert_eq!(idx.meta().areas, 2);
    assert_eq!(idx.area("X").unwrap().benefit_values[Benefit::Noise], 3.0);
    assert_eq!(idx.area("X").unwrap().reference_total, 6.0);
    assert_eq!(idx.ranked_areas(), vec!["X", "X", "Y"]);
    let values: Vec<f64> = top_n_by_reference(&idx, 3).iter().map(|s| s.value).collect();
    assert_eq!(values, vec![6.0, 6.0, 4.0]);
}

#[test]
fn full_header_dataset_flows_to_dashboard_and_exports() {
    let text = format!(
        "{HEADER}\n\
         S001;0,5;-0,1;0;0;0,2;0;-0,3;0,1;1,2;0;0,4;2,0\n\
         S002;0,5;0;0;0;0;0;0;0,5;0;0;0;3,5\n\
         \n\
         S003;1,0;0;0;0;0;0;0;0;0;0;0;1,0\n"
    );
    let idx = build(&text);
    assert_eq!(idx.meta().rows, 3);
    assert_eq!(idx.ranked_areas(), vec!["S002", "S001", "S003"]);

    let mut sel = SelectionState::new(2);
    sel.clear_benefits();
    sel.select(Benefit::Noise);
    sel.select(Benefit::AirQuality);

    let by_sel: Vec<String> = top_n_by_selected_impact(&idx, &sel, 3)
        .unwrap()
        .into_iter()
        .map(|s| s.area_id)
        .collect();
    assert_eq!(by_sel, vec!["S002", "S003", "S001"]);

    let top = top_benefit(&idx, &sel, &Region::All).unwrap();
    assert_eq!(top.benefit, Benefit::AirQuality);

    let view = build_dashboard(&idx, &sel).unwrap();
    assert_eq!(view.comparison.labels, vec!["S002", "S001"]);
    assert_eq!(view.stats.rows, 3);

    let dir = tempfile::tempdir().unwrap();
    let paths = export_reports(dir.path(), &idx, &sel).unwrap();
    assert!(paths.comparison.exists());
    assert!(paths.selected.exists());
    assert!(paths.summary.exists());
}

#[test]
fn session_loads_from_file_and_survives_a_bad_reload() {
    let dir = tempfile::tempdir().unwrap();
    let good = dir.path().join("Level_1.csv");
    std::fs::write(&good, "small_area;noise;sum\nA;1;1\nB;2;2\n").unwrap();

    let mut session = Session::new(30, Duration::from_millis(5));
    assert_eq!(session.load(&FileSource::new(&good)).unwrap(), LoadOutcome::Loaded);
    assert!(session.take_refresh(Instant::now()));

    let missing = FileSource::new(dir.path().join("missing.csv"));
    assert!(matches!(
        session.load(&missing),
        Err(DashboardError::LoadFailed { .. })
    ));
    assert_eq!(session.index().unwrap().meta().rows, 2);

    let t0 = Instant::now();
    session.update_selection(t0, |sel| {
        sel.toggle(Benefit::Noise);
    });
    session.update_selection(t0, |sel| {
        sel.toggle(Benefit::Noise);
    });
    assert!(!session.take_refresh(t0));
    assert!(session.take_refresh(t0 + Duration::from_millis(5)));
    assert!(!session.take_refresh(t0 + Duration::from_millis(50)));
}

#[test]
fn empty_file_is_malformed() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("empty.csv");
    std::fs::write(&path, "").unwrap();
    assert!(matches!(
        load_index(&FileSource::new(&path)),
        Err(DashboardError::MalformedInput)
    ));
}

fn dataset_rows() -> impl Strategy<Value = Vec<(i32, i32, i32)>> {
    // (noise, road_safety, sum) as small integers so float sums are exact.
    prop::collection::vec((-50i32..50, -50i32..50, -20i32..20), 0..40)
}

fn render(rows: &[(i32, i32, i32)]) -> String {
    let mut text = String::from("small_area;noise;road_safety;sum\n");
    for (i, (noise, safety, sum)) in rows.iter().enumerate() {
        text.push_str(&format!("R{};{};{};{}\n", i, noise, safety, sum));
    }
    text
}

proptest! {
    #[test]
    fn row_count_matches_data_lines(rows in dataset_rows()) {
        let idx = build(&render(&rows));
        prop_assert_eq!(idx.meta().rows, rows.len());
        prop_assert_eq!(idx.ranked_areas().len(), rows.len());
    }

    #[test]
    fn ranking_is_non_increasing_and_stable(rows in dataset_rows()) {
        let idx = build(&render(&rows));
        let ranked: Vec<_> = idx.ranked_records().collect();
        for pair in ranked.windows(2) {
            prop_assert!(pair[0].reference_total >= pair[1].reference_total);
            if pair[0].reference_total == pair[1].reference_total {
                let a: usize = pair[0].area_id[1..].parse().unwrap();
                let b: usize = pair[1].area_id[1..].parse().unwrap();
                prop_assert!(a < b);
            }
        }
    }

    #[test]
    fn totals_equal_sum_of_area_values(rows in dataset_rows()) {
        let idx = build(&render(&rows));
        let from_totals: f64 = idx.benefit_totals().total();
        let from_records: f64 = idx.records().iter().map(|r| r.benefit_values.total()).sum();
        prop_assert_eq!(from_totals, from_records);
        let noise: f64 = rows.iter().map(|r| r.0 as f64).sum();
        prop_assert_eq!(idx.benefit_totals()[Benefit::Noise], noise);
    }

    #[test]
    fn selected_ranking_is_non_increasing(rows in dataset_rows(), n in 1usize..50) {
        let idx = build(&render(&rows));
        let sel = SelectionState::new(n);
        let top = top_n_by_selected_impact(&idx, &sel, n).unwrap();
        prop_assert_eq!(top.len(), n.min(rows.len()));
        for pair in top.windows(2) {
            prop_assert!(pair[0].value >= pair[1].value);
        }
    }
}
