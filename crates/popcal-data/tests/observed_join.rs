use popcal_data::{ColumnSpec, ObservedDataset, RecordKey, SimulationResult};
use proptest::prelude::*;

fn key(year: i64, col: i64, row: i64) -> RecordKey {
    RecordKey::new(year, col, row)
}

#[test]
fn load_reads_observed_column_and_digest() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("observed.csv");
    std::fs::write(&path, "sim_year,col,row,observed\n2019,1,1,2.0\n2019,1,2,4.0\n").unwrap();

    let observed = ObservedDataset::load(&path, &ColumnSpec::default()).unwrap();
    assert_eq!(observed.len(), 2);
    assert_eq!(observed.digest(), popcal_data::file_digest(&path).unwrap());
    assert!((observed.std_dev() - 1.0).abs() < 1e-12);
}

#[test]
fn header_only_observed_file_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("observed.csv");
    std::fs::write(&path, "sim_year,col,row,observed\n").unwrap();

    let err = ObservedDataset::load(&path, &ColumnSpec::default()).unwrap_err();
    assert_eq!(err.info().code, "observed-empty");
}

#[test]
fn missing_observed_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = ObservedDataset::load(&dir.path().join("nope.csv"), &ColumnSpec::default())
        .unwrap_err();
    assert!(matches!(err, popcal_core::CalibError::Io(_)));
}

#[test]
fn join_keeps_only_matching_keys() {
    let observed =
        ObservedDataset::from_rows(vec![(key(2019, 1, 1), 1.0), (key(2019, 1, 2), 2.0)]).unwrap();
    let simulated =
        SimulationResult::from_rows(vec![(key(2019, 1, 2), 2.5), (key(2020, 9, 9), 0.0)]);

    let joined = observed.join(&simulated);
    assert_eq!(joined.len(), 1);
    assert_eq!(joined[0].key, key(2019, 1, 2));
    assert!((joined[0].residual() - 0.5).abs() < 1e-12);
}

#[test]
fn duplicate_keys_pair_every_match() {
    let observed =
        ObservedDataset::from_rows(vec![(key(1, 1, 1), 1.0), (key(1, 1, 1), 3.0)]).unwrap();
    let simulated = SimulationResult::from_rows(vec![(key(1, 1, 1), 10.0), (key(1, 1, 1), 20.0)]);

    let observed_pairs: Vec<(f64, f64)> = observed
        .join(&simulated)
        .iter()
        .map(|row| (row.result, row.observed))
        .collect();
    assert_eq!(
        observed_pairs,
        vec![(10.0, 1.0), (10.0, 3.0), (20.0, 1.0), (20.0, 3.0)]
    );
}

#[test]
fn disjoint_keys_join_to_nothing() {
    let observed = ObservedDataset::from_rows(vec![(key(1, 1, 1), 1.0)]).unwrap();
    let simulated = SimulationResult::from_rows(vec![(key(2, 2, 2), 1.0)]);
    assert!(observed.join(&simulated).is_empty());
}

#[test]
fn constant_observations_have_zero_spread() {
    let observed =
        ObservedDataset::from_rows(vec![(key(1, 1, 1), 5.0), (key(1, 1, 2), 5.0)]).unwrap();
    assert_eq!(observed.std_dev(), 0.0);
}

proptest! {
    #[test]
    fn self_join_matches_every_unique_row(values in prop::collection::vec(-1.0e3f64..1.0e3, 1..40)) {
        let rows: Vec<(RecordKey, f64)> = values
            .iter()
            .enumerate()
            .map(|(idx, value)| (key(2000, idx as i64, 0), *value))
            .collect();
        let observed = ObservedDataset::from_rows(rows.clone()).unwrap();
        let joined = observed.join(&SimulationResult::from_rows(rows));
        prop_assert_eq!(joined.len(), values.len());
        prop_assert!(joined.iter().all(|row| row.residual() == 0.0));
    }
}
