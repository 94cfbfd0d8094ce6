use popcal_core::errors::{CalibError, ErrorInfo};

fn sample_info(code: &str, message: &str) -> ErrorInfo {
    ErrorInfo::new(code, message)
        .with_context("path", "data/observed.csv")
        .with_context("reason", "example")
}

#[test]
fn config_error_surface() {
    let err = CalibError::Config(sample_info("walkers", "need at least two walkers"));
    assert_eq!(err.info().code, "walkers");
    assert!(err.info().context.contains_key("path"));
}

#[test]
fn data_error_surface() {
    let err = CalibError::Data(sample_info("observed-missing-column", "no observed column"));
    assert_eq!(err.info().code, "observed-missing-column");
    assert!(err.to_string().starts_with("data error: no observed column"));
}

#[test]
fn display_includes_context_and_hint() {
    let err = CalibError::Simulator(
        ErrorInfo::new("simulator-missing", "simulator executable not found")
            .with_context("program", "./model")
            .with_hint("check simulator.program"),
    );
    let rendered = err.to_string();
    assert!(rendered.contains("program=./model"));
    assert!(rendered.contains("hint: check simulator.program"));
}

#[test]
fn io_helper_records_path() {
    let err = CalibError::io("read", std::path::Path::new("/tmp/x.csv"), "denied");
    assert!(matches!(err, CalibError::Io(_)));
    assert_eq!(err.info().context.get("path").map(String::as_str), Some("/tmp/x.csv"));
}

#[test]
fn errors_round_trip_json() {
    let err = CalibError::Prior(sample_info("prior-shape", "shape must be positive"));
    let json = serde_json::to_string(&err).expect("serialize");
    let decoded: CalibError = serde_json::from_str(&json).expect("deserialize");
    assert_eq!(decoded, err);
}
