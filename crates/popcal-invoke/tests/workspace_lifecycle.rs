use std::fs;

use popcal_invoke::{SimulatorCommand, Workspace};
use popcal_core::{ParamKind, ParameterVector};

#[test]
fn workspace_is_removed_on_drop() {
    let root = tempfile::tempdir().unwrap();
    let dir = {
        let workspace = Workspace::create(root.path()).unwrap();
        fs::write(workspace.file("result_for_mcmc.csv"), "x").unwrap();
        fs::create_dir(workspace.file("nested")).unwrap();
        fs::write(workspace.file("nested/more.txt"), "y").unwrap();
        workspace.dir().to_path_buf()
    };
    assert!(!dir.exists());
    assert!(fs::read_dir(root.path()).unwrap().next().is_none());
}

#[test]
fn workspaces_get_distinct_identifiers() {
    let root = tempfile::tempdir().unwrap();
    let workspaces: Vec<Workspace> = (0..32)
        .map(|_| Workspace::create(root.path()).unwrap())
        .collect();
    let mut ids: Vec<_> = workspaces.iter().map(|ws| ws.id()).collect();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 32);
}

#[test]
fn missing_root_is_a_workspace_failure() {
    let root = tempfile::tempdir().unwrap();
    let failure = Workspace::create(&root.path().join("absent")).unwrap_err();
    assert_eq!(failure.kind(), "workspace");
}

#[test]
fn command_lists_inputs_then_parameters() {
    let command = SimulatorCommand::new(
        "./model_rabbit".as_ref(),
        "grid.txt".as_ref(),
        "out/result.csv".as_ref(),
        &ParameterVector::new(vec![0.1, 3.0, 0.25, 12.0, 4.0]),
        &[
            ParamKind::Continuous,
            ParamKind::Discrete,
            ParamKind::Continuous,
            ParamKind::Discrete,
            ParamKind::Discrete,
        ],
    );
    assert_eq!(
        command.args(),
        vec!["grid.txt", "out/result.csv", "0.1", "3", "0.25", "12", "4"]
    );
}
