//! The simulator seam and its external-process implementation.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Child, ExitStatus, Stdio};
use std::time::Duration;

use popcal_core::errors::{CalibError, ErrorInfo};
use popcal_core::{ParamKind, ParameterVector};
use popcal_data::{ColumnSpec, SimulationResult};
use serde::{Deserialize, Serialize};

use crate::command::SimulatorCommand;
use crate::failure::SimulationFailure;
use crate::guard::{GuardDecision, WallClockGuard};
use crate::workspace::Workspace;

const STDERR_TAIL_LINES: usize = 20;
const SPAWN_ATTEMPTS: usize = 4;
// ETXTBSY on Linux and macOS.
const EXECUTABLE_BUSY: i32 = 26;

/// Anything that turns a parameter vector into a simulated table.
///
/// Implementations are shared across worker threads and must not keep per-call state.
pub trait Simulator: Send + Sync {
    /// Runs one simulation.
    fn invoke(&self, vector: &ParameterVector) -> Result<SimulationResult, SimulationFailure>;
}

fn default_workspace_root() -> PathBuf {
    PathBuf::from("output_data")
}

fn default_output_file() -> String {
    "result_for_mcmc.csv".to_string()
}

fn default_timeout_seconds() -> Option<f64> {
    Some(900.0)
}

/// How to launch the external simulator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulatorConfig {
    /// Executable path, or a bare name looked up on `PATH`.
    pub program: PathBuf,
    /// Input data file handed to every invocation.
    pub input_data: PathBuf,
    /// Directory under which per-invocation workspaces are created.
    #[serde(default = "default_workspace_root")]
    pub workspace_root: PathBuf,
    /// File name of the output table inside the workspace.
    #[serde(default = "default_output_file")]
    pub output_file: String,
    /// Wall-clock limit per invocation; `null` disables it.
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: Option<f64>,
}

impl SimulatorConfig {
    /// Config with default workspace root, output name and timeout.
    pub fn new(program: impl Into<PathBuf>, input_data: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            input_data: input_data.into(),
            workspace_root: default_workspace_root(),
            output_file: default_output_file(),
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

/// Launches the configured program once per proposal.
#[derive(Debug, Clone)]
pub struct ExternalSimulator {
    program: PathBuf,
    input_data: PathBuf,
    workspace_root: PathBuf,
    output_file: String,
    timeout: Option<Duration>,
    kinds: Vec<ParamKind>,
    columns: ColumnSpec,
}

impl ExternalSimulator {
    /// Validates the configuration and prepares the workspace root.
    ///
    /// Fails when the program or the input data is missing, when the program is not
    /// executable, or when the workspace root cannot be created.
    pub fn new(
        config: &SimulatorConfig,
        kinds: Vec<ParamKind>,
        columns: ColumnSpec,
    ) -> Result<Self, CalibError> {
        let program = resolve_program(&config.program)?;
        ensure_executable(&program)?;

        if !config.input_data.is_file() {
            return Err(CalibError::Simulator(
                ErrorInfo::new("input-data-missing", "simulator input data not found")
                    .with_context("path", config.input_data.display().to_string()),
            ));
        }

        let timeout = match config.timeout_seconds {
            Some(seconds) if !(seconds.is_finite() && seconds > 0.0) => {
                return Err(CalibError::Config(
                    ErrorInfo::new("timeout-invalid", "timeout_seconds must be positive")
                        .with_context("timeout_seconds", seconds.to_string()),
                ))
            }
            Some(seconds) => Some(Duration::from_secs_f64(seconds)),
            None => None,
        };

        fs::create_dir_all(&config.workspace_root).map_err(|err| {
            CalibError::Simulator(
                ErrorInfo::new("workspace-root", err.to_string())
                    .with_context("path", config.workspace_root.display().to_string()),
            )
        })?;

        Ok(Self {
            program,
            input_data: config.input_data.clone(),
            workspace_root: config.workspace_root.clone(),
            output_file: config.output_file.clone(),
            timeout,
            kinds,
            columns,
        })
    }

    /// Resolved executable.
    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Root under which workspaces are created.
    pub fn workspace_root(&self) -> &Path {
        &self.workspace_root
    }

    /// Parameter kinds the simulator expects, in order.
    pub fn kinds(&self) -> &[ParamKind] {
        &self.kinds
    }

    fn run_in(
        &self,
        workspace: &Workspace,
        command: &SimulatorCommand,
    ) -> Result<SimulationResult, SimulationFailure> {
        let stdout = File::create(workspace.stdout_path())
            .map_err(|err| SimulationFailure::Workspace(err.to_string()))?;
        let stderr = File::create(workspace.stderr_path())
            .map_err(|err| SimulationFailure::Workspace(err.to_string()))?;

        let guard = WallClockGuard::new(self.timeout);
        let mut child = spawn(command, stdout, stderr)?;
        let status = wait_with_guard(&mut child, &guard)?;

        if !status.success() {
            let stderr = stderr_tail(&workspace.stderr_path());
            tracing::warn!(
                workspace = %workspace.id(),
                code = ?status.code(),
                stderr = %stderr,
                "simulator exited unsuccessfully"
            );
            return Err(SimulationFailure::NonZeroExit {
                code: status.code(),
                stderr,
            });
        }

        SimulationResult::from_path(&command.output, &self.columns)
            .map_err(|err| SimulationFailure::Output(err.to_string()))
    }
}

impl Simulator for ExternalSimulator {
    fn invoke(&self, vector: &ParameterVector) -> Result<SimulationResult, SimulationFailure> {
        if vector.len() != self.kinds.len() {
            return Err(SimulationFailure::Dimension {
                expected: self.kinds.len(),
                found: vector.len(),
            });
        }
        let rounded = vector.rounded(&self.kinds);
        let workspace = Workspace::create(&self.workspace_root)?;
        let command = SimulatorCommand::new(
            &self.program,
            &self.input_data,
            &workspace.file(&self.output_file),
            &rounded,
            &self.kinds,
        );
        tracing::debug!(
            workspace = %workspace.id(),
            args = ?command.parameters,
            "invoking simulator"
        );
        let outcome = self.run_in(&workspace, &command);
        if let Err(failure) = &outcome {
            tracing::debug!(workspace = %workspace.id(), kind = failure.kind(), "invocation failed");
        }
        outcome
    }
}

fn spawn(command: &SimulatorCommand, stdout: File, stderr: File) -> Result<Child, SimulationFailure> {
    let mut attempt = 0;
    loop {
        let stdout = stdout
            .try_clone()
            .map_err(|err| SimulationFailure::Workspace(err.to_string()))?;
        let stderr = stderr
            .try_clone()
            .map_err(|err| SimulationFailure::Workspace(err.to_string()))?;
        match command
            .to_command()
            .stdin(Stdio::null())
            .stdout(stdout)
            .stderr(stderr)
            .spawn()
        {
            Ok(child) => return Ok(child),
            Err(err) if err.raw_os_error() == Some(EXECUTABLE_BUSY) && attempt + 1 < SPAWN_ATTEMPTS => {
                attempt += 1;
                std::thread::sleep(Duration::from_millis(10 * attempt as u64));
            }
            Err(err) => return Err(SimulationFailure::Spawn(err.to_string())),
        }
    }
}

fn wait_with_guard(child: &mut Child, guard: &WallClockGuard) -> Result<ExitStatus, SimulationFailure> {
    if guard.limit().is_none() {
        return child
            .wait()
            .map_err(|err| SimulationFailure::Spawn(err.to_string()));
    }
    loop {
        if let Some(status) = child
            .try_wait()
            .map_err(|err| SimulationFailure::Spawn(err.to_string()))?
        {
            return Ok(status);
        }
        if let GuardDecision::Exceeded { limit, observed } = guard.check() {
            let _ = child.kill();
            let _ = child.wait();
            tracing::warn!(
                limit_seconds = limit.as_secs_f64(),
                elapsed_seconds = observed.as_secs_f64(),
                "simulator killed after exceeding wall-clock limit"
            );
            return Err(SimulationFailure::Timeout {
                limit_seconds: limit.as_secs_f64(),
            });
        }
        std::thread::sleep(guard.poll_interval());
    }
}

fn stderr_tail(path: &Path) -> String {
    match fs::read_to_string(path) {
        Ok(text) => {
            let lines: Vec<&str> = text.lines().collect();
            let start = lines.len().saturating_sub(STDERR_TAIL_LINES);
            lines[start..].join("\n")
        }
        Err(err) => format!("<stderr unavailable: {err}>"),
    }
}

fn resolve_program(program: &Path) -> Result<PathBuf, CalibError> {
    if program.is_file() {
        return Ok(program.to_path_buf());
    }
    let bare = program.components().count() == 1 && !program.is_absolute();
    if bare {
        if let Some(paths) = std::env::var_os("PATH") {
            if let Some(found) = std::env::split_paths(&paths)
                .map(|dir| dir.join(program))
                .find(|candidate| candidate.is_file())
            {
                return Ok(found);
            }
        }
    }
    Err(CalibError::Simulator(
        ErrorInfo::new("simulator-missing", "simulator executable not found")
            .with_context("program", program.display().to_string())
            .with_hint("check simulator.program in the run configuration"),
    ))
}

#[cfg(unix)]
fn ensure_executable(program: &Path) -> Result<(), CalibError> {
    use std::os::unix::fs::PermissionsExt;

    let metadata = fs::metadata(program).map_err(|err| to_simulator_error(program, err))?;
    if metadata.permissions().mode() & 0o111 == 0 {
        return Err(CalibError::Simulator(
            ErrorInfo::new("simulator-not-executable", "simulator is not executable")
                .with_context("program", program.display().to_string())
                .with_hint("chmod +x the simulator binary"),
        ));
    }
    Ok(())
}

#[cfg(not(unix))]
fn ensure_executable(program: &Path) -> Result<(), CalibError> {
    fs::metadata(program)
        .map(|_| ())
        .map_err(|err| to_simulator_error(program, err))
}

fn to_simulator_error(program: &Path, err: io::Error) -> CalibError {
    CalibError::Simulator(
        ErrorInfo::new("simulator-metadata", err.to_string())
            .with_context("program", program.display().to_string()),
    )
}
