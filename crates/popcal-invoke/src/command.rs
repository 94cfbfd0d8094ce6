//! Simulator command lines.

use std::path::{Path, PathBuf};
use std::process::Command;

use popcal_core::{round_discrete, ParamKind, ParameterVector};

/// Fully resolved argument list for one invocation:
/// `program <input-data> <output-file> <p1> ... <pN>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulatorCommand {
    /// Executable.
    pub program: PathBuf,
    /// Input data file passed through unchanged.
    pub input_data: PathBuf,
    /// Output table the simulator must write.
    pub output: PathBuf,
    /// Formatted parameter values in declaration order.
    pub parameters: Vec<String>,
}

impl SimulatorCommand {
    /// Builds the command for an already rounded vector.
    pub fn new(
        program: &Path,
        input_data: &Path,
        output: &Path,
        vector: &ParameterVector,
        kinds: &[ParamKind],
    ) -> Self {
        let parameters = vector
            .values()
            .iter()
            .enumerate()
            .map(|(idx, &value)| format_parameter(value, kinds.get(idx).copied().unwrap_or_default()))
            .collect();
        Self {
            program: program.to_path_buf(),
            input_data: input_data.to_path_buf(),
            output: output.to_path_buf(),
            parameters,
        }
    }

    /// Arguments after the program name.
    pub fn args(&self) -> Vec<String> {
        let mut args = Vec::with_capacity(self.parameters.len() + 2);
        args.push(self.input_data.display().to_string());
        args.push(self.output.display().to_string());
        args.extend(self.parameters.iter().cloned());
        args
    }

    /// `std::process::Command` with program and arguments set.
    pub fn to_command(&self) -> Command {
        let mut command = Command::new(&self.program);
        command
            .arg(&self.input_data)
            .arg(&self.output)
            .args(&self.parameters);
        command
    }
}

/// Continuous values use the shortest representation that parses back to the same
/// `f64`; discrete values are written as integers of any magnitude.
pub fn format_parameter(value: f64, kind: ParamKind) -> String {
    match kind {
        // Adding zero folds -0.0 into 0.
        ParamKind::Discrete if value.is_finite() => format!("{:.0}", round_discrete(value) + 0.0),
        _ => format!("{value}"),
    }
}
