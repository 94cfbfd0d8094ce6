#![deny(missing_docs)]
//! Runs the external population simulator once per proposal.
//!
//! Every invocation gets its own [`Workspace`] directory, named by a random UUID, which
//! holds the simulator's output table and captured logs and is removed when the
//! invocation ends. Failures are returned as [`SimulationFailure`] values; turning them
//! into rejected proposals is the caller's business.

pub mod command;
pub mod failure;
pub mod guard;
pub mod simulator;
pub mod workspace;

pub use command::SimulatorCommand;
pub use failure::SimulationFailure;
pub use guard::{GuardDecision, WallClockGuard};
pub use simulator::{ExternalSimulator, Simulator, SimulatorConfig};
pub use workspace::Workspace;
