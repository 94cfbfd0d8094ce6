//! Parallel ensemble sampler.
//!
//! Each step splits the walkers into two halves. Every walker of the first half proposes
//! a stretch move against the current positions of the second half, the proposals are
//! evaluated on the worker pool, and accept/reject decisions are made in walker order.
//! The second half then does the same against the updated first half.
//!
//! All random draws happen on the coordinating thread from an RNG derived from
//! `(master_seed, step)`; workers only evaluate. A run is therefore reproducible for a
//! given seed whatever the pool size, and a run resumed from a checkpoint continues
//! exactly as the uninterrupted run would have.

use popcal_core::errors::{CalibError, ErrorInfo};
use popcal_core::{LogProbability, ParameterVector, RngHandle};
use popcal_invoke::Simulator;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::chain::{Chain, ChainStep};
use crate::config::default_workers;
use crate::determinism;
use crate::metrics::{MetricsRecorder, StepMetrics};
use crate::posterior::{Evaluation, Posterior};
use crate::stretch::StretchMove;

/// Pool size and move settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplerOptions {
    /// Worker threads evaluating proposals.
    pub workers: usize,
    /// Stretch move.
    pub stretch: StretchMove,
}

impl Default for SamplerOptions {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            stretch: StretchMove::default(),
        }
    }
}

/// Current ensemble.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SamplerState {
    /// Walker positions.
    pub positions: Vec<ParameterVector>,
    /// Log-probabilities at the positions.
    pub log_probs: Vec<LogProbability>,
    /// Accepted proposals per walker.
    pub accepted: Vec<usize>,
    /// Issued proposals per walker.
    pub proposed: Vec<usize>,
}

impl SamplerState {
    /// Number of walkers.
    pub fn walkers(&self) -> usize {
        self.positions.len()
    }

    /// Accepted over proposed across all walkers.
    pub fn mean_acceptance_rate(&self) -> f64 {
        let proposed: usize = self.proposed.iter().sum();
        let accepted: usize = self.accepted.iter().sum();
        if proposed == 0 {
            0.0
        } else {
            accepted as f64 / proposed as f64
        }
    }

    fn check_shape(&self, ndim: usize) -> Result<(), CalibError> {
        let walkers = self.positions.len();
        let consistent = self.log_probs.len() == walkers
            && self.accepted.len() == walkers
            && self.proposed.len() == walkers
            && self.positions.iter().all(|position| position.len() == ndim);
        if walkers < 2 || !consistent {
            return Err(CalibError::Sampler(
                ErrorInfo::new("state-shape", "sampler state is inconsistent")
                    .with_context("walkers", walkers.to_string())
                    .with_context("ndim", ndim.to_string()),
            ));
        }
        Ok(())
    }
}

/// Output of a single ensemble step.
#[derive(Debug, Clone, PartialEq)]
pub struct StepOutput {
    /// Chain record for the step.
    pub record: ChainStep,
    /// Counts for the step.
    pub metrics: StepMetrics,
}

/// Everything produced by a sampling run.
#[derive(Debug, Clone)]
pub struct SamplerRun {
    /// Full chain, `steps × walkers` entries.
    pub chain: Chain,
    /// Ensemble after the last step.
    pub state: SamplerState,
    /// Per-step counts.
    pub metrics: MetricsRecorder,
}

/// Affine-invariant ensemble sampler driving a [`Posterior`] on a rayon pool.
pub struct EnsembleSampler<'p, S> {
    posterior: &'p Posterior<S>,
    stretch: StretchMove,
    pool: rayon::ThreadPool,
    workers: usize,
}

impl<'p, S: Simulator> EnsembleSampler<'p, S> {
    /// Builds the worker pool.
    pub fn new(posterior: &'p Posterior<S>, options: SamplerOptions) -> Result<Self, CalibError> {
        let workers = options.workers.max(1);
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .build()
            .map_err(|err| CalibError::Sampler(ErrorInfo::new("thread-pool", err.to_string())))?;
        Ok(Self {
            posterior,
            stretch: options.stretch,
            pool,
            workers,
        })
    }

    /// Worker thread count.
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Target density.
    pub fn posterior(&self) -> &Posterior<S> {
        self.posterior
    }

    /// Evaluates proposals on the pool, returning results in input order.
    pub fn evaluate_batch(&self, vectors: &[ParameterVector]) -> Vec<Evaluation> {
        self.pool.install(|| {
            vectors
                .par_iter()
                .map(|vector| self.posterior.evaluate(vector))
                .collect()
        })
    }

    /// Validates the starting positions and evaluates them. The initial evaluations are
    /// not part of the chain.
    pub fn initialize(&self, positions: Vec<ParameterVector>) -> Result<SamplerState, CalibError> {
        if positions.len() < 2 {
            return Err(CalibError::Config(
                ErrorInfo::new("walkers", "at least two walkers are required")
                    .with_context("walkers", positions.len().to_string()),
            ));
        }
        for position in &positions {
            self.posterior.prior().check_dimension(position.len())?;
        }
        let ndim = self.posterior.ndim();
        if positions.len() < 2 * ndim {
            tracing::warn!(
                walkers = positions.len(),
                ndim,
                "fewer than two walkers per dimension, mixing may be poor"
            );
        }

        let evaluations = self.evaluate_batch(&positions);
        let log_probs: Vec<LogProbability> = evaluations.iter().map(|eval| eval.log_prob).collect();
        let rejected = log_probs.iter().filter(|lp| lp.is_rejected()).count();
        if rejected > 0 {
            tracing::warn!(
                rejected,
                walkers = positions.len(),
                "initial walkers with zero posterior probability"
            );
        }
        let walkers = positions.len();
        Ok(SamplerState {
            positions,
            log_probs,
            accepted: vec![0; walkers],
            proposed: vec![0; walkers],
        })
    }

    /// Advances the ensemble by one step.
    pub fn step(&self, state: &mut SamplerState, master_seed: u64, step: usize) -> StepOutput {
        let mut rng = RngHandle::from_seed(determinism::step_seed(master_seed, step));
        let walkers = state.walkers();
        let half = walkers / 2;
        let ndim = self.posterior.ndim();
        let mut accepted = vec![false; walkers];
        let mut metrics = StepMetrics {
            step,
            proposed: walkers,
            ..StepMetrics::default()
        };

        for (active, complement) in [(0..half, half..walkers), (half..walkers, 0..half)] {
            let complementary = state.positions[complement].to_vec();
            let (proposals, stretches): (Vec<ParameterVector>, Vec<f64>) = active
                .clone()
                .map(|walker| {
                    self.stretch
                        .propose(&mut rng, &state.positions[walker], &complementary)
                })
                .unzip();
            let evaluations = self.evaluate_batch(&proposals);

            for (walker, ((proposal, z), evaluation)) in
                active.zip(proposals.into_iter().zip(stretches).zip(evaluations))
            {
                metrics.record_outcome(evaluation.outcome);
                let probability = self.stretch.acceptance_probability(
                    z,
                    ndim,
                    state.log_probs[walker],
                    evaluation.log_prob,
                );
                state.proposed[walker] += 1;
                if rng.uniform() < probability {
                    state.positions[walker] = proposal;
                    state.log_probs[walker] = evaluation.log_prob;
                    state.accepted[walker] += 1;
                    accepted[walker] = true;
                }
            }
        }

        metrics.accepted = accepted.iter().filter(|&&flag| flag).count();
        let finite: Vec<f64> = state
            .log_probs
            .iter()
            .filter(|lp| lp.is_finite())
            .map(|lp| lp.value())
            .collect();
        if !finite.is_empty() {
            metrics.mean_log_prob = Some(finite.iter().sum::<f64>() / finite.len() as f64);
            metrics.max_log_prob = finite.iter().copied().reduce(f64::max);
        }
        tracing::info!(
            step,
            accepted = metrics.accepted,
            prior_rejected = metrics.prior_rejected,
            simulator_failed = metrics.simulator_failed,
            empty_join = metrics.empty_join,
            mean_log_prob = ?metrics.mean_log_prob,
            "step complete"
        );

        StepOutput {
            record: ChainStep {
                positions: state.positions.clone(),
                log_probs: state.log_probs.clone(),
                accepted,
            },
            metrics,
        }
    }

    /// Runs `steps` steps from freshly evaluated initial positions.
    pub fn run(
        &self,
        initial_positions: Vec<ParameterVector>,
        steps: usize,
        seed: u64,
    ) -> Result<SamplerRun, CalibError> {
        let state = self.initialize(initial_positions)?;
        let prior = self.posterior.prior();
        let chain = Chain::new(prior.names(), prior.kinds(), state.walkers());
        self.run_from(state, chain, MetricsRecorder::new(), steps, seed, |_| Ok(()))
    }

    /// Continues from `state` until the chain holds `total_steps` steps, calling
    /// `after_step` once each step has been appended.
    pub fn run_from<F>(
        &self,
        state: SamplerState,
        chain: Chain,
        metrics: MetricsRecorder,
        total_steps: usize,
        seed: u64,
        mut after_step: F,
    ) -> Result<SamplerRun, CalibError>
    where
        F: FnMut(&SamplerRun) -> Result<(), CalibError>,
    {
        state.check_shape(self.posterior.ndim())?;
        if chain.walkers() != state.walkers() {
            return Err(CalibError::Sampler(
                ErrorInfo::new("chain-shape", "chain and state disagree on walker count")
                    .with_context("chain", chain.walkers().to_string())
                    .with_context("state", state.walkers().to_string()),
            ));
        }

        let mut run = SamplerRun {
            chain,
            state,
            metrics,
        };
        for step in run.chain.len()..total_steps {
            let output = self.step(&mut run.state, seed, step);
            run.chain.push(output.record)?;
            run.metrics.push(output.metrics);
            after_step(&run)?;
        }
        tracing::info!(
            steps = run.chain.len(),
            walkers = run.state.walkers(),
            acceptance = run.state.mean_acceptance_rate(),
            "sampling complete"
        );
        Ok(run)
    }
}
