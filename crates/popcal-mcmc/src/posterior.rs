//! Unnormalized log-posterior combining prior and likelihood.

use popcal_core::{LogProbability, ParameterVector};
use popcal_invoke::Simulator;

use crate::likelihood::{EvaluationOutcome, LikelihoodEvaluator};
use crate::prior::PriorModel;

/// Log-probability of one proposal together with how it was obtained.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Evaluation {
    /// Prior plus likelihood, or a rejection.
    pub log_prob: LogProbability,
    /// Outcome classification.
    pub outcome: EvaluationOutcome,
}

/// Target density of the sampler.
#[derive(Debug)]
pub struct Posterior<S> {
    prior: PriorModel,
    evaluator: LikelihoodEvaluator<S>,
}

impl<S: Simulator> Posterior<S> {
    /// Combines a prior and a likelihood evaluator.
    pub fn new(prior: PriorModel, evaluator: LikelihoodEvaluator<S>) -> Self {
        Self { prior, evaluator }
    }

    /// Prior model.
    pub fn prior(&self) -> &PriorModel {
        &self.prior
    }

    /// Likelihood evaluator.
    pub fn evaluator(&self) -> &LikelihoodEvaluator<S> {
        &self.evaluator
    }

    /// Number of parameters.
    pub fn ndim(&self) -> usize {
        self.prior.len()
    }

    /// Scores a proposal. A vector the prior rejects never reaches the simulator.
    pub fn evaluate(&self, vector: &ParameterVector) -> Evaluation {
        let log_prior = self.prior.log_prior(vector);
        if log_prior.is_rejected() {
            return Evaluation {
                log_prob: LogProbability::REJECTED,
                outcome: EvaluationOutcome::PriorRejected,
            };
        }
        let scored = self.evaluator.evaluate(vector);
        Evaluation {
            log_prob: log_prior + scored.log_likelihood,
            outcome: scored.outcome,
        }
    }
}
