//! Initial walker positions.

use popcal_core::errors::CalibError;
use popcal_core::ParameterVector;
use rand::Rng;

use crate::config::WalkerInit;
use crate::prior::PriorModel;

/// Builds `walkers` starting vectors according to `init`.
pub fn initialize<R: Rng + ?Sized>(
    init: &WalkerInit,
    walkers: usize,
    prior: &PriorModel,
    rng: &mut R,
) -> Result<Vec<ParameterVector>, CalibError> {
    match init {
        WalkerInit::FromPrior => (0..walkers).map(|_| prior.sample(rng)).collect(),
        WalkerInit::Ball { center, radius } => {
            prior.check_dimension(center.len())?;
            Ok((0..walkers)
                .map(|_| {
                    let values = center
                        .iter()
                        .map(|&c| c + (rng.gen::<f64>() - 0.5) * radius)
                        .collect();
                    ParameterVector::new(values)
                })
                .collect())
        }
        WalkerInit::Explicit { positions } => positions
            .iter()
            .map(|position| {
                prior.check_dimension(position.len())?;
                Ok(ParameterVector::new(position.clone()))
            })
            .collect(),
    }
}
