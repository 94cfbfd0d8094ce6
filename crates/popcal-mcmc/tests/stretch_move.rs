use popcal_core::{LogProbability, ParameterVector, RngHandle};
use popcal_mcmc::StretchMove;
use proptest::prelude::*;

#[test]
fn scale_must_exceed_one() {
    assert_eq!(StretchMove::default().scale(), 2.0);
    assert!(StretchMove::new(1.5).is_ok());
    for bad in [1.0, 0.5, f64::NAN, f64::INFINITY] {
        let err = StretchMove::new(bad).unwrap_err();
        assert_eq!(err.info().code, "stretch-scale");
    }
}

#[test]
fn proposals_lie_on_the_line_through_the_partner() {
    let stretch = StretchMove::default();
    let mut rng = RngHandle::from_seed(21);
    let current = ParameterVector::new(vec![1.0, 2.0]);
    let partner = ParameterVector::new(vec![3.0, -1.0]);
    for _ in 0..100 {
        let (proposal, z) = stretch.propose(&mut rng, &current, std::slice::from_ref(&partner));
        for ((&y, &x), &c) in proposal
            .values()
            .iter()
            .zip(current.values())
            .zip(partner.values())
        {
            assert!((y - (c + z * (x - c))).abs() < 1e-12);
        }
    }
}

#[test]
fn rejected_targets_are_never_accepted() {
    let stretch = StretchMove::default();
    let p = stretch.acceptance_probability(1.5, 5, LogProbability::new(-3.0), LogProbability::REJECTED);
    assert_eq!(p, 0.0);
    let p = stretch.acceptance_probability(1.5, 5, LogProbability::REJECTED, LogProbability::REJECTED);
    assert_eq!(p, 0.0);
}

#[test]
fn any_finite_proposal_beats_a_rejected_walker() {
    let stretch = StretchMove::default();
    let p = stretch.acceptance_probability(0.6, 5, LogProbability::REJECTED, LogProbability::new(-1e6));
    assert_eq!(p, 1.0);
}

#[test]
fn acceptance_includes_the_volume_factor() {
    let stretch = StretchMove::default();
    let z: f64 = 0.8;
    let p = stretch.acceptance_probability(z, 3, LogProbability::new(-2.0), LogProbability::new(-2.0));
    assert!((p - z * z).abs() < 1e-12);
    let p = stretch.acceptance_probability(1.9, 3, LogProbability::new(-2.0), LogProbability::new(-1.0));
    assert_eq!(p, 1.0);
}

proptest! {
    #[test]
    fn stretch_factors_stay_in_range(seed in any::<u64>(), a in 1.1f64..5.0) {
        let stretch = StretchMove::new(a).unwrap();
        let mut rng = RngHandle::from_seed(seed);
        for _ in 0..32 {
            let z = stretch.sample_z(&mut rng);
            prop_assert!(z >= 1.0 / a - 1e-12 && z <= a + 1e-12);
        }
    }
}
