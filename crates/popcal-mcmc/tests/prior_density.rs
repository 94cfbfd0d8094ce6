use popcal_core::{ParamKind, ParameterVector};
use popcal_mcmc::special::{gamma_ln_pdf, ln_gamma, normal_ln_pdf, uniform_ln_pdf};
use popcal_mcmc::{ParameterPrior, PriorFamily, PriorModel};
use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

#[test]
fn ln_gamma_matches_known_values() {
    assert!(ln_gamma(1.0).abs() < 1e-8);
    assert!(ln_gamma(2.0).abs() < 1e-8);
    assert!((ln_gamma(0.5) - std::f64::consts::PI.sqrt().ln()).abs() < 1e-8);
    assert!((ln_gamma(5.0) - 24f64.ln()).abs() < 1e-8);
    assert!((ln_gamma(10.0) - 362_880f64.ln()).abs() < 1e-8);
}

#[test]
fn densities_match_closed_forms() {
    // Gamma(2, 0.2) at 0.4: x·e^(-x/θ) / θ².
    let expected = (0.4f64 * (-2.0f64).exp() / 0.04).ln();
    assert!((gamma_ln_pdf(0.4, 2.0, 0.2) - expected).abs() < 1e-8);
    assert_eq!(gamma_ln_pdf(0.0, 2.0, 0.2), f64::NEG_INFINITY);
    assert_eq!(gamma_ln_pdf(-1.0, 2.0, 0.2), f64::NEG_INFINITY);

    let peak = -0.5 * (2.0 * std::f64::consts::PI).ln();
    assert!((normal_ln_pdf(3.0, 3.0, 1.0) - peak).abs() < 1e-12);
    assert!((normal_ln_pdf(16.0, 14.0, 2.0) - (peak - 0.5 - 2f64.ln())).abs() < 1e-12);

    assert!((uniform_ln_pdf(0.5, 0.0, 4.0) + 4f64.ln()).abs() < 1e-12);
    assert_eq!(uniform_ln_pdf(4.5, 0.0, 4.0), f64::NEG_INFINITY);
}

fn model() -> PriorModel {
    PriorModel::new(vec![
        ParameterPrior::new(
            "lambda",
            ParamKind::Continuous,
            PriorFamily::Gamma {
                shape: 2.0,
                scale: 0.2,
            },
        ),
        ParameterPrior::new(
            "kC_high",
            ParamKind::Discrete,
            PriorFamily::Normal {
                mean: 14.0,
                sd: 2.0,
            },
        )
        .with_bounds(Some(0.0), Some(30.0)),
    ])
    .unwrap()
}

#[test]
fn log_prior_sums_components() {
    let model = model();
    let vector = ParameterVector::new(vec![0.4, 14.0]);
    let expected = gamma_ln_pdf(0.4, 2.0, 0.2) + normal_ln_pdf(14.0, 14.0, 2.0);
    assert!((model.log_prior(&vector).value() - expected).abs() < 1e-12);
}

#[test]
fn discrete_prior_uses_the_unrounded_value() {
    let model = model();
    let a = model.log_prior(&ParameterVector::new(vec![0.4, 14.2]));
    let b = model.log_prior(&ParameterVector::new(vec![0.4, 13.8]));
    assert!(a.is_finite() && b.is_finite());
    assert!((a.value() - b.value()).abs() < 1e-12);
    assert_ne!(a, model.log_prior(&ParameterVector::new(vec![0.4, 14.0])));
}

#[test]
fn invalid_prior_lists_are_rejected() {
    let err = PriorModel::new(Vec::new()).unwrap_err();
    assert_eq!(err.info().code, "prior-empty");

    let duplicate = ParameterPrior::new(
        "sigma",
        ParamKind::Continuous,
        PriorFamily::Normal { mean: 0.0, sd: 1.0 },
    );
    let err = PriorModel::new(vec![duplicate.clone(), duplicate]).unwrap_err();
    assert_eq!(err.info().code, "prior-duplicate");

    let bad = ParameterPrior::new(
        "sigma",
        ParamKind::Continuous,
        PriorFamily::Gamma {
            shape: -1.0,
            scale: 0.2,
        },
    );
    let err = PriorModel::new(vec![bad]).unwrap_err();
    assert_eq!(err.info().code, "prior-hyperparameter");

    let inverted = ParameterPrior::new(
        "sigma",
        ParamKind::Continuous,
        PriorFamily::Normal { mean: 0.0, sd: 1.0 },
    )
    .with_bounds(Some(2.0), Some(1.0));
    let err = PriorModel::new(vec![inverted]).unwrap_err();
    assert_eq!(err.info().code, "prior-bounds");
}

#[test]
fn wrong_length_is_a_dimension_error() {
    let model = model();
    let err = model.check_dimension(3).unwrap_err();
    assert_eq!(err.info().code, "dimension-mismatch");
    assert!(model.log_prior(&ParameterVector::new(vec![0.4])).is_rejected());
}

#[test]
fn prior_draws_respect_bounds() {
    let model = model();
    let mut rng = StdRng::seed_from_u64(3);
    for _ in 0..500 {
        let draw = model.sample(&mut rng).unwrap();
        assert!(model.log_prior(&draw).is_finite());
    }
}

proptest! {
    #[test]
    fn out_of_bounds_values_are_rejected(lambda in -50.0f64..0.0, k in 30.0001f64..1e6) {
        let model = model();
        prop_assert!(model.log_prior(&ParameterVector::new(vec![lambda, 14.0])).is_rejected());
        prop_assert!(model.log_prior(&ParameterVector::new(vec![0.4, k])).is_rejected());
        prop_assert!(model.log_prior(&ParameterVector::new(vec![0.4, -k])).is_rejected());
    }

    #[test]
    fn in_bounds_values_are_finite(lambda in 1e-6f64..20.0, k in 0.0f64..30.0) {
        let model = model();
        prop_assert!(model.log_prior(&ParameterVector::new(vec![lambda, k])).is_finite());
    }

    #[test]
    fn non_finite_components_are_rejected(which in 0usize..2) {
        let model = model();
        for bad in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let mut values = vec![0.4, 14.0];
            values[which] = bad;
            prop_assert!(model.log_prior(&ParameterVector::new(values)).is_rejected());
        }
    }
}
