//! Steady-state and stability integration tests for nowcast-var.

use approx::assert_abs_diff_eq;
use ndarray::Array2;
use nowcast_var::{
    VarDescriptor, linalg, unconditional_covariance, unconditional_covariance_with_lags,
};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::{Distribution, Uniform};

/// Random VAR whose absolute row sums stay below 0.9, hence stationary.
fn random_stable_var(nvars: usize, nlags: usize, seed: u64) -> VarDescriptor {
    let mut rng = StdRng::seed_from_u64(seed);
    let bound = 0.9 / (nvars * nlags) as f64;
    let coef = Uniform::new(-bound, bound).unwrap();
    let noise = Uniform::new(-1.0, 1.0).unwrap();

    let coefficients =
        Array2::from_shape_fn((nvars, nvars * nlags), |_| coef.sample(&mut rng));
    let b = Array2::from_shape_fn((nvars, nvars), |_| noise.sample(&mut rng));
    let sigma = linalg::xxt(&b) + Array2::<f64>::eye(nvars) * 0.1;
    VarDescriptor::new(coefficients, sigma).unwrap()
}

fn max_abs(a: &Array2<f64>) -> f64 {
    a.iter().fold(0.0_f64, |acc, x| acc.max(x.abs()))
}

#[test]
fn random_vars_satisfy_lyapunov_equation() {
    for (seed, (nvars, nlags)) in [(1, 2), (2, 1), (3, 3), (2, 4), (4, 2)].into_iter().enumerate() {
        let var = random_stable_var(nvars, nlags, seed as u64);
        assert!(var.is_stable(), "seed {seed}: expected a stable VAR");

        let v = unconditional_covariance(&var).unwrap();
        let t = var.companion();
        let q = var.transition_covariance(nlags);
        let residual = &v - &(t.dot(&v).dot(&t.t()) + &q);
        assert!(
            max_abs(&residual) < 1e-9,
            "seed {seed}: residual {}",
            max_abs(&residual)
        );
    }
}

#[test]
fn steady_state_is_positive_semidefinite_for_stable_var() {
    let var = random_stable_var(3, 2, 11);
    let v = unconditional_covariance(&var).unwrap();
    // a PSD matrix factorises
    let l = linalg::lower_cholesky(&v).unwrap();
    let back = linalg::xxt(&l);
    assert!(max_abs(&(&back - &v)) < 1e-9);
}

#[test]
fn extended_state_top_left_block_is_unchanged() {
    let var = random_stable_var(2, 2, 7);
    let short = unconditional_covariance(&var).unwrap();
    let long = unconditional_covariance_with_lags(&var, 5).unwrap();
    assert_eq!(long.dim(), (10, 10));
    for i in 0..4 {
        for j in 0..4 {
            assert_abs_diff_eq!(long[[i, j]], short[[i, j]], epsilon = 1e-9);
        }
    }
}

#[test]
fn near_unit_root_is_large_but_finite() {
    let var = VarDescriptor::new(ndarray::array![[0.999]], ndarray::array![[1.0]]).unwrap();
    let v = unconditional_covariance(&var).unwrap();
    let expected = 1.0 / (1.0 - 0.999 * 0.999);
    assert_abs_diff_eq!(v[[0, 0]], expected, epsilon = 1e-6);
}
