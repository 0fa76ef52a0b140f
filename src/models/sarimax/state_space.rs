//! State-space representation of a SARIMA process.
//!
//! The state stacks the `d + s*D` most recent levels of the regression error
//! on top of a Harvey-form ARMA block:
//!
//! ```text
//! alpha_t = [w_{t-1}, ..., w_{t-nd}, u_t, ...]
//! w_t     = Z alpha_t
//! alpha_{t+1} = T alpha_t + R eta_t
//! ```
//!
//! `T` is stored row-sparse since every row carries at most a handful of
//! non-zero entries.

use super::polynomial::{differencing_coefficients, reduced_ar, reduced_ma};
use super::spec::SarimaxSpec;

type SparseRow = Vec<(usize, f64)>;

/// Sparse system matrices for one parameter vector.
#[derive(Debug, Clone)]
pub struct StateSpace {
    k_states: usize,
    design: SparseRow,
    transition: Vec<SparseRow>,
    selection: Vec<f64>,
}

impl StateSpace {
    /// Build the system matrices for the given ARMA coefficients.
    pub fn new(
        spec: &SarimaxSpec,
        ar: &[f64],
        ma: &[f64],
        seasonal_ar: &[f64],
        seasonal_ma: &[f64],
    ) -> Self {
        let period = spec.seasonal.period;
        let delta = differencing_coefficients(spec.order.d, spec.seasonal.d, period);
        let phi = reduced_ar(ar, seasonal_ar, period);
        let theta = reduced_ma(ma, seasonal_ma, period);

        let nd = delta.len();
        let r = spec.k_arma_states().max(phi.len()).max(theta.len() + 1);
        let k_states = nd + r;

        let mut design: SparseRow = delta
            .iter()
            .enumerate()
            .filter(|&(_, &c)| c != 0.0)
            .map(|(i, &c)| (i, c))
            .collect();
        design.push((nd, 1.0));

        let mut transition = Vec::with_capacity(k_states);
        if nd > 0 {
            transition.push(design.clone());
            for i in 1..nd {
                transition.push(vec![(i - 1, 1.0)]);
            }
        }
        for j in 0..r {
            let mut row = SparseRow::new();
            if let Some(&c) = phi.get(j) {
                if c != 0.0 {
                    row.push((nd, c));
                }
            }
            if j + 1 < r {
                row.push((nd + j + 1, 1.0));
            }
            transition.push(row);
        }

        let mut selection = vec![0.0; k_states];
        selection[nd] = 1.0;
        for (i, &m) in theta.iter().enumerate() {
            selection[nd + i + 1] = m;
        }

        Self {
            k_states,
            design,
            transition,
            selection,
        }
    }

    /// State dimension.
    pub fn k_states(&self) -> usize {
        self.k_states
    }

    /// `Z a`.
    pub fn observe(&self, state: &[f64]) -> f64 {
        self.design.iter().map(|&(i, z)| z * state[i]).sum()
    }

    /// `P Z'` for a dense row-major covariance.
    pub fn cov_times_design(&self, cov: &[f64]) -> Vec<f64> {
        let k = self.k_states;
        (0..k)
            .map(|i| {
                self.design
                    .iter()
                    .map(|&(j, z)| z * cov[i * k + j])
                    .sum()
            })
            .collect()
    }

    /// `T a`.
    pub fn transition_state(&self, state: &[f64]) -> Vec<f64> {
        self.transition
            .iter()
            .map(|row| row.iter().map(|&(j, t)| t * state[j]).sum())
            .collect()
    }

    /// `T P T' + R R'`.
    pub fn transition_cov(&self, cov: &[f64]) -> Vec<f64> {
        let k = self.k_states;

        // M = T P
        let mut tp = vec![0.0; k * k];
        for (i, row) in self.transition.iter().enumerate() {
            for &(m, t) in row {
                let src = &cov[m * k..(m + 1) * k];
                let dst = &mut tp[i * k..(i + 1) * k];
                for (d, s) in dst.iter_mut().zip(src) {
                    *d += t * s;
                }
            }
        }

        // M T' + R R'
        let mut out = vec![0.0; k * k];
        for i in 0..k {
            let tp_row = &tp[i * k..(i + 1) * k];
            for (j, row) in self.transition.iter().enumerate() {
                let value: f64 = row.iter().map(|&(m, t)| t * tp_row[m]).sum();
                out[i * k + j] = value + self.selection[i] * self.selection[j];
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::sarimax::spec::{ModelOrder, SeasonalOrder};
    use approx::assert_relative_eq;

    fn spec(p: usize, d: usize, q: usize, sp: usize, sd: usize, sq: usize) -> SarimaxSpec {
        SarimaxSpec::new(ModelOrder::new(p, d, q), SeasonalOrder::new(sp, sd, sq, 12))
    }

    #[test]
    fn ar1_state_space_is_scalar() {
        let ss = StateSpace::new(&spec(1, 0, 0, 0, 0, 0), &[0.6], &[], &[], &[]);
        assert_eq!(ss.k_states(), 1);
        assert_eq!(ss.transition_state(&[2.0]), vec![1.2]);
        // 0.6 * 1 * 0.6 + 1
        assert_relative_eq!(ss.transition_cov(&[1.0])[0], 1.36, epsilon = 1e-12);
    }

    #[test]
    fn ma1_uses_two_arma_states() {
        let ss = StateSpace::new(&spec(0, 0, 1, 0, 0, 0), &[], &[0.4], &[], &[]);
        assert_eq!(ss.k_states(), 2);
        // shock loads [1, theta]
        let q = ss.transition_cov(&[0.0; 4]);
        assert_relative_eq!(q[0], 1.0, epsilon = 1e-12);
        assert_relative_eq!(q[1], 0.4, epsilon = 1e-12);
        assert_relative_eq!(q[3], 0.16, epsilon = 1e-12);
        // u_{t+1} picks up the second state
        assert_eq!(ss.transition_state(&[0.0, 5.0]), vec![5.0, 0.0]);
    }

    #[test]
    fn random_walk_observes_previous_level_plus_innovation() {
        let ss = StateSpace::new(&spec(0, 1, 0, 0, 0, 0), &[], &[], &[], &[]);
        assert_eq!(ss.k_states(), 2);
        // w_t = w_{t-1} + u_t
        assert_relative_eq!(ss.observe(&[3.0, 0.5]), 3.5, epsilon = 1e-12);
        // next lagged level is the current observation
        let next = ss.transition_state(&[3.0, 0.5]);
        assert_relative_eq!(next[0], 3.5, epsilon = 1e-12);
        assert_relative_eq!(next[1], 0.0, epsilon = 1e-12);
    }

    #[test]
    fn seasonal_model_dimension_matches_spec() {
        let s = spec(1, 1, 1, 1, 1, 1);
        let ss = StateSpace::new(&s, &[0.2], &[0.1], &[0.3], &[0.4]);
        assert_eq!(ss.k_states(), s.k_states());

        let k = ss.k_states();
        let identity: Vec<f64> = (0..k * k)
            .map(|i| if i / k == i % k { 1.0 } else { 0.0 })
            .collect();
        let next = ss.transition_cov(&identity);
        // symmetric
        for i in 0..k {
            for j in 0..k {
                assert_relative_eq!(next[i * k + j], next[j * k + i], epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn cov_times_design_picks_design_columns() {
        let ss = StateSpace::new(&spec(0, 1, 0, 0, 0, 0), &[], &[], &[], &[]);
        // Z = [1, 1]
        let pz = ss.cov_times_design(&[1.0, 2.0, 3.0, 4.0]);
        assert_eq!(pz, vec![3.0, 7.0]);
    }
}
