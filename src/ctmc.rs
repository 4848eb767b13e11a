//! Continuous-time Markov chain over a finite character state space.

// Traits
use rand::Rng;

// Structs
use nalgebra::{DMatrix, DVector};

use crate::errors::CtmcError;
use crate::numeric;
use crate::sampling;

/// Componentwise bound the solved steady state must satisfy on `pi * Q`.
const SOLVE_RESIDUAL_TOLERANCE: f64 = 1e-6;
/// Bound on `|sum(pi) - 1|` for the solved steady state.
const SOLVE_SUM_TOLERANCE: f64 = 1e-9;
/// Componentwise bound used when checking a caller-supplied steady state.
const CHECK_RESIDUAL_TOLERANCE: f64 = 1e-8;

/// A vetted rate matrix together with the draws it supports.
///
/// States are the row indices `0..n_states`. Construction rejects any
/// matrix whose diagonal is not strictly negative, whose off-diagonal
/// rates are negative, or whose rows do not sum to zero within
/// [`numeric::DEFAULT_TOLERANCE`].
///
/// # Examples
///
/// ```
/// let ctmc = sdsdsim::Ctmc::new(vec![
///     vec![-1.0, 1.0],
///     vec![2.0, -2.0],
/// ])
/// .unwrap();
/// let probs = ctmc.steady_state_probs().unwrap();
/// assert!((probs[0] - 2.0 / 3.0).abs() < 1e-9);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct Ctmc {
    q: DMatrix<f64>,
}

impl Ctmc {
    pub fn new(q: Vec<Vec<f64>>) -> Result<Self, CtmcError> {
        Self::vet_q_matrix(&q)?;
        let n = q.len();
        let q = DMatrix::from_fn(n, n, |i, j| q[i][j]);
        Ok(Ctmc { q })
    }

    fn vet_q_matrix(q: &[Vec<f64>]) -> Result<(), CtmcError> {
        let n_states = q.len();
        if n_states == 0 {
            return Err(CtmcError::Empty);
        }
        for (i, row) in q.iter().enumerate() {
            if row.len() != n_states {
                return Err(CtmcError::RowLength {
                    row: i,
                    found: row.len(),
                    expected: n_states,
                });
            }
            if row[i] >= 0.0 {
                return Err(CtmcError::NonNegativeDiagonal { row: i });
            }
            for (j, &rate) in row.iter().enumerate() {
                if i != j && rate < 0.0 {
                    return Err(CtmcError::NegativeOffDiagonal { row: i, col: j });
                }
            }
            let row_sum: f64 = row.iter().sum();
            if !numeric::is_zero(row_sum) {
                return Err(CtmcError::RowSum {
                    row: i,
                    sum: row_sum,
                });
            }
        }
        Ok(())
    }

    #[inline]
    pub fn n_states(&self) -> usize {
        self.q.nrows()
    }

    /// Total rate of leaving `state`: the sum of the positive rates in its
    /// row (equivalently `-Q[state][state]`).
    pub fn rate_from(&self, state: usize) -> f64 {
        (0..self.n_states())
            .map(|j| self.q[(state, j)])
            .filter(|&r| r > 0.0)
            .sum()
    }

    /// Sample the next state from `state`, weighting each destination by
    /// its rate.
    pub fn draw_transition<R>(&self, state: usize, rng: &mut R) -> usize
    where
        R: Rng + ?Sized,
    {
        let potential_states: Vec<usize> = (0..self.n_states())
            .filter(|&j| self.q[(state, j)] > 0.0)
            .collect();
        let rates: Vec<f64> = potential_states
            .iter()
            .map(|&j| self.q[(state, j)])
            .collect();
        potential_states[sampling::weighted_index(&rates, rng)]
    }

    /// Solve `pi * Q = 0` under `sum(pi) = 1`.
    ///
    /// The constrained system is the transpose of `Q` with its last row
    /// replaced by ones, solved against the unit vector. The result is
    /// verified against the residual bounds before being returned.
    pub fn steady_state_probs(&self) -> Result<Vec<f64>, CtmcError> {
        let n = self.n_states();
        let mut m = self.q.transpose();
        for j in 0..n {
            m[(n - 1, j)] = 1.0;
        }
        let mut b = DVector::<f64>::zeros(n);
        b[n - 1] = 1.0;
        let probs = m.lu().solve(&b).ok_or(CtmcError::SingularMatrix)?;
        let residual = probs.transpose() * &self.q;
        if residual
            .iter()
            .any(|&r| !numeric::is_zero_within(r, SOLVE_RESIDUAL_TOLERANCE))
            || !numeric::is_zero_within(probs.sum() - 1.0, SOLVE_SUM_TOLERANCE)
        {
            return Err(CtmcError::SingularMatrix);
        }
        Ok(probs.iter().copied().collect())
    }

    /// Does `state_probs` satisfy `pi * Q = 0` componentwise?
    pub fn is_steady_state(&self, state_probs: &[f64]) -> bool {
        (0..self.n_states()).all(|j| {
            let rate: f64 = state_probs
                .iter()
                .enumerate()
                .map(|(i, &p)| p * self.q[(i, j)])
                .sum();
            numeric::is_zero_within(rate, CHECK_RESIDUAL_TOLERANCE)
        })
    }

    /// Sample a state from the steady-state distribution.
    pub fn draw_random_state<R>(&self, rng: &mut R) -> Result<usize, CtmcError>
    where
        R: Rng + ?Sized,
    {
        let probs = self.steady_state_probs()?;
        Ok(sampling::prob_index(&probs, rng))
    }

    /// Estimate the steady-state distribution by simulation, as a check on
    /// the solver.
    ///
    /// Runs the chain from state 0, racing one exponential clock per
    /// positive rate in the current row; occupancy is accumulated after
    /// `warmup_time` and reported as proportions of the post-warmup span.
    pub fn sim_steady_state_probs<R>(
        &self,
        max_time: f64,
        warmup_time: f64,
        rng: &mut R,
    ) -> Result<Vec<f64>, CtmcError>
    where
        R: Rng + ?Sized,
    {
        if warmup_time >= max_time {
            return Err(CtmcError::WarmupExceedsMaxTime);
        }
        let mut state = 0;
        let mut clock = 0.0;
        let mut time_in_state = vec![0.0; self.n_states()];

        while clock < max_time {
            let potential_states: Vec<usize> = (0..self.n_states())
                .filter(|&j| self.q[(state, j)] > 0.0)
                .collect();
            let mut wait = f64::INFINITY;
            let mut next_state = state;
            for &j in &potential_states {
                let sample = sampling::exponential(self.q[(state, j)], rng);
                if sample < wait {
                    wait = sample;
                    next_state = j;
                }
            }
            clock += wait;
            if clock > warmup_time {
                time_in_state[state] += wait;
            }
            state = next_state;
        }

        let total: f64 = time_in_state.iter().sum();
        Ok(time_in_state.iter().map(|&t| t / total).collect())
    }
}
