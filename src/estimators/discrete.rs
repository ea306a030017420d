//! Discrete Bayes filter.
//!
//! The belief is a probability mass over a finite set of mutually exclusive states.
//! Observations are described by a likelihood table, rows are the observable outcomes and
//! columns the states, so that `likelihood[(z, s)] = P(z | s)`.

use log::{debug, trace};
use nalgebra::{DMatrix, DVector, RealField};

use crate::error::{require, EstimateError, EstimateResult};

/// Tolerance for a probability mass to be considered normalised.
pub const MASS_TOLERANCE: f64 = 1e-9;

/// Discrete Bayes filter state.
#[derive(PartialEq, Clone, Debug)]
pub struct DiscreteBayesFilter<N: RealField> {
    /// Observation likelihoods P(z | s)
    likelihood: DMatrix<N>,
    /// Probability mass of each state
    belief: DVector<N>,
}

impl<N: RealField> DiscreteBayesFilter<N> {
    /// Creates a filter from a likelihood table and a prior belief.
    pub fn new(likelihood: DMatrix<N>, prior: DVector<N>) -> EstimateResult<Self> {
        require(prior.nrows() > 0, "no states")?;
        require(
            likelihood.ncols() == prior.nrows(),
            format!("likelihood has {} columns for {} states", likelihood.ncols(), prior.nrows()),
        )?;
        require(likelihood.nrows() > 0, "likelihood has no outcomes")?;
        require(
            likelihood.iter().all(|&p| is_probability(p)),
            "likelihood entries must be probabilities",
        )?;
        check_mass(&prior, "prior")?;

        debug!("discrete Bayes filter with {} states, {} outcomes", prior.nrows(), likelihood.nrows());
        Ok(DiscreteBayesFilter { likelihood, belief: prior })
    }

    /// The current belief.
    pub fn belief(&self) -> &DVector<N> {
        &self.belief
    }

    /// Probability mass of a single state.
    pub fn probability(&self, state: usize) -> Option<N> {
        self.belief.get(state).copied()
    }

    /// The likelihood table.
    pub fn likelihood(&self) -> &DMatrix<N> {
        &self.likelihood
    }

    /// Number of states.
    pub fn states(&self) -> usize {
        self.belief.nrows()
    }

    /// Observe the outcome `measurement`.
    ///
    /// Each state's mass is multiplied by the likelihood of the outcome and the result normalised.
    pub fn update(&mut self, measurement: usize) -> EstimateResult<&DVector<N>> {
        let outcomes = self.likelihood.nrows();
        if measurement >= outcomes {
            return Err(EstimateError::MeasurementOutOfRange { measurement, outcomes });
        }

        let unnormalised = self.likelihood.row(measurement).transpose().component_mul(&self.belief);
        self.belief = normalise(unnormalised)?;
        trace!("observed {} belief {:?}", measurement, self.belief.as_slice());

        Ok(&self.belief)
    }

    /// Observe a sequence of outcomes in order.
    ///
    /// Stops at the first failing observation, earlier observations remain applied.
    pub fn update_all<I: IntoIterator<Item = usize>>(&mut self, measurements: I) -> EstimateResult<&DVector<N>> {
        for measurement in measurements {
            self.update(measurement)?;
        }
        Ok(&self.belief)
    }

    /// Predict with a column stochastic transition table, `transition[(to, from)] = P(to | from)`.
    pub fn predict(&mut self, transition: &DMatrix<N>) -> EstimateResult<&DVector<N>> {
        let k = self.belief.nrows();
        require(transition.nrows() == k && transition.ncols() == k, "transition must be square over the states")?;
        require(transition.iter().all(|&p| is_probability(p)), "transition entries must be probabilities")?;
        for column in transition.column_iter() {
            check_mass(&column.into_owned(), "transition column")?;
        }

        // Renormalise to remove the roundoff of the product
        self.belief = normalise(transition * &self.belief)?;

        Ok(&self.belief)
    }
}

fn is_probability<N: RealField>(p: N) -> bool {
    p >= N::zero() && p <= N::one()
}

/// Checks a mass is non-negative and sums to one.
fn check_mass<N: RealField>(mass: &DVector<N>, what: &str) -> EstimateResult<()> {
    let tolerance: N = nalgebra::convert(MASS_TOLERANCE);
    require(mass.iter().all(|&p| p >= N::zero()), format!("{} has negative mass", what))?;
    require(
        (mass.sum() - N::one()).abs() <= tolerance,
        format!("{} does not sum to 1", what),
    )
}

/// Normalise a mass, a zero (or NaN) sum is degenerate.
fn normalise<N: RealField>(mass: DVector<N>) -> EstimateResult<DVector<N>> {
    let sum = mass.sum();
    if sum > N::zero() && sum.is_finite() {
        Ok(mass / sum)
    } else {
        Err(EstimateError::Degenerate("probability mass sums to zero"))
    }
}
