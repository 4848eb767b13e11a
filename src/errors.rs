use thiserror::Error;

/// Rejections raised while vetting or solving a rate matrix.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum CtmcError {
    #[error("rate matrix has no states")]
    Empty,
    #[error("row {row} has {found} rates; expecting {expected}")]
    RowLength {
        row: usize,
        found: usize,
        expected: usize,
    },
    #[error("diagonal rate in row {row} is not negative")]
    NonNegativeDiagonal { row: usize },
    #[error("off-diagonal rate [{row}][{col}] is negative")]
    NegativeOffDiagonal { row: usize, col: usize },
    #[error("row {row} does not sum to zero (sum is {sum})")]
    RowSum { row: usize, sum: f64 },
    #[error("rate matrix is singular; steady-state probabilities are undefined")]
    SingularMatrix,
    #[error("max_time must be greater than warmup_time")]
    WarmupExceedsMaxTime,
}

/// Rejections raised while assembling a model parameterization.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum ModelError {
    #[error(transparent)]
    Ctmc(#[from] CtmcError),
    #[error("provided {found} {field} for {expected} states")]
    LengthMismatch {
        field: &'static str,
        found: usize,
        expected: usize,
    },
    #[error("{field}[{index}] is negative ({value})")]
    NegativeRate {
        field: &'static str,
        index: usize,
        value: f64,
    },
    #[error("burst_probs[{index}] is {value}; expecting a probability in [0, 1]")]
    InvalidProbability { index: usize, value: f64 },
    #[error("burst_rate is negative ({value})")]
    NegativeBurstRate { value: f64 },
}

/// A draw that cannot be represented exactly.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum DrawError {
    #[error("Poisson draw with mean {mean} exceeded the largest exactly representable integer")]
    PoissonOverflow { mean: f64 },
}

/// Rejections raised when starting or running a simulation.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum SimError {
    #[error("no stopping condition provided")]
    NoStoppingCondition,
    #[error("stopping condition {name} must be positive (found {value})")]
    NonPositiveStoppingCondition { name: &'static str, value: f64 },
    #[error(transparent)]
    Ctmc(#[from] CtmcError),
    #[error(transparent)]
    Draw(#[from] DrawError),
}

/// A malformed Newick string.
#[derive(Clone, Debug, PartialEq, Error)]
#[error("invalid newick at byte {offset}: {message}")]
pub struct NewickError {
    pub offset: usize,
    pub message: String,
}

/// Anything that can go wrong between a config file and a finished run.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("cannot parse config file: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error(transparent)]
    Sim(#[from] SimError),
}
