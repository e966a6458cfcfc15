// Solver adapter boundary: any LP/MILP engine that can take variables with
// bounds, rows with a sense, and a minimize objective plugs in here.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use thiserror::Error;
use web_time::Instant;

use crate::problem::LpProblem;
use crate::simplex::Solver;
use crate::solution::Solution;

/// Exceptional adapter failures.
///
/// Infeasible, unbounded and backend-breakdown outcomes are reported through
/// [`crate::SolutionStatus`], never through this type.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SolverError {
    #[error("Invalid model: {0}")]
    InvalidModel(String),

    #[error("Solver not available: {0}")]
    Unavailable(String),
}

/// Cooperative cancellation flag shared between a solve and its owner
#[derive(Debug, Clone, Default)]
pub struct Interrupt(Arc<AtomicBool>);

impl Interrupt {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask the running solve to stop at its next check point
    pub fn trigger(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_triggered(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Per-solve limits
#[derive(Debug, Clone)]
pub struct SolveOptions {
    pub time_limit: Option<Duration>,
    pub max_iterations: usize,
    /// Branch-and-bound node budget
    pub max_nodes: usize,
    pub interrupt: Option<Interrupt>,
}

impl Default for SolveOptions {
    fn default() -> Self {
        Self {
            time_limit: None,
            max_iterations: 50_000,
            max_nodes: 10_000,
            interrupt: None,
        }
    }
}

impl SolveOptions {
    pub fn with_time_limit(mut self, limit: Duration) -> Self {
        self.time_limit = Some(limit);
        self
    }

    pub fn with_interrupt(mut self, interrupt: Interrupt) -> Self {
        self.interrupt = Some(interrupt);
        self
    }

    /// Deadline for a solve that started at `start`
    pub fn deadline(&self, start: Instant) -> Option<Instant> {
        self.time_limit.map(|limit| start + limit)
    }

    /// Whether the solve should stop now
    pub fn should_stop(&self, deadline: Option<Instant>) -> bool {
        self.interrupt.as_ref().is_some_and(Interrupt::is_triggered)
            || deadline.is_some_and(|d| Instant::now() >= d)
    }
}

/// Contract every LP/MILP engine adapter follows
pub trait SolverBackend: Send + Sync {
    /// Solve `problem`. Only malformed models yield `Err`.
    fn solve(&self, problem: &LpProblem, options: &SolveOptions) -> Result<Solution, SolverError>;

    /// Get the name of this solver backend
    fn name(&self) -> &str;

    /// Check if this solver supports mixed-integer programming
    fn supports_mip(&self) -> bool;

    /// Whether optimal LP solutions carry duals and reduced costs
    fn supports_sensitivity(&self) -> bool;
}

/// Which backend to instantiate
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BackendKind {
    /// Built-in bounded simplex with branch-and-bound
    #[default]
    Simplex,
    /// HiGHS, when compiled with the `highs` feature
    Highs,
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendKind::Simplex => write!(f, "simplex"),
            BackendKind::Highs => write!(f, "highs"),
        }
    }
}

/// Factory for creating solver instances based on configuration
pub struct SolverFactory;

impl SolverFactory {
    pub fn create(kind: BackendKind) -> Result<Box<dyn SolverBackend>, SolverError> {
        match kind {
            BackendKind::Simplex => Ok(Box::new(Solver::new())),
            #[cfg(feature = "highs")]
            BackendKind::Highs => Ok(Box::new(crate::highs_solver::HighsSolver::new())),
            #[cfg(not(feature = "highs"))]
            BackendKind::Highs => Err(SolverError::Unavailable(
                "HiGHS backend not compiled in (enable the `highs` feature)".to_string(),
            )),
        }
    }
}
