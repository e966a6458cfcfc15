mod backend;
mod branch;
#[cfg(feature = "highs")]
mod highs_solver;
mod problem;
mod simplex;
mod solution;

pub use backend::{BackendKind, Interrupt, SolveOptions, SolverBackend, SolverError, SolverFactory};
#[cfg(feature = "highs")]
pub use highs_solver::HighsSolver;
pub use problem::{Constraint, ConstraintOp, LpProblem, Objective, Variable, VariableKind};
pub use simplex::Solver;
pub use solution::{
    Analysis, BasisStatus, ConstraintViolation, SensitivityRange, Solution, SolutionStatus,
    SolverStatistics,
};
