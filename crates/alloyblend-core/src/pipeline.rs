//! validate -> build -> solve -> assemble -> analyse, as one call.

use alloyblend_solver::{BackendKind, Interrupt, Solution, SolveOptions, SolverError, SolverFactory};
use serde::Serialize;
use tracing::{debug, info, warn};
use web_time::Instant;

use crate::builder::ConstraintBuilder;
use crate::config::SolverConfig;
use crate::error::{BlendError, Result};
use crate::model::BlendingProblem;
use crate::result::{self, OptimizationResult, OptimizationStatus};
use crate::sensitivity;

/// Pipeline stage reported to progress callbacks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Validating,
    Building,
    Solving,
    Assembling,
    Analyzing,
    Done,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Stage::Validating => "validating",
            Stage::Building => "building model",
            Stage::Solving => "solving",
            Stage::Assembling => "assembling result",
            Stage::Analyzing => "analysing sensitivity",
            Stage::Done => "done",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Progress {
    pub stage: Stage,
    /// Rough completion in [0, 1]
    pub fraction: f64,
}

impl Progress {
    fn at(stage: Stage) -> Self {
        let fraction = match stage {
            Stage::Validating => 0.0,
            Stage::Building => 0.1,
            Stage::Solving => 0.2,
            Stage::Assembling => 0.8,
            Stage::Analyzing => 0.9,
            Stage::Done => 1.0,
        };
        Self { stage, fraction }
    }
}

/// Runs blending problems through the full pipeline.
///
/// Each call builds a fresh model and a fresh backend instance, so one
/// `Optimizer` can serve concurrent solves.
#[derive(Debug, Clone)]
pub struct Optimizer {
    backend: BackendKind,
    options: SolveOptions,
    tolerance: f64,
    sensitivity: bool,
}

impl Default for Optimizer {
    fn default() -> Self {
        Self::from_config(&SolverConfig::default())
    }
}

impl Optimizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &SolverConfig) -> Self {
        Self {
            backend: config.backend,
            options: config.solve_options(),
            tolerance: config.tolerance,
            sensitivity: config.sensitivity,
        }
    }

    pub fn with_backend(mut self, backend: BackendKind) -> Self {
        self.backend = backend;
        self
    }

    pub fn with_options(mut self, options: SolveOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_interrupt(mut self, interrupt: Interrupt) -> Self {
        self.options.interrupt = Some(interrupt);
        self
    }

    pub fn with_sensitivity(mut self, enabled: bool) -> Self {
        self.sensitivity = enabled;
        self
    }

    pub fn backend(&self) -> BackendKind {
        self.backend
    }

    pub fn optimize(&self, problem: &BlendingProblem) -> Result<OptimizationResult> {
        self.optimize_with_progress(problem, |_| {})
    }

    /// Like [`Optimizer::optimize`], reporting each stage as it starts.
    ///
    /// Only invalid input and malformed models are errors. Infeasible,
    /// unbounded, interrupted and backend failures come back as a result
    /// with the matching status.
    pub fn optimize_with_progress(
        &self,
        problem: &BlendingProblem,
        mut on_progress: impl FnMut(Progress),
    ) -> Result<OptimizationResult> {
        on_progress(Progress::at(Stage::Validating));
        let errors = problem.validate();
        if !errors.is_empty() {
            warn!(problem = %problem.name, count = errors.len(), "validation failed");
            return Err(BlendError::Validation(errors));
        }

        on_progress(Progress::at(Stage::Building));
        let model = ConstraintBuilder::build_model(problem)?;
        debug!(
            variables = model.lp.num_variables(),
            rows = model.lp.num_constraints(),
            integer = model.is_mixed_integer(),
            "model built"
        );

        on_progress(Progress::at(Stage::Solving));
        let start = Instant::now();
        let solution = match SolverFactory::create(self.backend) {
            Ok(backend) => backend.solve(&model.lp, &self.options)?,
            Err(SolverError::Unavailable(msg)) => {
                warn!(backend = %self.backend, "{}", msg);
                Solution::error(msg)
            }
            Err(e) => return Err(e.into()),
        };
        let elapsed = start.elapsed().as_secs_f64();

        on_progress(Progress::at(Stage::Assembling));
        let mut result = result::assemble(problem, &model, &solution, elapsed, self.tolerance);
        info!(
            problem = %problem.name,
            status = %result.status,
            objective = ?result.objective_value,
            elapsed_ms = elapsed * 1000.0,
            iterations = solution.statistics.iterations,
            nodes = solution.statistics.nodes,
            "solve finished"
        );

        if result.status == OptimizationStatus::Unbounded {
            warn!(
                problem = %problem.name,
                "objective is unbounded; check for negative costs or missing mass constraints"
            );
        }

        if self.sensitivity && result.is_optimal() {
            on_progress(Progress::at(Stage::Analyzing));
            match sensitivity::analyze(problem, &model, &solution, self.tolerance) {
                Ok(report) => result.sensitivity = Some(report),
                Err(reason) => debug!(%reason, "sensitivity unavailable"),
            }
        }

        on_progress(Progress::at(Stage::Done));
        Ok(result)
    }
}
